//! Query functions, grouped by table.

pub mod documents;
