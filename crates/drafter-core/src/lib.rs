//! Core logic for drafter: deterministic app-plan generation.
//!
//! Everything in this crate is pure -- no I/O, no async, no shared state.
//! The HTTP surface and the document store live in `drafter-cli` and
//! `drafter-db`.

pub mod plan;
