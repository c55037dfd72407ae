//! PostgreSQL-backed document store for drafter.
//!
//! The store holds opaque JSON documents filed under named collections, in a
//! single `documents` table. Connection configuration lives in [`config`],
//! pool construction and migrations in [`pool`], and the query functions in
//! [`queries`]. Callers construct a pool explicitly and pass it to every
//! query function; there is no global handle.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
