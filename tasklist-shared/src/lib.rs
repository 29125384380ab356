//! # Tasklist Shared Library
//!
//! Types and building blocks used by the Tasklist API server.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing, identity tokens, and the access guard primitives
//! - `models`: Users, tasks, and record identifiers
//! - `store`: Owner-scoped store accessors (PostgreSQL and in-memory)
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the Tasklist shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
