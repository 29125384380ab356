//! # Tasklist API Server Library
//!
//! HTTP surface of the Tasklist service: account signup and login, and
//! owner-scoped task management behind a token guard.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
