//! Capstan HTTP server.
//!
//! Wires the core dispatch pipeline, the intent router, and the retrieval
//! scorer behind an axum surface. See [`api`] for the endpoint map and
//! [`bootstrap`] for application assembly.

pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod seed;
pub mod tools;

pub use bootstrap::{bootstrap, bootstrap_with_config, AppState, BootstrapError};
