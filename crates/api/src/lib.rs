//! Story bible API server library.
//!
//! Exposes config, state, error handling, routes and the background job
//! runner so integration tests and the binary entrypoint share them.

pub mod auth;
pub mod background;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod handlers;
pub mod media;
pub mod middleware;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
