//! Request handlers.
//!
//! Each submodule serves one resource. Handlers take the [`AuthUser`]
//! extractor, delegate to the repositories in `storybible_db` or the jobs
//! in `storybible_pipeline`, and map failures through [`AppError`].
//!
//! [`AuthUser`]: crate::middleware::auth::AuthUser
//! [`AppError`]: crate::error::AppError

pub mod account;
pub mod ai;
pub mod auth;
pub mod books;
pub mod chapters;
pub mod characters;
pub mod dashboard;
pub mod events;
pub mod relationships;
pub mod tags;
pub mod world;
