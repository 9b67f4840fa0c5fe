//! Domain types and pure logic for the story bible backend.
//!
//! Nothing in this crate performs I/O; the database, LLM and HTTP layers
//! build on it.

pub mod books;
pub mod chapters;
pub mod characters;
pub mod choices;
pub mod context;
pub mod error;
pub mod focus;
pub mod hashing;
pub mod import_status;
pub mod pagination;
pub mod prompt;
pub mod relationships;
pub mod text;
pub mod types;
