//! Background execution of manuscript imports and deep scans.

pub mod runner;

pub use runner::{BookJob, BookSlot, JobRunner};
