//! Activity feed plumbing.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`ActivityEvent`]: one create/update/delete of a story bible record.
//! - [`ActivityRecorder`]: background service that writes every event to
//!   the `activity_logs` table.

pub mod bus;
pub mod recorder;

pub use bus::{ActivityEvent, EventBus};
pub use recorder::ActivityRecorder;
