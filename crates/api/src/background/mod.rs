//! Long-running maintenance tasks spawned at startup. Each stops when its
//! [`CancellationToken`](tokio_util::sync::CancellationToken) fires.

pub mod session_cleanup;
