//! Hourly purge of expired and revoked refresh-token sessions.

use std::time::Duration;

use sqlx::PgPool;
use storybible_db::repositories::SessionRepo;
use tokio_util::sync::CancellationToken;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

pub async fn run(pool: PgPool, cancel: CancellationToken) {
    tracing::info!(interval_secs = CLEANUP_INTERVAL.as_secs(), "Session cleanup started");
    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session cleanup stopping");
                break;
            }
            _ = interval.tick() => match SessionRepo::cleanup_expired(&pool).await {
                Ok(0) => tracing::debug!("Session cleanup: nothing to purge"),
                Ok(deleted) => tracing::info!(deleted, "Session cleanup: purged sessions"),
                Err(e) => tracing::error!(error = %e, "Session cleanup failed"),
            },
        }
    }
}
