//! Writes published activity to the `activity_logs` table.

use storybible_db::models::activity::{ActivityLog, CreateActivityLog};
use storybible_db::repositories::ActivityRepo;
use storybible_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::ActivityEvent;

/// Background service draining the bus into the activity log.
pub struct ActivityRecorder;

impl ActivityRecorder {
    /// Persist every received event until the bus is dropped.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<ActivityEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::record(&pool, &event).await {
                        tracing::error!(
                            error = %e,
                            user_id = event.user_id,
                            model = %event.model_name,
                            "Failed to record activity"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Activity recorder lagged, some entries were lost");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, activity recorder shutting down");
                    break;
                }
            }
        }
    }

    pub async fn record(pool: &DbPool, event: &ActivityEvent) -> Result<ActivityLog, sqlx::Error> {
        let input = CreateActivityLog {
            user_id: event.user_id,
            action: event.action.clone(),
            model_name: event.model_name.clone(),
            object_name: event.object_name.clone(),
        };
        ActivityRepo::create(pool, &input).await
    }
}
