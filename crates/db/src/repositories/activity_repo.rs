//! Repository for the `activity_logs` table.

use sqlx::PgPool;
use storybible_core::types::DbId;

use crate::models::activity::{ActivityLog, CreateActivityLog};

const COLUMNS: &str = "id, user_id, action, model_name, object_name, created_at";

pub struct ActivityRepo;

impl ActivityRepo {
    pub async fn create(pool: &PgPool, input: &CreateActivityLog) -> Result<ActivityLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO activity_logs (user_id, action, model_name, object_name)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ActivityLog>(&query)
            .bind(input.user_id)
            .bind(&input.action)
            .bind(&input.model_name)
            .bind(&input.object_name)
            .fetch_one(pool)
            .await
    }

    /// Newest entries first.
    pub async fn list_recent(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ActivityLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM activity_logs WHERE user_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, ActivityLog>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
