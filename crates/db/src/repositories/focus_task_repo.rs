//! Repository for the `focus_tasks` table.

use sqlx::PgPool;
use storybible_core::types::DbId;

use crate::models::focus_task::FocusTask;

const COLUMNS: &str = "id, user_id, task_text, is_completed, created_at";

pub struct FocusTaskRepo;

impl FocusTaskRepo {
    /// Tasks created since midnight UTC today.
    pub async fn list_today(pool: &PgPool, user_id: DbId) -> Result<Vec<FocusTask>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM focus_tasks
             WHERE user_id = $1 AND created_at >= date_trunc('day', NOW())
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, FocusTask>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Insert a day's tasks in one statement.
    pub async fn create_many(
        pool: &PgPool,
        user_id: DbId,
        tasks: &[String],
    ) -> Result<Vec<FocusTask>, sqlx::Error> {
        let query = format!(
            "INSERT INTO focus_tasks (user_id, task_text)
             SELECT $1, t FROM UNNEST($2::TEXT[]) WITH ORDINALITY AS u(t, ord)
             ORDER BY ord
             RETURNING {COLUMNS}"
        );
        let mut created = sqlx::query_as::<_, FocusTask>(&query)
            .bind(user_id)
            .bind(tasks)
            .fetch_all(pool)
            .await?;
        created.sort_by_key(|t| t.id);
        Ok(created)
    }

    pub async fn complete(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
    ) -> Result<Option<FocusTask>, sqlx::Error> {
        let query = format!(
            "UPDATE focus_tasks SET is_completed = true WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FocusTask>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }
}
