//! Repository for the `tags` table.

use sqlx::PgPool;
use storybible_core::types::DbId;

use crate::models::tag::{CreateTag, Tag, UpdateTag};

const COLUMNS: &str = "id, user_id, name, category, color, description, created_at, updated_at";

pub struct TagRepo;

impl TagRepo {
    pub async fn create(pool: &PgPool, user_id: DbId, input: &CreateTag) -> Result<Tag, sqlx::Error> {
        let query = format!(
            "INSERT INTO tags (user_id, name, category, color, description)
             VALUES ($1, $2, COALESCE($3, 'other'), COALESCE($4, '#95a5a6'), COALESCE($5, ''))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(user_id)
            .bind(&input.name)
            .bind(&input.category)
            .bind(&input.color)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, user_id: DbId, id: DbId) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tags WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List tags ordered by category, then name.
    pub async fn list_by_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Tag>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tags WHERE user_id = $1 ORDER BY category ASC, name ASC"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
        input: &UpdateTag,
    ) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!(
            "UPDATE tags SET
                name = COALESCE($3, name),
                category = COALESCE($4, category),
                color = COALESCE($5, color),
                description = COALESCE($6, description)
             WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .bind(user_id)
            .bind(&input.name)
            .bind(&input.category)
            .bind(&input.color)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, user_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
