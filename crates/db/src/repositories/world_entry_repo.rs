//! Repository for the `world_entries` table.

use sqlx::PgPool;
use storybible_core::types::DbId;

use crate::models::world_entry::{CreateWorldEntry, UpdateWorldEntry, WorldEntry, WorldEntryFilter};

const COLUMNS: &str =
    "id, user_id, book_id, title, category, content, image_path, created_at, updated_at";

pub struct WorldEntryRepo;

impl WorldEntryRepo {
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateWorldEntry,
    ) -> Result<WorldEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO world_entries (user_id, book_id, title, category, content)
             VALUES ($1, $2, $3, COALESCE($4, 'other'), COALESCE($5, ''))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorldEntry>(&query)
            .bind(user_id)
            .bind(input.book_id)
            .bind(&input.title)
            .bind(&input.category)
            .bind(&input.content)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
    ) -> Result<Option<WorldEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM world_entries WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, WorldEntry>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List entries by category then title, optionally filtered.
    pub async fn list(
        pool: &PgPool,
        user_id: DbId,
        filter: &WorldEntryFilter,
    ) -> Result<Vec<WorldEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM world_entries
             WHERE user_id = $1
               AND ($2::TEXT IS NULL OR category = $2)
               AND ($3::BIGINT IS NULL OR book_id = $3)
             ORDER BY category ASC, title ASC"
        );
        sqlx::query_as::<_, WorldEntry>(&query)
            .bind(user_id)
            .bind(&filter.category)
            .bind(filter.book_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
        input: &UpdateWorldEntry,
    ) -> Result<Option<WorldEntry>, sqlx::Error> {
        let query = format!(
            "UPDATE world_entries SET
                title = COALESCE($3, title),
                category = COALESCE($4, category),
                content = COALESCE($5, content),
                book_id = COALESCE($6, book_id)
             WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorldEntry>(&query)
            .bind(id)
            .bind(user_id)
            .bind(&input.title)
            .bind(&input.category)
            .bind(&input.content)
            .bind(input.book_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_image(pool: &PgPool, id: DbId, path: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE world_entries SET image_path = $2 WHERE id = $1")
            .bind(id)
            .bind(path)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &PgPool, user_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM world_entries WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
