//! Repository for the `books` table.

use sqlx::PgPool;
use storybible_core::choices::BOOK_STATUS_PLANNING;
use storybible_core::types::DbId;

use crate::models::book::{Book, CreateBook, ImportStatus, UpdateBook};

const COLUMNS: &str = "id, user_id, title, series_order, description, word_count_target, \
                       current_word_count, status, import_progress, import_status_message, \
                       last_import_update, started_date, completed_date, cover_image_path, \
                       created_at, updated_at";

/// Provides CRUD, progress and word-count operations for books.
pub struct BookRepo;

impl BookRepo {
    /// Insert a new book for `user_id`.
    ///
    /// A missing `series_order` takes `MAX(series_order) + 1` for the user.
    pub async fn create(pool: &PgPool, user_id: DbId, input: &CreateBook) -> Result<Book, sqlx::Error> {
        let query = format!(
            "INSERT INTO books
                (user_id, title, series_order, description, word_count_target, status,
                 started_date, completed_date)
             VALUES (
                $1, $2,
                COALESCE($3, (SELECT COALESCE(MAX(series_order), 0) + 1 FROM books WHERE user_id = $1)),
                COALESCE($4, ''), COALESCE($5, 160000), COALESCE($6, '{BOOK_STATUS_PLANNING}'),
                $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Book>(&query)
            .bind(user_id)
            .bind(&input.title)
            .bind(input.series_order)
            .bind(&input.description)
            .bind(input.word_count_target)
            .bind(&input.status)
            .bind(input.started_date)
            .bind(input.completed_date)
            .fetch_one(pool)
            .await
    }

    /// Find a book owned by `user_id`.
    pub async fn find_by_id(pool: &PgPool, user_id: DbId, id: DbId) -> Result<Option<Book>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM books WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a book regardless of owner. Used by background jobs that already
    /// validated ownership when they were queued.
    pub async fn find_unscoped(pool: &PgPool, id: DbId) -> Result<Option<Book>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM books WHERE id = $1");
        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's books in series order.
    pub async fn list_by_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Book>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM books WHERE user_id = $1 ORDER BY series_order ASC, id ASC"
        );
        sqlx::query_as::<_, Book>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Books that are neither complete nor published.
    pub async fn list_in_progress(pool: &PgPool, user_id: DbId) -> Result<Vec<Book>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM books
             WHERE user_id = $1 AND status NOT IN ('complete', 'published')
             ORDER BY series_order ASC"
        );
        sqlx::query_as::<_, Book>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Update a book. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
        input: &UpdateBook,
    ) -> Result<Option<Book>, sqlx::Error> {
        let query = format!(
            "UPDATE books SET
                title = COALESCE($3, title),
                series_order = COALESCE($4, series_order),
                description = COALESCE($5, description),
                word_count_target = COALESCE($6, word_count_target),
                status = COALESCE($7, status),
                started_date = COALESCE($8, started_date),
                completed_date = COALESCE($9, completed_date)
             WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .bind(user_id)
            .bind(&input.title)
            .bind(input.series_order)
            .bind(&input.description)
            .bind(input.word_count_target)
            .bind(&input.status)
            .bind(input.started_date)
            .bind(input.completed_date)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_cover_image(
        pool: &PgPool,
        id: DbId,
        path: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE books SET cover_image_path = $2 WHERE id = $1")
            .bind(id)
            .bind(path)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a book and (by cascade) its chapters and events.
    pub async fn delete(pool: &PgPool, user_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Background job progress
    // -----------------------------------------------------------------------

    /// Record job progress. `status` is left unchanged when `None`.
    pub async fn update_progress(
        pool: &PgPool,
        id: DbId,
        status: Option<&str>,
        progress: i32,
        message: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE books SET
                status = COALESCE($2, status),
                import_progress = $3,
                import_status_message = $4,
                last_import_update = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(progress.clamp(0, 100))
        .bind(message)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace only the status message, keeping progress where it is.
    pub async fn update_status_message(
        pool: &PgPool,
        id: DbId,
        status: Option<&str>,
        message: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE books SET
                status = COALESCE($2, status),
                import_status_message = $3,
                last_import_update = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(message)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn import_status(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
    ) -> Result<Option<ImportStatus>, sqlx::Error> {
        sqlx::query_as::<_, ImportStatus>(
            "SELECT id, status, import_progress, import_status_message, last_import_update
             FROM books WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Recompute `current_word_count` and return the new value.
    ///
    /// Takes the larger of the scene total and the chapter total, so an
    /// imported manuscript counts before its scenes are written out.
    pub async fn recompute_word_count(pool: &PgPool, id: DbId) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar::<_, i32>(
            "UPDATE books SET current_word_count = GREATEST(
                (SELECT COALESCE(SUM(word_count), 0) FROM events WHERE book_id = $1),
                (SELECT COALESCE(SUM(word_count), 0) FROM chapters WHERE book_id = $1)
             )::INTEGER
             WHERE id = $1
             RETURNING current_word_count",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map(|v| v.unwrap_or(0))
    }
}
