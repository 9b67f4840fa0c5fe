//! Repository for the `chapters` table.
//!
//! Chapters carry no `user_id`; ownership is checked through the parent
//! book in every user-facing query.

use sqlx::PgPool;
use storybible_core::types::DbId;

use crate::models::chapter::{Chapter, CreateChapter, UpdateChapter, UpsertChapter};

const COLUMNS: &str = "c.id, c.book_id, c.chapter_number, c.title, c.description, c.content, \
                       c.word_count, c.is_complete, c.created_at, c.updated_at";

/// Same columns without the table alias, for `RETURNING` clauses.
const RETURNING: &str = "id, book_id, chapter_number, title, description, content, \
                         word_count, is_complete, created_at, updated_at";

pub struct ChapterRepo;

impl ChapterRepo {
    /// Insert a chapter. `word_count` is derived by the caller from `content`.
    pub async fn create(
        pool: &PgPool,
        book_id: DbId,
        input: &CreateChapter,
        word_count: i32,
    ) -> Result<Chapter, sqlx::Error> {
        let query = format!(
            "INSERT INTO chapters (book_id, chapter_number, title, description, content, word_count, is_complete)
             VALUES (
                $1,
                COALESCE($2, (SELECT COALESCE(MAX(chapter_number), 0) + 1 FROM chapters WHERE book_id = $1)),
                $3, COALESCE($4, ''), COALESCE($5, ''), $6, COALESCE($7, false))
             RETURNING {RETURNING}"
        );
        sqlx::query_as::<_, Chapter>(&query)
            .bind(book_id)
            .bind(input.chapter_number)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.content)
            .bind(word_count)
            .bind(input.is_complete)
            .fetch_one(pool)
            .await
    }

    /// Insert or refresh an imported chapter keyed by `(book_id, chapter_number)`.
    pub async fn upsert(pool: &PgPool, input: &UpsertChapter) -> Result<Chapter, sqlx::Error> {
        let query = format!(
            "INSERT INTO chapters (book_id, chapter_number, title, description, content, word_count)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT ON CONSTRAINT uq_chapters_book_number DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                content = EXCLUDED.content,
                word_count = EXCLUDED.word_count
             RETURNING {RETURNING}"
        );
        sqlx::query_as::<_, Chapter>(&query)
            .bind(input.book_id)
            .bind(input.chapter_number)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.content)
            .bind(input.word_count)
            .fetch_one(pool)
            .await
    }

    /// Find a chapter whose book belongs to `user_id`.
    pub async fn find_by_id(pool: &PgPool, user_id: DbId, id: DbId) -> Result<Option<Chapter>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM chapters c
             JOIN books b ON b.id = c.book_id
             WHERE c.id = $1 AND b.user_id = $2"
        );
        sqlx::query_as::<_, Chapter>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List chapters of a book in chapter order.
    pub async fn list_by_book(pool: &PgPool, book_id: DbId) -> Result<Vec<Chapter>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM chapters c WHERE c.book_id = $1 ORDER BY c.chapter_number ASC"
        );
        sqlx::query_as::<_, Chapter>(&query)
            .bind(book_id)
            .fetch_all(pool)
            .await
    }

    /// The number a new chapter in this book would get.
    pub async fn next_number(pool: &PgPool, book_id: DbId) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar::<_, i32>(
            "SELECT COALESCE(MAX(chapter_number), 0) + 1 FROM chapters WHERE book_id = $1",
        )
        .bind(book_id)
        .fetch_one(pool)
        .await
    }

    /// Update a chapter. `word_count` is recomputed by the caller when
    /// `content` changes.
    pub async fn update(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
        input: &UpdateChapter,
        word_count: Option<i32>,
    ) -> Result<Option<Chapter>, sqlx::Error> {
        let query = format!(
            "UPDATE chapters SET
                chapter_number = COALESCE($3, chapter_number),
                title = COALESCE($4, title),
                description = COALESCE($5, description),
                content = COALESCE($6, content),
                word_count = COALESCE($7, word_count),
                is_complete = COALESCE($8, is_complete)
             WHERE id = $1
               AND book_id IN (SELECT id FROM books WHERE user_id = $2)
             RETURNING {RETURNING}"
        );
        sqlx::query_as::<_, Chapter>(&query)
            .bind(id)
            .bind(user_id)
            .bind(input.chapter_number)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.content)
            .bind(word_count)
            .bind(input.is_complete)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, user_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM chapters
             WHERE id = $1 AND book_id IN (SELECT id FROM books WHERE user_id = $2)",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
