//! Repository for the `characters` table.

use sqlx::PgPool;
use storybible_core::choices::CHARACTER_ROLE_DEFAULT;
use storybible_core::types::DbId;

use crate::models::character::{Character, CreateCharacter, UpdateCharacter};

const COLUMNS: &str = "id, user_id, name, nickname, aliases, role, description, motivation, \
                       goals, traits, color_code, introduction_book_id, introduction_chapter_id, \
                       is_active, profile_image_path, avatar_id, created_at, updated_at";

/// Provides CRUD operations for characters.
pub struct CharacterRepo;

impl CharacterRepo {
    /// Insert a new character for `user_id`.
    ///
    /// If `role` is `None`, defaults to `supporting`.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateCharacter,
    ) -> Result<Character, sqlx::Error> {
        let query = format!(
            "INSERT INTO characters
                (user_id, name, nickname, aliases, role, description, motivation, goals, traits,
                 color_code, introduction_book_id, introduction_chapter_id, is_active, avatar_id)
             VALUES ($1, $2, COALESCE($3, ''), COALESCE($4, ''), COALESCE($5, '{CHARACTER_ROLE_DEFAULT}'),
                     COALESCE($6, ''), COALESCE($7, ''), COALESCE($8, ''), COALESCE($9, ''),
                     COALESCE($10, '#3498db'), $11, $12, COALESCE($13, true), $14)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(user_id)
            .bind(&input.name)
            .bind(&input.nickname)
            .bind(&input.aliases)
            .bind(&input.role)
            .bind(&input.description)
            .bind(&input.motivation)
            .bind(&input.goals)
            .bind(&input.traits)
            .bind(&input.color_code)
            .bind(input.introduction_book_id)
            .bind(input.introduction_chapter_id)
            .bind(input.is_active)
            .bind(&input.avatar_id)
            .fetch_one(pool)
            .await
    }

    /// Find a character owned by `user_id`.
    pub async fn find_by_id(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
    ) -> Result<Option<Character>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM characters WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Character>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List all of a user's characters, ordered by name ascending.
    pub async fn list_by_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Character>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM characters WHERE user_id = $1 ORDER BY name ASC");
        sqlx::query_as::<_, Character>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Characters linked to any event of the given chapter.
    pub async fn list_by_chapter(pool: &PgPool, chapter_id: DbId) -> Result<Vec<Character>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM characters
             WHERE id IN (
                SELECT ec.character_id FROM event_characters ec
                JOIN events e ON e.id = ec.event_id
                WHERE e.chapter_id = $1
             )
             ORDER BY name ASC"
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(chapter_id)
            .fetch_all(pool)
            .await
    }

    /// Characters appearing in at least one event of the book.
    pub async fn list_by_book(pool: &PgPool, book_id: DbId) -> Result<Vec<Character>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM characters
             WHERE id IN (
                SELECT ec.character_id FROM event_characters ec
                JOIN events e ON e.id = ec.event_id
                WHERE e.book_id = $1
             )
             ORDER BY name ASC"
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(book_id)
            .fetch_all(pool)
            .await
    }

    /// Update a character. Only non-`None` fields in `input` are applied;
    /// `Some(None)` clears a nullable reference.
    ///
    /// Returns `None` if no row with the given `id` exists for the user.
    pub async fn update(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
        input: &UpdateCharacter,
    ) -> Result<Option<Character>, sqlx::Error> {
        let query = format!(
            "UPDATE characters SET
                name = COALESCE($3, name),
                nickname = COALESCE($4, nickname),
                aliases = COALESCE($5, aliases),
                role = COALESCE($6, role),
                description = COALESCE($7, description),
                motivation = COALESCE($8, motivation),
                goals = COALESCE($9, goals),
                traits = COALESCE($10, traits),
                color_code = COALESCE($11, color_code),
                introduction_book_id = CASE WHEN $16 THEN $12 ELSE introduction_book_id END,
                introduction_chapter_id = CASE WHEN $17 THEN $13 ELSE introduction_chapter_id END,
                is_active = COALESCE($14, is_active),
                avatar_id = COALESCE($15, avatar_id)
             WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(id)
            .bind(user_id)
            .bind(&input.name)
            .bind(&input.nickname)
            .bind(&input.aliases)
            .bind(&input.role)
            .bind(&input.description)
            .bind(&input.motivation)
            .bind(&input.goals)
            .bind(&input.traits)
            .bind(&input.color_code)
            .bind(input.introduction_book_id.flatten())
            .bind(input.introduction_chapter_id.flatten())
            .bind(input.is_active)
            .bind(&input.avatar_id)
            .bind(input.introduction_book_id.is_some())
            .bind(input.introduction_chapter_id.is_some())
            .fetch_optional(pool)
            .await
    }

    pub async fn set_profile_image(
        pool: &PgPool,
        id: DbId,
        path: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE characters SET profile_image_path = $2 WHERE id = $1")
            .bind(id)
            .bind(path)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Permanently delete a character. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, user_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM characters WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
