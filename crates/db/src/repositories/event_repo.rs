//! Repository for the `events` table and its character/tag link tables.

use std::collections::HashMap;

use sqlx::PgPool;
use storybible_core::types::DbId;

use crate::models::event::{
    CharacterAppearance, CoOccurringPair, CreateEvent, Event, EventFilter, EventWithLinks,
    SharedScene, UpdateEvent,
};

const COLUMNS: &str = "e.id, e.user_id, e.title, e.description, e.content_html, e.content_json, \
                       e.book_id, e.chapter_id, e.sequence_order, e.chronological_order, \
                       e.story_date, e.location, e.pov_character_id, e.emotional_tone, \
                       e.story_beat, e.tension_level, e.notes, e.word_count, e.is_written, \
                       e.created_at, e.updated_at";

const RETURNING: &str = "id, user_id, title, description, content_html, content_json, \
                         book_id, chapter_id, sequence_order, chronological_order, \
                         story_date, location, pov_character_id, emotional_tone, \
                         story_beat, tension_level, notes, word_count, is_written, \
                         created_at, updated_at";

/// Direction for a single-step move on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

pub struct EventRepo;

impl EventRepo {
    /// Insert an event and its links in one transaction.
    ///
    /// `sequence_order` defaults to the end of the book and
    /// `chronological_order` (when absent or 0) to the sequence order.
    /// Linked ids not owned by `user_id` are ignored.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateEvent,
        word_count: i32,
    ) -> Result<Event, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "WITH next AS (
                SELECT COALESCE(MAX(sequence_order), 0) + 1 AS n FROM events WHERE book_id = $2
             )
             INSERT INTO events
                (user_id, book_id, chapter_id, title, description, content_html, content_json,
                 sequence_order, chronological_order, story_date, location, pov_character_id,
                 emotional_tone, story_beat, tension_level, notes, word_count, is_written)
             SELECT $1, $2, $3, $4, COALESCE($5, ''), COALESCE($6, ''), $7,
                    COALESCE($8, next.n),
                    COALESCE(NULLIF($9, 0), $8, next.n),
                    COALESCE($10, ''), COALESCE($11, ''), $12,
                    COALESCE($13, 'neutral'), COALESCE($14, ''), COALESCE($15, 5),
                    COALESCE($16, ''), $17, COALESCE($18, false)
             FROM next
             RETURNING {RETURNING}"
        );
        let event = sqlx::query_as::<_, Event>(&query)
            .bind(user_id)
            .bind(input.book_id)
            .bind(input.chapter_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.content_html)
            .bind(&input.content_json)
            .bind(input.sequence_order)
            .bind(input.chronological_order)
            .bind(&input.story_date)
            .bind(&input.location)
            .bind(input.pov_character_id)
            .bind(&input.emotional_tone)
            .bind(&input.story_beat)
            .bind(input.tension_level)
            .bind(&input.notes)
            .bind(word_count)
            .bind(input.is_written)
            .bind(input.chapter_id.is_some())
            .bind(input.pov_character_id.is_some())
            .fetch_one(&mut *tx)
            .await?;

        if let Some(ids) = &input.character_ids {
            Self::set_characters_inner(&mut tx, user_id, event.id, ids).await?;
        }
        if let Some(ids) = &input.tag_ids {
            Self::set_tags_inner(&mut tx, user_id, event.id, ids).await?;
        }

        tx.commit().await?;
        Ok(event)
    }

    pub async fn find_by_id(pool: &PgPool, user_id: DbId, id: DbId) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events e WHERE e.id = $1 AND e.user_id = $2");
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Find an event with its character and tag ids.
    pub async fn find_with_links(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
    ) -> Result<Option<EventWithLinks>, sqlx::Error> {
        let Some(event) = Self::find_by_id(pool, user_id, id).await? else {
            return Ok(None);
        };
        Ok(Self::attach_links(pool, vec![event]).await?.pop())
    }

    /// Timeline listing in sequence order. The character filter also matches
    /// the POV character.
    pub async fn list(
        pool: &PgPool,
        user_id: DbId,
        filter: &EventFilter,
    ) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events e
             WHERE e.user_id = $1
               AND ($2::BIGINT IS NULL OR e.book_id = $2)
               AND ($3::BIGINT IS NULL OR e.chapter_id = $3)
               AND ($4::BIGINT IS NULL OR e.pov_character_id = $4 OR EXISTS (
                    SELECT 1 FROM event_characters ec
                    WHERE ec.event_id = e.id AND ec.character_id = $4))
               AND ($5::BIGINT IS NULL OR EXISTS (
                    SELECT 1 FROM event_tags et
                    WHERE et.event_id = e.id AND et.tag_id = $5))
             ORDER BY e.sequence_order ASC, e.id ASC"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(user_id)
            .bind(filter.book_id)
            .bind(filter.chapter_id)
            .bind(filter.character_id)
            .bind(filter.tag_id)
            .fetch_all(pool)
            .await
    }

    /// Most recently edited events.
    pub async fn list_recent(pool: &PgPool, user_id: DbId, limit: i64) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events e WHERE e.user_id = $1
             ORDER BY e.updated_at DESC LIMIT $2"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Planned but unwritten events, earliest in the timeline first.
    pub async fn list_unwritten(pool: &PgPool, user_id: DbId, limit: i64) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events e WHERE e.user_id = $1 AND e.is_written = false
             ORDER BY e.sequence_order ASC LIMIT $2"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Attach character and tag ids to a batch of events, keeping order.
    pub async fn attach_links(
        pool: &PgPool,
        events: Vec<Event>,
    ) -> Result<Vec<EventWithLinks>, sqlx::Error> {
        let ids: Vec<DbId> = events.iter().map(|e| e.id).collect();

        let char_rows: Vec<(DbId, DbId)> = sqlx::query_as(
            "SELECT event_id, character_id FROM event_characters
             WHERE event_id = ANY($1) ORDER BY character_id",
        )
        .bind(&ids)
        .fetch_all(pool)
        .await?;
        let tag_rows: Vec<(DbId, DbId)> = sqlx::query_as(
            "SELECT event_id, tag_id FROM event_tags WHERE event_id = ANY($1) ORDER BY tag_id",
        )
        .bind(&ids)
        .fetch_all(pool)
        .await?;

        let mut chars: HashMap<DbId, Vec<DbId>> = HashMap::new();
        for (event_id, character_id) in char_rows {
            chars.entry(event_id).or_default().push(character_id);
        }
        let mut tags: HashMap<DbId, Vec<DbId>> = HashMap::new();
        for (event_id, tag_id) in tag_rows {
            tags.entry(event_id).or_default().push(tag_id);
        }

        Ok(events
            .into_iter()
            .map(|event| EventWithLinks {
                character_ids: chars.remove(&event.id).unwrap_or_default(),
                tag_ids: tags.remove(&event.id).unwrap_or_default(),
                event,
            })
            .collect())
    }

    /// Update an event. Link lists, when present, replace existing links.
    ///
    /// Nullable references use `Option<Option<_>>`: the outer `Some` sets the
    /// column, including to NULL.
    pub async fn update(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
        input: &UpdateEvent,
        word_count: Option<i32>,
    ) -> Result<Option<Event>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE events SET
                title = COALESCE($3, title),
                chapter_id = CASE WHEN $19 THEN $4 ELSE chapter_id END,
                description = COALESCE($5, description),
                content_html = COALESCE($6, content_html),
                content_json = COALESCE($7, content_json),
                sequence_order = COALESCE($8, sequence_order),
                chronological_order = COALESCE($9, chronological_order),
                story_date = COALESCE($10, story_date),
                location = COALESCE($11, location),
                pov_character_id = CASE WHEN $20 THEN $12 ELSE pov_character_id END,
                emotional_tone = COALESCE($13, emotional_tone),
                story_beat = COALESCE($14, story_beat),
                tension_level = COALESCE($15, tension_level),
                notes = COALESCE($16, notes),
                word_count = COALESCE($17, word_count),
                is_written = COALESCE($18, is_written)
             WHERE id = $1 AND user_id = $2
             RETURNING {RETURNING}"
        );
        let event = sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .bind(user_id)
            .bind(&input.title)
            .bind(input.chapter_id.flatten())
            .bind(&input.description)
            .bind(&input.content_html)
            .bind(&input.content_json)
            .bind(input.sequence_order)
            .bind(input.chronological_order)
            .bind(&input.story_date)
            .bind(&input.location)
            .bind(input.pov_character_id.flatten())
            .bind(&input.emotional_tone)
            .bind(&input.story_beat)
            .bind(input.tension_level)
            .bind(&input.notes)
            .bind(word_count)
            .bind(input.is_written)
            .bind(input.chapter_id.is_some())
            .bind(input.pov_character_id.is_some())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(event) = event else {
            return Ok(None);
        };
        if let Some(ids) = &input.character_ids {
            Self::set_characters_inner(&mut tx, user_id, event.id, ids).await?;
        }
        if let Some(ids) = &input.tag_ids {
            Self::set_tags_inner(&mut tx, user_id, event.id, ids).await?;
        }

        tx.commit().await?;
        Ok(Some(event))
    }

    pub async fn delete(pool: &PgPool, user_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set an explicit sequence position.
    pub async fn set_sequence_order(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
        new_order: i32,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!(
            "UPDATE events SET sequence_order = $3 WHERE id = $1 AND user_id = $2
             RETURNING {RETURNING}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .bind(user_id)
            .bind(new_order)
            .fetch_optional(pool)
            .await
    }

    /// Move an event one step on its book's timeline.
    ///
    /// Swaps sequence positions with the neighbouring event when there is
    /// one. Otherwise "up" decrements down to 1 and "down" increments.
    pub async fn move_step(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
        direction: MoveDirection,
    ) -> Result<Option<Event>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM events e WHERE e.id = $1 AND e.user_id = $2 FOR UPDATE");
        let Some(event) = sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let neighbour_query = match direction {
            MoveDirection::Up => {
                "SELECT id, sequence_order FROM events
                 WHERE book_id = $1 AND id <> $2 AND sequence_order <= $3
                 ORDER BY sequence_order DESC, id DESC LIMIT 1 FOR UPDATE"
            }
            MoveDirection::Down => {
                "SELECT id, sequence_order FROM events
                 WHERE book_id = $1 AND id <> $2 AND sequence_order >= $3
                 ORDER BY sequence_order ASC, id ASC LIMIT 1 FOR UPDATE"
            }
        };
        let neighbour: Option<(DbId, i32)> = sqlx::query_as(neighbour_query)
            .bind(event.book_id)
            .bind(event.id)
            .bind(event.sequence_order)
            .fetch_optional(&mut *tx)
            .await?;

        let new_order = match (neighbour, direction) {
            (Some((other_id, other_order)), _) => {
                let displaced = if other_order == event.sequence_order {
                    match direction {
                        MoveDirection::Up => other_order + 1,
                        MoveDirection::Down => (other_order - 1).max(1),
                    }
                } else {
                    event.sequence_order
                };
                sqlx::query("UPDATE events SET sequence_order = $2 WHERE id = $1")
                    .bind(other_id)
                    .bind(displaced)
                    .execute(&mut *tx)
                    .await?;
                other_order
            }
            (None, MoveDirection::Up) => (event.sequence_order - 1).max(1),
            (None, MoveDirection::Down) => event.sequence_order + 1,
        };

        let update = format!(
            "UPDATE events SET sequence_order = $2 WHERE id = $1 RETURNING {RETURNING}"
        );
        let moved = sqlx::query_as::<_, Event>(&update)
            .bind(event.id)
            .bind(new_order)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(moved))
    }

    /// Next free sequence position in a book.
    pub async fn next_sequence_order(pool: &PgPool, book_id: DbId) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar::<_, i32>(
            "SELECT COALESCE(MAX(sequence_order), 0) + 1 FROM events WHERE book_id = $1",
        )
        .bind(book_id)
        .fetch_one(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Relationship and deep-scan queries
    // -----------------------------------------------------------------------

    /// Scenes of a book shared by two characters: both linked, or one is the
    /// POV character and the other linked. Chronological order.
    pub async fn shared_scenes(
        pool: &PgPool,
        book_id: DbId,
        character_a_id: DbId,
        character_b_id: DbId,
    ) -> Result<Vec<SharedScene>, sqlx::Error> {
        sqlx::query_as::<_, SharedScene>(
            "SELECT e.id, e.title, e.description, e.location, e.content_html,
                    e.chronological_order, e.sequence_order
             FROM events e
             WHERE e.book_id = $1
               AND (e.pov_character_id = $2 OR EXISTS (
                    SELECT 1 FROM event_characters WHERE event_id = e.id AND character_id = $2))
               AND (e.pov_character_id = $3 OR EXISTS (
                    SELECT 1 FROM event_characters WHERE event_id = e.id AND character_id = $3))
             ORDER BY e.chronological_order ASC, e.sequence_order ASC, e.id ASC",
        )
        .bind(book_id)
        .bind(character_a_id)
        .bind(character_b_id)
        .fetch_all(pool)
        .await
    }

    /// Scenes of a book featuring one character (linked or POV).
    pub async fn scenes_for_character(
        pool: &PgPool,
        book_id: DbId,
        character_id: DbId,
        limit: i64,
    ) -> Result<Vec<SharedScene>, sqlx::Error> {
        sqlx::query_as::<_, SharedScene>(
            "SELECT e.id, e.title, e.description, e.location, e.content_html,
                    e.chronological_order, e.sequence_order
             FROM events e
             WHERE e.book_id = $1
               AND (e.pov_character_id = $2 OR EXISTS (
                    SELECT 1 FROM event_characters WHERE event_id = e.id AND character_id = $2))
             ORDER BY e.chronological_order ASC, e.sequence_order ASC, e.id ASC
             LIMIT $3",
        )
        .bind(book_id)
        .bind(character_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Characters linked to at least `min_events` events of the book, most
    /// frequent first.
    pub async fn frequent_characters(
        pool: &PgPool,
        book_id: DbId,
        min_events: i64,
        limit: i64,
    ) -> Result<Vec<CharacterAppearance>, sqlx::Error> {
        sqlx::query_as::<_, CharacterAppearance>(
            "SELECT ec.character_id, COUNT(*) AS event_count
             FROM event_characters ec
             JOIN events e ON e.id = ec.event_id
             WHERE e.book_id = $1
             GROUP BY ec.character_id
             HAVING COUNT(*) >= $2
             ORDER BY event_count DESC, ec.character_id ASC
             LIMIT $3",
        )
        .bind(book_id)
        .bind(min_events)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Normalised character pairs that share at least one event of the book.
    pub async fn co_occurring_pairs(
        pool: &PgPool,
        book_id: DbId,
    ) -> Result<Vec<CoOccurringPair>, sqlx::Error> {
        sqlx::query_as::<_, CoOccurringPair>(
            "SELECT a.character_id AS character_a_id, b.character_id AS character_b_id,
                    COUNT(*) AS shared_events
             FROM event_characters a
             JOIN event_characters b
               ON a.event_id = b.event_id AND a.character_id < b.character_id
             JOIN events e ON e.id = a.event_id
             WHERE e.book_id = $1
             GROUP BY a.character_id, b.character_id
             ORDER BY shared_events DESC, character_a_id ASC, character_b_id ASC",
        )
        .bind(book_id)
        .fetch_all(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Replace character links within an existing transaction.
    async fn set_characters_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: DbId,
        event_id: DbId,
        character_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM event_characters WHERE event_id = $1")
            .bind(event_id)
            .execute(&mut **tx)
            .await?;
        sqlx::query(
            "INSERT INTO event_characters (event_id, character_id)
             SELECT $1, id FROM characters WHERE id = ANY($2) AND user_id = $3
             ON CONFLICT DO NOTHING",
        )
        .bind(event_id)
        .bind(character_ids)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Replace tag links within an existing transaction.
    async fn set_tags_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: DbId,
        event_id: DbId,
        tag_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM event_tags WHERE event_id = $1")
            .bind(event_id)
            .execute(&mut **tx)
            .await?;
        sqlx::query(
            "INSERT INTO event_tags (event_id, tag_id)
             SELECT $1, id FROM tags WHERE id = ANY($2) AND user_id = $3
             ON CONFLICT DO NOTHING",
        )
        .bind(event_id)
        .bind(tag_ids)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
