//! Event (scene) entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storybible_core::types::{DbId, Timestamp};

/// An event row from the `events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    pub description: String,
    pub content_html: String,
    pub content_json: Option<serde_json::Value>,
    pub book_id: DbId,
    pub chapter_id: Option<DbId>,
    pub sequence_order: i32,
    pub chronological_order: i32,
    pub story_date: String,
    pub location: String,
    pub pov_character_id: Option<DbId>,
    pub emotional_tone: String,
    pub story_beat: String,
    pub tension_level: i32,
    pub notes: String,
    pub word_count: i32,
    pub is_written: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An event together with its character and tag links.
#[derive(Debug, Clone, Serialize)]
pub struct EventWithLinks {
    #[serde(flatten)]
    pub event: Event,
    pub character_ids: Vec<DbId>,
    pub tag_ids: Vec<DbId>,
}

/// DTO for creating a new event.
///
/// `sequence_order` defaults to the end of the book; `chronological_order`
/// defaults to `sequence_order`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateEvent {
    pub title: String,
    pub book_id: DbId,
    pub chapter_id: Option<DbId>,
    pub description: Option<String>,
    pub content_html: Option<String>,
    pub content_json: Option<serde_json::Value>,
    pub sequence_order: Option<i32>,
    pub chronological_order: Option<i32>,
    pub story_date: Option<String>,
    pub location: Option<String>,
    pub pov_character_id: Option<DbId>,
    pub emotional_tone: Option<String>,
    pub story_beat: Option<String>,
    pub tension_level: Option<i32>,
    pub notes: Option<String>,
    pub word_count: Option<i32>,
    pub is_written: Option<bool>,
    pub character_ids: Option<Vec<DbId>>,
    pub tag_ids: Option<Vec<DbId>>,
}

/// DTO for updating an existing event. All fields are optional; link lists
/// replace the current links when present. `chapter_id` and
/// `pov_character_id` are cleared by an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEvent {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub chapter_id: Option<Option<DbId>>,
    pub description: Option<String>,
    pub content_html: Option<String>,
    pub content_json: Option<serde_json::Value>,
    pub sequence_order: Option<i32>,
    pub chronological_order: Option<i32>,
    pub story_date: Option<String>,
    pub location: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub pov_character_id: Option<Option<DbId>>,
    pub emotional_tone: Option<String>,
    pub story_beat: Option<String>,
    pub tension_level: Option<i32>,
    pub notes: Option<String>,
    pub word_count: Option<i32>,
    pub is_written: Option<bool>,
    pub character_ids: Option<Vec<DbId>>,
    pub tag_ids: Option<Vec<DbId>>,
}

/// Timeline filters. All are optional and combine with AND.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    pub book_id: Option<DbId>,
    pub chapter_id: Option<DbId>,
    pub character_id: Option<DbId>,
    pub tag_id: Option<DbId>,
}

/// A scene shared by two characters, as fed to relationship synthesis.
#[derive(Debug, Clone, FromRow)]
pub struct SharedScene {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub content_html: String,
    pub chronological_order: i32,
    pub sequence_order: i32,
}

/// Two characters appearing together in at least one event of a book.
#[derive(Debug, Clone, Copy, FromRow, PartialEq, Eq)]
pub struct CoOccurringPair {
    pub character_a_id: DbId,
    pub character_b_id: DbId,
    pub shared_events: i64,
}

/// A character with the number of book events they appear in.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct CharacterAppearance {
    pub character_id: DbId,
    pub event_count: i64,
}
