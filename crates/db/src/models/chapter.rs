//! Chapter entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storybible_core::types::{DbId, Timestamp};

/// A chapter row from the `chapters` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Chapter {
    pub id: DbId,
    pub book_id: DbId,
    pub chapter_number: i32,
    pub title: String,
    pub description: String,
    pub content: String,
    pub word_count: i32,
    pub is_complete: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a chapter. `book_id` comes from the route.
///
/// A missing `chapter_number` takes the next number in the book.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateChapter {
    pub chapter_number: Option<i32>,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub is_complete: Option<bool>,
}

/// DTO for updating an existing chapter. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateChapter {
    pub chapter_number: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub is_complete: Option<bool>,
}

/// Import write: chapter content keyed by `(book_id, chapter_number)`.
#[derive(Debug, Clone)]
pub struct UpsertChapter {
    pub book_id: DbId,
    pub chapter_number: i32,
    pub title: String,
    pub description: String,
    pub content: String,
    pub word_count: i32,
}
