//! Character entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storybible_core::characters::NamedCharacter;
use storybible_core::types::{DbId, Timestamp};

/// A character row from the `characters` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Character {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub nickname: String,
    /// Comma-separated alternative names.
    pub aliases: String,
    pub role: String,
    pub description: String,
    pub motivation: String,
    pub goals: String,
    pub traits: String,
    pub color_code: String,
    pub introduction_book_id: Option<DbId>,
    pub introduction_chapter_id: Option<DbId>,
    pub is_active: bool,
    pub profile_image_path: Option<String>,
    pub avatar_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl NamedCharacter for Character {
    fn name(&self) -> &str {
        &self.name
    }

    fn nickname(&self) -> Option<&str> {
        Some(self.nickname.as_str()).filter(|n| !n.trim().is_empty())
    }

    fn aliases(&self) -> Option<&str> {
        Some(self.aliases.as_str()).filter(|a| !a.trim().is_empty())
    }
}

/// DTO for creating a new character.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCharacter {
    pub name: String,
    pub nickname: Option<String>,
    pub aliases: Option<String>,
    /// Defaults to `supporting` if omitted.
    pub role: Option<String>,
    pub description: Option<String>,
    pub motivation: Option<String>,
    pub goals: Option<String>,
    pub traits: Option<String>,
    pub color_code: Option<String>,
    pub introduction_book_id: Option<DbId>,
    pub introduction_chapter_id: Option<DbId>,
    pub is_active: Option<bool>,
    pub avatar_id: Option<String>,
}

/// DTO for updating an existing character. All fields are optional; an
/// explicit `null` clears the introduction book or chapter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCharacter {
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub aliases: Option<String>,
    pub role: Option<String>,
    pub description: Option<String>,
    pub motivation: Option<String>,
    pub goals: Option<String>,
    pub traits: Option<String>,
    pub color_code: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub introduction_book_id: Option<Option<DbId>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub introduction_chapter_id: Option<Option<DbId>>,
    pub is_active: Option<bool>,
    pub avatar_id: Option<String>,
}
