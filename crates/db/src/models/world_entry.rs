//! World-building entry model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storybible_core::types::{DbId, Timestamp};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorldEntry {
    pub id: DbId,
    pub user_id: DbId,
    pub book_id: Option<DbId>,
    pub title: String,
    pub category: String,
    pub content: String,
    pub image_path: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateWorldEntry {
    pub title: String,
    pub category: Option<String>,
    pub content: Option<String>,
    pub book_id: Option<DbId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateWorldEntry {
    pub title: Option<String>,
    pub category: Option<String>,
    pub content: Option<String>,
    pub book_id: Option<DbId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorldEntryFilter {
    pub category: Option<String>,
    pub book_id: Option<DbId>,
}
