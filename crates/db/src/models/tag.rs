//! Tag entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storybible_core::types::{DbId, Timestamp};

/// A tag row from the `tags` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tag {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub category: String,
    pub color: String,
    pub description: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTag {
    pub name: String,
    pub category: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTag {
    pub name: Option<String>,
    pub category: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
}
