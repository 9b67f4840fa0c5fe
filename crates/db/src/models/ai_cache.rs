//! Relationship synthesis caches.
//!
//! Both caches are keyed by book and normalised character pair and carry
//! content hashes so stale entries are recomputed rather than reused.

use sqlx::FromRow;
use storybible_core::types::{DbId, Timestamp};

/// A cached summary of one chronological batch of shared scenes.
#[derive(Debug, Clone, FromRow)]
pub struct InteractionSummary {
    pub id: DbId,
    pub book_id: DbId,
    pub character_a_id: DbId,
    pub character_b_id: DbId,
    pub batch_index: i32,
    pub content_hash: String,
    pub summary_text: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct UpsertInteractionSummary {
    pub book_id: DbId,
    pub character_a_id: DbId,
    pub character_b_id: DbId,
    pub batch_index: i32,
    pub content_hash: String,
    pub summary_text: String,
}

/// A cached relationship profile for a pair within a book.
#[derive(Debug, Clone, FromRow)]
pub struct RelationshipAnalysis {
    pub id: DbId,
    pub book_id: DbId,
    pub character_a_id: DbId,
    pub character_b_id: DbId,
    pub snapshots_hash: String,
    pub character_a_hash: String,
    pub character_b_hash: String,
    pub full_json: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl RelationshipAnalysis {
    /// Whether the cached profile was computed from exactly these inputs.
    pub fn matches(&self, snapshots_hash: &str, character_a_hash: &str, character_b_hash: &str) -> bool {
        self.snapshots_hash == snapshots_hash
            && self.character_a_hash == character_a_hash
            && self.character_b_hash == character_b_hash
    }
}

#[derive(Debug, Clone)]
pub struct UpsertRelationshipAnalysis {
    pub book_id: DbId,
    pub character_a_id: DbId,
    pub character_b_id: DbId,
    pub snapshots_hash: String,
    pub character_a_hash: String,
    pub character_b_hash: String,
    pub full_json: serde_json::Value,
}
