//! Dashboard aggregate rows.

use serde::Serialize;
use sqlx::FromRow;
use storybible_core::types::DbId;

/// Story bible totals for the dashboard header.
#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct DashboardStats {
    /// Active characters only.
    pub character_count: i64,
    pub total_events: i64,
    pub events_written: i64,
}

/// Per-book chapter and event counts.
#[derive(Debug, Clone, Copy, FromRow, Serialize)]
pub struct BookCounts {
    pub book_id: DbId,
    pub chapter_count: i64,
    pub event_count: i64,
}
