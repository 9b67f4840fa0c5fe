//! Aggregate queries behind the dashboard.

use sqlx::PgPool;
use storybible_core::types::DbId;

use crate::models::dashboard::{BookCounts, DashboardStats};

pub struct DashboardRepo;

impl DashboardRepo {
    pub async fn stats(pool: &PgPool, user_id: DbId) -> Result<DashboardStats, sqlx::Error> {
        sqlx::query_as::<_, DashboardStats>(
            "SELECT
                (SELECT COUNT(*) FROM characters WHERE user_id = $1 AND is_active) AS character_count,
                (SELECT COUNT(*) FROM events WHERE user_id = $1) AS total_events,
                (SELECT COUNT(*) FROM events WHERE user_id = $1 AND is_written) AS events_written",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Chapter and event counts for each of the user's books.
    pub async fn book_counts(pool: &PgPool, user_id: DbId) -> Result<Vec<BookCounts>, sqlx::Error> {
        sqlx::query_as::<_, BookCounts>(
            "SELECT b.id AS book_id,
                    (SELECT COUNT(*) FROM chapters c WHERE c.book_id = b.id) AS chapter_count,
                    (SELECT COUNT(*) FROM events e WHERE e.book_id = b.id) AS event_count
             FROM books b
             WHERE b.user_id = $1
             ORDER BY b.series_order ASC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
