//! AI focus task model.

use serde::Serialize;
use sqlx::FromRow;
use storybible_core::types::{DbId, Timestamp};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FocusTask {
    pub id: DbId,
    pub user_id: DbId,
    pub task_text: String,
    pub is_completed: bool,
    pub created_at: Timestamp,
}
