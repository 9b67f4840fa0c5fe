//! Activity log model.

use serde::Serialize;
use sqlx::FromRow;
use storybible_core::types::{DbId, Timestamp};

/// One create/update/delete entry, newest first when listed.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ActivityLog {
    pub id: DbId,
    pub user_id: DbId,
    pub action: String,
    pub model_name: String,
    pub object_name: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateActivityLog {
    pub user_id: DbId,
    pub action: String,
    pub model_name: String,
    pub object_name: String,
}
