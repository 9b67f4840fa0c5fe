//! Shared query parameter types for API handlers.

use serde::Deserialize;
use storybible_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};

/// `?limit=&offset=`, clamped before it reaches a query.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    pub fn limit_or(&self, default: i64) -> i64 {
        clamp_limit(self.limit, default, MAX_LIST_LIMIT)
    }

    pub fn limit(&self) -> i64 {
        self.limit_or(DEFAULT_LIST_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        clamp_offset(self.offset)
    }
}
