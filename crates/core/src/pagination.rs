//! Pagination defaults and clamping helpers for list endpoints.

/// Default page size for list endpoints.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Maximum page size for list endpoints.
pub const MAX_LIST_LIMIT: i64 = 200;

/// Number of activity log rows shown on the dashboard.
pub const RECENT_ACTIVITY_LIMIT: i64 = 20;

/// Clamp a user-provided limit into `[1, max]`, using `default` when absent.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(clamp_limit(None, 50, 200), 50);
        assert_eq!(clamp_limit(Some(0), 50, 200), 1);
        assert_eq!(clamp_limit(Some(-4), 50, 200), 1);
        assert_eq!(clamp_limit(Some(5000), 50, 200), 200);
    }

    #[test]
    fn offset_never_negative() {
        assert_eq!(clamp_offset(None), 0);
        assert_eq!(clamp_offset(Some(-10)), 0);
        assert_eq!(clamp_offset(Some(30)), 30);
    }
}
