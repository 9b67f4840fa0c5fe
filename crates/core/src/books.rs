//! Book-level derived values.

pub const DEFAULT_WORD_COUNT_TARGET: i32 = 160_000;

/// Percentage of the word count target reached, capped at 100.
///
/// A zero (or negative) target reports 0 rather than dividing by zero.
pub fn progress_percentage(current_word_count: i32, word_count_target: i32) -> i32 {
    if word_count_target <= 0 {
        return 0;
    }
    let pct = (current_word_count.max(0) as i64 * 100) / word_count_target as i64;
    pct.min(100) as i32
}
