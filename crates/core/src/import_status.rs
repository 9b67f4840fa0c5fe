//! Progress arithmetic and status messages for background book jobs.
//!
//! Both the import pipeline and the deep scan persist a 0..=100 progress
//! value and a human-readable message on the book row; clients poll them.

/// Manuscript chunks sent to the model per call.
pub const IMPORT_BATCH_SIZE: usize = 3;

pub const PROGRESS_START: i32 = 0;
pub const PROGRESS_EXTRACTED: i32 = 5;
pub const PROGRESS_CHARACTERS_DONE: i32 = 20;
pub const PROGRESS_BATCHES_DONE: i32 = 95;
pub const PROGRESS_COMPLETE: i32 = 100;

/// Deep scan: characters occupy 0..40, pairs 40..100.
pub const DEEP_SCAN_CHARACTER_SHARE: i32 = 40;

pub const MSG_IMPORT_QUEUED: &str = "Import queued";
pub const MSG_IDENTIFYING_CHARACTERS: &str = "Identifying characters";
pub const MSG_IMPORT_INTERRUPTED: &str = "Import interrupted";
pub const MSG_DEEP_SCAN_QUEUED: &str = "Deep scan queued";
pub const MSG_DEEP_SCAN_CHARACTERS: &str = "Deep scan: refreshing characters";
pub const MSG_DEEP_SCAN_INTERRUPTED: &str = "Deep scan interrupted";

/// Linear interpolation of `done / total` into `[from, to]`.
///
/// A zero `total` counts as finished.
pub fn scaled_progress(done: usize, total: usize, from: i32, to: i32) -> i32 {
    if total == 0 {
        return to;
    }
    let done = done.min(total) as i64;
    let span = (to - from) as i64;
    from + (span * done / total as i64) as i32
}

/// Import progress after `done` of `total` chapter batches.
pub fn batch_progress(done: usize, total: usize) -> i32 {
    scaled_progress(done, total, PROGRESS_CHARACTERS_DONE, PROGRESS_BATCHES_DONE)
}

/// Deep scan progress while refreshing characters.
pub fn deep_scan_character_progress(done: usize, total: usize) -> i32 {
    scaled_progress(done, total, PROGRESS_START, DEEP_SCAN_CHARACTER_SHARE)
}

/// Deep scan progress while synthesising pairs.
pub fn deep_scan_pair_progress(done: usize, total: usize) -> i32 {
    scaled_progress(done, total, DEEP_SCAN_CHARACTER_SHARE, PROGRESS_COMPLETE)
}

pub fn batch_message(batch: usize, total: usize) -> String {
    format!("Analyzing chapters: batch {batch} of {total}")
}

pub fn pair_message(pair: usize, total: usize) -> String {
    format!("Deep scan: analyzing relationship {pair} of {total}")
}

/// Totals reported when an import finishes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub chapters: usize,
    pub events: usize,
    pub characters_created: usize,
    pub characters_merged: usize,
    pub skipped_batches: usize,
}

impl ImportSummary {
    pub fn message(&self) -> String {
        let mut msg = format!(
            "Import complete: {} chapters, {} events, {} new characters, {} merged",
            self.chapters, self.events, self.characters_created, self.characters_merged
        );
        if self.skipped_batches > 0 {
            msg.push_str(&format!(" ({} batches skipped)", self.skipped_batches));
        }
        msg
    }
}

/// Totals reported when a deep scan finishes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeepScanSummary {
    pub characters_refreshed: usize,
    pub pairs_analyzed: usize,
    pub pairs_failed: usize,
}

impl DeepScanSummary {
    pub fn message(&self) -> String {
        let mut msg = format!(
            "Deep scan complete: {} characters refreshed, {} relationships analyzed",
            self.characters_refreshed, self.pairs_analyzed
        );
        if self.pairs_failed > 0 {
            msg.push_str(&format!(" ({} failed)", self.pairs_failed));
        }
        msg
    }
}
