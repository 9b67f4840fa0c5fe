//! Shared SHA-256 hex digest utility.
//!
//! Content hashes key the interaction-summary and relationship-analysis
//! caches, and refresh tokens are stored only as digests.

use sha2::{Digest, Sha256};

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}
