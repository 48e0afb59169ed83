//! Content deduplication
//!
//! Documents are identified by a SHA-256 fingerprint of their normalized title
//! and the first [`BODY_PREFIX_CHARS`] characters of their normalized body. The
//! fingerprint is the dedup key checked against the store before anything is
//! persisted.

mod fingerprint;

pub use fingerprint::{fingerprint, normalize_for_fingerprint, ContentFingerprint, BODY_PREFIX_CHARS};

use crate::storage::{Storage, StorageResult};

/// Checks whether a document with this fingerprint is already stored
///
/// This is the only place the pipeline queries prior state for content.
pub fn is_duplicate<S: Storage + ?Sized>(
    store: &S,
    fingerprint: &ContentFingerprint,
) -> StorageResult<bool> {
    Ok(store.find_by_fingerprint(fingerprint)?.is_some())
}
