//! Shared key generation for storage backends.
//!
//! Key format: `uploads/{owner_id}/{created_millis}-{random}-{file_name}`.

use chrono::{DateTime, Utc};
use rand::distr::{Alphanumeric, SampleString};

use crate::traits::{StorageError, StorageResult};

const KEY_PREFIX: &str = "uploads";
const RANDOM_SUFFIX_LEN: usize = 12;

/// Replace every character outside `[A-Za-z0-9.-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Generate a fresh source key for an upload. All backends must use this format.
pub fn generate_source_key(owner_id: &str, file_name: &str, now: DateTime<Utc>) -> String {
    let random = Alphanumeric.sample_string(&mut rand::rng(), RANDOM_SUFFIX_LEN);
    format!(
        "{}/{}/{}-{}-{}",
        KEY_PREFIX,
        sanitize_file_name(owner_id),
        now.timestamp_millis(),
        random,
        sanitize_file_name(file_name)
    )
}

/// Reject keys that could escape their prefix or that no backend can address.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.starts_with('/') || key.split('/').any(|s| s == "..") {
        return Err(StorageError::InvalidKey("Storage key contains invalid characters".to_string()));
    }
    Ok(())
}
