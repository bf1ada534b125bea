//! On-disk representation of cache entries.
//!
//! Entries are stored as pretty-printed JSON so they can be inspected and
//! edited by hand. Anything that does not parse as a complete envelope
//! (truncated writes, foreign files, hand-edit mistakes) decodes to
//! [`Error::CorruptRecord`].

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::record::CacheEntry;

/// File extension of encoded entries.
pub const EXTENSION: &str = "json";

/// Encode an entry for storage.
pub fn encode<T: Serialize>(entry: &CacheEntry<T>) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(entry).map_err(|e| Error::Encode(e.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decode a stored entry.
///
/// Use `T = serde::de::IgnoredAny` to read only the envelope metadata.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<CacheEntry<T>> {
    let entry: CacheEntry<T> =
        serde_json::from_slice(bytes).map_err(|e| Error::CorruptRecord(e.to_string()))?;

    if entry.data.last_accessed_at < entry.data.created_at {
        return Err(Error::CorruptRecord(format!(
            "last_accessed_at ({}) precedes created_at ({})",
            entry.data.last_accessed_at, entry.data.created_at
        )));
    }
    if entry.expires_at < entry.saved_at {
        return Err(Error::CorruptRecord(format!(
            "expires_at ({}) precedes saved_at ({})",
            entry.expires_at, entry.saved_at
        )));
    }

    Ok(entry)
}
