//! Session records and the on-disk envelope that wraps them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::to_datetime;

/// A caller's session state plus its lifecycle timestamps.
///
/// `payload` is opaque to the store; it is only ever serialized and
/// deserialized, never inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord<T> {
    /// Caller-chosen identifier (not necessarily filesystem-safe).
    pub session_id: String,

    /// Set once at first save, in epoch milliseconds.
    pub created_at: i64,

    /// Bumped on every save, and on loads in LRU namespaces.
    pub last_accessed_at: i64,

    /// Caller-defined state.
    pub payload: T,
}

impl<T> SessionRecord<T> {
    pub fn created(&self) -> Option<DateTime<Utc>> {
        to_datetime(self.created_at)
    }

    pub fn last_accessed(&self) -> Option<DateTime<Utc>> {
        to_datetime(self.last_accessed_at)
    }
}

/// Storage envelope around a [`SessionRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: SessionRecord<T>,

    /// Time of the last physical write that refreshed freshness.
    pub saved_at: i64,

    /// `saved_at + ttl`; the entry is live while `now <= expires_at`.
    pub expires_at: i64,
}

impl<T> CacheEntry<T> {
    pub fn expires(&self) -> Option<DateTime<Utc>> {
        to_datetime(self.expires_at)
    }
}
