//! Persistent session cache with TTL expiry and LRU/FIFO eviction.
//!
//! This crate provides a file-backed, per-namespace key-value store for
//! conversational state that has to survive between short-lived process
//! invocations:
//! - one directory per namespace, one JSON file per session
//! - TTL expiry, enforced lazily when the namespace is accessed
//! - bounded capacity with FIFO or LRU eviction
//! - self-healing reads: expired and corrupt entries are removed, never returned
//!
//! # Example
//!
//! ```rust,ignore
//! use cairn_session::{NamespaceConfig, NamespaceOverrides, NamespaceStore};
//!
//! let config = NamespaceConfig::resolve("conversation", &NamespaceOverrides::new());
//! let store: NamespaceStore<History> = NamespaceStore::new("/tmp/cairn", config);
//!
//! store.save("thread-1", history).await?;
//! let record = store.load("thread-1").await?;
//! ```

mod clock;
mod codec;
mod config;
mod error;
mod eviction;
mod key;
mod record;
mod store;
mod ttl;

pub use clock::{Clock, ManualClock, SystemClock, to_datetime};
pub use codec::{EXTENSION, decode, encode};
pub use config::{
    BRAINSTORM_NAMESPACE, CONVERSATION_NAMESPACE, DEFAULT_EVICTION_POLICY, DEFAULT_MAX_ENTRIES,
    DEFAULT_TTL, NamespaceConfig, NamespaceOverrides, REVIEW_NAMESPACE, WELL_KNOWN_NAMESPACES,
    builtin_overrides,
};
pub use error::{Error, Result};
pub use eviction::{EvictionCandidate, EvictionPolicy};
pub use key::{FALLBACK_KEY, MAX_KEY_LEN, resolve_key};
pub use record::{CacheEntry, SessionRecord};
pub use store::{NamespaceStore, StoreStats};
pub use ttl::{ExpiryPolicy, STALE_TEMP_AGE, SWEEP_THRESHOLD_PERCENT, SweepReport};
