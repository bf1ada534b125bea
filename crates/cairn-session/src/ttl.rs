//! TTL expiry decisions.
//!
//! There is no background cleanup task. Expired entries are only found and
//! removed when a namespace is accessed: on a load that hits one, or by a
//! sweep before a save into a nearly-full namespace. A namespace nobody
//! touches keeps its expired files until the next access.

use std::time::Duration;

use crate::clock::duration_millis;

/// Age after which a leftover write temp file is considered abandoned.
pub const STALE_TEMP_AGE: Duration = Duration::from_secs(10 * 60);

/// Occupancy, as a percentage of `max_entries`, at which a save sweeps first.
pub const SWEEP_THRESHOLD_PERCENT: usize = 80;

/// Expiry rules for one namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    ttl: Duration,
}

impl ExpiryPolicy {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Expiry timestamp for an entry written at `saved_at`.
    pub fn expires_at(&self, saved_at: i64) -> i64 {
        saved_at.saturating_add(duration_millis(self.ttl))
    }

    /// An entry is live while `now <= expires_at`.
    pub fn is_expired(expires_at: i64, now: i64) -> bool {
        now > expires_at
    }

    /// Whether a save should sweep before writing, given the current number
    /// of physical entries.
    pub fn should_sweep(occupancy: usize, max_entries: usize) -> bool {
        occupancy.saturating_mul(100) >= max_entries.saturating_mul(SWEEP_THRESHOLD_PERCENT)
    }
}

/// Outcome of a sweep over one namespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SweepReport {
    /// Physical entries examined.
    pub scanned: usize,
    /// Entries removed because they had expired.
    pub expired: usize,
    /// Entries removed because they could not be decoded.
    pub corrupt: usize,
    /// Abandoned write temp files removed.
    pub stale_temp: usize,
    /// Entries that should have been removed but could not be.
    pub failed: usize,
}

impl SweepReport {
    pub fn removed(&self) -> usize {
        self.expired + self.corrupt + self.stale_temp
    }
}
