//! Capacity-driven eviction.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which entries go first when a namespace is over capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Oldest `created_at` first.
    Fifo,
    /// Oldest `last_accessed_at` first. Loads refresh recency.
    Lru,
}

impl EvictionPolicy {
    /// Whether a successful load should bump `last_accessed_at`.
    pub fn refreshes_on_load(&self) -> bool {
        matches!(self, Self::Lru)
    }

    fn ordering_key(&self, candidate: &EvictionCandidate) -> i64 {
        match self {
            Self::Fifo => candidate.created_at,
            Self::Lru => candidate.last_accessed_at,
        }
    }

    /// Pick the entries to remove so that at most `max_entries` remain.
    ///
    /// Ties on the ordering timestamp are broken by storage key so the
    /// outcome is reproducible.
    pub fn select_victims(
        &self,
        mut candidates: Vec<EvictionCandidate>,
        max_entries: usize,
    ) -> Vec<EvictionCandidate> {
        if candidates.len() <= max_entries {
            return Vec::new();
        }

        let excess = candidates.len() - max_entries;
        candidates.sort_by(|a, b| {
            self.ordering_key(a)
                .cmp(&self.ordering_key(b))
                .then_with(|| a.key.cmp(&b.key))
        });
        candidates.truncate(excess);
        candidates
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fifo => write!(f, "fifo"),
            Self::Lru => write!(f, "lru"),
        }
    }
}

impl FromStr for EvictionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fifo" => Ok(Self::Fifo),
            "lru" => Ok(Self::Lru),
            other => Err(format!("unknown eviction policy '{}' (expected fifo or lru)", other)),
        }
    }
}

/// A live entry considered for eviction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionCandidate {
    pub key: String,
    pub path: PathBuf,
    pub created_at: i64,
    pub last_accessed_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(key: &str, created_at: i64, last_accessed_at: i64) -> EvictionCandidate {
        EvictionCandidate {
            key: key.to_string(),
            path: PathBuf::from(format!("{}.json", key)),
            created_at,
            last_accessed_at,
        }
    }

    fn keys(victims: &[EvictionCandidate]) -> Vec<&str> {
        victims.iter().map(|c| c.key.as_str()).collect()
    }

    #[test]
    fn test_under_capacity_evicts_nothing() {
        let candidates = vec![candidate("a", 1, 1), candidate("b", 2, 2)];
        assert!(EvictionPolicy::Fifo.select_victims(candidates.clone(), 2).is_empty());
        assert!(EvictionPolicy::Lru.select_victims(candidates, 5).is_empty());
    }

    #[test]
    fn test_fifo_evicts_oldest_created() {
        let candidates = vec![
            candidate("b", 20, 100),
            candidate("a", 10, 300),
            candidate("c", 30, 200),
        ];
        let victims = EvictionPolicy::Fifo.select_victims(candidates, 2);
        assert_eq!(keys(&victims), vec!["a"]);
    }

    #[test]
    fn test_lru_evicts_least_recently_accessed() {
        let candidates = vec![
            candidate("b", 20, 100),
            candidate("a", 10, 300),
            candidate("c", 30, 200),
        ];
        let victims = EvictionPolicy::Lru.select_victims(candidates, 1);
        assert_eq!(keys(&victims), vec!["b", "c"]);
    }

    #[test]
    fn test_ties_broken_by_key() {
        let candidates = vec![
            candidate("zeta", 5, 5),
            candidate("alpha", 5, 5),
            candidate("mid", 5, 5),
        ];
        let victims = EvictionPolicy::Fifo.select_victims(candidates, 1);
        assert_eq!(keys(&victims), vec!["alpha", "mid"]);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("LRU".parse::<EvictionPolicy>().unwrap(), EvictionPolicy::Lru);
        assert_eq!("fifo".parse::<EvictionPolicy>().unwrap(), EvictionPolicy::Fifo);
        assert!("random".parse::<EvictionPolicy>().is_err());
        assert_eq!(EvictionPolicy::Lru.to_string(), "lru");
    }

    #[test]
    fn test_only_lru_refreshes_on_load() {
        assert!(EvictionPolicy::Lru.refreshes_on_load());
        assert!(!EvictionPolicy::Fifo.refreshes_on_load());
    }
}
