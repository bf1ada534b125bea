//! Per-namespace configuration and its resolution.
//!
//! The effective config for a namespace is built from layers, later ones
//! winning field by field:
//!
//! 1. global defaults ([`DEFAULT_TTL`], [`DEFAULT_MAX_ENTRIES`], [`DEFAULT_EVICTION_POLICY`])
//! 2. the built-in table for well-known namespaces ([`builtin_overrides`])
//! 3. whatever the caller passes to [`NamespaceConfig::resolve`]
//!
//! Config files are just another source of [`NamespaceOverrides`] for step 3.

use std::time::Duration;

use crate::eviction::EvictionPolicy;

/// Default time-to-live for entries.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default number of entries a namespace keeps before evicting.
pub const DEFAULT_MAX_ENTRIES: usize = 20;

/// Default eviction policy.
pub const DEFAULT_EVICTION_POLICY: EvictionPolicy = EvictionPolicy::Lru;

/// Namespace holding multi-turn conversation history.
pub const CONVERSATION_NAMESPACE: &str = "conversation";

/// Namespace holding brainstorming idea rounds.
pub const BRAINSTORM_NAMESPACE: &str = "brainstorm";

/// Namespace holding code review rounds.
pub const REVIEW_NAMESPACE: &str = "review";

/// The namespaces with built-in defaults.
pub const WELL_KNOWN_NAMESPACES: [&str; 3] =
    [CONVERSATION_NAMESPACE, BRAINSTORM_NAMESPACE, REVIEW_NAMESPACE];

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Effective configuration of one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceConfig {
    /// Logical owner of the namespace; also names its storage directory.
    pub namespace: String,

    /// How long an entry stays live after being saved.
    pub ttl: Duration,

    /// Number of entries above which eviction kicks in. Always at least 1.
    pub max_entries: usize,

    /// Which entries are evicted first.
    pub eviction_policy: EvictionPolicy,
}

impl NamespaceConfig {
    /// A config with the global defaults.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ttl: DEFAULT_TTL,
            max_entries: DEFAULT_MAX_ENTRIES,
            eviction_policy: DEFAULT_EVICTION_POLICY,
        }
    }

    /// Resolve the effective config for `namespace`: global defaults, then
    /// the built-in table, then `overrides`.
    pub fn resolve(namespace: &str, overrides: &NamespaceOverrides) -> Self {
        Self::new(namespace)
            .apply(&builtin_overrides(namespace))
            .apply(overrides)
    }

    /// Apply every field that `overrides` sets.
    pub fn apply(mut self, overrides: &NamespaceOverrides) -> Self {
        if let Some(ttl) = overrides.ttl {
            self.ttl = ttl;
        }
        if let Some(max) = overrides.max_entries {
            self = self.with_max_entries(max);
        }
        if let Some(policy) = overrides.eviction_policy {
            self.eviction_policy = policy;
        }
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the capacity. Zero is raised to one.
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max.max(1);
        self
    }

    pub fn with_eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = policy;
        self
    }
}

/// A partial namespace config; `None` fields leave the lower layer alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NamespaceOverrides {
    pub ttl: Option<Duration>,
    pub max_entries: Option<usize>,
    pub eviction_policy: Option<EvictionPolicy>,
}

impl NamespaceOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    pub fn with_eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }

    /// Layer `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: &NamespaceOverrides) -> Self {
        Self {
            ttl: other.ttl.or(self.ttl),
            max_entries: other.max_entries.or(self.max_entries),
            eviction_policy: other.eviction_policy.or(self.eviction_policy),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ttl.is_none() && self.max_entries.is_none() && self.eviction_policy.is_none()
    }
}

/// Built-in defaults for the well-known namespaces.
///
/// The review namespace uses LRU explicitly: an actively iterated review is
/// loaded on every round and should outlive reviews nobody returns to.
pub fn builtin_overrides(namespace: &str) -> NamespaceOverrides {
    match namespace {
        CONVERSATION_NAMESPACE => NamespaceOverrides::new()
            .with_ttl(DAY)
            .with_max_entries(20)
            .with_eviction_policy(EvictionPolicy::Lru),
        BRAINSTORM_NAMESPACE => NamespaceOverrides::new()
            .with_ttl(7 * DAY)
            .with_max_entries(30)
            .with_eviction_policy(EvictionPolicy::Lru),
        REVIEW_NAMESPACE => NamespaceOverrides::new()
            .with_ttl(14 * DAY)
            .with_max_entries(50)
            .with_eviction_policy(EvictionPolicy::Lru),
        _ => NamespaceOverrides::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_namespace_gets_global_defaults() {
        let config = NamespaceConfig::resolve("scratch", &NamespaceOverrides::new());
        assert_eq!(config.namespace, "scratch");
        assert_eq!(config.ttl, DEFAULT_TTL);
        assert_eq!(config.max_entries, DEFAULT_MAX_ENTRIES);
        assert_eq!(config.eviction_policy, DEFAULT_EVICTION_POLICY);
    }

    #[test]
    fn test_builtin_table_applies() {
        let brainstorm = NamespaceConfig::resolve(BRAINSTORM_NAMESPACE, &NamespaceOverrides::new());
        assert_eq!(brainstorm.ttl, Duration::from_secs(7 * 24 * 60 * 60));
        assert_eq!(brainstorm.max_entries, 30);

        let review = NamespaceConfig::resolve(REVIEW_NAMESPACE, &NamespaceOverrides::new());
        assert_eq!(review.ttl, Duration::from_secs(14 * 24 * 60 * 60));
        assert_eq!(review.max_entries, 50);
        assert_eq!(review.eviction_policy, EvictionPolicy::Lru);
    }

    #[test]
    fn test_caller_overrides_win_per_field() {
        let overrides = NamespaceOverrides::new().with_eviction_policy(EvictionPolicy::Fifo);
        let review = NamespaceConfig::resolve(REVIEW_NAMESPACE, &overrides);
        assert_eq!(review.eviction_policy, EvictionPolicy::Fifo);
        // Untouched fields keep the built-in values
        assert_eq!(review.max_entries, 50);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let overrides = NamespaceOverrides::new().with_max_entries(0);
        let config = NamespaceConfig::resolve("tiny", &overrides);
        assert_eq!(config.max_entries, 1);
    }

    #[test]
    fn test_merge_prefers_later_layer() {
        let base = NamespaceOverrides::new()
            .with_ttl(Duration::from_secs(10))
            .with_max_entries(5);
        let top = NamespaceOverrides::new().with_max_entries(7);
        let merged = base.merge(&top);
        assert_eq!(merged.ttl, Some(Duration::from_secs(10)));
        assert_eq!(merged.max_entries, Some(7));
        assert_eq!(merged.eviction_policy, None);
        assert!(NamespaceOverrides::new().is_empty());
        assert!(!merged.is_empty());
    }

    #[test]
    fn test_resolution_is_pure() {
        let overrides = NamespaceOverrides::new().with_max_entries(3);
        assert_eq!(
            NamespaceConfig::resolve(CONVERSATION_NAMESPACE, &overrides),
            NamespaceConfig::resolve(CONVERSATION_NAMESPACE, &overrides)
        );
    }
}
