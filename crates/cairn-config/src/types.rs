//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [cache]
//! dir = "~/.cache/cairn"        # storage root (optional)
//!
//! [cache.defaults]               # every namespace, below the built-in table
//! ttl_secs = 86400
//! max_entries = 20
//! eviction = "lru"
//!
//! [cache.namespaces.review]      # one namespace
//! ttl_secs = 1209600
//! eviction = "fifo"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cairn_session::{
    EvictionPolicy, NamespaceConfig, NamespaceOverrides, builtin_overrides, resolve_key,
};
use serde::{Deserialize, Serialize};

use crate::APP_NAME;

/// Environment variable overriding the storage root.
pub const CACHE_DIR_ENV: &str = "CAIRN_CACHE_DIR";

/// Fallback storage root when no platform cache directory exists.
const LOCAL_CACHE_DIR: &str = ".cairn";

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// Every field is optional so partial configs (e.g. project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CairnConfig {
    /// Session cache configuration.
    pub cache: CacheSection,
}

impl CairnConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority,
    /// field by field).
    pub fn merge(&mut self, other: CairnConfig) {
        if other.cache.dir.is_some() {
            self.cache.dir = other.cache.dir;
        }

        self.cache.defaults.merge(&other.cache.defaults);

        for (name, section) in other.cache.namespaces {
            self.cache
                .namespaces
                .entry(name)
                .or_default()
                .merge(&section);
        }
    }

    /// Effective config for `namespace`.
    ///
    /// Layers, later ones winning field by field: global defaults,
    /// `[cache.defaults]`, the built-in table, `[cache.namespaces.<ns>]`,
    /// then `caller`. File defaults sit below the built-in table so a global
    /// `ttl_secs` doesn't shorten the longer-lived well-known namespaces.
    pub fn namespace_config(&self, namespace: &str, caller: &NamespaceOverrides) -> NamespaceConfig {
        NamespaceConfig::new(namespace)
            .apply(&self.cache.defaults.to_overrides())
            .apply(&builtin_overrides(namespace))
            .apply(&self.cache.overrides_for(namespace).merge(caller))
    }

    /// Storage root for all namespaces.
    ///
    /// Resolution order:
    /// 1. `override_dir` (e.g. a CLI flag)
    /// 2. `CAIRN_CACHE_DIR` environment variable
    /// 3. `[cache] dir`
    /// 4. platform cache directory + `cairn`
    pub fn effective_cache_dir(&self, override_dir: Option<&Path>) -> PathBuf {
        if let Some(dir) = override_dir {
            return dir.to_path_buf();
        }
        if let Some(dir) = std::env::var_os(CACHE_DIR_ENV)
            && !dir.is_empty()
        {
            return PathBuf::from(dir);
        }
        self.cache.configured_dir()
    }

    /// Human-readable warnings about suspicious values.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        self.cache
            .defaults
            .validate("[cache.defaults]", &mut warnings);
        for (name, section) in &self.cache.namespaces {
            section.validate(&format!("[cache.namespaces.{}]", name), &mut warnings);
        }
        warnings
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cache Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// The `[cache]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// Storage root. `~/` is expanded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Overrides applied to every namespace.
    pub defaults: NamespaceSection,

    /// Per-namespace overrides, keyed by namespace name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub namespaces: BTreeMap<String, NamespaceSection>,
}

impl CacheSection {
    /// Overrides from `[cache.namespaces.<name>]` sections that refer to
    /// `namespace`.
    ///
    /// Names are compared by storage key, so `"code review"` and
    /// `"code-review"` share settings just as they share a directory. An
    /// exact name match is applied last.
    pub fn overrides_for(&self, namespace: &str) -> NamespaceOverrides {
        let wanted = resolve_key(namespace);
        let aliases = self
            .namespaces
            .iter()
            .filter(|(name, _)| name.as_str() != namespace && resolve_key(name) == wanted)
            .fold(NamespaceOverrides::new(), |acc, (_, section)| {
                acc.merge(&section.to_overrides())
            });
        match self.namespaces.get(namespace) {
            Some(section) => aliases.merge(&section.to_overrides()),
            None => aliases,
        }
    }

    fn configured_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.dir {
            return expand_home(dir);
        }
        dirs::cache_dir()
            .map(|d| d.join(APP_NAME))
            .unwrap_or_else(|| PathBuf::from(LOCAL_CACHE_DIR))
    }
}

/// Overrides for one namespace (or for all, under `[cache.defaults]`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceSection {
    /// Time-to-live in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<u64>,

    /// Capacity before eviction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<usize>,

    /// `"lru"` or `"fifo"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eviction: Option<EvictionPolicy>,
}

impl NamespaceSection {
    /// Overlay the fields `other` sets.
    pub fn merge(&mut self, other: &NamespaceSection) {
        if other.ttl_secs.is_some() {
            self.ttl_secs = other.ttl_secs;
        }
        if other.max_entries.is_some() {
            self.max_entries = other.max_entries;
        }
        if other.eviction.is_some() {
            self.eviction = other.eviction;
        }
    }

    pub fn to_overrides(&self) -> NamespaceOverrides {
        NamespaceOverrides {
            ttl: self.ttl_secs.map(Duration::from_secs),
            max_entries: self.max_entries,
            eviction_policy: self.eviction,
        }
    }

    fn validate(&self, context: &str, warnings: &mut Vec<String>) {
        if self.max_entries == Some(0) {
            warnings.push(format!("{} sets max_entries = 0; it will be treated as 1", context));
        }
        if self.ttl_secs == Some(0) {
            warnings.push(format!(
                "{} sets ttl_secs = 0; entries will expire as soon as they are saved",
                context
            ));
        }
    }
}

fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}
