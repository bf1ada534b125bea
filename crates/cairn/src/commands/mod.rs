//! CLI command handlers.

pub mod config;
pub mod delete;
pub mod list;
pub mod show;
pub mod stats;
pub mod sweep;

use std::path::{Path, PathBuf};

use anyhow::Result;
use cairn_config::LoadedConfig;
use cairn_session::{NamespaceConfig, NamespaceOverrides, NamespaceStore, to_datetime};
use console::{Style, style};
use serde_json::Value;
use tracing::warn;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Discovered configuration.
    pub loaded: LoadedConfig,
    /// Storage root for all namespaces.
    pub cache_root: PathBuf,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Discover config and resolve the storage root.
    pub fn load(
        cache_dir: Option<&Path>,
        config_dir: Option<&Path>,
        json_output: bool,
        verbose: bool,
    ) -> Result<Self> {
        let loaded = cairn_config::load_config_with_options(None, config_dir)?;
        for warning in &loaded.warnings {
            warn!("{}", warning);
        }
        let cache_root = loaded.config.effective_cache_dir(cache_dir);

        Ok(Self {
            loaded,
            cache_root,
            json_output,
            verbose,
        })
    }

    /// Effective config of `namespace`.
    pub fn namespace_config(&self, namespace: &str) -> NamespaceConfig {
        self.loaded
            .config
            .namespace_config(namespace, &NamespaceOverrides::new())
    }

    /// A store over `namespace` with payloads left as raw JSON.
    pub fn store(&self, namespace: &str) -> NamespaceStore<Value> {
        NamespaceStore::new(&self.cache_root, self.namespace_config(namespace))
    }
}

/// Print a bold title with a rule underneath.
pub(crate) fn print_header(title: &str) {
    println!("{}", style(title).bold());
    println!("{}", Style::new().dim().apply_to("─".repeat(50)));
    println!();
}

/// Epoch milliseconds rendered in UTC.
pub(crate) fn format_millis(millis: i64) -> String {
    match to_datetime(millis) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => millis.to_string(),
    }
}

/// Epoch milliseconds as RFC 3339, for JSON output.
pub(crate) fn rfc3339_millis(millis: i64) -> Value {
    match to_datetime(millis) {
        Some(dt) => Value::String(dt.to_rfc3339()),
        None => Value::Null,
    }
}

/// Human-readable duration, in the largest whole unit.
pub(crate) fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    const DAY: u64 = 24 * 60 * 60;
    if secs >= DAY && secs % DAY == 0 {
        format!("{}d", secs / DAY)
    } else if secs >= 3600 && secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs >= 60 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else if secs > 0 || duration.is_zero() {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(7 * 24 * 3600)), "7d");
        assert_eq!(format_duration(Duration::from_secs(7200)), "2h");
        assert_eq!(format_duration(Duration::from_secs(90)), "90s");
        assert_eq!(format_duration(Duration::from_secs(120)), "2m");
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::ZERO), "0s");
    }

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(0), "1970-01-01 00:00:00 UTC");
    }
}
