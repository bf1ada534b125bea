//! Configuration system for the cairn session cache.
//!
//! Provides TOML-based configuration with:
//! - A storage root for all namespaces (`[cache] dir`)
//! - Defaults for every namespace (`[cache.defaults]`)
//! - Per-namespace overrides (`[cache.namespaces.<name>]`)
//! - Config file layering (XDG user config + project-local overrides)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_config_with_options,
    save_config, xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;

/// Application name for XDG directory resolution.
pub(crate) const APP_NAME: &str = "cairn";
