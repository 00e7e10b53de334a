//! Native configuration (`native.toml`)
//!
//! Lives next to the settings file in the Extendify config directory.
//! Every section and key is optional; missing values take their defaults.

use anyhow::{Context, Result};
use extendify_core::Paths;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use watcher::WatcherConfig;

const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Complete native configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeConfig {
    pub logging: LoggingConfig,
    pub watcher: WatcherConfig,
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level; `RUST_LOG` overrides it
    pub level: String,

    /// Also write a daily-rolling `native.log` in the logs directory
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: true,
        }
    }
}

impl NativeConfig {
    pub fn validate(&self) -> Result<()> {
        if !LEVELS.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "logging.level must be one of {} (got {})",
                LEVELS.join(", "),
                self.logging.level
            );
        }
        self.watcher.validate()?;
        Ok(())
    }
}

pub fn config_file_path(paths: &Paths) -> PathBuf {
    paths.native_config_file()
}

/// Load the configuration, falling back to defaults if the file is missing
pub fn load(paths: &Paths) -> Result<NativeConfig> {
    let path = config_file_path(paths);
    if !path.exists() {
        return Ok(NativeConfig::default());
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: NativeConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(config)
}

pub fn save(paths: &Paths, config: &NativeConfig) -> Result<()> {
    config.validate()?;
    paths.base_dir(true)?;
    let path = config_file_path(paths);
    let contents = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
    std::fs::write(&path, contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write the default configuration if none exists; returns whether it did
pub fn init_if_missing(paths: &Paths) -> Result<bool> {
    if config_file_path(paths).exists() {
        return Ok(false);
    }
    save(paths, &NativeConfig::default())?;
    Ok(true)
}

pub fn example_config() -> &'static str {
    r#"# Extendify native configuration
# Location: <config dir>/extendify/native.toml (or $EXTENDIFY_HOME/native.toml)

[logging]
# One of: error, warn, info, debug, trace. RUST_LOG takes precedence.
level = "warn"
# Write logs/native.log (rotated daily) in addition to stderr
file = true

[watcher]
# Notification buffer per watched directory, 256-65536 bytes
buffer_size = 8192
# Stop watching a directory once its last registration is removed
release_idle_roots = true
"#
}
