//! Watcher configuration

use crate::error::WatchError;
use crate::record::DEFAULT_BUFFER_SIZE;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Tunables for the change-notification engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Size of each root's notification buffer in bytes
    pub buffer_size: usize,

    /// Release a root's OS watch once its last registration is removed
    pub release_idle_roots: bool,
}

impl WatcherConfig {
    pub const MIN_BUFFER_SIZE: usize = 256;
    pub const MAX_BUFFER_SIZE: usize = 64 * 1024;

    pub fn validate(&self) -> Result<()> {
        if !(Self::MIN_BUFFER_SIZE..=Self::MAX_BUFFER_SIZE).contains(&self.buffer_size) {
            return Err(WatchError::Config(format!(
                "buffer_size must be between {} and {} (got {})",
                Self::MIN_BUFFER_SIZE,
                Self::MAX_BUFFER_SIZE,
                self.buffer_size
            )));
        }
        Ok(())
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            release_idle_roots: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = WatcherConfig::default();
        assert_eq!(config.buffer_size, 8192);
        assert!(config.release_idle_roots);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: WatcherConfig = toml::from_str("release_idle_roots = false").unwrap();
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
        assert!(!config.release_idle_roots);
    }

    #[test]
    fn test_buffer_size_range() {
        let config = WatcherConfig {
            buffer_size: 16,
            ..WatcherConfig::default()
        };
        assert!(matches!(config.validate(), Err(WatchError::Config(_))));
    }
}
