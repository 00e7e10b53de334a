//! Config-directory layout
//!
//! Every accessor takes a `create` flag: when set, the base directory and
//! the requested entry are created if missing (files with their default
//! contents).

use crate::error::CoreError;
use crate::settings::DEFAULT_SETTINGS_JSON;
use crate::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment override for the base directory
pub const HOME_ENV: &str = "EXTENDIFY_HOME";

const APP_DIR: &str = "extendify";
const CONFIG_FILE: &str = "config.json";
const QUICK_CSS_FILE: &str = "quickCss.css";
const NATIVE_CONFIG_FILE: &str = "native.toml";
const THEMES_DIR: &str = "themes";
const LOG_DIR: &str = "logs";

/// Resolved locations under the Extendify base directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    base: PathBuf,
}

impl Paths {
    /// Use an explicit base directory
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Resolve the base directory from the environment
    ///
    /// `$EXTENDIFY_HOME` wins; otherwise the platform config directory
    /// (`$XDG_CONFIG_HOME` or `~/.config` on Linux, `%APPDATA%` on Windows)
    /// joined with `extendify`.
    pub fn from_env() -> Result<Self> {
        if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::new(home));
        }
        dirs::config_dir()
            .map(|dir| Self::new(dir.join(APP_DIR)))
            .ok_or(CoreError::NoConfigDir)
    }

    pub fn base_dir(&self, create: bool) -> Result<&Path> {
        if create {
            ensure_dir(&self.base)?;
        }
        Ok(&self.base)
    }

    /// Settings file, seeded with the default settings when created
    pub fn config_file(&self, create: bool) -> Result<PathBuf> {
        let path = self.base_dir(create)?.join(CONFIG_FILE);
        if create {
            ensure_file(&path, DEFAULT_SETTINGS_JSON)?;
        }
        Ok(path)
    }

    pub fn quick_css_file(&self, create: bool) -> Result<PathBuf> {
        let path = self.base_dir(create)?.join(QUICK_CSS_FILE);
        if create {
            ensure_file(&path, "")?;
        }
        Ok(path)
    }

    pub fn themes_dir(&self, create: bool) -> Result<PathBuf> {
        let path = self.base_dir(create)?.join(THEMES_DIR);
        if create {
            ensure_dir(&path)?;
        }
        Ok(path)
    }

    pub fn log_dir(&self, create: bool) -> Result<PathBuf> {
        let path = self.base_dir(create)?.join(LOG_DIR);
        if create {
            ensure_dir(&path)?;
        }
        Ok(path)
    }

    /// Engine configuration file (never created implicitly)
    pub fn native_config_file(&self) -> PathBuf {
        self.base.join(NATIVE_CONFIG_FILE)
    }
}

/// Create `path` and its parents if missing; returns whether it was created
pub fn ensure_dir(path: &Path) -> Result<bool> {
    if path.exists() {
        debug!("Directory {} already exists", path.display());
        return Ok(false);
    }
    debug!("Creating directory {}", path.display());
    std::fs::create_dir_all(path).map_err(|e| CoreError::io(path, e))?;
    Ok(true)
}

/// Create `path` with `default` contents if missing; returns whether it was created
pub fn ensure_file(path: &Path, default: &str) -> Result<bool> {
    if path.exists() {
        debug!("File {} already exists", path.display());
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    debug!("Creating file {}", path.display());
    std::fs::write(path, default).map_err(|e| CoreError::io(path, e))?;
    Ok(true)
}
