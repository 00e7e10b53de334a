//! Settings file (`config.json`)
//!
//! Settings are an opaque JSON object owned by the frontend; this module
//! only guarantees that what is stored is an object.

use crate::error::CoreError;
use crate::fs::{read_file, write_file};
use crate::paths::Paths;
use crate::Result;
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

/// Contents written when the settings file is first created
pub const DEFAULT_SETTINGS_JSON: &str = r#"{
    "plugins": {},
    "theme": {
        "files": [],
        "colors": []
    }
}
"#;

/// Read the settings object, creating the file with defaults if needed
pub fn load(paths: &Paths) -> Result<Value> {
    let path = paths.config_file(true)?;
    let contents = read_file(&path)?;
    let value: Value = serde_json::from_str(&contents).map_err(|e| CoreError::InvalidSettings {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    if !value.is_object() {
        return Err(CoreError::InvalidSettings {
            path,
            reason: "settings must be a JSON object".into(),
        });
    }
    Ok(value)
}

/// Replace the settings object
pub fn save(paths: &Paths, settings: &Value) -> Result<()> {
    let path = paths.config_file(true)?;
    if !settings.is_object() {
        return Err(CoreError::InvalidSettings {
            path,
            reason: "settings must be a JSON object".into(),
        });
    }
    let mut contents = serde_json::to_string_pretty(settings)?;
    contents.push('\n');
    write_file(&path, &contents)?;
    debug!("Wrote settings to {}", path.display());
    Ok(())
}

/// Directory holding the settings file
pub fn settings_dir(paths: &Paths) -> Result<PathBuf> {
    Ok(paths.base_dir(false)?.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_load_creates_defaults() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::new(dir.path());
        let settings = load(&paths).unwrap();
        assert_eq!(settings["plugins"], json!({}));
        assert_eq!(settings["theme"]["files"], json!([]));
    }

    #[test]
    fn test_save_replaces_settings() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::new(dir.path());
        save(&paths, &json!({"theme": {"files": ["dark.css"]}})).unwrap();
        let settings = load(&paths).unwrap();
        assert_eq!(settings["theme"]["files"][0], "dark.css");
        assert!(settings.get("plugins").is_none());
    }

    #[test]
    fn test_non_object_rejected() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::new(dir.path());
        assert!(matches!(
            save(&paths, &json!([1, 2])),
            Err(CoreError::InvalidSettings { .. })
        ));

        std::fs::write(paths.config_file(false).unwrap(), "not json").unwrap();
        assert!(matches!(load(&paths), Err(CoreError::InvalidSettings { .. })));
    }

    #[test]
    fn test_settings_dir_is_base() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::new(dir.path());
        assert_eq!(settings_dir(&paths).unwrap(), dir.path());
    }
}
