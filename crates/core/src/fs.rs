//! Whole-file read and write helpers

use crate::error::CoreError;
use crate::Result;
use std::path::Path;
use tracing::warn;

/// Read a file to a string
///
/// A missing file is not an error: it is logged and read as empty.
pub fn read_file(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Attempting to read a file that does not exist: {}", path.display());
            Ok(String::new())
        }
        Err(e) => Err(CoreError::io(path, e)),
    }
}

/// Replace a file's contents
pub fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).map_err(|e| CoreError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_file(&dir.path().join("nope.css")).unwrap(), "");
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quickCss.css");
        write_file(&path, "body { color: red; }").unwrap();
        write_file(&path, "body {}").unwrap();
        assert_eq!(read_file(&path).unwrap(), "body {}");
    }

    #[test]
    fn test_write_into_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let err = write_file(&dir.path().join("missing").join("a.css"), "").unwrap_err();
        assert!(matches!(err, CoreError::Io { .. }));
    }
}
