//! File system helpers for configuration documents.
//!
//! JSON documents are written atomically (temp file, sync, rename) so a
//! client never observes a half-written configuration.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Creates a directory and all of its parents if needed.
///
/// Fails when the path exists but is not a directory.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).with_context(|| {
            let platform_help = if crate::utils::platform::is_windows() {
                "On Windows: Check that the path length is < 260 chars or that long path support is enabled"
            } else {
                "Check directory permissions and path validity"
            };

            format!("Failed to create directory: {}\n\n{}", path.display(), platform_help)
        })?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Ensures that the parent directory of a file path exists.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

/// Atomically writes bytes to a file using a write-then-rename strategy.
///
/// The parent directory must already exist; callers decide whether missing
/// directories are created (see `--force`).
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let mut temp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    {
        let mut file = fs::File::create(&temp_path).with_context(|| {
            let platform_help = if crate::utils::platform::is_windows() {
                "On Windows: Check file permissions, path length, and that directory exists"
            } else {
                "Check file permissions and that directory exists"
            };

            format!("Failed to create temp file: {}\n\n{}", temp_path.display(), platform_help)
        })?;

        file.write_all(content)
            .with_context(|| format!("Failed to write to temp file: {}", temp_path.display()))?;

        file.sync_all().with_context(|| "Failed to sync file to disk")?;
    }

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}

/// Reads and parses a JSON file.
pub fn read_json_file<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON from file: {}", path.display()))
}

/// Writes data as pretty-printed JSON to a file atomically.
pub fn write_json_file<T>(path: &Path, data: &T) -> Result<()>
where
    T: Serialize,
{
    let json = serde_json::to_string_pretty(data)?;
    atomic_write(path, json.as_bytes())
        .with_context(|| format!("Failed to write JSON file: {}", path.display()))
}

/// Path of a timestamped backup next to `path`: `<path>.backup.<unix-millis>`.
#[must_use]
pub fn backup_path(path: &Path) -> PathBuf {
    let millis = chrono::Utc::now().timestamp_millis();
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".backup.{millis}"));
    PathBuf::from(name)
}

/// Writes a backup of an existing JSON document and returns its location.
///
/// Returns `Ok(None)` when there is nothing to back up: the file is missing
/// or does not contain valid JSON.
pub fn backup_json_file(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }

    let existing: serde_json::Value = match read_json_file(path) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(
                target: "config",
                "Skipping backup of unreadable file {}: {e:#}",
                path.display()
            );
            return Ok(None);
        }
    };

    let backup = backup_path(path);
    write_json_file(&backup, &existing)
        .with_context(|| format!("Failed to create backup at: {}", backup.display()))?;
    Ok(Some(backup))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_write_and_read_json_roundtrip_is_pretty() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.json");

        write_json_file(&path, &json!({"mcpServers": {}})).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw, "{\n  \"mcpServers\": {}\n}");
        assert!(!temp.path().join("config.json.tmp").exists());
    }

    #[test]
    fn test_atomic_write_requires_parent_directory() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("missing").join("config.json");
        assert!(atomic_write(&path, b"{}").is_err());
    }

    #[test]
    fn test_ensure_parent_dir_creates_nested_dirs() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("a").join("b").join("config.json");
        ensure_parent_dir(&path).unwrap();
        assert!(temp.path().join("a").join("b").is_dir());
    }

    #[test]
    fn test_ensure_dir_rejects_files() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("file");
        fs::write(&file, "x").unwrap();
        assert!(ensure_dir(&file).is_err());
    }

    #[test]
    fn test_backup_path_format() {
        let backup = backup_path(Path::new("/tmp/config.json"));
        let name = backup.to_string_lossy();
        assert!(name.starts_with("/tmp/config.json.backup."));
        let suffix = name.rsplit('.').next().unwrap();
        assert!(suffix.parse::<i64>().is_ok());
    }

    #[test]
    fn test_backup_json_file_copies_document() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.json");
        write_json_file(&path, &json!({"a": 1})).unwrap();

        let backup = backup_json_file(&path).unwrap().expect("backup written");
        let restored: serde_json::Value = read_json_file(&backup).unwrap();
        assert_eq!(restored, json!({"a": 1}));
    }

    #[test]
    fn test_backup_json_file_skips_missing_and_invalid() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.json");
        assert!(backup_json_file(&path).unwrap().is_none());

        fs::write(&path, "not json").unwrap();
        assert!(backup_json_file(&path).unwrap().is_none());
    }
}
