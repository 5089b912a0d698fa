use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::AuthError;

/// Persistence port for client-side auth state. Implementations map a
/// small set of well-known keys to string records.
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError>;
    fn set(&self, key: &str, value: &str) -> Result<(), AuthError>;
    fn delete(&self, key: &str) -> Result<(), AuthError>;
}

/// In-memory backend for tests and short-lived processes.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| AuthError::Storage("storage lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AuthError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AuthError::Storage("storage lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), AuthError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AuthError::Storage("storage lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// Configuration for file-backed storage.
#[derive(Debug, Clone)]
pub struct FileStorageConfig {
    pub base_dir: PathBuf,
}

impl FileStorageConfig {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn default_dir() -> PathBuf {
        default_sheaf_dir()
    }
}

/// File-backed storage using one TOML record per key.
///
/// # Example
/// ```no_run
/// use sheaf::auth::{FileStorage, StorageBackend};
///
/// let storage = FileStorage::new_default();
/// storage.set("sheaf_auth_tokens", "{\"access_token\":\"...\"}")?;
/// # Ok::<(), sheaf::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_dir: PathBuf,
}

impl FileStorage {
    pub fn new(config: FileStorageConfig) -> Self {
        Self {
            base_dir: config.base_dir,
        }
    }

    pub fn new_default() -> Self {
        Self {
            base_dir: default_sheaf_dir(),
        }
    }

    fn record_path(&self, key: &str) -> PathBuf {
        let name = normalize_key(key);
        self.base_dir.join(format!("{name}.toml"))
    }

    fn ensure_parent(path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        let path = self.record_path(key);
        let raw = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        let record: StorageRecord = match toml::from_str(&raw) {
            Ok(record) => record,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unreadable storage record, treating as absent");
                return Ok(None);
            }
        };
        Ok(Some(record.value))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AuthError> {
        let path = self.record_path(key);
        Self::ensure_parent(&path)?;
        let record = StorageRecord {
            version: 1,
            key: key.to_string(),
            value: value.to_string(),
            saved_at: DateTime::<Utc>::from(std::time::SystemTime::now()),
        };
        let serialized = toml::to_string(&record)?;
        fs::write(&path, serialized)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), AuthError> {
        let path = self.record_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StorageRecord {
    version: u32,
    key: String,
    value: String,
    saved_at: DateTime<Utc>,
}

fn default_sheaf_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".sheaf"))
        .unwrap_or_else(|| PathBuf::from(".sheaf"))
}

fn normalize_key(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "default".to_string();
    }
    let mut out = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        let lower = ch.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() || lower == '-' || lower == '_' {
            out.push(lower);
        } else {
            out.push('-');
        }
    }
    if out.trim_matches('-').is_empty() {
        "default".to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_storage() -> (TempDir, FileStorage) {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(FileStorageConfig::new(dir.path().to_path_buf()));
        (dir, storage)
    }

    #[test]
    fn record_round_trip_works() {
        let (_dir, storage) = temp_storage();
        storage.set("sheaf_auth_tokens", "payload").unwrap();
        let loaded = storage.get("sheaf_auth_tokens").unwrap();
        assert_eq!(loaded.as_deref(), Some("payload"));
    }

    #[test]
    fn delete_removes_record() {
        let (_dir, storage) = temp_storage();
        storage.set("sheaf_auth_tokens", "payload").unwrap();
        storage.delete("sheaf_auth_tokens").unwrap();
        assert!(storage.get("sheaf_auth_tokens").unwrap().is_none());
    }

    #[test]
    fn missing_record_reads_as_none() {
        let (_dir, storage) = temp_storage();
        assert!(storage.get("never_written").unwrap().is_none());
    }

    #[test]
    fn unreadable_record_reads_as_none() {
        let (dir, storage) = temp_storage();
        fs::write(dir.path().join("sheaf_auth_tokens.toml"), "not = [valid").unwrap();
        assert!(storage.get("sheaf_auth_tokens").unwrap().is_none());
    }

    #[test]
    fn delete_of_missing_record_is_ok() {
        let (_dir, storage) = temp_storage();
        storage.delete("never_written").unwrap();
    }

    #[test]
    fn memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        assert!(storage.get("k").unwrap().is_none());
        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
        storage.delete("k").unwrap();
        assert!(storage.get("k").unwrap().is_none());
    }
}
