//! Durable key-value fallback store scoped to the client device.
//!
//! The favorites synchronizer mirrors its collection here after successful
//! mutations and reads it back only when the remote service cannot be
//! reached. Callers log failures and carry on.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::LocalCacheError;

/// Synchronous, best-effort string store.
pub trait PersistentLocalCache: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, LocalCacheError>;

    fn write(&self, key: &str, value: &str) -> Result<(), LocalCacheError>;
}

/// One JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileLocalCache {
    dir: PathBuf,
}

impl FileLocalCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl PersistentLocalCache for FileLocalCache {
    fn read(&self, key: &str) -> Result<Option<String>, LocalCacheError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), LocalCacheError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }
}

/// Process-local store, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryLocalCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryLocalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.into(), value.into());
        }
        self
    }
}

impl PersistentLocalCache for MemoryLocalCache {
    fn read(&self, key: &str) -> Result<Option<String>, LocalCacheError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| LocalCacheError::Unavailable(String::from("memory cache lock poisoned")))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), LocalCacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| LocalCacheError::Unavailable(String::from("memory cache lock poisoned")))?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_cache_round_trips_and_reports_missing_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = FileLocalCache::new(dir.path().join("nested"));

        assert_eq!(cache.read("favorites").expect("read"), None);

        cache.write("favorites", "[]").expect("write");
        cache.write("favorites", r#"[{"symbol":"AAPL"}]"#).expect("overwrite");

        assert_eq!(
            cache.read("favorites").expect("read").as_deref(),
            Some(r#"[{"symbol":"AAPL"}]"#)
        );
    }

    #[test]
    fn keys_cannot_escape_the_directory() {
        let cache = FileLocalCache::new("/var/cache/tickwatch");
        assert_eq!(
            cache.path_for("../etc/passwd"),
            PathBuf::from("/var/cache/tickwatch/___etc_passwd.json")
        );
    }

    #[test]
    fn file_cache_surfaces_io_failures() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "x").expect("file");

        let cache = FileLocalCache::new(&blocker);
        assert!(matches!(cache.write("favorites", "[]"), Err(LocalCacheError::Io(_))));
    }

    #[test]
    fn memory_cache_is_seedable() {
        let cache = MemoryLocalCache::new().with_entry("favorites", "[]");
        assert_eq!(cache.read("favorites").expect("read").as_deref(), Some("[]"));
        assert_eq!(cache.read("other").expect("read"), None);
    }
}
