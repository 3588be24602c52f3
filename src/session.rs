//! Current-database session state
//!
//! The selected database is kept behind [`SessionStore`] so the executor
//! never touches ambient global state.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::storage::write_atomic;
use parking_lot::RwLock;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

/// Get/set/clear access to the current database name
pub trait SessionStore: Send + Sync {
    fn current(&self) -> Result<Option<String>>;
    fn set(&self, database: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Session marker file with a read-through cache.
///
/// Single-process use only: another process writing the marker is not
/// noticed until [`FileSessionStore::invalidate`] is called.
pub struct FileSessionStore {
    path: PathBuf,
    /// `None` until the marker has been read
    cache: RwLock<Option<Option<String>>>,
}

impl FileSessionStore {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            path: config.session_path(),
            cache: RwLock::new(None),
        }
    }

    /// Force the next read to go to disk
    pub fn invalidate(&self) {
        *self.cache.write() = None;
    }

    fn read_marker(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let name = content.trim();
                Ok((!name.is_empty()).then(|| name.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn current(&self) -> Result<Option<String>> {
        if let Some(cached) = self.cache.read().as_ref() {
            return Ok(cached.clone());
        }
        let loaded = self.read_marker()?;
        *self.cache.write() = Some(loaded.clone());
        Ok(loaded)
    }

    fn set(&self, database: &str) -> Result<()> {
        self.invalidate();
        write_atomic(&self.path, database.as_bytes())?;
        debug!(database, "session switched");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.invalidate();
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        debug!("session cleared");
        Ok(())
    }
}

/// In-memory session, for embedding and tests
#[derive(Default)]
pub struct MemorySessionStore {
    current: RwLock<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn current(&self) -> Result<Option<String>> {
        Ok(self.current.read().clone())
    }

    fn set(&self, database: &str) -> Result<()> {
        *self.current.write() = Some(database.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.current.write() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_session_round_trip() {
        let dir = tempdir().unwrap();
        let config = EngineConfig::for_testing(dir.path());
        let store = FileSessionStore::new(&config);

        assert_eq!(store.current().unwrap(), None);
        store.set("shop").unwrap();
        assert_eq!(store.current().unwrap(), Some("shop".to_string()));

        // a second store sees the persisted marker
        let other = FileSessionStore::new(&config);
        assert_eq!(other.current().unwrap(), Some("shop".to_string()));

        store.clear().unwrap();
        assert_eq!(store.current().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn test_cache_is_read_through() {
        let dir = tempdir().unwrap();
        let config = EngineConfig::for_testing(dir.path());
        let store = FileSessionStore::new(&config);
        store.set("a").unwrap();
        assert_eq!(store.current().unwrap().as_deref(), Some("a"));

        // external change is only seen after invalidation
        fs::write(config.session_path(), "b").unwrap();
        assert_eq!(store.current().unwrap().as_deref(), Some("a"));
        store.invalidate();
        assert_eq!(store.current().unwrap().as_deref(), Some("b"));
    }

    #[test]
    fn test_memory_session() {
        let store = MemorySessionStore::new();
        assert_eq!(store.current().unwrap(), None);
        store.set("x").unwrap();
        assert_eq!(store.current().unwrap().as_deref(), Some("x"));
        store.clear().unwrap();
        assert_eq!(store.current().unwrap(), None);
    }
}
