//! Engine configuration
//!
//! Where databases live on disk and how their documents are written.

use crate::error::{DbError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding one sub-directory per database
    pub storage_root: PathBuf,

    /// File name of the per-database catalog document
    pub catalog_file: String,

    /// File name of the current-database marker (lives directly under `storage_root`)
    pub session_marker: String,

    /// Indent JSON documents (catalog and table data)
    pub pretty_json: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("Data"),
            catalog_file: "catalog.json".to_string(),
            session_marker: ".current_db".to_string(),
            pretty_json: true,
        }
    }
}

impl EngineConfig {
    /// Default layout rooted at `root`
    pub fn with_root<P: AsRef<Path>>(root: P) -> Self {
        Self {
            storage_root: root.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Compact documents, for tests and benchmarks
    pub fn for_testing<P: AsRef<Path>>(root: P) -> Self {
        Self {
            pretty_json: false,
            ..Self::with_root(root)
        }
    }

    /// Load a JSON config document; missing fields fall back to defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)?;
        serde_json::from_str(&data).map_err(|e| DbError::Corrupted {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }

    pub fn database_dir(&self, database: &str) -> PathBuf {
        self.storage_root.join(database)
    }

    pub fn catalog_path(&self, database: &str) -> PathBuf {
        self.database_dir(database).join(&self.catalog_file)
    }

    pub fn table_path(&self, database: &str, table: &str) -> PathBuf {
        self.database_dir(database).join(format!("{}.json", table))
    }

    pub fn session_path(&self) -> PathBuf {
        self.storage_root.join(&self.session_marker)
    }

    /// Serialize a document according to `pretty_json`
    pub(crate) fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        let bytes = if self.pretty_json {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let config = EngineConfig::with_root("/tmp/root");
        assert_eq!(config.database_dir("shop"), PathBuf::from("/tmp/root/shop"));
        assert_eq!(
            config.catalog_path("shop"),
            PathBuf::from("/tmp/root/shop/catalog.json")
        );
        assert_eq!(
            config.table_path("shop", "items"),
            PathBuf::from("/tmp/root/shop/items.json")
        );
        assert_eq!(config.session_path(), PathBuf::from("/tmp/root/.current_db"));
    }

    #[test]
    fn test_load_partial_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minisql.json");
        fs::write(&path, r#"{"storage_root": "/srv/data", "pretty_json": false}"#).unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.storage_root, PathBuf::from("/srv/data"));
        assert!(!config.pretty_json);
        assert_eq!(config.catalog_file, "catalog.json");
    }

    #[test]
    fn test_load_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "not json").unwrap();

        let err = EngineConfig::load(&path).unwrap_err();
        assert_eq!(err.code(), "corrupted_file");
    }
}
