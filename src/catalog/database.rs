/// Database directories under the storage root
use super::TableRegistry;
use crate::config::EngineConfig;
use crate::error::{DbError, Result};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Result of [`Database::create`]
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOutcome {
    /// false when the name was taken and IF NOT EXISTS was given
    pub created: bool,
    /// Final name, possibly suffixed `_1`, `_2`, ...
    pub name: String,
    pub path: PathBuf,
}

/// One database: a directory holding a catalog and one data file per table
pub struct Database<'a> {
    config: &'a EngineConfig,
    name: String,
}

impl<'a> Database<'a> {
    pub fn new(config: &'a EngineConfig, name: impl Into<String>) -> Self {
        Self {
            config,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> PathBuf {
        self.config.database_dir(&self.name)
    }

    pub fn exists(&self) -> bool {
        self.path().is_dir()
    }

    /// Create the directory and an empty catalog.
    ///
    /// A taken name is not an error: without `if_not_exists` the first free
    /// `name_N` is used instead.
    pub fn create(&mut self, if_not_exists: bool) -> Result<CreateOutcome> {
        fs::create_dir_all(&self.config.storage_root)?;

        if self.exists() {
            if if_not_exists {
                debug!(database = %self.name, "database exists, skipping create");
                return Ok(CreateOutcome {
                    created: false,
                    name: self.name.clone(),
                    path: self.path(),
                });
            }
            let base = self.name.clone();
            let mut suffix = 1u32;
            loop {
                let candidate = format!("{}_{}", base, suffix);
                if !self.config.database_dir(&candidate).exists() {
                    self.name = candidate;
                    break;
                }
                suffix += 1;
            }
        }

        let path = self.path();
        fs::create_dir(&path)?;
        if let Err(e) = TableRegistry::initialize(self.config, &self.name) {
            // no half-created database left behind
            if let Err(cleanup) = fs::remove_dir_all(&path) {
                warn!(database = %self.name, path = %path.display(), error = %cleanup, "could not remove half-created database");
            }
            return Err(e);
        }
        info!(database = %self.name, path = %path.display(), "created database");

        Ok(CreateOutcome {
            created: true,
            name: self.name.clone(),
            path,
        })
    }

    /// Remove the directory and every table in it. Returns false if absent.
    pub fn drop_database(&self) -> Result<bool> {
        if !self.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(self.path())?;
        info!(database = %self.name, "dropped database");
        Ok(true)
    }

    /// Rename the directory; fails if either side is wrong.
    pub fn rename(&mut self, new_name: &str) -> Result<()> {
        if !self.exists() {
            return Err(DbError::DatabaseNotFound(self.name.clone()));
        }
        let target = self.config.database_dir(new_name);
        if target.exists() {
            return Err(DbError::DatabaseExists(new_name.to_string()));
        }
        fs::rename(self.path(), &target)?;
        info!(from = %self.name, to = new_name, "renamed database");
        self.name = new_name.to_string();
        Ok(())
    }

    /// Open the table registry of this database
    pub fn registry(&self) -> Result<TableRegistry> {
        TableRegistry::open(self.config, &self.name)
    }

    /// Sorted database names; empty if the storage root does not exist.
    pub fn list(config: &EngineConfig) -> Result<Vec<String>> {
        if !config.storage_root.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&config.storage_root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}
