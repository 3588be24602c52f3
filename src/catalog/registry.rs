/// Table registry: the per-database catalog document
use crate::config::EngineConfig;
use crate::error::{DbError, Result};
use crate::storage::{read_document, write_atomic, TableStore};
use crate::types::TableSchema;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{info, warn};

/// Catalog metadata (persisted to disk)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RegistryMetadata {
    /// Reserved, not enforced
    #[serde(default)]
    relations: Vec<serde_json::Value>,
    /// Table schemas in creation order
    #[serde(default)]
    tables: Vec<TableSchema>,
}

/// Files written by [`TableRegistry::create_table`]
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedTable {
    pub table_file: PathBuf,
    pub catalog_file: PathBuf,
}

/// Outcome of [`TableRegistry::drop_table`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropOutcome {
    pub dropped: bool,
    /// Table was absent and IF EXISTS was given
    pub skipped: bool,
}

/// Table registry for one database
pub struct TableRegistry {
    config: EngineConfig,
    database: String,
    /// Metadata (protected by RwLock)
    metadata: RwLock<RegistryMetadata>,
    /// Persistence file path
    persist_path: PathBuf,
}

impl TableRegistry {
    /// Write an empty catalog for a freshly created database
    pub(crate) fn initialize(config: &EngineConfig, database: &str) -> Result<()> {
        let empty = RegistryMetadata::default();
        write_atomic(&config.catalog_path(database), &config.encode(&empty)?)
    }

    /// Open the registry of an existing database
    pub fn open(config: &EngineConfig, database: &str) -> Result<Self> {
        if !config.database_dir(database).is_dir() {
            return Err(DbError::DatabaseNotFound(database.to_string()));
        }
        let persist_path = config.catalog_path(database);

        let metadata = if persist_path.exists() {
            let mut meta: RegistryMetadata = read_document(&persist_path)?;
            // Rebuild column maps after deserialization
            for schema in meta.tables.iter_mut() {
                schema.rebuild_column_map();
            }
            meta
        } else {
            RegistryMetadata::default()
        };

        Ok(Self {
            config: config.clone(),
            database: database.to_string(),
            metadata: RwLock::new(metadata),
            persist_path,
        })
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Register a table and create its empty data file.
    ///
    /// The data file is written first; if the catalog cannot be saved it is
    /// removed again, so a table is either fully registered or absent.
    pub fn create_table(&self, mut schema: TableSchema) -> Result<CreatedTable> {
        if let Some(column) = schema.duplicate_column() {
            return Err(DbError::DuplicateColumn {
                table: schema.name.clone(),
                column: column.to_string(),
            });
        }

        let mut meta = self.metadata.write();

        // Check if table already exists
        if meta.tables.iter().any(|t| t.name == schema.name) {
            return Err(DbError::TableExists(schema.name));
        }

        let table_file = self.config.table_path(&self.database, &schema.name);
        if table_file == self.persist_path {
            return Err(DbError::Unsupported(format!(
                "table name '{}' is reserved for the catalog",
                schema.name
            )));
        }
        if table_file.exists() {
            warn!(table = %schema.name, path = %table_file.display(), "unregistered data file in the way");
            return Err(DbError::TableExists(schema.name));
        }

        schema.rebuild_column_map();
        TableStore::new(&self.config, &self.database, &schema).persist(&[])?;

        meta.tables.push(schema);
        if let Err(e) = self.persist(&meta) {
            if let Some(schema) = meta.tables.pop() {
                warn!(table = %schema.name, error = %e, "catalog write failed, rolling back data file");
            }
            if let Err(cleanup) = fs::remove_file(&table_file) {
                warn!(path = %table_file.display(), error = %cleanup, "could not remove data file during rollback");
            }
            return Err(e);
        }

        if let Some(schema) = meta.tables.last() {
            info!(database = %self.database, table = %schema.name, "created table");
        }
        Ok(CreatedTable {
            table_file,
            catalog_file: self.persist_path.clone(),
        })
    }

    /// Drop a table: its catalog entry, then its data file (tolerating absence).
    ///
    /// The catalog is saved before the data file is touched; if saving fails
    /// the entry is restored and the rows stay where they were.
    pub fn drop_table(&self, table_name: &str, if_exists: bool) -> Result<DropOutcome> {
        let mut meta = self.metadata.write();
        let Some(position) = meta.tables.iter().position(|t| t.name == table_name) else {
            if !if_exists {
                return Err(DbError::TableNotFound(table_name.to_string()));
            }
            return Ok(DropOutcome {
                dropped: false,
                skipped: true,
            });
        };

        let schema = meta.tables.remove(position);
        if let Err(e) = self.persist(&meta) {
            warn!(table = table_name, error = %e, "catalog write failed, keeping table");
            meta.tables.insert(position, schema);
            return Err(e);
        }

        let table_file = self.config.table_path(&self.database, table_name);
        match fs::remove_file(&table_file) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(table = table_name, path = %table_file.display(), error = %e, "table unregistered but its data file was left behind")
            }
        }
        info!(database = %self.database, table = table_name, "dropped table");

        Ok(DropOutcome {
            dropped: true,
            skipped: false,
        })
    }

    /// Get table schema
    pub fn describe(&self, table_name: &str) -> Result<TableSchema> {
        self.metadata
            .read()
            .tables
            .iter()
            .find(|t| t.name == table_name)
            .cloned()
            .ok_or_else(|| DbError::TableNotFound(table_name.to_string()))
    }

    /// Every schema, in creation order
    pub fn describe_all(&self) -> Vec<TableSchema> {
        self.metadata.read().tables.clone()
    }

    /// List all tables
    pub fn list_tables(&self) -> Vec<String> {
        self.metadata.read().tables.iter().map(|t| t.name.clone()).collect()
    }

    /// Check if table exists
    pub fn table_exists(&self, table_name: &str) -> bool {
        self.metadata.read().tables.iter().any(|t| t.name == table_name)
    }

    pub fn catalog_path(&self) -> &PathBuf {
        &self.persist_path
    }

    /// Persist metadata to disk
    fn persist(&self, meta: &RegistryMetadata) -> Result<()> {
        write_atomic(&self.persist_path, &self.config.encode(meta)?)
    }
}
