/// Query executor - dispatches parsed commands to the catalog and row store
use super::ast::*;
use crate::catalog::{Database, TableRegistry};
use crate::config::EngineConfig;
use crate::error::{DbError, Result};
use crate::session::{FileSessionStore, SessionStore};
use crate::storage::{target_table, TableStore};
use crate::types::{Row, TableSchema, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Statement syntax listed by HELP
pub const HELP_COMMANDS: &[&str] = &[
    "CREATE DATABASE [IF NOT EXISTS] name",
    "DROP DATABASE [IF EXISTS] name",
    "ALTER DATABASE name RENAME TO new_name",
    "USE name",
    "SHOW DATABASES",
    "SHOW TABLES",
    "CREATE TABLE name (column TYPE [constraints], ..., [CONSTRAINT n] FOREIGN KEY (cols) REFERENCES t(cols))",
    "DROP TABLE [IF EXISTS] [db.]name",
    "DESCRIBE [table]",
    "INSERT INTO table [(columns)] VALUES (values)",
    "SELECT [DISTINCT] columns|* FROM table [WHERE cond] [GROUP BY cols [HAVING cond]] [ORDER BY col [ASC|DESC], ...] [LIMIT [offset,] count]",
    "UPDATE table SET column = value, ... [WHERE cond]",
    "DELETE FROM table [WHERE cond]",
    "HELP",
    "EXIT",
];

/// Query result
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    DatabaseCreated {
        name: String,
        path: PathBuf,
        /// false when IF NOT EXISTS found the name taken
        created: bool,
    },
    DatabaseDropped {
        name: String,
        dropped: bool,
    },
    DatabaseRenamed {
        from: String,
        to: String,
    },
    DatabaseSelected {
        name: String,
    },
    Databases {
        names: Vec<String>,
    },
    TableCreated {
        table: String,
        table_file: PathBuf,
        catalog_file: PathBuf,
    },
    TableDropped {
        table: String,
        dropped: bool,
        skipped: bool,
    },
    Tables {
        database: String,
        names: Vec<String>,
    },
    Described {
        schemas: Vec<TableSchema>,
    },
    /// The stored row, in schema column order
    Inserted {
        columns: Vec<String>,
        row: Row,
    },
    /// UPDATE/DELETE result
    Modification {
        affected_rows: usize,
    },
    /// SELECT result
    Select {
        columns: Vec<String>,
        rows: Vec<Row>,
    },
    Help {
        commands: Vec<String>,
    },
    Exit,
}

impl QueryResult {
    pub fn affected_rows(&self) -> usize {
        match self {
            QueryResult::Modification { affected_rows } => *affected_rows,
            QueryResult::Inserted { .. } => 1,
            _ => 0,
        }
    }

    /// Get columns and rows from SELECT result
    /// Returns None if not a SELECT result
    pub fn select_rows(&self) -> Option<(&[String], &[Row])> {
        match self {
            QueryResult::Select { columns, rows } => Some((columns.as_slice(), rows.as_slice())),
            _ => None,
        }
    }

    /// Get rows as maps (column_name -> value)
    /// Returns empty vec if not a SELECT result
    pub fn rows_as_maps(&self) -> Vec<HashMap<String, Value>> {
        match self {
            QueryResult::Select { columns, rows } => rows
                .iter()
                .map(|row| {
                    columns
                        .iter()
                        .zip(row.iter())
                        .map(|(col, val)| (col.clone(), val.clone()))
                        .collect()
                })
                .collect(),
            _ => vec![],
        }
    }

    /// Get row count for SELECT results
    pub fn row_count(&self) -> usize {
        match self {
            QueryResult::Select { rows, .. } => rows.len(),
            other => other.affected_rows(),
        }
    }
}

pub struct QueryExecutor {
    config: EngineConfig,
    session: Box<dyn SessionStore>,
}

impl QueryExecutor {
    /// Executor whose session lives in the marker file under the storage root
    pub fn new(config: EngineConfig) -> Self {
        let session = Box::new(FileSessionStore::new(&config));
        Self { config, session }
    }

    pub fn with_session(config: EngineConfig, session: Box<dyn SessionStore>) -> Self {
        Self { config, session }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Name of the selected database, if any
    pub fn current_database(&self) -> Result<Option<String>> {
        self.session.current()
    }

    pub fn execute(&self, command: Command) -> Result<QueryResult> {
        debug!(?command, "executing");
        match command {
            Command::CreateDatabase { name, if_not_exists } => self.execute_create_database(&name, if_not_exists),
            Command::DropDatabase { name, if_exists } => self.execute_drop_database(&name, if_exists),
            Command::RenameDatabase { name, new_name } => self.execute_rename_database(&name, &new_name),
            Command::Use { database_name } => self.execute_use(database_name),
            Command::ShowDatabases => Ok(QueryResult::Databases {
                names: Database::list(&self.config)?,
            }),
            Command::ShowTables => self.execute_show_tables(),
            Command::Describe { table_name } => self.execute_describe(table_name.as_deref()),
            Command::CreateTable(stmt) => self.execute_create_table(stmt),
            Command::DropTable(stmt) => self.execute_drop_table(stmt),
            Command::Insert(stmt) => self.execute_insert(stmt),
            Command::Select(stmt) => self.execute_select(stmt),
            Command::Update(stmt) => self.execute_update(stmt),
            Command::Delete(stmt) => self.execute_delete(stmt),
            Command::Help => Ok(QueryResult::Help {
                commands: HELP_COMMANDS.iter().map(|c| c.to_string()).collect(),
            }),
            Command::Exit => Ok(QueryResult::Exit),
        }
    }

    // ===== databases =====

    fn execute_create_database(&self, name: &str, if_not_exists: bool) -> Result<QueryResult> {
        let outcome = Database::new(&self.config, name).create(if_not_exists)?;
        Ok(QueryResult::DatabaseCreated {
            name: outcome.name,
            path: outcome.path,
            created: outcome.created,
        })
    }

    fn execute_drop_database(&self, name: &str, if_exists: bool) -> Result<QueryResult> {
        let database = Database::new(&self.config, name);
        if !database.exists() && !if_exists {
            return Err(DbError::DatabaseNotFound(name.to_string()));
        }
        let dropped = database.drop_database()?;
        if self.session.current()?.as_deref() == Some(name) {
            self.session.clear()?;
        }
        Ok(QueryResult::DatabaseDropped {
            name: name.to_string(),
            dropped,
        })
    }

    fn execute_rename_database(&self, name: &str, new_name: &str) -> Result<QueryResult> {
        Database::new(&self.config, name).rename(new_name)?;
        if self.session.current()?.as_deref() == Some(name) {
            self.session.set(new_name)?;
        }
        Ok(QueryResult::DatabaseRenamed {
            from: name.to_string(),
            to: new_name.to_string(),
        })
    }

    fn execute_use(&self, name: String) -> Result<QueryResult> {
        if !Database::new(&self.config, name.as_str()).exists() {
            return Err(DbError::DatabaseNotFound(name));
        }
        self.session.set(&name)?;
        Ok(QueryResult::DatabaseSelected { name })
    }

    /// Registry of the selected database
    fn current_registry(&self) -> Result<TableRegistry> {
        let name = self.session.current()?.ok_or(DbError::NoDatabaseSelected)?;
        TableRegistry::open(&self.config, &name)
    }

    // ===== tables =====

    fn execute_show_tables(&self) -> Result<QueryResult> {
        let registry = self.current_registry()?;
        Ok(QueryResult::Tables {
            database: registry.database().to_string(),
            names: registry.list_tables(),
        })
    }

    fn execute_describe(&self, table_name: Option<&str>) -> Result<QueryResult> {
        let registry = self.current_registry()?;
        let schemas = match table_name {
            Some(name) => vec![registry.describe(name)?],
            None => registry.describe_all(),
        };
        Ok(QueryResult::Described { schemas })
    }

    fn execute_create_table(&self, stmt: CreateTableStmt) -> Result<QueryResult> {
        let registry = self.current_registry()?;
        let schema = TableSchema::new(stmt.table_name.clone(), stmt.columns, stmt.foreign_keys);
        let created = registry.create_table(schema)?;
        Ok(QueryResult::TableCreated {
            table: stmt.table_name,
            table_file: created.table_file,
            catalog_file: created.catalog_file,
        })
    }

    fn execute_drop_table(&self, stmt: DropTableStmt) -> Result<QueryResult> {
        let registry = match &stmt.database {
            Some(db) => TableRegistry::open(&self.config, db)?,
            None => self.current_registry()?,
        };
        let outcome = registry.drop_table(&stmt.table_name, stmt.if_exists)?;
        Ok(QueryResult::TableDropped {
            table: stmt.table_name,
            dropped: outcome.dropped,
            skipped: outcome.skipped,
        })
    }

    // ===== rows =====

    fn execute_insert(&self, stmt: InsertStmt) -> Result<QueryResult> {
        let registry = self.current_registry()?;
        let schema = registry.describe(&stmt.table_name)?;
        let store = TableStore::new(&self.config, registry.database(), &schema);
        let row = store.insert(stmt.columns.as_deref(), &stmt.values)?;
        Ok(QueryResult::Inserted {
            columns: schema.column_names(),
            row,
        })
    }

    fn execute_update(&self, stmt: UpdateStmt) -> Result<QueryResult> {
        let registry = self.current_registry()?;
        let schema = registry.describe(&stmt.table_name)?;
        let store = TableStore::new(&self.config, registry.database(), &schema);
        let condition = stmt.where_clause.as_ref().map(|p| &p.expr);
        let affected_rows = store.update(&stmt.assignments, condition)?;
        Ok(QueryResult::Modification { affected_rows })
    }

    fn execute_delete(&self, stmt: DeleteStmt) -> Result<QueryResult> {
        let registry = self.current_registry()?;
        let schema = registry.describe(&stmt.table_name)?;
        let store = TableStore::new(&self.config, registry.database(), &schema);
        let condition = stmt.where_clause.as_ref().map(|p| &p.expr);
        let affected_rows = store.delete(condition)?;
        Ok(QueryResult::Modification { affected_rows })
    }

    fn execute_select(&self, stmt: SelectStmt) -> Result<QueryResult> {
        let table = target_table(&stmt)?;
        let registry = self.current_registry()?;
        let schema = registry.describe(table)?;
        let store = TableStore::new(&self.config, registry.database(), &schema);
        let (columns, rows) = store.select(&stmt)?;
        Ok(QueryResult::Select { columns, rows })
    }
}
