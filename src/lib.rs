//! minisql - a minimal file-backed relational database engine
//!
//! One line of SQL-like text goes through the statement parser into a
//! [`sql::Command`], which the [`QueryExecutor`] dispatches either to the
//! schema catalog (databases, tables) or to the row store (rows).
//!
//! ## Layout on disk
//! - `<root>/<db>/catalog.json`: table schemas of one database
//! - `<root>/<db>/<table>.json`: rows of one table
//! - `<root>/.current_db`: the selected database
//!
//! ```no_run
//! use minisql::{execute_sql, EngineConfig, QueryExecutor};
//!
//! let executor = QueryExecutor::new(EngineConfig::with_root("Data"));
//! execute_sql(&executor, "CREATE DATABASE shop")?;
//! execute_sql(&executor, "USE shop")?;
//! execute_sql(&executor, "CREATE TABLE items (id INT PRIMARY KEY AUTO_INCREMENT, name VARCHAR(20))")?;
//! execute_sql(&executor, "INSERT INTO items (name) VALUES ('pen')")?;
//! let result = execute_sql(&executor, "SELECT * FROM items")?;
//! assert_eq!(result.row_count(), 1);
//! # Ok::<(), minisql::DbError>(())
//! ```

pub mod catalog;
pub mod config;
pub mod session;
pub mod sql;
pub mod storage;
pub mod types;

mod error;

pub use catalog::{Database, TableRegistry};
pub use config::EngineConfig;
pub use error::{DbError, ErrorKind, Result};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};
pub use sql::{execute_sql, parse, Command, QueryExecutor, QueryResult};
pub use types::{ColumnDef, ColumnType, Constraint, Literal, Row, TableSchema, Value};
