//! Error types for the minisql engine

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

/// Failure families reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed statement, unknown keyword, clause length mismatch
    Parse,
    /// Duplicate table, missing table/database, unknown column reference
    Schema,
    /// Value does not satisfy the declared column type
    Type,
    /// NOT NULL, PRIMARY KEY, UNIQUE violations
    Constraint,
    /// JOINs and other statements the engine refuses to run
    Unsupported,
    /// Filesystem failure or unreadable document
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Parse => "ParseError",
            ErrorKind::Schema => "SchemaError",
            ErrorKind::Type => "TypeError",
            ErrorKind::Constraint => "ConstraintError",
            ErrorKind::Unsupported => "UnsupportedError",
            ErrorKind::Io => "IOError",
        }
    }
}

#[derive(Error, Debug)]
pub enum DbError {
    // Parsing
    #[error("Parse error: {0}")]
    Parse(String),

    // Schema
    #[error("No database selected")]
    NoDatabaseSelected,

    #[error("Database not found: {0}")]
    DatabaseNotFound(String),

    #[error("Database already exists: {0}")]
    DatabaseExists(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Table already exists: {0}")]
    TableExists(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Duplicate column '{column}' in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("Column count mismatch: {columns} column(s) for {values} value(s)")]
    ColumnCountMismatch { columns: usize, values: usize },

    // Types
    #[error("Type error on column '{column}': {detail}")]
    Type { column: String, detail: String },

    #[error("Type error on column '{column}': VARCHAR length exceeded ({len} > {max})")]
    VarcharLength { column: String, len: usize, max: usize },

    // Constraints
    #[error("NOT NULL violation on column '{0}'")]
    NotNull(String),

    #[error("PRIMARY KEY cannot be NULL ({0})")]
    PrimaryKeyNull(String),

    #[error("UNIQUE violation on column '{0}'")]
    Unique(String),

    #[error("PRIMARY KEY violation: duplicate key ({0})")]
    PrimaryKey(String),

    // Unsupported
    #[error("Not supported: {0}")]
    Unsupported(String),

    // IO
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupted file {path}: {detail}")]
    Corrupted { path: PathBuf, detail: String },
}

impl DbError {
    /// Taxonomy family of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::Parse(_) | DbError::ColumnCountMismatch { .. } => ErrorKind::Parse,
            DbError::NoDatabaseSelected
            | DbError::DatabaseNotFound(_)
            | DbError::DatabaseExists(_)
            | DbError::TableNotFound(_)
            | DbError::TableExists(_)
            | DbError::ColumnNotFound(_)
            | DbError::DuplicateColumn { .. } => ErrorKind::Schema,
            DbError::Type { .. } | DbError::VarcharLength { .. } => ErrorKind::Type,
            DbError::NotNull(_)
            | DbError::PrimaryKeyNull(_)
            | DbError::Unique(_)
            | DbError::PrimaryKey(_) => ErrorKind::Constraint,
            DbError::Unsupported(_) => ErrorKind::Unsupported,
            DbError::Io(_) | DbError::Serialization(_) | DbError::Corrupted { .. } => ErrorKind::Io,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            DbError::Parse(_) => "syntax_error",
            DbError::ColumnCountMismatch { .. } => "columns_values_mismatch",
            DbError::NoDatabaseSelected => "no_database_selected",
            DbError::DatabaseNotFound(_) => "database_not_found",
            DbError::DatabaseExists(_) => "database_exists",
            DbError::TableNotFound(_) => "table_not_found",
            DbError::TableExists(_) => "table_exists",
            DbError::ColumnNotFound(_) => "column_not_found",
            DbError::DuplicateColumn { .. } => "duplicate_column",
            DbError::Type { .. } => "type_error",
            DbError::VarcharLength { .. } => "varchar_length_exceeded",
            DbError::NotNull(_) => "not_null_violation",
            DbError::PrimaryKeyNull(_) => "primary_key_null",
            DbError::Unique(_) => "unique_violation",
            DbError::PrimaryKey(_) => "primary_key_violation",
            DbError::Unsupported(_) => "unsupported",
            DbError::Io(_) => "io_error",
            DbError::Serialization(_) => "serialization_error",
            DbError::Corrupted { .. } => "corrupted_file",
        }
    }

    pub(crate) fn type_error(column: &str, detail: impl Into<String>) -> Self {
        DbError::Type {
            column: column.to_string(),
            detail: detail.into(),
        }
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

impl From<tempfile::PersistError> for DbError {
    fn from(err: tempfile::PersistError) -> Self {
        DbError::Io(err.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_code() {
        let err = DbError::VarcharLength {
            column: "name".into(),
            len: 7,
            max: 5,
        };
        assert_eq!(err.kind(), ErrorKind::Type);
        assert_eq!(err.code(), "varchar_length_exceeded");
        assert!(err.to_string().contains("VARCHAR length exceeded"));

        let err = DbError::PrimaryKey("id=1".into());
        assert_eq!(err.kind(), ErrorKind::Constraint);
        assert_eq!(err.kind().as_str(), "ConstraintError");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: DbError = io.into();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.code(), "io_error");
    }
}
