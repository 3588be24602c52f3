//! Storage layer: row persistence, constraint resolution and the select pipeline
//!
//! Every document is rewritten whole through a temp file in the same
//! directory and renamed into place, so readers never see a half-written file.

pub mod constraints;
pub mod query;
pub mod table_store;

pub use constraints::{next_auto_value, resolve, Resolved};
pub use query::{execute_select, target_table};
pub use table_store::TableStore;

use crate::error::{DbError, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Replace `path` with `bytes` atomically.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().ok_or_else(|| {
        DbError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} has no parent directory", path.display()),
        ))
    })?;
    fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path)?;
    Ok(())
}

/// Read and decode a JSON document. A malformed document is reported as corrupted.
pub(crate) fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read(path)?;
    serde_json::from_slice(&data).map_err(|e| DbError::Corrupted {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}
