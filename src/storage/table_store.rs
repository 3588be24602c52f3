/// Row store: one table's persisted rows
use super::constraints::{next_auto_value, resolve, Resolved};
use super::query::execute_select;
use super::{read_document, write_atomic};
use crate::config::EngineConfig;
use crate::error::{DbError, Result};
use crate::sql::ast::{Expr, SelectStmt};
use crate::sql::evaluator::RowEvaluator;
use crate::types::{check_type, ColumnType, Literal, Row, TableSchema, Value};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::path::{Path, PathBuf};
use tracing::debug;

/// On-disk shape of a table data file
#[derive(Debug, Default, Serialize, Deserialize)]
struct TableDocument {
    #[serde(default)]
    rows: Vec<Map<String, JsonValue>>,
}

/// Reads and rewrites `<db>/<table>.json` for one schema
pub struct TableStore<'a> {
    config: &'a EngineConfig,
    schema: &'a TableSchema,
    path: PathBuf,
}

impl<'a> TableStore<'a> {
    pub fn new(config: &'a EngineConfig, database: &str, schema: &'a TableSchema) -> Self {
        Self {
            config,
            schema,
            path: config.table_path(database, &schema.name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every row in schema column order. A missing file is an empty table.
    pub fn load(&self) -> Result<Vec<Row>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let doc: TableDocument = read_document(&self.path)?;
        doc.rows.iter().map(|record| self.decode_row(record)).collect()
    }

    /// Rewrite the data file with `rows`.
    pub fn persist(&self, rows: &[Row]) -> Result<()> {
        let doc = TableDocument {
            rows: rows.iter().map(|row| self.encode_row(row)).collect(),
        };
        write_atomic(&self.path, &self.config.encode(&doc)?)?;
        debug!(table = %self.schema.name, rows = rows.len(), "persisted table");
        Ok(())
    }

    /// Insert one row. Columns left out are resolved from their constraints.
    pub fn insert(&self, columns: Option<&[String]>, values: &[Literal]) -> Result<Row> {
        let schema = self.schema;
        let names: Vec<String> = match columns {
            Some(cols) => cols.to_vec(),
            None => schema.column_names(),
        };
        if names.len() != values.len() {
            return Err(DbError::ColumnCountMismatch {
                columns: names.len(),
                values: values.len(),
            });
        }

        // provided literal per schema position
        let mut provided: Vec<Option<&Literal>> = vec![None; schema.column_count()];
        for (name, literal) in names.iter().zip(values) {
            let pos = schema
                .get_column_position(name)
                .ok_or_else(|| DbError::ColumnNotFound(name.clone()))?;
            if provided[pos].is_some() {
                return Err(DbError::Parse(format!("column '{}' specified more than once", name)));
            }
            provided[pos] = Some(literal);
        }

        let mut rows = self.load()?;

        let mut new_row = Vec::with_capacity(schema.column_count());
        let mut pending = Vec::new();
        for (pos, column) in schema.columns.iter().enumerate() {
            let typed = match provided[pos] {
                Some(literal) => check_type(&column.name, literal, column.col_type)?,
                None => Value::Null,
            };
            match resolve(column, pos, typed, &rows, None)? {
                Resolved::Value(v) => new_row.push(v),
                Resolved::PendingAuto => {
                    pending.push(pos);
                    new_row.push(Value::Null);
                }
            }
        }
        for pos in pending {
            new_row[pos] = Value::Integer(next_auto_value(&rows, pos));
        }

        if let Some(key) = self.find_key_conflict(&rows, &new_row, None) {
            return Err(DbError::PrimaryKey(key));
        }

        rows.push(new_row.clone());
        self.persist(&rows)?;
        Ok(new_row)
    }

    /// Apply `assignments` to every row matching `predicate`; returns the
    /// number of rows changed. Nothing is written if any row fails.
    pub fn update(&self, assignments: &[(String, Literal)], predicate: Option<&Expr>) -> Result<usize> {
        let schema = self.schema;
        let mut targets = Vec::with_capacity(assignments.len());
        for (name, literal) in assignments {
            let pos = schema
                .get_column_position(name)
                .ok_or_else(|| DbError::ColumnNotFound(name.clone()))?;
            targets.push((pos, literal));
        }

        let mut rows = self.load()?;
        let matched = self.matching_rows(&rows, predicate)?;

        for &idx in &matched {
            for &(pos, literal) in &targets {
                let column = &schema.columns[pos];
                let typed = check_type(&column.name, literal, column.col_type)?;
                let value = match resolve(column, pos, typed, &rows, Some(idx))? {
                    Resolved::Value(v) => v,
                    Resolved::PendingAuto => Value::Integer(next_auto_value(&rows, pos)),
                };
                rows[idx][pos] = value;
            }
        }

        for &idx in &matched {
            if let Some(key) = self.find_key_conflict(&rows, &rows[idx], Some(idx)) {
                return Err(DbError::PrimaryKey(key));
            }
        }

        self.persist(&rows)?;
        Ok(matched.len())
    }

    /// Remove every row matching `predicate` (all rows when absent).
    pub fn delete(&self, predicate: Option<&Expr>) -> Result<usize> {
        let rows = self.load()?;
        let matched = self.matching_rows(&rows, predicate)?;

        let total = rows.len();
        let kept: Vec<Row> = rows
            .into_iter()
            .enumerate()
            .filter(|(i, _)| matched.binary_search(i).is_err())
            .map(|(_, row)| row)
            .collect();

        self.persist(&kept)?;
        Ok(total - kept.len())
    }

    /// Run a SELECT against this table
    pub fn select(&self, stmt: &SelectStmt) -> Result<(Vec<String>, Vec<Row>)> {
        let rows = self.load()?;
        execute_select(self.schema, rows, stmt)
    }

    /// Indices of rows satisfying `predicate`, ascending
    fn matching_rows(&self, rows: &[Row], predicate: Option<&Expr>) -> Result<Vec<usize>> {
        let Some(expr) = predicate else {
            return Ok((0..rows.len()).collect());
        };
        let columns = self.schema.column_names();
        let mut evaluator = RowEvaluator::new(&columns);
        evaluator.validate(expr)?;

        let mut matched = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            if evaluator.matches(expr, row)? {
                matched.push(i);
            }
        }
        Ok(matched)
    }

    /// Composite primary key comparison by linear scan.
    /// Returns the offending key rendered as `a=1, b=2`.
    fn find_key_conflict(&self, rows: &[Row], candidate: &Row, skip: Option<usize>) -> Option<String> {
        let positions: Vec<usize> = self
            .schema
            .primary_keys
            .iter()
            .filter_map(|k| self.schema.get_column_position(k))
            .collect();
        if positions.is_empty() {
            return None;
        }

        let clash = rows.iter().enumerate().any(|(i, row)| {
            Some(i) != skip && positions.iter().all(|&p| row[p].sql_eq(&candidate[p]))
        });
        clash.then(|| {
            positions
                .iter()
                .map(|&p| format!("{}={}", self.schema.columns[p].name, candidate[p]))
                .collect::<Vec<_>>()
                .join(", ")
        })
    }

    fn encode_row(&self, row: &Row) -> Map<String, JsonValue> {
        let mut record = Map::with_capacity(row.len());
        for (column, value) in self.schema.columns.iter().zip(row) {
            let json = match value {
                Value::Null => JsonValue::Null,
                Value::Integer(i) => JsonValue::from(*i),
                Value::Float(f) => JsonValue::from(*f),
                Value::Text(s) => JsonValue::from(s.as_str()),
            };
            record.insert(column.name.clone(), json);
        }
        record
    }

    fn decode_row(&self, record: &Map<String, JsonValue>) -> Result<Row> {
        self.schema
            .columns
            .iter()
            .map(|column| {
                let raw = record.get(&column.name).unwrap_or(&JsonValue::Null);
                decode_value(raw, column.col_type).ok_or_else(|| DbError::Corrupted {
                    path: self.path.clone(),
                    detail: format!("column '{}' holds {} which is not {}", column.name, raw, column.col_type),
                })
            })
            .collect()
    }
}

/// JSON cell → typed value for the declared column type
fn decode_value(raw: &JsonValue, col_type: ColumnType) -> Option<Value> {
    Some(match (raw, col_type) {
        (JsonValue::Null, _) => Value::Null,
        (JsonValue::Number(n), ColumnType::Int) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => {
                let f = n.as_f64()?;
                if f.fract() != 0.0 {
                    return None;
                }
                Value::Integer(f as i64)
            }
        },
        (JsonValue::Number(n), ColumnType::Float) => Value::Float(n.as_f64()?),
        (JsonValue::String(s), ColumnType::Int) => Value::Integer(s.trim().parse().ok()?),
        (JsonValue::String(s), ColumnType::Float) => Value::Float(s.trim().parse().ok()?),
        (JsonValue::String(s), _) => Value::Text(s.clone()),
        (JsonValue::Number(n), _) => Value::Text(n.to_string()),
        _ => return None,
    })
}
