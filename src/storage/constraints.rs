/// Constraint resolution for a single column value
use crate::error::{DbError, Result};
use crate::types::{check_type, ColumnDef, DefaultValue, Row, Value};

/// Text form of DEFAULT CURRENT_TIMESTAMP
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of resolving one column
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Value(Value),
    /// AUTO_INCREMENT column to be filled once the rest of the row is valid
    PendingAuto,
}

/// Resolve the already type-checked `value` for `column` (at `position`)
/// against `rows`.
///
/// `exclude` skips one row during the UNIQUE scan; an UPDATE passes the
/// row being rewritten.
pub fn resolve(
    column: &ColumnDef,
    position: usize,
    value: Value,
    rows: &[Row],
    exclude: Option<usize>,
) -> Result<Resolved> {
    if !value.is_null() {
        if column.is_unique() {
            let taken = rows
                .iter()
                .enumerate()
                .filter(|(i, _)| Some(*i) != exclude)
                .any(|(_, row)| row.get(position).is_some_and(|v| v.sql_eq(&value)));
            if taken {
                return Err(DbError::Unique(column.name.clone()));
            }
        }
        return Ok(Resolved::Value(value));
    }

    match column.default_value() {
        Some(DefaultValue::CurrentTimestamp) => {
            let now = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
            return Ok(Resolved::Value(Value::Text(now)));
        }
        Some(DefaultValue::Literal(literal)) if !literal.is_null() => {
            return check_type(&column.name, literal, column.col_type).map(Resolved::Value);
        }
        _ => {}
    }

    if column.is_auto_increment() {
        return Ok(Resolved::PendingAuto);
    }
    if column.is_not_null() {
        return Err(DbError::NotNull(column.name.clone()));
    }
    if column.is_primary_key() {
        return Err(DbError::PrimaryKeyNull(column.name.clone()));
    }
    Ok(Resolved::Value(Value::Null))
}

/// `1 + max` of the column, counting missing or non-numeric values as 0
pub fn next_auto_value(rows: &[Row], position: usize) -> i64 {
    let max = rows
        .iter()
        .map(|row| match row.get(position) {
            Some(Value::Integer(i)) => *i,
            Some(Value::Float(f)) => *f as i64,
            Some(Value::Text(s)) => s.trim().parse::<i64>().unwrap_or(0),
            _ => 0,
        })
        .fold(0, i64::max);
    max.saturating_add(1)
}
