//! Value types for minisql

mod checker;
mod table;

pub use checker::check_type;
pub use table::{ColumnDef, ColumnType, Constraint, DefaultValue, ForeignKey, ReferentialAction, TableSchema};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A typed cell value as stored in a table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    /// Null value
    Null,

    /// Integer value (INT)
    Integer(i64),

    /// Floating point value (FLOAT)
    Float(f64),

    /// Text string (VARCHAR, TEXT, TIMESTAMP)
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Equality used by UNIQUE / PRIMARY KEY checks and predicates.
    ///
    /// Integers and floats compare numerically; NULL never equals anything.
    pub fn sql_eq(&self, other: &Value) -> bool {
        matches!(self.sql_cmp(other), Some(Ordering::Equal))
    }

    /// Ordering between two non-null values of compatible types
    pub fn sql_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total order for ORDER BY: NULL first, then numbers, then text.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        fn rank(v: &Value) -> u8 {
            match v {
                Value::Null => 0,
                Value::Integer(_) | Value::Float(_) => 1,
                Value::Text(_) => 2,
            }
        }
        self.sql_cmp(other)
            .unwrap_or_else(|| rank(self).cmp(&rank(other)))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A row of values aligned with a schema's column order
pub type Row = Vec<Value>;

/// An untyped literal as written in a statement, before type checking.
///
/// Quoted strings and bare words both become `Text`; numbers keep their
/// lexical kind so the checker can tell `3` from `3.5`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Literal {
    /// Interpret a raw token: strips one level of matching quotes,
    /// recognises NULL, booleans and numbers; anything else is text.
    pub fn from_token(raw: &str) -> Self {
        let v = raw.trim();
        if v.len() >= 2 {
            let bytes = v.as_bytes();
            let (first, last) = (bytes[0], bytes[v.len() - 1]);
            if (first == b'\'' && last == b'\'') || (first == b'"' && last == b'"') {
                return Literal::Text(v[1..v.len() - 1].to_string());
            }
        }
        if v.eq_ignore_ascii_case("NULL") {
            return Literal::Null;
        }
        if let Ok(i) = v.parse::<i64>() {
            return Literal::Integer(i);
        }
        if let Ok(f) = v.parse::<f64>() {
            if f.is_finite() {
                return Literal::Float(f);
            }
        }
        if v.eq_ignore_ascii_case("true") {
            return Literal::Bool(true);
        }
        if v.eq_ignore_ascii_case("false") {
            return Literal::Bool(false);
        }
        Literal::Text(v.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "NULL"),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Integer(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{:?}", x),
            Literal::Text(s) => write!(f, "{}", s),
        }
    }
}
