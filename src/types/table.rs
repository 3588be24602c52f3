/// Table metadata and schema definitions
use super::Literal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Declared column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColumnType {
    /// 64-bit integer
    Int,
    /// 64-bit float
    Float,
    /// Bounded string of at most `n` characters
    Varchar(usize),
    /// Unbounded string
    Text,
    /// Timestamp kept as text
    Timestamp,
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            "INT" => return Ok(ColumnType::Int),
            "FLOAT" => return Ok(ColumnType::Float),
            "TEXT" => return Ok(ColumnType::Text),
            "TIMESTAMP" => return Ok(ColumnType::Timestamp),
            _ => {}
        }

        // VARCHAR(n), tolerating inner whitespace
        let rest = upper
            .strip_prefix("VARCHAR")
            .ok_or_else(|| format!("unknown type '{}'", s.trim()))?
            .trim_start();
        let len = rest
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .map(str::trim)
            .ok_or_else(|| format!("VARCHAR needs a length: '{}'", s.trim()))?;
        len.parse::<usize>()
            .map(ColumnType::Varchar)
            .map_err(|_| format!("invalid VARCHAR length '{}'", len))
    }
}

impl TryFrom<String> for ColumnType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ColumnType> for String {
    fn from(value: ColumnType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Int => write!(f, "INT"),
            ColumnType::Float => write!(f, "FLOAT"),
            ColumnType::Varchar(n) => write!(f, "VARCHAR({})", n),
            ColumnType::Text => write!(f, "TEXT"),
            ColumnType::Timestamp => write!(f, "TIMESTAMP"),
        }
    }
}

/// DEFAULT payload
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    CurrentTimestamp,
    Literal(Literal),
}

impl Serialize for DefaultValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DefaultValue::CurrentTimestamp => serializer.serialize_str("CURRENT_TIMESTAMP"),
            DefaultValue::Literal(lit) => lit.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for DefaultValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Literal::deserialize(deserializer)? {
            Literal::Text(s) if s.eq_ignore_ascii_case("CURRENT_TIMESTAMP") => {
                DefaultValue::CurrentTimestamp
            }
            other => DefaultValue::Literal(other),
        })
    }
}

/// Column constraint, in canonical form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Constraint {
    PrimaryKey,
    NotNull,
    Unique,
    AutoIncrement,
    Default(DefaultValue),
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::PrimaryKey => write!(f, "PRIMARY KEY"),
            Constraint::NotNull => write!(f, "NOT NULL"),
            Constraint::Unique => write!(f, "UNIQUE"),
            Constraint::AutoIncrement => write!(f, "AUTO_INCREMENT"),
            Constraint::Default(DefaultValue::CurrentTimestamp) => {
                write!(f, "DEFAULT CURRENT_TIMESTAMP")
            }
            Constraint::Default(DefaultValue::Literal(Literal::Text(s))) => {
                write!(f, "DEFAULT '{}'", s)
            }
            Constraint::Default(DefaultValue::Literal(lit)) => write!(f, "DEFAULT {}", lit),
        }
    }
}

/// ON DELETE / ON UPDATE action of a foreign key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    Restrict,
    NoAction,
}

impl FromStr for ReferentialAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .to_ascii_uppercase();
        match normalized.as_str() {
            "CASCADE" => Ok(ReferentialAction::Cascade),
            "SET_NULL" => Ok(ReferentialAction::SetNull),
            "RESTRICT" => Ok(ReferentialAction::Restrict),
            "NO_ACTION" => Ok(ReferentialAction::NoAction),
            _ => Err(format!("unknown referential action '{}'", s)),
        }
    }
}

/// Foreign key metadata (recorded, not enforced)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ReferentialAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<ReferentialAction>,
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub col_type: ColumnType,
    /// Constraints in declaration order
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, col_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            col_type,
            constraints: Vec::new(),
        }
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn is_primary_key(&self) -> bool {
        self.constraints.contains(&Constraint::PrimaryKey)
    }

    pub fn is_not_null(&self) -> bool {
        self.constraints.contains(&Constraint::NotNull)
    }

    pub fn is_unique(&self) -> bool {
        self.constraints.contains(&Constraint::Unique)
    }

    pub fn is_auto_increment(&self) -> bool {
        self.constraints.contains(&Constraint::AutoIncrement)
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::Default(d) => Some(d),
            _ => None,
        })
    }
}

/// Table schema definition (one catalog entry)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name
    pub name: String,
    /// Column definitions (ordered)
    pub columns: Vec<ColumnDef>,
    /// Primary key columns, in declaration order
    #[serde(default)]
    pub primary_keys: Vec<String>,
    /// Foreign key metadata
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
    /// Column name -> position mapping
    #[serde(skip)]
    column_map: HashMap<String, usize>,
}

impl TableSchema {
    /// Create a schema; the primary key set is derived from the column constraints.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>, foreign_keys: Vec<ForeignKey>) -> Self {
        let primary_keys = columns
            .iter()
            .filter(|c| c.is_primary_key())
            .map(|c| c.name.clone())
            .collect();

        let mut schema = Self {
            name: name.into(),
            columns,
            primary_keys,
            foreign_keys,
            column_map: HashMap::new(),
        };
        schema.rebuild_column_map();
        schema
    }

    /// Get column by name
    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.get_column_position(name).map(|i| &self.columns[i])
    }

    /// Get column position by name
    pub fn get_column_position(&self, name: &str) -> Option<usize> {
        self.column_map.get(name).copied()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// First column name that appears twice, if any
    pub fn duplicate_column(&self) -> Option<&str> {
        self.columns.iter().enumerate().find_map(|(i, col)| {
            self.columns[..i]
                .iter()
                .any(|prev| prev.name == col.name)
                .then_some(col.name.as_str())
        })
    }

    /// Rebuild column map (call after deserialization)
    pub fn rebuild_column_map(&mut self) {
        self.column_map.clear();
        for (i, col) in self.columns.iter().enumerate() {
            self.column_map.entry(col.name.clone()).or_insert(i);
        }
    }
}

// column_map is derived state
impl PartialEq for TableSchema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.columns == other.columns
            && self.primary_keys == other.primary_keys
            && self.foreign_keys == other.foreign_keys
    }
}
