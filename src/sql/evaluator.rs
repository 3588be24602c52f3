/// Predicate evaluation against stored rows
use super::ast::{BinaryOperator, Expr};
use crate::error::{DbError, Result};
use crate::types::{Row, Value};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Compiled LIKE pattern
#[derive(Debug, Clone)]
enum CompiledPattern {
    /// Exact match: "abc" (no wildcards)
    Exact(String),
    /// Prefix match: "abc%"
    Prefix(String),
    /// Suffix match: "%abc"
    Suffix(String),
    /// Contains match: "%abc%"
    Contains(String),
    /// Anything else
    Complex(Vec<PatternSegment>),
}

#[derive(Debug, Clone)]
enum PatternSegment {
    Literal(Vec<char>),
    AnyChar,  // _
    AnyChars, // %
}

impl CompiledPattern {
    fn compile(pattern: &str) -> Self {
        let body = |p: &str| !p.contains('%') && !p.contains('_');

        if body(pattern) {
            return CompiledPattern::Exact(pattern.to_string());
        }
        if let Some(prefix) = pattern.strip_suffix('%') {
            if body(prefix) {
                return CompiledPattern::Prefix(prefix.to_string());
            }
        }
        if let Some(suffix) = pattern.strip_prefix('%') {
            if body(suffix) {
                return CompiledPattern::Suffix(suffix.to_string());
            }
        }
        if let Some(inner) = pattern.strip_prefix('%').and_then(|p| p.strip_suffix('%')) {
            if !inner.is_empty() && body(inner) {
                return CompiledPattern::Contains(inner.to_string());
            }
        }

        let mut segments = Vec::new();
        let mut literal = Vec::new();
        for ch in pattern.chars() {
            match ch {
                '%' | '_' => {
                    if !literal.is_empty() {
                        segments.push(PatternSegment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(if ch == '%' {
                        PatternSegment::AnyChars
                    } else {
                        PatternSegment::AnyChar
                    });
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(PatternSegment::Literal(literal));
        }
        CompiledPattern::Complex(segments)
    }

    fn matches(&self, text: &str) -> bool {
        match self {
            CompiledPattern::Exact(p) => text == p,
            CompiledPattern::Prefix(p) => text.starts_with(p.as_str()),
            CompiledPattern::Suffix(p) => text.ends_with(p.as_str()),
            CompiledPattern::Contains(p) => text.contains(p.as_str()),
            CompiledPattern::Complex(segments) => {
                let chars: Vec<char> = text.chars().collect();
                Self::match_segments(&chars, segments)
            }
        }
    }

    fn match_segments(text: &[char], segments: &[PatternSegment]) -> bool {
        let Some((first, rest)) = segments.split_first() else {
            return text.is_empty();
        };
        match first {
            PatternSegment::AnyChars => {
                (0..=text.len()).any(|skip| Self::match_segments(&text[skip..], rest))
            }
            PatternSegment::AnyChar => !text.is_empty() && Self::match_segments(&text[1..], rest),
            PatternSegment::Literal(lit) => {
                text.starts_with(lit) && Self::match_segments(&text[lit.len()..], rest)
            }
        }
    }
}

/// Evaluates predicates over rows laid out as `columns`.
///
/// Comparisons follow three-valued logic: anything compared with NULL is
/// unknown, and only rows whose predicate is definitely true match.
pub struct RowEvaluator<'a> {
    columns: &'a [String],
    pattern_cache: HashMap<String, CompiledPattern>,
}

impl<'a> RowEvaluator<'a> {
    pub fn new(columns: &'a [String]) -> Self {
        Self {
            columns,
            pattern_cache: HashMap::new(),
        }
    }

    /// Position of a column reference. `t.col` falls back to `col`.
    fn position(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .or_else(|| {
                let (_, bare) = name.rsplit_once('.')?;
                self.columns.iter().position(|c| c == bare)
            })
    }

    /// Check that every column the expression names exists.
    pub fn validate(&self, expr: &Expr) -> Result<()> {
        for name in expr.referenced_columns() {
            if self.position(name).is_none() {
                return Err(DbError::ColumnNotFound(name.to_string()));
            }
        }
        Ok(())
    }

    pub fn matches(&mut self, expr: &Expr, row: &Row) -> Result<bool> {
        Ok(self.eval_bool(expr, row)? == Some(true))
    }

    fn eval_bool(&mut self, expr: &Expr, row: &Row) -> Result<Option<bool>> {
        match expr {
            Expr::Bool(b) => Ok(Some(*b)),
            Expr::Not(inner) => Ok(self.eval_bool(inner, row)?.map(|b| !b)),
            Expr::BinaryOp { left, op: BinaryOperator::And, right } => {
                let l = self.eval_bool(left, row)?;
                if l == Some(false) {
                    return Ok(Some(false));
                }
                let r = self.eval_bool(right, row)?;
                Ok(match (l, r) {
                    (_, Some(false)) => Some(false),
                    (Some(true), Some(true)) => Some(true),
                    _ => None,
                })
            }
            Expr::BinaryOp { left, op: BinaryOperator::Or, right } => {
                let l = self.eval_bool(left, row)?;
                if l == Some(true) {
                    return Ok(Some(true));
                }
                let r = self.eval_bool(right, row)?;
                Ok(match (l, r) {
                    (_, Some(true)) => Some(true),
                    (Some(false), Some(false)) => Some(false),
                    _ => None,
                })
            }
            Expr::BinaryOp { left, op, right } => {
                let l = self.eval_value(left, row)?;
                let r = self.eval_value(right, row)?;
                Ok(compare(&l, *op, &r))
            }
            Expr::IsNull { expr, negated } => {
                let v = self.eval_value(expr, row)?;
                Ok(Some(v.is_null() != *negated))
            }
            Expr::Like { expr, pattern, negated } => {
                let v = self.eval_value(expr, row)?;
                let p = self.eval_value(pattern, row)?;
                if v.is_null() || p.is_null() {
                    return Ok(None);
                }
                let pattern = p.to_string();
                let compiled = self
                    .pattern_cache
                    .entry(pattern.clone())
                    .or_insert_with(|| CompiledPattern::compile(&pattern));
                Ok(Some(compiled.matches(&v.to_string()) != *negated))
            }
            // A bare column or literal used as a condition
            Expr::Column(_) | Expr::Literal(_) => {
                let v = self.eval_value(expr, row)?;
                Ok(truthiness(&v))
            }
        }
    }

    fn eval_value(&mut self, expr: &Expr, row: &Row) -> Result<Value> {
        match expr {
            Expr::Column(name) => {
                let pos = self
                    .position(name)
                    .ok_or_else(|| DbError::ColumnNotFound(name.clone()))?;
                Ok(row.get(pos).cloned().unwrap_or(Value::Null))
            }
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Bool(b) => Ok(Value::Integer(i64::from(*b))),
            other => Ok(match self.eval_bool(other, row)? {
                Some(b) => Value::Integer(i64::from(b)),
                None => Value::Null,
            }),
        }
    }
}

/// Compare two values. Text compared with a number is coerced when it
/// parses as one; otherwise the comparison is unknown.
fn compare(left: &Value, op: BinaryOperator, right: &Value) -> Option<bool> {
    if left.is_null() || right.is_null() {
        return None;
    }
    let ordering = left.sql_cmp(right).or_else(|| {
        let coerce = |v: &Value| match v {
            Value::Text(s) => s.trim().parse::<f64>().ok().map(Value::Float),
            other => Some(other.clone()),
        };
        coerce(left)?.sql_cmp(&coerce(right)?)
    })?;

    Some(match op {
        BinaryOperator::Eq => ordering == Ordering::Equal,
        BinaryOperator::Ne => ordering != Ordering::Equal,
        BinaryOperator::Lt => ordering == Ordering::Less,
        BinaryOperator::Gt => ordering == Ordering::Greater,
        BinaryOperator::Le => ordering != Ordering::Greater,
        BinaryOperator::Ge => ordering != Ordering::Less,
        BinaryOperator::And | BinaryOperator::Or => return None,
    })
}

fn truthiness(value: &Value) -> Option<bool> {
    match value {
        Value::Null => None,
        Value::Integer(i) => Some(*i != 0),
        Value::Float(f) => Some(*f != 0.0),
        Value::Text(s) => Some(!s.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::predicate::parse_predicate;

    fn columns() -> Vec<String> {
        vec!["id".into(), "name".into(), "score".into()]
    }

    fn eval(condition: &str, row: Row) -> bool {
        let cols = columns();
        let mut evaluator = RowEvaluator::new(&cols);
        let predicate = parse_predicate(condition).unwrap();
        evaluator.matches(&predicate.expr, &row).unwrap()
    }

    fn row(id: i64, name: &str, score: Value) -> Row {
        vec![Value::Integer(id), Value::Text(name.into()), score]
    }

    #[test]
    fn test_comparisons() {
        let r = row(3, "alice", Value::Float(9.5));
        assert!(eval("id = 3", r.clone()));
        assert!(eval("id >= 3 AND score < 10", r.clone()));
        assert!(eval("id <> 4", r.clone()));
        assert!(eval("name = 'alice'", r.clone()));
        assert!(!eval("name > 'bob'", r.clone()));
        assert!(eval("id = '3'", r));
    }

    #[test]
    fn test_null_semantics() {
        let r = row(1, "bob", Value::Null);
        assert!(!eval("score = 1", r.clone()));
        assert!(!eval("score <> 1", r.clone()));
        assert!(!eval("NOT score = 1", r.clone()));
        assert!(eval("score IS NULL", r.clone()));
        assert!(!eval("score IS NOT NULL", r.clone()));
        assert!(eval("score = 1 OR id = 1", r));
    }

    #[test]
    fn test_like() {
        let r = row(1, "alice", Value::Null);
        assert!(eval("name LIKE 'al%'", r.clone()));
        assert!(eval("name LIKE '%ice'", r.clone()));
        assert!(eval("name LIKE '%lic%'", r.clone()));
        assert!(eval("name LIKE 'a_i%e'", r.clone()));
        assert!(!eval("name LIKE 'a_c%'", r.clone()));
        assert!(eval("name NOT LIKE 'b%'", r));
    }

    #[test]
    fn test_unknown_column() {
        let cols = columns();
        let evaluator = RowEvaluator::new(&cols);
        let predicate = parse_predicate("age > 3").unwrap();
        let err = evaluator.validate(&predicate.expr).unwrap_err();
        assert_eq!(err.code(), "column_not_found");
    }

    #[test]
    fn test_qualified_column() {
        assert!(eval("t.id = 2", row(2, "x", Value::Null)));
    }
}
