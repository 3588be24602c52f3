/// SELECT pipeline over a loaded row set
use crate::error::{DbError, Result};
use crate::sql::ast::{Projection, SelectStmt, SortOrder};
use crate::sql::evaluator::RowEvaluator;
use crate::sql::scanner::contains_keyword;
use crate::types::{Row, TableSchema, Value};
use std::cmp::Ordering;

/// The single table a SELECT reads from. Joins are refused here rather
/// than at parse time.
pub fn target_table(stmt: &SelectStmt) -> Result<&str> {
    if contains_keyword(&stmt.from, "JOIN") {
        return Err(DbError::Unsupported("joins not supported".into()));
    }
    Ok(stmt.from.trim())
}

/// Run WHERE, GROUP BY/HAVING, projection, DISTINCT, ORDER BY and LIMIT,
/// in that order. Returns the output column names and rows.
pub fn execute_select(schema: &TableSchema, rows: Vec<Row>, stmt: &SelectStmt) -> Result<(Vec<String>, Vec<Row>)> {
    let all_columns = schema.column_names();
    let mut evaluator = RowEvaluator::new(&all_columns);

    // output column names and their schema positions
    let (columns, positions) = match &stmt.columns {
        Projection::Star => (all_columns.clone(), (0..all_columns.len()).collect::<Vec<_>>()),
        Projection::Columns(names) => {
            let positions = names
                .iter()
                .map(|name| column_position(schema, name))
                .collect::<Result<Vec<_>>>()?;
            (names.clone(), positions)
        }
    };

    let group_positions = match &stmt.group_by {
        Some(keys) => Some(
            keys.iter()
                .map(|k| column_position(schema, k))
                .collect::<Result<Vec<_>>>()?,
        ),
        None => None,
    };
    let order_keys = match &stmt.order_by {
        Some(items) => items
            .iter()
            .map(|item| Ok((column_position(schema, &item.column)?, item.direction)))
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    if let Some(predicate) = &stmt.where_clause {
        evaluator.validate(&predicate.expr)?;
    }
    if let Some(predicate) = &stmt.having {
        evaluator.validate(&predicate.expr)?;
    }

    // 1. WHERE
    let mut source = Vec::with_capacity(rows.len());
    for row in rows {
        let keep = match &stmt.where_clause {
            Some(predicate) => evaluator.matches(&predicate.expr, &row)?,
            None => true,
        };
        if keep {
            source.push(row);
        }
    }

    // 2. GROUP BY keeps the first row per key, then HAVING.
    // Full rows ride along so grouping, HAVING and ORDER BY may use
    // columns that are not projected.
    if let Some(group_positions) = &group_positions {
        let mut seen: Vec<Vec<Value>> = Vec::new();
        let mut grouped = Vec::new();
        for row in source {
            let key: Vec<Value> = group_positions.iter().map(|&p| row[p].clone()).collect();
            if seen.iter().any(|k| same_row(k, &key)) {
                continue;
            }
            seen.push(key);
            grouped.push(row);
        }
        source = grouped;

        if let Some(predicate) = &stmt.having {
            let mut kept = Vec::with_capacity(source.len());
            for row in source {
                if evaluator.matches(&predicate.expr, &row)? {
                    kept.push(row);
                }
            }
            source = kept;
        }
    }

    // 3. projection
    let mut projected: Vec<(Row, Row)> = source
        .into_iter()
        .map(|row| {
            let out = positions.iter().map(|&p| row[p].clone()).collect();
            (row, out)
        })
        .collect();

    // 4. DISTINCT over the projected values
    if stmt.distinct {
        let mut unique: Vec<(Row, Row)> = Vec::with_capacity(projected.len());
        for entry in projected {
            if !unique.iter().any(|(_, out)| same_row(out, &entry.1)) {
                unique.push(entry);
            }
        }
        projected = unique;
    }

    // 5. ORDER BY, stable
    if !order_keys.is_empty() {
        projected.sort_by(|(a, _), (b, _)| {
            for &(pos, direction) in &order_keys {
                let ord = a[pos].sort_cmp(&b[pos]);
                let ord = match direction {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
    }

    // 6. LIMIT / OFFSET
    let out_rows: Vec<Row> = match stmt.limit {
        Some(limit) => projected
            .into_iter()
            .skip(limit.offset)
            .take(limit.count)
            .map(|(_, out)| out)
            .collect(),
        None => projected.into_iter().map(|(_, out)| out).collect(),
    };

    Ok((columns, out_rows))
}

/// Schema position of a possibly table-qualified column name
fn column_position(schema: &TableSchema, name: &str) -> Result<usize> {
    schema
        .get_column_position(name)
        .or_else(|| match name.split_once('.') {
            Some((table, column)) if table == schema.name => schema.get_column_position(column),
            _ => None,
        })
        .ok_or_else(|| DbError::ColumnNotFound(name.to_string()))
}

/// Row equality for grouping and DISTINCT: NULLs are equal to each other.
fn same_row(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(x, y)| match (x, y) {
            (Value::Null, Value::Null) => true,
            _ => x.sql_eq(y),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::ast::Command;
    use crate::sql::parse;
    use crate::types::{ColumnDef, ColumnType};

    fn schema() -> TableSchema {
        TableSchema::new(
            "people",
            vec![
                ColumnDef::new("id", ColumnType::Int),
                ColumnDef::new("name", ColumnType::Text),
                ColumnDef::new("city", ColumnType::Text),
                ColumnDef::new("age", ColumnType::Int),
            ],
            vec![],
        )
    }

    fn data() -> Vec<Row> {
        let person = |id: i64, name: &str, city: &str, age: Option<i64>| {
            vec![
                Value::Integer(id),
                Value::Text(name.into()),
                Value::Text(city.into()),
                age.map(Value::Integer).unwrap_or(Value::Null),
            ]
        };
        vec![
            person(1, "ann", "paris", Some(30)),
            person(2, "bob", "lyon", Some(25)),
            person(3, "cid", "paris", Some(30)),
            person(4, "dee", "nice", None),
            person(5, "eve", "lyon", Some(41)),
        ]
    }

    fn run(sql: &str) -> Result<(Vec<String>, Vec<Row>)> {
        match parse(sql)? {
            Command::Select(stmt) => {
                target_table(&stmt)?;
                execute_select(&schema(), data(), &stmt)
            }
            other => panic!("expected SELECT, got {:?}", other),
        }
    }

    fn ids(rows: &[Row]) -> Vec<i64> {
        rows.iter().map(|r| r[0].as_i64().unwrap()).collect()
    }

    #[test]
    fn test_where_and_projection() {
        let (columns, rows) = run("SELECT name, id FROM people WHERE age >= 30").unwrap();
        assert_eq!(columns, vec!["name", "id"]);
        assert_eq!(
            rows,
            vec![
                vec![Value::Text("ann".into()), Value::Integer(1)],
                vec![Value::Text("cid".into()), Value::Integer(3)],
                vec![Value::Text("eve".into()), Value::Integer(5)],
            ]
        );
    }

    #[test]
    fn test_order_by_is_stable() {
        let (_, rows) = run("SELECT * FROM people ORDER BY age DESC").unwrap();
        // ties (ann, cid) keep their original order; NULL sorts last descending
        assert_eq!(ids(&rows), vec![5, 1, 3, 2, 4]);

        let (_, rows) = run("SELECT * FROM people ORDER BY city, age DESC").unwrap();
        assert_eq!(ids(&rows), vec![5, 2, 4, 1, 3]);
    }

    #[test]
    fn test_distinct() {
        let (_, rows) = run("SELECT DISTINCT city FROM people").unwrap();
        assert_eq!(rows.len(), 3);
        for (i, a) in rows.iter().enumerate() {
            for b in &rows[i + 1..] {
                assert!(!same_row(a, b));
            }
        }
    }

    #[test]
    fn test_group_by_keeps_first_row_then_having() {
        let (_, rows) = run("SELECT id, city FROM people GROUP BY city").unwrap();
        assert_eq!(ids(&rows), vec![1, 2, 4]);

        let (_, rows) = run("SELECT id, city FROM people GROUP BY city HAVING age > 26").unwrap();
        assert_eq!(ids(&rows), vec![1]);
    }

    #[test]
    fn test_limit_and_offset() {
        let (_, rows) = run("SELECT * FROM people LIMIT 2").unwrap();
        assert_eq!(ids(&rows), vec![1, 2]);

        let (_, rows) = run("SELECT * FROM people LIMIT 3, 10").unwrap();
        assert_eq!(ids(&rows), vec![4, 5]);

        let (_, rows) = run("SELECT * FROM people LIMIT 9, 1").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_qualified_column() {
        let (columns, rows) = run("SELECT people.name FROM people WHERE people.id = 2").unwrap();
        assert_eq!(columns, vec!["people.name"]);
        assert_eq!(rows, vec![vec![Value::Text("bob".into())]]);
    }

    #[test]
    fn test_errors() {
        assert_eq!(run("SELECT * FROM people JOIN x ON a = b").unwrap_err().code(), "unsupported");
        assert_eq!(run("SELECT salary FROM people").unwrap_err().code(), "column_not_found");
        assert_eq!(
            run("SELECT * FROM people ORDER BY salary").unwrap_err().code(),
            "column_not_found"
        );
        assert_eq!(
            run("SELECT * FROM people WHERE salary > 1").unwrap_err().code(),
            "column_not_found"
        );
    }
}
