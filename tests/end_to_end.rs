//! Whole-statement scenarios driven through `execute_sql`

use minisql::types::{ColumnDef, ColumnType, Constraint, DefaultValue, Value};
use minisql::{
    execute_sql, EngineConfig, Literal, MemorySessionStore, QueryExecutor, QueryResult, Result,
};
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn executor(root: &Path) -> QueryExecutor {
    QueryExecutor::with_session(
        EngineConfig::for_testing(root),
        Box::new(MemorySessionStore::new()),
    )
}

/// Fresh root with database `db` selected
fn setup() -> (TempDir, QueryExecutor) {
    let dir = tempdir().unwrap();
    let exec = executor(dir.path());
    execute_sql(&exec, "CREATE DATABASE db").unwrap();
    execute_sql(&exec, "USE db").unwrap();
    (dir, exec)
}

fn run(exec: &QueryExecutor, sql: &str) -> Result<QueryResult> {
    execute_sql(exec, sql)
}

fn select(exec: &QueryExecutor, sql: &str) -> Vec<Vec<Value>> {
    match run(exec, sql).unwrap() {
        QueryResult::Select { rows, .. } => rows,
        other => panic!("expected rows, got {:?}", other),
    }
}

fn int(i: i64) -> Value {
    Value::Integer(i)
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

#[test]
fn test_primary_key_set_follows_declaration_order() {
    let (_dir, exec) = setup();
    run(
        &exec,
        "CREATE TABLE enroll (course VARCHAR(10) PRIMARY KEY, note TEXT, student INT PRIMARY KEY)",
    )
    .unwrap();
    run(&exec, "CREATE TABLE pairs (a INT, b INT, PRIMARY KEY (b, a))").unwrap();

    match run(&exec, "DESCRIBE").unwrap() {
        QueryResult::Described { schemas } => {
            assert_eq!(schemas.len(), 2);
            assert_eq!(schemas[0].primary_keys, vec!["course", "student"]);
            // table-level key still lists columns as declared
            assert_eq!(schemas[1].primary_keys, vec!["a", "b"]);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_create_database_suffix_and_if_not_exists() {
    let dir = tempdir().unwrap();
    let exec = executor(dir.path());

    let names: Vec<String> = (0..3)
        .map(|_| match run(&exec, "CREATE DATABASE shop").unwrap() {
            QueryResult::DatabaseCreated { name, created, .. } => {
                assert!(created);
                name
            }
            other => panic!("unexpected {:?}", other),
        })
        .collect();
    assert_eq!(names, vec!["shop", "shop_1", "shop_2"]);

    match run(&exec, "CREATE DATABASE IF NOT EXISTS shop").unwrap() {
        QueryResult::DatabaseCreated { name, created, .. } => {
            assert_eq!(name, "shop");
            assert!(!created);
        }
        other => panic!("unexpected {:?}", other),
    }

    assert_eq!(
        run(&exec, "SHOW DATABASES").unwrap(),
        QueryResult::Databases {
            names: vec!["shop".into(), "shop_1".into(), "shop_2".into()]
        }
    );
}

#[test]
fn test_composite_primary_key() {
    let (_dir, exec) = setup();
    run(&exec, "CREATE TABLE grades (student INT PRIMARY KEY, course INT PRIMARY KEY, mark FLOAT)").unwrap();

    run(&exec, "INSERT INTO grades VALUES (1, 10, 3.5)").unwrap();
    run(&exec, "INSERT INTO grades VALUES (1, 11, 2.0)").unwrap();
    run(&exec, "INSERT INTO grades VALUES (2, 10, 4.0)").unwrap();

    let err = run(&exec, "INSERT INTO grades VALUES (1, 10, 1.0)").unwrap_err();
    assert_eq!(err.code(), "primary_key_violation");

    let err = run(&exec, "INSERT INTO grades (course, mark) VALUES (12, 1.0)").unwrap_err();
    assert_eq!(err.code(), "primary_key_null");

    assert_eq!(select(&exec, "SELECT * FROM grades").len(), 3);
}

#[test]
fn test_auto_increment_sequence_restarts_after_delete_all() {
    let (_dir, exec) = setup();
    run(&exec, "CREATE TABLE t (id INT PRIMARY KEY AUTO_INCREMENT, name TEXT)").unwrap();

    for name in ["a", "b", "c", "d"] {
        run(&exec, &format!("INSERT INTO t (name) VALUES ('{}')", name)).unwrap();
    }
    assert_eq!(
        select(&exec, "SELECT id FROM t"),
        vec![vec![int(1)], vec![int(2)], vec![int(3)], vec![int(4)]]
    );

    // next value is max + 1, not a counter
    run(&exec, "DELETE FROM t WHERE id > 2").unwrap();
    run(&exec, "INSERT INTO t (name) VALUES ('e')").unwrap();
    assert_eq!(select(&exec, "SELECT id FROM t WHERE name = 'e'"), vec![vec![int(3)]]);

    assert_eq!(run(&exec, "DELETE FROM t").unwrap().affected_rows(), 3);
    match run(&exec, "INSERT INTO t (name) VALUES ('f')").unwrap() {
        QueryResult::Inserted { columns, row } => {
            assert_eq!(columns, vec!["id", "name"]);
            assert_eq!(row, vec![int(1), text("f")]);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_varchar_boundary() {
    let (_dir, exec) = setup();
    run(&exec, "CREATE TABLE v (s VARCHAR(3))").unwrap();

    run(&exec, "INSERT INTO v VALUES ('abc')").unwrap();
    let err = run(&exec, "INSERT INTO v VALUES ('abcd')").unwrap_err();
    assert_eq!(err.code(), "varchar_length_exceeded");

    assert_eq!(select(&exec, "SELECT s FROM v"), vec![vec![text("abc")]]);
}

#[test]
fn test_distinct_and_stable_descending_order() {
    let (_dir, exec) = setup();
    run(&exec, "CREATE TABLE scores (id INT PRIMARY KEY, team TEXT, points INT)").unwrap();
    for (id, team, points) in [(1, "red", 5), (2, "blue", 7), (3, "red", 7), (4, "green", 5), (5, "blue", 9)] {
        run(
            &exec,
            &format!("INSERT INTO scores VALUES ({}, '{}', {})", id, team, points),
        )
        .unwrap();
    }

    let teams = select(&exec, "SELECT DISTINCT team FROM scores");
    assert_eq!(teams, vec![vec![text("red")], vec![text("blue")], vec![text("green")]]);

    // ties keep insertion order
    let ordered = select(&exec, "SELECT id, points FROM scores ORDER BY points DESC");
    assert_eq!(
        ordered,
        vec![
            vec![int(5), int(9)],
            vec![int(2), int(7)],
            vec![int(3), int(7)],
            vec![int(1), int(5)],
            vec![int(4), int(5)],
        ]
    );

    let limited = select(&exec, "SELECT id FROM scores ORDER BY points DESC LIMIT 1, 2");
    assert_eq!(limited, vec![vec![int(2)], vec![int(3)]]);
}

#[test]
fn test_delete_without_where_empties_table() {
    let (_dir, exec) = setup();
    run(&exec, "CREATE TABLE d (x INT)").unwrap();
    for i in 0..4 {
        run(&exec, &format!("INSERT INTO d VALUES ({})", i)).unwrap();
    }

    assert_eq!(
        run(&exec, "DELETE FROM d").unwrap(),
        QueryResult::Modification { affected_rows: 4 }
    );
    assert!(select(&exec, "SELECT * FROM d").is_empty());
}

#[test]
fn test_rejected_insert_leaves_table_untouched() {
    let (_dir, exec) = setup();
    run(&exec, "CREATE TABLE t(id INT PRIMARY KEY AUTO_INCREMENT, name VARCHAR(5))").unwrap();
    run(&exec, "INSERT INTO t (name) VALUES ('ab')").unwrap();

    let err = run(&exec, "INSERT INTO t (name) VALUES ('toolong')").unwrap_err();
    assert_eq!(err.code(), "varchar_length_exceeded");

    match run(&exec, "SELECT * FROM t").unwrap() {
        QueryResult::Select { columns, rows } => {
            assert_eq!(columns, vec!["id", "name"]);
            assert_eq!(rows, vec![vec![int(1), text("ab")]]);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_describe_round_trip() {
    let (_dir, exec) = setup();
    run(
        &exec,
        "CREATE TABLE people (id INT PRIMARY KEY AUTO_INCREMENT, email VARCHAR(40) NOT NULL UNIQUE, \
         age INT DEFAULT 18, joined TIMESTAMP DEFAULT CURRENT_TIMESTAMP, bio TEXT)",
    )
    .unwrap();

    let expected = vec![
        ColumnDef::new("id", ColumnType::Int)
            .with_constraint(Constraint::PrimaryKey)
            .with_constraint(Constraint::AutoIncrement),
        ColumnDef::new("email", ColumnType::Varchar(40))
            .with_constraint(Constraint::NotNull)
            .with_constraint(Constraint::Unique),
        ColumnDef::new("age", ColumnType::Int)
            .with_constraint(Constraint::Default(DefaultValue::Literal(Literal::Integer(18)))),
        ColumnDef::new("joined", ColumnType::Timestamp)
            .with_constraint(Constraint::Default(DefaultValue::CurrentTimestamp)),
        ColumnDef::new("bio", ColumnType::Text),
    ];

    // a second executor reads the catalog back from disk
    let reopened = executor(exec.config().storage_root.as_path());
    run(&reopened, "USE db").unwrap();
    for exec in [&exec, &reopened] {
        match run(exec, "DESCRIBE people").unwrap() {
            QueryResult::Described { schemas } => {
                assert_eq!(schemas.len(), 1);
                assert_eq!(schemas[0].name, "people");
                assert_eq!(schemas[0].columns, expected);
                assert_eq!(schemas[0].primary_keys, vec!["id"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}

#[test]
fn test_defaults_and_constraints_on_insert() {
    let (_dir, exec) = setup();
    run(
        &exec,
        "CREATE TABLE users (id INT PRIMARY KEY AUTO_INCREMENT, email VARCHAR(20) NOT NULL UNIQUE, \
         age INT DEFAULT 18, joined TIMESTAMP DEFAULT CURRENT_TIMESTAMP)",
    )
    .unwrap();

    match run(&exec, "INSERT INTO users (email) VALUES ('a@x')").unwrap() {
        QueryResult::Inserted { row, .. } => {
            assert_eq!(row[0], int(1));
            assert_eq!(row[2], int(18));
            // "YYYY-MM-DD HH:MM:SS"
            let joined = row[3].as_str().unwrap();
            assert_eq!(joined.len(), 19);
            assert_eq!(&joined[4..5], "-");
            assert_eq!(&joined[13..14], ":");
        }
        other => panic!("unexpected {:?}", other),
    }

    assert_eq!(
        run(&exec, "INSERT INTO users (email) VALUES ('a@x')").unwrap_err().code(),
        "unique_violation"
    );
    assert_eq!(
        run(&exec, "INSERT INTO users (age) VALUES (30)").unwrap_err().code(),
        "not_null_violation"
    );
    assert_eq!(
        run(&exec, "INSERT INTO users (email, age) VALUES ('b@x', 'old')").unwrap_err().code(),
        "type_error"
    );
    assert_eq!(
        run(&exec, "INSERT INTO users (email, nope) VALUES ('b@x', 1)").unwrap_err().code(),
        "column_not_found"
    );
    assert_eq!(
        run(&exec, "INSERT INTO users (email, age) VALUES ('b@x')").unwrap_err().code(),
        "columns_values_mismatch"
    );
    assert_eq!(select(&exec, "SELECT * FROM users").len(), 1);
}

#[test]
fn test_update_checks_constraints_atomically() {
    let (_dir, exec) = setup();
    run(&exec, "CREATE TABLE items (id INT PRIMARY KEY, code VARCHAR(4) UNIQUE, qty INT)").unwrap();
    run(&exec, "INSERT INTO items VALUES (1, 'a', 5)").unwrap();
    run(&exec, "INSERT INTO items VALUES (2, 'b', 0)").unwrap();
    run(&exec, "INSERT INTO items VALUES (3, 'c', 8)").unwrap();

    assert_eq!(
        run(&exec, "UPDATE items SET qty = 10 WHERE qty > 4").unwrap(),
        QueryResult::Modification { affected_rows: 2 }
    );
    // assigning a row its own unique value is fine
    assert_eq!(
        run(&exec, "UPDATE items SET code = 'a' WHERE id = 1").unwrap().affected_rows(),
        1
    );

    assert_eq!(
        run(&exec, "UPDATE items SET code = 'z'").unwrap_err().code(),
        "unique_violation"
    );
    assert_eq!(
        run(&exec, "UPDATE items SET id = 1 WHERE id = 2").unwrap_err().code(),
        "primary_key_violation"
    );
    assert_eq!(
        run(&exec, "UPDATE items SET code = 'abcde' WHERE id = 3").unwrap_err().code(),
        "varchar_length_exceeded"
    );

    // failed updates changed nothing
    assert_eq!(
        select(&exec, "SELECT id, code, qty FROM items"),
        vec![
            vec![int(1), text("a"), int(10)],
            vec![int(2), text("b"), int(0)],
            vec![int(3), text("c"), int(10)],
        ]
    );
    assert_eq!(
        run(&exec, "UPDATE items SET qty = 0 WHERE id = 99").unwrap().affected_rows(),
        0
    );
}

#[test]
fn test_where_group_by_having() {
    let (_dir, exec) = setup();
    run(&exec, "CREATE TABLE sales (id INT PRIMARY KEY, region TEXT, amount FLOAT, note TEXT)").unwrap();
    let rows = [
        "(1, 'north', 10.5, 'x')",
        "(2, 'south', 3, NULL)",
        "(3, 'north', 7.25, 'rush order')",
        "(4, 'east', 12, NULL)",
        "(5, 'south', 20, 'rush')",
    ];
    for values in rows {
        run(&exec, &format!("INSERT INTO sales VALUES {}", values)).unwrap();
    }

    assert_eq!(
        select(&exec, "SELECT id FROM sales WHERE amount >= 10 AND NOT region = 'east'"),
        vec![vec![int(1)], vec![int(5)]]
    );
    assert_eq!(
        select(&exec, "SELECT id FROM sales WHERE note IS NULL OR note LIKE 'rush%'"),
        vec![vec![int(2)], vec![int(3)], vec![int(4)], vec![int(5)]]
    );
    // NULL never satisfies a comparison
    assert_eq!(select(&exec, "SELECT id FROM sales WHERE note != 'x'").len(), 2);

    // one row per group, the first seen
    assert_eq!(
        select(&exec, "SELECT region, id FROM sales GROUP BY region"),
        vec![
            vec![text("north"), int(1)],
            vec![text("south"), int(2)],
            vec![text("east"), int(4)],
        ]
    );
    assert_eq!(
        select(&exec, "SELECT region FROM sales GROUP BY region HAVING amount > 5"),
        vec![vec![text("north")], vec![text("east")]]
    );

    assert_eq!(
        run(&exec, "SELECT id FROM sales WHERE bogus = 1").unwrap_err().code(),
        "column_not_found"
    );
    assert_eq!(
        run(&exec, "SELECT * FROM sales JOIN other ON sales.id = other.id").unwrap_err().code(),
        "unsupported"
    );
}

#[test]
fn test_table_lifecycle() {
    let (_dir, exec) = setup();
    run(&exec, "CREATE TABLE a (x INT)").unwrap();
    run(&exec, "CREATE TABLE b (y INT)").unwrap();

    assert_eq!(
        run(&exec, "CREATE TABLE a (z INT)").unwrap_err().code(),
        "table_exists"
    );
    assert_eq!(
        run(&exec, "CREATE TABLE c (x INT, x TEXT)").unwrap_err().code(),
        "duplicate_column"
    );
    assert_eq!(
        run(&exec, "SHOW TABLES").unwrap(),
        QueryResult::Tables {
            database: "db".into(),
            names: vec!["a".into(), "b".into()]
        }
    );

    run(&exec, "DROP TABLE a").unwrap();
    assert_eq!(run(&exec, "SELECT * FROM a").unwrap_err().code(), "table_not_found");
    assert_eq!(run(&exec, "DROP TABLE a").unwrap_err().code(), "table_not_found");
    assert_eq!(
        run(&exec, "DROP TABLE IF EXISTS a").unwrap(),
        QueryResult::TableDropped { table: "a".into(), dropped: false, skipped: true }
    );
}

#[test]
fn test_file_session_survives_restart() {
    let dir = tempdir().unwrap();
    let config = EngineConfig::for_testing(dir.path());

    let first = QueryExecutor::new(config.clone());
    run(&first, "CREATE DATABASE shop").unwrap();
    run(&first, "USE shop").unwrap();
    run(&first, "CREATE TABLE t (id INT)").unwrap();
    run(&first, "INSERT INTO t VALUES (7)").unwrap();
    drop(first);

    let second = QueryExecutor::new(config);
    assert_eq!(second.current_database().unwrap().as_deref(), Some("shop"));
    assert_eq!(select(&second, "SELECT * FROM t"), vec![vec![int(7)]]);
}

#[test]
fn test_parse_errors_are_reported() {
    let dir = tempdir().unwrap();
    let exec = executor(dir.path());
    for sql in ["FROB things", "SELECT FROM", "INSERT INTO t VALUES (1", ""] {
        let err = run(&exec, sql).unwrap_err();
        assert_eq!(err.code(), "syntax_error", "statement {:?}", sql);
        assert_eq!(err.kind().as_str(), "ParseError");
    }
}

#[test]
fn test_malformed_values_store_nothing() {
    let (_dir, exec) = setup();
    run(&exec, "CREATE TABLE t (name TEXT, age INT)").unwrap();
    run(&exec, "INSERT INTO t VALUES ('ann', 1)").unwrap();

    for sql in [
        "UPDATE t SET name = bob age = 3",
        "INSERT INTO t VALUES (hello world, 2)",
        "INSERT INTO t (name) VALUES ('x'),('y')",
    ] {
        assert_eq!(run(&exec, sql).unwrap_err().code(), "syntax_error", "statement {:?}", sql);
    }
    assert_eq!(select(&exec, "SELECT * FROM t"), vec![vec![text("ann"), int(1)]]);
}

#[test]
fn test_qualified_group_and_order_columns() {
    let (_dir, exec) = setup();
    run(&exec, "CREATE TABLE people (name TEXT, age INT)").unwrap();
    for sql in [
        "INSERT INTO people VALUES ('bo', 30)",
        "INSERT INTO people VALUES ('al', 30)",
        "INSERT INTO people VALUES ('cy', 20)",
    ] {
        run(&exec, sql).unwrap();
    }
    assert_eq!(
        select(
            &exec,
            "SELECT people.name FROM people GROUP BY people.age ORDER BY people.name"
        ),
        vec![vec![text("bo")], vec![text("cy")]]
    );
}
