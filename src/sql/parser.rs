/// Statement parser - turns one line of input into a [`Command`]
use super::ast::*;
use super::predicate::parse_predicate;
use super::scanner::{
    check_balanced, closing_paren, contains_keyword, find_keyword, identifier, normalize,
    split_parenthesized, split_top_level, strip_keyword,
};
use crate::error::{DbError, Result};
use crate::types::{ColumnDef, ColumnType, Constraint, DefaultValue, ForeignKey, Literal, ReferentialAction};

/// Parse a single statement.
pub fn parse(line: &str) -> Result<Command> {
    let sql = normalize(line);
    if sql.is_empty() {
        return Err(DbError::Parse("empty statement".into()));
    }
    check_balanced(&sql)?;
    Parser { sql: &sql }.parse_statement()
}

struct Parser<'a> {
    sql: &'a str,
}

impl<'a> Parser<'a> {
    fn parse_statement(&self) -> Result<Command> {
        let sql = self.sql;

        if let Some(rest) = strip_keyword(sql, "EXIT").or_else(|| strip_keyword(sql, "QUIT")) {
            return Self::no_arguments(rest, Command::Exit);
        }
        if let Some(rest) = strip_keyword(sql, "HELP") {
            return Self::no_arguments(rest, Command::Help);
        }
        if let Some(rest) = strip_keyword(sql, "SHOW") {
            return self.parse_show(rest);
        }
        if let Some(rest) = strip_keyword(sql, "USE") {
            return Ok(Command::Use {
                database_name: identifier(rest, "database name")?.to_string(),
            });
        }
        if let Some(rest) = strip_keyword(sql, "CREATE") {
            return self.parse_create(rest);
        }
        if let Some(rest) = strip_keyword(sql, "DROP") {
            return self.parse_drop(rest);
        }
        if let Some(rest) = strip_keyword(sql, "ALTER") {
            return self.parse_alter(rest);
        }
        if let Some(rest) = strip_keyword(sql, "DESCRIBE").or_else(|| strip_keyword(sql, "DESC")) {
            let table_name = if rest.is_empty() {
                None
            } else {
                Some(identifier(rest, "table name")?.to_string())
            };
            return Ok(Command::Describe { table_name });
        }
        if let Some(rest) = strip_keyword(sql, "INSERT") {
            return self.parse_insert(rest).map(Command::Insert);
        }
        if let Some(rest) = strip_keyword(sql, "SELECT") {
            return self.parse_select(rest).map(Command::Select);
        }
        if let Some(rest) = strip_keyword(sql, "UPDATE") {
            return self.parse_update(rest).map(Command::Update);
        }
        if let Some(rest) = strip_keyword(sql, "DELETE") {
            return self.parse_delete(rest).map(Command::Delete);
        }

        let first = sql.split(' ').next().unwrap_or(sql);
        Err(DbError::Parse(format!("unknown command '{}'", first)))
    }

    fn no_arguments(rest: &str, command: Command) -> Result<Command> {
        if rest.is_empty() {
            Ok(command)
        } else {
            Err(DbError::Parse(format!("unexpected arguments '{}'", rest)))
        }
    }

    fn parse_show(&self, rest: &str) -> Result<Command> {
        if let Some(tail) = strip_keyword(rest, "DATABASES") {
            return Self::no_arguments(tail, Command::ShowDatabases);
        }
        if let Some(tail) = strip_keyword(rest, "TABLES") {
            return Self::no_arguments(tail, Command::ShowTables);
        }
        Err(DbError::Parse("SHOW expects DATABASES or TABLES".into()))
    }

    // ===== DDL =====

    fn parse_create(&self, rest: &str) -> Result<Command> {
        if let Some(tail) = strip_keyword(rest, "DATABASE") {
            let (if_not_exists, name) = match strip_keyword(tail, "IF NOT EXISTS") {
                Some(name) => (true, name),
                None => (false, tail),
            };
            return Ok(Command::CreateDatabase {
                name: identifier(name, "database name")?.to_string(),
                if_not_exists,
            });
        }
        if let Some(tail) = strip_keyword(rest, "TABLE") {
            return self.parse_create_table(tail).map(Command::CreateTable);
        }
        Err(DbError::Parse("CREATE expects DATABASE or TABLE".into()))
    }

    fn parse_create_table(&self, rest: &str) -> Result<CreateTableStmt> {
        let (name, body) = split_parenthesized(rest)
            .ok_or_else(|| DbError::Parse("CREATE TABLE expects: name(column definitions)".into()))?;
        let table_name = identifier(name, "table name")?.to_string();

        let definitions = split_top_level(body, ',');
        if definitions.is_empty() {
            return Err(DbError::Parse(format!("table '{}' defines no columns", table_name)));
        }

        let mut columns: Vec<ColumnDef> = Vec::new();
        let mut foreign_keys = Vec::new();
        let mut table_primary_key: Vec<String> = Vec::new();

        for def in &definitions {
            if def.is_empty() {
                return Err(DbError::Parse("empty column definition".into()));
            }
            if strip_keyword(def, "CONSTRAINT").is_some() || strip_keyword(def, "FOREIGN KEY").is_some() {
                foreign_keys.push(parse_table_foreign_key(def)?);
            } else if let Some(cols) = strip_keyword(def, "PRIMARY KEY") {
                table_primary_key.extend(parse_name_list(cols, "PRIMARY KEY")?);
            } else {
                let (column, inline_fk) = parse_column_def(def)?;
                columns.push(column);
                foreign_keys.extend(inline_fk);
            }
        }

        if columns.is_empty() {
            return Err(DbError::Parse(format!("table '{}' defines no columns", table_name)));
        }

        // PRIMARY KEY (a, b) marks the listed columns
        for key in table_primary_key {
            let column = columns
                .iter_mut()
                .find(|c| c.name == key)
                .ok_or_else(|| DbError::Parse(format!("PRIMARY KEY names unknown column '{}'", key)))?;
            if !column.is_primary_key() {
                column.constraints.push(Constraint::PrimaryKey);
            }
        }

        Ok(CreateTableStmt {
            table_name,
            columns,
            foreign_keys,
        })
    }

    fn parse_drop(&self, rest: &str) -> Result<Command> {
        if let Some(tail) = strip_keyword(rest, "DATABASE") {
            let (if_exists, name) = split_if_exists(tail);
            return Ok(Command::DropDatabase {
                name: identifier(name, "database name")?.to_string(),
                if_exists,
            });
        }
        if let Some(tail) = strip_keyword(rest, "TABLE") {
            let (if_exists, target) = split_if_exists(tail);
            let (database, table) = match target.split_once('.') {
                Some((db, table)) => (Some(identifier(db, "database name")?.to_string()), table),
                None => (None, target),
            };
            return Ok(Command::DropTable(DropTableStmt {
                database,
                table_name: identifier(table, "table name")?.to_string(),
                if_exists,
            }));
        }
        Err(DbError::Parse("DROP expects DATABASE or TABLE".into()))
    }

    fn parse_alter(&self, rest: &str) -> Result<Command> {
        let tail = strip_keyword(rest, "DATABASE")
            .ok_or_else(|| DbError::Parse("ALTER expects DATABASE".into()))?;
        let at = find_keyword(tail, "RENAME TO", 0)
            .ok_or_else(|| DbError::Parse("ALTER DATABASE expects: name RENAME TO new_name".into()))?;
        let name = identifier(&tail[..at], "database name")?.to_string();
        let new_name = identifier(&tail[at + "RENAME TO".len()..], "new database name")?.to_string();
        Ok(Command::RenameDatabase { name, new_name })
    }

    // ===== DML =====

    fn parse_insert(&self, rest: &str) -> Result<InsertStmt> {
        let rest = strip_keyword(rest, "INTO").ok_or_else(|| DbError::Parse("INSERT expects INTO".into()))?;
        let at = find_keyword(rest, "VALUES", 0)
            .ok_or_else(|| DbError::Parse("INSERT expects VALUES".into()))?;
        let target = rest[..at].trim();
        let values_text = rest[at + "VALUES".len()..].trim();

        let (table_name, columns) = match split_parenthesized(target) {
            Some((name, cols)) => (name, Some(parse_name_list_body(cols, "INSERT column list")?)),
            None => (target, None),
        };
        let table_name = identifier(table_name, "table name")?.to_string();

        let close = closing_paren(values_text)
            .ok_or_else(|| DbError::Parse("VALUES expects a parenthesized list".into()))?;
        let trailing = values_text[close + 1..].trim();
        if !trailing.is_empty() {
            return Err(DbError::Parse(format!(
                "VALUES takes a single row, unexpected '{}' after it",
                trailing
            )));
        }
        let values_body = &values_text[1..close];
        let values: Vec<Literal> = split_top_level(values_body, ',')
            .iter()
            .map(|raw| parse_value(raw))
            .collect::<Result<_>>()?;
        if values.is_empty() {
            return Err(DbError::Parse("VALUES list is empty".into()));
        }

        if let Some(cols) = &columns {
            if cols.len() != values.len() {
                return Err(DbError::ColumnCountMismatch {
                    columns: cols.len(),
                    values: values.len(),
                });
            }
        }

        Ok(InsertStmt {
            table_name,
            columns,
            values,
        })
    }

    fn parse_update(&self, rest: &str) -> Result<UpdateStmt> {
        let set_at = find_keyword(rest, "SET", 0)
            .ok_or_else(|| DbError::Parse("UPDATE expects SET".into()))?;
        let table_name = identifier(&rest[..set_at], "table name")?.to_string();
        let body = &rest[set_at + "SET".len()..];

        let (assignments_text, where_clause) = match find_keyword(body, "WHERE", 0) {
            Some(at) => (&body[..at], Some(parse_predicate(&body[at + "WHERE".len()..])?)),
            None => (body, None),
        };

        let mut assignments = Vec::new();
        for item in split_top_level(assignments_text, ',') {
            let (column, value) = item
                .split_once('=')
                .ok_or_else(|| DbError::Parse(format!("malformed assignment '{}'", item)))?;
            let column = identifier(column, "column name")?.to_string();
            assignments.push((column, parse_value(value)?));
        }
        if assignments.is_empty() {
            return Err(DbError::Parse("SET list is empty".into()));
        }

        Ok(UpdateStmt {
            table_name,
            assignments,
            where_clause,
        })
    }

    fn parse_delete(&self, rest: &str) -> Result<DeleteStmt> {
        let rest = strip_keyword(rest, "FROM").ok_or_else(|| DbError::Parse("DELETE expects FROM".into()))?;
        let (table, where_clause) = match find_keyword(rest, "WHERE", 0) {
            Some(at) => (&rest[..at], Some(parse_predicate(&rest[at + "WHERE".len()..])?)),
            None => (rest, None),
        };
        Ok(DeleteStmt {
            table_name: identifier(table, "table name")?.to_string(),
            where_clause,
        })
    }

    fn parse_select(&self, rest: &str) -> Result<SelectStmt> {
        let (distinct, rest) = match strip_keyword(rest, "DISTINCT") {
            Some(tail) => (true, tail),
            None => (false, rest),
        };

        let from_at = find_keyword(rest, "FROM", 0)
            .ok_or_else(|| DbError::Parse("SELECT expects FROM".into()))?;
        let columns = parse_projection(&rest[..from_at])?;
        let tail = &rest[from_at + "FROM".len()..];

        // Clause boundaries, in the order they may appear
        const CLAUSES: [&str; 5] = ["WHERE", "GROUP BY", "HAVING", "ORDER BY", "LIMIT"];
        let mut found: Vec<(usize, &str)> = Vec::new();
        let mut cursor = 0;
        for clause in CLAUSES {
            if let Some(at) = find_keyword(tail, clause, cursor) {
                found.push((at, clause));
                cursor = at + clause.len();
            }
        }
        for clause in CLAUSES {
            if !found.iter().any(|(_, c)| *c == clause) && contains_keyword(tail, clause) {
                return Err(DbError::Parse(format!("{} clause is out of order", clause)));
            }
        }

        let from_end = found.first().map(|(at, _)| *at).unwrap_or(tail.len());
        let from = tail[..from_end].trim().to_string();
        if from.is_empty() {
            return Err(DbError::Parse("FROM expects a table name".into()));
        }
        if !contains_keyword(&from, "JOIN") {
            identifier(&from, "table name")?;
        }

        let mut stmt = SelectStmt {
            distinct,
            columns,
            from,
            where_clause: None,
            group_by: None,
            having: None,
            order_by: None,
            limit: None,
        };

        for (i, (at, clause)) in found.iter().enumerate() {
            let end = found.get(i + 1).map(|(next, _)| *next).unwrap_or(tail.len());
            let body = tail[at + clause.len()..end].trim();
            if body.is_empty() {
                return Err(DbError::Parse(format!("{} clause is empty", clause)));
            }
            match *clause {
                "WHERE" => stmt.where_clause = Some(parse_predicate(body)?),
                "GROUP BY" => stmt.group_by = Some(parse_column_refs(body, "GROUP BY")?),
                "HAVING" => stmt.having = Some(parse_predicate(body)?),
                "ORDER BY" => stmt.order_by = Some(parse_order_by(body)?),
                _ => stmt.limit = Some(parse_limit(body)?),
            }
        }

        if stmt.having.is_some() && stmt.group_by.is_none() {
            return Err(DbError::Parse("HAVING requires GROUP BY".into()));
        }

        Ok(stmt)
    }
}

fn split_if_exists(text: &str) -> (bool, &str) {
    match strip_keyword(text, "IF EXISTS") {
        Some(name) => (true, name),
        None => (false, text),
    }
}

/// A statement value: quoted literal, number, NULL or bare word
fn parse_value(raw: &str) -> Result<Literal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(DbError::Parse("missing value".into()));
    }
    if raw.starts_with('\'') || raw.starts_with('"') {
        return parse_quoted(raw).map(Literal::Text);
    }
    if let Some(bad) = raw.chars().find(|c| c.is_whitespace() || "=<>!(),'\"".contains(*c)) {
        return Err(DbError::Parse(format!(
            "unexpected '{}' in value '{}' (quote text, separate items with commas)",
            bad, raw
        )));
    }
    Ok(Literal::from_token(raw))
}

/// Body of a quoted literal. Inside it the quote is escaped by doubling
/// and the closing quote must end the value.
fn parse_quoted(raw: &str) -> Result<String> {
    let mut chars = raw.chars();
    let Some(q) = chars.next() else {
        return Err(DbError::Parse("missing value".into()));
    };
    let mut out = String::new();
    let mut chars = chars.peekable();
    while let Some(ch) = chars.next() {
        if ch != q {
            out.push(ch);
            continue;
        }
        if chars.peek() == Some(&q) {
            chars.next();
            out.push(q);
            continue;
        }
        let rest: String = chars.collect();
        if !rest.trim().is_empty() {
            return Err(DbError::Parse(format!(
                "unexpected '{}' after closing quote in {}",
                rest.trim(),
                raw
            )));
        }
        return Ok(out);
    }
    Err(DbError::Parse(format!("unterminated literal {}", raw)))
}

/// `(a, b)` → `["a", "b"]`
fn parse_name_list(text: &str, what: &str) -> Result<Vec<String>> {
    let body = text
        .trim()
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .ok_or_else(|| DbError::Parse(format!("{} expects a parenthesized column list", what)))?;
    parse_name_list_body(body, what)
}

/// A column name, optionally qualified as `table.column`
fn column_ref(text: &str, what: &str) -> Result<String> {
    match text.trim().split_once('.') {
        Some((table, column)) => Ok(format!(
            "{}.{}",
            identifier(table, what)?,
            identifier(column, what)?
        )),
        None => identifier(text, what).map(str::to_string),
    }
}

fn parse_column_refs(body: &str, what: &str) -> Result<Vec<String>> {
    let names = split_top_level(body, ',')
        .iter()
        .map(|n| column_ref(n, &format!("column in {}", what)))
        .collect::<Result<Vec<_>>>()?;
    if names.is_empty() {
        return Err(DbError::Parse(format!("{} is empty", what)));
    }
    Ok(names)
}

fn parse_name_list_body(body: &str, what: &str) -> Result<Vec<String>> {
    let names = split_top_level(body, ',')
        .iter()
        .map(|n| identifier(n, &format!("column in {}", what)).map(str::to_string))
        .collect::<Result<Vec<_>>>()?;
    if names.is_empty() {
        return Err(DbError::Parse(format!("{} is empty", what)));
    }
    Ok(names)
}

fn parse_projection(text: &str) -> Result<Projection> {
    let text = text.trim();
    if text == "*" {
        return Ok(Projection::Star);
    }
    if text.is_empty() {
        return Err(DbError::Parse("SELECT list is empty".into()));
    }
    let mut columns = Vec::new();
    for item in split_top_level(text, ',') {
        if item == "*" {
            return Err(DbError::Parse("'*' cannot be combined with other columns".into()));
        }
        if item.contains('(') {
            return Err(DbError::Unsupported(format!("expression in SELECT list: {}", item)));
        }
        let column = column_ref(&item, "column")
            .map_err(|_| DbError::Parse(format!("invalid column '{}' in SELECT list", item)))?;
        columns.push(column);
    }
    Ok(Projection::Columns(columns))
}

fn parse_order_by(text: &str) -> Result<Vec<OrderByExpr>> {
    split_top_level(text, ',')
        .iter()
        .map(|item| {
            let mut parts = item.split(' ');
            let column = column_ref(parts.next().unwrap_or(""), "ORDER BY column")?;
            let direction = match parts.next() {
                None => SortOrder::Asc,
                Some(d) if d.eq_ignore_ascii_case("ASC") => SortOrder::Asc,
                Some(d) if d.eq_ignore_ascii_case("DESC") => SortOrder::Desc,
                Some(d) => return Err(DbError::Parse(format!("invalid sort direction '{}'", d))),
            };
            if let Some(extra) = parts.next() {
                return Err(DbError::Parse(format!("unexpected '{}' in ORDER BY", extra)));
            }
            Ok(OrderByExpr { column, direction })
        })
        .collect()
}

/// `count`, `offset, count` or `count OFFSET offset`
fn parse_limit(text: &str) -> Result<Limit> {
    let number = |s: &str| {
        s.trim()
            .parse::<usize>()
            .map_err(|_| DbError::Parse(format!("LIMIT expects a non-negative integer, got '{}'", s.trim())))
    };

    if let Some((offset, count)) = text.split_once(',') {
        return Ok(Limit {
            offset: number(offset)?,
            count: number(count)?,
        });
    }
    if let Some(at) = find_keyword(text, "OFFSET", 0) {
        return Ok(Limit {
            offset: number(&text[at + "OFFSET".len()..])?,
            count: number(&text[..at])?,
        });
    }
    Ok(Limit {
        offset: 0,
        count: number(text)?,
    })
}

/// Words of a definition, keeping parenthesized groups and quoted text intact
fn definition_tokens(def: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for word in split_top_level(def, ' ').into_iter().filter(|w| !w.is_empty()) {
        // "VARCHAR (20)" and "users (id)" glue back onto the previous word
        match tokens.last_mut() {
            Some(prev) if word.starts_with('(') => prev.push_str(&word),
            _ => tokens.push(word),
        }
    }
    tokens
}

/// `name type [constraints...]`; an inline REFERENCES yields a foreign key.
fn parse_column_def(def: &str) -> Result<(ColumnDef, Option<ForeignKey>)> {
    let tokens = definition_tokens(def);
    let name = identifier(&tokens[0], "column name")?.to_string();

    let type_token = tokens
        .get(1)
        .ok_or_else(|| DbError::Parse(format!("column '{}' has no type", name)))?;
    let col_type: ColumnType = type_token
        .parse()
        .map_err(|e| DbError::Parse(format!("column '{}': {}", name, e)))?;

    let mut column = ColumnDef::new(name.clone(), col_type);
    let mut foreign_key = None;
    let mut i = 2;

    while i < tokens.len() {
        let token = tokens[i].to_ascii_uppercase();
        let next = tokens.get(i + 1).map(|t| t.to_ascii_uppercase());

        let constraint = match (token.as_str(), next.as_deref()) {
            ("PRIMARY", Some("KEY")) => {
                i += 1;
                Some(Constraint::PrimaryKey)
            }
            ("NOT", Some("NULL")) => {
                i += 1;
                Some(Constraint::NotNull)
            }
            ("NULL", _) => None,
            ("UNIQUE", _) => Some(Constraint::Unique),
            ("AUTO_INCREMENT", _) | ("AUTOINCREMENT", _) => Some(Constraint::AutoIncrement),
            ("DEFAULT", Some(_)) => {
                i += 1;
                Some(Constraint::Default(parse_default(&tokens[i])?))
            }
            ("REFERENCES", Some(_)) => {
                i += 1;
                let (table, cols) = parse_reference_target(&tokens[i])?;
                let mut fk = ForeignKey {
                    name: None,
                    columns: vec![name.clone()],
                    referenced_table: table,
                    referenced_columns: cols,
                    on_delete: None,
                    on_update: None,
                };
                i = parse_referential_actions(&tokens, i + 1, &mut fk)? - 1;
                foreign_key = Some(fk);
                None
            }
            _ => {
                return Err(DbError::Parse(format!(
                    "unknown constraint '{}' on column '{}'",
                    tokens[i], name
                )))
            }
        };

        if let Some(c) = constraint {
            if !column.constraints.contains(&c) {
                column.constraints.push(c);
            }
        }
        i += 1;
    }

    Ok((column, foreign_key))
}

fn parse_default(token: &str) -> Result<DefaultValue> {
    let bare = token.trim_end_matches("()");
    if bare.eq_ignore_ascii_case("CURRENT_TIMESTAMP") || bare.eq_ignore_ascii_case("NOW") {
        return Ok(DefaultValue::CurrentTimestamp);
    }
    parse_value(token).map(DefaultValue::Literal)
}

/// `table(col, ...)`
fn parse_reference_target(token: &str) -> Result<(String, Vec<String>)> {
    let (table, cols) = split_parenthesized(token)
        .ok_or_else(|| DbError::Parse(format!("REFERENCES expects table(columns), got '{}'", token)))?;
    let table = identifier(table, "referenced table")?.to_string();
    Ok((table, parse_name_list_body(cols, "REFERENCES")?))
}

/// Consume `ON DELETE x` / `ON UPDATE y` starting at `i`; returns the next index.
fn parse_referential_actions(tokens: &[String], mut i: usize, fk: &mut ForeignKey) -> Result<usize> {
    while i < tokens.len() && tokens[i].eq_ignore_ascii_case("ON") {
        let event = tokens
            .get(i + 1)
            .map(|t| t.to_ascii_uppercase())
            .ok_or_else(|| DbError::Parse("ON expects DELETE or UPDATE".into()))?;
        let first = tokens
            .get(i + 2)
            .ok_or_else(|| DbError::Parse(format!("ON {} expects an action", event)))?;
        let mut action = first.clone();
        let mut consumed = 3;
        if first.eq_ignore_ascii_case("SET") || first.eq_ignore_ascii_case("NO") {
            if let Some(second) = tokens.get(i + 3) {
                action = format!("{} {}", first, second);
                consumed = 4;
            }
        }
        let action: ReferentialAction = action.parse().map_err(DbError::Parse)?;
        match event.as_str() {
            "DELETE" => fk.on_delete = Some(action),
            "UPDATE" => fk.on_update = Some(action),
            other => return Err(DbError::Parse(format!("ON expects DELETE or UPDATE, got '{}'", other))),
        }
        i += consumed;
    }
    Ok(i)
}

/// `[CONSTRAINT name] FOREIGN KEY (cols) REFERENCES table(cols) [ON ...]`
fn parse_table_foreign_key(def: &str) -> Result<ForeignKey> {
    let tokens = definition_tokens(def);
    let mut i = 0;
    let mut name = None;

    if tokens[i].eq_ignore_ascii_case("CONSTRAINT") {
        let n = tokens
            .get(i + 1)
            .ok_or_else(|| DbError::Parse("CONSTRAINT expects a name".into()))?;
        name = Some(identifier(n, "constraint name")?.to_string());
        i += 2;
    }

    // FOREIGN KEY(cols) after gluing
    let head = tokens.get(i).map(|t| t.to_ascii_uppercase()).unwrap_or_default();
    let key = tokens.get(i + 1).cloned().unwrap_or_default();
    if head != "FOREIGN" || !key.to_ascii_uppercase().starts_with("KEY") {
        return Err(DbError::Parse(format!("expected FOREIGN KEY in '{}'", def)));
    }
    let columns = parse_name_list(&key[3..], "FOREIGN KEY")?;
    i += 2;

    if !tokens.get(i).is_some_and(|t| t.eq_ignore_ascii_case("REFERENCES")) {
        return Err(DbError::Parse(format!("FOREIGN KEY expects REFERENCES in '{}'", def)));
    }
    let target = tokens
        .get(i + 1)
        .ok_or_else(|| DbError::Parse("REFERENCES expects table(columns)".into()))?;
    let (referenced_table, referenced_columns) = parse_reference_target(target)?;

    if columns.len() != referenced_columns.len() {
        return Err(DbError::Parse(format!(
            "FOREIGN KEY has {} column(s) but references {}",
            columns.len(),
            referenced_columns.len()
        )));
    }

    let mut fk = ForeignKey {
        name,
        columns,
        referenced_table,
        referenced_columns,
        on_delete: None,
        on_update: None,
    };
    let end = parse_referential_actions(&tokens, i + 2, &mut fk)?;
    if let Some(extra) = tokens.get(end) {
        return Err(DbError::Parse(format!("unexpected '{}' in FOREIGN KEY clause", extra)));
    }
    Ok(fk)
}
