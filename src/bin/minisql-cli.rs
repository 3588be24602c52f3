//! minisql interactive shell
//!
//! Reads one statement per line from stdin and prints its result.

use anyhow::Context;
use clap::Parser;
use minisql::types::Value;
use minisql::{execute_sql, DbError, EngineConfig, QueryExecutor, QueryResult, TableSchema};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const MAX_CELL_WIDTH: usize = 50;

#[derive(Parser, Debug)]
#[command(name = "minisql-cli", version, about = "Interactive shell for the minisql engine")]
struct Args {
    /// Storage root holding one directory per database
    #[arg(short = 'd', long)]
    data_dir: Option<PathBuf>,

    /// JSON engine config; --data-dir overrides its storage root
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = args.data_dir {
        config.storage_root = dir;
    }

    interactive_mode(QueryExecutor::new(config))
}

fn interactive_mode(executor: QueryExecutor) -> anyhow::Result<()> {
    println!("minisql v{}", VERSION);
    println!("Storage root: {}", executor.config().storage_root.display());
    println!("Type HELP for commands, EXIT to quit\n");

    let stdin = io::stdin();
    let mut buffer = String::new();

    loop {
        let prompt = match executor.current_database() {
            Ok(Some(db)) => format!("minisql({})> ", db),
            _ => "minisql> ".to_string(),
        };
        print!("{}", prompt);
        io::stdout().flush()?;

        buffer.clear();
        if stdin.lock().read_line(&mut buffer)? == 0 {
            break;
        }

        let input = buffer.trim();
        if input.is_empty() {
            continue;
        }

        match execute_sql(&executor, input) {
            Ok(QueryResult::Exit) => {
                println!("Bye");
                break;
            }
            Ok(result) => display_result(result),
            Err(e) => display_error(&e),
        }
    }

    Ok(())
}

fn display_error(e: &DbError) {
    eprintln!("[{}] {}: {}", e.kind().as_str(), e.code(), e);
}

fn display_result(result: QueryResult) {
    match result {
        QueryResult::DatabaseCreated { name, path, created } => {
            if created {
                println!("Database '{}' created at {}", name, path.display());
            } else {
                println!("Database '{}' already exists, nothing created", name);
            }
        }
        QueryResult::DatabaseDropped { name, dropped } => {
            if dropped {
                println!("Database '{}' dropped", name);
            } else {
                println!("Database '{}' does not exist, skipped", name);
            }
        }
        QueryResult::DatabaseRenamed { from, to } => {
            println!("Database '{}' renamed to '{}'", from, to);
        }
        QueryResult::DatabaseSelected { name } => {
            println!("Using database '{}'", name);
        }
        QueryResult::Databases { names } => display_list("Databases", &names),
        QueryResult::TableCreated { table, table_file, catalog_file } => {
            println!("Table '{}' created", table);
            println!("  data:    {}", table_file.display());
            println!("  catalog: {}", catalog_file.display());
        }
        QueryResult::TableDropped { table, dropped, skipped } => {
            if skipped {
                println!("Table '{}' does not exist, skipped", table);
            } else if dropped {
                println!("Table '{}' dropped", table);
            }
        }
        QueryResult::Tables { database, names } => {
            display_list(&format!("Tables in '{}'", database), &names)
        }
        QueryResult::Described { schemas } => {
            if schemas.is_empty() {
                println!("No tables found");
            }
            for schema in &schemas {
                display_schema(schema);
            }
        }
        QueryResult::Inserted { columns, row } => {
            println!("1 row inserted");
            display_table(&columns, std::slice::from_ref(&row));
        }
        QueryResult::Modification { affected_rows } => {
            println!("{} row(s) affected", affected_rows);
        }
        QueryResult::Select { columns, rows } => display_table(&columns, &rows),
        QueryResult::Help { commands } => {
            println!("Commands:");
            for command in commands {
                println!("  {}", command);
            }
        }
        QueryResult::Exit => {}
    }
}

fn display_list(title: &str, names: &[String]) {
    if names.is_empty() {
        println!("{}: (none)", title);
        return;
    }
    println!("{}:", title);
    for name in names {
        println!("  - {}", name);
    }
}

fn display_schema(schema: &TableSchema) {
    let columns = ["Column", "Type", "Constraints"].map(String::from);
    let rows: Vec<Vec<Value>> = schema
        .columns
        .iter()
        .map(|col| {
            let constraints = col
                .constraints
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            vec![
                Value::Text(col.name.clone()),
                Value::Text(col.col_type.to_string()),
                Value::Text(constraints),
            ]
        })
        .collect();

    println!("Table: {}", schema.name);
    display_table(&columns, &rows);
    if !schema.primary_keys.is_empty() {
        println!("Primary key: ({})", schema.primary_keys.join(", "));
    }
    for fk in &schema.foreign_keys {
        println!(
            "Foreign key: ({}) REFERENCES {}({})",
            fk.columns.join(", "),
            fk.referenced_table,
            fk.referenced_columns.join(", ")
        );
    }
    println!();
}

fn render_cell(value: &Value) -> String {
    let s = value.to_string();
    if s.chars().count() > MAX_CELL_WIDTH {
        let cut: String = s.chars().take(MAX_CELL_WIDTH - 3).collect();
        format!("{}...", cut)
    } else {
        s
    }
}

fn border(widths: &[usize], left: &str, mid: &str, right: &str) -> String {
    let parts: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{}{}{}", left, parts.join(mid), right)
}

fn display_table(columns: &[String], rows: &[Vec<Value>]) {
    if rows.is_empty() {
        println!("No results");
        return;
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(render_cell).collect())
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let line = |values: &[String]| {
        let padded: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, width)| {
                let value = values.get(i).map(String::as_str).unwrap_or("");
                format!(" {:width$} ", value, width = width)
            })
            .collect();
        format!("│{}│", padded.join("│"))
    };

    println!("{}", border(&widths, "┌", "┬", "┐"));
    println!("{}", line(columns));
    println!("{}", border(&widths, "├", "┼", "┤"));
    for row in &cells {
        println!("{}", line(row.as_slice()));
    }
    println!("{}", border(&widths, "└", "┴", "┘"));
    println!("{} row(s) returned", rows.len());
}
