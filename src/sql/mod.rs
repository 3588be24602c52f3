/// minisql statement language
///
/// Architecture:
/// - Scanner: normalization and quote/paren-aware splitting of statement text
/// - Parser: builds a `Command` from one line
/// - Lexer + predicate parser: compile WHERE/HAVING into an `Expr`
/// - Evaluator: runs an `Expr` against a row
/// - Executor: dispatches commands to the catalog and row store

pub mod ast;
pub mod evaluator;
pub mod executor;
pub mod lexer;
pub mod parser;
pub mod predicate;
pub mod scanner;
pub mod token;

pub use ast::{BinaryOperator, Command, Expr, Predicate, SelectStmt};
pub use executor::{QueryExecutor, QueryResult};
pub use lexer::Lexer;
pub use parser::parse;
pub use predicate::parse_predicate;
pub use token::{Token, TokenType};

use crate::error::Result;

/// Parse and execute one statement
pub fn execute_sql(executor: &QueryExecutor, sql: &str) -> Result<QueryResult> {
    let command = parse(sql)?;
    executor.execute(command)
}
