/// Command tree produced by the statement parser
use crate::types::{ColumnDef, ForeignKey, Literal, Value};

/// One parsed statement. Constructed only by [`crate::sql::parse`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateDatabase {
        name: String,
        if_not_exists: bool,
    },
    CreateTable(CreateTableStmt),
    DropDatabase {
        name: String,
        if_exists: bool,
    },
    DropTable(DropTableStmt),
    /// ALTER DATABASE name RENAME TO new_name
    RenameDatabase {
        name: String,
        new_name: String,
    },
    Use {
        database_name: String,
    },
    ShowDatabases,
    /// Targets the current database
    ShowTables,
    /// `None` describes every table of the current database
    Describe {
        table_name: Option<String>,
    },
    Insert(InsertStmt),
    Select(SelectStmt),
    Update(UpdateStmt),
    Delete(DeleteStmt),
    Help,
    Exit,
}

/// CREATE TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStmt {
    pub table_name: String,
    pub columns: Vec<ColumnDef>,
    /// Table-level and inline REFERENCES clauses
    pub foreign_keys: Vec<ForeignKey>,
}

/// DROP TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct DropTableStmt {
    /// Explicit `db.` qualifier
    pub database: Option<String>,
    pub table_name: String,
    pub if_exists: bool,
}

/// INSERT statement
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStmt {
    pub table_name: String,
    /// None means schema order
    pub columns: Option<Vec<String>>,
    pub values: Vec<Literal>,
}

/// UPDATE statement
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStmt {
    pub table_name: String,
    pub assignments: Vec<(String, Literal)>,
    pub where_clause: Option<Predicate>,
}

/// DELETE statement
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStmt {
    pub table_name: String,
    pub where_clause: Option<Predicate>,
}

/// SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStmt {
    pub distinct: bool,
    pub columns: Projection,
    /// Raw FROM text; a JOIN here is rejected at execution time
    pub from: String,
    pub where_clause: Option<Predicate>,
    pub group_by: Option<Vec<String>>,
    pub having: Option<Predicate>,
    pub order_by: Option<Vec<OrderByExpr>>,
    pub limit: Option<Limit>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Star,
    Columns(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    pub column: String,
    pub direction: SortOrder,
}

/// LIMIT count / LIMIT offset,count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub offset: usize,
    pub count: usize,
}

/// A WHERE/HAVING condition: the source text plus its compiled form
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub source: String,
    pub expr: Expr,
}

/// Boolean expression over column references and literals
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference
    Column(String),

    /// Literal value
    Literal(Value),

    /// TRUE / FALSE
    Bool(bool),

    /// Binary operation
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },

    /// NOT expr
    Not(Box<Expr>),

    /// IS [NOT] NULL
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },

    /// [NOT] LIKE pattern
    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        negated: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Comparison
    Eq, // =
    Ne, // !=
    Lt, // <
    Gt, // >
    Le, // <=
    Ge, // >=

    // Logical
    And,
    Or,
}

impl BinaryOperator {
    /// Get operator precedence (higher = tighter binding)
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Or => 1,
            BinaryOperator::And => 2,
            BinaryOperator::Eq
            | BinaryOperator::Ne
            | BinaryOperator::Lt
            | BinaryOperator::Gt
            | BinaryOperator::Le
            | BinaryOperator::Ge => 3,
        }
    }

    pub fn is_comparison(&self) -> bool {
        !matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }
}

impl Expr {
    /// Every column name referenced by this expression
    pub fn referenced_columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Column(name) => out.push(name),
            Expr::Literal(_) | Expr::Bool(_) => {}
            Expr::BinaryOp { left, right, .. } => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
            Expr::Not(inner) | Expr::IsNull { expr: inner, .. } => inner.collect_columns(out),
            Expr::Like { expr, pattern, .. } => {
                expr.collect_columns(out);
                pattern.collect_columns(out);
            }
        }
    }
}
