/// WHERE/HAVING parser: a small Pratt parser over predicate tokens
use super::ast::{BinaryOperator, Expr, Predicate};
use super::lexer::Lexer;
use super::token::{Token, TokenType};
use crate::error::{DbError, Result};
use crate::types::Value;

// NOT binds looser than comparisons, tighter than AND
const NOT_PRECEDENCE: u8 = 3;

/// Compile predicate text into a [`Predicate`].
pub fn parse_predicate(source: &str) -> Result<Predicate> {
    let source = source.trim();
    if source.is_empty() {
        return Err(DbError::Parse("empty condition".into()));
    }
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = PredicateParser::new(tokens);
    let expr = parser.parse_expr(0)?;
    if !matches!(parser.current().token_type, TokenType::Eof) {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(Predicate {
        source: source.to_string(),
        expr,
    })
}

struct PredicateParser {
    tokens: Vec<Token>,
    position: usize,
}

impl PredicateParser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, position: 0 }
    }

    fn parse_expr(&mut self, min_precedence: u8) -> Result<Expr> {
        let mut left = self.parse_prefix_expr()?;
        left = self.parse_postfix_expr(left)?;

        while let Some(op) = self.try_parse_binary_op() {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }

            self.advance(); // consume operator
            let right = self.parse_expr(precedence + 1)?;

            left = Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_prefix_expr(&mut self) -> Result<Expr> {
        match self.current().token_type.clone() {
            TokenType::Not => {
                self.advance();
                let expr = self.parse_expr(NOT_PRECEDENCE)?;
                Ok(Expr::Not(Box::new(expr)))
            }
            TokenType::LParen => {
                self.advance();
                let expr = self.parse_expr(0)?;
                self.expect(TokenType::RParen)?;
                Ok(expr)
            }
            TokenType::Integer(i) => {
                self.advance();
                Ok(Expr::Literal(Value::Integer(i)))
            }
            TokenType::Float(f) => {
                self.advance();
                Ok(Expr::Literal(Value::Float(f)))
            }
            TokenType::String(s) => {
                self.advance();
                Ok(Expr::Literal(Value::Text(s)))
            }
            TokenType::Null => {
                self.advance();
                Ok(Expr::Literal(Value::Null))
            }
            TokenType::True => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            TokenType::False => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            TokenType::Identifier(name) => {
                self.advance();
                Ok(Expr::Column(name))
            }
            TokenType::Eof => Err(self.error("incomplete condition")),
            other => Err(self.error(&format!("unexpected token {:?}", other))),
        }
    }

    /// IS [NOT] NULL, [NOT] LIKE pattern
    fn parse_postfix_expr(&mut self, expr: Expr) -> Result<Expr> {
        match self.current().token_type {
            TokenType::Is => {
                self.advance();
                let negated = self.match_token(TokenType::Not);
                self.expect(TokenType::Null)?;
                Ok(Expr::IsNull {
                    expr: Box::new(expr),
                    negated,
                })
            }
            TokenType::Like => {
                self.advance();
                let pattern = self.parse_prefix_expr()?;
                Ok(Expr::Like {
                    expr: Box::new(expr),
                    pattern: Box::new(pattern),
                    negated: false,
                })
            }
            TokenType::Not if matches!(self.peek().token_type, TokenType::Like) => {
                self.advance();
                self.advance();
                let pattern = self.parse_prefix_expr()?;
                Ok(Expr::Like {
                    expr: Box::new(expr),
                    pattern: Box::new(pattern),
                    negated: true,
                })
            }
            _ => Ok(expr),
        }
    }

    fn try_parse_binary_op(&self) -> Option<BinaryOperator> {
        match self.current().token_type {
            TokenType::Eq => Some(BinaryOperator::Eq),
            TokenType::Ne => Some(BinaryOperator::Ne),
            TokenType::Lt => Some(BinaryOperator::Lt),
            TokenType::Gt => Some(BinaryOperator::Gt),
            TokenType::Le => Some(BinaryOperator::Le),
            TokenType::Ge => Some(BinaryOperator::Ge),
            TokenType::And => Some(BinaryOperator::And),
            TokenType::Or => Some(BinaryOperator::Or),
            _ => None,
        }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn peek(&self) -> &Token {
        let next = (self.position + 1).min(self.tokens.len() - 1);
        &self.tokens[next]
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    fn match_token(&mut self, token_type: TokenType) -> bool {
        if std::mem::discriminant(&self.current().token_type) == std::mem::discriminant(&token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token_type: TokenType) -> Result<()> {
        if self.match_token(token_type.clone()) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {:?}", token_type)))
        }
    }

    fn error(&self, msg: &str) -> DbError {
        DbError::Parse(format!("{} in condition at position {}", msg, self.current().offset))
    }
}
