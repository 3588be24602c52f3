/// Predicate lexer - converts WHERE/HAVING text into tokens
use super::token::{Token, TokenType};
use crate::error::{DbError, Result};

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.token_type, TokenType::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        let offset = self.position;
        if self.is_eof() {
            return Ok(Token::new(TokenType::Eof, offset));
        }

        let ch = self.current_char();
        let token_type = match ch {
            '\'' | '"' => self.read_string(ch)?,
            '0'..='9' => self.read_number()?,
            '-' | '+' if self.peek_char().is_some_and(|c| c.is_ascii_digit() || c == '.') => {
                self.read_number()?
            }
            '.' if self.peek_char().is_some_and(|c| c.is_ascii_digit()) => self.read_number()?,
            c if c.is_alphabetic() || c == '_' => self.read_identifier(),
            '=' => {
                self.advance();
                // tolerate '=='
                if self.current_char() == '=' {
                    self.advance();
                }
                TokenType::Eq
            }
            '!' => {
                self.advance();
                if self.current_char() == '=' {
                    self.advance();
                    TokenType::Ne
                } else {
                    return Err(DbError::Parse(format!(
                        "unexpected character '!' at position {}",
                        offset
                    )));
                }
            }
            '<' => {
                self.advance();
                match self.current_char() {
                    '=' => {
                        self.advance();
                        TokenType::Le
                    }
                    '>' => {
                        self.advance();
                        TokenType::Ne
                    }
                    _ => TokenType::Lt,
                }
            }
            '>' => {
                self.advance();
                if self.current_char() == '=' {
                    self.advance();
                    TokenType::Ge
                } else {
                    TokenType::Gt
                }
            }
            '(' => {
                self.advance();
                TokenType::LParen
            }
            ')' => {
                self.advance();
                TokenType::RParen
            }
            _ => {
                return Err(DbError::Parse(format!(
                    "unexpected character '{}' at position {}",
                    ch, offset
                )));
            }
        };

        Ok(Token::new(token_type, offset))
    }

    fn current_char(&self) -> char {
        if self.is_eof() {
            '\0'
        } else {
            self.input[self.position]
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        if !self.is_eof() {
            self.position += 1;
        }
    }

    fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_eof() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    fn read_string(&mut self, quote: char) -> Result<TokenType> {
        self.advance(); // opening quote
        let mut value = String::new();

        loop {
            if self.is_eof() {
                return Err(DbError::Parse("unterminated string literal".to_string()));
            }
            let ch = self.current_char();
            if ch == quote {
                // doubled quote is an escaped quote
                if self.peek_char() == Some(quote) {
                    value.push(quote);
                    self.advance();
                    self.advance();
                    continue;
                }
                break;
            }
            value.push(ch);
            self.advance();
        }

        self.advance(); // closing quote
        Ok(TokenType::String(value))
    }

    fn read_number(&mut self) -> Result<TokenType> {
        let mut value = String::new();
        if matches!(self.current_char(), '-' | '+') {
            value.push(self.current_char());
            self.advance();
        }

        while !self.is_eof() && (self.current_char().is_ascii_digit() || self.current_char() == '.') {
            value.push(self.current_char());
            self.advance();
        }

        if let Ok(i) = value.parse::<i64>() {
            return Ok(TokenType::Integer(i));
        }
        value
            .parse::<f64>()
            .map(TokenType::Float)
            .map_err(|_| DbError::Parse(format!("invalid number: {}", value)))
    }

    fn read_identifier(&mut self) -> TokenType {
        let mut value = String::new();

        while !self.is_eof() {
            let ch = self.current_char();
            // dotted names (table.column) stay one identifier
            if ch.is_alphanumeric() || ch == '_' || ch == '.' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        TokenType::from_keyword(&value).unwrap_or(TokenType::Identifier(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(input: &str) -> Vec<TokenType> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.token_type)
            .collect()
    }

    #[test]
    fn test_lexer_comparison() {
        assert_eq!(
            types("age >= 18"),
            vec![
                TokenType::Identifier("age".into()),
                TokenType::Ge,
                TokenType::Integer(18),
                TokenType::Eof
            ]
        );
    }

    #[test]
    fn test_lexer_operators() {
        assert_eq!(
            types("= != <> < > <= >="),
            vec![
                TokenType::Eq,
                TokenType::Ne,
                TokenType::Ne,
                TokenType::Lt,
                TokenType::Gt,
                TokenType::Le,
                TokenType::Ge,
                TokenType::Eof
            ]
        );
    }

    #[test]
    fn test_lexer_string_literal() {
        assert_eq!(
            types("name = 'O''Brien' OR nick = \"x\""),
            vec![
                TokenType::Identifier("name".into()),
                TokenType::Eq,
                TokenType::String("O'Brien".into()),
                TokenType::Or,
                TokenType::Identifier("nick".into()),
                TokenType::Eq,
                TokenType::String("x".into()),
                TokenType::Eof
            ]
        );
    }

    #[test]
    fn test_lexer_numbers() {
        assert_eq!(
            types("-3 2.5"),
            vec![TokenType::Integer(-3), TokenType::Float(2.5), TokenType::Eof]
        );
    }

    #[test]
    fn test_lexer_unterminated_string() {
        assert!(Lexer::new("name = 'abc").tokenize().is_err());
    }

    #[test]
    fn test_lexer_rejects_unknown_character() {
        assert!(Lexer::new("a ; b").tokenize().is_err());
    }
}
