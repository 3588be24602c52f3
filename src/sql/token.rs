/// Token types for the predicate lexer
use phf::phf_map;

// Keyword lookup, matched on the lowercase spelling
static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "and" => TokenType::And,
    "or" => TokenType::Or,
    "not" => TokenType::Not,
    "is" => TokenType::Is,
    "null" => TokenType::Null,
    "like" => TokenType::Like,
    "true" => TokenType::True,
    "false" => TokenType::False,
};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    // Keywords
    And,
    Or,
    Not,
    Is,
    Null,
    Like,
    True,
    False,

    // Operators
    Eq, // =
    Ne, // != or <>
    Lt, // <
    Gt, // >
    Le, // <=
    Ge, // >=

    // Delimiters
    LParen,
    RParen,

    // Literals
    Integer(i64),
    Float(f64),
    String(String),
    Identifier(String),

    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    /// Character offset in the source text
    pub offset: usize,
}

impl Token {
    pub fn new(token_type: TokenType, offset: usize) -> Self {
        Self { token_type, offset }
    }
}

impl TokenType {
    /// Case-insensitive keyword lookup
    pub fn from_keyword(s: &str) -> Option<Self> {
        let lowercase = s.to_lowercase();
        KEYWORDS.get(lowercase.as_str()).cloned()
    }
}
