/// Text helpers shared by the statement parsers: normalization, top-level
/// splitting and keyword search that respect parentheses and quotes.
use crate::error::{DbError, Result};

/// Collapse whitespace runs, drop a trailing `;`, trim.
///
/// Whitespace inside quoted literals is preserved.
pub fn normalize(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut quote: Option<char> = None;
    let mut pending_space = false;

    for ch in line.chars() {
        match quote {
            Some(q) => {
                out.push(ch);
                if ch == q {
                    quote = None;
                }
            }
            None if ch.is_whitespace() => pending_space = true,
            None => {
                if pending_space && !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
                if ch == '\'' || ch == '"' {
                    quote = Some(ch);
                }
                out.push(ch);
            }
        }
    }

    let trimmed = out.trim_end();
    let trimmed = trimmed.strip_suffix(';').unwrap_or(trimmed);
    trimmed.trim().to_string()
}

/// Fail unless every paren is matched and every quote is closed.
pub fn check_balanced(text: &str) -> Result<()> {
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;

    for ch in text.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(DbError::Parse("unbalanced parentheses: unexpected ')'".into()));
                    }
                }
                _ => {}
            },
        }
    }

    if quote.is_some() {
        return Err(DbError::Parse("unterminated quoted literal".into()));
    }
    if depth != 0 {
        return Err(DbError::Parse("unbalanced parentheses: missing ')'".into()));
    }
    Ok(())
}

/// Split on `sep` where it occurs outside parentheses and quotes.
///
/// Pieces are trimmed; an all-blank input yields no pieces.
pub fn split_top_level(text: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;

    for ch in text.chars() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
                current.push(ch);
            }
            None => match ch {
                '\'' | '"' => {
                    quote = Some(ch);
                    current.push(ch);
                }
                '(' => {
                    depth += 1;
                    current.push(ch);
                }
                ')' => {
                    depth -= 1;
                    current.push(ch);
                }
                c if c == sep && depth == 0 => {
                    parts.push(current.trim().to_string());
                    current.clear();
                }
                c => current.push(c),
            },
        }
    }

    if !current.trim().is_empty() || !parts.is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// Byte offset of the first top-level, whole-word, case-insensitive
/// occurrence of `keyword` at or after `from`.
///
/// `keyword` may span several words ("GROUP BY"); any single space in it
/// matches one space of the normalized text.
pub fn find_keyword(text: &str, keyword: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let kw = keyword.as_bytes();
    let mut depth: i32 = 0;
    let mut quote: Option<u8> = None;

    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' => quote = Some(b),
                b'(' => depth += 1,
                b')' => depth -= 1,
                _ if depth == 0 && i >= from && matches_word_at(bytes, i, kw) => return Some(i),
                _ => {}
            },
        }
        i += 1;
    }
    None
}

fn matches_word_at(bytes: &[u8], at: usize, kw: &[u8]) -> bool {
    let end = at + kw.len();
    if end > bytes.len() || !bytes[at..end].eq_ignore_ascii_case(kw) {
        return false;
    }
    let before_ok = at == 0 || !is_word_byte(bytes[at - 1]);
    let after_ok = end == bytes.len() || !is_word_byte(bytes[end]);
    before_ok && after_ok
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// True if `text` contains `keyword` as a top-level word.
pub fn contains_keyword(text: &str, keyword: &str) -> bool {
    find_keyword(text, keyword, 0).is_some()
}

/// Case-insensitive prefix match on whole words; returns the remainder.
pub fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let t = text.trim_start();
    if t.len() < keyword.len() || !t.is_char_boundary(keyword.len()) {
        return None;
    }
    let (head, rest) = t.split_at(keyword.len());
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    if rest.bytes().next().is_some_and(is_word_byte) {
        return None;
    }
    Some(rest.trim_start())
}

/// Remove one level of matching single or double quotes.
pub fn unquote(text: &str) -> &str {
    let t = text.trim();
    if t.len() >= 2 {
        let bytes = t.as_bytes();
        let (first, last) = (bytes[0], bytes[t.len() - 1]);
        if (first == b'\'' || first == b'"') && first == last {
            return &t[1..t.len() - 1];
        }
    }
    t
}

/// Split `name(body)` into `("name", "body")` for the outermost parens.
pub fn split_parenthesized(text: &str) -> Option<(&str, &str)> {
    let open = text.find('(')?;
    let close = text.rfind(')')?;
    if close < open || !text[close + 1..].trim().is_empty() {
        return None;
    }
    Some((text[..open].trim(), text[open + 1..close].trim()))
}

/// Byte offset of the `)` closing the `(` that `text` starts with.
pub fn closing_paren(text: &str) -> Option<usize> {
    if !text.starts_with('(') {
        return None;
    }
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;
    for (i, ch) in text.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            },
        }
    }
    None
}

/// A bare identifier: letters, digits, `_`, not starting with a digit.
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Validate and return an identifier, naming `what` in the error.
pub fn identifier<'a>(text: &'a str, what: &str) -> Result<&'a str> {
    let t = unquote(text);
    if is_identifier(t) {
        Ok(t)
    } else if t.is_empty() {
        Err(DbError::Parse(format!("missing {}", what)))
    } else {
        Err(DbError::Parse(format!("invalid {}: '{}'", what, t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  SELECT   *\n FROM\tt ;  "), "SELECT * FROM t");
        assert_eq!(normalize("INSERT INTO t VALUES ('a  b');"), "INSERT INTO t VALUES ('a  b')");
    }

    #[test]
    fn test_split_respects_nesting_and_quotes() {
        let parts = split_top_level("id INT, price FLOAT DEFAULT '1,5', name VARCHAR(10), FOREIGN KEY (a, b) REFERENCES x(a, b)", ',');
        assert_eq!(
            parts,
            vec![
                "id INT",
                "price FLOAT DEFAULT '1,5'",
                "name VARCHAR(10)",
                "FOREIGN KEY (a, b) REFERENCES x(a, b)"
            ]
        );
        assert!(split_top_level("   ", ',').is_empty());
        assert_eq!(split_top_level("a,", ','), vec!["a", ""]);
    }

    #[test]
    fn test_find_keyword_top_level_only() {
        let sql = "a FROM t WHERE name = 'x where y' AND (b) ORDER BY a";
        assert_eq!(find_keyword(sql, "WHERE", 0), Some(9));
        assert_eq!(find_keyword(sql, "order by", 0), Some(42));
        assert_eq!(find_keyword("fromage FROM t", "FROM", 0), Some(8));
        assert!(find_keyword("x IN (SELECT a FROM b)", "FROM", 0).is_none());
    }

    #[test]
    fn test_closing_paren() {
        assert_eq!(closing_paren("(1, 'a)')"), Some(8));
        assert_eq!(closing_paren("('x'),('y')"), Some(4));
        assert_eq!(closing_paren("(a (b)) c"), Some(6));
        assert_eq!(closing_paren("x (a)"), None);
        assert_eq!(closing_paren("(a"), None);
    }

    #[test]
    fn test_check_balanced() {
        assert!(check_balanced("t(a INT, b VARCHAR(2))").is_ok());
        assert!(check_balanced("t(a INT").is_err());
        assert!(check_balanced("VALUES ('abc)").is_err());
        assert!(check_balanced("VALUES (')')").is_ok());
    }

    #[test]
    fn test_strip_keyword_and_unquote() {
        assert_eq!(strip_keyword("if not exists foo", "IF NOT EXISTS"), Some("foo"));
        assert_eq!(strip_keyword("IFX foo", "IF"), None);
        assert_eq!(unquote("'ab'"), "ab");
        assert_eq!(unquote("\"ab\""), "ab");
        assert_eq!(unquote("'ab\""), "'ab\"");
    }

    #[test]
    fn test_split_parenthesized() {
        assert_eq!(split_parenthesized("users (id INT)"), Some(("users", "id INT")));
        assert_eq!(split_parenthesized("users (id INT) x"), None);
        assert_eq!(split_parenthesized("users"), None);
    }
}
