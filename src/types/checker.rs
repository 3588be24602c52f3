/// Value/type checker: turns a raw literal into a typed value for a declared column type
use super::{ColumnType, Literal, Value};
use crate::error::{DbError, Result};

/// Convert `literal` to a value of `declared` type.
///
/// NULL always checks as a valid null; whether a null is permitted is the
/// constraint engine's decision. TIMESTAMP text is not calendar-validated.
pub fn check_type(column: &str, literal: &Literal, declared: ColumnType) -> Result<Value> {
    if literal.is_null() {
        return Ok(Value::Null);
    }

    match declared {
        ColumnType::Int => to_int(column, literal).map(Value::Integer),
        ColumnType::Float => to_float(column, literal).map(Value::Float),
        ColumnType::Varchar(max) => {
            let s = literal.to_string();
            let len = s.chars().count();
            if len > max {
                return Err(DbError::VarcharLength {
                    column: column.to_string(),
                    len,
                    max,
                });
            }
            Ok(Value::Text(s))
        }
        ColumnType::Text | ColumnType::Timestamp => Ok(Value::Text(literal.to_string())),
    }
}

fn to_int(column: &str, literal: &Literal) -> Result<i64> {
    match literal {
        Literal::Integer(i) => Ok(*i),
        Literal::Float(f) if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 => {
            Ok(*f as i64)
        }
        Literal::Float(f) => Err(DbError::type_error(column, format!("invalid INT: {:?}", f))),
        Literal::Bool(_) => Err(DbError::type_error(column, "invalid INT: boolean value")),
        Literal::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| DbError::type_error(column, format!("invalid INT: '{}'", s))),
        Literal::Null => Err(DbError::type_error(column, "invalid INT: NULL")),
    }
}

fn to_float(column: &str, literal: &Literal) -> Result<f64> {
    let parsed = match literal {
        Literal::Integer(i) => Some(*i as f64),
        Literal::Float(f) => Some(*f),
        Literal::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        Literal::Bool(_) | Literal::Null => None,
    };
    parsed.ok_or_else(|| DbError::type_error(column, format!("invalid FLOAT: '{}'", literal)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Literal::Integer(5), ColumnType::Int, Value::Integer(5))]
    #[case(Literal::Text("12".into()), ColumnType::Int, Value::Integer(12))]
    #[case(Literal::Float(4.0), ColumnType::Int, Value::Integer(4))]
    #[case(Literal::Integer(2), ColumnType::Float, Value::Float(2.0))]
    #[case(Literal::Text("2.5".into()), ColumnType::Float, Value::Float(2.5))]
    #[case(Literal::Integer(42), ColumnType::Varchar(2), Value::Text("42".into()))]
    #[case(Literal::Text("ab".into()), ColumnType::Varchar(5), Value::Text("ab".into()))]
    #[case(Literal::Text("2024-01-01".into()), ColumnType::Timestamp, Value::Text("2024-01-01".into()))]
    #[case(Literal::Null, ColumnType::Int, Value::Null)]
    fn test_accepts(#[case] input: Literal, #[case] declared: ColumnType, #[case] expected: Value) {
        assert_eq!(check_type("c", &input, declared).unwrap(), expected);
    }

    #[rstest]
    #[case(Literal::Bool(true), ColumnType::Int, "type_error")]
    #[case(Literal::Text("abc".into()), ColumnType::Int, "type_error")]
    #[case(Literal::Float(3.7), ColumnType::Int, "type_error")]
    #[case(Literal::Text("x".into()), ColumnType::Float, "type_error")]
    #[case(Literal::Text("toolong".into()), ColumnType::Varchar(5), "varchar_length_exceeded")]
    fn test_rejects(#[case] input: Literal, #[case] declared: ColumnType, #[case] code: &str) {
        let err = check_type("c", &input, declared).unwrap_err();
        assert_eq!(err.code(), code);
    }

    #[test]
    fn test_varchar_boundary() {
        let exact = Literal::Text("abcde".into());
        assert_eq!(
            check_type("name", &exact, ColumnType::Varchar(5)).unwrap(),
            Value::Text("abcde".into())
        );

        let over = Literal::Text("abcdef".into());
        let err = check_type("name", &over, ColumnType::Varchar(5)).unwrap_err();
        assert!(err.to_string().contains("VARCHAR length exceeded"));
    }

    #[test]
    fn test_varchar_counts_characters() {
        let accented = Literal::Text("héllo".into());
        assert!(check_type("name", &accented, ColumnType::Varchar(5)).is_ok());
    }
}
