//! Total-order comparison across mixed operand types.
//!
//! Every equality-based function goes through [`values_equal`] so that
//! missing-value handling is consistent engine-wide.

use crate::expression::error::{ExpressionError, ExpressionResult};
use crate::expression::value::Value;
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Outcome of comparing two operand values.
///
/// `Incomparable` is the sentinel for a missing operand on either side; it is
/// a normal outcome, not an error. Operands that cannot be coerced to a
/// common orderable type fail with `TypeMismatch` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Less,
    Equal,
    Greater,
    Incomparable,
}

impl Comparison {
    /// Check whether this outcome means the operands compared equal
    pub fn is_equal(self) -> bool {
        self == Comparison::Equal
    }

    /// -1/0/+1 for the ordered outcomes; `None` for `Incomparable`
    pub fn as_sign(self) -> Option<i32> {
        match self {
            Comparison::Less => Some(-1),
            Comparison::Equal => Some(0),
            Comparison::Greater => Some(1),
            Comparison::Incomparable => None,
        }
    }

    fn from_ordering(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => Comparison::Less,
            Ordering::Equal => Comparison::Equal,
            Ordering::Greater => Comparison::Greater,
        }
    }
}

/// Compare two operand values.
///
/// Numbers order numerically, text lexically, dates chronologically. A text
/// operand paired with a number or a date is coerced; a coercion that fails
/// is a `TypeMismatch`. A missing operand on either side is `Incomparable`.
pub fn compare(a: &Value, b: &Value) -> ExpressionResult<Comparison> {
    let ordering = match (a, b) {
        (Value::Missing, _) | (_, Value::Missing) => return Ok(Comparison::Incomparable),

        (Value::Number(x), Value::Number(y)) => x.total_cmp(y),
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
        (Value::Date(x), Value::Date(y)) => x.cmp(y),

        (Value::Number(x), Value::Text(s)) => match numeric(s) {
            Some(y) => x.total_cmp(&y),
            None => return Err(mismatch(a, b)),
        },
        (Value::Text(s), Value::Number(y)) => match numeric(s) {
            Some(x) => x.total_cmp(y),
            None => return Err(mismatch(a, b)),
        },

        (Value::Date(x), Value::Text(s)) => match iso_date(s) {
            Some(y) => x.cmp(&y),
            None => return Err(mismatch(a, b)),
        },
        (Value::Text(s), Value::Date(y)) => match iso_date(s) {
            Some(x) => x.cmp(y),
            None => return Err(mismatch(a, b)),
        },

        _ => return Err(mismatch(a, b)),
    };
    Ok(Comparison::from_ordering(ordering))
}

/// Equality building block shared by every equality-based function:
/// incomparable operands are simply not equal.
pub fn values_equal(a: &Value, b: &Value) -> ExpressionResult<bool> {
    Ok(compare(a, b)?.is_equal())
}

fn numeric(s: &str) -> Option<f64> {
    s.trim().parse().ok()
}

fn iso_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

fn mismatch(a: &Value, b: &Value) -> ExpressionError {
    ExpressionError::TypeMismatch {
        left: a.data_type(),
        right: b.data_type(),
        context: "comparison".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn date(y: i32, m: u32, d: u32) -> Value {
        Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_numeric_ordering() {
        assert_eq!(compare(&num(1.0), &num(2.0)).unwrap(), Comparison::Less);
        assert_eq!(compare(&num(2.0), &num(2.0)).unwrap(), Comparison::Equal);
        assert_eq!(compare(&num(3.0), &num(2.0)).unwrap(), Comparison::Greater);
    }

    #[test]
    fn test_lexical_ordering() {
        assert_eq!(compare(&text("abc"), &text("abd")).unwrap(), Comparison::Less);
        assert_eq!(compare(&text("abc"), &text("abc")).unwrap(), Comparison::Equal);
        // Lexical, not numeric: "10" sorts before "9"
        assert_eq!(compare(&text("10"), &text("9")).unwrap(), Comparison::Less);
    }

    #[test]
    fn test_numeric_coercion_of_text() {
        assert_eq!(compare(&num(10.0), &text("10")).unwrap(), Comparison::Equal);
        assert_eq!(compare(&text("2.5"), &num(3.0)).unwrap(), Comparison::Less);
        assert!(matches!(
            compare(&num(1.0), &text("abc")),
            Err(ExpressionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_date_ordering() {
        assert_eq!(
            compare(&date(2024, 1, 1), &date(2024, 6, 1)).unwrap(),
            Comparison::Less
        );
        assert_eq!(
            compare(&date(2024, 6, 1), &text("2024-06-01")).unwrap(),
            Comparison::Equal
        );
        assert!(matches!(
            compare(&date(2024, 6, 1), &text("June")),
            Err(ExpressionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_is_incomparable() {
        assert_eq!(
            compare(&Value::Missing, &num(1.0)).unwrap(),
            Comparison::Incomparable
        );
        assert_eq!(
            compare(&text("x"), &Value::Missing).unwrap(),
            Comparison::Incomparable
        );
        assert_eq!(
            compare(&Value::Missing, &Value::Missing).unwrap(),
            Comparison::Incomparable
        );
        // Equality against missing is false, never an error
        assert!(!values_equal(&Value::Missing, &num(1.0)).unwrap());
    }

    #[test]
    fn test_cross_type_mismatch() {
        assert!(matches!(
            compare(&Value::Boolean(true), &num(1.0)),
            Err(ExpressionError::TypeMismatch { .. })
        ));
        assert!(matches!(
            compare(&date(2024, 1, 1), &num(20240101.0)),
            Err(ExpressionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_symmetry_and_reflexivity() {
        let values = [num(1.0), num(2.0), text("a"), text("b"), date(2024, 1, 1)];
        for v in &values {
            assert_eq!(compare(v, v).unwrap().as_sign(), Some(0));
        }
        for a in &values {
            for b in &values {
                let forward = compare(a, b);
                let backward = compare(b, a);
                match (forward, backward) {
                    (Ok(f), Ok(r)) => {
                        assert_eq!(f.as_sign().unwrap(), -r.as_sign().unwrap());
                    }
                    (Err(_), Err(_)) => {}
                    (f, r) => panic!("asymmetric outcomes: {:?} vs {:?}", f, r),
                }
            }
        }
    }
}
