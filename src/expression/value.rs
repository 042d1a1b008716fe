use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Operand types a formula can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Number,
    Text,
    Date,
}

/// Values produced by evaluating formula sub-trees.
///
/// `Missing` is a first-class outcome of context lookup, not an error:
/// equality against it is false, arithmetic over it stays missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Missing,
    Boolean(bool),
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl Value {
    /// Get the data type of this value
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Missing => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Number(_) => Some(DataType::Number),
            Value::Text(_) => Some(DataType::Text),
            Value::Date(_) => Some(DataType::Date),
        }
    }

    /// Check whether this value is the missing sentinel
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Boolean reading of this value, if it has one.
    ///
    /// Resolved health data arrives as text more often than not, so the
    /// textual spellings of the two booleans count, as does the numeric
    /// zero/non-zero convention.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Number(n) => Some(*n != 0.0),
            Value::Text(s) if s.trim().eq_ignore_ascii_case("true") => Some(true),
            Value::Text(s) if s.trim().eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    /// Numeric reading of this value, if it has one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Textual rendering of this value; `None` when missing
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Missing => None,
            Value::Boolean(b) => Some(b.to_string()),
            Value::Number(n) => Some(format_number(*n)),
            Value::Text(s) => Some(s.clone()),
            Value::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }

    /// Render this value as a SQL literal
    pub fn sql_literal(&self) -> String {
        match self {
            Value::Missing => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Text(s) => sql_quote(s),
            Value::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
        }
    }
}

/// Format a number the way the formula language writes it: integral values
/// without a fractional part.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Quote a string as a SQL text literal, doubling embedded quotes
pub fn sql_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
