//! Error types for formula compilation.

use crate::expression::value::DataType;
use thiserror::Error;

/// Errors that can occur while building or walking a formula tree.
///
/// `Arity` and `Mode` are structural: they abort the whole compilation and
/// are never recovered. `TypeMismatch` is a data-shape error reported per
/// evaluation; the calling layer decides whether to skip, default, or reject.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    /// A function was constructed with the wrong number of operands
    #[error("function {function} expects {expected} operands, got {actual}")]
    Arity {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Operands cannot be coerced to a common orderable type
    #[error("cannot coerce operands in {context}: left={left:?}, right={right:?}")]
    TypeMismatch {
        left: Option<DataType>,
        right: Option<DataType>,
        context: String,
    },

    /// An operation was invoked in a mode that does not support it
    #[error("{operation} is not available in {mode} mode")]
    Mode { operation: String, mode: String },
}

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExpressionError::Arity {
            function: "is".to_string(),
            expected: "at least 2".to_string(),
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "function is expects at least 2 operands, got 1"
        );

        let err = ExpressionError::TypeMismatch {
            left: Some(DataType::Number),
            right: Some(DataType::Boolean),
            context: "comparison".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot coerce operands in comparison: left=Some(Number), right=Some(Boolean)"
        );

        let err = ExpressionError::Mode {
            operation: "cast_string_visit".to_string(),
            mode: "value".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cast_string_visit is not available in value mode"
        );
    }
}
