//! Built-in functions of the formula language.

use crate::expression::error::{ExpressionError, ExpressionResult};

/// The closed set of built-in functions.
///
/// Each variant fixes its operand-count contract; see [`Function::arity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    /// First operand compares equal to any of the remaining operands
    IsIn,
    /// Conditional: condition, then-branch, else-branch
    If,
    /// First operand that is not missing
    Coalesce,
    /// Whether the operand resolves to a present value
    HasValue,
    /// Smallest non-missing operand
    Least,
    /// Largest non-missing operand
    Greatest,
    /// Number of non-missing operands
    Count,
    /// Operands joined as text
    Concat,
}

/// Operand-count contract for a function variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Function {
    /// Get the formula-language name of this function
    pub fn name(&self) -> &'static str {
        match self {
            Function::IsIn => "is",
            Function::If => "if",
            Function::Coalesce => "firstNonNull",
            Function::HasValue => "hasValue",
            Function::Least => "least",
            Function::Greatest => "greatest",
            Function::Count => "count",
            Function::Concat => "concatenate",
        }
    }

    /// Get the operand-count contract of this function
    pub fn arity(&self) -> Arity {
        match self {
            Function::IsIn => Arity::AtLeast(2),
            Function::If => Arity::Exactly(3),
            Function::Coalesce => Arity::AtLeast(1),
            Function::HasValue => Arity::Exactly(1),
            Function::Least => Arity::AtLeast(1),
            Function::Greatest => Arity::AtLeast(1),
            Function::Count => Arity::AtLeast(1),
            Function::Concat => Arity::AtLeast(1),
        }
    }

    /// Validate an operand count against this function's contract.
    ///
    /// Runs when a call node is built; evaluation assumes every call it sees
    /// is well-formed.
    pub(crate) fn check_arity(&self, actual: usize) -> ExpressionResult<()> {
        let ok = match self.arity() {
            Arity::Exactly(n) => actual == n,
            Arity::AtLeast(n) => actual >= n,
        };
        if ok {
            return Ok(());
        }
        let expected = match self.arity() {
            Arity::Exactly(n) => format!("exactly {}", n),
            Arity::AtLeast(n) => format!("at least {}", n),
        };
        Err(ExpressionError::Arity {
            function: self.name().to_string(),
            expected,
            actual,
        })
    }
}
