//! Formula compilation for the analytics layer.
//!
//! This module provides:
//! - Formula AST representation
//! - Mode-keyed evaluation: concrete value, all-paths description, SQL
//! - Mixed-type value comparison
//! - Evaluation contexts and leaf-reference resolution

pub mod compare;
pub mod context;
pub mod error;
pub mod expr;
pub mod function;
pub mod operator;
pub mod value;
pub mod visitor;

pub use compare::{compare, values_equal, Comparison};
pub use context::{EvaluationContext, ItemResolver};
pub use error::{ExpressionError, ExpressionResult};
pub use expr::{Expression, FunctionCall, ItemKind, ItemRef};
pub use function::{Arity, Function};
pub use operator::{BinaryOperator, UnaryOperator};
pub use value::{DataType, Value};
pub use visitor::{
    describe_expression, evaluate_expression, expression_to_predicate, expression_to_sql,
    Evaluated, EvaluationMode, ExpressionVisitor, RulePredicate,
};
