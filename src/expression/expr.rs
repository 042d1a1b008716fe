//! Formula AST definitions.

use crate::expression::error::ExpressionResult;
use crate::expression::function::Function;
use crate::expression::operator::{BinaryOperator, UnaryOperator};
use crate::expression::value::Value;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kinds of data items a formula can reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    DataElement,
    TrackedEntityAttribute,
    ProgramVariable,
}

/// Reference to a resolved data item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    pub kind: ItemKind,
    pub uid: String,
}

impl ItemRef {
    pub fn new(kind: ItemKind, uid: impl Into<String>) -> Self {
        Self {
            kind,
            uid: uid.into(),
        }
    }

    pub fn data_element(uid: impl Into<String>) -> Self {
        Self::new(ItemKind::DataElement, uid)
    }

    pub fn attribute(uid: impl Into<String>) -> Self {
        Self::new(ItemKind::TrackedEntityAttribute, uid)
    }

    pub fn variable(uid: impl Into<String>) -> Self {
        Self::new(ItemKind::ProgramVariable, uid)
    }
}

/// A call to one of the built-in functions.
///
/// Operand counts are validated here, when the node is built; an
/// ill-formed call cannot exist. Fields stay private for that reason.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    function: Function,
    args: Vec<Expression>,
}

impl FunctionCall {
    /// Build a call node, validating the operand count
    pub fn new(function: Function, args: Vec<Expression>) -> ExpressionResult<Self> {
        function.check_arity(args.len())?;
        Ok(Self { function, args })
    }

    pub fn function(&self) -> Function {
        self.function
    }

    pub fn args(&self) -> &[Expression] {
        &self.args
    }
}

/// Formula tree node.
///
/// Nodes are immutable once built; each child is owned exclusively by its
/// parent, so a tree can be walked by any number of visitors concurrently.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal constant value
    Literal(Value),

    /// Data item reference
    Item(ItemRef),

    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// Built-in function call
    Function(FunctionCall),
}

impl Expression {
    /// Create a literal expression
    pub fn literal(value: Value) -> Self {
        Expression::Literal(value)
    }

    /// Create a numeric literal
    pub fn number(value: f64) -> Self {
        Expression::Literal(Value::Number(value))
    }

    /// Create a text literal
    pub fn text(value: impl Into<String>) -> Self {
        Expression::Literal(Value::Text(value.into()))
    }

    /// Create a boolean literal
    pub fn boolean(value: bool) -> Self {
        Expression::Literal(Value::Boolean(value))
    }

    /// Create a date literal
    pub fn date(value: NaiveDate) -> Self {
        Expression::Literal(Value::Date(value))
    }

    /// Create the missing literal
    pub fn missing() -> Self {
        Expression::Literal(Value::Missing)
    }

    /// Create a data item reference expression
    pub fn item(item: ItemRef) -> Self {
        Expression::Item(item)
    }

    /// Create a data element reference
    pub fn data_element(uid: impl Into<String>) -> Self {
        Expression::Item(ItemRef::data_element(uid))
    }

    /// Create a tracked-entity attribute reference
    pub fn attribute(uid: impl Into<String>) -> Self {
        Expression::Item(ItemRef::attribute(uid))
    }

    /// Create a program variable reference
    pub fn variable(uid: impl Into<String>) -> Self {
        Expression::Item(ItemRef::variable(uid))
    }

    /// Create a binary operation expression
    pub fn binary_op(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Create a unary operation expression
    pub fn unary_op(op: UnaryOperator, operand: Expression) -> Self {
        Expression::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    /// Create an AND expression
    pub fn and(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::And, left, right)
    }

    /// Create an OR expression
    pub fn or(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Or, left, right)
    }

    /// Create a NOT expression
    pub fn not_expr(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::Not, operand)
    }

    /// Create an equality expression
    pub fn eq(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Eq, left, right)
    }

    /// Create a not-equal expression
    pub fn ne(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Ne, left, right)
    }

    /// Create a less-than expression
    pub fn lt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Lt, left, right)
    }

    /// Create a less-than-or-equal expression
    pub fn le(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Le, left, right)
    }

    /// Create a greater-than expression
    pub fn gt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Gt, left, right)
    }

    /// Create a greater-than-or-equal expression
    pub fn ge(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Ge, left, right)
    }

    /// Create an addition expression
    pub fn add_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Add, left, right)
    }

    /// Create a subtraction expression
    pub fn sub_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Sub, left, right)
    }

    /// Create a multiplication expression
    pub fn mul_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Mul, left, right)
    }

    /// Create a division expression
    pub fn div_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Div, left, right)
    }

    /// Create a function call expression, validating arity
    pub fn function(function: Function, args: Vec<Expression>) -> ExpressionResult<Self> {
        Ok(Expression::Function(FunctionCall::new(function, args)?))
    }

    /// Create an is-one-of expression: `target` compares equal to any candidate
    pub fn is_in(target: Expression, candidates: Vec<Expression>) -> ExpressionResult<Self> {
        let mut args = vec![target];
        args.extend(candidates);
        Self::function(Function::IsIn, args)
    }

    /// Create a conditional expression
    pub fn if_expr(
        condition: Expression,
        then_branch: Expression,
        else_branch: Expression,
    ) -> ExpressionResult<Self> {
        Self::function(Function::If, vec![condition, then_branch, else_branch])
    }

    /// Create a first-non-missing expression
    pub fn coalesce(args: Vec<Expression>) -> ExpressionResult<Self> {
        Self::function(Function::Coalesce, args)
    }

    /// Create a presence test for a data item
    pub fn has_value(item: ItemRef) -> ExpressionResult<Self> {
        Self::function(Function::HasValue, vec![Expression::Item(item)])
    }

    /// Check if this expression is a constant (references no data items)
    pub fn is_constant(&self) -> bool {
        match self {
            Expression::Literal(_) => true,
            Expression::Item(_) => false,
            Expression::BinaryOp { left, right, .. } => left.is_constant() && right.is_constant(),
            Expression::UnaryOp { operand, .. } => operand.is_constant(),
            Expression::Function(call) => call.args().iter().all(|arg| arg.is_constant()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::error::ExpressionError;

    #[test]
    fn test_item_ref() {
        let item = ItemRef::data_element("de_weight");
        assert_eq!(item.kind, ItemKind::DataElement);
        assert_eq!(item.uid, "de_weight");

        let item = ItemRef::attribute("at_sex");
        assert_eq!(item.kind, ItemKind::TrackedEntityAttribute);
    }

    #[test]
    fn test_expression_builders() {
        let expr = Expression::number(10.0);
        assert!(matches!(expr, Expression::Literal(Value::Number(_))));

        let expr = Expression::literal(Value::Boolean(true));
        assert!(matches!(expr, Expression::Literal(Value::Boolean(true))));

        let expr = Expression::data_element("de_a");
        assert!(matches!(expr, Expression::Item(_)));

        let expr = Expression::gt(Expression::data_element("de_age"), Expression::number(18.0));
        assert!(matches!(expr, Expression::BinaryOp { .. }));

        let expr = Expression::and(
            Expression::eq(Expression::data_element("de_a"), Expression::number(1.0)),
            Expression::not_expr(Expression::boolean(false)),
        );
        assert!(matches!(expr, Expression::BinaryOp { .. }));
    }

    #[test]
    fn test_function_arity_checked_at_construction() {
        // One child for a >= 2 function fails before any evaluation
        let err = Expression::is_in(Expression::data_element("de_a"), vec![]).unwrap_err();
        assert!(matches!(err, ExpressionError::Arity { actual: 1, .. }));

        let ok = Expression::is_in(
            Expression::data_element("de_a"),
            vec![Expression::text("X"), Expression::text("Y")],
        );
        assert!(ok.is_ok());

        assert!(Expression::coalesce(vec![]).is_err());
        assert!(Expression::function(Function::If, vec![Expression::boolean(true)]).is_err());
    }

    #[test]
    fn test_is_constant() {
        assert!(Expression::number(42.0).is_constant());
        assert!(!Expression::data_element("de_a").is_constant());
        assert!(Expression::add_expr(Expression::number(1.0), Expression::number(2.0)).is_constant());
        assert!(!Expression::add_expr(Expression::data_element("de_a"), Expression::number(2.0))
            .is_constant());

        let call = Expression::is_in(
            Expression::text("X"),
            vec![Expression::text("Y"), Expression::data_element("de_a")],
        )
        .unwrap();
        assert!(!call.is_constant());
    }
}
