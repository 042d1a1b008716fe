//! Mode-keyed traversal of formula trees.
//!
//! One visitor performs one depth-first, left-to-right walk in one of three
//! modes: compute a concrete value, compute while visiting every branch (for
//! validation-rule description), or translate to an equivalent SQL fragment.
//! The mode is fixed when the visitor is built; a different mode needs a new
//! visitor.

use crate::expression::compare::{compare, values_equal, Comparison};
use crate::expression::context::ItemResolver;
use crate::expression::error::{ExpressionError, ExpressionResult};
use crate::expression::expr::{Expression, FunctionCall};
use crate::expression::function::Function;
use crate::expression::operator::{BinaryOperator, UnaryOperator};
use crate::expression::value::Value;

/// Which of the three interpretations a walk performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationMode {
    /// Compute one concrete result from live data
    Value,
    /// Compute the same result while visiting every branch unconditionally
    AllPaths,
    /// Emit an equivalent SQL expression; no data is evaluated
    Sql,
}

impl EvaluationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationMode::Value => "value",
            EvaluationMode::AllPaths => "all-paths",
            EvaluationMode::Sql => "sql",
        }
    }
}

/// Output of one visit, keyed by the visitor's mode
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluated {
    Value(Value),
    Sql(String),
}

impl Evaluated {
    /// The computed value; `None` if this came from a SQL-mode walk
    pub fn value(self) -> Option<Value> {
        match self {
            Evaluated::Value(v) => Some(v),
            Evaluated::Sql(_) => None,
        }
    }

    /// The SQL fragment; `None` if this came from a value-mode walk
    pub fn sql(self) -> Option<String> {
        match self {
            Evaluated::Value(_) => None,
            Evaluated::Sql(s) => Some(s),
        }
    }
}

/// Single re-entrant traversal engine for formula trees.
///
/// Holds the mode (immutable for the walk) and the leaf-conversion delegate.
/// Trees are immutable, so any number of visitors may walk the same tree
/// concurrently, each with its own context.
pub struct ExpressionVisitor<'a> {
    mode: EvaluationMode,
    resolver: &'a dyn ItemResolver,
}

impl<'a> ExpressionVisitor<'a> {
    pub fn new(mode: EvaluationMode, resolver: &'a dyn ItemResolver) -> Self {
        Self { mode, resolver }
    }

    /// Visitor that computes a concrete value
    pub fn for_values(resolver: &'a dyn ItemResolver) -> Self {
        Self::new(EvaluationMode::Value, resolver)
    }

    /// Visitor that computes the value while visiting every branch
    pub fn for_all_paths(resolver: &'a dyn ItemResolver) -> Self {
        Self::new(EvaluationMode::AllPaths, resolver)
    }

    /// Visitor that translates to SQL
    pub fn for_sql(resolver: &'a dyn ItemResolver) -> Self {
        Self::new(EvaluationMode::Sql, resolver)
    }

    pub fn mode(&self) -> EvaluationMode {
        self.mode
    }

    /// Walk one node, producing the mode-keyed output
    pub fn visit(&self, expr: &Expression) -> ExpressionResult<Evaluated> {
        match self.mode {
            EvaluationMode::Value | EvaluationMode::AllPaths => {
                self.visit_value(expr).map(Evaluated::Value)
            }
            EvaluationMode::Sql => self.visit_sql(expr).map(Evaluated::Sql),
        }
    }

    /// Force a child's SQL form to read as a text expression.
    ///
    /// Only meaningful while translating; calling it in a value mode is a
    /// programmer error.
    pub fn cast_string_visit(&self, expr: &Expression) -> ExpressionResult<String> {
        if self.mode != EvaluationMode::Sql {
            return Err(ExpressionError::Mode {
                operation: "cast_string_visit".to_string(),
                mode: self.mode.as_str().to_string(),
            });
        }
        match expr {
            // Text literals already read as strings
            Expression::Literal(Value::Text(_)) => self.visit_sql(expr),
            _ => Ok(format!("cast({} as text)", self.visit_sql(expr)?)),
        }
    }

    fn visit_value(&self, expr: &Expression) -> ExpressionResult<Value> {
        match expr {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Item(item) => Ok(self.resolver.resolve(item)),
            Expression::BinaryOp { op, left, right } => self.eval_binary(*op, left, right),
            Expression::UnaryOp { op, operand } => self.eval_unary(*op, operand),
            Expression::Function(call) => self.eval_function(call),
        }
    }

    fn eval_binary(
        &self,
        op: BinaryOperator,
        left: &Expression,
        right: &Expression,
    ) -> ExpressionResult<Value> {
        match op {
            BinaryOperator::And => self.eval_logical(true, left, right),
            BinaryOperator::Or => self.eval_logical(false, left, right),

            BinaryOperator::Add
            | BinaryOperator::Sub
            | BinaryOperator::Mul
            | BinaryOperator::Div => self.eval_arithmetic(op, left, right),

            BinaryOperator::Eq
            | BinaryOperator::Ne
            | BinaryOperator::Lt
            | BinaryOperator::Le
            | BinaryOperator::Gt
            | BinaryOperator::Ge => self.eval_comparison(op, left, right),
        }
    }

    /// `&&` / `||` with the usual shortcuts around missing operands:
    /// a false conjunct or a true disjunct decides alone.
    fn eval_logical(
        &self,
        conjunction: bool,
        left: &Expression,
        right: &Expression,
    ) -> ExpressionResult<Value> {
        let spelling = if conjunction { "&&" } else { "||" };
        let lhs = self.truth_of(&self.visit_value(left)?, spelling)?;

        // The all-paths mode must still visit the right child
        if self.mode != EvaluationMode::AllPaths && lhs == Some(!conjunction) {
            return Ok(Value::Boolean(!conjunction));
        }

        let rhs = self.truth_of(&self.visit_value(right)?, spelling)?;
        let outcome = if conjunction {
            match (lhs, rhs) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            }
        } else {
            match (lhs, rhs) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            }
        };
        Ok(outcome.map(Value::Boolean).unwrap_or(Value::Missing))
    }

    fn eval_arithmetic(
        &self,
        op: BinaryOperator,
        left: &Expression,
        right: &Expression,
    ) -> ExpressionResult<Value> {
        let lhs = self.visit_value(left)?;
        let rhs = self.visit_value(right)?;
        if lhs.is_missing() || rhs.is_missing() {
            return Ok(Value::Missing);
        }
        let a = self.number_of(&lhs, op.as_str())?;
        let b = self.number_of(&rhs, op.as_str())?;
        let result = match op {
            BinaryOperator::Add => a + b,
            BinaryOperator::Sub => a - b,
            BinaryOperator::Mul => a * b,
            BinaryOperator::Div => {
                // Matches the generated `a / nullif(b, 0)` fragment
                if b == 0.0 {
                    return Ok(Value::Missing);
                }
                a / b
            }
            _ => unreachable!("not an arithmetic operator"),
        };
        Ok(Value::Number(result))
    }

    fn eval_comparison(
        &self,
        op: BinaryOperator,
        left: &Expression,
        right: &Expression,
    ) -> ExpressionResult<Value> {
        let lhs = self.visit_value(left)?;
        let rhs = self.visit_value(right)?;
        let cmp = compare(&lhs, &rhs)?;
        let result = match op {
            BinaryOperator::Eq => cmp.is_equal(),
            BinaryOperator::Ne => !cmp.is_equal(),
            BinaryOperator::Lt => cmp == Comparison::Less,
            BinaryOperator::Le => matches!(cmp, Comparison::Less | Comparison::Equal),
            BinaryOperator::Gt => cmp == Comparison::Greater,
            BinaryOperator::Ge => matches!(cmp, Comparison::Greater | Comparison::Equal),
            _ => unreachable!("not a comparison operator"),
        };
        Ok(Value::Boolean(result))
    }

    fn eval_unary(&self, op: UnaryOperator, operand: &Expression) -> ExpressionResult<Value> {
        let value = self.visit_value(operand)?;
        if value.is_missing() {
            return Ok(Value::Missing);
        }
        match op {
            UnaryOperator::Not => {
                let b = self.truth_of(&value, "!")?;
                Ok(b.map(|b| Value::Boolean(!b)).unwrap_or(Value::Missing))
            }
            UnaryOperator::Plus => Ok(Value::Number(self.number_of(&value, "+")?)),
            UnaryOperator::Minus => Ok(Value::Number(-self.number_of(&value, "-")?)),
        }
    }

    fn eval_function(&self, call: &FunctionCall) -> ExpressionResult<Value> {
        let args = call.args();
        match call.function() {
            Function::IsIn => self.eval_is_in(args),
            Function::If => self.eval_if(args),
            Function::Coalesce => self.eval_coalesce(args),
            Function::HasValue => Ok(Value::Boolean(!self.visit_value(&args[0])?.is_missing())),
            Function::Least => self.eval_extremum(args, Comparison::Less),
            Function::Greatest => self.eval_extremum(args, Comparison::Greater),
            Function::Count => self.eval_count(args),
            Function::Concat => self.eval_concat(args),
        }
    }

    /// First operand is the reference value; the rest compare against it.
    /// Lazy in value mode, exhaustive in all-paths mode, same boolean either
    /// way for a fully-resolved context.
    fn eval_is_in(&self, args: &[Expression]) -> ExpressionResult<Value> {
        let target = self.visit_value(&args[0])?;
        if self.mode == EvaluationMode::AllPaths {
            let mut found = false;
            for candidate in &args[1..] {
                let value = self.visit_value(candidate)?;
                if values_equal(&target, &value)? {
                    found = true;
                }
            }
            Ok(Value::Boolean(found))
        } else {
            for candidate in &args[1..] {
                let value = self.visit_value(candidate)?;
                if values_equal(&target, &value)? {
                    return Ok(Value::Boolean(true));
                }
            }
            Ok(Value::Boolean(false))
        }
    }

    /// A condition that is not true selects the else branch, matching the
    /// generated `case when` fragment.
    fn eval_if(&self, args: &[Expression]) -> ExpressionResult<Value> {
        let condition = self.truth_of(&self.visit_value(&args[0])?, "if")?;
        if self.mode == EvaluationMode::AllPaths {
            let then_value = self.visit_value(&args[1])?;
            let else_value = self.visit_value(&args[2])?;
            Ok(if condition == Some(true) {
                then_value
            } else {
                else_value
            })
        } else if condition == Some(true) {
            self.visit_value(&args[1])
        } else {
            self.visit_value(&args[2])
        }
    }

    fn eval_coalesce(&self, args: &[Expression]) -> ExpressionResult<Value> {
        if self.mode == EvaluationMode::AllPaths {
            let mut first = Value::Missing;
            for arg in args {
                let value = self.visit_value(arg)?;
                if first.is_missing() && !value.is_missing() {
                    first = value;
                }
            }
            Ok(first)
        } else {
            for arg in args {
                let value = self.visit_value(arg)?;
                if !value.is_missing() {
                    return Ok(value);
                }
            }
            Ok(Value::Missing)
        }
    }

    /// Fold the operands by comparison, skipping missing ones. Needs every
    /// operand in any mode, so value and all-paths walks coincide here.
    fn eval_extremum(&self, args: &[Expression], keep: Comparison) -> ExpressionResult<Value> {
        let mut best: Option<Value> = None;
        for arg in args {
            let value = self.visit_value(arg)?;
            if value.is_missing() {
                continue;
            }
            best = Some(match best {
                None => value,
                Some(current) => {
                    if compare(&value, &current)? == keep {
                        value
                    } else {
                        current
                    }
                }
            });
        }
        Ok(best.unwrap_or(Value::Missing))
    }

    fn eval_count(&self, args: &[Expression]) -> ExpressionResult<Value> {
        let mut present = 0usize;
        for arg in args {
            if !self.visit_value(arg)?.is_missing() {
                present += 1;
            }
        }
        Ok(Value::Number(present as f64))
    }

    fn eval_concat(&self, args: &[Expression]) -> ExpressionResult<Value> {
        let mut joined = String::new();
        let mut missing = false;
        for arg in args {
            let value = self.visit_value(arg)?;
            match value.to_text() {
                Some(text) => joined.push_str(&text),
                None => {
                    // A missing piece sinks the whole concatenation
                    if self.mode != EvaluationMode::AllPaths {
                        return Ok(Value::Missing);
                    }
                    missing = true;
                }
            }
        }
        if missing {
            Ok(Value::Missing)
        } else {
            Ok(Value::Text(joined))
        }
    }

    fn visit_sql(&self, expr: &Expression) -> ExpressionResult<String> {
        match expr {
            Expression::Literal(value) => Ok(value.sql_literal()),
            Expression::Item(item) => Ok(self.resolver.sql_column(item)),
            Expression::BinaryOp { op, left, right } => self.sql_binary(*op, left, right),
            Expression::UnaryOp { op, operand } => self.sql_unary(*op, operand),
            Expression::Function(call) => self.sql_function(call),
        }
    }

    fn sql_binary(
        &self,
        op: BinaryOperator,
        left: &Expression,
        right: &Expression,
    ) -> ExpressionResult<String> {
        let lhs = self.visit_sql(left)?;
        let rhs = self.visit_sql(right)?;
        match op {
            // Guarded so the database agrees with missing-on-zero evaluation
            BinaryOperator::Div => Ok(format!("({} / nullif({}, 0))", lhs, rhs)),
            _ => Ok(format!("({} {} {})", lhs, op.sql_str(), rhs)),
        }
    }

    fn sql_unary(&self, op: UnaryOperator, operand: &Expression) -> ExpressionResult<String> {
        let inner = self.visit_sql(operand)?;
        match op {
            UnaryOperator::Not => Ok(format!("not ({})", inner)),
            UnaryOperator::Plus => Ok(inner),
            UnaryOperator::Minus => Ok(format!("-({})", inner)),
        }
    }

    fn sql_function(&self, call: &FunctionCall) -> ExpressionResult<String> {
        let args = call.args();
        match call.function() {
            Function::IsIn => {
                let target = self.visit_sql(&args[0])?;
                let candidates = self.sql_list(&args[1..])?;
                Ok(format!("{} in ({})", target, candidates.join(", ")))
            }
            Function::If => Ok(format!(
                "case when {} then {} else {} end",
                self.visit_sql(&args[0])?,
                self.visit_sql(&args[1])?,
                self.visit_sql(&args[2])?
            )),
            Function::Coalesce => Ok(format!("coalesce({})", self.sql_list(args)?.join(", "))),
            Function::HasValue => Ok(format!("{} is not null", self.visit_sql(&args[0])?)),
            Function::Least => Ok(format!("least({})", self.sql_list(args)?.join(", "))),
            Function::Greatest => Ok(format!("greatest({})", self.sql_list(args)?.join(", "))),
            Function::Count => {
                let terms: Vec<String> = self
                    .sql_list(args)?
                    .into_iter()
                    .map(|sql| format!("case when {} is not null then 1 else 0 end", sql))
                    .collect();
                Ok(format!("({})", terms.join(" + ")))
            }
            Function::Concat => {
                let pieces: ExpressionResult<Vec<String>> =
                    args.iter().map(|arg| self.cast_string_visit(arg)).collect();
                Ok(format!("({})", pieces?.join(" || ")))
            }
        }
    }

    fn sql_list(&self, args: &[Expression]) -> ExpressionResult<Vec<String>> {
        args.iter().map(|arg| self.visit_sql(arg)).collect()
    }

    fn truth_of(&self, value: &Value, context: &str) -> ExpressionResult<Option<bool>> {
        if value.is_missing() {
            return Ok(None);
        }
        match value.as_boolean() {
            Some(b) => Ok(Some(b)),
            None => Err(ExpressionError::TypeMismatch {
                left: value.data_type(),
                right: None,
                context: context.to_string(),
            }),
        }
    }

    fn number_of(&self, value: &Value, context: &str) -> ExpressionResult<f64> {
        value.as_number().ok_or_else(|| ExpressionError::TypeMismatch {
            left: value.data_type(),
            right: None,
            context: context.to_string(),
        })
    }
}

/// Evaluate a formula to a concrete value against a resolved context
pub fn evaluate_expression(
    expr: &Expression,
    resolver: &dyn ItemResolver,
) -> ExpressionResult<Value> {
    ExpressionVisitor::for_values(resolver).visit_value(expr)
}

/// Evaluate a formula while visiting every branch, as a validation tool does
pub fn describe_expression(
    expr: &Expression,
    resolver: &dyn ItemResolver,
) -> ExpressionResult<Value> {
    ExpressionVisitor::for_all_paths(resolver).visit_value(expr)
}

/// Translate a formula into an equivalent SQL fragment
pub fn expression_to_sql(
    expr: &Expression,
    resolver: &dyn ItemResolver,
) -> ExpressionResult<String> {
    ExpressionVisitor::for_sql(resolver).visit_sql(expr)
}

/// Type alias for compiled rule predicates
pub type RulePredicate = Box<dyn Fn(&dyn ItemResolver) -> bool + Send + 'static>;

/// Compile a formula into a reusable predicate over resolved contexts.
///
/// Missing results, non-boolean results, and data-shape errors all read as
/// false, the way a WHERE clause treats them.
pub fn expression_to_predicate(expr: Expression) -> RulePredicate {
    Box::new(move |resolver| match evaluate_expression(&expr, resolver) {
        Ok(Value::Boolean(b)) => b,
        Ok(_) => false,
        Err(_) => false,
    })
}
