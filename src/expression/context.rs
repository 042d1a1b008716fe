//! Evaluation contexts and leaf-reference resolution.

use crate::expression::expr::ItemRef;
use crate::expression::value::Value;
use std::collections::HashMap;

/// Converts a leaf data-item reference into what the active mode needs: a
/// resolved value for the value modes, a column or expression string for SQL.
///
/// Implementations must be side-effect-free with respect to the walk; the
/// visitor may consult them any number of times in any order.
pub trait ItemResolver {
    /// Resolved value for the reference; `Value::Missing` when unbound
    fn resolve(&self, item: &ItemRef) -> Value;

    /// SQL column or expression standing in for the reference
    fn sql_column(&self, item: &ItemRef) -> String;
}

/// Resolved data bindings for one evaluation request.
///
/// Read-only during a walk; the data-resolution layer constructs a fresh one
/// per request. An unbound reference resolves to missing, never an error.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    bindings: HashMap<String, Value>,
}

impl EvaluationContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a reference to a resolved value
    pub fn bind(mut self, uid: impl Into<String>, value: Value) -> Self {
        self.bindings.insert(uid.into(), value);
        self
    }

    /// Bind a reference explicitly to the missing sentinel
    pub fn bind_missing(self, uid: impl Into<String>) -> Self {
        self.bind(uid, Value::Missing)
    }

    /// Look up the bound value for a reference
    pub fn value_of(&self, item: &ItemRef) -> Value {
        self.bindings
            .get(&item.uid)
            .cloned()
            .unwrap_or(Value::Missing)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl ItemResolver for EvaluationContext {
    fn resolve(&self, item: &ItemRef) -> Value {
        self.value_of(item)
    }

    // Analytics tables name their columns by item uid
    fn sql_column(&self, item: &ItemRef) -> String {
        format!("\"{}\"", item.uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindings() {
        let context = EvaluationContext::new()
            .bind("de_weight", Value::Number(72.5))
            .bind("at_sex", Value::Text("female".to_string()));

        assert_eq!(context.len(), 2);
        assert_eq!(
            context.value_of(&ItemRef::data_element("de_weight")),
            Value::Number(72.5)
        );
        assert_eq!(
            context.value_of(&ItemRef::attribute("at_sex")),
            Value::Text("female".to_string())
        );
    }

    #[test]
    fn test_unbound_resolves_to_missing() {
        let context = EvaluationContext::new();
        assert!(context.is_empty());
        assert_eq!(
            context.value_of(&ItemRef::data_element("de_absent")),
            Value::Missing
        );
    }

    #[test]
    fn test_explicit_missing_binding() {
        let context = EvaluationContext::new().bind_missing("de_skipped");
        assert_eq!(context.len(), 1);
        assert_eq!(
            context.value_of(&ItemRef::data_element("de_skipped")),
            Value::Missing
        );
    }

    #[test]
    fn test_default_sql_column() {
        let context = EvaluationContext::new();
        assert_eq!(
            context.sql_column(&ItemRef::data_element("de_a")),
            "\"de_a\""
        );
    }
}
