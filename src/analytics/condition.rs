//! Atomic SQL predicate fragments and their sources.

use crate::analytics::query::QueryContext;
use serde::{Deserialize, Serialize};

/// One SQL predicate fragment, optionally tagged with a group key.
///
/// Conditions sharing a group key are alternatives of one filter: they are
/// OR-combined into a single parenthesized disjunction. Keyless conditions
/// are AND-ed individually. Created per analytics request and consumed once
/// by the assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    sql: String,
    group: Option<String>,
}

impl Condition {
    /// Create an ungrouped condition
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            group: None,
        }
    }

    /// Create a condition tagged with a group key
    pub fn grouped(sql: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            group: Some(group.into()),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }
}

/// Produces the conditions for one logical filter of an analytics request.
///
/// Group keys are assigned here, by the source; the assembler only combines.
pub trait ConditionSource {
    /// Contribute even when the request names no parameter for this filter
    fn always_applies(&self) -> bool {
        false
    }

    /// Whether the request carries parameters this source can filter on
    fn applies_to(&self, query: &QueryContext) -> bool;

    /// The conditions for this filter, already tagged with group keys
    fn conditions(&self, query: &QueryContext) -> Vec<Condition>;
}
