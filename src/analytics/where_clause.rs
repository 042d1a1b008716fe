//! WHERE-clause assembly from grouped conditions.

use crate::analytics::condition::{Condition, ConditionSource};
use crate::analytics::query::QueryContext;
use log::debug;

/// Combine conditions into one WHERE-clause boolean expression.
///
/// Conditions sharing a group key form one OR-joined, parenthesized
/// alternative set; every other condition stands alone, unparenthesized.
/// Partitions are AND-joined in first-seen order. An empty input assembles
/// to the empty string and the caller omits the WHERE keyword.
pub fn assemble(conditions: &[Condition]) -> String {
    let mut partitions: Vec<(Option<&str>, Vec<&str>)> = Vec::new();
    for condition in conditions {
        match condition.group() {
            Some(group) => {
                if let Some((_, members)) = partitions
                    .iter_mut()
                    .find(|(key, _)| *key == Some(group))
                {
                    members.push(condition.sql());
                } else {
                    partitions.push((Some(group), vec![condition.sql()]));
                }
            }
            // Keyless conditions each form their own partition
            None => partitions.push((None, vec![condition.sql()])),
        }
    }

    let parts: Vec<String> = partitions
        .iter()
        .map(|(_, members)| {
            if members.len() >= 2 {
                format!("({})", members.join(" or "))
            } else {
                members[0].to_string()
            }
        })
        .collect();
    parts.join(" and ")
}

/// Collects conditions from registered sources and assembles the predicate.
///
/// Sources run in registration order; a source whose parameters are absent
/// from the request is skipped unless it always applies.
#[derive(Default)]
pub struct WhereClauseBuilder {
    sources: Vec<Box<dyn ConditionSource>>,
}

impl WhereClauseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a condition source
    pub fn source(mut self, source: impl ConditionSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Run every applicable source and assemble the WHERE-clause predicate
    pub fn build(&self, query: &QueryContext) -> String {
        let mut conditions = Vec::new();
        for source in &self.sources {
            if source.always_applies() || source.applies_to(query) {
                conditions.extend(source.conditions(query));
            }
        }
        let clause = assemble(&conditions);
        debug!(
            "assembled where clause from {} conditions: {}",
            conditions.len(),
            clause
        );
        clause
    }
}
