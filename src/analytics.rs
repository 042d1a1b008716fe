//! Analytics query predicate assembly.
//!
//! This module provides:
//! - Condition representation with group-key tagging
//! - Condition sources for the standard request dimensions
//! - WHERE-clause assembly with OR-within-group, AND-across-group semantics

pub mod condition;
pub mod query;
pub mod where_clause;

pub use condition::{Condition, ConditionSource};
pub use query::{
    AnalyticsColumnMapper, OrgUnitConditions, Period, PeriodConditions, ProgramConditions,
    QueryContext, VisibilityConditions,
};
pub use where_clause::{assemble, WhereClauseBuilder};
