//! Resolved dimensional parameters for one analytics request.

use crate::analytics::condition::{Condition, ConditionSource};
use crate::expression::context::ItemResolver;
use crate::expression::expr::{ItemKind, ItemRef};
use crate::expression::value::{sql_quote, Value};
use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Reporting period bounds, both inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

/// Dimensional parameters resolved for one analytics request.
///
/// Supplied by the request-parsing layer; condition sources read it to
/// decide what they filter on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryContext {
    pub programs: Vec<String>,
    pub org_units: Vec<String>,
    pub period: Option<Period>,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_programs(mut self, programs: Vec<String>) -> Self {
        self.programs = programs;
        self
    }

    pub fn with_org_units(mut self, org_units: Vec<String>) -> Self {
        self.org_units = org_units;
        self
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    /// Coarse plumbing checks before any SQL is assembled
    pub fn validate(&self) -> Result<()> {
        if let Some(period) = &self.period {
            if period.start > period.end {
                bail!(
                    "period starts after it ends: {} > {}",
                    period.start,
                    period.end
                );
            }
        }
        for uid in self.programs.iter().chain(self.org_units.iter()) {
            if uid.trim().is_empty() {
                bail!("blank uid in query dimensions");
            }
        }
        Ok(())
    }
}

/// Filters rows to enrollments in any requested program.
///
/// One condition per program uid, all sharing one group key: membership in
/// any requested program suffices.
#[derive(Debug, Default)]
pub struct ProgramConditions;

impl ConditionSource for ProgramConditions {
    fn applies_to(&self, query: &QueryContext) -> bool {
        !query.programs.is_empty()
    }

    fn conditions(&self, query: &QueryContext) -> Vec<Condition> {
        query
            .programs
            .iter()
            .map(|uid| Condition::grouped(format!("\"program\" = {}", sql_quote(uid)), "program"))
            .collect()
    }
}

/// Filters rows to any requested organisation unit
#[derive(Debug, Default)]
pub struct OrgUnitConditions;

impl ConditionSource for OrgUnitConditions {
    fn applies_to(&self, query: &QueryContext) -> bool {
        !query.org_units.is_empty()
    }

    fn conditions(&self, query: &QueryContext) -> Vec<Condition> {
        query
            .org_units
            .iter()
            .map(|uid| Condition::grouped(format!("\"ou\" = {}", sql_quote(uid)), "orgunit"))
            .collect()
    }
}

/// Restricts rows to the requested reporting period.
///
/// Both bounds must hold, so the two conditions stay ungrouped.
#[derive(Debug, Default)]
pub struct PeriodConditions;

impl ConditionSource for PeriodConditions {
    fn applies_to(&self, query: &QueryContext) -> bool {
        query.period.is_some()
    }

    fn conditions(&self, query: &QueryContext) -> Vec<Condition> {
        let period = match &query.period {
            Some(period) => period,
            None => return Vec::new(),
        };
        vec![
            Condition::new(format!(
                "\"occurreddate\" >= '{}'",
                period.start.format("%Y-%m-%d")
            )),
            Condition::new(format!(
                "\"occurreddate\" <= '{}'",
                period.end.format("%Y-%m-%d")
            )),
        ]
    }
}

/// Hides soft-deleted rows from every analytics query.
///
/// Applies regardless of request parameters.
#[derive(Debug, Default)]
pub struct VisibilityConditions;

impl ConditionSource for VisibilityConditions {
    fn always_applies(&self) -> bool {
        true
    }

    fn applies_to(&self, _query: &QueryContext) -> bool {
        true
    }

    fn conditions(&self, _query: &QueryContext) -> Vec<Condition> {
        vec![Condition::new("\"deleted\" = false")]
    }
}

/// Maps item references onto analytics-table columns for SQL translation.
///
/// Data elements and tracked-entity attributes live in uid-named columns;
/// program variables are built-in columns referenced by name.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticsColumnMapper;

impl ItemResolver for AnalyticsColumnMapper {
    // No live data on the SQL side
    fn resolve(&self, _item: &ItemRef) -> Value {
        Value::Missing
    }

    fn sql_column(&self, item: &ItemRef) -> String {
        match item.kind {
            ItemKind::DataElement | ItemKind::TrackedEntityAttribute => {
                format!("\"{}\"", item.uid)
            }
            ItemKind::ProgramVariable => item.uid.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_validation() {
        let query = QueryContext::new()
            .with_programs(vec!["p1".to_string()])
            .with_period(Period::new(date(2024, 1, 1), date(2024, 12, 31)));
        assert!(query.validate().is_ok());

        let inverted = QueryContext::new()
            .with_period(Period::new(date(2024, 12, 31), date(2024, 1, 1)));
        assert!(inverted.validate().is_err());

        let blank = QueryContext::new().with_org_units(vec!["  ".to_string()]);
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_program_conditions_share_a_group() {
        let query =
            QueryContext::new().with_programs(vec!["p1".to_string(), "p2".to_string()]);
        let source = ProgramConditions;

        assert!(source.applies_to(&query));
        let conditions = source.conditions(&query);
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0].sql(), "\"program\" = 'p1'");
        assert!(conditions.iter().all(|c| c.group() == Some("program")));

        assert!(!source.applies_to(&QueryContext::new()));
    }

    #[test]
    fn test_period_conditions_are_ungrouped() {
        let query = QueryContext::new()
            .with_period(Period::new(date(2024, 1, 1), date(2024, 3, 31)));
        let conditions = PeriodConditions.conditions(&query);

        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0].sql(), "\"occurreddate\" >= '2024-01-01'");
        assert_eq!(conditions[1].sql(), "\"occurreddate\" <= '2024-03-31'");
        assert!(conditions.iter().all(|c| c.group().is_none()));
    }

    #[test]
    fn test_visibility_always_applies() {
        let source = VisibilityConditions;
        assert!(source.always_applies());
        let conditions = source.conditions(&QueryContext::new());
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].sql(), "\"deleted\" = false");
    }

    #[test]
    fn test_column_mapping() {
        let mapper = AnalyticsColumnMapper;
        assert_eq!(
            mapper.sql_column(&ItemRef::data_element("de_a")),
            "\"de_a\""
        );
        assert_eq!(
            mapper.sql_column(&ItemRef::attribute("at_b")),
            "\"at_b\""
        );
        assert_eq!(
            mapper.sql_column(&ItemRef::variable("enrollmentdate")),
            "enrollmentdate"
        );
        assert_eq!(mapper.resolve(&ItemRef::data_element("de_a")), Value::Missing);
    }
}
