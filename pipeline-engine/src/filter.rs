//! FILENAME: pipeline-engine/src/filter.rs
//! Row filtering.
//!
//! Filter clauses are compiled once per pass against their column's type and
//! then tested row by row. A row passes when every active clause holds; the
//! first failing clause ends the test for that row.

use chrono::NaiveDateTime;
use filter_parser::{parse_filter, FilterExpression};
use grid_engine::{day_end, day_start, Row, RowRef, Value};
use rustc_hash::FxHashSet;

use crate::columns::{ColumnSet, FieldResolver};
use crate::definition::{ColumnFilter, ColumnType, DateBound, FilterState};

/// A clause ready for evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledClause {
    /// Free text or a numeric expression.
    Expression(FilterExpression),
    /// Tri-state flag with a chosen side.
    Flag(bool),
    /// Multiselect membership, by value or by display string.
    Members {
        values: Vec<Value>,
        labels: FxHashSet<String>,
    },
    /// Inclusive date range; bounds are widened to whole days.
    DateRange {
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    },
    /// A clause whose bounds could not be read; no row passes.
    Unmatchable,
}

impl CompiledClause {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            CompiledClause::Expression(expr) => {
                if value.is_null() {
                    return false;
                }
                expr.matches(value.as_f64(), &value.to_display())
            }
            CompiledClause::Flag(expected) => value.as_flag() == Some(*expected),
            CompiledClause::Members { values, labels } => {
                values.iter().any(|v| v == value) || labels.contains(&value.to_display())
            }
            CompiledClause::DateRange { start, end } => match value.as_date() {
                Some(date) => {
                    start.map_or(true, |s| date >= s) && end.map_or(true, |e| date <= e)
                }
                None => false,
            },
            CompiledClause::Unmatchable => false,
        }
    }
}

/// One compiled clause bound to its column.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    pub column: String,
    pub clause: CompiledClause,
}

/// Compiles the active clauses of `filters`. `skip` leaves one column out,
/// which is how option lists are cross-filtered.
pub fn compile_filters(
    filters: &FilterState,
    columns: &ColumnSet,
    skip: Option<&str>,
) -> Vec<CompiledFilter> {
    filters
        .iter()
        .filter(|(column, filter)| filter.is_active() && skip != Some(column.as_str()))
        .filter_map(|(column, filter)| {
            compile_clause(filter, columns.type_of(column)).map(|clause| CompiledFilter {
                column: column.clone(),
                clause,
            })
        })
        .collect()
}

fn compile_clause(filter: &ColumnFilter, column_type: ColumnType) -> Option<CompiledClause> {
    let clause = match filter {
        ColumnFilter::Contains(text) => {
            let expr = if column_type == ColumnType::Number {
                parse_filter(text)?
            } else {
                FilterExpression::Text(text.trim().to_string())
            };
            CompiledClause::Expression(expr)
        }
        ColumnFilter::Equals(flag) => CompiledClause::Flag((*flag)?),
        ColumnFilter::In(values) => CompiledClause::Members {
            labels: values.iter().map(Value::to_display).collect(),
            values: values.clone(),
        },
        ColumnFilter::DateRange(start, end) => {
            let unreadable = |bound: &Option<DateBound>| matches!(bound, Some(DateBound::Unparsed(_)));
            if unreadable(start) || unreadable(end) {
                CompiledClause::Unmatchable
            } else {
                CompiledClause::DateRange {
                    start: start.as_ref().and_then(DateBound::day).map(day_start),
                    end: end.as_ref().and_then(DateBound::day).map(day_end),
                }
            }
        }
    };
    Some(clause)
}

/// True when `row` satisfies every clause.
pub fn row_passes(row: &Row, filters: &[CompiledFilter], resolver: &FieldResolver<'_>) -> bool {
    filters
        .iter()
        .all(|f| f.clause.matches(&resolver.value(row, &f.column)))
}

/// The rows that pass, in input order. Row identity is preserved.
pub fn apply_filters(
    rows: &[RowRef],
    filters: &[CompiledFilter],
    resolver: &FieldResolver<'_>,
) -> Vec<RowRef> {
    if filters.is_empty() {
        return rows.to_vec();
    }
    rows.iter()
        .filter(|row| row_passes(row, filters, resolver))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{PipelineConfig, PipelineSettings};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn dataset() -> Vec<RowRef> {
        vec![
            Arc::new(Row::from_pairs([
                ("name", Value::from("Alpha")),
                ("amount", Value::from(12)),
                ("active", Value::from(true)),
                ("created", Value::from("2024-01-15")),
            ])),
            Arc::new(Row::from_pairs([
                ("name", Value::from("Beta")),
                ("amount", Value::from(142)),
                ("active", Value::from(false)),
                ("created", Value::from("2024-02-01T08:30:00")),
            ])),
            Arc::new(Row::from_pairs([
                ("name", Value::from("gamma")),
                ("amount", Value::Null),
                ("active", Value::from(1)),
                ("created", Value::from("not a date")),
            ])),
        ]
    }

    fn run(filters: FilterState) -> Vec<String> {
        let rows = dataset();
        let config = PipelineConfig { filters, ..PipelineConfig::default() };
        let columns = ColumnSet::infer(&rows, &config, &PipelineSettings::default());
        let resolver = FieldResolver::new(&config);
        let compiled = compile_filters(&config.filters, &columns, None);
        apply_filters(&rows, &compiled, &resolver)
            .iter()
            .map(|r| r.get("name").map(Value::to_display).unwrap_or_default())
            .collect()
    }

    fn single(column: &str, filter: ColumnFilter) -> FilterState {
        let mut state = FilterState::new();
        state.insert(column.to_string(), filter);
        state
    }

    #[test]
    fn test_numeric_expressions() {
        assert_eq!(run(single("amount", ColumnFilter::Contains(">=100".into()))), vec!["Beta"]);
        assert_eq!(run(single("amount", ColumnFilter::Contains("10<>20".into()))), vec!["Alpha"]);
        // A bare number is a substring match on the display text.
        assert_eq!(run(single("amount", ColumnFilter::Contains("42".into()))), vec!["Beta"]);
    }

    #[test]
    fn test_text_contains_is_case_insensitive() {
        let mut filters = single("name", ColumnFilter::Contains("A".into()));
        assert_eq!(run(filters.clone()), vec!["Alpha", "Beta", "gamma"]);
        filters.insert("name".into(), ColumnFilter::Contains("GAM".into()));
        assert_eq!(run(filters), vec!["gamma"]);
    }

    #[test]
    fn test_flag_filter_reads_numeric_flags() {
        assert_eq!(run(single("active", ColumnFilter::Equals(Some(true)))), vec!["Alpha", "gamma"]);
        assert_eq!(run(single("active", ColumnFilter::Equals(None))).len(), 3);
    }

    #[test]
    fn test_false_flag_matches_every_false_spelling() {
        let flag = |name: &str, active: Value| {
            Arc::new(Row::from_pairs([("name", Value::from(name)), ("active", active)]))
        };
        let rows = vec![
            flag("bool", Value::from(false)),
            flag("zero", Value::from(0)),
            flag("text", Value::from("0")),
            flag("on", Value::from(true)),
            flag("one", Value::from("1")),
            flag("blank", Value::Null),
        ];
        let config = PipelineConfig::default().with_filter("active", ColumnFilter::Equals(Some(false)));
        let columns = ColumnSet::infer(&rows, &config, &PipelineSettings::default());
        let compiled = compile_filters(&config.filters, &columns, None);
        let names: Vec<String> = apply_filters(&rows, &compiled, &FieldResolver::new(&config))
            .iter()
            .map(|r| r.get("name").map(Value::to_display).unwrap_or_default())
            .collect();
        assert_eq!(names, vec!["bool", "zero", "text"]);
    }

    #[test]
    fn test_membership_by_value_or_display() {
        let filters = single("name", ColumnFilter::In(vec![Value::from("Beta"), Value::from("gamma")]));
        assert_eq!(run(filters), vec!["Beta", "gamma"]);
        let filters = single("amount", ColumnFilter::In(vec![Value::from("12")]));
        assert_eq!(run(filters), vec!["Alpha"]);
        assert_eq!(run(single("name", ColumnFilter::In(vec![]))).len(), 3);
    }

    #[test]
    fn test_date_range_is_whole_day_inclusive() {
        let feb1 = NaiveDate::from_ymd_opt(2024, 2, 1);
        assert_eq!(run(single("created", ColumnFilter::date_range(None, feb1))), vec!["Alpha", "Beta"]);
        assert_eq!(run(single("created", ColumnFilter::date_range(feb1, feb1))), vec!["Beta"]);
    }

    #[test]
    fn test_unreadable_date_bound_matches_nothing() {
        let broken = ColumnFilter::DateRange(Some(DateBound::Unparsed("someday".into())), None);
        assert!(run(single("created", broken)).is_empty());
    }

    #[test]
    fn test_conjunction_of_clauses() {
        let mut filters = single("active", ColumnFilter::Equals(Some(true)));
        filters.insert("amount".into(), ColumnFilter::Contains("<100".into()));
        assert_eq!(run(filters), vec!["Alpha"]);
    }

    #[test]
    fn test_skip_leaves_column_out() {
        let rows = dataset();
        let config = PipelineConfig::default()
            .with_filter("name", ColumnFilter::In(vec![Value::from("Alpha")]))
            .with_filter("active", ColumnFilter::Equals(Some(false)));
        let columns = ColumnSet::infer(&rows, &config, &PipelineSettings::default());
        let compiled = compile_filters(&config.filters, &columns, Some("name"));
        assert_eq!(compiled.len(), 1);
        assert_eq!(compiled[0].column, "active");
    }
}
