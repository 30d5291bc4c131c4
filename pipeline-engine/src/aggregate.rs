//! FILENAME: pipeline-engine/src/aggregate.rs
//! Group summary rows.
//!
//! A summary row condenses a set of leaf rows into one row with one value per
//! visible column. Which rule applies depends on the column:
//! - the group field of the current level: the group's representative value
//! - group fields of enclosing levels: their representative values
//! - group fields of deeper levels: null
//! - number columns: sum of the present values
//! - percentage columns: sum(value) / sum(target) * 100
//! - derived columns: the operator applied to the summed operands
//! - anything else: summed when mostly numeric, otherwise the first value

use grid_engine::{Row, RowRef, Value};

use crate::columns::{ColumnSet, ColumnSource, FieldResolver};
use crate::definition::{ColumnType, PipelineSettings};

// ============================================================================
// ACCUMULATOR
// ============================================================================

/// Running totals for one column over a set of rows.
#[derive(Debug, Clone, Default)]
pub struct ColumnAccumulator {
    pub sum: f64,
    /// Non-empty values seen.
    pub count: u64,
    /// Values with a numeric reading.
    pub count_numbers: u64,
    /// Non-null values seen (blank text included).
    pub count_present: u64,
    pub first_value: Option<Value>,
}

impl ColumnAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: &Value) {
        if value.is_null() {
            return;
        }
        self.count_present += 1;
        if self.first_value.is_none() {
            self.first_value = Some(value.clone());
        }
        if value.is_empty() {
            return;
        }
        self.count += 1;
        if let Some(n) = value.as_f64() {
            self.count_numbers += 1;
            self.sum += n;
        }
    }

    /// Sum over present values, with non-numeric content counted as zero.
    /// `None` when every value was null.
    pub fn present_sum(&self) -> Option<f64> {
        if self.count_present == 0 {
            None
        } else {
            Some(self.sum)
        }
    }

    /// Share of non-empty values that read as numbers.
    pub fn numeric_share(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.count_numbers as f64 / self.count as f64
        }
    }
}

// ============================================================================
// SUMMARIZER
// ============================================================================

/// The group context of a summary row: the field at this level with its
/// representative value, the enclosing levels, and the deeper levels.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupScope<'s> {
    pub level: Option<(&'s str, &'s Value)>,
    pub ancestors: &'s [(String, Value)],
    pub deeper: &'s [String],
}

/// Builds summary rows for the visible columns.
#[derive(Debug, Clone, Copy)]
pub struct Summarizer<'a> {
    columns: &'a ColumnSet,
    resolver: FieldResolver<'a>,
    settings: &'a PipelineSettings,
}

impl<'a> Summarizer<'a> {
    pub fn new(
        columns: &'a ColumnSet,
        resolver: FieldResolver<'a>,
        settings: &'a PipelineSettings,
    ) -> Self {
        Summarizer { columns, resolver, settings }
    }

    fn accumulate(&self, rows: &[RowRef], field: &str) -> ColumnAccumulator {
        let mut acc = ColumnAccumulator::new();
        for row in rows {
            acc.add(&self.resolver.value(row, field));
        }
        acc
    }

    fn summed(&self, rows: &[RowRef], field: &str) -> Option<f64> {
        self.accumulate(rows, field).present_sum()
    }

    /// One summary value for `column` over `rows`.
    pub fn summary_value(&self, rows: &[RowRef], column: &str, scope: &GroupScope<'_>) -> Value {
        if let Some((field, value)) = scope.level {
            if field == column {
                return value.clone();
            }
        }
        if let Some((_, value)) = scope.ancestors.iter().find(|(f, _)| f == column) {
            return value.clone();
        }
        if scope.deeper.iter().any(|f| f == column) {
            return Value::Null;
        }

        let descriptor = self.columns.get(column);
        match descriptor.map(|d| d.source) {
            Some(ColumnSource::Percentage) => {
                if let Some(spec) = self.resolver.percentage_spec(column) {
                    return spec.evaluate(self.summed(rows, &spec.target), self.summed(rows, &spec.value));
                }
            }
            Some(ColumnSource::Derived) => {
                if let Some(spec) = self.resolver.derived_spec(column) {
                    return spec.evaluate(self.summed(rows, &spec.left), self.summed(rows, &spec.right));
                }
            }
            _ => {}
        }

        let acc = self.accumulate(rows, column);
        let column_type = descriptor.map(|d| d.inferred_type).unwrap_or_default();
        if column_type == ColumnType::Number {
            return acc.present_sum().map(Value::Number).unwrap_or(Value::Null);
        }
        if acc.count > 0 && acc.numeric_share() >= self.settings.pass_through_numeric_share {
            return Value::Number(acc.sum);
        }
        acc.first_value.unwrap_or(Value::Null)
    }

    /// The summary row for `rows` within `scope`. Group fields outside the
    /// column list are still written so the row carries its key.
    pub fn summarize(&self, rows: &[RowRef], scope: &GroupScope<'_>) -> Row {
        let mut summary = Row::with_capacity(self.columns.len());
        for descriptor in self.columns.descriptors() {
            summary.insert(descriptor.name.as_str(), self.summary_value(rows, &descriptor.name, scope));
        }
        for (field, value) in scope.ancestors {
            if !summary.contains_key(field) {
                summary.insert(field.as_str(), value.clone());
            }
        }
        if let Some((field, value)) = scope.level {
            if !summary.contains_key(field) {
                summary.insert(field, value.clone());
            }
        }
        summary
    }

    /// The grand-total row over every filtered row.
    pub fn totals(&self, rows: &[RowRef]) -> Row {
        self.summarize(rows, &GroupScope::default())
    }
}
