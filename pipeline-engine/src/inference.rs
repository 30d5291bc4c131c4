//! FILENAME: pipeline-engine/src/inference.rs
//! Column Type Inference - classifies a column from a bounded row sample.
//!
//! Every sampled, non-empty value lands in exactly one bucket, checked in this
//! order: binary (0/1, which is ambiguous between a flag and a count), boolean
//! literal, date-like, numeric, string. The bucket counts then decide the
//! column type with majority thresholds so a minority of malformed cells does
//! not flip the column.

use grid_engine::{looks_like_date, parse_number, RowRef, Value};

use crate::columns::FieldResolver;
use crate::definition::{ColumnType, PipelineSettings};

/// The bucket a single sampled value falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    Binary,
    Boolean,
    Date,
    Numeric,
    String,
}

const BOOLEAN_LITERALS: &[&str] = &["true", "false", "yes", "no", "y", "n"];

/// Classifies one value. Empty values (null, blank text) are not evidence.
pub fn classify_value(value: &Value) -> Option<ValueClass> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(ValueClass::Boolean),
        Value::Number(n) if *n == 0.0 || *n == 1.0 => Some(ValueClass::Binary),
        Value::Number(n) if n.is_finite() => Some(ValueClass::Numeric),
        Value::Number(_) => Some(ValueClass::String),
        Value::Date(_) => Some(ValueClass::Date),
        Value::Nested(_) => Some(ValueClass::String),
        Value::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            if text == "0" || text == "1" {
                return Some(ValueClass::Binary);
            }
            let lower = text.to_ascii_lowercase();
            if BOOLEAN_LITERALS.contains(&lower.as_str()) {
                Some(ValueClass::Boolean)
            } else if looks_like_date(text) {
                Some(ValueClass::Date)
            } else if parse_number(text).is_some() {
                Some(ValueClass::Numeric)
            } else {
                Some(ValueClass::String)
            }
        }
    }
}

/// Bucket counts over the non-empty sampled values of one column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeEvidence {
    pub total: usize,
    pub boolean: usize,
    pub binary: usize,
    pub date: usize,
    pub numeric: usize,
    pub string: usize,
}

impl TypeEvidence {
    pub fn add(&mut self, value: &Value) {
        let class = match classify_value(value) {
            Some(c) => c,
            None => return,
        };
        self.total += 1;
        match class {
            ValueClass::Binary => self.binary += 1,
            ValueClass::Boolean => self.boolean += 1,
            ValueClass::Date => self.date += 1,
            ValueClass::Numeric => self.numeric += 1,
            ValueClass::String => self.string += 1,
        }
    }

    /// Applies the decision rule. Exact ties on a threshold do not pass it,
    /// so ambiguous columns end up as strings.
    pub fn decide(&self, settings: &PipelineSettings) -> ColumnType {
        if self.total == 0 {
            return ColumnType::String;
        }
        let n = self.total as f64;

        let binary_only_flags = self.binary > 0 && self.boolean + self.binary == self.total;
        if self.boolean as f64 > settings.boolean_threshold * n || binary_only_flags {
            return ColumnType::Boolean;
        }

        // With date evidence present, 0/1 reads as a date serial rather than a count.
        let binary_as_dates = self.date > 0;
        let date_count = self.date + if binary_as_dates { self.binary } else { 0 };
        if date_count as f64 > settings.date_threshold * n {
            return ColumnType::Date;
        }

        let numeric_count = self.numeric + if binary_as_dates { 0 } else { self.binary };
        if numeric_count as f64 > settings.number_threshold * n {
            return ColumnType::Number;
        }

        ColumnType::String
    }
}

/// Infers the type of `column` from the first `settings.sample_size` rows.
pub fn infer_column_type(
    rows: &[RowRef],
    column: &str,
    resolver: &FieldResolver<'_>,
    settings: &PipelineSettings,
) -> ColumnType {
    let mut evidence = TypeEvidence::default();
    for row in rows.iter().take(settings.sample_size) {
        evidence.add(&resolver.value(row, column));
    }
    evidence.decide(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::PipelineConfig;
    use grid_engine::Row;
    use std::sync::Arc;

    fn column(values: Vec<Value>) -> Vec<RowRef> {
        values
            .into_iter()
            .map(|v| Arc::new(Row::from_pairs([("c", v)])))
            .collect()
    }

    fn infer(values: Vec<Value>) -> ColumnType {
        let config = PipelineConfig::default();
        let resolver = FieldResolver::new(&config);
        infer_column_type(&column(values), "c", &resolver, &PipelineSettings::default())
    }

    #[test]
    fn test_classify_priority() {
        assert_eq!(classify_value(&Value::from("1")), Some(ValueClass::Binary));
        assert_eq!(classify_value(&Value::from(0)), Some(ValueClass::Binary));
        assert_eq!(classify_value(&Value::from("YES")), Some(ValueClass::Boolean));
        assert_eq!(classify_value(&Value::from("2024-05-01")), Some(ValueClass::Date));
        assert_eq!(classify_value(&Value::from("1,200")), Some(ValueClass::Numeric));
        assert_eq!(classify_value(&Value::from("hello")), Some(ValueClass::String));
        assert_eq!(classify_value(&Value::from("  ")), None);
        assert_eq!(classify_value(&Value::Null), None);
    }

    #[test]
    fn test_boolean_columns() {
        assert_eq!(infer(vec!["yes".into(), "no".into(), "Y".into(), true.into()]), ColumnType::Boolean);
        // Binary-only columns are flags.
        assert_eq!(infer(vec![0.into(), 1.into(), "1".into(), Value::Null]), ColumnType::Boolean);
    }

    #[test]
    fn test_number_column_with_binary_values() {
        let values: Vec<Value> = vec![0.into(), 1.into(), 5.into(), 12.5.into(), 0.into()];
        assert_eq!(infer(values), ColumnType::Number);
    }

    #[test]
    fn test_date_column_tolerates_minority_noise() {
        let mut values: Vec<Value> = (1..=8).map(|d| Value::from(format!("2024-01-{:02}", d))).collect();
        values.push("n/a".into());
        values.push(Value::Null);
        assert_eq!(infer(values), ColumnType::Date);
    }

    #[test]
    fn test_binary_values_fold_into_dates() {
        // 5 of 8 are dates; the three 0/1 values push the date share past 0.7.
        let mut values: Vec<Value> = (1..=5).map(|d| Value::from(format!("2024-02-{:02}", d))).collect();
        values.extend([Value::from(0), Value::from(1), Value::from("1")]);
        assert_eq!(infer(values), ColumnType::Date);

        // Once dates are present, 0/1 no longer counts as numeric: 6 of 11
        // numbers stays below the number threshold.
        let mut values: Vec<Value> = vec!["2024-02-01".into(), "2024-02-02".into()];
        values.extend([Value::from(0), Value::from(1), Value::from(0)]);
        values.extend((2..8).map(Value::from));
        assert_eq!(infer(values), ColumnType::String);
    }

    #[test]
    fn test_mixed_column_is_string() {
        let values: Vec<Value> = vec!["a".into(), 1.5.into(), "2024-01-01".into(), "b".into()];
        assert_eq!(infer(values), ColumnType::String);
    }

    #[test]
    fn test_empty_sample_is_string() {
        assert_eq!(infer(vec![]), ColumnType::String);
        assert_eq!(infer(vec![Value::Null, "".into()]), ColumnType::String);
    }

    #[test]
    fn test_exact_threshold_is_not_enough() {
        // 8 of 10 numeric is exactly 0.8n, which does not pass.
        let mut values: Vec<Value> = (2..10).map(Value::from).collect();
        values.push("x".into());
        values.push("y".into());
        assert_eq!(infer(values), ColumnType::String);
    }

    #[test]
    fn test_sample_is_bounded() {
        let settings = PipelineSettings { sample_size: 3, ..PipelineSettings::default() };
        let mut values: Vec<Value> = vec![5.into(), 6.into(), 7.into()];
        values.extend((0..10).map(|i| Value::from(format!("label {}", i))));
        let config = PipelineConfig::default();
        let resolver = FieldResolver::new(&config);
        assert_eq!(infer_column_type(&column(values), "c", &resolver, &settings), ColumnType::Number);
    }
}
