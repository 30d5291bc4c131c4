//! FILENAME: pipeline-engine/src/columns.rs
//! Column discovery, typing, and cell resolution.
//!
//! Columns are discovered from the sampled rows (union of keys in first-seen
//! order), narrowed by the allow-list, and extended with the computed
//! (derived and percentage) columns. Computed values are never written into
//! source rows; `FieldResolver` produces them on read.

use std::borrow::Cow;
use std::collections::BTreeMap;

use grid_engine::{Row, RowRef, Value};
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::definition::{
    ColumnType, DerivedColumnSpec, MatchMode, PercentageColumnSpec, PipelineConfig,
    PipelineSettings,
};
use crate::inference::infer_column_type;

static NULL_VALUE: Value = Value::Null;

// ============================================================================
// FIELD RESOLUTION
// ============================================================================

/// Reads cell values by field name, computing derived and percentage columns
/// on demand. A value stored under the field name always wins, which is how
/// summary rows carry their pre-aggregated computed values.
#[derive(Debug, Clone, Copy)]
pub struct FieldResolver<'a> {
    derived: &'a [DerivedColumnSpec],
    percentages: &'a [PercentageColumnSpec],
}

impl<'a> FieldResolver<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        FieldResolver {
            derived: &config.derived_columns,
            percentages: &config.percentage_columns,
        }
    }

    /// The value of `field` in `row`, or null when absent.
    pub fn value<'r>(&self, row: &'r Row, field: &str) -> Cow<'r, Value> {
        if let Some(value) = row.get_field(field) {
            return Cow::Borrowed(value);
        }
        if let Some(spec) = self.derived_spec(field) {
            return Cow::Owned(spec.evaluate(operand(row, &spec.left), operand(row, &spec.right)));
        }
        if let Some(spec) = self.percentage_spec(field) {
            return Cow::Owned(spec.evaluate(operand(row, &spec.target), operand(row, &spec.value)));
        }
        Cow::Borrowed(&NULL_VALUE)
    }

    pub fn derived_spec(&self, field: &str) -> Option<&'a DerivedColumnSpec> {
        self.derived.iter().find(|s| s.name == field)
    }

    pub fn percentage_spec(&self, field: &str) -> Option<&'a PercentageColumnSpec> {
        self.percentages.iter().find(|s| s.name == field)
    }

    pub fn is_computed(&self, field: &str) -> bool {
        self.derived_spec(field).is_some() || self.percentage_spec(field).is_some()
    }

    pub fn computed_names(&self) -> impl Iterator<Item = &'a str> {
        self.derived
            .iter()
            .map(|s| s.name.as_str())
            .chain(self.percentages.iter().map(|s| s.name.as_str()))
    }
}

/// Operands of computed columns are read from stored fields only, so a
/// computed column cannot recurse into itself.
fn operand(row: &Row, field: &str) -> Option<f64> {
    row.get_field(field).and_then(Value::as_f64)
}

// ============================================================================
// COLUMN DESCRIPTORS
// ============================================================================

/// Where a column's values come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnSource {
    Data,
    Derived,
    Percentage,
}

/// Everything downstream stages need to know about one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub name: String,
    pub inferred_type: ColumnType,
    pub match_mode: MatchMode,
    pub is_multiselect_eligible: bool,
    pub source: ColumnSource,
}

/// The filter strategy bound to a column type.
pub fn match_mode_for(column_type: ColumnType, text_filter: bool) -> MatchMode {
    match column_type {
        ColumnType::Boolean => MatchMode::Equals,
        ColumnType::Date => MatchMode::DateRange,
        ColumnType::Number => MatchMode::Contains,
        ColumnType::String if text_filter => MatchMode::Contains,
        ColumnType::String => MatchMode::In,
    }
}

/// The ordered column list with per-column metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet {
    descriptors: Vec<ColumnDescriptor>,
}

impl ColumnSet {
    /// Discovers and types the columns of `rows` under `config`.
    pub fn infer(rows: &[RowRef], config: &PipelineConfig, settings: &PipelineSettings) -> Self {
        let resolver = FieldResolver::new(config);
        let descriptors = discover_columns(rows, config, settings)
            .into_iter()
            .map(|name| {
                let source = if resolver.derived_spec(&name).is_some() {
                    ColumnSource::Derived
                } else if resolver.percentage_spec(&name).is_some() {
                    ColumnSource::Percentage
                } else {
                    ColumnSource::Data
                };
                let inferred_type = match config.type_overrides.get(&name) {
                    Some(declared) => *declared,
                    None if source != ColumnSource::Data => ColumnType::Number,
                    None => infer_column_type(rows, &name, &resolver, settings),
                };
                let match_mode = match_mode_for(inferred_type, config.is_text_filter_column(&name));
                ColumnDescriptor {
                    name,
                    inferred_type,
                    match_mode,
                    is_multiselect_eligible: match_mode == MatchMode::In,
                    source,
                }
            })
            .collect();
        ColumnSet { descriptors }
    }

    pub fn from_descriptors(descriptors: Vec<ColumnDescriptor>) -> Self {
        ColumnSet { descriptors }
    }

    pub fn descriptors(&self) -> &[ColumnDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The column's type. Fields outside the column list are strings.
    pub fn type_of(&self, name: &str) -> ColumnType {
        self.get(name).map(|d| d.inferred_type).unwrap_or_default()
    }

    pub fn names(&self) -> Vec<String> {
        self.descriptors.iter().map(|d| d.name.clone()).collect()
    }

    pub fn types(&self) -> BTreeMap<String, ColumnType> {
        self.descriptors
            .iter()
            .map(|d| (d.name.clone(), d.inferred_type))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// The ordered column names: observed keys of the sample (or the allow-list
/// order when one is set), then computed columns.
pub fn discover_columns(
    rows: &[RowRef],
    config: &PipelineConfig,
    settings: &PipelineSettings,
) -> Vec<String> {
    let sample = &rows[..rows.len().min(settings.sample_size)];
    let resolver = FieldResolver::new(config);

    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut observed: Vec<&str> = Vec::new();
    for row in sample {
        for key in row.keys() {
            if seen.insert(key) {
                observed.push(key);
            }
        }
    }

    let mut columns: Vec<String> = match &config.allowed_columns {
        Some(allowed) => allowed
            .iter()
            .filter(|name| {
                seen.contains(name.as_str())
                    || resolver.is_computed(name)
                    || sample.iter().any(|row| row.get_field(name).is_some())
            })
            .cloned()
            .collect(),
        None => observed.iter().map(|k| k.to_string()).collect(),
    };

    for name in resolver.computed_names() {
        if !columns.iter().any(|c| c == name) {
            columns.push(name.to_string());
        }
    }
    columns
}
