//! FILENAME: pipeline-engine/src/options.rs
//! Multiselect option lists.
//!
//! The options offered for a column are the distinct values found in the rows
//! that pass every OTHER active filter, so each list reflects what the rest of
//! the filter state still allows. The column's own selection never narrows
//! its own list.

use std::collections::BTreeMap;

use grid_engine::{RowRef, Value};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::columns::{ColumnSet, FieldResolver};
use crate::definition::{ColumnType, FilterState};
use crate::filter::{compile_filters, row_passes};
use crate::sort::{compare_text, compare_values};

/// One distinct value with the number of rows holding it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionValue {
    pub value: Value,
    pub label: String,
    pub count: usize,
}

/// The option list of one column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionValues {
    pub values: Vec<OptionValue>,
    /// Whether any candidate row has an empty value in this column.
    pub has_blanks: bool,
}

impl OptionValues {
    pub fn labels(&self) -> Vec<&str> {
        self.values.iter().map(|o| o.label.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Collects the distinct values of `column` over `rows`, ordered by the
/// column type's comparator. Values are distinct by display string.
pub fn distinct_values<'r>(
    rows: impl IntoIterator<Item = &'r RowRef>,
    column: &str,
    column_type: ColumnType,
    resolver: &FieldResolver<'_>,
) -> OptionValues {
    let mut index: FxHashMap<String, usize> = FxHashMap::default();
    let mut out = OptionValues::default();

    for row in rows {
        let value = resolver.value(row, column);
        if value.is_empty() {
            out.has_blanks = true;
            continue;
        }
        let label = value.to_display();
        match index.get(&label) {
            Some(&i) => out.values[i].count += 1,
            None => {
                index.insert(label.clone(), out.values.len());
                out.values.push(OptionValue {
                    value: value.into_owned(),
                    label,
                    count: 1,
                });
            }
        }
    }

    out.values.sort_by(|a, b| {
        compare_values(&a.value, &b.value, column_type).then_with(|| compare_text(&a.label, &b.label))
    });
    out
}

/// The cross-filtered option list for one column.
pub fn option_values(
    rows: &[RowRef],
    column: &str,
    filters: &FilterState,
    columns: &ColumnSet,
    resolver: &FieldResolver<'_>,
) -> OptionValues {
    let others = compile_filters(filters, columns, Some(column));
    let candidates = rows.iter().filter(|row| row_passes(row, &others, resolver));
    distinct_values(candidates, column, columns.type_of(column), resolver)
}

/// Option lists for every multiselect-eligible column.
pub fn options_by_column(
    rows: &[RowRef],
    filters: &FilterState,
    columns: &ColumnSet,
    resolver: &FieldResolver<'_>,
) -> BTreeMap<String, OptionValues> {
    columns
        .descriptors()
        .iter()
        .filter(|d| d.is_multiselect_eligible)
        .map(|d| (d.name.clone(), option_values(rows, &d.name, filters, columns, resolver)))
        .collect()
}
