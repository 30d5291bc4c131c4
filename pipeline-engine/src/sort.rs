//! FILENAME: pipeline-engine/src/sort.rs
//! Multi-key ordering for flat rows and group trees.
//!
//! Each sort key compares by its column type. All sorts are stable, so equal
//! rows keep their incoming order and sorting an already sorted sequence
//! changes nothing.

use std::cmp::Ordering;
use std::sync::Arc;

use grid_engine::{timestamp_millis, Row, RowRef, Value};

use crate::columns::{ColumnSet, FieldResolver};
use crate::definition::{ColumnType, SortDirection, SortSpec};
use crate::grouping::{GroupChildren, GroupNode};

/// A sort entry resolved against the column list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
    pub column_type: ColumnType,
}

impl SortKey {
    pub fn resolve(spec: &SortSpec, columns: &ColumnSet) -> Self {
        SortKey {
            field: spec.field.clone(),
            direction: spec.direction,
            column_type: columns.type_of(&spec.field),
        }
    }
}

/// The sort spec actually applied: every group field ascending first, then
/// the user entries that do not name a group field. Repeated fields keep
/// their first entry.
pub fn effective_sort_spec(group_fields: &[String], user: &[SortSpec]) -> Vec<SortSpec> {
    let mut spec: Vec<SortSpec> = group_fields.iter().map(SortSpec::ascending).collect();
    for entry in user {
        if !spec.iter().any(|s| s.field == entry.field) {
            spec.push(entry.clone());
        }
    }
    spec
}

// ============================================================================
// COMPARATORS
// ============================================================================

/// Case-insensitive text order with a case-sensitive tie-break, so that the
/// order is total.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

fn date_key(value: &Value) -> i64 {
    value.as_date().map(|d| timestamp_millis(&d)).unwrap_or(0)
}

/// Compares two cells under a column type. Unreadable numbers and dates
/// count as zero; unreadable flags as false.
pub fn compare_values(a: &Value, b: &Value, column_type: ColumnType) -> Ordering {
    match column_type {
        ColumnType::Number => a.coerce_f64().total_cmp(&b.coerce_f64()),
        ColumnType::Date => date_key(a).cmp(&date_key(b)),
        ColumnType::Boolean => a
            .as_bool_loose()
            .unwrap_or(false)
            .cmp(&b.as_bool_loose().unwrap_or(false)),
        ColumnType::String => compare_text(&a.to_display(), &b.to_display()),
    }
}

/// Compares two rows key by key; the first non-equal key decides.
pub fn compare_rows(a: &Row, b: &Row, keys: &[SortKey], resolver: &FieldResolver<'_>) -> Ordering {
    for key in keys {
        let ordering = compare_values(
            &resolver.value(a, &key.field),
            &resolver.value(b, &key.field),
            key.column_type,
        );
        let ordering = match key.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

// ============================================================================
// SORTING
// ============================================================================

/// Returns a stably sorted copy of `rows`. Row identity is preserved.
pub fn sort_rows(rows: &[RowRef], keys: &[SortKey], resolver: &FieldResolver<'_>) -> Vec<RowRef> {
    let mut sorted = rows.to_vec();
    if !keys.is_empty() {
        sorted.sort_by(|a, b| compare_rows(a, b, keys, resolver));
    }
    sorted
}

/// Orders a group tree. At each level the groups are ordered by that level's
/// group field (ascending) and then by the user keys; leaves inside the
/// innermost groups are ordered by the user keys. `leaf_rows` of every group
/// is rebuilt to follow the resulting display order.
pub struct GroupSorter<'a> {
    columns: &'a ColumnSet,
    resolver: FieldResolver<'a>,
    user_keys: Vec<SortKey>,
}

impl<'a> GroupSorter<'a> {
    pub fn new(
        columns: &'a ColumnSet,
        resolver: FieldResolver<'a>,
        group_fields: &[String],
        user_spec: &[SortSpec],
    ) -> Self {
        let user_keys = user_spec
            .iter()
            .filter(|s| !group_fields.contains(&s.field))
            .map(|s| SortKey::resolve(s, columns))
            .collect();
        GroupSorter { columns, resolver, user_keys }
    }

    pub fn sort(&self, groups: &[GroupNode]) -> Vec<GroupNode> {
        let Some(first) = groups.first() else {
            return Vec::new();
        };
        let mut keys = Vec::with_capacity(self.user_keys.len() + 1);
        keys.push(SortKey::resolve(&SortSpec::ascending(first.field.as_str()), self.columns));
        keys.extend(self.user_keys.iter().cloned());

        let mut sorted: Vec<GroupNode> = groups.iter().map(|g| self.sort_node(g)).collect();
        sorted.sort_by(|a, b| compare_rows(&a.summary_row, &b.summary_row, &keys, &self.resolver));
        sorted
    }

    fn sort_node(&self, group: &GroupNode) -> GroupNode {
        let (children, leaf_rows) = match &group.children {
            GroupChildren::Rows(rows) => {
                let rows = sort_rows(rows, &self.user_keys, &self.resolver);
                (GroupChildren::Rows(rows.clone()), rows)
            }
            GroupChildren::Groups(inner) => {
                let inner = self.sort(inner);
                let leaves = inner
                    .iter()
                    .flat_map(|g| g.leaf_rows.iter().map(Arc::clone))
                    .collect();
                (GroupChildren::Groups(inner), leaves)
            }
        };
        GroupNode {
            group_key: group.group_key.clone(),
            level: group.level,
            field: group.field.clone(),
            path: group.path.clone(),
            summary_row: Arc::clone(&group.summary_row),
            leaf_rows,
            children,
        }
    }
}
