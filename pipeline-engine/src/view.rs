//! FILENAME: pipeline-engine/src/view.rs
//! Pipeline View - The output of one pass, ready for a renderer.
//!
//! Every stage's result is kept so the caller can show intermediate states
//! (e.g. the filtered count next to the page). Rows are shared `RowRef`s
//! pointing into the source dataset; summary rows are the only rows the
//! pipeline creates.

use std::collections::BTreeMap;
use std::sync::Arc;

use grid_engine::RowRef;
use serde::Serialize;

use crate::columns::ColumnDescriptor;
use crate::definition::ColumnType;
use crate::grouping::{GroupChildren, GroupKey, GroupNode, GroupPath};
use crate::options::OptionValues;
use crate::pagination::PageInfo;

// ============================================================================
// ROW SETS
// ============================================================================

/// A flat row sequence or a group tree, depending on whether grouping is on.
#[derive(Debug, Clone)]
pub enum RowSet {
    Rows(Vec<RowRef>),
    Groups(Vec<GroupNode>),
}

impl Default for RowSet {
    fn default() -> Self {
        RowSet::Rows(Vec::new())
    }
}

impl RowSet {
    /// Number of top-level items (rows, or top-level groups).
    pub fn len(&self) -> usize {
        match self {
            RowSet::Rows(rows) => rows.len(),
            RowSet::Groups(groups) => groups.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn rows(&self) -> Option<&[RowRef]> {
        match self {
            RowSet::Rows(rows) => Some(rows),
            RowSet::Groups(_) => None,
        }
    }

    pub fn groups(&self) -> Option<&[GroupNode]> {
        match self {
            RowSet::Groups(groups) => Some(groups),
            RowSet::Rows(_) => None,
        }
    }

    /// All data rows in display order.
    pub fn leaf_rows(&self) -> Vec<RowRef> {
        match self {
            RowSet::Rows(rows) => rows.clone(),
            RowSet::Groups(groups) => groups
                .iter()
                .flat_map(|g| g.leaf_rows.iter().map(Arc::clone))
                .collect(),
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            RowSet::Rows(rows) => rows.len(),
            RowSet::Groups(groups) => groups.iter().map(GroupNode::leaf_count).sum(),
        }
    }
}

// ============================================================================
// EXPORT FLATTENING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportRowKind {
    Summary,
    Data,
}

/// One line of an export: a row with its nesting depth.
#[derive(Debug, Clone)]
pub struct ExportRow {
    pub depth: usize,
    pub kind: ExportRowKind,
    pub path: GroupPath,
    pub row: RowRef,
}

/// Flattens a row set for export: each group's summary row followed by its
/// children, depth-first. Data rows sit one level below their group.
pub fn flatten_for_export(set: &RowSet) -> Vec<ExportRow> {
    let mut out = Vec::new();
    match set {
        RowSet::Rows(rows) => out.extend(rows.iter().map(|row| ExportRow {
            depth: 0,
            kind: ExportRowKind::Data,
            path: GroupPath::new(),
            row: Arc::clone(row),
        })),
        RowSet::Groups(groups) => {
            for group in groups {
                export_group(group, &mut out);
            }
        }
    }
    out
}

fn export_group(group: &GroupNode, out: &mut Vec<ExportRow>) {
    out.push(ExportRow {
        depth: group.level,
        kind: ExportRowKind::Summary,
        path: group.path.clone(),
        row: Arc::clone(&group.summary_row),
    });
    match &group.children {
        GroupChildren::Groups(children) => {
            for child in children {
                export_group(child, out);
            }
        }
        GroupChildren::Rows(rows) => out.extend(rows.iter().map(|row| ExportRow {
            depth: group.level + 1,
            kind: ExportRowKind::Data,
            path: group.path.clone(),
            row: Arc::clone(row),
        })),
    }
}

// ============================================================================
// DRILL DOWN
// ============================================================================

/// The source rows behind one group, capped at `max_records`.
#[derive(Debug, Clone)]
pub struct DrillDownResult {
    pub path: Vec<GroupKey>,
    pub headers: Vec<String>,
    pub rows: Vec<RowRef>,
    pub total_count: usize,
    pub max_records: usize,
    pub is_truncated: bool,
}

impl DrillDownResult {
    pub fn new(path: Vec<GroupKey>, headers: Vec<String>, max_records: usize) -> Self {
        DrillDownResult {
            path,
            headers,
            rows: Vec::new(),
            total_count: 0,
            max_records,
            is_truncated: false,
        }
    }
}

// ============================================================================
// PIPELINE OUTPUT
// ============================================================================

/// Everything one pass produces.
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    /// Visible columns in display order.
    pub columns: Vec<String>,
    pub column_types: BTreeMap<String, ColumnType>,
    pub descriptors: Vec<ColumnDescriptor>,

    /// Rows passing every active filter, in source order.
    pub filtered_data: Vec<RowRef>,

    /// The unsorted group tree; `None` when grouping is off.
    pub grouped_data: Option<Vec<GroupNode>>,

    pub sorted_data: RowSet,
    pub paginated_data: RowSet,
    pub page: PageInfo,

    /// Grand totals over `filtered_data`.
    pub totals_row: Option<RowRef>,

    pub option_values_by_column: BTreeMap<String, OptionValues>,
}

impl PipelineOutput {
    pub fn is_grouped(&self) -> bool {
        self.grouped_data.is_some()
    }

    /// Rows shown on the current page, flattened.
    pub fn page_rows(&self) -> Vec<RowRef> {
        self.paginated_data.leaf_rows()
    }

    pub fn export_rows(&self) -> Vec<ExportRow> {
        flatten_for_export(&self.sorted_data)
    }
}
