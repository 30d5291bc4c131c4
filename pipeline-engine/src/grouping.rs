//! FILENAME: pipeline-engine/src/grouping.rs
//! Hierarchical grouping.
//!
//! Rows are partitioned recursively by the configured group fields. Each
//! partition becomes a `GroupNode` carrying its key path, its summary row,
//! and either child groups or (at the innermost level) the member rows.
//! Partitions keep the order in which their keys first appear; ordering is
//! the sort stage's job.

use grid_engine::{RowRef, Value};
use rustc_hash::FxHashMap;
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::Arc;

use crate::aggregate::{GroupScope, Summarizer};
use crate::columns::FieldResolver;

// ============================================================================
// GROUP KEYS
// ============================================================================

/// The stringified grouping value. Null and blank values share one sentinel
/// key so they form a single group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Null,
    Value(String),
}

impl GroupKey {
    pub fn from_value(value: &Value) -> Self {
        if value.is_empty() {
            GroupKey::Null
        } else {
            GroupKey::Value(value.to_display())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, GroupKey::Null)
    }

    /// Display label for headers.
    pub fn label(&self) -> &str {
        match self {
            GroupKey::Null => "(blank)",
            GroupKey::Value(s) => s,
        }
    }
}

impl From<&str> for GroupKey {
    fn from(s: &str) -> Self {
        GroupKey::Value(s.to_string())
    }
}

/// Keys from the outermost level down to a group.
pub type GroupPath = SmallVec<[GroupKey; 4]>;

// ============================================================================
// GROUP TREE
// ============================================================================

/// What sits below a group.
#[derive(Debug, Clone)]
pub enum GroupChildren {
    Groups(Vec<GroupNode>),
    Rows(Vec<RowRef>),
}

/// One node of the group tree.
#[derive(Debug, Clone)]
pub struct GroupNode {
    pub group_key: GroupKey,
    /// Zero-based depth (0 = outermost group field).
    pub level: usize,
    pub field: String,
    pub path: GroupPath,
    pub summary_row: RowRef,
    /// Every row in this group, across all deeper levels.
    pub leaf_rows: Vec<RowRef>,
    pub children: GroupChildren,
}

impl GroupNode {
    pub fn leaf_count(&self) -> usize {
        self.leaf_rows.len()
    }

    pub fn child_groups(&self) -> &[GroupNode] {
        match &self.children {
            GroupChildren::Groups(groups) => groups,
            GroupChildren::Rows(_) => &[],
        }
    }

    /// Member rows in display order when this is an innermost group.
    pub fn rows(&self) -> Option<&[RowRef]> {
        match &self.children {
            GroupChildren::Rows(rows) => Some(rows),
            GroupChildren::Groups(_) => None,
        }
    }

    pub fn is_innermost(&self) -> bool {
        matches!(self.children, GroupChildren::Rows(_))
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Partitions rows into a group tree with summary rows.
pub struct GroupBuilder<'a> {
    resolver: FieldResolver<'a>,
    summarizer: Summarizer<'a>,
}

impl<'a> GroupBuilder<'a> {
    pub fn new(resolver: FieldResolver<'a>, summarizer: Summarizer<'a>) -> Self {
        GroupBuilder { resolver, summarizer }
    }

    /// Builds the tree for `fields` (outer to inner). No fields, no groups.
    pub fn build(&self, rows: &[RowRef], fields: &[String]) -> Vec<GroupNode> {
        if fields.is_empty() {
            return Vec::new();
        }
        self.build_level(rows, fields, 0, &GroupPath::new(), &[])
    }

    fn build_level(
        &self,
        rows: &[RowRef],
        fields: &[String],
        level: usize,
        parent_path: &GroupPath,
        ancestors: &[(String, Value)],
    ) -> Vec<GroupNode> {
        let field = &fields[level];
        let deeper = &fields[level + 1..];

        self.partition(rows, field)
            .into_iter()
            .map(|partition| {
                let mut path = parent_path.clone();
                path.push(partition.key.clone());

                let scope = GroupScope {
                    level: Some((field.as_str(), &partition.representative)),
                    ancestors,
                    deeper,
                };
                let summary_row = Arc::new(self.summarizer.summarize(&partition.rows, &scope));

                let children = if deeper.is_empty() {
                    GroupChildren::Rows(partition.rows.clone())
                } else {
                    let mut inner = ancestors.to_vec();
                    inner.push((field.clone(), partition.representative.clone()));
                    GroupChildren::Groups(self.build_level(&partition.rows, fields, level + 1, &path, &inner))
                };

                GroupNode {
                    group_key: partition.key,
                    level,
                    field: field.clone(),
                    path,
                    summary_row,
                    leaf_rows: partition.rows,
                    children,
                }
            })
            .collect()
    }

    /// Splits rows by the stringified value of `field`, in first-appearance
    /// order. The representative value is the first original value seen.
    fn partition(&self, rows: &[RowRef], field: &str) -> Vec<Partition> {
        let mut index: FxHashMap<GroupKey, usize> = FxHashMap::default();
        let mut partitions: Vec<Partition> = Vec::new();

        for row in rows {
            let value = self.resolver.value(row, field);
            let key = GroupKey::from_value(&value);
            match index.get(&key) {
                Some(&i) => partitions[i].rows.push(Arc::clone(row)),
                None => {
                    index.insert(key.clone(), partitions.len());
                    let representative = if key.is_null() { Value::Null } else { value.into_owned() };
                    partitions.push(Partition {
                        key,
                        representative,
                        rows: vec![Arc::clone(row)],
                    });
                }
            }
        }
        partitions
    }
}

struct Partition {
    key: GroupKey,
    representative: Value,
    rows: Vec<RowRef>,
}

// ============================================================================
// TREE QUERIES
// ============================================================================

/// The group at `path`, walking from the top level.
pub fn find_group<'g>(groups: &'g [GroupNode], path: &[GroupKey]) -> Option<&'g GroupNode> {
    let (first, rest) = path.split_first()?;
    let node = groups.iter().find(|g| &g.group_key == first)?;
    if rest.is_empty() {
        Some(node)
    } else {
        find_group(node.child_groups(), rest)
    }
}

/// The leaf rows under the group at `path`.
pub fn drill_down<'g>(groups: &'g [GroupNode], path: &[GroupKey]) -> Option<&'g [RowRef]> {
    find_group(groups, path).map(|g| g.leaf_rows.as_slice())
}

/// A leaf row with the path of the innermost group holding it.
#[derive(Debug, Clone)]
pub struct LeafEntry {
    pub path: GroupPath,
    pub row: RowRef,
}

/// Every leaf row, depth-first in display order.
pub fn leaf_view(groups: &[GroupNode]) -> Vec<LeafEntry> {
    let mut out = Vec::new();
    for group in groups {
        collect_leaves(group, &mut out);
    }
    out
}

fn collect_leaves(group: &GroupNode, out: &mut Vec<LeafEntry>) {
    match &group.children {
        GroupChildren::Rows(rows) => out.extend(rows.iter().map(|row| LeafEntry {
            path: group.path.clone(),
            row: Arc::clone(row),
        })),
        GroupChildren::Groups(children) => {
            for child in children {
                collect_leaves(child, out);
            }
        }
    }
}

/// A group header in the summary view.
#[derive(Debug, Clone)]
pub struct SummaryEntry {
    pub level: usize,
    pub path: GroupPath,
    pub row: RowRef,
    pub leaf_count: usize,
}

/// Every group's summary row, parents before children.
pub fn summary_view(groups: &[GroupNode]) -> Vec<SummaryEntry> {
    let mut out = Vec::new();
    let mut stack: Vec<&GroupNode> = groups.iter().rev().collect();
    while let Some(group) = stack.pop() {
        out.push(SummaryEntry {
            level: group.level,
            path: group.path.clone(),
            row: Arc::clone(&group.summary_row),
            leaf_count: group.leaf_count(),
        });
        stack.extend(group.child_groups().iter().rev());
    }
    out
}

/// Total number of leaf rows across top-level groups.
pub fn total_leaf_count(groups: &[GroupNode]) -> usize {
    groups.iter().map(GroupNode::leaf_count).sum()
}
