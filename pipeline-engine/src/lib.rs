//! FILENAME: pipeline-engine/src/lib.rs
//! Tabular data pipeline over schemaless rows.
//!
//! One pass turns a dataset and a configuration into
//! `filtered -> grouped -> sorted -> paginated` views, plus column metadata,
//! option lists and footer totals. The engine is synchronous and total: it
//! never fails on empty or malformed data.
//!
//! Layers:
//! - `definition`: Serializable configuration (what a pass IS)
//! - `columns` / `inference`: Column discovery and typing
//! - `filter` / `aggregate` / `grouping` / `sort` / `pagination` / `options`: The stages
//! - `view`: Output of a pass (WHAT we display)
//! - `engine`: The calculator composing the stages (HOW we calculate)
//! - `cache` / `slots` / `scheduler`: Memoisation, multi-slot runner, filter commit timing

pub mod definition;
pub mod error;
pub mod inference;
pub mod columns;
pub mod filter;
pub mod aggregate;
pub mod grouping;
pub mod sort;
pub mod pagination;
pub mod options;
pub mod view;
pub mod engine;
pub mod cache;
pub mod slots;
pub mod scheduler;

pub use definition::*;
pub use error::PipelineError;
pub use columns::{match_mode_for, ColumnDescriptor, ColumnSet, ColumnSource, FieldResolver};
pub use inference::{classify_value, infer_column_type, TypeEvidence, ValueClass};
pub use filter::{apply_filters, compile_filters, row_passes, CompiledClause, CompiledFilter};
pub use aggregate::{ColumnAccumulator, GroupScope, Summarizer};
pub use grouping::{
    drill_down as group_leaves, find_group, leaf_view, summary_view, total_leaf_count,
    GroupChildren, GroupKey, GroupNode, GroupPath, LeafEntry, SummaryEntry,
};
pub use sort::{compare_rows, compare_text, compare_values, effective_sort_spec, sort_rows, SortKey};
pub use pagination::{paginate, paginate_groups, PageInfo};
pub use options::{distinct_values, option_values, options_by_column, OptionValue, OptionValues};
pub use view::{flatten_for_export, DrillDownResult, ExportRow, ExportRowKind, PipelineOutput, RowSet};
pub use engine::{compute_pipeline, compute_pipeline_json, drill_down, PipelineCalculator};
pub use cache::{CacheStats, PipelineCache};
pub use slots::{MultiSlotPipeline, PipelineContext, SlotId};
pub use scheduler::{CommitPolicy, FilterCommitQueue};

pub use grid_engine::{Dataset, Row, RowRef, Value};
