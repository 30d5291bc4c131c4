//! FILENAME: pipeline-engine/src/engine.rs
//! Pipeline Engine - Runs one pass: filter, group, sort, paginate.
//!
//! The calculator is a pure function of (rows, config, settings). It never
//! mutates a source row and never fails; malformed data degrades to empty or
//! string-typed results.

use std::sync::Arc;

use grid_engine::{log_debug, log_enter, log_exit, Dataset, RowRef};

use crate::aggregate::Summarizer;
use crate::columns::{ColumnSet, FieldResolver};
use crate::definition::{PipelineConfig, PipelineSettings};
use crate::filter::{apply_filters, compile_filters};
use crate::grouping::{find_group, GroupBuilder, GroupKey, GroupNode};
use crate::options::options_by_column;
use crate::pagination::{paginate, paginate_groups, PageInfo};
use crate::sort::{effective_sort_spec, sort_rows, GroupSorter, SortKey};
use crate::view::{DrillDownResult, PipelineOutput, RowSet};

// ============================================================================
// PIPELINE CALCULATOR
// ============================================================================

/// Computes one pipeline pass over a row slice.
pub struct PipelineCalculator<'a> {
    rows: &'a [RowRef],
    config: &'a PipelineConfig,
    settings: &'a PipelineSettings,
    columns: Arc<ColumnSet>,
    resolver: FieldResolver<'a>,
}

impl<'a> PipelineCalculator<'a> {
    /// Creates a calculator, inferring the column metadata from `rows`.
    pub fn new(rows: &'a [RowRef], config: &'a PipelineConfig, settings: &'a PipelineSettings) -> Self {
        let columns = Arc::new(ColumnSet::infer(rows, config, settings));
        Self::with_columns(rows, config, settings, columns)
    }

    /// Creates a calculator over previously inferred column metadata.
    pub fn with_columns(
        rows: &'a [RowRef],
        config: &'a PipelineConfig,
        settings: &'a PipelineSettings,
        columns: Arc<ColumnSet>,
    ) -> Self {
        PipelineCalculator {
            rows,
            config,
            settings,
            columns,
            resolver: FieldResolver::new(config),
        }
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    fn summarizer(&self) -> Summarizer<'_> {
        Summarizer::new(&self.columns, self.resolver, self.settings)
    }

    /// Executes the full pass.
    pub fn calculate(&self) -> PipelineOutput {
        log_enter!("PIPELINE", "calculate", "rows={}", self.rows.len());

        // Step 1: Filter
        let filtered_data = self.filter_rows();

        // Step 2: Group and aggregate
        let group_fields = self.config.active_group_fields();
        let grouped_data = if group_fields.is_empty() {
            None
        } else {
            Some(self.group_rows(&filtered_data))
        };

        // Step 3: Sort
        let sorted_data = match &grouped_data {
            Some(groups) => RowSet::Groups(self.sort_groups(groups)),
            None => RowSet::Rows(self.sort_flat(&filtered_data)),
        };

        // Step 4: Paginate
        let (paginated_data, page) = self.paginate(&sorted_data);

        // Step 5: Footer totals and option lists
        let totals_row = if self.columns.is_empty() {
            None
        } else {
            Some(Arc::new(self.summarizer().totals(&filtered_data)))
        };
        let option_values_by_column =
            options_by_column(self.rows, &self.config.filters, &self.columns, &self.resolver);

        log_debug!(
            "PIPELINE",
            "filtered={} groups={} page_items={}",
            filtered_data.len(),
            grouped_data.as_ref().map_or(0, Vec::len),
            paginated_data.len()
        );

        let output = PipelineOutput {
            columns: self.columns.names(),
            column_types: self.columns.types(),
            descriptors: self.columns.descriptors().to_vec(),
            filtered_data,
            grouped_data,
            sorted_data,
            paginated_data,
            page,
            totals_row,
            option_values_by_column,
        };
        log_exit!("PIPELINE", "calculate", "page_rows={}", output.paginated_data.leaf_count());
        output
    }

    /// Step 1: rows passing every active filter, in source order.
    pub fn filter_rows(&self) -> Vec<RowRef> {
        let compiled = compile_filters(&self.config.filters, &self.columns, None);
        apply_filters(self.rows, &compiled, &self.resolver)
    }

    /// Step 2: the unsorted group tree.
    pub fn group_rows(&self, rows: &[RowRef]) -> Vec<GroupNode> {
        GroupBuilder::new(self.resolver, self.summarizer()).build(rows, self.config.active_group_fields())
    }

    /// Step 3 (grouped): group fields first, then the user's keys.
    pub fn sort_groups(&self, groups: &[GroupNode]) -> Vec<GroupNode> {
        GroupSorter::new(
            &self.columns,
            self.resolver,
            self.config.active_group_fields(),
            &self.config.sort_spec,
        )
        .sort(groups)
    }

    /// Step 3 (flat): the user's keys only.
    pub fn sort_flat(&self, rows: &[RowRef]) -> Vec<RowRef> {
        let keys: Vec<SortKey> = effective_sort_spec(&[], &self.config.sort_spec)
            .iter()
            .map(|s| SortKey::resolve(s, &self.columns))
            .collect();
        sort_rows(rows, &keys, &self.resolver)
    }

    /// Step 4: slice rows, or top-level groups when grouped.
    pub fn paginate(&self, sorted: &RowSet) -> (RowSet, PageInfo) {
        let window = self.config.pagination;
        match sorted {
            RowSet::Rows(rows) => (RowSet::Rows(paginate(rows, window)), PageInfo::new(rows.len(), window)),
            RowSet::Groups(groups) => {
                let (page, info) = paginate_groups(groups, window, self.config.null_group_placement);
                (RowSet::Groups(page), info)
            }
        }
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Runs one pipeline pass over a dataset.
pub fn compute_pipeline(
    data: &Dataset,
    config: &PipelineConfig,
    settings: &PipelineSettings,
) -> PipelineOutput {
    PipelineCalculator::new(data.rows(), config, settings).calculate()
}

/// Runs one pipeline pass over a JSON row array (`null` counts as no rows).
pub fn compute_pipeline_json(
    rows_json: &str,
    config_json: &str,
    settings: &PipelineSettings,
) -> Result<PipelineOutput, crate::error::PipelineError> {
    let data = Dataset::from_json(rows_json)?;
    let config = PipelineConfig::from_json(config_json)?;
    Ok(compute_pipeline(&data, &config, settings))
}

/// Returns the leaf rows behind the group at `path` in a computed output,
/// keeping at most `max_records` of them.
pub fn drill_down(output: &PipelineOutput, path: &[GroupKey], max_records: usize) -> Option<DrillDownResult> {
    let groups = output.sorted_data.groups()?;
    let group = find_group(groups, path)?;

    let mut result = DrillDownResult::new(path.to_vec(), output.columns.clone(), max_records);
    result.total_count = group.leaf_count();
    result.rows = group.leaf_rows.iter().take(max_records).cloned().collect();
    result.is_truncated = result.total_count > result.rows.len();
    Some(result)
}
