//! FILENAME: pipeline-engine/src/cache.rs
//! Memoisation of pipeline passes.
//!
//! A pass is keyed on the dataset's identity and a structural hash of the
//! configuration. The hash only narrows the search; a hit also requires the
//! stored configuration to compare equal. Each entry holds a clone of its
//! `Dataset`, which keeps the rows alive so a pointer identity can never be
//! reused by a different dataset while the entry exists.
//!
//! Column metadata is cached on its own, since most state changes (filters,
//! sort, pagination, grouping) leave it untouched.

use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use grid_engine::{log_debug, Dataset};
use rustc_hash::FxHasher;
use serde::Serialize;

use crate::columns::ColumnSet;
use crate::definition::{PipelineConfig, PipelineSettings};
use crate::engine::PipelineCalculator;
use crate::view::PipelineOutput;

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub column_inferences: u64,
    pub evictions: u64,
}

/// The configuration parts column metadata depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnInputs {
    config: PipelineConfig,
}

impl ColumnInputs {
    fn from_config(config: &PipelineConfig) -> Self {
        ColumnInputs {
            config: PipelineConfig {
                allowed_columns: config.allowed_columns.clone(),
                derived_columns: config.derived_columns.clone(),
                percentage_columns: config.percentage_columns.clone(),
                text_filter_columns: config.text_filter_columns.clone(),
                type_overrides: config.type_overrides.clone(),
                ..PipelineConfig::default()
            },
        }
    }
}

struct ColumnEntry {
    dataset: Dataset,
    inputs: ColumnInputs,
    columns: Arc<ColumnSet>,
}

struct OutputEntry {
    key: u64,
    dataset: Dataset,
    config: PipelineConfig,
    output: Arc<PipelineOutput>,
}

/// A bounded memo of pipeline outputs for one slot.
pub struct PipelineCache {
    settings: PipelineSettings,
    columns: Option<ColumnEntry>,
    /// Least recently used first.
    entries: VecDeque<OutputEntry>,
    stats: CacheStats,
}

fn memo_key(data: &Dataset, config: &PipelineConfig) -> u64 {
    let mut hasher = FxHasher::default();
    data.identity().hash(&mut hasher);
    data.len().hash(&mut hasher);
    config.hash(&mut hasher);
    hasher.finish()
}

impl PipelineCache {
    pub fn new(settings: PipelineSettings) -> Self {
        PipelineCache {
            settings,
            columns: None,
            entries: VecDeque::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.columns = None;
    }

    /// The output for `(data, config)`, computed only on a miss.
    pub fn compute(&mut self, data: &Dataset, config: &PipelineConfig) -> Arc<PipelineOutput> {
        let key = memo_key(data, config);

        if let Some(pos) = self
            .entries
            .iter()
            .position(|e| e.key == key && e.dataset.same_as(data) && e.config == *config)
        {
            self.stats.hits += 1;
            log_debug!("CACHE", "hit key={:016x}", key);
            if let Some(entry) = self.entries.remove(pos) {
                let output = Arc::clone(&entry.output);
                self.entries.push_back(entry);
                return output;
            }
        }

        self.stats.misses += 1;
        log_debug!("CACHE", "miss key={:016x} rows={}", key, data.len());

        let columns = self.columns_for(data, config);
        let output = Arc::new(
            PipelineCalculator::with_columns(data.rows(), config, &self.settings, columns).calculate(),
        );

        self.entries.push_back(OutputEntry {
            key,
            dataset: data.clone(),
            config: config.clone(),
            output: Arc::clone(&output),
        });
        while self.entries.len() > self.settings.memo_capacity.max(1) {
            self.entries.pop_front();
            self.stats.evictions += 1;
        }
        output
    }

    /// Column metadata for `(data, config)`, re-inferred only when the
    /// dataset or a column-shaping option changed.
    pub fn columns_for(&mut self, data: &Dataset, config: &PipelineConfig) -> Arc<ColumnSet> {
        let inputs = ColumnInputs::from_config(config);
        if let Some(entry) = &self.columns {
            if entry.dataset.same_as(data) && entry.inputs == inputs {
                return Arc::clone(&entry.columns);
            }
        }
        self.stats.column_inferences += 1;
        let columns = Arc::new(ColumnSet::infer(data.rows(), config, &self.settings));
        self.columns = Some(ColumnEntry {
            dataset: data.clone(),
            inputs,
            columns: Arc::clone(&columns),
        });
        columns
    }
}

impl Default for PipelineCache {
    fn default() -> Self {
        PipelineCache::new(PipelineSettings::default())
    }
}
