//! FILENAME: pipeline-engine/src/slots.rs
//! Multi-slot pipelines over one shared dataset.
//!
//! Each slot owns its configuration and its memo cache. Slots share nothing
//! except the base dataset, which is read-only to all of them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use grid_engine::{log_info, Dataset};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheStats, PipelineCache};
use crate::definition::{ColumnFilter, PaginationWindow, PipelineConfig, PipelineSettings, SortSpec};
use crate::engine::compute_pipeline;
use crate::error::PipelineError;
use crate::view::PipelineOutput;

/// Names one independently configured pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(String);

impl SlotId {
    pub fn new(id: impl Into<String>) -> Self {
        SlotId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SlotId {
    fn from(id: &str) -> Self {
        SlotId(id.to_string())
    }
}

/// Everything one slot's pass needs: its own configuration and the shared
/// base dataset. Nothing else is reachable from a slot computation.
#[derive(Debug, Clone, Copy)]
pub struct PipelineContext<'a> {
    pub slot: &'a SlotId,
    pub base: &'a Dataset,
    pub config: &'a PipelineConfig,
    pub settings: &'a PipelineSettings,
}

impl<'a> PipelineContext<'a> {
    /// An uncached pass for this slot.
    pub fn compute(&self) -> PipelineOutput {
        compute_pipeline(self.base, self.config, self.settings)
    }
}

struct SlotState {
    config: PipelineConfig,
    cache: PipelineCache,
}

/// Named pipelines over one base dataset.
pub struct MultiSlotPipeline {
    base: Dataset,
    settings: PipelineSettings,
    slots: BTreeMap<SlotId, SlotState>,
}

impl MultiSlotPipeline {
    pub fn new(base: Dataset, settings: PipelineSettings) -> Self {
        MultiSlotPipeline {
            base,
            settings,
            slots: BTreeMap::new(),
        }
    }

    pub fn base(&self) -> &Dataset {
        &self.base
    }

    /// Replaces the shared dataset. Every slot recomputes on next access.
    pub fn set_base(&mut self, base: Dataset) {
        log_info!("SLOTS", "base replaced rows={}", base.len());
        self.base = base;
        for state in self.slots.values_mut() {
            state.cache.clear();
        }
    }

    pub fn add_slot(&mut self, id: impl Into<SlotId>, config: PipelineConfig) -> Result<(), PipelineError> {
        let id = id.into();
        if self.slots.contains_key(&id) {
            return Err(PipelineError::DuplicateSlot(id.to_string()));
        }
        config.validate()?;
        log_info!("SLOTS", "add slot={}", id);
        self.slots.insert(
            id,
            SlotState {
                config,
                cache: PipelineCache::new(self.settings.clone()),
            },
        );
        Ok(())
    }

    pub fn remove_slot(&mut self, id: &SlotId) -> Result<PipelineConfig, PipelineError> {
        let state = self
            .slots
            .remove(id)
            .ok_or_else(|| PipelineError::UnknownSlot(id.to_string()))?;
        log_info!("SLOTS", "remove slot={}", id);
        Ok(state.config)
    }

    pub fn slot_ids(&self) -> impl Iterator<Item = &SlotId> {
        self.slots.keys()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn state(&self, id: &SlotId) -> Result<&SlotState, PipelineError> {
        self.slots
            .get(id)
            .ok_or_else(|| PipelineError::UnknownSlot(id.to_string()))
    }

    fn state_mut(&mut self, id: &SlotId) -> Result<&mut SlotState, PipelineError> {
        self.slots
            .get_mut(id)
            .ok_or_else(|| PipelineError::UnknownSlot(id.to_string()))
    }

    pub fn config(&self, id: &SlotId) -> Result<&PipelineConfig, PipelineError> {
        Ok(&self.state(id)?.config)
    }

    /// Applies `edit` to a copy of the slot's configuration and keeps it only
    /// if it validates.
    pub fn update_config(
        &mut self,
        id: &SlotId,
        edit: impl FnOnce(&mut PipelineConfig),
    ) -> Result<(), PipelineError> {
        let state = self.state_mut(id)?;
        let mut config = state.config.clone();
        edit(&mut config);
        config.validate()?;
        state.config = config;
        Ok(())
    }

    /// Sets (`Some`) or clears (`None`) one column's filter.
    pub fn set_filter(
        &mut self,
        id: &SlotId,
        column: impl Into<String>,
        filter: Option<ColumnFilter>,
    ) -> Result<(), PipelineError> {
        let column = column.into();
        self.update_config(id, |config| match filter {
            Some(filter) => {
                config.filters.insert(column, filter);
            }
            None => {
                config.filters.remove(&column);
            }
        })
    }

    pub fn set_sort(&mut self, id: &SlotId, sort_spec: Vec<SortSpec>) -> Result<(), PipelineError> {
        self.update_config(id, |config| config.sort_spec = sort_spec)
    }

    pub fn set_pagination(&mut self, id: &SlotId, window: Option<PaginationWindow>) -> Result<(), PipelineError> {
        self.update_config(id, |config| config.pagination = window)
    }

    pub fn set_group_fields(&mut self, id: &SlotId, fields: Option<Vec<String>>) -> Result<(), PipelineError> {
        self.update_config(id, |config| config.group_fields = fields)
    }

    /// The explicit context for one slot's pass.
    pub fn context<'a>(&'a self, id: &'a SlotId) -> Result<PipelineContext<'a>, PipelineError> {
        let state = self.state(id)?;
        Ok(PipelineContext {
            slot: id,
            base: &self.base,
            config: &state.config,
            settings: &self.settings,
        })
    }

    /// The slot's output, served from its memo cache when nothing changed.
    pub fn compute_slot(&mut self, id: &SlotId) -> Result<Arc<PipelineOutput>, PipelineError> {
        let base = &self.base;
        let state = self
            .slots
            .get_mut(id)
            .ok_or_else(|| PipelineError::UnknownSlot(id.to_string()))?;
        Ok(state.cache.compute(base, &state.config))
    }

    /// Outputs for every slot.
    pub fn compute_all(&mut self) -> BTreeMap<SlotId, Arc<PipelineOutput>> {
        let base = &self.base;
        self.slots
            .iter_mut()
            .map(|(id, state)| (id.clone(), state.cache.compute(base, &state.config)))
            .collect()
    }

    pub fn cache_stats(&self, id: &SlotId) -> Result<CacheStats, PipelineError> {
        Ok(self.state(id)?.cache.stats())
    }
}
