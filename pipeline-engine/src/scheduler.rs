//! FILENAME: pipeline-engine/src/scheduler.rs
//! Filter commit scheduling.
//!
//! Typed filter edits are held back until the user pauses, so a pass is not
//! computed per keystroke. Selections from discrete controls (flags,
//! multiselects, date pickers) and clears are applied at once. The queue owns
//! no timer: the caller passes the current `Instant` and drives `poll`.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::definition::{ColumnFilter, FilterState, PipelineSettings};

/// How an edit reaches the filter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPolicy {
    Immediate,
    Deferred,
}

impl CommitPolicy {
    /// Text edits wait; everything else (including clearing) commits at once.
    pub fn for_edit(filter: Option<&ColumnFilter>) -> Self {
        match filter {
            Some(ColumnFilter::Contains(_)) => CommitPolicy::Deferred,
            _ => CommitPolicy::Immediate,
        }
    }
}

#[derive(Debug, Clone)]
struct PendingEdit {
    filter: Option<ColumnFilter>,
    due: Instant,
}

/// Coalesces filter edits per column.
#[derive(Debug, Clone)]
pub struct FilterCommitQueue {
    delay: Duration,
    pending: BTreeMap<String, PendingEdit>,
}

impl FilterCommitQueue {
    pub fn new(delay: Duration) -> Self {
        FilterCommitQueue {
            delay,
            pending: BTreeMap::new(),
        }
    }

    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self::new(settings.commit_delay())
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Records an edit. Deferred edits replace any pending edit for the
    /// column and restart its delay; immediate edits drop the pending one and
    /// apply now. Returns true when `state` changed.
    pub fn submit(
        &mut self,
        state: &mut FilterState,
        column: impl Into<String>,
        filter: Option<ColumnFilter>,
        now: Instant,
    ) -> bool {
        let column = column.into();
        match CommitPolicy::for_edit(filter.as_ref()) {
            CommitPolicy::Deferred => {
                self.pending.insert(column, PendingEdit { filter, due: now + self.delay });
                false
            }
            CommitPolicy::Immediate => self.commit_now(state, column, filter),
        }
    }

    /// Applies an edit without delay, superseding any pending edit.
    pub fn commit_now(
        &mut self,
        state: &mut FilterState,
        column: impl Into<String>,
        filter: Option<ColumnFilter>,
    ) -> bool {
        let column = column.into();
        self.pending.remove(&column);
        apply_edit(state, column, filter)
    }

    /// Applies every edit whose delay has elapsed at `now`.
    pub fn poll(&mut self, state: &mut FilterState, now: Instant) -> bool {
        let due: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, edit)| edit.due <= now)
            .map(|(column, _)| column.clone())
            .collect();

        let mut changed = false;
        for column in due {
            if let Some(edit) = self.pending.remove(&column) {
                changed |= apply_edit(state, column, edit.filter);
            }
        }
        changed
    }

    /// Applies every pending edit regardless of its deadline.
    pub fn flush(&mut self, state: &mut FilterState) -> bool {
        let pending = std::mem::take(&mut self.pending);
        let mut changed = false;
        for (column, edit) in pending {
            changed |= apply_edit(state, column, edit.filter);
        }
        changed
    }

    /// The earliest pending deadline; when to call `poll` next.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|e| e.due).min()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_columns(&self) -> impl Iterator<Item = &str> {
        self.pending.keys().map(String::as_str)
    }
}

fn apply_edit(state: &mut FilterState, column: String, filter: Option<ColumnFilter>) -> bool {
    match filter {
        Some(filter) => state.insert(column, filter.clone()).as_ref() != Some(&filter),
        None => state.remove(&column).is_some(),
    }
}
