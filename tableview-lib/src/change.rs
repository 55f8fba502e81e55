//! Aggregated change notifications.
//!
//! The aggregator keeps the latest known pagination, filter and sort
//! description. An interaction merges its part into that snapshot, resets
//! pagination when required and produces one [`ChangeEvent`] carrying the
//! whole picture.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::filter::FilterState;
use crate::model::Record;
use crate::model::Value;
use crate::pagination::PaginationState;
use crate::sort::SortState;
use crate::sort::SorterResult;

/// Interaction that triggered a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Sort,
    Filter,
    Paginate,
}

impl Action {
    /// Whether the action moves the table back to page 1.
    pub fn resets_pagination(self) -> bool {
        matches!(self, Action::Filter)
    }
}

/// Latest known table state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSnapshot {
    /// `None` when pagination is disabled.
    pub pagination: Option<PaginationState>,
    /// Every filterable column, `None` when unfiltered.
    pub filters: BTreeMap<String, Option<Vec<Value>>>,
    pub sorter: Vec<SorterResult>,
    pub sort_states: Vec<SortState>,
    pub filter_states: FilterState,
}

/// Partial snapshot update; unset parts keep their previous value.
#[derive(Debug, Clone, Default)]
pub struct ChangeUpdate {
    pub pagination: Option<PaginationState>,
    pub filters: Option<BTreeMap<String, Option<Vec<Value>>>>,
    pub sorter: Option<Vec<SorterResult>>,
    pub sort_states: Option<Vec<SortState>>,
    pub filter_states: Option<FilterState>,
}

impl ChangeUpdate {
    /// Sort part of an update.
    pub fn sort(sorter: Vec<SorterResult>, sort_states: Vec<SortState>) -> Self {
        Self {
            sorter: Some(sorter),
            sort_states: Some(sort_states),
            ..Self::default()
        }
    }

    /// Filter part of an update.
    pub fn filter(filters: BTreeMap<String, Option<Vec<Value>>>, filter_states: FilterState) -> Self {
        Self {
            filters: Some(filters),
            filter_states: Some(filter_states),
            ..Self::default()
        }
    }

    /// Pagination part of an update.
    pub fn pagination(pagination: PaginationState) -> Self {
        Self {
            pagination: Some(pagination),
            ..Self::default()
        }
    }
}

impl ChangeSnapshot {
    fn merge(&mut self, update: ChangeUpdate) {
        if let Some(pagination) = update.pagination {
            self.pagination = Some(pagination);
        }
        if let Some(filters) = update.filters {
            self.filters = filters;
        }
        if let Some(sorter) = update.sorter {
            self.sorter = sorter;
        }
        if let Some(sort_states) = update.sort_states {
            self.sort_states = sort_states;
        }
        if let Some(filter_states) = update.filter_states {
            self.filter_states = filter_states;
        }
    }
}

/// Outward change notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub pagination: Option<PaginationState>,
    pub filters: BTreeMap<String, Option<Vec<Value>>>,
    pub sorter: Vec<SorterResult>,
    /// Sorted and filtered rows, unpaginated.
    pub current_data_source: Vec<Record>,
    pub action: Action,
}

/// Change handler.
pub type ChangeHandler = Box<dyn FnMut(&ChangeEvent)>;

/// Merges interaction updates into one notification per change.
#[derive(Default)]
pub struct ChangeEventAggregator {
    snapshot: ChangeSnapshot,
    handler: Option<ChangeHandler>,
    last: Option<ChangeEvent>,
}

impl ChangeEventAggregator {
    /// Creates an aggregator with an empty snapshot and no handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest known state.
    pub fn snapshot(&self) -> &ChangeSnapshot {
        &self.snapshot
    }

    /// Replaces the snapshot without notifying, after a recompute that was
    /// not caused by an interaction.
    pub fn sync(&mut self, snapshot: ChangeSnapshot) {
        self.snapshot = snapshot;
    }

    /// Installs the change handler.
    pub fn set_handler(&mut self, handler: impl FnMut(&ChangeEvent) + 'static) {
        self.handler = Some(Box::new(handler));
    }

    /// Removes the change handler.
    pub fn clear_handler(&mut self) {
        self.handler = None;
    }

    /// Builds the notification for an interaction.
    ///
    /// `update` is merged first. When `reset_pagination` is set, `reset`
    /// runs next and its `(current, page_size)` lands in the snapshot, so
    /// the event never shows a page the reset already left. Finally
    /// `data_source` derives the unpaginated rows from the merged snapshot.
    pub fn trigger(
        &mut self,
        update: ChangeUpdate,
        action: Action,
        reset_pagination: bool,
        reset: impl FnOnce() -> (usize, usize),
        data_source: impl FnOnce(&ChangeSnapshot) -> Vec<Record>,
    ) -> ChangeEvent {
        self.snapshot.merge(update);
        if reset_pagination {
            let (current, page_size) = reset();
            if let Some(pagination) = self.snapshot.pagination.as_mut() {
                pagination.current = current;
                pagination.page_size = page_size;
            }
        }
        let current_data_source = data_source(&self.snapshot);
        log::debug!(
            "{:?} change over {} rows",
            action,
            current_data_source.len()
        );
        ChangeEvent {
            pagination: self.snapshot.pagination.clone(),
            filters: self.snapshot.filters.clone(),
            sorter: self.snapshot.sorter.clone(),
            current_data_source,
            action,
        }
    }

    /// Delivers an event to the handler and remembers it.
    pub fn emit(&mut self, event: ChangeEvent) {
        if let Some(handler) = self.handler.as_mut() {
            handler(&event);
        }
        self.last = Some(event);
    }

    /// The most recently emitted event.
    pub fn last(&self) -> Option<&ChangeEvent> {
        self.last.as_ref()
    }
}

impl fmt::Debug for ChangeEventAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeEventAggregator")
            .field("snapshot", &self.snapshot)
            .field("handler", &self.handler.is_some())
            .field("last", &self.last)
            .finish()
    }
}
