//! Column filtering.
//!
//! A record passes when, for every column with a non-empty selection, the
//! column's predicate accepts at least one selected value. Tree levels are
//! filtered recursively and a parent survives when any descendant does.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::collections::HashSet;

use serde::Serialize;

use crate::column::ColumnDescriptor;
use crate::column::ColumnSet;
use crate::model::Record;
use crate::model::Value;

/// Selected filter values per column key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FilterState {
    selected: BTreeMap<String, Vec<Value>>,
}

impl FilterState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected values of a column; `None` when the column is unfiltered.
    pub fn get(&self, column_key: &str) -> Option<&[Value]> {
        self.selected.get(column_key).map(Vec::as_slice)
    }

    /// Returns `true` if the column has selected values.
    pub fn is_filtered(&self, column_key: &str) -> bool {
        self.selected.contains_key(column_key)
    }

    /// Iterates `(column key, selected values)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.selected
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Returns `true` if no column is filtered.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

/// One active filter step.
#[derive(Debug, Clone, Copy)]
pub struct FilterCriterion<'c> {
    /// Column supplying the predicate.
    pub column: &'c ColumnDescriptor,
    /// Values of which at least one must match.
    pub selected: &'c [Value],
}

impl FilterCriterion<'_> {
    fn matches(&self, record: &Record) -> bool {
        self.selected
            .iter()
            .any(|value| self.column.filter_matches(value, record))
    }
}

/// Filters `data` by `criteria`, recursing into children under
/// `children_field`.
///
/// Kept parents carry only their kept children. Sibling order is preserved
/// and input records are never modified. With no criteria the input is
/// returned borrowed.
pub fn filter_records<'a>(
    data: &'a [Record],
    criteria: &[FilterCriterion<'_>],
    children_field: &str,
) -> Cow<'a, [Record]> {
    if criteria.is_empty() {
        return Cow::Borrowed(data);
    }
    Cow::Owned(filter_level(data, criteria, children_field))
}

fn filter_level(data: &[Record], criteria: &[FilterCriterion<'_>], children_field: &str) -> Vec<Record> {
    data.iter()
        .filter_map(|record| {
            let direct = criteria.iter().all(|criterion| criterion.matches(record));
            match record.children(children_field) {
                Some(children) => {
                    let kept = filter_level(children, criteria, children_field);
                    if direct || !kept.is_empty() {
                        Some(record.replace_children(children_field, kept))
                    } else {
                        None
                    }
                }
                None => direct.then(|| record.clone()),
            }
        })
        .collect()
}

/// Holds per-column filter selections and applies them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterEngine {
    state: FilterState,
}

impl FilterEngine {
    /// Creates an engine with no filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine from an existing state.
    pub fn with_state(state: FilterState) -> Self {
        Self { state }
    }

    /// Seeds selections from the columns' default filtered values.
    pub fn from_columns(columns: &ColumnSet) -> Self {
        let mut engine = Self::new();
        for (key, column) in columns.iter() {
            if let Some(filter) = &column.filter
                && let Some(values) = &filter.default_filtered_value
            {
                engine.confirm(key, column, values.clone());
            }
        }
        engine
    }

    /// Current selections.
    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Selected values of a column.
    pub fn selected(&self, column_key: &str) -> Option<&[Value]> {
        self.state.get(column_key)
    }

    /// Returns `true` if any column is filtered.
    pub fn is_active(&self) -> bool {
        !self.state.is_empty()
    }

    /// Confirms a column's selection.
    ///
    /// Values are mapped onto the column's option values and deduplicated.
    /// Single-choice columns keep the first value. An empty selection
    /// removes the column's filter. Returns `true` if the state changed.
    pub fn confirm(&mut self, column_key: &str, column: &ColumnDescriptor, values: Vec<Value>) -> bool {
        let mut resolved: Vec<Value> = Vec::with_capacity(values.len());
        for value in values {
            let value = match &column.filter {
                Some(filter) => filter.resolve_selected(&value),
                None => value,
            };
            if !resolved.contains(&value) {
                resolved.push(value);
            }
        }
        if column.filter.as_ref().is_some_and(|filter| !filter.multiple) {
            resolved.truncate(1);
        }

        let previous = if resolved.is_empty() {
            self.state.selected.remove(column_key)
        } else {
            self.state.selected.insert(column_key.to_string(), resolved)
        };
        let changed = previous.as_deref() != self.state.get(column_key);
        log::debug!(
            "filter for '{}' confirmed with {:?}",
            column_key,
            self.state.get(column_key)
        );
        changed
    }

    /// Removes a column's filter. Returns `true` if it was filtered.
    pub fn reset(&mut self, column_key: &str) -> bool {
        self.state.selected.remove(column_key).is_some()
    }

    /// Removes every filter.
    pub fn clear(&mut self) {
        self.state.selected.clear();
    }

    /// Drops selections of columns that no longer exist.
    pub fn retain_columns(&mut self, columns: &ColumnSet) {
        let keys: HashSet<&str> = columns.keys().iter().map(String::as_str).collect();
        self.state
            .selected
            .retain(|key, _| keys.contains(key.as_str()));
    }

    /// Active criteria resolved against `columns`; selections whose column
    /// is gone or not filterable are skipped.
    pub fn criteria<'c>(&'c self, columns: &'c ColumnSet) -> Vec<FilterCriterion<'c>> {
        self.state
            .iter()
            .filter_map(|(key, selected)| {
                let column = columns.get(key)?;
                column.filter.as_ref()?;
                Some(FilterCriterion { column, selected })
            })
            .collect()
    }

    /// Filters `data` by the active selections.
    pub fn apply<'a>(
        &self,
        data: &'a [Record],
        columns: &ColumnSet,
        children_field: &str,
    ) -> Cow<'a, [Record]> {
        filter_records(data, &self.criteria(columns), children_field)
    }

    /// Outward filter description for change events: every filterable
    /// column, `None` when unfiltered.
    pub fn filters(&self, columns: &ColumnSet) -> BTreeMap<String, Option<Vec<Value>>> {
        columns
            .iter()
            .filter(|(_, column)| column.filter.is_some())
            .map(|(key, _)| (key.to_string(), self.state.get(key).map(<[Value]>::to_vec)))
            .collect()
    }
}
