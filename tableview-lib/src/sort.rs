//! Multi-column sorting.
//!
//! [`SortEngine`] owns the per-column sort states and turns the active ones
//! into a single stable ordering. The ordering is applied to every level of
//! a tree independently: children are sorted among their siblings and never
//! merged into their parent's level.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;

use crate::column::ColumnDescriptor;
use crate::column::Comparator;
use crate::column::ColumnSet;
use crate::model::Record;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending order (A-Z, 0-9).
    Ascend,
    /// Descending order (Z-A, 9-0).
    Descend,
}

/// Directions cycled through when no column or table override exists.
pub const DEFAULT_SORT_DIRECTIONS: [SortOrder; 2] = [SortOrder::Ascend, SortOrder::Descend];

/// Direction following `current` in a header's click cycle.
///
/// The cycle walks `directions` in order and ends in "no sort" (`None`)
/// before starting over.
pub fn next_sort_order(directions: &[SortOrder], current: Option<SortOrder>) -> Option<SortOrder> {
    let next = match current {
        None => 0,
        Some(order) => directions
            .iter()
            .position(|direction| *direction == order)
            .map_or(0, |position| position + 1),
    };
    directions.get(next).copied()
}

/// Sort state of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortState {
    /// Column key.
    pub column_key: String,
    /// Direction, `None` when the column is not sorted.
    pub order: Option<SortOrder>,
    /// Multi-sort priority; lower numbers are compared first.
    pub priority: Option<u32>,
}

impl SortState {
    /// Returns `true` if the state orders rows.
    pub fn is_active(&self) -> bool {
        self.order.is_some()
    }
}

/// Outward description of one sorted column, as reported in change events.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SorterResult {
    /// Column key.
    pub column_key: String,
    /// Data path of the column.
    pub field: Vec<String>,
    /// Direction, `None` when the column was just unsorted.
    pub order: Option<SortOrder>,
}

/// One active comparison step.
#[derive(Debug, Clone, Copy)]
pub struct SortCriterion<'c> {
    /// Column supplying the comparison.
    pub column: &'c ColumnDescriptor,
    /// Direction of the step.
    pub order: SortOrder,
}

/// Sorts `data` by `criteria`, recursing into children under
/// `children_field`.
///
/// Criteria are evaluated in order and the first non-equal result decides;
/// full ties keep input order. With no criteria the input is returned
/// borrowed. Input records are never modified.
pub fn sort_records<'a>(
    data: &'a [Record],
    criteria: &[SortCriterion<'_>],
    children_field: &str,
) -> Cow<'a, [Record]> {
    if criteria.is_empty() {
        return Cow::Borrowed(data);
    }
    Cow::Owned(sort_level(data, criteria, children_field))
}

fn sort_level(data: &[Record], criteria: &[SortCriterion<'_>], children_field: &str) -> Vec<Record> {
    let mut sorted: Vec<Record> = data
        .iter()
        .map(|record| match record.children(children_field) {
            Some(children) => {
                record.replace_children(children_field, sort_level(children, criteria, children_field))
            }
            None => record.clone(),
        })
        .collect();
    // `sort_by` is stable: full ties keep input order.
    sorted.sort_by(|a, b| compare(a, b, criteria));
    sorted
}

fn compare(a: &Record, b: &Record, criteria: &[SortCriterion<'_>]) -> Ordering {
    for criterion in criteria {
        let ordering = missing_last(criterion.column, a, b).unwrap_or_else(|| {
            let ordering = criterion.column.compare_records(a, b);
            match criterion.order {
                SortOrder::Ascend => ordering,
                SortOrder::Descend => ordering.reverse(),
            }
        });
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Places records without a value after those with one, whatever the
/// direction. Only value comparisons are affected; custom comparators see
/// every pair.
fn missing_last(column: &ColumnDescriptor, a: &Record, b: &Record) -> Option<Ordering> {
    let by_value = column
        .sorter
        .as_ref()
        .is_some_and(|sorter| matches!(sorter.compare, Comparator::ByValue));
    if !by_value {
        return None;
    }
    match (column.value_of(a).is_none(), column.value_of(b).is_none()) {
        (false, false) => None,
        (true, true) => Some(Ordering::Equal),
        (true, false) => Some(Ordering::Greater),
        (false, true) => Some(Ordering::Less),
    }
}

/// Holds per-column sort states and applies them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortEngine {
    states: Vec<SortState>,
}

impl SortEngine {
    /// Creates an engine with no sort states.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine from existing states.
    pub fn with_states(states: Vec<SortState>) -> Self {
        Self { states }
    }

    /// Seeds states from the columns' default sort orders.
    pub fn from_columns(columns: &ColumnSet) -> Self {
        let states = columns
            .iter()
            .filter_map(|(key, column)| {
                let sorter = column.sorter.as_ref()?;
                let order = sorter.default_order?;
                Some(SortState {
                    column_key: key.to_string(),
                    order: Some(order),
                    priority: sorter.multiple,
                })
            })
            .collect();
        Self { states }
    }

    /// All states, including inactive ones.
    pub fn states(&self) -> &[SortState] {
        &self.states
    }

    /// Active states in evaluation order: ascending priority, states
    /// without a priority last, ties in insertion order.
    pub fn active_states(&self) -> Vec<&SortState> {
        let mut active: Vec<&SortState> = self.states.iter().filter(|s| s.is_active()).collect();
        active.sort_by_key(|state| state.priority.unwrap_or(u32::MAX));
        active
    }

    /// Current direction of a column.
    pub fn order_of(&self, column_key: &str) -> Option<SortOrder> {
        self.states
            .iter()
            .find(|state| state.column_key == column_key)
            .and_then(|state| state.order)
    }

    /// Sets a column's direction.
    ///
    /// A column with a multi-sort priority keeps the states of other
    /// prioritized columns; any other column replaces every state.
    pub fn set(&mut self, column_key: &str, column: &ColumnDescriptor, order: Option<SortOrder>) {
        let priority = column.sorter.as_ref().and_then(|sorter| sorter.multiple);
        let state = SortState {
            column_key: column_key.to_string(),
            order,
            priority,
        };
        if priority.is_some() {
            self.states
                .retain(|existing| existing.priority.is_some() && existing.column_key != column_key);
            self.states.push(state);
        } else {
            self.states = vec![state];
        }
        log::debug!("sort state for '{}' set to {:?}", column_key, order);
    }

    /// Advances a column through its direction cycle and returns the new
    /// direction.
    pub fn toggle(
        &mut self,
        column_key: &str,
        column: &ColumnDescriptor,
        table_directions: &[SortOrder],
    ) -> Option<SortOrder> {
        let directions = effective_directions(column, table_directions);
        let next = next_sort_order(directions, self.order_of(column_key));
        self.set(column_key, column, next);
        next
    }

    /// Drops every sort state.
    pub fn reset(&mut self) {
        self.states.clear();
    }

    /// Drops states of columns that no longer exist.
    pub fn retain_columns(&mut self, columns: &ColumnSet) {
        let keys: HashSet<&str> = columns.keys().iter().map(String::as_str).collect();
        self.states
            .retain(|state| keys.contains(state.column_key.as_str()));
    }

    /// Active criteria resolved against `columns`; states whose column is
    /// gone or has no sorter are skipped.
    pub fn criteria<'c>(&self, columns: &'c ColumnSet) -> Vec<SortCriterion<'c>> {
        self.active_states()
            .into_iter()
            .filter_map(|state| {
                let column = columns.get(&state.column_key)?;
                column.sorter.as_ref()?;
                Some(SortCriterion {
                    column,
                    order: state.order?,
                })
            })
            .collect()
    }

    /// Sorts `data` by the active states.
    pub fn apply<'a>(
        &self,
        data: &'a [Record],
        columns: &ColumnSet,
        children_field: &str,
    ) -> Cow<'a, [Record]> {
        sort_records(data, &self.criteria(columns), children_field)
    }

    /// Outward sorter description for change events.
    ///
    /// Lists the active states in evaluation order; when nothing is active
    /// the most recently touched column is reported with no direction.
    pub fn sorter_result(&self, columns: &ColumnSet) -> Vec<SorterResult> {
        let describe = |state: &SortState| SorterResult {
            column_key: state.column_key.clone(),
            field: columns
                .get(&state.column_key)
                .map(|column| column.data_path.clone())
                .unwrap_or_default(),
            order: state.order,
        };
        let active = self.active_states();
        if active.is_empty() {
            return self.states.last().map(describe).into_iter().collect();
        }
        active.into_iter().map(describe).collect()
    }
}

/// Direction cycle of a column: its own list, else the table's, else the
/// default.
pub fn effective_directions<'a>(
    column: &'a ColumnDescriptor,
    table_directions: &'a [SortOrder],
) -> &'a [SortOrder] {
    match column.sorter.as_ref().and_then(|s| s.sort_directions.as_deref()) {
        Some(directions) if !directions.is_empty() => directions,
        _ if !table_directions.is_empty() => table_directions,
        _ => &DEFAULT_SORT_DIRECTIONS,
    }
}
