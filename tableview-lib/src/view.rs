//! The table view: shared state plus derived data.
//!
//! [`TableView`] is the only writer of sort, filter, pagination and
//! selection state. Every event updates its part and re-derives everything
//! downstream in a fixed order:
//!
//! ```text
//! key index -> sort -> filter -> page slice -> selection -> columns
//! ```
//!
//! Nothing is derived lazily between events except the key index, so reads
//! never observe a stale stage.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::collections::HashSet;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::change::Action;
use crate::change::ChangeEvent;
use crate::change::ChangeEventAggregator;
use crate::change::ChangeSnapshot;
use crate::change::ChangeUpdate;
use crate::column::Breakpoint;
use crate::column::ColumnDescriptor;
use crate::column::ColumnSet;
use crate::config::TableConfig;
use crate::diagnostic::Diagnostic;
use crate::diagnostic::Diagnostics;
use crate::filter::FilterEngine;
use crate::filter::FilterState;
use crate::key::RowKey;
use crate::key::RowKeyResolver;
use crate::key::RowKeyStrategy;
use crate::model::Record;
use crate::model::Value;
use crate::pagination::Pagination;
use crate::pagination::PaginationCoordinator;
use crate::pagination::PaginationState;
use crate::selection::CheckState;
use crate::selection::Scope;
use crate::selection::SelectionAction;
use crate::selection::SelectionChange;
use crate::selection::SelectionConfig;
use crate::selection::SelectionCoordinator;
use crate::selection::SelectionMode;
use crate::sort::SortEngine;
use crate::sort::SortOrder;
use crate::sort::SortState;
use crate::transform::ColumnTransformPipeline;
use crate::transform::DecoratedColumn;
use crate::transform::SelectionHeader;
use crate::transform::TransformContext;

/// Class added to selected rows.
pub const SELECTED_ROW_CLASS: &str = "row-selected";

/// Pagination widget callback: `(current, page_size)`.
pub type PaginationHandler = Box<dyn FnMut(usize, usize)>;

/// Selection change callback.
pub type SelectionHandler = Box<dyn FnMut(&SelectionChange)>;

/// A table over a dataset.
///
/// # Example
///
/// ```
/// use tableview_lib::TableView;
/// use tableview_lib::column::ColumnDescriptor;
/// use tableview_lib::config::TableConfig;
/// use tableview_lib::model::Record;
///
/// let data = vec![
///     Record::new().set("key", 1).set("age", 30),
///     Record::new().set("key", 2).set("age", 20),
/// ];
/// let mut view = TableView::new(
///     data,
///     vec![ColumnDescriptor::new("age").sortable()],
///     TableConfig::default(),
/// );
/// view.toggle_sort("age");
///
/// let ages: Vec<_> = view
///     .visible_data()
///     .iter()
///     .map(|r| r.get_long("age").unwrap())
///     .collect();
/// assert_eq!(ages, vec![Some(20), Some(30)]);
/// ```
pub struct TableView {
    config: TableConfig,
    columns: ColumnSet,
    resolver: RowKeyResolver,
    sort: SortEngine,
    filter: FilterEngine,
    pagination: PaginationCoordinator,
    selection: SelectionCoordinator,
    pipeline: ColumnTransformPipeline,
    changes: ChangeEventAggregator,
    screens: Option<HashSet<Breakpoint>>,

    processed: Arc<Vec<Record>>,
    page: Range<usize>,
    decorated: Vec<DecoratedColumn>,
    diagnostics: Diagnostics,

    on_pagination_change: Option<PaginationHandler>,
    on_selection_change: Option<SelectionHandler>,
}

impl TableView {
    /// Creates a view and derives its first state.
    pub fn new(data: Vec<Record>, columns: Vec<ColumnDescriptor>, config: TableConfig) -> Self {
        let columns = ColumnSet::new(columns);
        let resolver = RowKeyResolver::new(
            Arc::new(data),
            config.row_key.clone(),
            config.children_column_name.clone(),
        );
        let processed = resolver.data_arc();
        let mut view = Self {
            sort: SortEngine::from_columns(&columns),
            filter: FilterEngine::from_columns(&columns),
            pagination: PaginationCoordinator::new(config.pagination.clone()),
            selection: SelectionCoordinator::new(config.row_selection.clone()),
            pipeline: ColumnTransformPipeline::standard(),
            changes: ChangeEventAggregator::new(),
            screens: None,
            processed,
            page: 0..0,
            decorated: Vec::new(),
            diagnostics: Diagnostics::new(),
            on_pagination_change: None,
            on_selection_change: None,
            config,
            columns,
            resolver,
        };
        view.refresh();
        view
    }

    // =========================================================================
    // Handlers
    // =========================================================================

    /// Installs the aggregated change handler.
    pub fn on_change(&mut self, handler: impl FnMut(&ChangeEvent) + 'static) {
        self.changes.set_handler(handler);
    }

    /// Installs the pagination widget handler.
    pub fn on_pagination_change(&mut self, handler: impl FnMut(usize, usize) + 'static) {
        self.on_pagination_change = Some(Box::new(handler));
    }

    /// Installs the selection handler.
    pub fn on_selection_change(&mut self, handler: impl FnMut(&SelectionChange) + 'static) {
        self.on_selection_change = Some(Box::new(handler));
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Decorated columns, ready to render.
    pub fn columns(&self) -> &[DecoratedColumn] {
        &self.decorated
    }

    /// The declared columns.
    pub fn column_set(&self) -> &ColumnSet {
        &self.columns
    }

    /// Rows of the visible page.
    pub fn visible_data(&self) -> &[Record] {
        &self.processed[self.page.clone()]
    }

    /// Sorted and filtered rows, unpaginated.
    ///
    /// With no active sort or filter this is the input dataset itself.
    pub fn processed_data(&self) -> &[Record] {
        &self.processed
    }

    /// The input dataset.
    pub fn data(&self) -> &[Record] {
        self.resolver.data()
    }

    /// Key of `record` at sibling position `index`.
    pub fn row_key_of(&self, record: &Record, index: usize) -> RowKey {
        self.resolver.row_key(record, index)
    }

    /// Row classes: the level marker, the selected marker and any
    /// configured extra class.
    pub fn row_class_names_of(&self, record: &Record, index: usize, indent: usize) -> Vec<String> {
        let mut classes = vec![format!("row-level-{}", indent)];
        if self.selection.is_enabled() && self.selection.is_selected(&self.row_key_of(record, index)) {
            classes.push(SELECTED_ROW_CLASS.to_string());
        }
        if let Some(extra) = &self.config.row_class_name {
            let extra = extra(record, index, indent);
            if !extra.is_empty() {
                classes.push(extra);
            }
        }
        classes
    }

    /// Looks a record up by key anywhere in the input tree.
    pub fn record_by_key(&self, key: &RowKey) -> Option<&Record> {
        self.resolver.get(key)
    }

    /// State handed to the pagination widget; `None` when disabled.
    pub fn pagination_state(&self) -> Option<PaginationState> {
        self.pagination
            .is_enabled()
            .then(|| self.pagination.state(self.processed.len()))
    }

    /// Whether the pagination widget is drawn `(top, bottom)`.
    pub fn pagination_placements(&self) -> (bool, bool) {
        if !self.pagination.should_render(self.processed.len()) {
            return (false, false);
        }
        self.pagination.placements()
    }

    /// Every sort state.
    pub fn sort_states(&self) -> &[SortState] {
        self.sort.states()
    }

    /// Current filter selections.
    pub fn filter_state(&self) -> &FilterState {
        self.filter.state()
    }

    /// Selected keys.
    pub fn selected_keys(&self) -> &BTreeSet<RowKey> {
        self.selection.keys()
    }

    /// Records of the selected keys present in the data.
    pub fn selected_records(&self) -> Vec<Record> {
        self.selection.selected_records(&self.resolver)
    }

    /// Effective selection mode.
    pub fn selection_mode(&self) -> SelectionMode {
        self.selection.mode(&self.resolver)
    }

    /// Checked state of one row.
    pub fn check_state_of(&self, key: &RowKey) -> CheckState {
        self.selection.check_state(key, &self.resolver)
    }

    /// Warnings raised by the latest event.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.entries()
    }

    /// The most recent change notification.
    pub fn last_change(&self) -> Option<&ChangeEvent> {
        self.changes.last()
    }

    /// The configuration.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    // =========================================================================
    // Data and configuration events
    // =========================================================================

    /// Replaces the dataset.
    pub fn set_data(&mut self, data: Vec<Record>) {
        self.diagnostics.clear();
        self.resolver = RowKeyResolver::new(
            Arc::new(data),
            self.config.row_key.clone(),
            self.config.children_column_name.clone(),
        );
        log::debug!("data replaced with {} root records", self.resolver.data().len());
        self.refresh();
    }

    /// Replaces the column list. States of removed columns are dropped.
    pub fn set_columns(&mut self, columns: Vec<ColumnDescriptor>) {
        self.diagnostics.clear();
        self.columns = ColumnSet::new(columns);
        self.sort.retain_columns(&self.columns);
        self.filter.retain_columns(&self.columns);
        self.refresh();
    }

    /// Replaces the key strategy.
    pub fn set_row_key(&mut self, strategy: RowKeyStrategy) {
        self.diagnostics.clear();
        self.config.row_key = strategy.clone();
        self.resolver = RowKeyResolver::new(
            self.resolver.data_arc(),
            strategy,
            self.config.children_column_name.clone(),
        );
        self.refresh();
    }

    /// Replaces the children field name.
    pub fn set_children_column(&mut self, field: impl Into<String>) {
        self.diagnostics.clear();
        self.config.children_column_name = field.into();
        self.resolver = RowKeyResolver::new(
            self.resolver.data_arc(),
            self.config.row_key.clone(),
            self.config.children_column_name.clone(),
        );
        self.refresh();
    }

    /// Replaces the pagination configuration.
    pub fn set_pagination(&mut self, pagination: Pagination) {
        self.diagnostics.clear();
        self.config.pagination = pagination.clone();
        self.pagination.set_config(pagination);
        self.refresh();
    }

    /// Replaces the selection configuration.
    pub fn set_row_selection(&mut self, selection: Option<SelectionConfig>) {
        self.diagnostics.clear();
        self.config.row_selection = selection.clone();
        self.selection.set_config(selection);
        self.refresh();
    }

    /// Sets the active breakpoints; `None` shows every column.
    pub fn set_screens(&mut self, screens: Option<HashSet<Breakpoint>>) {
        self.diagnostics.clear();
        self.screens = screens;
        self.recompute_page();
    }

    // =========================================================================
    // Sort events
    // =========================================================================

    /// Header interaction: advances the column through its direction cycle.
    pub fn toggle_sort(&mut self, column_key: &str) {
        self.diagnostics.clear();
        let Some(column) = capable_column(&self.columns, column_key, &mut self.diagnostics, |c| {
            c.sorter.is_some()
        }) else {
            return;
        };
        self.sort
            .toggle(column_key, column, &self.config.sort_directions);
        self.after_sort();
    }

    /// Sets a column's direction.
    pub fn set_sort(&mut self, column_key: &str, order: Option<SortOrder>) {
        self.diagnostics.clear();
        let Some(column) = capable_column(&self.columns, column_key, &mut self.diagnostics, |c| {
            c.sorter.is_some()
        }) else {
            return;
        };
        self.sort.set(column_key, column, order);
        self.after_sort();
    }

    /// Drops every sort state.
    pub fn reset_sort(&mut self) {
        self.diagnostics.clear();
        if self.sort.states().is_empty() {
            return;
        }
        self.sort.reset();
        self.after_sort();
    }

    // =========================================================================
    // Filter events
    // =========================================================================

    /// Filter menu confirmation. Notifies only when the selection changed.
    pub fn confirm_filter(&mut self, column_key: &str, values: Vec<Value>) {
        self.diagnostics.clear();
        let Some(column) = capable_column(&self.columns, column_key, &mut self.diagnostics, |c| {
            c.filter.is_some()
        }) else {
            return;
        };
        if self.filter.confirm(column_key, column, values) {
            self.after_filter();
        } else {
            self.recompute_page();
        }
    }

    /// Clears one column's filter.
    pub fn reset_filter(&mut self, column_key: &str) {
        self.diagnostics.clear();
        if capable_column(&self.columns, column_key, &mut self.diagnostics, |c| {
            c.filter.is_some()
        })
        .is_none()
        {
            return;
        }
        if self.filter.reset(column_key) {
            self.after_filter();
        }
    }

    /// Clears every filter.
    pub fn clear_filters(&mut self) {
        self.diagnostics.clear();
        if self.filter.is_active() {
            self.filter.clear();
            self.after_filter();
        }
    }

    // =========================================================================
    // Pagination events
    // =========================================================================

    /// Pagination widget change. A new page size restarts at page 1.
    pub fn change_page(&mut self, current: usize, page_size: usize) {
        self.diagnostics.clear();
        if !self.pagination.is_enabled() {
            log::debug!("page change ignored, pagination is disabled");
            return;
        }
        let size_changed = page_size != 0 && page_size != self.pagination.page_size();
        let (current, page_size) = self.pagination.change(
            current,
            page_size,
            self.processed.len(),
            &mut self.diagnostics,
        );
        if !size_changed && let Some(handler) = self.on_pagination_change.as_mut() {
            handler(current, page_size);
        }
        let update = ChangeUpdate {
            pagination: self.pagination_state(),
            ..ChangeUpdate::default()
        };
        self.notify(update, Action::Paginate, size_changed);
    }

    // =========================================================================
    // Selection events
    // =========================================================================

    /// Selects one row.
    pub fn select(&mut self, key: &RowKey) {
        self.diagnostics.clear();
        let change = self.selection.select(key, &self.resolver, &mut self.diagnostics);
        self.after_selection(change);
    }

    /// Deselects one row.
    pub fn deselect(&mut self, key: &RowKey) {
        self.diagnostics.clear();
        let change = self
            .selection
            .deselect(key, &self.resolver, &mut self.diagnostics);
        self.after_selection(change);
    }

    /// Flips one row.
    pub fn toggle(&mut self, key: &RowKey) {
        self.diagnostics.clear();
        let change = self.selection.toggle(key, &self.resolver, &mut self.diagnostics);
        self.after_selection(change);
    }

    /// Extends the selection from the last toggled row through `key`.
    pub fn select_range(&mut self, key: &RowKey) {
        self.diagnostics.clear();
        let page = &self.processed[self.page.clone()];
        let change = self
            .selection
            .select_range(key, page, &self.resolver, &mut self.diagnostics);
        self.after_selection(change);
    }

    /// Header checkbox interaction.
    pub fn toggle_all(&mut self) {
        self.diagnostics.clear();
        let page = &self.processed[self.page.clone()];
        let change = self
            .selection
            .toggle_all(page, &self.resolver, &mut self.diagnostics);
        self.after_selection(change);
    }

    /// Applies a bulk action to the rows in `scope`.
    pub fn apply_selection(&mut self, action: SelectionAction, scope: Scope) {
        self.diagnostics.clear();
        let rows = match scope {
            Scope::CurrentPage => &self.processed[self.page.clone()],
            Scope::AllData => &self.processed[..],
        };
        let change = self
            .selection
            .apply(action, rows, &self.resolver, &mut self.diagnostics);
        self.after_selection(change);
    }

    /// Deselects everything.
    pub fn clear_selection(&mut self) {
        self.diagnostics.clear();
        let change = self.selection.clear(&self.resolver, &mut self.diagnostics);
        self.after_selection(change);
    }

    /// Replaces the selection without notifying.
    pub fn set_selected_keys(&mut self, keys: impl IntoIterator<Item = RowKey>) {
        self.diagnostics.clear();
        self.selection.set_keys(keys, &self.resolver);
        self.recompute_page();
    }

    // =========================================================================
    // Recompute
    // =========================================================================

    /// Re-derives everything and brings the change snapshot up to date
    /// without notifying.
    fn refresh(&mut self) {
        self.recompute_data();
        self.recompute_page();
        self.changes.sync(self.snapshot());
    }

    fn recompute_data(&mut self) {
        let field = self.resolver.children_field();
        let sorted = self.sort.apply(self.resolver.data(), &self.columns, field);
        let filtered = match self.filter.apply(&sorted, &self.columns, field) {
            Cow::Owned(rows) => Some(rows),
            Cow::Borrowed(_) => None,
        };
        self.processed = match (filtered, sorted) {
            (Some(rows), _) | (None, Cow::Owned(rows)) => Arc::new(rows),
            (None, Cow::Borrowed(_)) => self.resolver.data_arc(),
        };
        self.diagnostics.extend_silent(self.resolver.diagnostics());
        log::trace!(
            "processed {} of {} root records",
            self.processed.len(),
            self.resolver.data().len()
        );
    }

    fn recompute_page(&mut self) {
        let len = self.processed.len();
        if self.pagination.is_out_of_range(len) {
            reset_page(&mut self.pagination, &mut self.on_pagination_change);
        }
        self.page = self.pagination.page_range(len, &mut self.diagnostics);

        let header = self.selection_header();
        let context = TransformContext {
            columns: &self.columns,
            sort: &self.sort,
            filter: &self.filter,
            sort_directions: &self.config.sort_directions,
            screens: self.screens.as_ref(),
            selection: header.as_ref(),
        };
        self.decorated = self.pipeline.apply(&context);
    }

    fn selection_header(&self) -> Option<SelectionHeader> {
        let config = self.selection.config()?;
        let mode = self.selection.mode(&self.resolver);
        Some(SelectionHeader {
            mode,
            state: self
                .selection
                .header_state(self.visible_data(), &self.resolver),
            hide_select_all: config.hide_select_all || mode == SelectionMode::Single,
            actions: config.selections.actions(),
            title: config.column_title.clone(),
            width: config.column_width,
            fixed: config.fixed,
        })
    }

    fn snapshot(&self) -> ChangeSnapshot {
        ChangeSnapshot {
            pagination: self.pagination_state(),
            filters: self.filter.filters(&self.columns),
            sorter: self.sort.sorter_result(&self.columns),
            sort_states: self.sort.states().to_vec(),
            filter_states: self.filter.state().clone(),
        }
    }

    // =========================================================================
    // Notification
    // =========================================================================

    fn after_sort(&mut self) {
        self.recompute_data();
        let mut update = ChangeUpdate::sort(
            self.sort.sorter_result(&self.columns),
            self.sort.states().to_vec(),
        );
        update.pagination = self.pagination_state();
        self.notify(update, Action::Sort, Action::Sort.resets_pagination());
    }

    fn after_filter(&mut self) {
        self.recompute_data();
        let mut update = ChangeUpdate::filter(
            self.filter.filters(&self.columns),
            self.filter.state().clone(),
        );
        update.pagination = self.pagination_state();
        self.notify(update, Action::Filter, Action::Filter.resets_pagination());
    }

    /// Merges, resets if required, re-slices the page and then notifies.
    fn notify(&mut self, update: ChangeUpdate, action: Action, reset_pagination: bool) {
        let event = self.changes.trigger(
            update,
            action,
            reset_pagination,
            || reset_page(&mut self.pagination, &mut self.on_pagination_change),
            |snapshot| data_source(&self.resolver, &self.columns, snapshot),
        );
        self.recompute_page();
        self.changes.emit(event);
    }

    fn after_selection(&mut self, change: Option<SelectionChange>) {
        let Some(change) = change else {
            return;
        };
        self.recompute_page();
        if let Some(handler) = self.on_selection_change.as_mut() {
            handler(&change);
        }
    }
}

/// Finds a column offering a capability, reporting it otherwise.
fn capable_column<'c>(
    columns: &'c ColumnSet,
    column_key: &str,
    diagnostics: &mut Diagnostics,
    capable: impl Fn(&ColumnDescriptor) -> bool,
) -> Option<&'c ColumnDescriptor> {
    match columns.get(column_key) {
        Some(column) if capable(column) => Some(column),
        _ => {
            diagnostics.report(Diagnostic::UnknownColumn {
                key: column_key.to_string(),
            });
            None
        }
    }
}

/// Forces page 1 and tells the pagination widget.
fn reset_page(
    pagination: &mut PaginationCoordinator,
    handler: &mut Option<PaginationHandler>,
) -> (usize, usize) {
    let (current, page_size) = pagination.reset();
    if let Some(handler) = handler.as_mut() {
        handler(current, page_size);
    }
    (current, page_size)
}

/// Rows the snapshot's sort and filter states produce from the input.
fn data_source(resolver: &RowKeyResolver, columns: &ColumnSet, snapshot: &ChangeSnapshot) -> Vec<Record> {
    let field = resolver.children_field();
    let sort = SortEngine::with_states(snapshot.sort_states.clone());
    let filter = FilterEngine::with_state(snapshot.filter_states.clone());
    let sorted = sort.apply(resolver.data(), columns, field);
    filter.apply(&sorted, columns, field).into_owned()
}

impl fmt::Debug for TableView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableView")
            .field("config", &self.config)
            .field("columns", &self.columns.keys())
            .field("resolver", &self.resolver)
            .field("sort", &self.sort)
            .field("filter", &self.filter)
            .field("pagination", &self.pagination)
            .field("selection", &self.selection)
            .field("processed", &self.processed.len())
            .field("page", &self.page)
            .finish()
    }
}
