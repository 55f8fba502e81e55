//! JSON scenarios: a dataset, its columns and configuration, and a list of
//! interactions to replay against a [`TableView`].

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::collections::HashSet;
use std::rc::Rc;

use serde::Deserialize;
use serde::Serialize;
use tableview_lib::TableView;
use tableview_lib::change::ChangeEvent;
use tableview_lib::column::Breakpoint;
use tableview_lib::column::ColumnDescriptor;
use tableview_lib::column::validate_columns;
use tableview_lib::config::TableConfig;
use tableview_lib::key::RowKey;
use tableview_lib::model::Record;
use tableview_lib::model::Value;
use tableview_lib::pagination::PaginationState;
use tableview_lib::selection::Scope;
use tableview_lib::selection::SelectionAction;
use tableview_lib::selection::SelectionChange;
use tableview_lib::sort::SortOrder;
use tableview_lib::transform::DecoratedColumn;

use crate::error::CliError;

/// A replayable table session.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub data: Vec<Record>,
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    pub config: TableConfig,
    #[serde(default)]
    pub events: Vec<Event>,
}

/// One interaction.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Event {
    ToggleSort { column: String },
    SetSort { column: String, order: Option<SortOrder> },
    ResetSort,
    ConfirmFilter { column: String, values: Vec<Value> },
    ResetFilter { column: String },
    ClearFilters,
    ChangePage { current: usize, page_size: usize },
    Select { key: RowKey },
    Deselect { key: RowKey },
    Toggle { key: RowKey },
    SelectRange { key: RowKey },
    ToggleAll,
    ApplySelection { action: SelectionAction, scope: Scope },
    ClearSelection,
    SetScreens { screens: Option<HashSet<Breakpoint>> },
}

/// What a replay produced.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub changes: Vec<ChangeEvent>,
    pub selection_changes: Vec<SelectionChange>,
    pub columns: Vec<DecoratedColumn>,
    pub page: Vec<Record>,
    pub pagination: Option<PaginationState>,
    pub selected_keys: BTreeSet<RowKey>,
    /// Warnings per event, in order; events without warnings are left out.
    pub diagnostics: Vec<EventDiagnostics>,
}

/// Warnings raised by one event.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDiagnostics {
    /// Position of the event in the scenario; `None` for construction.
    pub event: Option<usize>,
    pub messages: Vec<String>,
}

impl Scenario {
    /// Parses and validates a scenario.
    pub fn from_json(json: &str) -> Result<Self, CliError> {
        let scenario: Scenario = serde_json::from_str(json)?;
        scenario.config.validate()?;
        validate_columns(&scenario.columns)?;
        if scenario.columns.is_empty() {
            return Err(CliError::usage("scenario declares no columns"));
        }
        Ok(scenario)
    }

    /// Builds the view, replays every event and reports the outcome.
    pub fn run(self) -> Report {
        let mut view = TableView::new(self.data, self.columns, self.config);
        let changes = Rc::new(RefCell::new(Vec::new()));
        let selection_changes = Rc::new(RefCell::new(Vec::new()));
        let change_sink = Rc::clone(&changes);
        let selection_sink = Rc::clone(&selection_changes);
        view.on_change(move |event| change_sink.borrow_mut().push(event.clone()));
        view.on_selection_change(move |change| selection_sink.borrow_mut().push(change.clone()));

        let mut diagnostics = Vec::new();
        collect_diagnostics(&view, None, &mut diagnostics);
        for (position, event) in self.events.into_iter().enumerate() {
            log::debug!("replaying event {}: {:?}", position, event);
            apply(&mut view, event);
            collect_diagnostics(&view, Some(position), &mut diagnostics);
        }

        Report {
            changes: changes.take(),
            selection_changes: selection_changes.take(),
            columns: view.columns().to_vec(),
            page: view.visible_data().to_vec(),
            pagination: view.pagination_state(),
            selected_keys: view.selected_keys().clone(),
            diagnostics,
        }
    }
}

fn apply(view: &mut TableView, event: Event) {
    match event {
        Event::ToggleSort { column } => view.toggle_sort(&column),
        Event::SetSort { column, order } => view.set_sort(&column, order),
        Event::ResetSort => view.reset_sort(),
        Event::ConfirmFilter { column, values } => view.confirm_filter(&column, values),
        Event::ResetFilter { column } => view.reset_filter(&column),
        Event::ClearFilters => view.clear_filters(),
        Event::ChangePage { current, page_size } => view.change_page(current, page_size),
        Event::Select { key } => view.select(&key),
        Event::Deselect { key } => view.deselect(&key),
        Event::Toggle { key } => view.toggle(&key),
        Event::SelectRange { key } => view.select_range(&key),
        Event::ToggleAll => view.toggle_all(),
        Event::ApplySelection { action, scope } => view.apply_selection(action, scope),
        Event::ClearSelection => view.clear_selection(),
        Event::SetScreens { screens } => view.set_screens(screens),
    }
}

fn collect_diagnostics(view: &TableView, event: Option<usize>, out: &mut Vec<EventDiagnostics>) {
    if view.diagnostics().is_empty() {
        return;
    }
    out.push(EventDiagnostics {
        event,
        messages: view.diagnostics().iter().map(ToString::to_string).collect(),
    });
}
