//! Column decoration.
//!
//! Declared columns pass through an ordered list of stages before they reach
//! the renderer. Each stage takes the whole column list and returns a new
//! one: responsive hiding, sorter affordances, filter affordances, selection
//! column injection and finally title resolution.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::column::Breakpoint;
use crate::column::ColumnDescriptor;
use crate::column::ColumnSet;
use crate::column::ColumnTitle;
use crate::column::FilterOption;
use crate::column::Fixed;
use crate::column::TitleContext;
use crate::filter::FilterEngine;
use crate::model::Value;
use crate::selection::CheckState;
use crate::selection::SelectionAction;
use crate::selection::SelectionMode;
use crate::sort::SortEngine;
use crate::sort::SortOrder;
use crate::sort::effective_directions;
use crate::sort::next_sort_order;

/// Key of the injected selection column.
pub const SELECTION_COLUMN_KEY: &str = "selection-column";

/// Whether a decorated column shows data or the selection controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnKind {
    Data,
    Selection,
}

/// Selection column header details.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionHeader {
    pub mode: SelectionMode,
    /// Header checkbox state over the current page.
    pub state: CheckState,
    pub hide_select_all: bool,
    /// Bulk actions in the header menu.
    pub actions: Vec<SelectionAction>,
    pub title: Option<String>,
    pub width: Option<u32>,
    pub fixed: Option<Fixed>,
}

/// A column ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecoratedColumn {
    pub key: String,
    pub kind: ColumnKind,
    pub title: String,
    pub data_path: Vec<String>,
    pub sortable: bool,
    pub sort_order: Option<SortOrder>,
    /// Direction the next header interaction switches to.
    pub next_sort_order: Option<SortOrder>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filter_options: Vec<FilterOption>,
    pub filter_multiple: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filtered_values: Vec<Value>,
    pub filtered: bool,
    pub fixed: Option<Fixed>,
    pub width: Option<u32>,
    pub class_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionHeader>,
}

impl DecoratedColumn {
    /// Undecorated data column.
    pub fn from_descriptor(key: &str, column: &ColumnDescriptor) -> Self {
        let title = match &column.title {
            ColumnTitle::Text(text) => text.clone(),
            ColumnTitle::Render(_) => String::new(),
        };
        Self {
            key: key.to_string(),
            kind: ColumnKind::Data,
            title,
            data_path: column.data_path.clone(),
            sortable: false,
            sort_order: None,
            next_sort_order: None,
            filter_options: Vec::new(),
            filter_multiple: true,
            filtered_values: Vec::new(),
            filtered: false,
            fixed: column.fixed,
            width: column.width,
            class_names: Vec::new(),
            selection: None,
        }
    }

    fn selection_column(header: SelectionHeader) -> Self {
        Self {
            key: SELECTION_COLUMN_KEY.to_string(),
            kind: ColumnKind::Selection,
            title: header.title.clone().unwrap_or_default(),
            data_path: Vec::new(),
            sortable: false,
            sort_order: None,
            next_sort_order: None,
            filter_options: Vec::new(),
            filter_multiple: false,
            filtered_values: Vec::new(),
            filtered: false,
            fixed: header.fixed,
            width: header.width,
            class_names: vec!["table-selection-column".to_string()],
            selection: Some(header),
        }
    }
}

/// Everything the stages read.
#[derive(Clone, Copy)]
pub struct TransformContext<'a> {
    pub columns: &'a ColumnSet,
    pub sort: &'a SortEngine,
    pub filter: &'a FilterEngine,
    /// Table-level sort direction cycle.
    pub sort_directions: &'a [SortOrder],
    /// Active breakpoints; `None` when the host does not report them.
    pub screens: Option<&'a HashSet<Breakpoint>>,
    /// Selection column header; `None` when selection is not configured.
    pub selection: Option<&'a SelectionHeader>,
}

/// A column stage.
pub type ColumnStage = Box<dyn Fn(Vec<DecoratedColumn>, &TransformContext<'_>) -> Vec<DecoratedColumn>>;

/// Ordered list of named column stages.
pub struct ColumnTransformPipeline {
    stages: Vec<(&'static str, ColumnStage)>,
}

impl ColumnTransformPipeline {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// The table's stage order.
    pub fn standard() -> Self {
        Self::new()
            .then("responsive", responsive_stage)
            .then("sorter", sorter_stage)
            .then("filter", filter_stage)
            .then("selection", selection_stage)
            .then("title", title_stage)
    }

    /// Appends a stage.
    pub fn then(
        mut self,
        name: &'static str,
        stage: impl Fn(Vec<DecoratedColumn>, &TransformContext<'_>) -> Vec<DecoratedColumn> + 'static,
    ) -> Self {
        self.stages.push((name, Box::new(stage)));
        self
    }

    /// Stage names in order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|(name, _)| *name).collect()
    }

    /// Runs every stage over the declared columns.
    pub fn apply(&self, context: &TransformContext<'_>) -> Vec<DecoratedColumn> {
        let base = context
            .columns
            .iter()
            .map(|(key, column)| DecoratedColumn::from_descriptor(key, column))
            .collect();
        self.stages.iter().fold(base, |columns, (name, stage)| {
            log::trace!("column stage '{}' over {} columns", name, columns.len());
            stage(columns, context)
        })
    }
}

impl Default for ColumnTransformPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for ColumnTransformPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnTransformPipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

// =============================================================================
// Stages
// =============================================================================

/// Drops columns whose breakpoints are all inactive.
pub fn responsive_stage(columns: Vec<DecoratedColumn>, context: &TransformContext<'_>) -> Vec<DecoratedColumn> {
    columns
        .into_iter()
        .filter(|decorated| {
            context
                .columns
                .get(&decorated.key)
                .is_none_or(|column| column.visible_on(context.screens))
        })
        .collect()
}

/// Adds sort state and the next direction to sortable columns.
pub fn sorter_stage(columns: Vec<DecoratedColumn>, context: &TransformContext<'_>) -> Vec<DecoratedColumn> {
    columns
        .into_iter()
        .map(|mut decorated| {
            if let Some(column) = context.columns.get(&decorated.key)
                && column.sorter.is_some()
            {
                let order = context.sort.order_of(&decorated.key);
                let directions = effective_directions(column, context.sort_directions);
                decorated.sortable = true;
                decorated.sort_order = order;
                decorated.next_sort_order = next_sort_order(directions, order);
                decorated.class_names.push("column-has-sorters".to_string());
                if order.is_some() {
                    decorated.class_names.push("column-sort".to_string());
                }
            }
            decorated
        })
        .collect()
}

/// Adds filter options and the current selection to filterable columns.
pub fn filter_stage(columns: Vec<DecoratedColumn>, context: &TransformContext<'_>) -> Vec<DecoratedColumn> {
    columns
        .into_iter()
        .map(|mut decorated| {
            if let Some(column) = context.columns.get(&decorated.key)
                && let Some(filter) = &column.filter
            {
                let selected = context.filter.selected(&decorated.key).unwrap_or_default();
                decorated.filter_options = filter.options.clone();
                decorated.filter_multiple = filter.multiple;
                decorated.filtered_values = selected.to_vec();
                decorated.filtered = !selected.is_empty();
            }
            decorated
        })
        .collect()
}

/// Prepends the selection column when selection is configured.
///
/// Without an explicit side, the selection column follows a left-pinned
/// first column.
pub fn selection_stage(columns: Vec<DecoratedColumn>, context: &TransformContext<'_>) -> Vec<DecoratedColumn> {
    let Some(header) = context.selection else {
        return columns;
    };
    let mut header = header.clone();
    if header.fixed.is_none()
        && columns.first().is_some_and(|first| first.fixed == Some(Fixed::Left))
    {
        header.fixed = Some(Fixed::Left);
    }
    let mut decorated = Vec::with_capacity(columns.len() + 1);
    decorated.push(DecoratedColumn::selection_column(header));
    decorated.extend(columns);
    decorated
}

/// Resolves computed titles against the current sort and filter state.
pub fn title_stage(columns: Vec<DecoratedColumn>, context: &TransformContext<'_>) -> Vec<DecoratedColumn> {
    let title_context = TitleContext {
        sort_states: context.sort.states(),
        filters: context.filter.state(),
    };
    columns
        .into_iter()
        .map(|mut decorated| {
            if decorated.kind == ColumnKind::Data
                && let Some(column) = context.columns.get(&decorated.key)
            {
                decorated.title = column.title.resolve(&title_context);
            }
            decorated
        })
        .collect()
}
