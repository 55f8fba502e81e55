//! Column declarations.
//!
//! A [`ColumnDescriptor`] says where a column reads its value from and which
//! capabilities it offers: sorting, filtering, responsive visibility and a
//! fixed position. Column lists are replaced wholesale, never edited in place.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

use crate::error::ConfigError;
use crate::filter::FilterState;
use crate::model::Record;
use crate::model::Value;
use crate::sort::SortOrder;
use crate::sort::SortState;

/// Side a column is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fixed {
    /// Pinned to the left edge.
    Left,
    /// Pinned to the right edge.
    Right,
}

/// Screen-size tag used to show a column only on matching viewports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Xs,
    Sm,
    Md,
    Lg,
    Xl,
    Xxl,
}

/// Context handed to computed column titles.
#[derive(Debug, Clone, Copy)]
pub struct TitleContext<'a> {
    /// Every sort state, active or not.
    pub sort_states: &'a [SortState],
    /// Current filter selections.
    pub filters: &'a FilterState,
}

/// Title renderer.
pub type TitleFn = Arc<dyn Fn(&TitleContext<'_>) -> String + Send + Sync>;

/// Header title of a column.
#[derive(Clone)]
pub enum ColumnTitle {
    /// Static text.
    Text(String),
    /// Computed from the current sort and filter state.
    Render(TitleFn),
}

impl ColumnTitle {
    /// Resolves the title text.
    pub fn resolve(&self, context: &TitleContext<'_>) -> String {
        match self {
            ColumnTitle::Text(text) => text.clone(),
            ColumnTitle::Render(render) => render(context),
        }
    }
}

impl fmt::Debug for ColumnTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnTitle::Text(text) => f.debug_tuple("Text").field(text).finish(),
            ColumnTitle::Render(_) => f.write_str("Render(..)"),
        }
    }
}

/// Record comparison function.
pub type CompareFn = Arc<dyn Fn(&Record, &Record) -> Ordering + Send + Sync>;

/// How two records compare on a column.
#[derive(Clone)]
pub enum Comparator {
    /// Natural [`Value::compare`] ordering of the column's value.
    ByValue,
    /// Caller-supplied comparison.
    Custom(CompareFn),
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparator::ByValue => f.write_str("ByValue"),
            Comparator::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Sorting capability of a column.
#[derive(Debug, Clone)]
pub struct Sorter {
    /// The comparison.
    pub compare: Comparator,
    /// Multi-sort priority. Columns with a priority keep each other's sort
    /// states; lower numbers are compared first.
    pub multiple: Option<u32>,
    /// Directions cycled through on header interaction, overriding the
    /// table's list.
    pub sort_directions: Option<Vec<SortOrder>>,
    /// Sort order applied before any interaction.
    pub default_order: Option<SortOrder>,
}

impl Sorter {
    /// Sorts by the column's natural value ordering.
    pub fn by_value() -> Self {
        Self {
            compare: Comparator::ByValue,
            multiple: None,
            sort_directions: None,
            default_order: None,
        }
    }

    /// Sorts with a custom comparison.
    pub fn custom(compare: impl Fn(&Record, &Record) -> Ordering + Send + Sync + 'static) -> Self {
        Self {
            compare: Comparator::Custom(Arc::new(compare)),
            ..Self::by_value()
        }
    }

    /// Sets the multi-sort priority.
    pub fn with_multiple(mut self, priority: u32) -> Self {
        self.multiple = Some(priority);
        self
    }

    /// Sets the column's own direction cycle.
    pub fn with_sort_directions(mut self, directions: Vec<SortOrder>) -> Self {
        self.sort_directions = Some(directions);
        self
    }

    /// Sets the initial sort order.
    pub fn with_default_order(mut self, order: SortOrder) -> Self {
        self.default_order = Some(order);
        self
    }
}

/// One entry of a column's filter menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOption {
    /// Display text.
    pub text: String,
    /// Value handed to the match predicate.
    pub value: Value,
    /// Nested options (tree-shaped filter menus).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FilterOption>,
}

impl FilterOption {
    /// Creates a leaf option.
    pub fn new(text: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            text: text.into(),
            value: value.into(),
            children: Vec::new(),
        }
    }

    /// Adds nested options.
    pub fn with_children(mut self, children: Vec<FilterOption>) -> Self {
        self.children = children;
        self
    }
}

/// Filter match function: `(selected value, record) -> matches`.
pub type MatchFn = Arc<dyn Fn(&Value, &Record) -> bool + Send + Sync>;

/// How a record is matched against one selected filter value.
#[derive(Clone)]
pub enum FilterPredicate {
    /// The column value loosely equals the selected value.
    Equals,
    /// The column value's text contains the selected value's text.
    Contains,
    /// Caller-supplied predicate.
    Custom(MatchFn),
}

impl fmt::Debug for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterPredicate::Equals => f.write_str("Equals"),
            FilterPredicate::Contains => f.write_str("Contains"),
            FilterPredicate::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Filtering capability of a column.
#[derive(Debug, Clone)]
pub struct ColumnFilter {
    /// Candidate values offered to the user.
    pub options: Vec<FilterOption>,
    /// Match predicate.
    pub predicate: FilterPredicate,
    /// Whether several values may be selected at once.
    pub multiple: bool,
    /// Selection applied before any interaction.
    pub default_filtered_value: Option<Vec<Value>>,
}

impl ColumnFilter {
    /// Equality filter over the given options.
    pub fn new(options: Vec<FilterOption>) -> Self {
        Self {
            options,
            predicate: FilterPredicate::Equals,
            multiple: true,
            default_filtered_value: None,
        }
    }

    /// Sets the match predicate.
    pub fn with_predicate(mut self, predicate: FilterPredicate) -> Self {
        self.predicate = predicate;
        self
    }

    /// Uses a custom match predicate.
    pub fn matching(mut self, f: impl Fn(&Value, &Record) -> bool + Send + Sync + 'static) -> Self {
        self.predicate = FilterPredicate::Custom(Arc::new(f));
        self
    }

    /// Restricts the filter to a single selected value.
    pub fn single(mut self) -> Self {
        self.multiple = false;
        self
    }

    /// Sets the initial selection.
    pub fn with_default(mut self, values: Vec<Value>) -> Self {
        self.default_filtered_value = Some(values);
        self
    }

    /// All options, nested ones included, depth first.
    pub fn flatten_options(&self) -> Vec<&FilterOption> {
        fn walk<'a>(options: &'a [FilterOption], out: &mut Vec<&'a FilterOption>) {
            for option in options {
                out.push(option);
                walk(&option.children, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.options, &mut out);
        out
    }

    /// Maps a selected key onto the matching option value.
    ///
    /// Selections often arrive as strings from a UI; the option with the
    /// same [`Value::key_string`] supplies the typed value. Unknown keys are
    /// used as given.
    pub fn resolve_selected(&self, selected: &Value) -> Value {
        let wanted = selected.key_string();
        self.flatten_options()
            .into_iter()
            .find(|option| option.value.key_string() == wanted)
            .map(|option| option.value.clone())
            .unwrap_or_else(|| selected.clone())
    }
}

/// Declaration of one table column.
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    /// Explicit column key.
    pub key: Option<String>,
    /// Header title.
    pub title: ColumnTitle,
    /// Path to the column's value inside a record.
    pub data_path: Vec<String>,
    /// Sorting capability.
    pub sorter: Option<Sorter>,
    /// Filtering capability.
    pub filter: Option<ColumnFilter>,
    /// Breakpoints on which the column is shown; empty means always.
    pub responsive: Vec<Breakpoint>,
    /// Pinned side.
    pub fixed: Option<Fixed>,
    /// Width hint for the renderer.
    pub width: Option<u32>,
}

impl ColumnDescriptor {
    /// Column reading the top-level field `data_index`, titled after it.
    pub fn new(data_index: impl Into<String>) -> Self {
        let data_index = data_index.into();
        Self {
            key: None,
            title: ColumnTitle::Text(data_index.clone()),
            data_path: vec![data_index],
            sorter: None,
            filter: None,
            responsive: Vec::new(),
            fixed: None,
            width: None,
        }
    }

    /// Column reading a nested data path.
    pub fn with_path(path: &[&str]) -> Self {
        let mut column = Self::new(path.join("."));
        column.data_path = path.iter().map(|segment| segment.to_string()).collect();
        column
    }

    /// Sets the explicit key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets a static title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = ColumnTitle::Text(title.into());
        self
    }

    /// Sets a computed title.
    pub fn render_title(
        mut self,
        render: impl Fn(&TitleContext<'_>) -> String + Send + Sync + 'static,
    ) -> Self {
        self.title = ColumnTitle::Render(Arc::new(render));
        self
    }

    /// Makes the column sortable.
    pub fn sorter(mut self, sorter: Sorter) -> Self {
        self.sorter = Some(sorter);
        self
    }

    /// Makes the column sortable by natural value order.
    pub fn sortable(self) -> Self {
        self.sorter(Sorter::by_value())
    }

    /// Makes the column filterable.
    pub fn filter(mut self, filter: ColumnFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Shows the column only on the given breakpoints.
    pub fn responsive(mut self, breakpoints: Vec<Breakpoint>) -> Self {
        self.responsive = breakpoints;
        self
    }

    /// Pins the column.
    pub fn fixed(mut self, side: Fixed) -> Self {
        self.fixed = Some(side);
        self
    }

    /// Sets the width hint.
    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    /// Key identifying the column in sort/filter state and change events:
    /// the explicit key, else the joined data path, else the position.
    pub fn resolved_key(&self, position: usize) -> String {
        if let Some(key) = &self.key {
            key.clone()
        } else if !self.data_path.is_empty() {
            self.data_path.join(".")
        } else {
            format!("column-{}", position)
        }
    }

    /// The column's value in `record`; missing and null fields yield `None`.
    pub fn value_of<'r>(&self, record: &'r Record) -> Option<&'r Value> {
        record
            .get_path(&self.data_path)
            .filter(|value| !value.is_null())
    }

    /// Compares two records on this column in ascending order.
    ///
    /// Columns without a sorter consider every pair equal.
    pub fn compare_records(&self, a: &Record, b: &Record) -> Ordering {
        match self.sorter.as_ref().map(|sorter| &sorter.compare) {
            Some(Comparator::ByValue) => {
                let left = self.value_of(a).unwrap_or(&Value::Null);
                let right = self.value_of(b).unwrap_or(&Value::Null);
                left.compare(right)
            }
            Some(Comparator::Custom(compare)) => compare(a, b),
            None => Ordering::Equal,
        }
    }

    /// Returns `true` if `record` matches one selected filter value.
    ///
    /// Records without a value for the column never match the built-in
    /// predicates.
    pub fn filter_matches(&self, selected: &Value, record: &Record) -> bool {
        let Some(filter) = &self.filter else {
            return true;
        };
        match &filter.predicate {
            FilterPredicate::Equals => self
                .value_of(record)
                .is_some_and(|value| value.loosely_equals(selected)),
            FilterPredicate::Contains => self
                .value_of(record)
                .is_some_and(|value| value.contains_text(&selected.key_string())),
            FilterPredicate::Custom(matches) => matches(selected, record),
        }
    }

    /// Returns `true` if the column is visible for the active breakpoints.
    ///
    /// Without breakpoint information every column is visible.
    pub fn visible_on(&self, screens: Option<&HashSet<Breakpoint>>) -> bool {
        match screens {
            Some(active) if !self.responsive.is_empty() => {
                self.responsive.iter().any(|bp| active.contains(bp))
            }
            _ => true,
        }
    }
}

/// Ordered column list with resolved keys.
#[derive(Debug, Clone, Default)]
pub struct ColumnSet {
    columns: Vec<ColumnDescriptor>,
    keys: Vec<String>,
}

impl ColumnSet {
    /// Resolves keys for `columns`.
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        let keys = columns
            .iter()
            .enumerate()
            .map(|(position, column)| column.resolved_key(position))
            .collect();
        Self { columns, keys }
    }

    /// Iterates `(key, column)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnDescriptor)> {
        self.keys.iter().map(String::as_str).zip(self.columns.iter())
    }

    /// Finds a column by key.
    pub fn get(&self, key: &str) -> Option<&ColumnDescriptor> {
        self.keys
            .iter()
            .position(|k| k == key)
            .and_then(|position| self.columns.get(position))
    }

    /// The resolved keys in declaration order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// The declared columns.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// =============================================================================
// JSON declarations
// =============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum DataIndex {
    Field(String),
    Path(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SorterJson {
    Flag(bool),
    Options {
        #[serde(default)]
        multiple: Option<u32>,
        #[serde(default, rename = "sortDirections")]
        sort_directions: Option<Vec<SortOrder>>,
    },
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PredicateJson {
    #[default]
    Equals,
    Contains,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColumnJson {
    key: Option<String>,
    title: Option<String>,
    data_index: Option<DataIndex>,
    sorter: Option<SorterJson>,
    default_sort_order: Option<SortOrder>,
    filters: Option<Vec<FilterOption>>,
    #[serde(default)]
    on_filter: PredicateJson,
    filter_multiple: Option<bool>,
    default_filtered_value: Option<Vec<Value>>,
    #[serde(default)]
    responsive: Vec<Breakpoint>,
    fixed: Option<Fixed>,
    width: Option<u32>,
}

impl From<ColumnJson> for ColumnDescriptor {
    fn from(raw: ColumnJson) -> Self {
        let data_path = match raw.data_index {
            Some(DataIndex::Field(field)) => vec![field],
            Some(DataIndex::Path(path)) => path,
            None => Vec::new(),
        };
        let title = raw
            .title
            .or_else(|| raw.key.clone())
            .unwrap_or_else(|| data_path.join("."));

        let sorter = match raw.sorter {
            None | Some(SorterJson::Flag(false)) => None,
            Some(SorterJson::Flag(true)) => Some(Sorter::by_value()),
            Some(SorterJson::Options {
                multiple,
                sort_directions,
            }) => Some(Sorter {
                multiple,
                sort_directions,
                ..Sorter::by_value()
            }),
        }
        .map(|sorter| Sorter {
            default_order: raw.default_sort_order,
            ..sorter
        });

        let filter = raw.filters.map(|options| ColumnFilter {
            options,
            predicate: match raw.on_filter {
                PredicateJson::Equals => FilterPredicate::Equals,
                PredicateJson::Contains => FilterPredicate::Contains,
            },
            multiple: raw.filter_multiple.unwrap_or(true),
            default_filtered_value: raw.default_filtered_value,
        });

        Self {
            key: raw.key,
            title: ColumnTitle::Text(title),
            data_path,
            sorter,
            filter,
            responsive: raw.responsive,
            fixed: raw.fixed,
            width: raw.width,
        }
    }
}

impl<'de> Deserialize<'de> for ColumnDescriptor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        ColumnJson::deserialize(deserializer).map(ColumnDescriptor::from)
    }
}

/// Parses a JSON array of column declarations.
///
/// Keys follow the same resolution as [`ColumnDescriptor::resolved_key`];
/// two columns resolving to one key are rejected.
pub fn columns_from_json(json: &str) -> Result<Vec<ColumnDescriptor>, ConfigError> {
    let columns: Vec<ColumnDescriptor> = serde_json::from_str(json)?;
    validate_columns(&columns)?;
    Ok(columns)
}

/// Rejects column lists where two columns resolve to one key.
pub fn validate_columns(columns: &[ColumnDescriptor]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for (position, column) in columns.iter().enumerate() {
        let key = column.resolved_key(position);
        if !seen.insert(key.clone()) {
            return Err(ConfigError::DuplicateColumn { key });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_key_precedence() {
        assert_eq!(ColumnDescriptor::new("age").key("a").resolved_key(0), "a");
        assert_eq!(ColumnDescriptor::with_path(&["addr", "city"]).resolved_key(0), "addr.city");

        let mut anonymous = ColumnDescriptor::new("x");
        anonymous.data_path.clear();
        assert_eq!(anonymous.resolved_key(3), "column-3");
    }

    #[test]
    fn test_value_of_skips_null() {
        let column = ColumnDescriptor::new("age");
        assert!(column.value_of(&Record::new().set("age", Value::Null)).is_none());
        assert_eq!(
            column.value_of(&Record::new().set("age", 3)),
            Some(&Value::Int(3))
        );
    }

    #[test]
    fn test_resolve_selected_uses_nested_option_value() {
        let filter = ColumnFilter::new(vec![
            FilterOption::new("Young", 20)
                .with_children(vec![FilterOption::new("Teen", 15)]),
        ]);
        assert_eq!(filter.resolve_selected(&Value::from("15")), Value::Int(15));
        assert_eq!(filter.resolve_selected(&Value::from("99")), Value::from("99"));
    }

    #[test]
    fn test_visible_on_breakpoints() {
        let column = ColumnDescriptor::new("age").responsive(vec![Breakpoint::Lg]);
        let small: HashSet<_> = [Breakpoint::Sm].into_iter().collect();
        let large: HashSet<_> = [Breakpoint::Sm, Breakpoint::Lg].into_iter().collect();

        assert!(column.visible_on(None));
        assert!(!column.visible_on(Some(&small)));
        assert!(column.visible_on(Some(&large)));
    }

    #[test]
    fn test_columns_from_json() {
        let json = r#"[
            {"dataIndex": "name", "title": "Name"},
            {"dataIndex": "age", "sorter": {"multiple": 1}, "defaultSortOrder": "descend",
             "filters": [{"text": "20", "value": 20}], "filterMultiple": false}
        ]"#;
        let columns = columns_from_json(json).unwrap();

        assert_eq!(columns.len(), 2);
        let age = &columns[1];
        let sorter = age.sorter.as_ref().unwrap();
        assert_eq!(sorter.multiple, Some(1));
        assert_eq!(sorter.default_order, Some(SortOrder::Descend));
        assert!(!age.filter.as_ref().unwrap().multiple);
    }

    #[test]
    fn test_columns_from_json_rejects_duplicates() {
        let json = r#"[{"dataIndex": "age"}, {"key": "age"}]"#;
        assert!(matches!(
            columns_from_json(json),
            Err(ConfigError::DuplicateColumn { .. })
        ));
    }
}
