//! Table configuration.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::key::RowKey;
use crate::key::RowKeyStrategy;
use crate::model::Record;
use crate::pagination::Pagination;
use crate::pagination::PaginationConfig;
use crate::selection::SelectionConfig;
use crate::sort::DEFAULT_SORT_DIRECTIONS;
use crate::sort::SortOrder;

/// Default name of the field holding child rows.
pub const DEFAULT_CHILDREN_COLUMN: &str = "children";

/// Extra row class callback: `(record, index, indent level) -> class`.
pub type RowClassNameFn = Arc<dyn Fn(&Record, usize, usize) -> String + Send + Sync>;

/// Options recognized by a table.
///
/// Readable from JSON with camelCase keys; callback options are set from
/// Rust only.
///
/// # Example
///
/// ```
/// use tableview_lib::config::TableConfig;
///
/// let config = TableConfig::from_json(r#"{"rowKey": "id", "pagination": {"pageSize": 5}}"#).unwrap();
/// assert_eq!(config.children_column_name, "children");
/// ```
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableConfig {
    pub pagination: Pagination,
    pub row_selection: Option<SelectionConfig>,
    pub sort_directions: Vec<SortOrder>,
    pub children_column_name: String,
    pub row_key: RowKeyStrategy,
    #[serde(skip)]
    pub row_class_name: Option<RowClassNameFn>,
}

impl TableConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: TableConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects options that cannot produce a page.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(config) = self.pagination.config() {
            if config.page_size == Some(0) {
                return Err(ConfigError::invalid_pagination("pageSize must be positive"));
            }
            if config.default_page_size == Some(0) {
                return Err(ConfigError::invalid_pagination(
                    "defaultPageSize must be positive",
                ));
            }
        }
        Ok(())
    }

    pub fn with_pagination(mut self, pagination: impl Into<Pagination>) -> Self {
        self.pagination = pagination.into();
        self
    }

    /// Shows every row at once.
    pub fn without_pagination(mut self) -> Self {
        self.pagination = Pagination::Disabled;
        self
    }

    pub fn with_row_selection(mut self, selection: SelectionConfig) -> Self {
        self.row_selection = Some(selection);
        self
    }

    pub fn with_sort_directions(mut self, directions: Vec<SortOrder>) -> Self {
        self.sort_directions = directions;
        self
    }

    pub fn with_children_column(mut self, field: impl Into<String>) -> Self {
        self.children_column_name = field.into();
        self
    }

    pub fn with_row_key(mut self, strategy: RowKeyStrategy) -> Self {
        self.row_key = strategy;
        self
    }

    /// Reads keys from `field`.
    pub fn with_row_key_field(self, field: impl Into<String>) -> Self {
        self.with_row_key(RowKeyStrategy::field(field))
    }

    /// Computes keys with `f`.
    pub fn with_row_key_fn(self, f: impl Fn(&Record) -> RowKey + Send + Sync + 'static) -> Self {
        self.with_row_key(RowKeyStrategy::func(f))
    }

    pub fn with_row_class_name(
        mut self,
        f: impl Fn(&Record, usize, usize) -> String + Send + Sync + 'static,
    ) -> Self {
        self.row_class_name = Some(Arc::new(f));
        self
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            pagination: Pagination::Enabled(PaginationConfig::default()),
            row_selection: None,
            sort_directions: DEFAULT_SORT_DIRECTIONS.to_vec(),
            children_column_name: DEFAULT_CHILDREN_COLUMN.to_string(),
            row_key: RowKeyStrategy::default(),
            row_class_name: None,
        }
    }
}

impl fmt::Debug for TableConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableConfig")
            .field("pagination", &self.pagination)
            .field("row_selection", &self.row_selection)
            .field("sort_directions", &self.sort_directions)
            .field("children_column_name", &self.children_column_name)
            .field("row_key", &self.row_key)
            .field("row_class_name", &self.row_class_name.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::SelectionType;

    #[test]
    fn test_defaults() {
        let config = TableConfig::default();
        assert_eq!(config.children_column_name, "children");
        assert_eq!(config.sort_directions, DEFAULT_SORT_DIRECTIONS.to_vec());
        assert!(matches!(config.row_key, RowKeyStrategy::Field(ref f) if f == "key"));
    }

    #[test]
    fn test_from_json() {
        let config = TableConfig::from_json(
            r#"{
                "pagination": false,
                "rowKey": "id",
                "childrenColumnName": "items",
                "sortDirections": ["descend"],
                "rowSelection": {"type": "radio", "selectedRowKeys": [1, "a"]}
            }"#,
        )
        .unwrap();

        assert_eq!(config.pagination, Pagination::Disabled);
        assert_eq!(config.children_column_name, "items");
        assert_eq!(config.sort_directions, vec![SortOrder::Descend]);
        let selection = config.row_selection.unwrap();
        assert_eq!(selection.kind, SelectionType::Radio);
        assert_eq!(
            selection.selected_row_keys,
            Some(vec![RowKey::from(1), RowKey::from("a")])
        );
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert!(matches!(
            TableConfig::from_json(r#"{"pagination": {"pageSize": 0}}"#),
            Err(ConfigError::InvalidPagination { .. })
        ));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            TableConfig::from_json(r#"{"pagination": "#),
            Err(ConfigError::Json(_))
        ));
    }
}
