//! Pagination state and page slicing.

use std::ops::Range;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

use crate::diagnostic::Diagnostic;
use crate::diagnostic::Diagnostics;

/// Page size used when neither `pageSize` nor `defaultPageSize` is given.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Where the pagination widget is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaginationPosition {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
    None,
}

impl PaginationPosition {
    fn is_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::TopCenter | Self::TopRight)
    }

    fn is_bottom(self) -> bool {
        matches!(self, Self::BottomLeft | Self::BottomCenter | Self::BottomRight)
    }
}

/// Widget size passthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationSize {
    Default,
    Small,
}

/// Pagination options.
///
/// `current` and `page_size` are controlled values: when set they always win
/// over the coordinator's own state. `total` overrides the processed data
/// length, for data loaded in parts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginationConfig {
    pub current: Option<usize>,
    pub default_current: Option<usize>,
    pub page_size: Option<usize>,
    pub default_page_size: Option<usize>,
    pub total: Option<usize>,
    pub position: Vec<PaginationPosition>,
    pub hide_on_single_page: bool,
    pub show_size_changer: Option<bool>,
    pub simple: bool,
    pub size: Option<PaginationSize>,
}

impl PaginationConfig {
    /// Creates a config with every option unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the controlled current page.
    pub fn with_current(mut self, current: usize) -> Self {
        self.current = Some(current);
        self
    }

    /// Sets the controlled page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Overrides the total row count.
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    /// Sets the widget placement.
    pub fn with_position(mut self, position: Vec<PaginationPosition>) -> Self {
        self.position = position;
        self
    }

    /// Hides the widget when everything fits on one page.
    pub fn hide_on_single_page(mut self) -> Self {
        self.hide_on_single_page = true;
        self
    }
}

/// Pagination switch: disabled, or enabled with options.
#[derive(Debug, Clone, PartialEq)]
pub enum Pagination {
    /// Every processed row is visible.
    Disabled,
    /// Rows are paged.
    Enabled(PaginationConfig),
}

impl Pagination {
    /// Returns the options when enabled.
    pub fn config(&self) -> Option<&PaginationConfig> {
        match self {
            Pagination::Disabled => None,
            Pagination::Enabled(config) => Some(config),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::Enabled(PaginationConfig::default())
    }
}

impl From<PaginationConfig> for Pagination {
    fn from(config: PaginationConfig) -> Self {
        Pagination::Enabled(config)
    }
}

impl<'de> Deserialize<'de> for Pagination {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Config(PaginationConfig),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Flag(false) => Pagination::Disabled,
            Raw::Flag(true) => Pagination::default(),
            Raw::Config(config) => Pagination::Enabled(config),
        })
    }
}

impl Serialize for Pagination {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Pagination::Disabled => serializer.serialize_bool(false),
            Pagination::Enabled(config) => config.serialize(serializer),
        }
    }
}

/// Effective pagination handed to the pagination widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    pub current: usize,
    pub page_size: usize,
    pub total: usize,
    pub position: Vec<PaginationPosition>,
    pub hide_on_single_page: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_size_changer: Option<bool>,
    pub simple: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<PaginationSize>,
}

/// Derives the effective page from configuration and data length.
#[derive(Debug, Clone)]
pub struct PaginationCoordinator {
    pagination: Pagination,
    current: usize,
    page_size: usize,
}

impl PaginationCoordinator {
    /// Creates a coordinator, seeding its own state from the defaults.
    pub fn new(pagination: Pagination) -> Self {
        let (current, page_size) = match pagination.config() {
            Some(config) => (
                config.default_current.filter(|c| *c > 0).unwrap_or(1),
                config
                    .default_page_size
                    .filter(|s| *s > 0)
                    .unwrap_or(DEFAULT_PAGE_SIZE),
            ),
            None => (1, DEFAULT_PAGE_SIZE),
        };
        Self {
            pagination,
            current,
            page_size,
        }
    }

    /// Replaces the configuration, keeping the coordinator's own state.
    pub fn set_config(&mut self, pagination: Pagination) {
        self.pagination = pagination;
    }

    /// The configuration.
    pub fn config(&self) -> &Pagination {
        &self.pagination
    }

    /// Returns `true` unless pagination is disabled.
    pub fn is_enabled(&self) -> bool {
        matches!(self.pagination, Pagination::Enabled(_))
    }

    /// Effective page size.
    pub fn page_size(&self) -> usize {
        self.pagination
            .config()
            .and_then(|config| config.page_size)
            .filter(|size| *size > 0)
            .unwrap_or(self.page_size)
    }

    /// Total row count for `len` processed rows.
    pub fn total(&self, len: usize) -> usize {
        self.pagination
            .config()
            .and_then(|config| config.total)
            .unwrap_or(len)
    }

    /// Last page number for `len` processed rows, at least 1.
    pub fn max_page(&self, len: usize) -> usize {
        self.total(len).div_ceil(self.page_size()).max(1)
    }

    /// Returns `true` when the coordinator's own page lies beyond the last
    /// page for `len` rows. Controlled pages are left to the host.
    pub fn is_out_of_range(&self, len: usize) -> bool {
        self.pagination
            .config()
            .is_some_and(|config| config.current.is_none())
            && self.current > self.max_page(len)
    }

    /// Effective state for `len` processed rows.
    ///
    /// A zero `current` falls back to page 1 and a `current` beyond the last
    /// page is clamped to it.
    pub fn state(&self, len: usize) -> PaginationState {
        let config = self.pagination.config().cloned().unwrap_or_default();
        let current = match config.current {
            Some(0) => 1,
            Some(current) => current,
            None => self.current,
        }
        .min(self.max_page(len));
        let position = if config.position.is_empty() {
            vec![PaginationPosition::BottomRight]
        } else {
            config.position
        };
        PaginationState {
            current,
            page_size: self.page_size(),
            total: self.total(len),
            position,
            hide_on_single_page: config.hide_on_single_page,
            show_size_changer: config.show_size_changer,
            simple: config.simple,
            size: config.size,
        }
    }

    /// Index range of the visible page within `len` processed rows.
    ///
    /// When the configured total exceeds the loaded rows and those rows fit
    /// on one page, all of them are shown. When they span more than one page
    /// the range is sliced as usual, which may leave the page short or empty.
    pub fn page_range(&self, len: usize, diagnostics: &mut Diagnostics) -> Range<usize> {
        let Some(config) = self.pagination.config() else {
            return 0..len;
        };
        if config.current == Some(0) {
            diagnostics.report(Diagnostic::NonPositiveCurrent);
        }

        let state = self.state(len);
        if len < state.total {
            if len <= state.page_size {
                diagnostics.report(Diagnostic::PartialDataWithinPage {
                    loaded: len,
                    total: state.total,
                });
                return 0..len;
            }
            diagnostics.report(Diagnostic::PartialDataExceedsPage {
                loaded: len,
                total: state.total,
                page_size: state.page_size,
            });
        }

        let start = ((state.current - 1) * state.page_size).min(len);
        let end = (start + state.page_size).min(len);
        start..end
    }

    /// Records a page change from the widget and returns the new
    /// `(current, page_size)`.
    ///
    /// A changed page size restarts at page 1. A page past the last one for
    /// `len` processed rows is clamped to it.
    pub fn change(
        &mut self,
        current: usize,
        page_size: usize,
        len: usize,
        diagnostics: &mut Diagnostics,
    ) -> (usize, usize) {
        let page_size = if page_size == 0 { self.page_size() } else { page_size };
        let current = if page_size != self.page_size() {
            1
        } else {
            if current == 0 {
                diagnostics.report(Diagnostic::NonPositiveCurrent);
            }
            current.max(1)
        };
        self.page_size = page_size;
        let current = current.min(self.max_page(len));
        self.current = current;
        log::debug!("page changed to {} (size {})", current, page_size);
        (current, page_size)
    }

    /// Forces the coordinator's own page back to 1 and returns the new
    /// `(current, page_size)`.
    pub fn reset(&mut self) -> (usize, usize) {
        self.current = 1;
        (1, self.page_size())
    }

    /// Whether the widget is placed `(top, bottom)`.
    pub fn placements(&self) -> (bool, bool) {
        let Some(config) = self.pagination.config() else {
            return (false, false);
        };
        if config.position.is_empty() {
            return (false, true);
        }
        (
            config.position.iter().any(|p| p.is_top()),
            config.position.iter().any(|p| p.is_bottom()),
        )
    }

    /// Whether the widget should be drawn at all for `len` processed rows.
    pub fn should_render(&self, len: usize) -> bool {
        let Some(config) = self.pagination.config() else {
            return false;
        };
        !(config.hide_on_single_page && self.total(len) <= self.page_size())
    }
}

impl Default for PaginationCoordinator {
    fn default() -> Self {
        Self::new(Pagination::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator(config: PaginationConfig) -> PaginationCoordinator {
        PaginationCoordinator::new(Pagination::Enabled(config))
    }

    #[test]
    fn test_second_page_holds_remainder() {
        let pager = coordinator(PaginationConfig::new().with_current(2).with_page_size(2));
        let mut diagnostics = Diagnostics::new();

        assert_eq!(pager.page_range(3, &mut diagnostics), 2..3);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_total_override_within_one_page_shows_everything() {
        let pager = coordinator(PaginationConfig::new().with_total(100));
        let mut diagnostics = Diagnostics::new();

        assert_eq!(pager.page_range(3, &mut diagnostics), 0..3);
        assert!(diagnostics.contains(&Diagnostic::PartialDataWithinPage {
            loaded: 3,
            total: 100
        }));
    }

    #[test]
    fn test_total_override_beyond_one_page_slices() {
        let pager = coordinator(
            PaginationConfig::new()
                .with_total(100)
                .with_page_size(2)
                .with_current(3),
        );
        let mut diagnostics = Diagnostics::new();

        assert_eq!(pager.page_range(5, &mut diagnostics), 4..5);
        assert!(matches!(
            diagnostics.entries(),
            [Diagnostic::PartialDataExceedsPage { .. }]
        ));
    }

    #[test]
    fn test_zero_current_reports_and_uses_first_page() {
        let pager = coordinator(PaginationConfig::new().with_current(0).with_page_size(2));
        let mut diagnostics = Diagnostics::new();

        assert_eq!(pager.page_range(5, &mut diagnostics), 0..2);
        assert!(diagnostics.contains(&Diagnostic::NonPositiveCurrent));
    }

    #[test]
    fn test_current_clamped_to_last_page() {
        let pager = coordinator(PaginationConfig::new().with_current(9).with_page_size(2));
        assert_eq!(pager.state(3).current, 2);
        assert_eq!(pager.state(0).current, 1);
    }

    #[test]
    fn test_change_page_size_restarts() {
        let mut pager = PaginationCoordinator::default();
        let mut diagnostics = Diagnostics::new();
        assert_eq!(pager.change(3, 10, 30, &mut diagnostics), (3, 10));
        assert_eq!(pager.change(3, 20, 30, &mut diagnostics), (1, 20));
        assert_eq!(pager.reset(), (1, 20));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_change_clamps_to_last_page() {
        let mut pager = PaginationCoordinator::default();
        let mut diagnostics = Diagnostics::new();

        assert_eq!(pager.change(5, 10, 30, &mut diagnostics), (3, 10));
        assert!(!pager.is_out_of_range(30));
        assert_eq!(pager.state(30).current, 3);
    }

    #[test]
    fn test_change_to_zero_reports() {
        let mut pager = PaginationCoordinator::default();
        let mut diagnostics = Diagnostics::new();

        assert_eq!(pager.change(0, 10, 30, &mut diagnostics), (1, 10));
        assert!(diagnostics.contains(&Diagnostic::NonPositiveCurrent));
    }

    #[test]
    fn test_out_of_range_only_for_own_page() {
        let mut pager = PaginationCoordinator::default();
        pager.change(3, 10, 30, &mut Diagnostics::new());
        assert!(!pager.is_out_of_range(30));
        assert!(pager.is_out_of_range(12));

        let controlled = coordinator(PaginationConfig::new().with_current(3));
        assert!(!controlled.is_out_of_range(12));
    }

    #[test]
    fn test_disabled_returns_everything() {
        let pager = PaginationCoordinator::new(Pagination::Disabled);
        let mut diagnostics = Diagnostics::new();
        assert_eq!(pager.page_range(42, &mut diagnostics), 0..42);
        assert!(!pager.should_render(42));
    }

    #[test]
    fn test_deserialize_flag_or_config() {
        let off: Pagination = serde_json::from_str("false").unwrap();
        let on: Pagination = serde_json::from_str("true").unwrap();
        let custom: Pagination =
            serde_json::from_str(r#"{"pageSize": 5, "position": ["topLeft", "bottomRight"]}"#).unwrap();

        assert_eq!(off, Pagination::Disabled);
        assert_eq!(on, Pagination::default());
        let pager = PaginationCoordinator::new(custom);
        assert_eq!(pager.page_size(), 5);
        assert_eq!(pager.placements(), (true, true));
    }

    #[test]
    fn test_hide_on_single_page() {
        let pager = coordinator(PaginationConfig::new().hide_on_single_page());
        assert!(!pager.should_render(10));
        assert!(pager.should_render(11));
    }
}
