//! Non-fatal configuration warnings.
//!
//! The pipeline never fails across its public boundary. Likely misuse is
//! logged through `log` and kept as a [`Diagnostic`] so hosts can surface it,
//! while execution continues with the most permissive behaviour.

use std::fmt;

use crate::key::RowKey;

/// A single configuration warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// `pagination.current` was zero; page 1 is used instead.
    NonPositiveCurrent,
    /// The row key strategy depends on the row index, which is unstable
    /// across sorting, filtering and nesting.
    IndexedRowKey,
    /// Records had no usable key field; their sibling index was used instead.
    MissingRowKey {
        /// Field the key was read from.
        field: String,
        /// Number of records affected.
        count: usize,
    },
    /// Two records resolved to the same key; the first one wins lookups.
    DuplicateRowKey {
        /// The shared key.
        key: RowKey,
    },
    /// `pagination.total` exceeds the loaded rows, which all fit on one page.
    PartialDataWithinPage {
        /// Rows available locally.
        loaded: usize,
        /// Total reported by configuration.
        total: usize,
    },
    /// `pagination.total` exceeds the loaded rows, yet the loaded rows span
    /// more than one page.
    PartialDataExceedsPage {
        /// Rows available locally.
        loaded: usize,
        /// Total reported by configuration.
        total: usize,
        /// Configured page size.
        page_size: usize,
    },
    /// An event referenced a column that does not exist or lacks the
    /// capability (sorter/filter) the event needs.
    UnknownColumn {
        /// The column key from the event.
        key: String,
    },
    /// A selection event referenced a key not present in the data.
    UnknownRowKey {
        /// The key from the event.
        key: RowKey,
    },
    /// A selection event targeted a disabled row.
    DisabledRow {
        /// The disabled row's key.
        key: RowKey,
    },
    /// A selection event arrived while row selection is not configured.
    SelectionDisabled,
}

impl Diagnostic {
    /// Log level the diagnostic is reported at.
    pub fn level(&self) -> log::Level {
        match self {
            Diagnostic::PartialDataWithinPage { .. } => log::Level::Info,
            Diagnostic::UnknownRowKey { .. }
            | Diagnostic::DisabledRow { .. }
            | Diagnostic::SelectionDisabled => log::Level::Debug,
            _ => log::Level::Warn,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NonPositiveCurrent => {
                write!(f, "`pagination.current` should be a positive number")
            }
            Diagnostic::IndexedRowKey => write!(
                f,
                "`rowKey` depends on the row index, keys will not be stable"
            ),
            Diagnostic::MissingRowKey { field, count } => write!(
                f,
                "{} records have no `{}` field, falling back to their index",
                count, field
            ),
            Diagnostic::DuplicateRowKey { key } => {
                write!(f, "row key {} is shared by more than one record", key)
            }
            Diagnostic::PartialDataWithinPage { loaded, total } => write!(
                f,
                "data has {} rows but `pagination.total` is {}, showing all loaded rows",
                loaded, total
            ),
            Diagnostic::PartialDataExceedsPage {
                loaded,
                total,
                page_size,
            } => write!(
                f,
                "data has {} rows, less than `pagination.total` {} but more than `pagination.pageSize` {}; check the async data configuration",
                loaded, total, page_size
            ),
            Diagnostic::UnknownColumn { key } => write!(f, "no usable column '{}'", key),
            Diagnostic::UnknownRowKey { key } => write!(f, "no row with key {}", key),
            Diagnostic::DisabledRow { key } => write!(f, "row {} is disabled", key),
            Diagnostic::SelectionDisabled => write!(f, "row selection is not configured"),
        }
    }
}

/// Collected diagnostics for the current event.
///
/// Reporting logs immediately; repeated reports of an equal diagnostic are
/// kept once.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs and records a diagnostic.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        if self.entries.contains(&diagnostic) {
            return;
        }
        log::log!(diagnostic.level(), "{}", diagnostic);
        self.entries.push(diagnostic);
    }

    /// Records diagnostics that were already logged elsewhere.
    pub fn extend_silent(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            if !self.entries.contains(&diagnostic) {
                self.entries.push(diagnostic);
            }
        }
    }

    /// Returns the recorded diagnostics.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Returns `true` if an equal diagnostic was recorded.
    pub fn contains(&self, diagnostic: &Diagnostic) -> bool {
        self.entries.contains(diagnostic)
    }

    /// Forgets everything recorded so far.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
