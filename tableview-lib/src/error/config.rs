//! Configuration error types

/// Errors raised while reading table configuration or column declarations.
///
/// These only occur at the parsing edge. Once a [`TableView`](crate::TableView)
/// exists, misconfiguration is reported as a
/// [`Diagnostic`](crate::diagnostic::Diagnostic) instead.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The input was not valid JSON for the expected shape.
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The pagination block cannot produce a usable page.
    #[error("Invalid pagination: {message}")]
    InvalidPagination {
        /// Description of the problem.
        message: String,
    },

    /// Two columns resolve to the same column key.
    #[error("Column '{key}' is declared more than once")]
    DuplicateColumn {
        /// The clashing key.
        key: String,
    },
}

impl ConfigError {
    /// Creates a new invalid pagination error.
    pub fn invalid_pagination(message: impl Into<String>) -> Self {
        Self::InvalidPagination {
            message: message.into(),
        }
    }
}
