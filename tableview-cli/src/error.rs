//! CLI error types

use tableview_lib::error::ConfigError;

/// Errors that end a CLI run.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Reading the scenario or writing the log failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The scenario was not valid JSON, or the report could not be written.
    #[error("Invalid scenario JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The scenario's table configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The invocation cannot be carried out as given.
    #[error("{0}")]
    Usage(String),
}

impl CliError {
    /// Creates a usage error.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }
}
