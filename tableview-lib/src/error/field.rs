//! Errors from typed reads of row fields.

/// Why a row field could not be read as the requested kind.
///
/// `path` is the data path as written in a column's `dataIndex`, segments
/// joined with `.`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// Nothing is stored at the path.
    #[error("row has no value at '{path}'")]
    Missing { path: String },

    /// A value is stored, but of another kind.
    #[error("value at '{path}' is {actual}, expected {expected}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A segment before the last one holds something other than a nested row.
    #[error("'{segment}' in '{path}' is {actual}, not a nested row")]
    NotNested {
        path: String,
        segment: String,
        actual: &'static str,
    },
}

impl FieldError {
    pub fn missing(path: impl Into<String>) -> Self {
        Self::Missing { path: path.into() }
    }

    pub fn type_mismatch(path: impl Into<String>, expected: &'static str, actual: &'static str) -> Self {
        Self::TypeMismatch {
            path: path.into(),
            expected,
            actual,
        }
    }

    pub fn not_nested(path: impl Into<String>, segment: impl Into<String>, actual: &'static str) -> Self {
        Self::NotNested {
            path: path.into(),
            segment: segment.into(),
            actual,
        }
    }

    /// The data path the read was for.
    pub fn path(&self) -> &str {
        match self {
            Self::Missing { path } | Self::TypeMismatch { path, .. } | Self::NotNested { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_path() {
        let error = FieldError::not_nested("address.city", "address", "string");
        assert_eq!(error.path(), "address.city");
        assert_eq!(
            error.to_string(),
            "'address' in 'address.city' is string, not a nested row"
        );
        assert_eq!(
            FieldError::type_mismatch("age", "string", "int").to_string(),
            "value at 'age' is int, expected string"
        );
    }
}
