//! Validation errors for model records.

/// Error returned when a record or path violates a field rule.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("{field}: {message}")]
    Invalid { field: &'static str, message: String },
    #[error("path escapes the site root: {0}")]
    PathEscapesRoot(String),
    #[error("unknown {kind}: {value}")]
    UnknownChoice { kind: &'static str, value: String },
}

impl ModelError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}
