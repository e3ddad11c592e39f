use thiserror::Error;

/// A request field failed validation.
///
/// Carries the message returned to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Trims a string and drops it when nothing is left.
pub fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trims a required string, failing when it is absent or blank.
pub fn required(field: &str, value: Option<String>) -> Result<String, ValidationError> {
    trimmed(value).ok_or_else(|| ValidationError::new(format!("`{}` is required", field)))
}
