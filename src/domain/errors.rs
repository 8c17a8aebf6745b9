use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Validation error in field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Invalid bookmark identifier: expected {expected}, got {actual}")]
    InvalidIdentifier { expected: String, actual: String },

    #[error("Unknown source tag: {0}")]
    UnknownSource(String),

    #[error("Invalid timestamp in field '{field}': {value}")]
    InvalidTimestamp { field: String, value: String },
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        // Report the first failing field; the record is skipped either way
        let (field, message) = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    let message = error
                        .message
                        .as_ref()
                        .map(|cow| cow.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    (field.to_string(), message)
                })
            })
            .next()
            .unwrap_or_else(|| ("record".to_string(), "Invalid value".to_string()));

        Self::Validation { field, message }
    }
}
