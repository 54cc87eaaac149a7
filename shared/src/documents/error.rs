use thiserror::Error;

/// Errors that can occur while decoding a login, capability or fetch document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// Body could not be parsed as the expected document
    #[error("Malformed {document} document: {reason}")]
    Malformed {
        document: &'static str,
        reason: String,
    },

    /// A successful login reply lacked a value the session cannot start without
    #[error("Login reply is missing required field '{field}'")]
    MissingField { field: &'static str },

    /// A value was present but could not be interpreted
    #[error("Login reply field '{field}' has invalid value '{value}'")]
    InvalidField { field: &'static str, value: String },
}

impl DocumentError {
    pub(crate) fn malformed(document: &'static str, error: serde_json::Error) -> Self {
        DocumentError::Malformed {
            document,
            reason: error.to_string(),
        }
    }
}
