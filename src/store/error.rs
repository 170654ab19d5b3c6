//! Remote store error types

use thiserror::Error;

/// Errors raised by a [`super::RecordStore`]
///
/// Display output is the store's own message, so pages can show it as is.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store answered with an error body
    #[error("{message}")]
    Remote {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// No row matched the given id
    #[error("Row {id} not found in {table}")]
    NotFound { table: String, id: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Remote store unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_displays_message_verbatim() {
        let err = StoreError::Remote {
            status: 409,
            code: Some("23505".to_string()),
            message: "duplicate key value violates unique constraint".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "duplicate key value violates unique constraint"
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: StoreError = json_err.into();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
