//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthFlowError;
use crate::contact::ContactError;
use crate::dashboard::PageError;
use crate::store::StoreError;

/// Shown in place of a remote store error, which is only logged
pub const STORE_FAILURE_MESSAGE: &str = "Có lỗi xảy ra khi xử lý dữ liệu. Vui lòng thử lại.";

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("{0}")]
    Validation(String),

    /// Missing or expired session
    #[error("{0}")]
    Unauthorized(String),

    /// Resource not found, or owned by someone else
    #[error("{0}")]
    NotFound(String),

    /// Request conflicts with the current state of a record
    #[error("{0}")]
    Conflict(String),

    /// Remote store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable (dependency down)
    #[error("{0}")]
    ServiceUnavailable(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PageError> for ApiError {
    fn from(err: PageError) -> Self {
        match err {
            PageError::Store(e) => ApiError::Store(e),
            PageError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            PageError::TableTaken { .. } | PageError::InvalidReminderState(_) => {
                ApiError::Conflict(err.to_string())
            }
            PageError::MissingFields
            | PageError::EmptyMessage
            | PageError::GatewayNotInShop
            | PageError::TableNotInShop
            | PageError::DeviceNotInShop => ApiError::Validation(err.to_string()),
        }
    }
}

impl From<AuthFlowError> for ApiError {
    fn from(err: AuthFlowError) -> Self {
        let message = err.to_string();
        match err {
            AuthFlowError::Invalid(_) => ApiError::Validation(message),
            AuthFlowError::EmailTaken => ApiError::Conflict(message),
            AuthFlowError::InvalidCredentials | AuthFlowError::SessionExpired => {
                ApiError::Unauthorized(message)
            }
            AuthFlowError::RegistrationFailed
            | AuthFlowError::LoginFailed
            | AuthFlowError::Unexpected => ApiError::ServiceUnavailable(message),
        }
    }
}

impl From<ContactError> for ApiError {
    fn from(err: ContactError) -> Self {
        match err {
            ContactError::MissingFields => ApiError::Validation(err.to_string()),
            ContactError::SubmitFailed => ApiError::ServiceUnavailable(err.to_string()),
        }
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Store(StoreError::Timeout | StoreError::Unavailable) => {
                (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE")
            }
            ApiError::Store(StoreError::NotFound { .. }) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Store(_) => (StatusCode::BAD_GATEWAY, "STORE_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }

    /// Text sent to the client; internal details stay in the log
    fn public_message(&self) -> String {
        match self {
            ApiError::Store(_) | ApiError::Internal(_) | ApiError::Io(_) => {
                STORE_FAILURE_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::debug!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.public_message(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ValidationError;
    use crate::models::ReminderStatus;

    #[test]
    fn test_store_error_hidden_from_client() {
        let err = ApiError::from(StoreError::Remote {
            status: 400,
            code: Some("23505".to_string()),
            message: "duplicate key value violates unique constraint".to_string(),
        });
        assert_eq!(err.status_and_code().0, StatusCode::BAD_GATEWAY);
        assert_eq!(err.public_message(), STORE_FAILURE_MESSAGE);
    }

    #[test]
    fn test_page_errors_map_to_status() {
        let taken = ApiError::from(PageError::TableTaken {
            number: "3".to_string(),
        });
        assert_eq!(taken.status_and_code().0, StatusCode::CONFLICT);
        assert_eq!(
            taken.public_message(),
            "Bàn 3 đã được liên kết với thiết bị khác"
        );

        let state = ApiError::from(PageError::InvalidReminderState(ReminderStatus::Sent));
        assert_eq!(state.status_and_code().0, StatusCode::CONFLICT);

        let empty = ApiError::from(PageError::EmptyMessage);
        assert_eq!(empty.status_and_code().0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_auth_errors_keep_friendly_text() {
        let err = ApiError::from(AuthFlowError::Invalid(ValidationError::PasswordTooShort));
        assert_eq!(err.status_and_code().0, StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Mật khẩu phải có ít nhất 8 ký tự");

        let expired = ApiError::from(AuthFlowError::SessionExpired);
        assert_eq!(expired.status_and_code().0, StatusCode::UNAUTHORIZED);
    }
}
