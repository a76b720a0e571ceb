//! Error types for the API.
//!
//! Every failure leaves the server as `{"message": "..."}` with a status
//! code. Internal failures are logged in full and answered with a generic
//! message.
//!
//! ```text
//! ValidationError ─► CoreError ─┐
//!                               ├─► ApiError ─► (StatusCode, {"message"})
//!                     DbError ──┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use cpr_core::CoreError;
use cpr_db::DbError;

/// Generic message for failures the client cannot act on.
pub const SERVER_ERROR_MESSAGE: &str = "Server error";

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// The detail is logged, never sent.
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(m) | ApiError::Unauthorized(m) | ApiError::NotFound(m) => m,
            ApiError::Internal(detail) => {
                error!(error = %detail, "Request failed");
                SERVER_ERROR_MESSAGE.to_string()
            }
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation(v) => v.into(),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<cpr_core::ValidationError> for ApiError {
    fn from(e: cpr_core::ValidationError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::UniqueViolation { .. } => ApiError::BadRequest(e.to_string()),
            DbError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Internal("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_db_errors() {
        let dup: ApiError = DbError::duplicate("email", "a@x.com").into();
        assert!(matches!(dup, ApiError::BadRequest(_)));

        let down: ApiError = DbError::ConnectionFailed("gone".into()).into();
        assert!(matches!(down, ApiError::Internal(_)));
    }

    #[test]
    fn test_core_errors_are_client_errors() {
        let role: ApiError = CoreError::InvalidRole("boss".into()).into();
        assert_eq!(role.to_string(), r#"Invalid role. Must be "manager", "staff", or "admin"."#);
        assert_eq!(role.status(), StatusCode::BAD_REQUEST);

        let empty: ApiError = CoreError::from(cpr_core::ValidationError::Empty { field: "problem".into() }).into();
        assert_eq!(empty.to_string(), "At least one problem is required.");
    }
}
