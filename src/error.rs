use std::sync::OnceLock;

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::IntoResponse,
};
use serde::Serialize;
use serde_json::{Value, json};
use serde_with::skip_serializing_none;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, state::status::InvalidTransition};

static EXPOSE_INTERNAL_ERRORS: OnceLock<bool> = OnceLock::new();

/// Allow internal error messages to reach clients. Only the first call has an effect.
pub fn expose_internal_errors(enabled: bool) {
    let _ = EXPOSE_INTERNAL_ERRORS.set(enabled);
}

fn internal_errors_exposed() -> bool {
    EXPOSE_INTERNAL_ERRORS.get().copied().unwrap_or(false)
}

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend failed while serving the request.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {message}")]
    InvalidInput { code: &'static str, message: String },
    /// Caller is not allowed to perform the operation.
    #[error("forbidden: {message}")]
    Forbidden { code: &'static str, message: String },
    /// Requested resource was not found.
    #[error("not found: {message}")]
    NotFound { code: &'static str, message: String },
    /// Operation clashes with existing data.
    #[error("conflict: {message}")]
    Conflict { code: &'static str, message: String },
    /// Session status does not allow the operation.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

impl ServiceError {
    /// 400 with a machine readable `code`.
    pub fn invalid_input(code: &'static str, message: impl Into<String>) -> Self {
        ServiceError::InvalidInput {
            code,
            message: message.into(),
        }
    }

    /// 403 with a machine readable `code`.
    pub fn forbidden(code: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Forbidden {
            code,
            message: message.into(),
        }
    }

    /// 404 with a machine readable `code`.
    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        ServiceError::NotFound {
            code,
            message: message.into(),
        }
    }

    /// 409 with a machine readable `code`.
    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Conflict {
            code,
            message: message.into(),
        }
    }

    /// Shorthand for the 404 returned whenever a session id does not resolve.
    pub fn session_not_found() -> Self {
        Self::not_found("SESSION_NOT_FOUND", "Game session not found")
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict { message } => ServiceError::Conflict {
                code: "DUPLICATE_KEY",
                message,
            },
            other => ServiceError::Unavailable(other),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        let details = serde_json::to_value(&err).ok();
        AppError::BadRequest {
            code: "VALIDATION_ERROR",
            message: "Invalid input data".into(),
            details,
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {message}")]
    BadRequest {
        code: &'static str,
        message: String,
        details: Option<Value>,
    },
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Authenticated but not allowed.
    #[error("forbidden: {message}")]
    Forbidden { code: &'static str, message: String },
    /// Requested resource not found.
    #[error("not found: {message}")]
    NotFound { code: &'static str, message: String },
    /// Conflict with current state.
    #[error("conflict: {message}")]
    Conflict { code: &'static str, message: String },
    /// Request body exceeds the configured limit.
    #[error("payload too large")]
    PayloadTooLarge,
    /// Caller exhausted its rate limiting window.
    #[error("rate limit exceeded")]
    TooManyRequests { retry_after_secs: u64 },
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        AppError::BadRequest {
            code,
            message: message.into(),
            details: None,
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => {
                error!(error = %source, "storage operation failed");
                AppError::Internal(source.to_string())
            }
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidInput { code, message } => AppError::BadRequest {
                code,
                message,
                details: None,
            },
            ServiceError::Forbidden { code, message } => AppError::Forbidden { code, message },
            ServiceError::NotFound { code, message } => AppError::NotFound { code, message },
            ServiceError::Conflict { code, message } => AppError::Conflict { code, message },
            ServiceError::InvalidTransition(invalid) => AppError::Conflict {
                code: "INVALID_STATE",
                message: invalid.to_string(),
            },
        }
    }
}

#[skip_serializing_none]
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: &'static str,
    message: String,
    details: Option<Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message, details) = match self {
            AppError::BadRequest {
                code,
                message,
                details,
            } => (StatusCode::BAD_REQUEST, code, message, details),
            AppError::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message, None)
            }
            AppError::Forbidden { code, message } => (StatusCode::FORBIDDEN, code, message, None),
            AppError::NotFound { code, message } => (StatusCode::NOT_FOUND, code, message, None),
            AppError::Conflict { code, message } => (StatusCode::CONFLICT, code, message, None),
            AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "REQUEST_TOO_LARGE",
                "Request body too large".into(),
                None,
            ),
            AppError::TooManyRequests { retry_after_secs } => {
                let body = ErrorBody {
                    success: false,
                    error: "RATE_LIMIT_EXCEEDED",
                    message: "Too many requests, please try again later".into(),
                    details: Some(json!({ "retryAfter": retry_after_secs })),
                };
                let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
                if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                    response.headers_mut().insert(RETRY_AFTER, value);
                }
                return response;
            }
            AppError::ServiceUnavailable(message) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                format!("service unavailable: {message}"),
                None,
            ),
            AppError::Internal(message) => {
                let message = if internal_errors_exposed() {
                    message
                } else {
                    "An unexpected error occurred".into()
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    message,
                    None,
                )
            }
        };

        let payload = Json(ErrorBody {
            success: false,
            error: code,
            message,
            details,
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{game::SessionStatus, status::SessionEvent};

    #[test]
    fn service_errors_map_to_http_statuses() {
        let cases = [
            (ServiceError::Degraded, StatusCode::SERVICE_UNAVAILABLE),
            (ServiceError::session_not_found(), StatusCode::NOT_FOUND),
            (
                ServiceError::forbidden("NOT_ELIGIBLE", "no"),
                StatusCode::FORBIDDEN,
            ),
            (
                ServiceError::conflict("TEAM_EXISTS", "taken"),
                StatusCode::CONFLICT,
            ),
            (
                ServiceError::invalid_input("INVALID_ACCESS_CODE", "bad"),
                StatusCode::BAD_REQUEST,
            ),
            (
                InvalidTransition {
                    from: SessionStatus::Active,
                    event: SessionEvent::MineCompleted,
                }
                .into(),
                StatusCode::CONFLICT,
            ),
            (
                StorageError::Conflict {
                    message: "dup".into(),
                }
                .into(),
                StatusCode::CONFLICT,
            ),
        ];

        for (err, expected) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn storage_failures_become_internal_errors() {
        let err = StorageError::unavailable(
            "boom".into(),
            std::io::Error::other("connection reset"),
        );
        let app: AppError = ServiceError::from(err).into();
        assert!(matches!(app, AppError::Internal(_)));
        assert_eq!(
            app.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn rate_limit_sets_retry_after() {
        let response = AppError::TooManyRequests {
            retry_after_secs: 42,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "42");
    }
}
