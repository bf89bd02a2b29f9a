//! Error envelope shared by every endpoint.
//!
//! `{code, error, message, details?}` with `code` mirroring the HTTP status.
//! Upstream failures (database, cluster) are logged with detail and surfaced
//! with a stable message only.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use ssv_domain::Error;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, error: &str, message: String) -> Self {
        ApiError {
            status,
            body: ErrorBody {
                code: status.as_u16(),
                error: error.to_owned(),
                message,
                details: None,
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message.into())
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> ApiError {
        match e {
            Error::Validation(m) => ApiError::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", m),
            Error::Precondition(m) => ApiError::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", m),
            Error::Authentication(m) => ApiError::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", m),
            Error::Forbidden(m) => ApiError::new(StatusCode::FORBIDDEN, "FORBIDDEN", m),
            Error::NotFound(what) => {
                ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", format!("{what} not found"))
            }
            Error::Conflict(m) => ApiError::new(StatusCode::CONFLICT, "CONFLICT", m),
            Error::Database(detail) => {
                tracing::error!(detail, "database error");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "internal storage error".into(),
                )
            }
            Error::Kubernetes(detail) => {
                tracing::error!(detail, "kubernetes error");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "cluster request failed".into(),
                )
            }
            Error::Config(detail) => {
                tracing::error!(detail, "config error");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "internal configuration error".into(),
                )
            }
            Error::Shutdown => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "server is shutting down".into(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.body.code, message = %self.body.message, "request failed");
        } else {
            tracing::warn!(code = self.body.code, message = %self.body.message, "request rejected");
        }
        (self.status, Json(self.body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Fallback for unknown routes.
pub async fn not_found_handler() -> ApiError {
    ApiError::not_found("no such endpoint")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_error_kinds() {
        let cases: Vec<(Error, StatusCode)> = vec![
            (Error::validation("x"), StatusCode::BAD_REQUEST),
            (Error::Precondition("x".into()), StatusCode::BAD_REQUEST),
            (Error::Authentication("x".into()), StatusCode::UNAUTHORIZED),
            (Error::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (Error::not_found("x"), StatusCode::NOT_FOUND),
            (Error::conflict("x"), StatusCode::CONFLICT),
            (Error::Database("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Shutdown, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, status) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status, status);
            assert_eq!(api.body.code, status.as_u16());
        }
    }

    #[test]
    fn upstream_detail_is_not_leaked() {
        let api: ApiError = Error::Database("password authentication failed".into()).into();
        assert!(!api.body.message.contains("password"));
        assert!(api.body.details.is_none());
    }
}
