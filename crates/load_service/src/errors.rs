//! Service error types and their HTTP mapping

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use loadcast_core::LoadCoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Errors raised while configuring or starting the service
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Core(#[from] LoadCoreError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// JSON error body returned by every failing route
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error returned from HTTP handlers
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<LoadCoreError> for ApiError {
    fn from(err: LoadCoreError) -> Self {
        if err.is_client_error() {
            Self::bad_request(err.to_string())
        } else {
            error!(error = %err, "prediction failed");
            Self::internal(format!("prediction failed: {err}"))
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_bad_request() {
        let err = ApiError::from(LoadCoreError::InvalidRequest("bad date".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.message().contains("bad date"));
    }

    #[test]
    fn inference_errors_map_to_internal() {
        let err = ApiError::from(LoadCoreError::Inference("NaN".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message().starts_with("prediction failed:"));
    }
}
