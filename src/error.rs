//! Error handling and custom error types
//!
//! Provides unified error handling across the service using thiserror, and
//! maps each error onto an HTTP response at the axum boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(reqwest::Error),

    #[error("Upstream request timed out: {0}")]
    UpstreamTimeout(reqwest::Error),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Invalid form: {0}")]
    InvalidForm(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invariant violation: {0}")]
    Invariant(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::UpstreamTimeout(err)
        } else {
            Error::Http(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl Error {
    /// Status code and client-facing message for this error.
    ///
    /// Upstream and internal failures get a generic message; the cause is
    /// only logged.
    fn status_and_detail(&self) -> (StatusCode, String) {
        match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Error::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            Error::InvalidForm(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            Error::AiProvider(_) | Error::Http(_) => (
                StatusCode::BAD_GATEWAY,
                "Upstream completion API error".to_string(),
            ),
            Error::UpstreamTimeout(_) => (
                StatusCode::GATEWAY_TIMEOUT,
                "Upstream completion API timed out".to_string(),
            ),
            Error::Io(_)
            | Error::Serialization(_)
            | Error::Config(_)
            | Error::Invariant(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, detail) = self.status_and_detail();

        if status.is_server_error() {
            tracing::error!("Request failed ({}): {}", status, self);
        } else {
            tracing::warn!("Rejected request ({}): {}", status, self);
        }

        (status, Json(ErrorBody { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_keep_their_message() {
        let (status, detail) = Error::BadRequest("Invalid image file".to_string()).status_and_detail();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(detail, "Invalid image file");

        let (status, _) = Error::InvalidForm("missing field `query`".to_string()).status_and_detail();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_provider_errors_are_not_echoed() {
        let err = Error::AiProvider("OpenAI API error (status 401): invalid key sk-123".to_string());
        let (status, detail) = err.status_and_detail();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!detail.contains("sk-123"));
    }

    #[test]
    fn test_internal_errors_map_to_500() {
        let (status, _) = Error::Config("AI_API_KEY not set".to_string()).status_and_detail();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
