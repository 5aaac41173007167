use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extract::ExtractionError;
use crate::llm_client::CompletionError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Extraction(#[from] ExtractionError),

    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Completion(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Extraction(ExtractionError::UnsupportedFormat(_)) => "UNSUPPORTED_FORMAT",
            AppError::Extraction(_) => "EXTRACTION_ERROR",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::Completion(_) => "COMPLETION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Text safe to show the reviewer. Completion failures are shown verbatim
    /// so the user can act on them (bad key, quota, outage).
    pub fn user_message(&self) -> String {
        match self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
            AppError::Completion(e) => {
                tracing::error!("Completion error ({}): {e}", e.kind());
                self.to_string()
            }
            AppError::NotFound(msg) | AppError::Validation(msg) | AppError::PayloadTooLarge(msg) => {
                msg.clone()
            }
            AppError::Extraction(e) => e.to_string(),
        }
    }
}

impl From<minijinja::Error> for AppError {
    fn from(err: minijinja::Error) -> Self {
        AppError::Internal(anyhow::Error::new(err).context("page template failed to render"))
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(err.body_text())
        } else {
            AppError::Validation(format!("invalid multipart upload: {}", err.body_text()))
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut error = json!({
            "code": self.code(),
            "message": self.user_message(),
        });
        if let AppError::Completion(e) = &self {
            error["kind"] = json!(e.kind());
        }

        (self.status(), Json(json!({ "error": error }))).into_response()
    }
}
