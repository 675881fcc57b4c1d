#![allow(dead_code)]

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Duplicate transfer: {0}")]
    DuplicateTransfer(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Matching service error: {0}")]
    Service(LlmError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Empty replies are a content problem, not a provider outage, so they map
/// to a validation failure like any other malformed matcher output.
impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::EmptyContent => {
                AppError::Validation("Matcher returned no content".to_string())
            }
            other => AppError::Service(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Invalid credentials".to_string(),
            ),
            AppError::DuplicateTransfer(key) => (
                StatusCode::CONFLICT,
                "DUPLICATE_TRANSFER",
                format!("This course has already been transferred ({key})"),
            ),
            AppError::Store(StoreError::NotFound(what)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", format!("Not found: {what}"))
            }
            AppError::Store(e) => {
                tracing::error!("Store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "A data store error occurred".to_string(),
                )
            }
            AppError::Service(e) => {
                tracing::error!("Matching service error: {e}");
                let message = match e {
                    LlmError::Api { status, .. } => {
                        format!("The matching service returned status {status}")
                    }
                    LlmError::Http(_) => "The matching service could not be reached".to_string(),
                    _ => "The matching service returned an invalid response".to_string(),
                };
                (StatusCode::BAD_GATEWAY, "SERVICE_ERROR", message)
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
