use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::export::ExportError;
use crate::llm_client::LlmError;
use crate::store::StoreError;
use crate::upload::ExtractError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {message}")]
    UnprocessableEntity {
        message: String,
        details: Option<Value>,
    },

    /// Request body that is not valid JSON for the endpoint.
    #[error("Malformed request body: {message}")]
    MalformedBody {
        message: String,
        position: usize,
        context: String,
    },

    #[error("Method not allowed; use {allowed}")]
    MethodNotAllowed { allowed: &'static str },

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Upload error: {0}")]
    Upload(#[from] ExtractError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg, None)
            }
            AppError::UnprocessableEntity { message, details } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                message,
                details,
            ),
            AppError::MalformedBody {
                message,
                position,
                context,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "MALFORMED_BODY",
                message,
                Some(json!({
                    "error_position": position,
                    "context_around_error": context,
                    "help": "Check the JSON near the marked position: strings need double quotes, \
                             and there must be no trailing commas or unescaped control characters.",
                })),
            ),
            AppError::MethodNotAllowed { allowed } => (
                StatusCode::METHOD_NOT_ALLOWED,
                "METHOD_NOT_ALLOWED",
                format!("This endpoint only accepts {allowed} requests"),
                Some(json!({ "allowed_method": allowed })),
            ),
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    format!("AI processing failed: {e}"),
                    None,
                )
            }
            AppError::Store(StoreError::NotFound(id)) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Resume {id} not found"),
                None,
            ),
            AppError::Store(StoreError::Integrity(msg)) => {
                tracing::warn!("Store integrity violation: {msg}");
                (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    "Resume not found".to_string(),
                    None,
                )
            }
            AppError::Store(e) => {
                tracing::error!("Store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    None,
                )
            }
            AppError::Export(e) => {
                tracing::error!("Export error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EXPORT_ERROR",
                    "PDF generation failed".to_string(),
                    None,
                )
            }
            AppError::Upload(e) => {
                tracing::warn!("Upload error: {e}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "UNREADABLE_PDF",
                    e.to_string(),
                    None,
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message,
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
