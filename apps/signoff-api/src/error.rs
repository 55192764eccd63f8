//! Error types for the signoff API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("Invalid owner key")]
    InvalidOwnerKey,

    #[error("Document is finalized")]
    DocumentFinalized,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Flatten failed: {0}")]
    Flatten(#[from] flatten_core::FlattenError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::DocumentNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Document not found: {}", id))
            }
            ApiError::ArtifactNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Artifact not found: {}", id))
            }
            ApiError::InvalidOwnerKey => {
                (StatusCode::UNAUTHORIZED, "Invalid owner key".to_string())
            }
            ApiError::DocumentFinalized => (
                StatusCode::CONFLICT,
                "Document is finalized and can no longer be edited".to_string(),
            ),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Flatten(e) => {
                tracing::error!("Flatten error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to flatten document".to_string(),
                )
            }
            ApiError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
