//! API error mapping

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use data_validator::ValidationError;
use serde::Serialize;
use snapshot::SnapshotError;
use thiserror::Error;
use tracing::{error, warn};

/// Errors returned by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid device data: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid request body: {0}")]
    Body(String),

    #[error("No records found for device with ID: {0}")]
    DeviceNotFound(String),

    #[error("Backup failed: {0}")]
    Backup(#[source] SnapshotError),

    #[error("Restore failed: {0}")]
    Restore(#[source] SnapshotError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Body(rejection.body_text())
    }
}

/// Error body sent to clients
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(_) | ApiError::Body(_) => {
                warn!("Rejected request: {}", self);
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::DeviceNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Restore(SnapshotError::NotFound(path)) => {
                warn!("Restore requested from missing file {}", path.display());
                (
                    StatusCode::NOT_FOUND,
                    format!("No backup found at {}", path.display()),
                )
            }
            ApiError::Restore(e) => {
                error!("Restore failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred while restoring data".to_string(),
                )
            }
            ApiError::Backup(e) => {
                error!("Backup failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred while saving data".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
