use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cluster_secrets::SecretsError;
use serde_json::json;
use thiserror::Error;

use crate::storage::StorageError;

/// Failures surfaced by the upload handlers.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid upload form: {reason}")]
    BadForm { reason: String },

    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Secrets(#[from] SecretsError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("{feature} is not configured")]
    NotConfigured { feature: &'static str },

    #[error("failed to stage upload: {0}")]
    Staging(#[from] std::io::Error),
}

impl GatewayError {
    pub fn bad_form(reason: impl Into<String>) -> Self {
        Self::BadForm {
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadForm { .. } => StatusCode::BAD_REQUEST,
            Self::Multipart(err) => err.status(),
            Self::Secrets(SecretsError::Backend { .. }) => StatusCode::BAD_GATEWAY,
            Self::Secrets(_) => StatusCode::BAD_REQUEST,
            Self::Storage(StorageError::InvalidReference { .. }) => StatusCode::BAD_REQUEST,
            Self::Storage(StorageError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Storage(StorageError::Upload { .. }) => StatusCode::BAD_GATEWAY,
            Self::NotConfigured { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Staging(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "upload failed");
        } else {
            tracing::warn!(status = %status, error = %self, "upload rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
