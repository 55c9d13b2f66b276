use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::error::TrackerError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Note not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(&'static str),
}

pub const FETCH_FAILED: &str = "Error fetching notes";
pub const SAVE_FAILED: &str = "Error saving notes";

impl From<TrackerError> for ApiError {
    fn from(e: TrackerError) -> Self {
        match e {
            TrackerError::NoteNotFound(id) => ApiError::NotFound(id),
            TrackerError::InvalidShot(msg) | TrackerError::InvalidCategory(msg) => {
                ApiError::MalformedPayload(msg)
            }
            e @ (TrackerError::RemoteRead(_) | TrackerError::LocalParse(_)) => {
                tracing::error!("Error: {}", e);
                ApiError::Internal(FETCH_FAILED)
            }
            other => {
                tracing::error!("Error: {}", other);
                ApiError::Internal(SAVE_FAILED)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::MalformedPayload { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}
