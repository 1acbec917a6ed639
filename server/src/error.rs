//! Unified error handling for the server.
//!
//! Errors are never swallowed and never retried here; the caller owns the
//! retry policy. Within a single operation there is no partial success to
//! report, because each merge is one atomic statement.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Any underlying storage failure, surfaced unchanged.
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// A rejection produced by the sync engine (batch cap, unknown or
    /// malformed operation). The display text is what the client sees.
    #[error(transparent)]
    Engine(#[from] recall_engine::Error),

    /// The user row was missing or the sequence update touched zero rows.
    /// Fatal for the operation that needed the number.
    #[error("sequence allocation failed for user {user_id}")]
    SequenceAllocation { user_id: String },

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    #[allow(dead_code)]
    Unauthorized,
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Storage(e) => {
                tracing::error!("Storage error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage error".to_string(),
                )
            }
            AppError::Engine(e) => {
                tracing::warn!("Rejected operation: {}", e);
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            AppError::SequenceAllocation { user_id } => {
                tracing::error!(user_id = %user_id, "Sequence allocation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, AppError>;
