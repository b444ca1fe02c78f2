use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use tally_types::BoardError;
use tally_types::api::ErrorResponse;

/// Failure of a board service operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Board(#[from] BoardError),

    #[error("board {0} not found")]
    BoardNotFound(Uuid),

    /// The caller is not the board's streamer.
    #[error("only the board's streamer may do this")]
    Forbidden,

    #[error("storage error: {0:#}")]
    Persistence(#[from] anyhow::Error),

    #[error("storage did not respond in time")]
    Timeout,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Board(BoardError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::Board(BoardError::MessageNotFound(_)) | Self::BoardNotFound(_) => StatusCode::NOT_FOUND,
            Self::Board(BoardError::CapacityExceeded { .. })
            | Self::Board(BoardError::DuplicateMessage(_)) => StatusCode::CONFLICT,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Timeout => StatusCode::SERVICE_UNAVAILABLE,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Details stay in the log.
            error!("{}", self);
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
