use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::engine::EngineError;
use chess_core::RulesError;

/// Service error taxonomy. Input errors (bad syntax, illegal moves, bad FEN)
/// and state errors (unknown/finished games) are surfaced to the caller as-is
/// and never retried; engine and database failures map to 5xx.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid move format: {0}")]
    InvalidMoveSyntax(String),

    #[error("Illegal move: {0}")]
    IllegalMove(String),

    #[error("Invalid FEN")]
    InvalidPosition,

    #[error("Game {0} is already over")]
    GameOver(i64),

    #[error("No active game with id {0}")]
    SessionNotFound(i64),

    #[error("Game {0} not found")]
    GameNotFound(i64),

    #[error("Engine not available")]
    EngineUnavailable,

    #[error("Engine did not respond in time")]
    EngineTimeout,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<RulesError> for AppError {
    fn from(e: RulesError) -> Self {
        match e {
            RulesError::InvalidMoveSyntax(s) => AppError::InvalidMoveSyntax(s),
            RulesError::IllegalMove(s) => AppError::IllegalMove(s),
            RulesError::InvalidPosition(_) => AppError::InvalidPosition,
        }
    }
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Timeout => AppError::EngineTimeout,
            EngineError::Unavailable(_) | EngineError::Io(_) => AppError::EngineUnavailable,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InvalidMoveSyntax(_)
            | AppError::IllegalMove(_)
            | AppError::InvalidPosition => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::GameOver(_) => (StatusCode::CONFLICT, self.to_string()),
            AppError::SessionNotFound(_) | AppError::GameNotFound(_) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            AppError::EngineUnavailable => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            AppError::EngineTimeout => (StatusCode::GATEWAY_TIMEOUT, self.to_string()),
            AppError::Sqlx(e) => {
                tracing::error!("Database error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::Anyhow(e) => {
                tracing::error!("Unexpected error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        // Same error shape as the legacy Flask service: {"error": message}
        (status, Json(json!({ "error": message }))).into_response()
    }
}
