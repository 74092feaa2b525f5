//! Mapping of service errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{debug, error};

use crate::orchestrator::{GameError, GameErrorKind};

/// Error body: a stable code plus a message safe to show users.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Stable machine-readable code.
    pub error: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Whether repeating the same request may succeed.
    pub retryable: bool,
}

/// Error returned by API handlers.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    retryable: bool,
}

impl ApiError {
    /// Creates an API error.
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            retryable: false,
        }
    }

    /// Marks the error as transient.
    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Caller identity missing or invalid.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    /// Request body or query could not be read.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            GameErrorKind::InvalidParameter.code(),
            message,
        )
    }

    /// HTTP status of this error.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Stable code of this error.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Whether the caller may retry unchanged.
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}

/// HTTP status for each error kind.
pub fn status_for(kind: GameErrorKind) -> StatusCode {
    match kind {
        GameErrorKind::InvalidParameter => StatusCode::BAD_REQUEST,
        GameErrorKind::GameNotFound => StatusCode::NOT_FOUND,
        GameErrorKind::GameAlreadyOver
        | GameErrorKind::NotYourTurn
        | GameErrorKind::CellOccupied
        | GameErrorKind::GameStateConflict => StatusCode::CONFLICT,
        GameErrorKind::EngineUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        GameErrorKind::EngineError => StatusCode::BAD_GATEWAY,
        GameErrorKind::StoreError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        Self::new(status_for(err.kind), err.code(), err.message).retryable(err.kind.is_retryable())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, code = self.code, "Request failed");
        } else {
            debug!(status = %self.status, code = self.code, "Request rejected");
        }
        let body = ErrorBody {
            error: self.code,
            message: self.message,
            retryable: self.retryable,
        };
        (self.status, Json(body)).into_response()
    }
}
