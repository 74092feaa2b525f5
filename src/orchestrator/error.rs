//! Caller-facing error taxonomy for game operations.

use derive_more::{Display, Error};
use tracing::instrument;

use crate::db::DbError;
use crate::engine::{EngineError, EngineErrorKind};

/// Category of a failed game operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum GameErrorKind {
    /// Bad starter, row or column.
    #[display("invalid parameter")]
    InvalidParameter,
    /// No current or matching game for the user.
    #[display("game not found")]
    GameNotFound,
    /// The game has already finished.
    #[display("game already over")]
    GameAlreadyOver,
    /// The engine is to move.
    #[display("not your turn")]
    NotYourTurn,
    /// The target cell already holds a mark.
    #[display("cell occupied")]
    CellOccupied,
    /// Engine unreachable or timed out.
    #[display("engine unavailable")]
    EngineUnavailable,
    /// Engine reachable but answered with an error or an unusable result.
    #[display("engine error")]
    EngineError,
    /// Persistence failure.
    #[display("store error")]
    StoreError,
    /// Another request changed the game first.
    #[display("game state conflict")]
    GameStateConflict,
}

impl GameErrorKind {
    /// Stable machine-readable code.
    pub fn code(self) -> &'static str {
        match self {
            Self::InvalidParameter => "INVALID_PARAMETER",
            Self::GameNotFound => "GAME_NOT_FOUND",
            Self::GameAlreadyOver => "GAME_ALREADY_OVER",
            Self::NotYourTurn => "NOT_YOUR_TURN",
            Self::CellOccupied => "CELL_OCCUPIED",
            Self::EngineUnavailable => "ENGINE_UNAVAILABLE",
            Self::EngineError => "ENGINE_ERROR",
            Self::StoreError => "STORE_ERROR",
            Self::GameStateConflict => "GAME_STATE_CONFLICT",
        }
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::EngineUnavailable | Self::EngineError | Self::StoreError)
    }
}

/// Game operation error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Game error ({}): {} at {}:{}", kind, message, file, line)]
pub struct GameError {
    /// Failure category.
    pub kind: GameErrorKind,
    /// Human-readable message, safe to show to callers.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl GameError {
    /// Creates a new game error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(kind: GameErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Stable machine-readable code of this error.
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl From<DbError> for GameError {
    #[track_caller]
    fn from(err: DbError) -> Self {
        tracing::error!(error = %err, "Store failure");
        Self::new(GameErrorKind::StoreError, "The game store is unavailable")
    }
}

impl From<EngineError> for GameError {
    #[track_caller]
    fn from(err: EngineError) -> Self {
        tracing::error!(error = %err, "Engine failure");
        match err.kind {
            EngineErrorKind::Unavailable => Self::new(
                GameErrorKind::EngineUnavailable,
                "The move engine is unavailable, try again",
            ),
            EngineErrorKind::Rejected | EngineErrorKind::Malformed => Self::new(
                GameErrorKind::EngineError,
                "The move engine returned an invalid result, try again",
            ),
        }
    }
}
