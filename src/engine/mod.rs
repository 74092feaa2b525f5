//! Decision engine collaborator: the external service that picks and applies
//! the opponent's moves and reports game-over state.

mod client;
mod error;
mod wire;

pub use client::HttpEngineClient;
pub use error::{EngineError, EngineErrorKind};

use async_trait::async_trait;

use crate::games::tictactoe::{InternalBoard, InternalMark, Position};

/// Result of asking the engine to move or to evaluate a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineReply {
    /// Board after the call, in engine representation.
    pub board: InternalBoard,
    /// Whether the game is finished on `board`.
    pub game_over: bool,
    /// Winning mark on `board`, if any.
    pub winner: Option<InternalMark>,
    /// Whether `board` is a draw.
    pub is_draw: bool,
    /// Cell the engine played, when it moved.
    pub position: Option<Position>,
}

/// Synchronous request/response access to a move-decision engine.
///
/// Every call is bounded in time by the implementation; a timeout surfaces as
/// [`EngineErrorKind::Unavailable`].
#[async_trait]
pub trait DecisionEngine: Send + Sync + std::fmt::Debug {
    /// Probes engine liveness and returns whatever metadata it reports.
    async fn health_check(&self) -> Result<serde_json::Value, EngineError>;

    /// Returns the initial board for a new game.
    async fn reset_game(&self) -> Result<InternalBoard, EngineError>;

    /// Lets the engine choose a move for `player` and apply it to `board`.
    async fn propose_move(
        &self,
        board: &InternalBoard,
        player: InternalMark,
    ) -> Result<EngineReply, EngineError>;

    /// Reports whether `board` is finished without changing it.
    async fn evaluate_state(
        &self,
        board: &InternalBoard,
        player: InternalMark,
    ) -> Result<EngineReply, EngineError>;
}
