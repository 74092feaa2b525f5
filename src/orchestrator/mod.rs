//! Authoritative game-session and turn arbitration.
//!
//! The orchestrator owns the start-game, submit-move and fetch-state
//! operations. Turn order is always recomputed from the stored board, the
//! decision engine is consulted before anything is written, and a finished
//! game's outcome is counted exactly once.

mod error;

pub use error::{GameError, GameErrorKind};

use std::sync::Arc;

use derive_getters::Getters;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::db::{Game, GameId, GameOutcome, GameUpdate, NewGame, SessionStore, UpdateResult, UserId};
use crate::engine::{DecisionEngine, EngineReply};
use crate::games::tictactoe::{
    Board, ENGINE_MARK, GameStatus, Mark, Position, Side, Square, USER_MARK, mark_to_engine,
    mark_to_external, next_turn, to_engine, to_external,
};

/// Game state as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    game_id: GameId,
    board: Board,
    /// Side to move; `None` once the game is over.
    turn: Option<Side>,
    game_over: bool,
    winner: Option<Mark>,
    is_draw: bool,
    /// Cell the engine played in this response, if it moved.
    next_move_position: Option<Position>,
    starter: Side,
}

impl GameView {
    fn build(game: &Game, turn: Option<Side>, next_move_position: Option<Position>) -> Self {
        let status = *game.status();
        Self {
            game_id: *game.id(),
            board: *game.board(),
            turn,
            game_over: status.is_over(),
            winner: status.winner(),
            is_draw: status.is_draw(),
            next_move_position,
            starter: *game.starter(),
        }
    }

    fn current(game: &Game, next_move_position: Option<Position>) -> Self {
        let turn = if game.status().is_over() {
            None
        } else {
            Some(next_turn(game.board(), *game.starter()))
        };
        Self::build(game, turn, next_move_position)
    }
}

/// Sequences turn resolution, the decision engine and the session store.
///
/// Holds no game state of its own; every request reads the stored game.
#[derive(Debug, Clone)]
pub struct GameOrchestrator {
    engine: Arc<dyn DecisionEngine>,
    store: Arc<dyn SessionStore>,
}

impl GameOrchestrator {
    /// Creates an orchestrator over the given engine and store.
    #[instrument(skip(engine, store))]
    pub fn new(engine: Arc<dyn DecisionEngine>, store: Arc<dyn SessionStore>) -> Self {
        info!("Creating GameOrchestrator");
        Self { engine, store }
    }

    /// Starts a new game for `user_id`.
    ///
    /// `starter` is `"user"` or `"computer"`. When the engine starts, its
    /// opening move is already on the returned board. Either way the user is
    /// to move next.
    ///
    /// # Errors
    ///
    /// [`GameErrorKind::InvalidParameter`] for an unknown starter, engine
    /// kinds if the engine fails (nothing is stored), and
    /// [`GameErrorKind::StoreError`] if persistence fails.
    #[instrument(skip(self))]
    pub async fn start_game(&self, user_id: UserId, starter: &str) -> Result<GameView, GameError> {
        let starter: Side = starter.parse().map_err(|_| {
            warn!(starter, "Rejected unknown starter");
            GameError::new(
                GameErrorKind::InvalidParameter,
                format!("startedBy must be 'user' or 'computer', got '{}'", starter),
            )
        })?;

        let initial = to_external(&self.engine.reset_game().await?);
        if Position::ALL.iter().any(|pos| !initial.is_empty(*pos)) {
            return Err(GameError::new(
                GameErrorKind::EngineError,
                "The move engine returned an invalid result, try again",
            ));
        }

        let (board, status, last_move) = match starter {
            Side::User => (initial, GameStatus::InProgress, None),
            Side::Engine => {
                let reply = self
                    .engine
                    .propose_move(&to_engine(&initial), mark_to_engine(ENGINE_MARK))
                    .await?;
                let (board, position) = engine_move(&initial, &reply)?;
                (board, reply_status(&reply)?, Some(position))
            }
        };

        self.store.ensure_accumulator(user_id)?;
        let game = self
            .store
            .create_game(&NewGame::new(user_id, board, starter, status, last_move))?;
        if let Some(outcome) = GameOutcome::from_status(status) {
            self.store.record_outcome(user_id, outcome)?;
        }

        info!(game_id = game.id(), %starter, board = %board.display(), "Game started");
        Ok(GameView::build(&game, Some(Side::User), last_move))
    }

    /// Plays the user's mark at (`row`, `col`) in their latest game, then
    /// lets the engine reply unless the user's move ended the game.
    ///
    /// Nothing is written unless every check passes and the engine answered.
    ///
    /// # Errors
    ///
    /// [`GameErrorKind::InvalidParameter`] if `row` or `col` is outside
    /// `0..=2`, [`GameErrorKind::GameNotFound`],
    /// [`GameErrorKind::GameAlreadyOver`], [`GameErrorKind::NotYourTurn`],
    /// [`GameErrorKind::CellOccupied`], engine kinds,
    /// [`GameErrorKind::StoreError`], and
    /// [`GameErrorKind::GameStateConflict`] if a concurrent request changed
    /// the game first.
    #[instrument(skip(self))]
    pub async fn submit_move(
        &self,
        user_id: UserId,
        row: i64,
        col: i64,
    ) -> Result<GameView, GameError> {
        let position = Position::from_row_col(row, col).ok_or_else(|| {
            warn!(row, col, "Rejected out-of-range move");
            GameError::new(
                GameErrorKind::InvalidParameter,
                format!("row and col must be between 0 and 2, got ({}, {})", row, col),
            )
        })?;

        let game = self.store.latest_game(user_id)?.ok_or_else(|| {
            GameError::new(
                GameErrorKind::GameNotFound,
                "No game found, start a new game first",
            )
        })?;
        let game_id = *game.id();
        let board = *game.board();

        if game.status().is_over() {
            warn!(game_id, "Move submitted to finished game");
            return Err(GameError::new(
                GameErrorKind::GameAlreadyOver,
                "This game is already over, start a new game",
            ));
        }
        if next_turn(&board, *game.starter()) != Side::User {
            warn!(game_id, "Move submitted out of turn");
            return Err(GameError::new(
                GameErrorKind::NotYourTurn,
                "It is not your turn",
            ));
        }
        if !board.is_empty(position) {
            warn!(game_id, %position, "Move submitted to occupied cell");
            return Err(GameError::new(
                GameErrorKind::CellOccupied,
                format!("Cell ({}, {}) is already taken", row, col),
            ));
        }

        let after_user = board.with_mark(position, USER_MARK);
        debug!(game_id, board = %after_user.display(), "User move applied");

        let evaluation = self
            .engine
            .evaluate_state(&to_engine(&after_user), mark_to_engine(USER_MARK))
            .await?;
        let status = reply_status(&evaluation)?;
        if status.is_over() {
            let update = GameUpdate::new(user_id, game_id, board, after_user, status, Some(position));
            let saved = self.persist(&update)?;
            info!(game_id, status = status.to_db_string(), "Game ended on user move");
            return Ok(GameView::current(&saved, None));
        }

        let reply = self
            .engine
            .propose_move(&to_engine(&after_user), mark_to_engine(ENGINE_MARK))
            .await?;
        let (after_engine, engine_position) = engine_move(&after_user, &reply)?;
        let status = reply_status(&reply)?;

        let update = GameUpdate::new(
            user_id,
            game_id,
            board,
            after_engine,
            status,
            Some(engine_position),
        );
        let saved = self.persist(&update)?;

        info!(
            game_id,
            user_move = %position,
            engine_move = %engine_position,
            status = status.to_db_string(),
            "Turn completed"
        );
        Ok(GameView::current(&saved, Some(engine_position)))
    }

    /// Returns a game owned by `user_id`.
    ///
    /// # Errors
    ///
    /// [`GameErrorKind::GameNotFound`] if the game does not exist or belongs
    /// to another user, [`GameErrorKind::StoreError`] if the lookup fails.
    #[instrument(skip(self))]
    pub fn get_state(&self, user_id: UserId, game_id: GameId) -> Result<GameView, GameError> {
        let game = self.store.game(user_id, game_id)?.ok_or_else(|| {
            GameError::new(GameErrorKind::GameNotFound, "Game not found")
        })?;
        debug!(status = game.status().to_db_string(), "Game state loaded");
        Ok(GameView::current(&game, *game.last_move()))
    }

    /// Probes the decision engine.
    ///
    /// # Errors
    ///
    /// Engine kinds if the engine cannot be reached.
    #[instrument(skip(self))]
    pub async fn engine_health(&self) -> Result<serde_json::Value, GameError> {
        Ok(self.engine.health_check().await?)
    }

    /// Writes a conditional update, counting the outcome if it ends the game.
    fn persist(&self, update: &GameUpdate) -> Result<Game, GameError> {
        let result = match GameOutcome::from_status(update.status) {
            Some(outcome) => self.store.finish_game(update, outcome)?,
            None => self.store.update_game(update)?,
        };
        match result {
            UpdateResult::Applied(game) => Ok(game),
            UpdateResult::Stale => {
                warn!(game_id = update.game_id, "Concurrent update detected");
                Err(GameError::new(
                    GameErrorKind::GameStateConflict,
                    "The game changed while your move was processed, reload and try again",
                ))
            }
            UpdateResult::NotFound => Err(GameError::new(
                GameErrorKind::GameNotFound,
                "Game not found",
            )),
        }
    }
}

/// Decodes the engine's game-over flags.
fn reply_status(reply: &EngineReply) -> Result<GameStatus, GameError> {
    GameStatus::from_flags(
        reply.game_over,
        reply.winner.map(mark_to_external),
        reply.is_draw,
    )
    .ok_or_else(|| {
        warn!(?reply, "Engine reported contradictory game-over flags");
        GameError::new(
            GameErrorKind::EngineError,
            "The move engine returned an invalid result, try again",
        )
    })
}

/// Checks that the engine added exactly one engine mark to an empty cell and
/// changed nothing else. Returns the new board and the cell played.
fn engine_move(before: &Board, reply: &EngineReply) -> Result<(Board, Position), GameError> {
    let after = to_external(&reply.board);
    let changed: Vec<Position> = Position::ALL
        .iter()
        .copied()
        .filter(|pos| before.get(*pos) != after.get(*pos))
        .collect();

    let position = match changed.as_slice() {
        [pos] if before.is_empty(*pos) && after.get(*pos) == Square::Occupied(ENGINE_MARK) => *pos,
        _ => {
            warn!(
                before = %before.display(),
                after = %after.display(),
                "Engine reply is not a single engine move"
            );
            return Err(GameError::new(
                GameErrorKind::EngineError,
                "The move engine returned an invalid result, try again",
            ));
        }
    };

    if reply.position.is_some_and(|reported| reported != position) {
        warn!(?reply.position, %position, "Engine reported a different cell than it played");
    }
    Ok((after, position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::tictactoe::InternalMark;

    fn reply(board: Board, position: Option<Position>) -> EngineReply {
        EngineReply {
            board: to_engine(&board),
            game_over: false,
            winner: None,
            is_draw: false,
            position,
        }
    }

    #[test]
    fn test_engine_move_accepts_single_engine_mark() {
        let before = Board::new().with_mark(Position::Center, Mark::X);
        let after = before.with_mark(Position::TopLeft, Mark::O);
        let (board, position) = engine_move(&before, &reply(after, None)).unwrap();
        assert_eq!(board, after);
        assert_eq!(position, Position::TopLeft);
    }

    #[test]
    fn test_engine_move_prefers_board_diff_over_reported_position() {
        let before = Board::new();
        let after = before.with_mark(Position::BottomRight, Mark::O);
        let (_, position) =
            engine_move(&before, &reply(after, Some(Position::TopLeft))).unwrap();
        assert_eq!(position, Position::BottomRight);
    }

    #[test]
    fn test_engine_move_rejects_wrong_mark() {
        let before = Board::new();
        let after = before.with_mark(Position::Center, Mark::X);
        let err = engine_move(&before, &reply(after, None)).unwrap_err();
        assert_eq!(err.kind, GameErrorKind::EngineError);
    }

    #[test]
    fn test_engine_move_rejects_unchanged_board() {
        let before = Board::new().with_mark(Position::Center, Mark::X);
        let err = engine_move(&before, &reply(before, None)).unwrap_err();
        assert_eq!(err.kind, GameErrorKind::EngineError);
    }

    #[test]
    fn test_engine_move_rejects_overwrite() {
        let before = Board::new().with_mark(Position::Center, Mark::X);
        let after = Board::new().with_mark(Position::Center, Mark::O);
        assert!(engine_move(&before, &reply(after, None)).is_err());
    }

    #[test]
    fn test_engine_move_rejects_two_marks() {
        let before = Board::new();
        let after = before
            .with_mark(Position::Center, Mark::O)
            .with_mark(Position::TopLeft, Mark::O);
        assert!(engine_move(&before, &reply(after, None)).is_err());
    }

    #[test]
    fn test_reply_status_flags() {
        let mut r = reply(Board::new(), None);
        assert_eq!(reply_status(&r).unwrap(), GameStatus::InProgress);

        r.game_over = true;
        r.winner = Some(InternalMark::O);
        assert_eq!(reply_status(&r).unwrap(), GameStatus::Won(Mark::O));

        r.is_draw = true;
        assert_eq!(
            reply_status(&r).unwrap_err().kind,
            GameErrorKind::EngineError
        );
    }
}
