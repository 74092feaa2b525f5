//! Database models and domain types.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use serde::Serialize;
use tracing::instrument;

use crate::db::{DbError, schema};
use crate::games::tictactoe::{Board, GameStatus, Position, Side, USER_MARK};

/// Identifier of a user, issued by the authentication layer.
pub type UserId = i32;

/// Identifier of a game, assigned by the store at creation.
pub type GameId = i32;

/// User profile database model.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::users)]
pub struct User {
    id: i32,
    display_name: String,
    created_at: NaiveDateTime,
}

/// Insertable user model for creating new users.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::users)]
pub struct NewUser {
    display_name: String,
}

/// Game row as stored, with the board serialized as JSON text.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = schema::games)]
pub struct GameRecord {
    id: i32,
    user_id: i32,
    board: String,
    starter: String,
    status: String,
    result: Option<String>,
    last_move: Option<i32>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl GameRecord {
    /// Decodes the stored row into a typed [`Game`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if any column holds a value the service never writes.
    #[instrument(skip(self), fields(game_id = self.id))]
    pub fn into_game(self) -> Result<Game, DbError> {
        let board: Board = serde_json::from_str(&self.board)
            .map_err(|e| DbError::new(format!("Invalid board in game {}: {}", self.id, e)))?;
        let starter: Side = self.starter.parse().map_err(|_| {
            DbError::new(format!("Invalid starter in game {}: '{}'", self.id, self.starter))
        })?;
        let status = GameStatus::from_db_string(&self.status).ok_or_else(|| {
            DbError::new(format!("Invalid status in game {}: '{}'", self.id, self.status))
        })?;
        let result = self
            .result
            .as_deref()
            .map(GameOutcome::from_db_string)
            .transpose()?;
        let last_move = self
            .last_move
            .and_then(|i| usize::try_from(i).ok())
            .and_then(Position::from_index);

        Ok(Game {
            id: self.id,
            user_id: self.user_id,
            board,
            starter,
            status,
            result,
            last_move,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Insertable game row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::games)]
pub struct NewGameRecord {
    user_id: i32,
    board: String,
    starter: String,
    status: String,
    result: Option<String>,
    last_move: Option<i32>,
}

impl NewGameRecord {
    /// Serializes a [`NewGame`] into its stored form.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the board cannot be serialized.
    #[instrument(skip(game), fields(user_id = game.user_id))]
    pub fn from_new_game(game: &NewGame) -> Result<Self, DbError> {
        Ok(Self {
            user_id: game.user_id,
            board: encode_board(&game.board)?,
            starter: game.starter.to_string(),
            status: game.status.to_db_string().to_string(),
            result: GameOutcome::from_status(game.status).map(|o| o.to_db_string().to_string()),
            last_move: game.last_move.map(|p| p.to_index() as i32),
        })
    }
}

/// Serializes a board for the `games.board` column.
pub(crate) fn encode_board(board: &Board) -> Result<String, DbError> {
    serde_json::to_string(board).map_err(|e| DbError::new(format!("Failed to encode board: {}", e)))
}

/// A persisted game.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct Game {
    id: GameId,
    user_id: UserId,
    board: Board,
    starter: Side,
    status: GameStatus,
    result: Option<GameOutcome>,
    last_move: Option<Position>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

/// A game about to be created.
#[derive(Debug, Clone, PartialEq, new)]
pub struct NewGame {
    /// Owning user.
    pub user_id: UserId,
    /// Initial board.
    pub board: Board,
    /// Which side moved first.
    pub starter: Side,
    /// Status of `board`.
    pub status: GameStatus,
    /// Opening move already on `board`, if any.
    pub last_move: Option<Position>,
}

/// A conditional update of an in-progress game.
///
/// Applies only while the stored board still equals `expected_board` and the
/// game has not finished.
#[derive(Debug, Clone, PartialEq, new)]
pub struct GameUpdate {
    /// Owning user.
    pub user_id: UserId,
    /// Game to update.
    pub game_id: GameId,
    /// Board value the caller read.
    pub expected_board: Board,
    /// Board to store.
    pub board: Board,
    /// Status of `board`.
    pub status: GameStatus,
    /// Most recent move on `board`.
    pub last_move: Option<Position>,
}

/// Outcome of a [`GameUpdate`].
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateResult {
    /// The update was written.
    Applied(Game),
    /// The game changed since it was read; nothing was written.
    Stale,
    /// No such game for this user.
    NotFound,
}

/// Game outcome from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameOutcome {
    /// User won the game.
    Win,
    /// User lost the game.
    Loss,
    /// Game ended in a draw.
    Draw,
}

impl GameOutcome {
    /// Maps a finished game status to the user's outcome.
    ///
    /// This is the single definition of win/loss/draw; it is applied once,
    /// when a terminal status is persisted.
    pub fn from_status(status: GameStatus) -> Option<Self> {
        match status {
            GameStatus::InProgress => None,
            GameStatus::Won(mark) if mark == USER_MARK => Some(Self::Win),
            GameStatus::Won(_) => Some(Self::Loss),
            GameStatus::Draw => Some(Self::Draw),
        }
    }

    /// Converts outcome to the string stored in the database.
    #[instrument]
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Loss => "loss",
            Self::Draw => "draw",
        }
    }

    /// Parses outcome from the string stored in the database.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the string is not a valid outcome value.
    #[instrument(skip(s), fields(s = %s))]
    pub fn from_db_string(s: &str) -> Result<Self, DbError> {
        match s {
            "win" => Ok(Self::Win),
            "loss" => Ok(Self::Loss),
            "draw" => Ok(Self::Draw),
            _ => Err(DbError::new(format!("Invalid outcome: '{}'", s))),
        }
    }
}

/// Per-user outcome accumulator row.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::statistics)]
pub struct Statistics {
    id: i32,
    user_id: i32,
    wins: i32,
    losses: i32,
    draws: i32,
    total_games: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

/// Insertable accumulator row; counters start at their column defaults.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::statistics)]
pub struct NewStatistics {
    user_id: i32,
}

/// Aggregated statistics for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedStats {
    wins: i32,
    losses: i32,
    draws: i32,
    total_games: i32,
    win_percentage: f64,
}

impl AggregatedStats {
    /// Creates new aggregated statistics.
    #[instrument]
    pub fn new(total_games: i32, wins: i32, losses: i32, draws: i32) -> Self {
        Self {
            wins,
            losses,
            draws,
            total_games,
            win_percentage: win_percentage(wins, total_games),
        }
    }
}

impl From<&Statistics> for AggregatedStats {
    fn from(stats: &Statistics) -> Self {
        Self::new(stats.total_games, stats.wins, stats.losses, stats.draws)
    }
}

/// Win rate as a percentage (0.0–100.0) rounded to two decimals.
pub fn win_percentage(wins: i32, total_games: i32) -> f64 {
    if total_games <= 0 {
        0.0
    } else {
        (wins as f64 * 100.0 / total_games as f64 * 100.0).round() / 100.0
    }
}

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    rank: usize,
    user_id: UserId,
    name: String,
    wins: i32,
    losses: i32,
    draws: i32,
    total_games: i32,
    win_percentage: f64,
}

impl LeaderboardEntry {
    /// Builds an unranked entry from an accumulator row and a display name.
    pub fn from_statistics(stats: &Statistics, name: String) -> Self {
        Self {
            rank: 0,
            user_id: stats.user_id,
            name,
            wins: stats.wins,
            losses: stats.losses,
            draws: stats.draws,
            total_games: stats.total_games,
            win_percentage: win_percentage(stats.wins, stats.total_games),
        }
    }

    /// Sets the 1-based rank.
    pub fn ranked(mut self, rank: usize) -> Self {
        self.rank = rank;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::tictactoe::Mark;

    #[test]
    fn test_outcome_from_status_uses_fixed_identity() {
        assert_eq!(
            GameOutcome::from_status(GameStatus::Won(Mark::X)),
            Some(GameOutcome::Win)
        );
        assert_eq!(
            GameOutcome::from_status(GameStatus::Won(Mark::O)),
            Some(GameOutcome::Loss)
        );
        assert_eq!(GameOutcome::from_status(GameStatus::Draw), Some(GameOutcome::Draw));
        assert_eq!(GameOutcome::from_status(GameStatus::InProgress), None);
    }

    #[test]
    fn test_win_percentage_rounds_to_two_decimals() {
        assert_eq!(win_percentage(1, 3), 33.33);
        assert_eq!(win_percentage(2, 3), 66.67);
        assert_eq!(win_percentage(0, 0), 0.0);
        assert_eq!(win_percentage(5, 5), 100.0);
    }
}
