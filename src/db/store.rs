//! Persistence boundary for games and outcome accumulators.

use tracing::{info, instrument};

use crate::db::{
    DbError, Game, GameId, GameOutcome, GameUpdate, LeaderboardEntry, NewGame, Statistics,
    UpdateResult, UserId,
};
use crate::games::tictactoe::Side;

/// Durable store of one game history and one outcome accumulator per user.
///
/// Every game operation is scoped to the owning user: a game that belongs to
/// someone else is reported exactly like a missing one.
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    /// Persists a new game and returns it with its assigned id.
    fn create_game(&self, game: &NewGame) -> Result<Game, DbError>;

    /// The user's most recently created game.
    fn latest_game(&self, user_id: UserId) -> Result<Option<Game>, DbError>;

    /// A specific game, if it exists and belongs to `user_id`.
    fn game(&self, user_id: UserId, game_id: GameId) -> Result<Option<Game>, DbError>;

    /// Applies a conditional update; see [`GameUpdate`].
    ///
    /// Concurrent updates of the same game are serialized: of two updates read
    /// from the same board, only the first is applied and the second reports
    /// [`UpdateResult::Stale`].
    fn update_game(&self, update: &GameUpdate) -> Result<UpdateResult, DbError>;

    /// Creates the user's accumulator with zeroed counters if absent.
    fn ensure_accumulator(&self, user_id: UserId) -> Result<Statistics, DbError>;

    /// Increments exactly one of wins/losses/draws plus the game total.
    fn record_outcome(&self, user_id: UserId, outcome: GameOutcome)
    -> Result<Statistics, DbError>;

    /// Writes a game-ending update and counts its outcome.
    ///
    /// The outcome is counted only if the update was applied. Without a
    /// transaction the board is written first, so a crash in between leaves
    /// the accumulator undercounted, never double counted. Stores with
    /// transactions override this to write both atomically.
    #[instrument(skip(self, update), fields(user_id = update.user_id, game_id = update.game_id))]
    fn finish_game(
        &self,
        update: &GameUpdate,
        outcome: GameOutcome,
    ) -> Result<UpdateResult, DbError> {
        let result = self.update_game(update)?;
        if let UpdateResult::Applied(_) = result {
            self.record_outcome(update.user_id, outcome)?;
            info!(?outcome, "Finished game recorded");
        }
        Ok(result)
    }

    /// The user's games, newest first.
    fn recent_games(&self, user_id: UserId, limit: i64) -> Result<Vec<Game>, DbError>;

    /// Outcomes of the user's most recently finished games, newest first.
    fn recent_outcomes(&self, user_id: UserId, limit: i64) -> Result<Vec<GameOutcome>, DbError>;

    /// Finished-game counts grouped by starter and outcome.
    fn outcomes_by_starter(
        &self,
        user_id: UserId,
    ) -> Result<Vec<(Side, GameOutcome, i64)>, DbError>;

    /// Accumulators with at least one game, best first, ranked from 1.
    ///
    /// Ordered by win percentage, then wins, both descending.
    fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, DbError>;
}
