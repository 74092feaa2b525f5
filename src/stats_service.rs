//! Statistics business logic layer.

use std::sync::Arc;

use chrono::NaiveDateTime;
use derive_getters::Getters;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::db::{AggregatedStats, Game, GameId, GameOutcome, LeaderboardEntry, SessionStore, UserId};
use crate::games::tictactoe::{Board, Mark, Side};
use crate::orchestrator::GameError;

/// Default number of rows for list endpoints.
pub const DEFAULT_LIMIT: i64 = 10;

/// Largest number of rows a list endpoint returns.
pub const MAX_LIMIT: i64 = 100;

/// Number of finished games behind [`RecentPerformance`].
pub const RECENT_WINDOW: i64 = 10;

/// A game in a user's history.
#[derive(Debug, Clone, PartialEq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct RecentGame {
    id: GameId,
    board: Board,
    winner: Option<Mark>,
    is_draw: bool,
    starter: Side,
    created_at: NaiveDateTime,
    /// User's outcome; `None` while the game is in progress.
    result: Option<GameOutcome>,
}

impl From<&Game> for RecentGame {
    fn from(game: &Game) -> Self {
        Self {
            id: *game.id(),
            board: *game.board(),
            winner: game.status().winner(),
            is_draw: game.status().is_draw(),
            starter: *game.starter(),
            created_at: *game.created_at(),
            result: *game.result(),
        }
    }
}

/// Outcome counts for games with one starter.
#[derive(Debug, Clone, PartialEq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct StarterBreakdown {
    starter: Side,
    total_games: i64,
    wins: i64,
    losses: i64,
    draws: i64,
}

impl StarterBreakdown {
    fn empty(starter: Side) -> Self {
        Self {
            starter,
            total_games: 0,
            wins: 0,
            losses: 0,
            draws: 0,
        }
    }

    fn add(&mut self, outcome: GameOutcome, count: i64) {
        match outcome {
            GameOutcome::Win => self.wins += count,
            GameOutcome::Loss => self.losses += count,
            GameOutcome::Draw => self.draws += count,
        }
        self.total_games += count;
    }
}

/// Outcome counts over the most recent finished games.
#[derive(Debug, Clone, PartialEq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct RecentPerformance {
    wins: i32,
    losses: i32,
    draws: i32,
    win_percentage: f64,
}

impl RecentPerformance {
    /// Tallies a list of outcomes.
    pub fn from_outcomes(outcomes: &[GameOutcome]) -> Self {
        let count = |wanted| outcomes.iter().filter(|o| **o == wanted).count() as i32;
        let wins = count(GameOutcome::Win);
        Self {
            wins,
            losses: count(GameOutcome::Loss),
            draws: count(GameOutcome::Draw),
            win_percentage: crate::db::win_percentage(wins, outcomes.len() as i32),
        }
    }
}

/// Accumulated statistics plus breakdowns derived from game history.
#[derive(Debug, Clone, PartialEq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct DetailedStats {
    basic: AggregatedStats,
    by_starter: Vec<StarterBreakdown>,
    recent_performance: RecentPerformance,
}

/// Service layer for statistics and leaderboard queries.
///
/// Every per-game figure reads the outcome stored when the game finished.
#[derive(Debug, Clone)]
pub struct StatsService {
    store: Arc<dyn SessionStore>,
    default_limit: i64,
}

impl StatsService {
    /// Creates a stats service backed by the given store.
    #[instrument(skip(store))]
    pub fn new(store: Arc<dyn SessionStore>, default_limit: i64) -> Self {
        info!("Creating StatsService");
        Self {
            store,
            default_limit: default_limit.clamp(1, MAX_LIMIT),
        }
    }

    fn limit(&self, requested: Option<i64>) -> i64 {
        requested.unwrap_or(self.default_limit).clamp(1, MAX_LIMIT)
    }

    /// Returns the user's accumulated statistics, creating a zeroed record on
    /// first access.
    #[instrument(skip(self))]
    pub fn get_statistics(&self, user_id: UserId) -> Result<AggregatedStats, GameError> {
        let stats = self.store.ensure_accumulator(user_id)?;
        debug!(total_games = stats.total_games(), "Statistics loaded");
        Ok(AggregatedStats::from(&stats))
    }

    /// Returns the top players, best first.
    #[instrument(skip(self))]
    pub fn get_leaderboard(&self, limit: Option<i64>) -> Result<Vec<LeaderboardEntry>, GameError> {
        Ok(self.store.leaderboard(self.limit(limit))?)
    }

    /// Returns the user's games, newest first.
    #[instrument(skip(self))]
    pub fn get_recent_games(
        &self,
        user_id: UserId,
        limit: Option<i64>,
    ) -> Result<Vec<RecentGame>, GameError> {
        let games = self.store.recent_games(user_id, self.limit(limit))?;
        debug!(count = games.len(), "Recent games loaded");
        Ok(games.iter().map(RecentGame::from).collect())
    }

    /// Returns accumulated statistics with per-starter and recent breakdowns.
    #[instrument(skip(self))]
    pub fn get_detailed_statistics(&self, user_id: UserId) -> Result<DetailedStats, GameError> {
        let basic = self.get_statistics(user_id)?;

        let mut by_starter = vec![
            StarterBreakdown::empty(Side::User),
            StarterBreakdown::empty(Side::Engine),
        ];
        for (starter, outcome, count) in self.store.outcomes_by_starter(user_id)? {
            if let Some(entry) = by_starter.iter_mut().find(|b| b.starter == starter) {
                entry.add(outcome, count);
            }
        }

        let recent = self.store.recent_outcomes(user_id, RECENT_WINDOW)?;
        let recent_performance = RecentPerformance::from_outcomes(&recent);

        debug!(recent = recent.len(), "Detailed statistics computed");
        Ok(DetailedStats {
            basic,
            by_starter,
            recent_performance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_performance_tally() {
        let perf = RecentPerformance::from_outcomes(&[
            GameOutcome::Win,
            GameOutcome::Loss,
            GameOutcome::Win,
            GameOutcome::Draw,
        ]);
        assert_eq!(*perf.wins(), 2);
        assert_eq!(*perf.losses(), 1);
        assert_eq!(*perf.draws(), 1);
        assert_eq!(*perf.win_percentage(), 50.0);
    }

    #[test]
    fn test_recent_performance_empty() {
        let perf = RecentPerformance::from_outcomes(&[]);
        assert_eq!(*perf.win_percentage(), 0.0);
    }

    #[test]
    fn test_starter_breakdown_add() {
        let mut b = StarterBreakdown::empty(Side::Engine);
        b.add(GameOutcome::Win, 3);
        b.add(GameOutcome::Draw, 2);
        assert_eq!(*b.total_games(), 5);
        assert_eq!(*b.wins(), 3);
        assert_eq!(*b.losses(), 0);
    }
}
