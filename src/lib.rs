//! Strictly Arbiter library - authoritative tic-tac-toe game sessions
//!
//! This library arbitrates games between users and an external move-decision
//! engine. The server, not the client, decides whose turn it is, applies each
//! move exactly once and counts every finished game exactly once.
//!
//! # Architecture
//!
//! - **Games**: board types, the board codec and the turn resolver
//! - **Engine**: client for the external decision engine
//! - **Db**: SQLite session store for games and outcome accumulators
//! - **Orchestrator**: start-game / submit-move / fetch-state
//! - **Api**: JSON HTTP endpoints
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use strictly_arbiter::{GameOrchestrator, GameRepository, HttpEngineClient};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = GameRepository::new("games.db".to_string())?;
//! store.run_migrations()?;
//! let engine = HttpEngineClient::new("http://localhost:8000", Duration::from_secs(5), None)?;
//!
//! let orchestrator = GameOrchestrator::new(Arc::new(engine), Arc::new(store));
//! let game = orchestrator.start_game(1, "user").await?;
//! let game = orchestrator.submit_move(1, 1, 1).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod api;
mod config;
mod db;
mod engine;
mod games;
mod orchestrator;
mod stats_service;

// Crate-level exports - HTTP surface
pub use api::{
    ApiError, AppState, AuthUser, ErrorBody, LimitQuery, MoveRequest, StartGameRequest,
    USER_ID_HEADER, router, status_for,
};

// Crate-level exports - Configuration
pub use config::{
    ConfigError, ENV_DATABASE, ENV_ENGINE_TIMEOUT, ENV_ENGINE_URL, ENV_PORT, ServiceConfig,
};

// Crate-level exports - Persistence
pub use db::{
    AggregatedStats, DbError, Game, GameId, GameOutcome, GameRepository, GameUpdate,
    LeaderboardEntry, MIGRATIONS, NewGame, SessionStore, Statistics, UpdateResult, User, UserId,
    win_percentage,
};

// Crate-level exports - Decision engine
pub use engine::{DecisionEngine, EngineError, EngineErrorKind, EngineReply, HttpEngineClient};

// Crate-level exports - Game types (tic-tac-toe)
pub use games::tictactoe::{
    Board, ENGINE_EMPTY, ENGINE_MARK, ENGINE_O, ENGINE_X, GameStatus, InternalBoard, InternalMark,
    Mark, Position, Side, Square, USER_MARK, mark_to_engine, mark_to_external, next_turn,
    to_engine, to_external,
};

// Crate-level exports - Orchestration
pub use orchestrator::{GameError, GameErrorKind, GameOrchestrator, GameView};

// Crate-level exports - Statistics
pub use stats_service::{
    DEFAULT_LIMIT, DetailedStats, MAX_LIMIT, RECENT_WINDOW, RecentGame, RecentPerformance,
    StarterBreakdown, StatsService,
};
