//! Database persistence layer for games, outcome accumulators and user profiles.

mod error;
mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only
mod store;

use diesel_migrations::{EmbeddedMigrations, embed_migrations};

pub use error::DbError;
pub use models::{
    AggregatedStats, Game, GameId, GameOutcome, GameRecord, GameUpdate, LeaderboardEntry, NewGame,
    NewGameRecord, NewStatistics, NewUser, Statistics, UpdateResult, User, UserId, win_percentage,
};
pub use repository::GameRepository;
pub use store::SessionStore;

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");
