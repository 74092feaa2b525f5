//! JSON HTTP surface over the orchestrator and statistics service.

mod auth;
mod error;
mod handlers;

pub use auth::{AuthUser, USER_ID_HEADER};
pub use error::{ApiError, ErrorBody, status_for};
pub use handlers::{LimitQuery, MoveRequest, StartGameRequest};

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tracing::{debug, instrument};

use crate::orchestrator::GameOrchestrator;
use crate::stats_service::StatsService;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Game operations.
    pub orchestrator: GameOrchestrator,
    /// Statistics queries.
    pub stats: StatsService,
}

/// Builds the service router.
#[instrument(skip(state))]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/game/start", post(handlers::start_game))
        .route("/api/game/move", post(handlers::make_move))
        .route("/api/game/state/{game_id}", get(handlers::game_state))
        .route("/api/stats/my-stats", get(handlers::my_stats))
        .route("/api/stats/recent-games", get(handlers::recent_games))
        .route("/api/stats/leaderboard", get(handlers::leaderboard))
        .route("/api/stats/detailed-stats", get(handlers::detailed_stats))
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            debug!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(state)
}
