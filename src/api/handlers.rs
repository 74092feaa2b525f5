//! Request handlers for game, statistics and health endpoints.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use super::{ApiError, AppState, AuthUser};
use crate::db::{AggregatedStats, GameId, LeaderboardEntry};
use crate::orchestrator::GameView;
use crate::stats_service::{DetailedStats, RecentGame};

/// Body of `POST /api/game/start`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGameRequest {
    /// `"user"` or `"computer"`.
    pub started_by: String,
}

/// Body of `POST /api/game/move`.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveRequest {
    /// Row, 0 to 2.
    pub row: i64,
    /// Column, 0 to 2.
    pub col: i64,
}

/// Optional `?limit=` query. Unparseable or non-positive values fall back to
/// the default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitQuery {
    limit: Option<String>,
}

impl LimitQuery {
    fn value(&self) -> Option<i64> {
        self.limit
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|n| *n > 0)
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        warn!(error = %rejection, "Unreadable request body");
        ApiError::invalid_parameter(rejection.body_text())
    })
}

#[instrument(skip(state, payload))]
pub(super) async fn start_game(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<StartGameRequest>, JsonRejection>,
) -> Result<Json<GameView>, ApiError> {
    let request = body(payload)?;
    let view = state
        .orchestrator
        .start_game(user_id, &request.started_by)
        .await?;
    info!(game_id = view.game_id(), "Start game handled");
    Ok(Json(view))
}

#[instrument(skip(state, payload))]
pub(super) async fn make_move(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<GameView>, ApiError> {
    let request = body(payload)?;
    let view = state
        .orchestrator
        .submit_move(user_id, request.row, request.col)
        .await?;
    Ok(Json(view))
}

#[instrument(skip(state))]
pub(super) async fn game_state(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(game_id): Path<GameId>,
) -> Result<Json<GameView>, ApiError> {
    Ok(Json(state.orchestrator.get_state(user_id, game_id)?))
}

#[instrument(skip(state))]
pub(super) async fn my_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<AggregatedStats>, ApiError> {
    Ok(Json(state.stats.get_statistics(user_id)?))
}

#[instrument(skip(state))]
pub(super) async fn recent_games(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<RecentGame>>, ApiError> {
    Ok(Json(state.stats.get_recent_games(user_id, query.value())?))
}

#[instrument(skip(state))]
pub(super) async fn leaderboard(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    Ok(Json(state.stats.get_leaderboard(query.value())?))
}

#[instrument(skip(state))]
pub(super) async fn detailed_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<DetailedStats>, ApiError> {
    Ok(Json(state.stats.get_detailed_statistics(user_id)?))
}

/// Service liveness plus the engine's own health report.
///
/// Always answers 200 while the service runs; an unreachable engine is
/// reported in the body.
#[instrument(skip(state))]
pub(super) async fn health(State(state): State<AppState>) -> Json<Value> {
    let engine = match state.orchestrator.engine_health().await {
        Ok(details) => json!({ "status": "ok", "details": details }),
        Err(err) => {
            warn!(code = err.code(), "Engine health check failed");
            json!({ "status": "unavailable", "error": err.code() })
        }
    };
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "engine": engine,
    }))
}
