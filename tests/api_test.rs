//! HTTP surface tests driven through the router without a socket.

mod common;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::NamedTempFile;
use tower::ServiceExt;

use common::ScriptedEngine;
use strictly_arbiter::{
    AppState, EngineErrorKind, GameOrchestrator, GameRepository, Position, StatsService,
    USER_ID_HEADER, router,
};

struct Api {
    _db: NamedTempFile,
    engine: Arc<ScriptedEngine>,
    app: Router,
}

fn api() -> Api {
    let db = NamedTempFile::new().expect("Failed to create temp file");
    let path = db.path().to_str().expect("Invalid path").to_string();
    let store = Arc::new(GameRepository::new(path).expect("Failed to create repository"));
    store.run_migrations().expect("Migrations failed");
    store
        .get_or_create_user("Alice".to_string())
        .expect("Create user failed");

    let engine = Arc::new(ScriptedEngine::new(vec![
        Position::Center,
        Position::TopRight,
        Position::BottomLeft,
    ]));
    let state = AppState {
        orchestrator: GameOrchestrator::new(engine.clone(), store.clone()),
        stats: StatsService::new(store, 10),
    };
    Api {
        _db: db,
        engine,
        app: router(state),
    }
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("Request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Body failed")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Body is not JSON")
    };
    (status, body)
}

fn post(uri: &str, user: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("Request build failed")
}

fn get(uri: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    builder.body(Body::empty()).expect("Request build failed")
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let api = api();
    let (status, body) = call(
        &api.app,
        post("/api/game/start", None, json!({ "startedBy": "user" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let (status, _) = call(&api.app, get("/api/stats/my-stats", Some("abc"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_start_game_response_shape() {
    let api = api();
    let (status, body) = call(
        &api.app,
        post("/api/game/start", Some("1"), json!({ "startedBy": "computer" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["gameId"].as_i64().unwrap() > 0);
    assert_eq!(
        body["board"],
        json!([[null, null, null], [null, "O", null], [null, null, null]])
    );
    assert_eq!(body["turn"], "user");
    assert_eq!(body["gameOver"], false);
    assert_eq!(body["winner"], Value::Null);
    assert_eq!(body["isDraw"], false);
    assert_eq!(body["nextMovePosition"], json!({ "row": 1, "col": 1 }));
    assert_eq!(body["starter"], "computer");
}

#[tokio::test]
async fn test_invalid_starter_is_bad_request() {
    let api = api();
    let (status, body) = call(
        &api.app,
        post("/api/game/start", Some("1"), json!({ "startedBy": "nobody" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_PARAMETER");
    assert!(body["message"].is_string());
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn test_move_flow_and_errors() {
    let api = api();
    call(
        &api.app,
        post("/api/game/start", Some("1"), json!({ "startedBy": "user" })),
    )
    .await;

    let (status, body) = call(
        &api.app,
        post("/api/game/move", Some("1"), json!({ "row": 0, "col": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["board"][0][0], "X");
    assert_eq!(body["board"][1][1], "O");
    assert_eq!(body["turn"], "user");

    let (status, body) = call(
        &api.app,
        post("/api/game/move", Some("1"), json!({ "row": 0, "col": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "CELL_OCCUPIED");
    assert_eq!(body["retryable"], false);

    let (status, body) = call(
        &api.app,
        post("/api/game/move", Some("1"), json!({ "row": 5, "col": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_PARAMETER");

    let (status, body) = call(
        &api.app,
        post("/api/game/move", Some("1"), json!({ "row": "top" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_PARAMETER");
}

#[tokio::test]
async fn test_move_without_game_is_not_found() {
    let api = api();
    let (status, body) = call(
        &api.app,
        post("/api/game/move", Some("9"), json!({ "row": 1, "col": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "GAME_NOT_FOUND");
}

#[tokio::test]
async fn test_engine_failure_is_service_unavailable() {
    let api = api();
    call(
        &api.app,
        post("/api/game/start", Some("1"), json!({ "startedBy": "user" })),
    )
    .await;

    api.engine.fail_with(EngineErrorKind::Unavailable);
    let (status, body) = call(
        &api.app,
        post("/api/game/move", Some("1"), json!({ "row": 0, "col": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "ENGINE_UNAVAILABLE");
    assert_eq!(body["retryable"], true);
    assert!(!body["message"].as_str().unwrap().contains("scripted"));
}

#[tokio::test]
async fn test_game_state_scoped_to_owner() {
    let api = api();
    let (_, started) = call(
        &api.app,
        post("/api/game/start", Some("1"), json!({ "startedBy": "user" })),
    )
    .await;
    let id = started["gameId"].as_i64().unwrap();

    let (status, body) = call(&api.app, get(&format!("/api/game/state/{}", id), Some("1"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gameId"], id);
    assert_eq!(body["starter"], "user");

    let (status, body) = call(&api.app, get(&format!("/api/game/state/{}", id), Some("2"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "GAME_NOT_FOUND");
}

#[tokio::test]
async fn test_stats_endpoints() {
    let api = api();
    call(
        &api.app,
        post("/api/game/start", Some("1"), json!({ "startedBy": "user" })),
    )
    .await;
    // Engine answers Center then TopRight; X wins down the left column.
    for (row, col) in [(0, 0), (1, 0)] {
        call(
            &api.app,
            post("/api/game/move", Some("1"), json!({ "row": row, "col": col })),
        )
        .await;
    }
    let (_, finished) = call(
        &api.app,
        post("/api/game/move", Some("1"), json!({ "row": 2, "col": 0 })),
    )
    .await;
    assert_eq!(finished["gameOver"], true);
    assert_eq!(finished["winner"], "X");
    assert_eq!(finished["turn"], Value::Null);

    let (status, stats) = call(&api.app, get("/api/stats/my-stats", Some("1"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["wins"], 1);
    assert_eq!(stats["totalGames"], 1);
    assert_eq!(stats["winPercentage"], 100.0);

    let (_, recent) = call(&api.app, get("/api/stats/recent-games?limit=5", Some("1"))).await;
    assert_eq!(recent.as_array().unwrap().len(), 1);
    assert_eq!(recent[0]["result"], "win");
    assert_eq!(recent[0]["winner"], "X");
    assert_eq!(recent[0]["starter"], "user");

    let (_, board) = call(&api.app, get("/api/stats/leaderboard?limit=abc", Some("2"))).await;
    assert_eq!(board[0]["rank"], 1);
    assert_eq!(board[0]["name"], "Alice");
    assert_eq!(board[0]["wins"], 1);

    let (_, detailed) = call(&api.app, get("/api/stats/detailed-stats", Some("1"))).await;
    assert_eq!(detailed["basic"]["wins"], 1);
    assert_eq!(detailed["byStarter"][0]["starter"], "user");
    assert_eq!(detailed["byStarter"][0]["wins"], 1);
    assert_eq!(detailed["byStarter"][1]["totalGames"], 0);
    assert_eq!(detailed["recentPerformance"]["wins"], 1);
}

#[tokio::test]
async fn test_health_reports_engine() {
    let api = api();
    let (status, body) = call(&api.app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["engine"]["status"], "ok");

    api.engine.fail_with(EngineErrorKind::Unavailable);
    let (status, body) = call(&api.app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["engine"]["status"], "unavailable");
}
