//! HTTP client for the decision engine.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument, warn};

use super::wire::{MoveRequest, MoveResponse, ResetResponse};
use super::{DecisionEngine, EngineError, EngineReply};
use crate::games::tictactoe::{InternalBoard, InternalMark};

/// Decision engine reached over HTTP with JSON bodies.
///
/// Every request, including reading the response body, is bounded by the
/// timeout given at construction.
#[derive(Debug, Clone)]
pub struct HttpEngineClient {
    base_url: String,
    client: reqwest::Client,
    difficulty: Option<String>,
}

impl HttpEngineClient {
    /// Creates a client for the engine at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the HTTP client cannot be built.
    #[instrument(skip(base_url), fields(base_url = %base_url.as_ref()))]
    pub fn new(
        base_url: impl AsRef<str>,
        timeout: Duration,
        difficulty: Option<String>,
    ) -> Result<Self, EngineError> {
        let base_url = base_url.as_ref().trim_end_matches('/').to_string();
        info!(base_url = %base_url, timeout_ms = timeout.as_millis() as u64, "Creating engine client");

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::unavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            client,
            difficulty,
        })
    }

    /// Returns the engine base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a request and decodes the JSON body of a successful response.
    #[instrument(skip(self, request))]
    async fn send<T: DeserializeOwned>(
        &self,
        path: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, EngineError> {
        let response = request.send().await.map_err(|e| classify(path, e))?;

        let status = response.status();
        debug!(status = %status, "Engine responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Engine returned error status");
            return Err(match status {
                StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT => {
                    EngineError::unavailable(format!("{} returned {}", path, status))
                }
                _ => EngineError::rejected(format!("{} returned {}", path, status)),
            });
        }

        response.json::<T>().await.map_err(|e| classify(path, e))
    }

    /// Posts a move/evaluation request.
    async fn post_move(
        &self,
        path: &'static str,
        board: &InternalBoard,
        player: InternalMark,
    ) -> Result<EngineReply, EngineError> {
        let body = MoveRequest::new(board, player, self.difficulty.as_deref());
        let request = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(&body);

        let reply: MoveResponse = self.send(path, request).await?;
        Ok(EngineReply {
            board: reply.board,
            game_over: reply.game_over,
            winner: reply.winner,
            is_draw: reply.is_draw,
            position: reply.position.and_then(|p| p.to_position()),
        })
    }
}

/// Maps a transport error to an engine error kind.
fn classify(path: &str, err: reqwest::Error) -> EngineError {
    if err.is_decode() {
        error!(path, error = %err, "Engine response could not be decoded");
        EngineError::malformed(format!("{} returned an invalid body: {}", path, err))
    } else if err.is_timeout() {
        error!(path, error = %err, "Engine request timed out");
        EngineError::unavailable(format!("{} timed out", path))
    } else {
        error!(path, error = %err, "Engine request failed");
        EngineError::unavailable(format!("{} failed: {}", path, err))
    }
}

#[async_trait]
impl DecisionEngine for HttpEngineClient {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn health_check(&self) -> Result<serde_json::Value, EngineError> {
        debug!("Checking engine health");
        let request = self.client.get(format!("{}/health", self.base_url));
        self.send::<serde_json::Value>("/health", request)
            .await
            .map_err(|e| EngineError::unavailable(e.message))
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn reset_game(&self) -> Result<InternalBoard, EngineError> {
        debug!("Requesting initial board");
        let request = self.client.post(format!("{}/reset-game", self.base_url));
        let reply: ResetResponse = self.send("/reset-game", request).await?;
        Ok(reply.board)
    }

    #[instrument(skip(self, board), fields(base_url = %self.base_url, board = ?board))]
    async fn propose_move(
        &self,
        board: &InternalBoard,
        player: InternalMark,
    ) -> Result<EngineReply, EngineError> {
        debug!("Requesting engine move");
        let reply = self.post_move("/make-move", board, player).await?;
        info!(
            position = ?reply.position,
            game_over = reply.game_over,
            winner = ?reply.winner,
            is_draw = reply.is_draw,
            "Engine moved"
        );
        Ok(reply)
    }

    #[instrument(skip(self, board), fields(base_url = %self.base_url, board = ?board))]
    async fn evaluate_state(
        &self,
        board: &InternalBoard,
        player: InternalMark,
    ) -> Result<EngineReply, EngineError> {
        debug!("Requesting board evaluation");
        let reply = self.post_move("/check-game-state", board, player).await?;
        debug!(
            game_over = reply.game_over,
            winner = ?reply.winner,
            is_draw = reply.is_draw,
            "Board evaluated"
        );
        Ok(reply)
    }
}
