//! Shared test doubles.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use strictly_arbiter::{
    DecisionEngine, ENGINE_EMPTY, EngineError, EngineErrorKind, EngineReply, InternalBoard,
    InternalMark, Position,
};

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Engine that plays the first free cell from a fixed preference list and
/// judges boards with the ordinary three-in-a-row rule.
#[derive(Debug)]
pub struct ScriptedEngine {
    preference: Vec<Position>,
    failure: Mutex<Option<EngineErrorKind>>,
    proposal_failure: Mutex<Option<EngineErrorKind>>,
    pub plays_wrong_mark: AtomicBool,
    pub proposals: AtomicUsize,
    pub evaluations: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new(preference: Vec<Position>) -> Self {
        Self {
            preference,
            failure: Mutex::new(None),
            proposal_failure: Mutex::new(None),
            plays_wrong_mark: AtomicBool::new(false),
            proposals: AtomicUsize::new(0),
            evaluations: AtomicUsize::new(0),
        }
    }

    pub fn fail_with(&self, kind: EngineErrorKind) {
        *self.failure.lock().unwrap() = Some(kind);
    }

    /// Fails only `propose_move`; evaluation keeps answering.
    pub fn fail_proposals_with(&self, kind: EngineErrorKind) {
        *self.proposal_failure.lock().unwrap() = Some(kind);
    }

    pub fn calls(&self) -> usize {
        self.proposals.load(Ordering::SeqCst) + self.evaluations.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), EngineError> {
        match *self.failure.lock().unwrap() {
            Some(kind) => Err(EngineError::new(kind, "scripted failure")),
            None => Ok(()),
        }
    }

    fn judge(board: InternalBoard, position: Option<Position>) -> EngineReply {
        let cells: Vec<i8> = board.0.iter().flatten().copied().collect();
        let winner = LINES.iter().find_map(|[a, b, c]| {
            let v = cells[*a];
            (v != ENGINE_EMPTY && v == cells[*b] && v == cells[*c]).then_some(v)
        });
        let winner = winner.map(|v| if v < 0 { InternalMark::X } else { InternalMark::O });
        let full = cells.iter().all(|v| *v != ENGINE_EMPTY);
        EngineReply {
            board,
            game_over: winner.is_some() || full,
            winner,
            is_draw: winner.is_none() && full,
            position,
        }
    }
}

#[async_trait]
impl DecisionEngine for ScriptedEngine {
    async fn health_check(&self) -> Result<serde_json::Value, EngineError> {
        self.check_failure()?;
        Ok(serde_json::json!({ "status": "healthy" }))
    }

    async fn reset_game(&self) -> Result<InternalBoard, EngineError> {
        self.check_failure()?;
        Ok(InternalBoard::default())
    }

    async fn propose_move(
        &self,
        board: &InternalBoard,
        player: InternalMark,
    ) -> Result<EngineReply, EngineError> {
        self.proposals.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        if let Some(kind) = *self.proposal_failure.lock().unwrap() {
            return Err(EngineError::new(kind, "scripted proposal failure"));
        }

        let value = match (player, self.plays_wrong_mark.load(Ordering::SeqCst)) {
            (InternalMark::X, false) | (InternalMark::O, true) => -1,
            (InternalMark::O, false) | (InternalMark::X, true) => 1,
        };
        let position = self
            .preference
            .iter()
            .chain(Position::ALL.iter())
            .copied()
            .find(|p| board.0[p.row()][p.col()] == ENGINE_EMPTY)
            .ok_or_else(|| EngineError::rejected("board is full"))?;

        let mut next = *board;
        next.0[position.row()][position.col()] = value;
        Ok(Self::judge(next, Some(position)))
    }

    async fn evaluate_state(
        &self,
        board: &InternalBoard,
        _player: InternalMark,
    ) -> Result<EngineReply, EngineError> {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(Self::judge(*board, None))
    }
}
