//! JSON bodies exchanged with the decision engine.

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::games::tictactoe::{InternalBoard, InternalMark, Position};

/// Body of `POST /make-move` and `POST /check-game-state`.
#[derive(Debug, Clone, Serialize, new)]
pub struct MoveRequest<'a> {
    board: &'a InternalBoard,
    current_player: InternalMark,
    #[serde(skip_serializing_if = "Option::is_none")]
    difficulty: Option<&'a str>,
}

/// Body returned by `POST /reset-game`.
#[derive(Debug, Clone, Deserialize)]
pub struct ResetResponse {
    pub board: InternalBoard,
}

/// Body returned by `POST /make-move` and `POST /check-game-state`.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveResponse {
    pub board: InternalBoard,
    pub game_over: bool,
    #[serde(default)]
    pub winner: Option<InternalMark>,
    #[serde(default)]
    pub is_draw: bool,
    #[serde(default)]
    pub position: Option<WirePosition>,
}

/// Move position as engines send it: `[row, col]` or `{ "row", "col" }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WirePosition {
    /// `[row, col]`; `[-1, -1]` means no move was made.
    Pair(i64, i64),
    /// `{ "row": r, "col": c }`.
    Object {
        /// Row index.
        row: i64,
        /// Column index.
        col: i64,
    },
}

impl WirePosition {
    /// Board position, or `None` for the no-move sentinel and out-of-range values.
    pub fn to_position(self) -> Option<Position> {
        let (row, col) = match self {
            WirePosition::Pair(row, col) => (row, col),
            WirePosition::Object { row, col } => (row, col),
        };
        Position::from_row_col(row, col)
    }
}
