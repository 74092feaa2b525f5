//! Board codec between the client-facing and the engine-facing representations.
//!
//! Client-facing cells are `null`/`"X"`/`"O"`; the decision engine speaks
//! `0`/`-1`/`1` with lowercase player marks. Conversions are total: engine
//! cell values outside `{-1, 0, 1}` decode as empty.

use serde::{Deserialize, Deserializer, Serialize};

use super::types::{Board, Mark, Square};

/// Engine value for an empty cell.
pub const ENGINE_EMPTY: i8 = 0;
/// Engine value for a cell holding [`Mark::X`].
pub const ENGINE_X: i8 = -1;
/// Engine value for a cell holding [`Mark::O`].
pub const ENGINE_O: i8 = 1;

/// Player mark as the decision engine names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InternalMark {
    /// Engine name for [`Mark::X`].
    X,
    /// Engine name for [`Mark::O`].
    O,
}

/// Board as the decision engine represents it: rows of `0`/`-1`/`1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct InternalBoard(pub [[i8; 3]; 3]);

impl<'de> Deserialize<'de> for InternalBoard {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Engines backed by numeric arrays may send `-1.0` instead of `-1`.
        let raw = <[[f64; 3]; 3]>::deserialize(deserializer)?;
        let mut cells = [[ENGINE_EMPTY; 3]; 3];
        for (r, row) in raw.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                cells[r][c] = value.round().clamp(i8::MIN as f64, i8::MAX as f64) as i8;
            }
        }
        Ok(InternalBoard(cells))
    }
}

/// Converts a client-facing board to the engine representation.
pub fn to_engine(board: &Board) -> InternalBoard {
    let mut cells = [[ENGINE_EMPTY; 3]; 3];
    for (r, row) in board.rows().iter().enumerate() {
        for (c, square) in row.iter().enumerate() {
            cells[r][c] = match square {
                Square::Empty => ENGINE_EMPTY,
                Square::Occupied(Mark::X) => ENGINE_X,
                Square::Occupied(Mark::O) => ENGINE_O,
            };
        }
    }
    InternalBoard(cells)
}

/// Converts an engine board to the client-facing representation.
pub fn to_external(board: &InternalBoard) -> Board {
    let mut rows = [[Square::Empty; 3]; 3];
    for (r, row) in board.0.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            rows[r][c] = match *value {
                ENGINE_X => Square::Occupied(Mark::X),
                ENGINE_O => Square::Occupied(Mark::O),
                _ => Square::Empty,
            };
        }
    }
    Board::from_rows(rows)
}

/// Converts a client-facing mark to the engine's name for it.
pub fn mark_to_engine(mark: Mark) -> InternalMark {
    match mark {
        Mark::X => InternalMark::X,
        Mark::O => InternalMark::O,
    }
}

/// Converts an engine mark to the client-facing mark.
pub fn mark_to_external(mark: InternalMark) -> Mark {
    match mark {
        InternalMark::X => Mark::X,
        InternalMark::O => Mark::O,
    }
}
