//! Core domain types for tic-tac-toe, in the client-facing representation.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::instrument;

use super::Position;

/// Mark placed on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum Mark {
    /// Mark `X`, always played by the user.
    X,
    /// Mark `O`, always played by the engine.
    O,
}

/// Mark the user always plays.
pub const USER_MARK: Mark = Mark::X;

/// Mark the engine opponent always plays.
pub const ENGINE_MARK: Mark = Mark::O;

impl Mark {
    /// Returns the opposing mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    /// Parses a client-facing mark (`"X"` or `"O"`).
    ///
    /// Anything else yields `None`.
    pub fn from_external(s: &str) -> Option<Self> {
        match s {
            "X" => Some(Mark::X),
            "O" => Some(Mark::O),
            _ => None,
        }
    }
}

/// A square on the tic-tac-toe board.
///
/// Serialized as `null`, `"X"` or `"O"`. Unrecognized values deserialize
/// as [`Square::Empty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Square {
    /// Empty square.
    #[default]
    Empty,
    /// Square occupied by a mark.
    Occupied(Mark),
}

impl Square {
    /// Builds a square from a client-facing cell value.
    pub fn from_external(value: Option<&str>) -> Self {
        value
            .and_then(Mark::from_external)
            .map_or(Square::Empty, Square::Occupied)
    }

    /// Returns the mark on this square, if any.
    pub fn mark(self) -> Option<Mark> {
        match self {
            Square::Empty => None,
            Square::Occupied(mark) => Some(mark),
        }
    }
}

impl Serialize for Square {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.mark().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Square {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(Square::from_external(raw.as_ref().and_then(|v| v.as_str())))
    }
}

/// 3x3 tic-tac-toe board, rows top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    rows: [[Square; 3]; 3],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a board from rows of squares.
    pub fn from_rows(rows: [[Square; 3]; 3]) -> Self {
        Self { rows }
    }

    /// Returns the rows of the board.
    pub fn rows(&self) -> &[[Square; 3]; 3] {
        &self.rows
    }

    /// Gets the square at the given position.
    pub fn get(&self, pos: Position) -> Square {
        self.rows[pos.row()][pos.col()]
    }

    /// Sets the square at the given position.
    pub fn set(&mut self, pos: Position, square: Square) {
        self.rows[pos.row()][pos.col()] = square;
    }

    /// Checks if a square is empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos) == Square::Empty
    }

    /// Returns a copy of this board with `mark` placed at `pos`.
    pub fn with_mark(&self, pos: Position, mark: Mark) -> Self {
        let mut next = *self;
        next.set(pos, Square::Occupied(mark));
        next
    }

    /// Counts the squares holding `mark`.
    pub fn count(&self, mark: Mark) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|sq| **sq == Square::Occupied(mark))
            .count()
    }

    /// Formats the board as a human-readable string.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for (r, row) in self.rows.iter().enumerate() {
            for (c, sq) in row.iter().enumerate() {
                let symbol = match sq {
                    Square::Empty => ".".to_string(),
                    Square::Occupied(mark) => mark.to_string(),
                };
                result.push_str(&symbol);
                if c < 2 {
                    result.push('|');
                }
            }
            if r < 2 {
                result.push('/');
            }
        }
        result
    }
}

/// Which side of the game: the user or the engine opponent.
///
/// Client-facing names are `"user"` and `"computer"`; `"engine"` is
/// accepted as an alias.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum Side {
    /// The human user (plays [`USER_MARK`]).
    #[serde(rename = "user")]
    #[strum(to_string = "user")]
    User,
    /// The decision engine (plays [`ENGINE_MARK`]).
    #[serde(rename = "computer", alias = "engine")]
    #[strum(to_string = "computer", serialize = "engine")]
    Engine,
}

impl Side {
    /// Mark played by this side.
    pub fn mark(self) -> Mark {
        match self {
            Side::User => USER_MARK,
            Side::Engine => ENGINE_MARK,
        }
    }
}

/// Current status of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    /// Game is ongoing.
    InProgress,
    /// Game ended in a win.
    Won(Mark),
    /// Game ended in a draw.
    Draw,
}

impl GameStatus {
    /// Derives a status from the flags reported by the decision engine.
    ///
    /// Returns `None` when the flags contradict each other: the game is
    /// reported over with neither a winner nor a draw, or a winner and a draw
    /// are both reported.
    #[instrument]
    pub fn from_flags(game_over: bool, winner: Option<Mark>, is_draw: bool) -> Option<Self> {
        match (game_over, winner, is_draw) {
            (false, _, _) => Some(GameStatus::InProgress),
            (true, Some(mark), false) => Some(GameStatus::Won(mark)),
            (true, None, true) => Some(GameStatus::Draw),
            _ => None,
        }
    }

    /// True when the game has reached a terminal state.
    pub fn is_over(self) -> bool {
        !matches!(self, GameStatus::InProgress)
    }

    /// Winning mark, if any.
    pub fn winner(self) -> Option<Mark> {
        match self {
            GameStatus::Won(mark) => Some(mark),
            _ => None,
        }
    }

    /// True when the game ended in a draw.
    pub fn is_draw(self) -> bool {
        matches!(self, GameStatus::Draw)
    }

    /// Converts status to the string stored in the database.
    pub fn to_db_string(self) -> &'static str {
        match self {
            GameStatus::InProgress => "in_progress",
            GameStatus::Won(Mark::X) => "won_x",
            GameStatus::Won(Mark::O) => "won_o",
            GameStatus::Draw => "draw",
        }
    }

    /// Parses status from the string stored in the database.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(GameStatus::InProgress),
            "won_x" => Some(GameStatus::Won(Mark::X)),
            "won_o" => Some(GameStatus::Won(Mark::O)),
            "draw" => Some(GameStatus::Draw),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_serializes_as_external_cell() {
        let json = serde_json::to_string(&[
            Square::Empty,
            Square::Occupied(Mark::X),
            Square::Occupied(Mark::O),
        ])
        .unwrap();
        assert_eq!(json, r#"[null,"X","O"]"#);
    }

    #[test]
    fn test_unknown_external_cell_is_empty() {
        let squares: Vec<Square> = serde_json::from_str(r#"["Z", 7, "x", "O"]"#).unwrap();
        assert_eq!(
            squares,
            vec![
                Square::Empty,
                Square::Empty,
                Square::Empty,
                Square::Occupied(Mark::O)
            ]
        );
    }

    #[test]
    fn test_board_json_is_nested_rows() {
        let board = Board::new().with_mark(Position::Center, Mark::X);
        let json = serde_json::to_string(&board).unwrap();
        assert_eq!(json, r#"[[null,null,null],[null,"X",null],[null,null,null]]"#);
        let parsed: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, board);
    }

    #[test]
    fn test_side_parsing() {
        assert_eq!("user".parse::<Side>().unwrap(), Side::User);
        assert_eq!("computer".parse::<Side>().unwrap(), Side::Engine);
        assert_eq!("engine".parse::<Side>().unwrap(), Side::Engine);
        assert!("robot".parse::<Side>().is_err());
        assert_eq!(Side::Engine.to_string(), "computer");
    }

    #[test]
    fn test_fixed_identity() {
        assert_eq!(Side::User.mark(), Mark::X);
        assert_eq!(Side::Engine.mark(), Mark::O);
    }

    #[test]
    fn test_status_from_flags() {
        assert_eq!(
            GameStatus::from_flags(false, None, false),
            Some(GameStatus::InProgress)
        );
        assert_eq!(
            GameStatus::from_flags(true, Some(Mark::X), false),
            Some(GameStatus::Won(Mark::X))
        );
        assert_eq!(GameStatus::from_flags(true, None, true), Some(GameStatus::Draw));
        assert_eq!(GameStatus::from_flags(true, None, false), None);
        assert_eq!(GameStatus::from_flags(true, Some(Mark::O), true), None);
    }

    #[test]
    fn test_status_db_strings() {
        for status in [
            GameStatus::InProgress,
            GameStatus::Won(Mark::X),
            GameStatus::Won(Mark::O),
            GameStatus::Draw,
        ] {
            assert_eq!(GameStatus::from_db_string(status.to_db_string()), Some(status));
        }
        assert_eq!(GameStatus::from_db_string("over"), None);
    }
}
