//! Tic-tac-toe board model, board codec and turn resolution.

mod codec;
mod position;
mod turn;
mod types;

pub use codec::{
    ENGINE_EMPTY, ENGINE_O, ENGINE_X, InternalBoard, InternalMark, mark_to_engine,
    mark_to_external, to_engine, to_external,
};
pub use position::Position;
pub use turn::next_turn;
pub use types::{Board, ENGINE_MARK, GameStatus, Mark, Side, Square, USER_MARK};
