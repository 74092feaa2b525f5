//! Turn resolution from persisted board state.

use tracing::{debug, instrument};

use super::types::{Board, Side};

/// Derives which side moves next from the board and who started.
///
/// Play strictly alternates beginning with `starter`, so the starter is to
/// move whenever both sides have placed the same number of marks. Callers
/// must check the game status first; this does not detect finished games.
#[instrument(skip(board), fields(board = %board.display()))]
pub fn next_turn(board: &Board, starter: Side) -> Side {
    let starter_count = board.count(starter.mark());
    let other_count = board.count(starter.mark().opponent());

    let next = if starter_count == other_count {
        starter
    } else {
        match starter {
            Side::User => Side::Engine,
            Side::Engine => Side::User,
        }
    };

    debug!(starter_count, other_count, ?starter, ?next, "Resolved next turn");
    next
}
