//! Tests for tic-tac-toe positions and board representations.

use strictly_arbiter::{Board, Mark, Position, Side, Square, next_turn, to_engine, to_external};

#[test]
fn test_position_to_index() {
    assert_eq!(Position::TopLeft.to_index(), 0);
    assert_eq!(Position::Center.to_index(), 4);
    assert_eq!(Position::BottomRight.to_index(), 8);
}

#[test]
fn test_position_from_index() {
    assert_eq!(Position::from_index(0), Some(Position::TopLeft));
    assert_eq!(Position::from_index(4), Some(Position::Center));
    assert_eq!(Position::from_index(8), Some(Position::BottomRight));
    assert_eq!(Position::from_index(9), None);
}

#[test]
fn test_position_from_row_col() {
    assert_eq!(Position::from_row_col(0, 0), Some(Position::TopLeft));
    assert_eq!(Position::from_row_col(1, 2), Some(Position::MiddleRight));
    assert_eq!(Position::from_row_col(2, 1), Some(Position::BottomCenter));
    assert_eq!(Position::from_row_col(5, 0), None);
    assert_eq!(Position::from_row_col(0, -1), None);
    assert_eq!(Position::from_row_col(3, 3), None);
}

#[test]
fn test_position_serializes_as_row_col() {
    let json = serde_json::to_value(Position::MiddleRight).unwrap();
    assert_eq!(json, serde_json::json!({ "row": 1, "col": 2 }));
}

#[test]
fn test_valid_moves_empty_board() {
    let board = Board::new();
    let valid = Position::valid_moves(&board);
    assert_eq!(valid.len(), 9); // All positions valid on empty board
}

#[test]
fn test_valid_moves_filters_occupied() {
    let mut board = Board::new();
    board.set(Position::TopLeft, Square::Occupied(Mark::X));
    board.set(Position::Center, Square::Occupied(Mark::O));

    let valid = Position::valid_moves(&board);
    assert_eq!(valid.len(), 7); // 2 occupied, 7 free
    assert!(!valid.contains(&Position::TopLeft));
    assert!(!valid.contains(&Position::Center));
    assert!(valid.contains(&Position::BottomRight));
}

#[test]
fn test_board_external_json() {
    let board = Board::new()
        .with_mark(Position::TopLeft, Mark::X)
        .with_mark(Position::Center, Mark::O);
    let json = serde_json::to_value(board).unwrap();
    assert_eq!(
        json,
        serde_json::json!([["X", null, null], [null, "O", null], [null, null, null]])
    );

    let parsed: Board = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, board);
}

#[test]
fn test_board_unknown_cells_read_as_empty() {
    let parsed: Board =
        serde_json::from_str(r#"[["x", 1, "O"], [null, "", null], [null, null, "X"]]"#).unwrap();
    assert_eq!(parsed.get(Position::TopLeft), Square::Empty);
    assert_eq!(parsed.get(Position::TopCenter), Square::Empty);
    assert_eq!(parsed.get(Position::TopRight), Square::Occupied(Mark::O));
    assert_eq!(parsed.get(Position::BottomRight), Square::Occupied(Mark::X));
}

#[test]
fn test_engine_board_json() {
    let board = Board::new()
        .with_mark(Position::TopLeft, Mark::X)
        .with_mark(Position::BottomRight, Mark::O);
    let json = serde_json::to_value(to_engine(&board)).unwrap();
    assert_eq!(json, serde_json::json!([[-1, 0, 0], [0, 0, 0], [0, 0, 1]]));
    assert_eq!(to_external(&to_engine(&board)), board);
}

#[test]
fn test_side_names() {
    assert_eq!("user".parse::<Side>().unwrap(), Side::User);
    assert_eq!("computer".parse::<Side>().unwrap(), Side::Engine);
    assert!("robot".parse::<Side>().is_err());
    assert_eq!(serde_json::to_value(Side::Engine).unwrap(), "computer");
}

#[test]
fn test_turn_after_each_side_moves() {
    let board = Board::new().with_mark(Position::Center, Mark::O);
    assert_eq!(next_turn(&board, Side::Engine), Side::User);
    let board = board.with_mark(Position::TopLeft, Mark::X);
    assert_eq!(next_turn(&board, Side::Engine), Side::Engine);
}
