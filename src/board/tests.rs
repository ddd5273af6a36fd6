//! Cross-cutting board invariants

use super::{Player, Pos, SparseBoard, ZobristKeys};

#[test]
fn test_new_board_is_empty() {
    let board = SparseBoard::new(5);
    assert!(board.is_board_empty());
    assert_eq!(board.hash(), 0);
    assert!(board.bounding_box().is_none());
    assert!(board.history().is_empty());
}

#[test]
fn test_make_move_occupies_cell() {
    let mut board = SparseBoard::new(5);
    assert!(board.make_move(3, -2, Player::X));
    assert_eq!(board.at(3, -2), Player::X);
    assert!(!board.is_empty(3, -2));
    assert_eq!(board.history().len(), 1);
}

#[test]
fn test_make_move_rejects_occupied_cell() {
    let mut board = SparseBoard::new(5);
    assert!(board.make_move(0, 0, Player::X));
    assert!(!board.make_move(0, 0, Player::O));
    assert_eq!(board.at(0, 0), Player::X);
    assert_eq!(board.history().len(), 1);
}

#[test]
fn test_make_move_rejects_empty_player() {
    let mut board = SparseBoard::new(5);
    assert!(!board.make_move(1, 1, Player::Empty));
    assert!(board.is_board_empty());
}

#[test]
fn test_hash_matches_xor_of_keys() {
    let mut board = SparseBoard::new(5);
    board.make_move(0, 0, Player::X);
    board.make_move(4, -4, Player::O);
    board.make_move(-7, 2, Player::X);

    let mut keys = ZobristKeys::new();
    let expected = keys.key(Pos::new(0, 0), Player::X)
        ^ keys.key(Pos::new(4, -4), Player::O)
        ^ keys.key(Pos::new(-7, 2), Player::X);
    assert_eq!(board.hash(), expected);
}

#[test]
fn test_make_undo_restores_board() {
    let mut board = SparseBoard::new(5);
    board.make_move(0, 0, Player::X);
    board.make_move(1, 0, Player::O);

    let hash = board.hash();
    let bbox = board.bounding_box();
    let history_len = board.history().len();

    board.make_move(5, 5, Player::X);
    board.undo_move(5, 5);

    assert_eq!(board.hash(), hash);
    assert_eq!(board.bounding_box(), bbox);
    assert_eq!(board.history().len(), history_len);
    assert!(board.is_empty(5, 5));
}

#[test]
fn test_symmetric_undo_returns_hash_to_zero() {
    let mut board = SparseBoard::new(5);
    let moves = [(0, 0, Player::X), (1, 1, Player::O), (-2, 3, Player::X)];
    for &(x, y, player) in &moves {
        board.make_move(x, y, player);
    }
    for &(x, y, _) in moves.iter().rev() {
        board.undo_move(x, y);
    }
    assert_eq!(board.hash(), 0);
    assert!(board.is_board_empty());
    assert!(board.bounding_box().is_none());
}

#[test]
fn test_fresh_boards_share_hash() {
    let a = SparseBoard::new(5);
    let b = SparseBoard::new(5);
    assert_eq!(a.hash(), b.hash());
    assert_eq!(a.hash(), 0);
}

#[test]
fn test_same_position_different_order_same_hash() {
    let mut a = SparseBoard::new(5);
    a.make_move(0, 0, Player::X);
    a.make_move(3, 3, Player::O);

    let mut b = SparseBoard::new(5);
    b.make_move(3, 3, Player::O);
    b.make_move(0, 0, Player::X);

    assert_eq!(a.hash(), b.hash());
}

#[test]
fn test_undo_of_empty_cell_is_noop() {
    let mut board = SparseBoard::new(5);
    board.make_move(0, 0, Player::X);
    let hash = board.hash();

    board.undo_move(9, 9);

    assert_eq!(board.hash(), hash);
    assert_eq!(board.history().len(), 1);
}

#[test]
fn test_five_in_a_row_detected() {
    let mut board = SparseBoard::new(5);
    for x in 0..5 {
        board.make_move(x, 0, Player::X);
    }
    assert!(board.is_win(4, 0, Player::X));
    assert!(board.is_win(0, 0, Player::X));
    assert!(board.is_terminal());
}

#[test]
fn test_four_in_a_row_is_not_terminal() {
    let mut board = SparseBoard::new(5);
    for x in 0..4 {
        board.make_move(x, 0, Player::X);
    }
    assert!(!board.is_win(3, 0, Player::X));
    assert!(!board.is_terminal());
}

#[test]
fn test_diagonal_win_detected() {
    let mut board = SparseBoard::new(5);
    for i in 0..5 {
        board.make_move(i, i, Player::O);
    }
    assert!(board.is_win(2, 2, Player::O));
    assert!(board.is_terminal());
}

#[test]
fn test_win_across_negative_coordinates() {
    let mut board = SparseBoard::new(5);
    for x in -2..3 {
        board.make_move(x, -1, Player::X);
    }
    assert!(board.is_win(0, -1, Player::X));
}

#[test]
fn test_would_win_on_empty_cell() {
    let mut board = SparseBoard::new(5);
    for x in 0..4 {
        board.make_move(x, 0, Player::X);
    }
    assert!(board.would_win(4, 0, Player::X));
    assert!(board.would_win(-1, 0, Player::X));
    assert!(!board.would_win(5, 0, Player::X));
}

#[test]
fn test_bbox_tracks_occupied_area() {
    let mut board = SparseBoard::new(5);
    board.make_move(-3, 2, Player::X);
    board.make_move(4, -1, Player::O);

    let bbox = board.bounding_box().unwrap();
    assert_eq!(bbox.min_x, -3);
    assert_eq!(bbox.max_x, 4);
    assert_eq!(bbox.min_y, -1);
    assert_eq!(bbox.max_y, 2);
    assert_eq!(bbox.width(), 8);
    assert_eq!(bbox.height(), 4);
}

#[test]
fn test_bbox_shrinks_after_boundary_undo() {
    let mut board = SparseBoard::new(5);
    board.make_move(0, 0, Player::X);
    board.make_move(10, 10, Player::O);
    board.undo_move(10, 10);

    let bbox = board.bounding_box().unwrap();
    assert_eq!(bbox.max_x, 0);
    assert_eq!(bbox.max_y, 0);
}

#[test]
fn test_first_move_at_origin_round_trips() {
    // The degenerate origin case: placing and removing (0, 0) must leave
    // no trace of the box.
    let mut board = SparseBoard::new(5);
    board.make_move(0, 0, Player::X);
    assert!(board.bounding_box().is_some());
    board.undo_move(0, 0);
    assert!(board.bounding_box().is_none());
}

#[test]
fn test_occupied_positions_snapshot() {
    let mut board = SparseBoard::new(5);
    board.make_move(0, 0, Player::X);
    board.make_move(1, 2, Player::O);

    let mut occupied = board.occupied_positions();
    occupied.sort();
    assert_eq!(occupied, vec![Pos::new(0, 0), Pos::new(1, 2)]);
}

#[test]
fn test_terminal_iff_some_cell_wins() {
    let mut board = SparseBoard::new(5);
    for x in 0..5 {
        board.make_move(x, 0, Player::X);
    }
    let any_win = board
        .occupied_positions()
        .iter()
        .any(|p| board.is_win(p.x, p.y, board.at(p.x, p.y)));
    assert_eq!(board.is_terminal(), any_win);
    assert!(any_win);
}

#[test]
fn test_configurable_win_length() {
    let mut board = SparseBoard::new(3);
    board.make_move(0, 0, Player::O);
    board.make_move(1, 0, Player::O);
    board.make_move(2, 0, Player::O);
    assert!(board.is_win(1, 0, Player::O));
    assert!(board.is_terminal());
}
