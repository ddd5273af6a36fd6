//! Line-based heuristic evaluation of moves and whole positions
//!
//! Candidate moves are scored by the patterns they touch while the cell is
//! still empty; whole positions sum pattern scores from every occupied cell.
//! The position sum deliberately sees each run once per stone in it, which
//! weights long runs superlinearly; move ordering and the evaluation rely on
//! this staying consistent.

use crate::board::{Player, SparseBoard};
use crate::config;

use super::patterns::{Pattern, PatternWeights};

/// Direction vectors for line analysis (4 directions, both ways walked).
const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

/// Defensive cap on line walks.
const MAX_WALK: i32 = 20;

/// Winning moves get half the integer range, leaving headroom for search
/// arithmetic around it.
pub const WIN_SCORE: i32 = i32::MAX / 2;

/// Raw line measurements around an anchor cell.
#[derive(Debug, Clone, Copy, Default)]
struct LineInfo {
    own_count: i32,
    left_space: i32,
    right_space: i32,
    has_break: bool,
}

/// Pattern-based evaluator for a fixed win length.
#[derive(Debug, Clone)]
pub struct Evaluator {
    weights: PatternWeights,
    win_length: i32,
}

impl Evaluator {
    #[must_use]
    pub fn new(win_length: i32) -> Self {
        Self {
            weights: PatternWeights::new(win_length),
            win_length,
        }
    }

    /// Walk from the anchor along `(dx, dy)`.
    ///
    /// Own stones extend the run; the first empty cell opens the side and
    /// may bridge a one-cell gap when another own stone follows it.
    /// Returns (own stones seen, space, bridged a gap).
    fn walk(
        board: &SparseBoard,
        x: i32,
        y: i32,
        dx: i32,
        dy: i32,
        player: Player,
        own_before: i32,
    ) -> (i32, i32, bool) {
        let mut own = 0;
        let mut space = 0;
        let mut bridged = false;

        let mut cx = x + dx;
        let mut cy = y + dy;
        let mut steps = 0;
        while steps < MAX_WALK {
            steps += 1;
            let cell = board.at(cx, cy);
            if cell == player {
                own += 1;
            } else if cell == Player::Empty {
                space += 1;
                // One-gap bridge: own stones behind, another own stone ahead.
                if !bridged && own_before + own > 0 && board.at(cx + dx, cy + dy) == player {
                    bridged = true;
                } else {
                    break;
                }
            } else {
                break;
            }
            cx += dx;
            cy += dy;
        }

        (own, space, bridged)
    }

    fn analyze_line_info(
        &self,
        board: &SparseBoard,
        x: i32,
        y: i32,
        dx: i32,
        dy: i32,
        player: Player,
    ) -> LineInfo {
        let anchor = i32::from(board.at(x, y) == player);

        let (right_own, right_space, right_break) = Self::walk(board, x, y, dx, dy, player, anchor);
        let (left_own, left_space, left_break) =
            Self::walk(board, x, y, -dx, -dy, player, anchor + right_own);

        LineInfo {
            own_count: anchor + right_own + left_own,
            left_space,
            right_space,
            has_break: right_break || left_break,
        }
    }

    fn analyze_line(
        &self,
        board: &SparseBoard,
        x: i32,
        y: i32,
        dx: i32,
        dy: i32,
        player: Player,
    ) -> Pattern {
        let info = self.analyze_line_info(board, x, y, dx, dy, player);
        let open = info.left_space > 0 && info.right_space > 0;
        Pattern {
            length: info.own_count,
            open,
            broken: info.has_break,
            score: self
                .weights
                .pattern_score(info.own_count, open, info.has_break),
        }
    }

    /// Patterns through `(x, y)` for `player`, one per direction, empty
    /// directions dropped.
    #[must_use]
    pub fn detect_patterns(
        &self,
        board: &SparseBoard,
        x: i32,
        y: i32,
        player: Player,
    ) -> Vec<Pattern> {
        DIRECTIONS
            .iter()
            .map(|&(dx, dy)| self.analyze_line(board, x, y, dx, dy, player))
            .filter(|p| p.length > 0)
            .collect()
    }

    /// Sum of own pattern scores at `(x, y)`, with a bonus when the move
    /// creates two or more open near-win runs at once.
    fn detect_forks(&self, board: &SparseBoard, x: i32, y: i32, player: Player) -> i32 {
        let patterns = self.detect_patterns(board, x, y, player);

        let mut threat_count = 0;
        let mut total = 0i32;
        for pattern in &patterns {
            if pattern.length >= self.win_length - 1 && pattern.open {
                threat_count += 1;
            }
            total = total.saturating_add(pattern.score);
        }

        if threat_count >= 2 {
            total.saturating_add(config::FORK_BONUS)
        } else {
            total
        }
    }

    /// Ordering score for placing `player` at the empty cell `(x, y)`.
    ///
    /// Winning moves return [`WIN_SCORE`]. Otherwise the score is the own
    /// pattern sum (plus fork bonus) and, as a blocking incentive, the
    /// opponent's near-win patterns through the same cell.
    #[must_use]
    pub fn evaluate_move(&self, board: &SparseBoard, x: i32, y: i32, player: Player) -> i32 {
        if board.is_empty(x, y) && board.would_win(x, y, player) {
            return WIN_SCORE;
        }

        let mut score = self.detect_forks(board, x, y, player);

        let opponent = player.opponent();
        for pattern in self.detect_patterns(board, x, y, opponent) {
            if pattern.length >= self.win_length - 1 {
                score = score.saturating_add(pattern.score);
            }
        }

        score
    }

    /// Static score of the whole position from `player`'s perspective.
    #[must_use]
    pub fn evaluate_position(&self, board: &SparseBoard, player: Player) -> i32 {
        let mut score = 0i32;

        for pos in board.occupied_positions() {
            let owner = board.at(pos.x, pos.y);
            let sum = self
                .detect_patterns(board, pos.x, pos.y, owner)
                .iter()
                .fold(0i32, |acc, p| acc.saturating_add(p.score));

            if owner == player {
                score = score.saturating_add(sum);
            } else {
                score = score.saturating_sub(sum);
            }
        }

        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(moves: &[(i32, i32, Player)]) -> SparseBoard {
        let mut board = SparseBoard::new(5);
        for &(x, y, player) in moves {
            board.make_move(x, y, player);
        }
        board
    }

    #[test]
    fn test_detects_open_three() {
        let board = board_with(&[
            (0, 0, Player::X),
            (1, 0, Player::X),
            (2, 0, Player::X),
        ]);

        let eval = Evaluator::new(5);
        let patterns = eval.detect_patterns(&board, 1, 0, Player::X);

        assert!(patterns.iter().any(|p| p.length == 3 && p.open));
    }

    #[test]
    fn test_blocked_three_is_closed() {
        let board = board_with(&[
            (-1, 0, Player::O),
            (0, 0, Player::X),
            (1, 0, Player::X),
            (2, 0, Player::X),
            (3, 0, Player::O),
        ]);

        let eval = Evaluator::new(5);
        let patterns = eval.detect_patterns(&board, 1, 0, Player::X);
        let three = patterns.iter().find(|p| p.length == 3).unwrap();
        assert!(!three.open);
        assert_eq!(three.score, PatternWeights::new(5).score(3, false));
    }

    #[test]
    fn test_detects_broken_run() {
        // X X _ X along the x axis; the anchor sees the bridge.
        let board = board_with(&[
            (0, 0, Player::X),
            (1, 0, Player::X),
            (3, 0, Player::X),
        ]);

        let eval = Evaluator::new(5);
        let patterns = eval.detect_patterns(&board, 1, 0, Player::X);
        assert!(patterns.iter().any(|p| p.broken && p.length == 3));
    }

    #[test]
    fn test_broken_run_scores_half() {
        let eval = Evaluator::new(5);

        let solid = board_with(&[
            (0, 0, Player::X),
            (1, 0, Player::X),
            (2, 0, Player::X),
        ]);
        let gapped = board_with(&[
            (0, 0, Player::X),
            (1, 0, Player::X),
            (3, 0, Player::X),
        ]);

        let solid_three = eval
            .detect_patterns(&solid, 1, 0, Player::X)
            .into_iter()
            .find(|p| p.length == 3)
            .unwrap();
        let broken_three = eval
            .detect_patterns(&gapped, 1, 0, Player::X)
            .into_iter()
            .find(|p| p.length == 3)
            .unwrap();

        assert_eq!(broken_three.score, solid_three.score / 2);
    }

    #[test]
    fn test_winning_move_scores_max() {
        let board = board_with(&[
            (0, 0, Player::X),
            (1, 0, Player::X),
            (2, 0, Player::X),
            (3, 0, Player::X),
        ]);

        let eval = Evaluator::new(5);
        assert_eq!(eval.evaluate_move(&board, 4, 0, Player::X), WIN_SCORE);
        assert_eq!(eval.evaluate_move(&board, -1, 0, Player::X), WIN_SCORE);
    }

    #[test]
    fn test_fork_bonus_applies() {
        // Placing at the crossing of two open three-stone runs creates two
        // open fours at once.
        let board = board_with(&[
            // horizontal: _ X X X ? ...
            (1, 0, Player::X),
            (2, 0, Player::X),
            (3, 0, Player::X),
            // vertical through (4, 0): ? X X X
            (4, 1, Player::X),
            (4, 2, Player::X),
            (4, 3, Player::X),
        ]);

        let eval = Evaluator::new(5);
        let fork_score = eval.evaluate_move(&board, 4, 0, Player::X);

        // A single open three extended to an open four.
        let single = board_with(&[
            (1, 0, Player::X),
            (2, 0, Player::X),
            (3, 0, Player::X),
        ]);
        let single_score = eval.evaluate_move(&single, 4, 0, Player::X);

        assert!(fork_score > single_score);
    }

    #[test]
    fn test_blocking_rewarded() {
        // A cell on the opponent's open four scores much higher than a
        // quiet cell nearby.
        let board = board_with(&[
            (0, 0, Player::O),
            (1, 0, Player::O),
            (2, 0, Player::O),
            (3, 0, Player::O),
            (0, 5, Player::X),
        ]);

        let eval = Evaluator::new(5);
        let block = eval.evaluate_move(&board, 4, 0, Player::X);
        let quiet = eval.evaluate_move(&board, 1, 5, Player::X);
        assert!(block > quiet);
    }

    #[test]
    fn test_position_evaluation_sign() {
        let board = board_with(&[
            (0, 0, Player::X),
            (1, 0, Player::X),
            (2, 0, Player::X),
            (9, 9, Player::O),
        ]);

        let eval = Evaluator::new(5);
        assert!(eval.evaluate_position(&board, Player::X) > 0);
        assert!(eval.evaluate_position(&board, Player::O) < 0);
    }

    #[test]
    fn test_position_evaluation_antisymmetric() {
        let board = board_with(&[
            (0, 0, Player::X),
            (1, 0, Player::X),
            (5, 5, Player::O),
            (5, 6, Player::O),
            (5, 7, Player::O),
        ]);

        let eval = Evaluator::new(5);
        let for_x = eval.evaluate_position(&board, Player::X);
        let for_o = eval.evaluate_position(&board, Player::O);
        assert_eq!(for_x, -for_o);
    }

    #[test]
    fn test_empty_board_evaluates_to_zero() {
        let board = SparseBoard::new(5);
        let eval = Evaluator::new(5);
        assert_eq!(eval.evaluate_position(&board, Player::X), 0);
    }
}
