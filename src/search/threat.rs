//! Depth-limited proof search over direct threats
//!
//! A direct threat is a move that leaves an open run one stone short of the
//! win length; the opponent must answer it or lose next ply. The solver
//! alternates attacker threats with the defender's forced replies and
//! reports a win only when every reply line ends in another forced position.
//! It mutates the board in place and restores it exactly on exit.

use crate::board::{Player, SparseBoard};
use crate::movegen::{Move, MoveGenerator};

const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

/// Defensive cap on line walks.
const MAX_WALK: i32 = 20;

/// Forced-win solver for a fixed win length.
pub struct ThreatSolver {
    movegen: MoveGenerator,
    win_length: i32,
}

impl ThreatSolver {
    #[must_use]
    pub fn new(win_length: i32) -> Self {
        Self {
            movegen: MoveGenerator::new(win_length),
            win_length,
        }
    }

    /// Would placing `player` at the empty cell `(x, y)` create an open run
    /// of exactly `N-1`?
    fn is_direct_threat(&self, board: &SparseBoard, x: i32, y: i32, player: Player) -> bool {
        for &(dx, dy) in &DIRECTIONS {
            let mut count = 1;

            let mut steps = 0;
            let (mut cx, mut cy) = (x + dx, y + dy);
            while steps < MAX_WALK && board.at(cx, cy) == player {
                count += 1;
                cx += dx;
                cy += dy;
                steps += 1;
            }
            let right_open = board.at(cx, cy) == Player::Empty;

            steps = 0;
            let (mut cx, mut cy) = (x - dx, y - dy);
            while steps < MAX_WALK && board.at(cx, cy) == player {
                count += 1;
                cx -= dx;
                cy -= dy;
                steps += 1;
            }
            let left_open = board.at(cx, cy) == Player::Empty;

            if count == self.win_length - 1 && left_open && right_open {
                return true;
            }
        }
        false
    }

    /// Candidate moves of `player` that are direct threats.
    fn generate_threats(&self, board: &SparseBoard, player: Player) -> Vec<Move> {
        self.movegen
            .generate_candidates(board, player)
            .into_iter()
            .filter(|m| self.is_direct_threat(board, m.x, m.y, player))
            .collect()
    }

    /// The defender's forced replies: occupy one of the attacker's threat
    /// squares, or block an attacker run that is already one from winning.
    fn defensive_moves(&self, board: &SparseBoard, player: Player) -> Vec<Move> {
        let attacker = player.opponent();

        let mut defenses = self.generate_threats(board, attacker);
        if let Some(block) = self.movegen.check_immediate_block(board, player) {
            defenses.push(block);
        }
        defenses
    }

    fn search_forced_win(
        &self,
        board: &mut SparseBoard,
        player: Player,
        depth: i32,
        max_depth: i32,
    ) -> bool {
        if depth >= max_depth {
            return false;
        }

        if self.movegen.check_immediate_win(board, player).is_some() {
            return true;
        }

        let threats = self.generate_threats(board, player);
        for threat in threats {
            if !board.make_move(threat.x, threat.y, player) {
                continue;
            }

            let opponent = player.opponent();
            let defenses = self.defensive_moves(board, opponent);

            if defenses.is_empty() {
                board.undo_move(threat.x, threat.y);
                return true;
            }

            let mut all_defenses_fail = true;
            for defense in &defenses {
                if !board.make_move(defense.x, defense.y, opponent) {
                    continue;
                }
                if !self.search_forced_win(board, player, depth + 1, max_depth) {
                    all_defenses_fail = false;
                }
                board.undo_move(defense.x, defense.y);
                if !all_defenses_fail {
                    break;
                }
            }

            board.undo_move(threat.x, threat.y);

            if all_defenses_fail {
                return true;
            }
        }

        false
    }

    /// Find a move that starts a forced win within `max_depth` threat plies.
    ///
    /// The board is mutated during the search and restored before returning.
    #[must_use]
    pub fn find_forced_win(
        &self,
        board: &mut SparseBoard,
        player: Player,
        max_depth: i32,
    ) -> Option<Move> {
        if let Some(win) = self.movegen.check_immediate_win(board, player) {
            return Some(win);
        }

        let threats = self.generate_threats(board, player);
        for threat in threats {
            if !board.make_move(threat.x, threat.y, player) {
                continue;
            }

            let opponent = player.opponent();
            let defenses = self.defensive_moves(board, opponent);

            let mut all_defenses_fail = true;
            for defense in &defenses {
                if !board.make_move(defense.x, defense.y, opponent) {
                    continue;
                }
                if !self.search_forced_win(board, player, 1, max_depth) {
                    all_defenses_fail = false;
                }
                board.undo_move(defense.x, defense.y);
                if !all_defenses_fail {
                    break;
                }
            }

            board.undo_move(threat.x, threat.y);

            if all_defenses_fail {
                return Some(threat);
            }
        }

        None
    }
}
