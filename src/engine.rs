//! Search engine integrating all decision components
//!
//! A call runs a dispatch chain of increasingly expensive stages:
//!
//! 1. **Immediate win**: complete an own run right now
//! 2. **Immediate block**: deny the opponent's completed run
//! 3. **Dangerous threat**: block an open run before it becomes unstoppable
//! 4. **Threat solver**: depth-limited proof of a forced win
//! 5. **Negamax**: iterative-deepening alpha-beta with LMR, quiescence and
//!    a transposition table
//!
//! The caller's board is cloned at entry; the working copy is mutated and
//! undone during search, and the caller's board is never touched.

use std::time::Instant;

use tracing::debug;

use crate::board::{Player, SparseBoard};
use crate::config;
use crate::eval::Evaluator;
use crate::movegen::{Move, MoveGenerator};
use crate::search::{ThreatSolver, TranspositionTable, TtFlag, TtStats};

/// Alpha-beta window bound; negation-safe.
const SCORE_INF: i32 = i32::MAX - 1;

/// Score of a decided game, half the integer range for arithmetic headroom.
pub const SCORE_WIN: i32 = i32::MAX / 2;

/// Principal variation length cap.
const PV_LENGTH: usize = 20;

/// Ply cap for the quiescence extension.
const QUIESCENCE_MAX_DEPTH: i32 = 4;

/// Candidate ordering scores above this magnitude count as tactical in
/// quiescence.
const TACTICAL_THRESHOLD: i32 = 1000;

/// Which stage of the dispatch chain produced the move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionType {
    ImmediateWin,
    ImmediateBlock,
    DangerousThreat,
    ThreatSolver,
    Negamax,
}

/// Statistics of the last `find_best_move` call.
#[derive(Debug, Clone)]
pub struct SearchStats {
    /// Negamax and quiescence nodes visited.
    pub nodes_searched: u64,
    /// Deepest fully completed iteration.
    pub depth_reached: i32,
    /// Elapsed wall time in milliseconds.
    pub time_ms: u64,
    /// Stage that produced the returned move.
    pub decision: DecisionType,
    /// Root score of the last completed iteration.
    pub final_score: i32,
    /// Principal variation, up to 20 plies.
    pub pv: Vec<Move>,
}

impl Default for SearchStats {
    fn default() -> Self {
        Self {
            nodes_searched: 0,
            depth_reached: 0,
            time_ms: 0,
            decision: DecisionType::Negamax,
            final_score: 0,
            pv: Vec::new(),
        }
    }
}

/// Decision core for one win length.
///
/// The engine owns its transposition table for its whole life; `clear_tt`
/// resets it between games. Calls are synchronous and must be serialized by
/// the caller.
pub struct SearchEngine {
    movegen: MoveGenerator,
    evaluator: Evaluator,
    threat_solver: ThreatSolver,
    tt: TranspositionTable,
    stats: SearchStats,
    win_length: i32,
    start: Instant,
    budget_ms: u64,
    timeout: bool,
}

impl SearchEngine {
    #[must_use]
    pub fn new(win_length: i32) -> Self {
        Self {
            movegen: MoveGenerator::new(win_length),
            evaluator: Evaluator::new(win_length),
            threat_solver: ThreatSolver::new(win_length),
            tt: TranspositionTable::new(config::TT_SIZE_MB),
            stats: SearchStats::default(),
            win_length,
            start: Instant::now(),
            budget_ms: config::DEFAULT_TIME_MS,
            timeout: false,
        }
    }

    /// Statistics of the most recent call.
    #[must_use]
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    #[must_use]
    pub fn tt_stats(&self) -> TtStats {
        self.tt.stats()
    }

    /// Drop all cached search results; call between games.
    pub fn clear_tt(&mut self) {
        self.tt.clear();
    }

    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn record_shortcut(&mut self, mv: Move, decision: DecisionType, score: i32) -> Move {
        self.stats.time_ms = self.elapsed_ms();
        self.stats.decision = decision;
        self.stats.final_score = score;
        debug!(?decision, x = mv.x, y = mv.y, "tactical shortcut");
        mv
    }

    /// Any run of length `N-2` or longer on either side?
    /// Gates the threat solver, which is pointless on quiet boards.
    fn has_threats(&self, board: &SparseBoard, player: Player) -> bool {
        let min_length = (self.win_length - 2).max(1);
        let opponent = player.opponent();

        for pos in board.occupied_positions() {
            let owner = board.at(pos.x, pos.y);
            if owner != player && owner != opponent {
                continue;
            }
            let patterns = self.evaluator.detect_patterns(board, pos.x, pos.y, owner);
            if patterns.iter().any(|p| p.length >= min_length) {
                return true;
            }
        }
        false
    }

    /// Pick a move for `player` within a soft `time_ms` budget.
    ///
    /// Always returns a legal move on a non-terminal board; statistics for
    /// the call are available through [`stats`](Self::stats).
    pub fn find_best_move(&mut self, board: &SparseBoard, player: Player, time_ms: u64) -> Move {
        self.stats = SearchStats::default();
        self.timeout = false;
        self.start = Instant::now();
        self.budget_ms = time_ms;

        let mut board = board.clone();
        let moves_made = board.history().len();

        if let Some(win) = self.movegen.check_immediate_win(&board, player) {
            return self.record_shortcut(win, DecisionType::ImmediateWin, SCORE_WIN);
        }
        if let Some(block) = self.movegen.check_immediate_block(&board, player) {
            return self.record_shortcut(block, DecisionType::ImmediateBlock, SCORE_WIN - 1);
        }
        if let Some(block) = self.movegen.check_dangerous_threat(&board, player) {
            return self.record_shortcut(block, DecisionType::DangerousThreat, SCORE_WIN - 2);
        }
        if moves_made >= 4 && self.has_threats(&board, player) {
            if let Some(forced) = self.threat_solver.find_forced_win(
                &mut board,
                player,
                config::THREAT_SOLVER_MAX_DEPTH,
            ) {
                return self.record_shortcut(forced, DecisionType::ThreatSolver, SCORE_WIN);
            }
        }

        self.stats.decision = DecisionType::Negamax;

        let mut best_move: Option<Move> = None;
        let mut previous_best = Move::new(0, 0, 0);
        let mut previous_score = 0;
        let mut stable_iterations = 0;

        // Shallow boards cannot support deep lines; cap the effort early on.
        let mut max_depth = config::MAX_DEPTH;
        if moves_made < 6 {
            max_depth = max_depth.min(6);
        } else if moves_made < 12 {
            max_depth = max_depth.min(8);
        }

        for depth in 1..=max_depth {
            if self.timeout || self.elapsed_ms() >= self.budget_ms {
                self.timeout = true;
                break;
            }

            let mut pv = [Move::new(0, 0, 0); PV_LENGTH];
            let score = self.negamax(&mut board, depth, -SCORE_INF, SCORE_INF, player, &mut pv, 0);

            // A timed-out iteration is discarded; the previous result stands.
            if !self.timeout && board.is_empty(pv[0].x, pv[0].y) {
                best_move = Some(pv[0]);
                self.stats.depth_reached = depth;
                self.stats.pv.clear();
                for &mv in pv.iter().take((depth as usize).min(PV_LENGTH)) {
                    if mv.x == 0 && mv.y == 0 {
                        break;
                    }
                    self.stats.pv.push(mv);
                }

                debug!(
                    depth,
                    score,
                    nodes = self.stats.nodes_searched,
                    "iteration complete"
                );

                if depth >= 3
                    && (pv[0].x, pv[0].y) == (previous_best.x, previous_best.y)
                    && (score - previous_score).abs() < config::STABLE_SCORE_THRESHOLD
                {
                    stable_iterations += 1;
                    if stable_iterations >= config::STABLE_ITERATIONS_THRESHOLD {
                        break;
                    }
                } else if depth >= 3 {
                    stable_iterations = 0;
                }

                previous_best = pv[0];
                previous_score = score;
            }

            self.tt.bump_age();
        }

        self.stats.time_ms = self.elapsed_ms();
        self.stats.final_score = previous_score;

        if let Some(mv) = best_move {
            if board.is_empty(mv.x, mv.y) {
                return mv;
            }
        }
        self.fallback_move(&board, player)
    }

    /// Last line of defense: any empty candidate, any empty neighbour of a
    /// stone, or the origin. Keeps the "always a legal move" contract even
    /// if the search produced nothing usable.
    fn fallback_move(&self, board: &SparseBoard, player: Player) -> Move {
        for mv in self.movegen.generate_candidates(board, player) {
            if board.is_empty(mv.x, mv.y) {
                return mv;
            }
        }

        for pos in board.occupied_positions() {
            for dx in -2..=2 {
                for dy in -2..=2 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    if board.is_empty(pos.x + dx, pos.y + dy) {
                        return Move::new(pos.x + dx, pos.y + dy, 0);
                    }
                }
            }
        }

        Move::new(0, 0, 0)
    }

    /// Score a finished position: a completed run on the history tail is a
    /// win for whoever played it, anything else falls back to static
    /// evaluation.
    fn evaluate_terminal(&self, board: &SparseBoard, player: Player) -> i32 {
        if let Some(last) = board.history().last() {
            if board.is_win(last.x, last.y, last.player) {
                return if last.player == player {
                    SCORE_WIN
                } else {
                    -SCORE_WIN
                };
            }
        }
        self.evaluator.evaluate_position(board, player)
    }

    /// Bring the table move to the front, keep the rest sorted by their
    /// ordering scores.
    fn order_moves(moves: &mut [Move], pv_move: Option<Move>) {
        if let Some(pv) = pv_move {
            if let Some(idx) = moves.iter().position(|m| m.x == pv.x && m.y == pv.y) {
                moves.swap(0, idx);
                moves[1..].sort_unstable_by(|a, b| b.score.cmp(&a.score));
                return;
            }
        }
        moves.sort_unstable_by(|a, b| b.score.cmp(&a.score));
    }

    #[allow(clippy::too_many_arguments)]
    fn negamax(
        &mut self,
        board: &mut SparseBoard,
        depth: i32,
        mut alpha: i32,
        beta: i32,
        player: Player,
        pv: &mut [Move; PV_LENGTH],
        pv_index: usize,
    ) -> i32 {
        self.stats.nodes_searched += 1;

        if self.timeout {
            return 0;
        }
        // Poll the clock every 1024 nodes; the flag aborts deeper work.
        if self.stats.nodes_searched & 1023 == 0 && self.elapsed_ms() >= self.budget_ms {
            self.timeout = true;
            return 0;
        }

        let hash = board.hash();
        let alpha_orig = alpha;

        if let Some((score, best)) = self.tt.probe(hash, depth, alpha, beta) {
            if pv_index < PV_LENGTH {
                pv[pv_index] = best;
            }
            return score;
        }

        if depth == 0 || board.is_terminal() {
            return self.quiescence(board, alpha, beta, player, 0);
        }

        let mut moves = self.movegen.generate_candidates(board, player);
        if moves.is_empty() {
            return self.evaluator.evaluate_position(board, player);
        }

        let pv_move = self.tt.pv_move(hash);
        Self::order_moves(&mut moves, pv_move);

        let mut best_score = -SCORE_INF;
        let mut best_move = Move::new(0, 0, 0);
        let mut move_found = false;

        for (i, &mv) in moves.iter().enumerate() {
            if !board.is_empty(mv.x, mv.y) {
                continue;
            }
            move_found = true;
            board.make_move(mv.x, mv.y, player);
            let opponent = player.opponent();

            // Late-move reduction: children far down the ordering get a
            // shallower look, deeper cuts the later and deeper we are, one
            // extra ply off moves the evaluator actively dislikes.
            let mut reduction = 0;
            if depth > 2 {
                if i > 3 {
                    reduction = 1;
                }
                if i > 6 && depth > 4 {
                    reduction = 2;
                }
                if i > 10 && depth > 6 {
                    reduction = 3;
                }
                if mv.score < -TACTICAL_THRESHOLD {
                    reduction += 1;
                }
                reduction = reduction.min(depth - 1);
            }

            let mut score = -self.negamax(
                board,
                depth - 1 - reduction,
                -beta,
                -alpha,
                opponent,
                pv,
                pv_index + 1,
            );

            // A reduced child that raised alpha gets a full-depth re-search.
            if reduction > 0 && score > alpha {
                score = -self.negamax(board, depth - 1, -beta, -alpha, opponent, pv, pv_index + 1);
            }

            board.undo_move(mv.x, mv.y);

            // An aborted subtree returns garbage; do not let it reach the
            // table or the PV.
            if self.timeout {
                return 0;
            }

            if score > best_score {
                best_score = score;
                best_move = mv;
                if pv_index < PV_LENGTH {
                    pv[pv_index] = mv;
                }
            }

            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }

        if !move_found {
            return self.evaluator.evaluate_position(board, player);
        }

        let flag = if best_score <= alpha_orig {
            TtFlag::UpperBound
        } else if best_score >= beta {
            TtFlag::LowerBound
        } else {
            TtFlag::Exact
        };
        self.tt.store(hash, best_score, depth, flag, best_move);

        best_score
    }

    /// Horizon extension over tactical moves only.
    fn quiescence(
        &mut self,
        board: &mut SparseBoard,
        mut alpha: i32,
        beta: i32,
        player: Player,
        depth: i32,
    ) -> i32 {
        self.stats.nodes_searched += 1;

        if self.stats.nodes_searched & 1023 == 0 && self.elapsed_ms() >= self.budget_ms {
            self.timeout = true;
        }
        if self.timeout || depth > QUIESCENCE_MAX_DEPTH {
            return self.evaluator.evaluate_position(board, player);
        }

        if board.is_terminal() {
            return self.evaluate_terminal(board, player);
        }

        let stand_pat = self.evaluator.evaluate_position(board, player);
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        let candidates = self.movegen.generate_candidates(board, player);
        for mv in candidates {
            if mv.score.abs() <= TACTICAL_THRESHOLD {
                continue;
            }
            if !board.make_move(mv.x, mv.y, player) {
                continue;
            }
            let score = -self.quiescence(board, -beta, -alpha, player.opponent(), depth + 1);
            board.undo_move(mv.x, mv.y);

            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }

        alpha
    }
}
