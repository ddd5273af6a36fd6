//! Unbounded-board k-in-a-row engine
//!
//! A decision core for generalized gomoku on the infinite integer lattice:
//! first player to line up N stones (default 5) wins. Given a board, the
//! side to move and a soft time budget, the engine returns a legal move
//! together with search diagnostics.
//!
//! # Architecture
//!
//! - [`board`]: sparse board with incremental Zobrist hashing and undo
//! - [`eval`]: pattern weights and line-based evaluation
//! - [`movegen`]: candidate generation and fast tactical probes
//! - [`search`]: threat solver and transposition table
//! - [`engine`]: the search engine tying everything together
//! - [`wire`]: typed JSON protocol for the `omok-web` shell
//!
//! # Quick start
//!
//! ```
//! use omok::{Player, SearchEngine, SparseBoard};
//!
//! let mut board = SparseBoard::new(5);
//! board.make_move(0, 0, Player::X);
//!
//! let mut engine = SearchEngine::new(5);
//! let mv = engine.find_best_move(&board, Player::O, 500);
//! assert!(board.is_empty(mv.x, mv.y));
//! ```
//!
//! # Decision priority
//!
//! 1. Immediate winning move
//! 2. Block of the opponent's immediate win
//! 3. Block of a dangerous open threat
//! 4. Forced win found by the threat solver
//! 5. Iterative-deepening negamax with alpha-beta, LMR, quiescence and a
//!    transposition table

pub mod board;
pub mod config;
pub mod engine;
pub mod eval;
pub mod movegen;
pub mod search;
pub mod wire;

// Re-export commonly used types for convenience
pub use board::{BoundingBox, HistoryMove, Player, Pos, SparseBoard};
pub use engine::{DecisionType, SearchEngine, SearchStats};
pub use movegen::Move;
