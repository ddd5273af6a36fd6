//! Engine tuning defaults

/// Default win length (stones in a row).
pub const WIN_LENGTH: i32 = 5;
/// Chebyshev radius around occupied cells for candidate generation.
pub const CANDIDATE_RADIUS: i32 = 2;
/// Candidate list cap after scoring and sorting.
pub const TOP_K_CANDIDATES: usize = 30;
/// Iterative deepening depth cap.
pub const MAX_DEPTH: i32 = 12;
/// Transposition table budget in megabytes.
pub const TT_SIZE_MB: usize = 128;
/// Default soft time budget per move, in milliseconds.
pub const DEFAULT_TIME_MS: u64 = 5000;
/// Ply cap for the threat solver.
pub const THREAT_SOLVER_MAX_DEPTH: i32 = 4;
/// Bonus for moves that create two or more open near-win patterns.
pub const FORK_BONUS: i32 = 5000;
/// Consecutive stable iterations before the deepening loop stops early.
pub const STABLE_ITERATIONS_THRESHOLD: i32 = 2;
/// Score drift below which an iteration counts as stable.
pub const STABLE_SCORE_THRESHOLD: i32 = 50;
