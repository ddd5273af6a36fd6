//! Position evaluation: pattern weights and the line-based evaluator

pub mod heuristic;
pub mod patterns;

pub use heuristic::Evaluator;
pub use patterns::{Pattern, PatternWeights};
