//! Zobrist keys over the unbounded coordinate plane
//!
//! A fixed-size key table cannot cover an infinite board, so keys are
//! generated on demand: each (position, player) pair seeds its own ChaCha
//! stream, and the first draw is the key. The seed is a pure function of the
//! coordinates, so the same cell always yields the same key within a process,
//! and a lazy cache avoids re-seeding on the hot make/undo path.

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::board::{Player, Pos};

/// Nominal coordinate range of interest, [-1000, 1000] on both axes.
/// Coordinates outside still produce stable keys; they just share the
/// packing space with far-away cells.
const COORD_RANGE: i64 = 2001;
const COORD_OFFSET: i64 = 1000;

/// Deterministic per-(position, player) 64-bit key source.
///
/// `key(_, Empty)` is always 0. Issued keys never change for the life of
/// the source; the cache grows monotonically.
#[derive(Debug, Clone, Default)]
pub struct ZobristKeys {
    cache: HashMap<u64, u64>,
}

impl ZobristKeys {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Key for placing `player` at `pos`.
    #[must_use]
    pub fn key(&mut self, pos: Pos, player: Player) -> u64 {
        if player == Player::Empty {
            return 0;
        }

        let packed = Self::pack(pos, player);
        *self
            .cache
            .entry(packed)
            .or_insert_with(|| ChaCha8Rng::seed_from_u64(packed).gen())
    }

    /// Stable seed for a (position, player) pair.
    fn pack(pos: Pos, player: Player) -> u64 {
        let index =
            (i64::from(pos.x) + COORD_OFFSET) * COORD_RANGE + (i64::from(pos.y) + COORD_OFFSET);
        let player_index: u64 = match player {
            Player::X => 1,
            Player::O => 2,
            Player::Empty => 0,
        };
        ((index as u64) << 2) | player_index
    }
}
