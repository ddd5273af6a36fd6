//! Transposition table for caching search results
//!
//! Direct-mapped, fixed-size: each position hashes to exactly one slot, and
//! collisions are resolved by a depth-preferred replacement policy. Scores
//! are narrowed to 16 bits in the slot (clamped, not wrapped), so probes of
//! winning lines come back capped but correctly ordered.

use crate::movegen::Move;

/// How the stored score bounds the true value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtFlag {
    /// The search completed inside the window.
    Exact,
    /// Beta cutoff: the true score is at least the stored one.
    LowerBound,
    /// Fail-low: the true score is at most the stored one.
    UpperBound,
}

/// One table slot.
#[derive(Debug, Clone, Copy)]
pub struct TtEntry {
    /// Full key, stored for verification against index collisions.
    pub zobrist: u64,
    pub score: i16,
    pub depth: i8,
    pub flag: TtFlag,
    /// Move that produced the score or caused the cutoff.
    pub best_move: Move,
    /// Iteration counter at store time.
    pub age: u32,
}

/// Table usage snapshot.
#[derive(Debug, Clone, Copy)]
pub struct TtStats {
    pub size: usize,
    pub used: usize,
}

/// Direct-mapped transposition table.
pub struct TranspositionTable {
    entries: Vec<Option<TtEntry>>,
    size: usize,
    age: u32,
    used: usize,
}

impl TranspositionTable {
    /// Create a table with the largest power-of-two slot count that fits in
    /// `size_mb` megabytes.
    #[must_use]
    pub fn new(size_mb: usize) -> Self {
        let entry_size = std::mem::size_of::<Option<TtEntry>>();
        let target = (size_mb * 1024 * 1024) / entry_size;

        let mut size = 1usize;
        while size * 2 <= target {
            size <<= 1;
        }
        let size = size.max(1024);

        Self {
            entries: vec![None; size],
            size,
            age: 0,
            used: 0,
        }
    }

    #[inline]
    fn index(&self, key: u64) -> usize {
        (key % self.size as u64) as usize
    }

    /// Look up `key` for a search at `depth` with window `(alpha, beta)`.
    ///
    /// Returns the stored score and move only when the entry is for this
    /// key, at least as deep, and its flag is usable against the window:
    /// `Exact` always, `LowerBound` when the score fails high, `UpperBound`
    /// when it fails low. An unusable entry still serves its move through
    /// [`pv_move`](Self::pv_move).
    #[must_use]
    pub fn probe(&self, key: u64, depth: i32, alpha: i32, beta: i32) -> Option<(i32, Move)> {
        let entry = self.entries[self.index(key)]?;
        if entry.zobrist != key || i32::from(entry.depth) < depth {
            return None;
        }

        let score = i32::from(entry.score);
        match entry.flag {
            TtFlag::Exact => Some((score, entry.best_move)),
            TtFlag::LowerBound if score >= beta => Some((score, entry.best_move)),
            TtFlag::UpperBound if score <= alpha => Some((score, entry.best_move)),
            _ => None,
        }
    }

    /// Best move for `key`, usable for ordering even when the score is not.
    #[must_use]
    pub fn pv_move(&self, key: u64) -> Option<Move> {
        let entry = self.entries[self.index(key)]?;
        if entry.zobrist == key && !(entry.best_move.x == 0 && entry.best_move.y == 0) {
            Some(entry.best_move)
        } else {
            None
        }
    }

    /// Store a result. Depth-preferred: an occupied slot is only replaced by
    /// an equally deep or deeper search.
    pub fn store(&mut self, key: u64, score: i32, depth: i32, flag: TtFlag, best_move: Move) {
        let idx = self.index(key);

        let replace = match &self.entries[idx] {
            None => true,
            Some(existing) => i32::from(existing.depth) <= depth,
        };
        if !replace {
            return;
        }

        if self.entries[idx].is_none() {
            self.used += 1;
        }
        self.entries[idx] = Some(TtEntry {
            zobrist: key,
            score: score.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16,
            depth: depth.clamp(0, i32::from(i8::MAX)) as i8,
            flag,
            best_move,
            age: self.age,
        });
    }

    /// Advance the age counter; called once per deepening iteration.
    pub fn bump_age(&mut self) {
        self.age += 1;
    }

    /// Zero all slots and counters.
    pub fn clear(&mut self) {
        self.entries.fill(None);
        self.age = 0;
        self.used = 0;
    }

    #[must_use]
    pub fn stats(&self) -> TtStats {
        TtStats {
            size: self.size,
            used: self.used,
        }
    }
}
