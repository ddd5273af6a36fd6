//! Sparse board with incremental Zobrist hashing and undo
//!
//! Cells live in a hash map keyed by position, so the board has no edges:
//! any `(i32, i32)` coordinate is playable. The board tracks a tight
//! bounding box of the occupied area, a 64-bit Zobrist digest updated on
//! every make/undo, and the ordered move history.

use std::collections::HashMap;

use crate::board::{Player, Pos, ZobristKeys};

/// The four line directions; their negations give the other four half-lines.
const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

/// Defensive cap on line walks. Real lines never get close to this long.
const MAX_WALK: i32 = 20;

/// Tight axis-aligned rectangle around the occupied cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl BoundingBox {
    /// Degenerate box around a single cell.
    fn at(x: i32, y: i32) -> Self {
        Self {
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
        }
    }

    fn expand(&mut self, x: i32, y: i32) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    /// True if `(x, y)` lies on the rectangle's border.
    fn on_boundary(&self, x: i32, y: i32) -> bool {
        x == self.min_x || x == self.max_x || y == self.min_y || y == self.max_y
    }

    #[must_use]
    pub fn width(&self) -> i32 {
        self.max_x - self.min_x + 1
    }

    #[must_use]
    pub fn height(&self) -> i32 {
        self.max_y - self.min_y + 1
    }
}

/// One entry of the move history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryMove {
    pub x: i32,
    pub y: i32,
    pub player: Player,
}

/// Sparse board over the infinite lattice.
///
/// Invariants:
/// - `hash` equals the XOR of the Zobrist keys of all occupied cells.
/// - `bbox` is `None` on an empty board and tight otherwise.
/// - `history` lists the occupied cells in the order they were played.
#[derive(Debug, Clone)]
pub struct SparseBoard {
    win_length: i32,
    cells: HashMap<Pos, Player>,
    bbox: Option<BoundingBox>,
    hash: u64,
    history: Vec<HistoryMove>,
    zobrist: ZobristKeys,
}

impl SparseBoard {
    /// Create an empty board that wins with `win_length` in a row.
    #[must_use]
    pub fn new(win_length: i32) -> Self {
        debug_assert!(win_length >= 3);
        Self {
            win_length,
            cells: HashMap::new(),
            bbox: None,
            hash: 0,
            history: Vec::new(),
            zobrist: ZobristKeys::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn win_length(&self) -> i32 {
        self.win_length
    }

    /// Place `player` at `(x, y)`.
    ///
    /// Returns `false` without changing the board when the cell is occupied
    /// or `player` is `Empty`.
    pub fn make_move(&mut self, x: i32, y: i32, player: Player) -> bool {
        let pos = Pos::new(x, y);
        if player == Player::Empty || self.cells.contains_key(&pos) {
            return false;
        }

        self.cells.insert(pos, player);
        match self.bbox.as_mut() {
            Some(bbox) => bbox.expand(x, y),
            None => self.bbox = Some(BoundingBox::at(x, y)),
        }
        self.hash ^= self.zobrist.key(pos, player);
        self.history.push(HistoryMove { x, y, player });
        true
    }

    /// Remove the stone at `(x, y)`. No-op on an empty cell.
    ///
    /// Only the move at the tail of the history may be undone; removing an
    /// interior cell would leave the history inconsistent with the cells.
    pub fn undo_move(&mut self, x: i32, y: i32) {
        let pos = Pos::new(x, y);
        let Some(player) = self.cells.remove(&pos) else {
            return;
        };

        self.hash ^= self.zobrist.key(pos, player);

        match self.history.last() {
            Some(last) if last.x == x && last.y == y => {
                self.history.pop();
            }
            _ => debug_assert!(false, "undo_move on a non-tail cell"),
        }

        // The box only needs recomputing when a border cell goes away.
        if let Some(bbox) = self.bbox {
            if self.cells.is_empty() {
                self.bbox = None;
            } else if bbox.on_boundary(x, y) {
                self.bbox = self.recompute_bbox();
            }
        }
    }

    fn recompute_bbox(&self) -> Option<BoundingBox> {
        let mut iter = self.cells.keys();
        let first = iter.next()?;
        let mut bbox = BoundingBox::at(first.x, first.y);
        for pos in iter {
            bbox.expand(pos.x, pos.y);
        }
        Some(bbox)
    }

    /// Occupant of `(x, y)`, `Empty` when unoccupied.
    #[inline]
    #[must_use]
    pub fn at(&self, x: i32, y: i32) -> Player {
        self.cells
            .get(&Pos::new(x, y))
            .copied()
            .unwrap_or(Player::Empty)
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self, x: i32, y: i32) -> bool {
        self.at(x, y) == Player::Empty
    }

    #[inline]
    #[must_use]
    pub fn is_board_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Count consecutive `player` stones along `(dx, dy)` starting one step
    /// from `(x, y)`, capped at `MAX_WALK`.
    fn count_direction(&self, x: i32, y: i32, dx: i32, dy: i32, player: Player) -> i32 {
        let mut count = 0;
        let mut pos = Pos::new(x + dx, y + dy);
        while count < MAX_WALK && self.at(pos.x, pos.y) == player {
            count += 1;
            pos = pos.step(dx, dy);
        }
        count
    }

    /// Stones in a line through `(x, y)`: the anchor once, plus both
    /// half-directions.
    fn count_line(&self, x: i32, y: i32, dx: i32, dy: i32, player: Player) -> i32 {
        1 + self.count_direction(x, y, dx, dy, player)
            + self.count_direction(x, y, -dx, -dy, player)
    }

    /// True if `(x, y)` is part of a winning run for `player`.
    #[must_use]
    pub fn is_win(&self, x: i32, y: i32, player: Player) -> bool {
        if self.at(x, y) != player {
            return false;
        }
        DIRECTIONS
            .iter()
            .any(|&(dx, dy)| self.count_line(x, y, dx, dy, player) >= self.win_length)
    }

    /// True if placing `player` at the (empty) cell `(x, y)` would complete
    /// a winning run.
    #[must_use]
    pub fn would_win(&self, x: i32, y: i32, player: Player) -> bool {
        DIRECTIONS
            .iter()
            .any(|&(dx, dy)| self.count_line(x, y, dx, dy, player) >= self.win_length)
    }

    /// True if any occupied cell is a win for its occupant.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.cells
            .iter()
            .any(|(pos, &player)| self.is_win(pos.x, pos.y, player))
    }

    /// Snapshot of all occupied positions, order unspecified.
    #[must_use]
    pub fn occupied_positions(&self) -> Vec<Pos> {
        self.cells.keys().copied().collect()
    }

    #[inline]
    #[must_use]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Tight bounding box, `None` while the board is empty.
    #[inline]
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bbox
    }

    #[inline]
    #[must_use]
    pub fn history(&self) -> &[HistoryMove] {
        &self.history
    }
}
