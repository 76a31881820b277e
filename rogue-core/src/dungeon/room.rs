//! Rectangular rooms carved during map generation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position on the dungeon grid.
///
/// Signed so that probes just outside the map (e.g. `x = -1`) can be
/// represented and rejected by bounds checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset this position by a delta.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// max(|dx|, |dy|), the number of king moves between two cells.
    pub fn chebyshev(self, other: Position) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Straight-line distance.
    pub fn euclidean(self, other: Position) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }

    /// The four orthogonal neighbours.
    pub fn neighbors4(self) -> [Position; 4] {
        [
            self.offset(1, 0),
            self.offset(-1, 0),
            self.offset(0, 1),
            self.offset(0, -1),
        ]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// An axis-aligned room. `x1 < x2` and `y1 < y2`; the boundary row and
/// column stay wall, only the interior is carved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Room {
    /// A room with its top-left corner at `(x, y)`.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        debug_assert!(width > 0 && height > 0);
        Self {
            x1: x,
            y1: y,
            x2: x + width,
            y2: y + height,
        }
    }

    /// Integer midpoint (floor division).
    pub fn center(&self) -> Position {
        Position::new(
            (self.x1 + self.x2).div_euclid(2),
            (self.y1 + self.y2).div_euclid(2),
        )
    }

    /// Overlap test, inclusive of edges: rooms that merely share a wall
    /// still intersect.
    pub fn intersects(&self, other: &Room) -> bool {
        self.x1 <= other.x2 && self.x2 >= other.x1 && self.y1 <= other.y2 && self.y2 >= other.y1
    }

    /// Whether a position lies inside the carved interior.
    pub fn contains(&self, pos: Position) -> bool {
        pos.x > self.x1 && pos.x < self.x2 && pos.y > self.y1 && pos.y < self.y2
    }

    /// Every interior cell, column by column.
    pub fn interior(&self) -> impl Iterator<Item = Position> + '_ {
        (self.x1 + 1..self.x2).flat_map(move |x| (self.y1 + 1..self.y2).map(move |y| Position::new(x, y)))
    }
}
