//! Grid positions and cardinal movement.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A `(row, col)` location on the world grid.
///
/// Row 0 is the top edge. Positions are always in bounds once stored
/// on an agent; [`Position::step`] is the only way to derive a neighbour
/// and it refuses to leave the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Row index, `0..height`.
    pub row: usize,
    /// Column index, `0..width`.
    pub col: usize,
}

impl Position {
    /// Create a position.
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Row-major flat index for a grid of the given width.
    pub fn flat_index(self, width: usize) -> usize {
        self.row * width + self.col
    }

    /// The neighbouring position in `direction`, or `None` if it would
    /// fall outside a `height x width` grid.
    pub fn step(self, direction: Direction, height: usize, width: usize) -> Option<Position> {
        let (dr, dc) = direction.offset_2d();
        let row = self.row as i64 + dr;
        let col = self.col as i64 + dc;
        if row < 0 || col < 0 || row >= height as i64 || col >= width as i64 {
            return None;
        }
        Some(Position::new(row as usize, col as usize))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Cardinal direction for agent movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move one cell up (row - 1).
    Up,
    /// Move one cell down (row + 1).
    Down,
    /// Move one cell left (col - 1).
    Left,
    /// Move one cell right (col + 1).
    Right,
}

impl Direction {
    /// All directions in action-index order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Returns the (row_offset, col_offset) for this direction.
    pub fn offset_2d(self) -> (i64, i64) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}
