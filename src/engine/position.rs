use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A cell coordinate. `x` is the column, `y` is the row; `(0, 0)` is top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    #[inline]
    pub const fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }

    /// Step one cell along `vector`, or `None` when that leaves the
    /// non-negative quadrant. Upper bounds are the grid's concern.
    #[inline]
    pub fn step(self, vector: Vector) -> Option<Position> {
        let x = self.x.checked_add_signed(vector.dx)?;
        let y = self.y.checked_add_signed(vector.dy)?;
        Some(Position { x, y })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Unit displacement for one move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vector {
    pub dx: isize,
    pub dy: isize,
}

/// A direction to slide/merge tiles.
///
/// Discriminants double as the numeric move codes accepted from input
/// collaborators (`0: up, 1: right, 2: down, 3: left`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

const VECTORS: [Vector; 4] = [
    Vector { dx: 0, dy: -1 },
    Vector { dx: 1, dy: 0 },
    Vector { dx: 0, dy: 1 },
    Vector { dx: -1, dy: 0 },
];

impl Direction {
    /// All directions in index order. Search tie-breaks follow this order.
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Right, Direction::Down, Direction::Left];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn vector(self) -> Vector {
        VECTORS[self.index()]
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        };
        f.write_str(name)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseDirectionError {
    #[error("direction code out of range: {0} (expected 0..=3)")]
    Code(u8),
    #[error("unknown direction: {0:?}")]
    Name(String),
}

impl TryFrom<u8> for Direction {
    type Error = ParseDirectionError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Direction::ALL
            .get(code as usize)
            .copied()
            .ok_or(ParseDirectionError::Code(code))
    }
}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" | "u" | "0" => Ok(Direction::Up),
            "right" | "r" | "1" => Ok(Direction::Right),
            "down" | "d" | "2" => Ok(Direction::Down),
            "left" | "l" | "3" => Ok(Direction::Left),
            _ => Err(ParseDirectionError::Name(s.to_string())),
        }
    }
}

/// Per-axis visiting order for one move.
///
/// Cells nearest the edge the vector points toward come first, so a tile is
/// never moved past one that has not been resolved yet this turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traversals {
    pub x: Vec<usize>,
    pub y: Vec<usize>,
}

impl Traversals {
    pub fn build(size: usize, direction: Direction) -> Self {
        let vector = direction.vector();
        let mut x: Vec<usize> = (0..size).collect();
        let mut y: Vec<usize> = (0..size).collect();
        if vector.dx == 1 {
            x.reverse();
        }
        if vector.dy == 1 {
            y.reverse();
        }
        Traversals { x, y }
    }

    /// Cells in visiting order (x outer, y inner).
    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        self.x
            .iter()
            .flat_map(move |&x| self.y.iter().map(move |&y| Position::new(x, y)))
    }
}
