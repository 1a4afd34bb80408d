//! Common types used throughout survey_planner

use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid coordinate (row, column)
///
/// Signed so that neighbour offsets can step off the map; such cells are
/// never traversable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Cell reached by taking one step in `dir`
    pub fn step(&self, dir: Direction) -> Cell {
        Cell {
            row: self.row + dir.dr,
            col: self.col + dir.dc,
        }
    }

    pub fn manhattan(&self, other: &Cell) -> f64 {
        ((self.row - other.row).abs() + (self.col - other.col).abs()) as f64
    }
}

impl From<(i32, i32)> for Cell {
    fn from(tuple: (i32, i32)) -> Self {
        Self { row: tuple.0, col: tuple.1 }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Unit movement vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Direction {
    pub dr: i32,
    pub dc: i32,
}

impl Direction {
    pub const fn new(dr: i32, dc: i32) -> Self {
        Self { dr, dc }
    }

    /// Direction of the single move from `a` to `b`
    pub fn between(a: Cell, b: Cell) -> Self {
        Self {
            dr: (b.row - a.row).signum(),
            dc: (b.col - a.col).signum(),
        }
    }

    pub fn is_diagonal(&self) -> bool {
        self.dr != 0 && self.dc != 0
    }
}

/// Up, down, left, right
pub const STRAIGHT_MOVES: [Direction; 4] = [
    Direction::new(-1, 0),
    Direction::new(1, 0),
    Direction::new(0, -1),
    Direction::new(0, 1),
];

/// Straight moves followed by the four diagonals
pub const ALL_MOVES: [Direction; 8] = [
    Direction::new(-1, 0),
    Direction::new(1, 0),
    Direction::new(0, -1),
    Direction::new(0, 1),
    Direction::new(-1, -1),
    Direction::new(-1, 1),
    Direction::new(1, -1),
    Direction::new(1, 1),
];

/// Path over grid cells together with its accumulated energy cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub cells: Vec<Cell>,
    pub cost: f64,
}

impl Route {
    pub fn new(cells: Vec<Cell>, cost: f64) -> Self {
        Self { cells, cost }
    }

    /// Empty path with infinite cost, the router's "no path" answer
    pub fn unreachable() -> Self {
        Self {
            cells: Vec::new(),
            cost: f64::INFINITY,
        }
    }

    pub fn is_reachable(&self) -> bool {
        !self.cells.is_empty() && self.cost.is_finite()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Direction of the last move, if the route moves at all
    pub fn final_direction(&self) -> Option<Direction> {
        match self.cells.as_slice() {
            [.., a, b] => Some(Direction::between(*a, *b)),
            _ => None,
        }
    }
}
