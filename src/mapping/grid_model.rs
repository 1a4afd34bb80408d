//! Discretized survey area
//!
//! Owns the per-cell state of the map and every mutation applied to it.
//! All queries are bounds-checked: coordinates outside the grid are simply
//! not traversable.

use itertools::iproduct;
use log::debug;
use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::common::{Cell, ObstacleMemory, ALL_MOVES};

/// State of a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    Free,
    Obstacle,
    NoFly,
    Start,
    Visited,
}

impl CellState {
    pub fn is_traversable(&self) -> bool {
        matches!(self, CellState::Free | CellState::Start | CellState::Visited)
    }
}

/// Kind of rectangle stamped onto the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    Obstacle,
    NoFly,
}

impl From<ZoneKind> for CellState {
    fn from(kind: ZoneKind) -> Self {
        match kind {
            ZoneKind::Obstacle => CellState::Obstacle,
            ZoneKind::NoFly => CellState::NoFly,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GridModel {
    rows: i32,
    cols: i32,
    cells: na::DMatrix<CellState>,
    start: Cell,
    dynamic_obstacles: Vec<Cell>,
}

impl GridModel {
    /// Create an all-free grid. The start defaults to (0, 0) but is not
    /// stamped until [`GridModel::set_start`] is called.
    pub fn new(rows: usize, cols: usize) -> Self {
        GridModel {
            rows: rows as i32,
            cols: cols as i32,
            cells: na::DMatrix::from_element(rows, cols, CellState::Free),
            start: Cell::new(0, 0),
            dynamic_obstacles: Vec::new(),
        }
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn start(&self) -> Cell {
        self.start
    }

    /// Obstacles discovered in flight, in discovery order
    pub fn dynamic_obstacles(&self) -> &[Cell] {
        &self.dynamic_obstacles
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.row >= 0 && cell.row < self.rows && cell.col >= 0 && cell.col < self.cols
    }

    pub fn state(&self, cell: Cell) -> Option<CellState> {
        if self.in_bounds(cell) {
            Some(self.cells[(cell.row as usize, cell.col as usize)])
        } else {
            None
        }
    }

    fn set(&mut self, cell: Cell, state: CellState) {
        self.cells[(cell.row as usize, cell.col as usize)] = state;
    }

    pub fn is_traversable(&self, cell: Cell) -> bool {
        self.state(cell).map_or(false, |s| s.is_traversable())
    }

    /// Stamp the launch cell
    pub fn set_start(&mut self, cell: Cell) {
        if self.in_bounds(cell) {
            self.start = cell;
            self.set(cell, CellState::Start);
        }
    }

    /// Static obstacle known before the flight
    pub fn add_obstacle(&mut self, cell: Cell) {
        if self.state(cell) == Some(CellState::Free) {
            self.set(cell, CellState::Obstacle);
        }
    }

    pub fn mark_visited(&mut self, cell: Cell) {
        if self.state(cell) == Some(CellState::Free) {
            self.set(cell, CellState::Visited);
        }
    }

    /// Convert the free cells of rows `r0..r1` x cols `c0..c1` (half-open)
    /// to `kind`. The rectangle is clipped to the grid.
    pub fn stamp_zone(&mut self, r0: i32, r1: i32, c0: i32, c1: i32, kind: ZoneKind) {
        let rows = r0.max(0)..r1.min(self.rows);
        let cols = c0.max(0)..c1.min(self.cols);
        for (r, c) in iproduct!(rows, cols) {
            let cell = Cell::new(r, c);
            if self.state(cell) == Some(CellState::Free) {
                self.set(cell, kind.into());
            }
        }
    }

    /// Obstacle found mid-flight. Returns `true` only for a novel discovery
    /// on a free cell.
    pub fn discover_obstacle(&mut self, cell: Cell) -> bool {
        if self.state(cell) != Some(CellState::Free) {
            return false;
        }
        self.set(cell, CellState::Obstacle);
        self.dynamic_obstacles.push(cell);
        debug!("obstacle discovered at {}", cell);
        true
    }

    /// Block any traversable cell, including one already flown over.
    /// Returns `true` if the cell changed.
    pub fn block_cell(&mut self, cell: Cell) -> bool {
        if !self.is_traversable(cell) {
            return false;
        }
        self.set(cell, CellState::Obstacle);
        self.dynamic_obstacles.push(cell);
        debug!("cell {} blocked", cell);
        true
    }

    /// Number of 8-neighbours of `cell` inside a no-fly zone
    pub fn no_fly_neighbors(&self, cell: Cell) -> usize {
        ALL_MOVES
            .iter()
            .filter(|&&dir| self.state(cell.step(dir)) == Some(CellState::NoFly))
            .count()
    }

    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|&&s| s == state).count()
    }

    /// Covered share of the flyable area, as a percentage rounded to two
    /// decimals
    pub fn coverage_fraction(&self) -> f64 {
        let visited = self.count(CellState::Visited) + self.count(CellState::Start);
        let flyable = visited + self.count(CellState::Free);
        if flyable == 0 {
            return 0.0;
        }
        let pct = visited as f64 / flyable as f64 * 100.0;
        (pct * 100.0).round() / 100.0
    }

    /// Stamp obstacles remembered from earlier missions. Returns how many
    /// free cells were converted.
    pub fn seed_from_memory(&mut self, memory: &dyn ObstacleMemory) -> usize {
        let mut stamped = 0;
        for cell in memory.known_obstacles() {
            if self.state(cell) == Some(CellState::Free) {
                self.set(cell, CellState::Obstacle);
                stamped += 1;
            }
        }
        debug!("{} remembered obstacles stamped", stamped);
        stamped
    }
}
