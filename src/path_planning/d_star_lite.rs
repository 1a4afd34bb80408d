//! D* Lite incremental replanner
//!
//! Keeps goal-relative cost estimates (g) and one-step lookahead values
//! (rhs) for every cell. When a cell becomes blocked only the disturbed
//! neighbourhood is re-evaluated instead of searching from scratch.
//!
//! Queue entries are never removed eagerly: an entry whose node is already
//! locally consistent, or whose key is out of date, is dealt with when it is
//! popped.
//!
//! Reference: Koenig, S., & Likhachev, M. (2002). D* Lite.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use log::{debug, warn};
use nalgebra as na;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::common::{Cell, STRAIGHT_MOVES};
use crate::mapping::GridModel;

/// Work budget for the replanner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplannerConfig {
    /// Maximum queue pops per `compute_shortest_path` call
    pub max_iterations: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// Start is locally consistent and no queued key is smaller than its key
    Converged,
    /// Iteration budget ran out before convergence
    BudgetExceeded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleUpdate {
    /// Cell was already blocked (or off the map); nothing was recomputed
    Unchanged,
    Applied(SearchStatus),
}

/// Priority key, compared lexicographically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Key {
    k1: OrderedFloat<f64>,
    k2: OrderedFloat<f64>,
}

#[derive(Debug)]
pub struct DStarLite<'g> {
    grid: &'g mut GridModel,
    config: ReplannerConfig,

    start: Cell,
    last_start: Cell,
    goal: Cell,

    k_m: f64,
    g: na::DMatrix<f64>,
    rhs: na::DMatrix<f64>,

    open: BinaryHeap<Reverse<(Key, Cell)>>,
}

impl<'g> DStarLite<'g> {
    pub fn new(grid: &'g mut GridModel, start: Cell, goal: Cell, config: ReplannerConfig) -> Self {
        let rows = grid.rows() as usize;
        let cols = grid.cols() as usize;
        let mut planner = DStarLite {
            grid,
            config,
            start,
            last_start: start,
            goal,
            k_m: 0.0,
            g: na::DMatrix::from_element(rows, cols, f64::INFINITY),
            rhs: na::DMatrix::from_element(rows, cols, f64::INFINITY),
            open: BinaryHeap::new(),
        };
        if planner.grid.in_bounds(goal) {
            planner.set_rhs(goal, 0.0);
            let key = planner.calculate_key(goal);
            planner.open.push(Reverse((key, goal)));
        }
        planner
    }

    pub fn grid(&self) -> &GridModel {
        self.grid
    }

    pub fn start(&self) -> Cell {
        self.start
    }

    pub fn goal(&self) -> Cell {
        self.goal
    }

    pub fn k_m(&self) -> f64 {
        self.k_m
    }

    /// Number of queue entries, stale ones included
    pub fn queue_len(&self) -> usize {
        self.open.len()
    }

    /// Current cost-to-goal estimate (infinite off the map)
    pub fn g(&self, cell: Cell) -> f64 {
        self.value(&self.g, cell)
    }

    pub fn rhs(&self, cell: Cell) -> f64 {
        self.value(&self.rhs, cell)
    }

    pub fn is_consistent(&self, cell: Cell) -> bool {
        self.g(cell) == self.rhs(cell)
    }

    fn value(&self, m: &na::DMatrix<f64>, cell: Cell) -> f64 {
        if self.grid.in_bounds(cell) {
            m[(cell.row as usize, cell.col as usize)]
        } else {
            f64::INFINITY
        }
    }

    fn set_g(&mut self, cell: Cell, value: f64) {
        self.g[(cell.row as usize, cell.col as usize)] = value;
    }

    fn set_rhs(&mut self, cell: Cell, value: f64) {
        self.rhs[(cell.row as usize, cell.col as usize)] = value;
    }

    fn heuristic(a: Cell, b: Cell) -> f64 {
        a.manhattan(&b)
    }

    fn neighbors(&self, cell: Cell) -> Vec<Cell> {
        STRAIGHT_MOVES
            .iter()
            .map(|&dir| cell.step(dir))
            .filter(|&nb| self.grid.in_bounds(nb))
            .collect()
    }

    /// Unit cost, or infinity when moving onto a blocked cell
    fn edge_cost(&self, _from: Cell, to: Cell) -> f64 {
        if self.grid.is_traversable(to) {
            1.0
        } else {
            f64::INFINITY
        }
    }

    fn calculate_key(&self, cell: Cell) -> Key {
        let g_rhs = self.g(cell).min(self.rhs(cell));
        Key {
            k1: OrderedFloat(g_rhs + Self::heuristic(self.start, cell) + self.k_m),
            k2: OrderedFloat(g_rhs),
        }
    }

    fn update_vertex(&mut self, cell: Cell) {
        if cell != self.goal {
            let best = self
                .neighbors(cell)
                .into_iter()
                .map(|nb| self.edge_cost(cell, nb) + self.g(nb))
                .fold(f64::INFINITY, f64::min);
            self.set_rhs(cell, best);
        }
        if !self.is_consistent(cell) {
            let key = self.calculate_key(cell);
            self.open.push(Reverse((key, cell)));
        }
    }

    /// Propagate pending changes until the start is locally consistent and
    /// no queued node could still improve it.
    pub fn compute_shortest_path(&mut self) -> SearchStatus {
        let mut iterations = 0usize;
        while let Some(&Reverse((top_key, _))) = self.open.peek() {
            if top_key >= self.calculate_key(self.start) && self.is_consistent(self.start) {
                break;
            }

            iterations += 1;
            if let Some(limit) = self.config.max_iterations {
                if iterations > limit {
                    warn!("D* Lite stopped after {} iterations without converging", limit);
                    return SearchStatus::BudgetExceeded;
                }
            }

            let Some(Reverse((k_old, node))) = self.open.pop() else {
                break;
            };

            // Leftover duplicate of a node that has since been settled
            if self.is_consistent(node) {
                continue;
            }

            let k_new = self.calculate_key(node);
            if k_old < k_new {
                self.open.push(Reverse((k_new, node)));
            } else if self.g(node) > self.rhs(node) {
                let rhs = self.rhs(node);
                self.set_g(node, rhs);
                for nb in self.neighbors(node) {
                    self.update_vertex(nb);
                }
            } else {
                self.set_g(node, f64::INFINITY);
                self.update_vertex(node);
                for nb in self.neighbors(node) {
                    self.update_vertex(nb);
                }
            }
        }
        debug!(
            "D* Lite converged after {} iterations, g(start) = {}",
            iterations,
            self.g(self.start)
        );
        SearchStatus::Converged
    }

    /// Block `pos` on the grid and repair the cost estimates around it
    pub fn notify_obstacle(&mut self, pos: Cell) -> ObstacleUpdate {
        if !self.grid.block_cell(pos) {
            debug!("obstacle at {} already known", pos);
            return ObstacleUpdate::Unchanged;
        }
        debug!("new obstacle at {}, repairing from {}", pos, self.start);

        self.k_m += Self::heuristic(self.start, pos);
        for nb in self.neighbors(pos) {
            self.update_vertex(nb);
        }
        self.update_vertex(pos);
        ObstacleUpdate::Applied(self.compute_shortest_path())
    }

    /// Follow the cheapest successor from the start to the goal. Returns an
    /// empty path if the goal is unreachable or the walk loops.
    pub fn extract_path(&self) -> Vec<Cell> {
        if !self.grid.in_bounds(self.start) {
            return Vec::new();
        }
        let cols = self.grid.cols();
        let mut seen = vec![false; (self.grid.rows() * cols) as usize];
        let mut path = vec![self.start];
        let mut current = self.start;

        while current != self.goal {
            let index = (current.row * cols + current.col) as usize;
            if seen[index] {
                return Vec::new();
            }
            seen[index] = true;

            let mut best: Option<(Cell, f64)> = None;
            for nb in self.neighbors(current) {
                let cost = self.edge_cost(current, nb) + self.g(nb);
                if best.map_or(true, |(_, c)| cost < c) {
                    best = Some((nb, cost));
                }
            }
            match best {
                Some((next, cost)) if cost.is_finite() => {
                    path.push(next);
                    current = next;
                }
                _ => return Vec::new(),
            }
        }
        path
    }

    /// Rebind the heuristic origin as the drone advances, keeping g/rhs
    pub fn update_start(&mut self, pos: Cell) {
        self.k_m += Self::heuristic(self.last_start, pos);
        self.last_start = pos;
        self.start = pos;
    }
}
