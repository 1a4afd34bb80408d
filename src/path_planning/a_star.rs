//! Energy-aware A* router
//!
//! Connects two cells under a direction-sensitive cost model: continuing
//! straight is cheapest, turning costs more, diagonal steps have their own
//! price, and every cell pays a penalty per adjacent no-fly cell.
//!
//! The search state is (cell, incoming direction) so that turn prices are
//! charged exactly. The heuristic is the Manhattan distance to the target;
//! it stops being a lower bound once diagonal steps or sub-unit straight
//! costs are configured, so routes are then not guaranteed optimal.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use itertools::Itertools;
use log::{debug, trace, warn};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::common::{Cell, Direction, Route, SurveyError, SurveyResult, ALL_MOVES, STRAIGHT_MOVES};
use crate::mapping::GridModel;

/// Incoming-direction slots per cell: "no heading" plus the eight moves
const HEADINGS: usize = ALL_MOVES.len() + 1;

/// Energy cost model for the router
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Move continuing the previous direction (also the first move)
    pub cost_straight: f64,
    /// Move changing direction
    pub cost_turn: f64,
    /// Diagonal move
    pub cost_diagonal: f64,
    /// Added per no-fly cell among the destination's 8 neighbours
    pub cost_proximity: f64,
    /// Expand diagonals (8-connected) instead of 4-connected moves only
    pub allow_diagonal: bool,
    /// Give up after this many node expansions
    pub max_expansions: Option<usize>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cost_straight: 1.0,
            cost_turn: 1.4,
            cost_diagonal: 1.6,
            cost_proximity: 5.0,
            allow_diagonal: false,
            max_expansions: None,
        }
    }
}

impl RouterConfig {
    pub fn validate(&self) -> SurveyResult<()> {
        let costs = [
            ("cost_straight", self.cost_straight),
            ("cost_turn", self.cost_turn),
            ("cost_diagonal", self.cost_diagonal),
        ];
        for (name, value) in costs {
            if !(value.is_finite() && value > 0.0) {
                return Err(SurveyError::Config(format!("{} must be positive, got {}", name, value)));
            }
        }
        if !(self.cost_proximity.is_finite() && self.cost_proximity >= 0.0) {
            return Err(SurveyError::Config(format!(
                "cost_proximity must be non-negative, got {}",
                self.cost_proximity
            )));
        }
        if self.cost_turn <= self.cost_straight {
            return Err(SurveyError::Config(format!(
                "cost_turn ({}) must exceed cost_straight ({})",
                self.cost_turn, self.cost_straight
            )));
        }
        Ok(())
    }
}

/// Open-set entry (min-heap on f = g + h)
#[derive(Debug)]
struct PriorityNode {
    priority: OrderedFloat<f64>,
    cost: OrderedFloat<f64>,
    state: usize,
}

impl Eq for PriorityNode {}

impl PartialEq for PriorityNode {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.state == other.state
    }
}

impl Ord for PriorityNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.state.cmp(&self.state))
    }
}

impl PartialOrd for PriorityNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnergyAwareRouter {
    config: RouterConfig,
}

impl EnergyAwareRouter {
    pub fn new(config: RouterConfig) -> Self {
        EnergyAwareRouter { config }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    fn moves(&self) -> &'static [Direction] {
        if self.config.allow_diagonal {
            &ALL_MOVES
        } else {
            &STRAIGHT_MOVES
        }
    }

    fn heuristic(a: Cell, b: Cell) -> f64 {
        a.manhattan(&b)
    }

    /// Energy spent moving in `dir` onto `dest` when the last move was `heading`
    pub fn move_cost(&self, grid: &GridModel, heading: Option<Direction>, dir: Direction, dest: Cell) -> f64 {
        let base = if dir.is_diagonal() {
            self.config.cost_diagonal
        } else if heading.map_or(true, |h| h == dir) {
            self.config.cost_straight
        } else {
            self.config.cost_turn
        };
        base + self.config.cost_proximity * grid.no_fly_neighbors(dest) as f64
    }

    /// Replay `cells` under the cost model, starting with `heading`
    pub fn route_cost(&self, grid: &GridModel, cells: &[Cell], heading: Option<Direction>) -> f64 {
        cells
            .iter()
            .tuple_windows()
            .fold((0.0, heading), |(total, heading), (&a, &b)| {
                let dir = Direction::between(a, b);
                (total + self.move_cost(grid, heading, dir, b), Some(dir))
            })
            .0
    }

    fn state_index(grid: &GridModel, cell: Cell, heading: Option<Direction>) -> usize {
        let slot = heading
            .and_then(|h| ALL_MOVES.iter().position(|&m| m == h))
            .map_or(0, |i| i + 1);
        (cell.row * grid.cols() + cell.col) as usize * HEADINGS + slot
    }

    fn state_cell(grid: &GridModel, state: usize) -> Cell {
        let index = (state / HEADINGS) as i32;
        Cell::new(index / grid.cols(), index % grid.cols())
    }

    fn state_heading(state: usize) -> Option<Direction> {
        match state % HEADINGS {
            0 => None,
            slot => Some(ALL_MOVES[slot - 1]),
        }
    }

    /// Plan a route from `start` to `goal`, pricing the first move against
    /// `heading`. Returns [`Route::unreachable`] when no route exists or the
    /// expansion budget runs out. The grid is never modified.
    pub fn plan(&self, grid: &GridModel, start: Cell, goal: Cell, heading: Option<Direction>) -> Route {
        self.search(grid, start, goal, heading).0
    }

    /// A* over (cell, heading) states. Costs and parents are only stored for
    /// states the search reaches; the second value is how many that was.
    fn search(&self, grid: &GridModel, start: Cell, goal: Cell, heading: Option<Direction>) -> (Route, usize) {
        if !grid.is_traversable(start) || !grid.is_traversable(goal) {
            trace!("route {} -> {} rejected: endpoint not traversable", start, goal);
            return (Route::unreachable(), 0);
        }
        if start == goal {
            return (Route::new(vec![start], 0.0), 1);
        }

        let mut g_score: HashMap<usize, f64> = HashMap::new();
        let mut parent: HashMap<usize, usize> = HashMap::new();
        let mut open_set = BinaryHeap::new();

        let start_state = Self::state_index(grid, start, heading);
        g_score.insert(start_state, 0.0);
        open_set.push(PriorityNode {
            priority: OrderedFloat(Self::heuristic(start, goal)),
            cost: OrderedFloat(0.0),
            state: start_state,
        });

        let mut expansions = 0usize;
        while let Some(current) = open_set.pop() {
            // Superseded entry
            if g_score.get(&current.state).map_or(false, |&g| current.cost.0 > g) {
                continue;
            }

            expansions += 1;
            if let Some(limit) = self.config.max_expansions {
                if expansions > limit {
                    warn!("route {} -> {} abandoned after {} expansions", start, goal, limit);
                    return (Route::unreachable(), g_score.len());
                }
            }

            let cell = Self::state_cell(grid, current.state);
            if cell == goal {
                debug!(
                    "route {} -> {} found: cost {:.2}, {} expansions",
                    start, goal, current.cost.0, expansions
                );
                let route = Route::new(Self::build_path(grid, current.state, &parent), current.cost.0);
                return (route, g_score.len());
            }

            let cur_heading = Self::state_heading(current.state);
            for &dir in self.moves() {
                let next = cell.step(dir);
                if !grid.is_traversable(next) {
                    continue;
                }

                let new_cost = current.cost.0 + self.move_cost(grid, cur_heading, dir, next);
                let next_state = Self::state_index(grid, next, Some(dir));
                if g_score.get(&next_state).map_or(true, |&g| new_cost < g) {
                    g_score.insert(next_state, new_cost);
                    parent.insert(next_state, current.state);
                    open_set.push(PriorityNode {
                        priority: OrderedFloat(new_cost + Self::heuristic(next, goal)),
                        cost: OrderedFloat(new_cost),
                        state: next_state,
                    });
                }
            }
        }

        debug!("route {} -> {} unreachable after {} expansions", start, goal, expansions);
        (Route::unreachable(), g_score.len())
    }

    fn build_path(grid: &GridModel, goal_state: usize, parent: &HashMap<usize, usize>) -> Vec<Cell> {
        let mut cells = Vec::new();
        let mut current = Some(goal_state);
        while let Some(state) = current {
            cells.push(Self::state_cell(grid, state));
            current = parent.get(&state).copied();
        }
        cells.reverse();
        cells
    }
}
