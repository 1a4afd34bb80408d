//! Planning stage of a survey mission
//!
//! Walks the boustrophedon sweep and connects consecutive waypoints with the
//! energy-aware router until every waypoint has been handled or the battery
//! cannot pay for the next leg.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::common::{Cell, Direction};
use crate::mapping::GridModel;
use crate::path_planning::{boustrophedon_sweep, EnergyAwareRouter, RouterConfig};

/// How the planning loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanStatus {
    AllWaypointsProcessed,
    BatteryExhausted,
}

/// Mission statistics handed to telemetry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionStats {
    pub coverage_pct: f64,
    pub battery_used: f64,
    pub battery_remaining: f64,
    pub total_steps: usize,
    pub total_energy: f64,
    pub waypoints_visited: usize,
}

/// Result of the planning stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoveragePlan {
    /// Sweep order the planner worked through
    pub waypoints: Vec<Cell>,
    /// Every cell flown, starting at the launch cell
    pub path: Vec<Cell>,
    pub final_position: Cell,
    pub status: PlanStatus,
    pub stats: MissionStats,
}

#[derive(Debug, Clone)]
pub struct CoveragePlanner {
    router: EnergyAwareRouter,
    battery_capacity: f64,
}

impl CoveragePlanner {
    pub fn new(router_config: RouterConfig, battery_capacity: f64) -> Self {
        CoveragePlanner {
            router: EnergyAwareRouter::new(router_config),
            battery_capacity,
        }
    }

    pub fn router(&self) -> &EnergyAwareRouter {
        &self.router
    }

    /// Plan the full coverage path from the grid's start cell, marking
    /// every flown cell visited.
    pub fn plan(&self, grid: &mut GridModel) -> CoveragePlan {
        let waypoints = boustrophedon_sweep(grid);
        let mut current = grid.start();
        let mut path = vec![current];
        let mut battery = self.battery_capacity;
        let mut total_energy = 0.0;
        let mut heading: Option<Direction> = None;
        let mut reached = 0usize;
        let mut skipped = 0usize;
        let mut status = PlanStatus::AllWaypointsProcessed;

        info!(
            "planning coverage of {} waypoints from {} with battery {}",
            waypoints.len(),
            current,
            battery
        );

        for &target in &waypoints {
            if target == current {
                grid.mark_visited(target);
                reached += 1;
                continue;
            }

            if !grid.is_traversable(target) {
                skipped += 1;
                continue;
            }

            let route = self.router.plan(grid, current, target, heading);
            if !route.is_reachable() {
                debug!("waypoint {} unreachable from {}, skipped", target, current);
                skipped += 1;
                continue;
            }

            if battery - route.cost < 0.0 {
                warn!(
                    "battery critical: leg to {} needs {:.2}, {:.2} left; stopping at {}",
                    target, route.cost, battery, current
                );
                status = PlanStatus::BatteryExhausted;
                break;
            }

            for &cell in &route.cells[1..] {
                path.push(cell);
                grid.mark_visited(cell);
            }
            battery -= route.cost;
            total_energy += route.cost;
            current = target;
            reached += 1;
            if let Some(dir) = route.final_direction() {
                heading = Some(dir);
            }
        }

        let stats = MissionStats {
            coverage_pct: grid.coverage_fraction(),
            battery_used: self.battery_capacity - battery,
            battery_remaining: battery,
            total_steps: path.len(),
            total_energy,
            waypoints_visited: reached,
        };
        info!(
            "planning finished ({:?}): coverage {}%, {} steps, energy {:.2}, {} waypoints reached, {} skipped",
            status, stats.coverage_pct, stats.total_steps, stats.total_energy, reached, skipped
        );

        CoveragePlan {
            waypoints,
            path,
            final_position: current,
            status,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use itertools::Itertools;

    fn open_grid(rows: usize, cols: usize) -> GridModel {
        let mut grid = GridModel::new(rows, cols);
        grid.set_start(Cell::new(0, 0));
        grid
    }

    #[test]
    fn test_full_coverage_of_open_grid() {
        let mut grid = open_grid(4, 4);
        let plan = CoveragePlanner::new(RouterConfig::default(), 500.0).plan(&mut grid);

        assert_eq!(plan.status, PlanStatus::AllWaypointsProcessed);
        assert_eq!(plan.stats.coverage_pct, 100.0);
        assert_eq!(plan.stats.waypoints_visited, 16);
        assert_eq!(plan.path.len(), 16);
        assert_eq!(plan.final_position, Cell::new(3, 0));
        assert!((plan.stats.battery_used - plan.stats.total_energy).abs() < 1e-9);
        for (a, b) in plan.path.iter().tuple_windows() {
            assert_eq!((a.row - b.row).abs() + (a.col - b.col).abs(), 1);
        }
    }

    #[test]
    fn test_sweep_energy_on_open_row_pair() {
        // two straight moves, a turn south, a turn west, then straight again
        let mut grid = open_grid(2, 3);
        let plan = CoveragePlanner::new(RouterConfig::default(), 500.0).plan(&mut grid);
        let expected = 1.0 + 1.0 + 1.4 + 1.4 + 1.0;
        assert!((plan.stats.total_energy - expected).abs() < 1e-9);
    }

    #[test]
    fn test_battery_exhausted_before_first_leg() {
        let mut grid = open_grid(1, 3);
        let plan = CoveragePlanner::new(RouterConfig::default(), 0.5).plan(&mut grid);

        assert_eq!(plan.status, PlanStatus::BatteryExhausted);
        assert_eq!(plan.final_position, Cell::new(0, 0));
        assert_eq!(plan.path, vec![Cell::new(0, 0)]);
        assert_eq!(plan.stats.waypoints_visited, 1);
        assert_eq!(plan.stats.battery_remaining, 0.5);
        assert_eq!(plan.stats.total_energy, 0.0);
    }

    #[test]
    fn test_battery_runs_out_mid_sweep() {
        let mut grid = open_grid(3, 3);
        let plan = CoveragePlanner::new(RouterConfig::default(), 3.5).plan(&mut grid);

        assert_eq!(plan.status, PlanStatus::BatteryExhausted);
        assert!(plan.stats.battery_remaining >= 0.0);
        assert!(plan.stats.coverage_pct < 100.0);
        assert_eq!(plan.path.last(), Some(&plan.final_position));
    }

    #[test]
    fn test_unreachable_waypoints_are_skipped() {
        let mut grid = open_grid(3, 3);
        grid.add_obstacle(Cell::new(1, 2));
        grid.add_obstacle(Cell::new(2, 1));
        let plan = CoveragePlanner::new(RouterConfig::default(), 500.0).plan(&mut grid);

        assert_eq!(plan.status, PlanStatus::AllWaypointsProcessed);
        assert_eq!(plan.stats.waypoints_visited, 6);
        assert!(!plan.path.contains(&Cell::new(2, 2)));
        assert!((plan.stats.coverage_pct - 85.71).abs() < 1e-9);
    }

    #[test]
    fn test_plan_is_deterministic() {
        let map = MapConfig::default();
        let mut a = map.build_grid().unwrap();
        let mut b = map.build_grid().unwrap();
        let planner = CoveragePlanner::new(RouterConfig::default(), 500.0);
        assert_eq!(planner.plan(&mut a), planner.plan(&mut b));
    }

    #[test]
    fn test_sample_map_never_enters_blocked_cells() {
        let map = MapConfig::default();
        let reference = map.build_grid().unwrap();
        let mut grid = map.build_grid().unwrap();
        let plan = CoveragePlanner::new(RouterConfig::default(), 500.0).plan(&mut grid);

        assert!(plan.path.iter().all(|&c| reference.is_traversable(c)));
        assert!(plan.stats.battery_remaining >= 0.0);
        assert!(plan.stats.coverage_pct > 0.0);
        assert_eq!(plan.stats.total_steps, plan.path.len());
    }
}
