//! Execution stage of a survey mission
//!
//! Flies a committed path step by step. When a scheduled obstacle turns up
//! on the part of the path not yet flown, a D* Lite replanner is seeded from
//! the current position to the path's destination and the repaired route is
//! spliced onto the flown prefix. If no alternative exists the drone keeps
//! to its previous route.
//!
//! Every executed step costs a flat battery charge, unlike the planning
//! stage which prices moves with the full energy model.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::common::{Cell, ObstacleMemory, SurveyError, SurveyResult};
use crate::mapping::GridModel;
use crate::mission_planning::ObstacleSchedule;
use crate::path_planning::{DStarLite, ObstacleUpdate, ReplannerConfig, SearchStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Battery charged per executed step
    pub step_charge: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self { step_charge: 1.0 }
    }
}

impl ExecutionConfig {
    pub fn validate(&self) -> SurveyResult<()> {
        if !(self.step_charge.is_finite() && self.step_charge >= 0.0) {
            return Err(SurveyError::Config(format!(
                "step_charge must be non-negative, got {}",
                self.step_charge
            )));
        }
        Ok(())
    }
}

/// Successful mid-flight repair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplanEvent {
    pub step: usize,
    pub position: Cell,
    pub obstacle: Cell,
    pub new_path_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReplanOutcome {
    Replanned(ReplanEvent),
    /// No way around the obstacle; the previous route was kept
    NoAlternative {
        step: usize,
        position: Cell,
        obstacle: Cell,
    },
    /// Replanner ran out of iterations before settling; the previous route
    /// was kept even though a detour may exist
    BudgetExceeded {
        step: usize,
        position: Cell,
        obstacle: Cell,
    },
}

impl ReplanOutcome {
    /// Obstacle that triggered the replanning attempt
    pub fn obstacle(&self) -> Cell {
        match self {
            ReplanOutcome::Replanned(event) => event.obstacle,
            ReplanOutcome::NoAlternative { obstacle, .. } | ReplanOutcome::BudgetExceeded { obstacle, .. } => {
                *obstacle
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Completed,
    BatteryExhausted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub executed: Vec<Cell>,
    pub outcomes: Vec<ReplanOutcome>,
    pub battery_remaining: f64,
    pub coverage_pct: f64,
    pub status: ExecutionStatus,
}

impl ExecutionSummary {
    pub fn replanning_events(&self) -> impl Iterator<Item = &ReplanEvent> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            ReplanOutcome::Replanned(event) => Some(event),
            ReplanOutcome::NoAlternative { .. } | ReplanOutcome::BudgetExceeded { .. } => None,
        })
    }
}

pub struct DynamicMission<'g> {
    grid: &'g mut GridModel,
    planned_path: Vec<Cell>,
    battery: f64,
    schedule: ObstacleSchedule,
    execution: ExecutionConfig,
    replanner: ReplannerConfig,
}

impl<'g> DynamicMission<'g> {
    pub fn new(grid: &'g mut GridModel, planned_path: Vec<Cell>, battery: f64, schedule: ObstacleSchedule) -> Self {
        DynamicMission {
            grid,
            planned_path,
            battery,
            schedule,
            execution: ExecutionConfig::default(),
            replanner: ReplannerConfig::default(),
        }
    }

    pub fn with_execution(mut self, execution: ExecutionConfig) -> Self {
        self.execution = execution;
        self
    }

    pub fn with_replanner(mut self, replanner: ReplannerConfig) -> Self {
        self.replanner = replanner;
        self
    }

    pub fn run(&mut self) -> ExecutionSummary {
        self.execute(None)
    }

    /// Run the mission, recording every obstacle that forced a replan
    pub fn run_with_memory(&mut self, memory: &mut dyn ObstacleMemory) -> ExecutionSummary {
        self.execute(Some(memory))
    }

    fn execute(&mut self, mut memory: Option<&mut dyn ObstacleMemory>) -> ExecutionSummary {
        info!(
            "executing {} planned steps with battery {}",
            self.planned_path.len(),
            self.battery
        );

        let step_charge = self.execution.step_charge;
        let mut battery = self.battery;
        let mut current_path = self.planned_path.clone();
        let mut executed: Vec<Cell> = Vec::new();
        let mut outcomes = Vec::new();
        let mut status = ExecutionStatus::Completed;

        let mut step = 0;
        while step < current_path.len() {
            if battery < step_charge {
                warn!("battery depleted at step {}", step);
                status = ExecutionStatus::BatteryExhausted;
                break;
            }

            let position = current_path[step];
            executed.push(position);
            battery -= step_charge;
            self.grid.mark_visited(position);

            if let Some(obstacle) = self.schedule.at(step) {
                if current_path[step + 1..].contains(&obstacle) {
                    if let Some(memory) = memory.as_deref_mut() {
                        memory.record_obstacle(obstacle);
                    }
                    let goal = current_path[current_path.len() - 1];
                    let (search, repaired) = self.repair(position, goal, obstacle);
                    if search == SearchStatus::BudgetExceeded {
                        warn!(
                            "replanning around {} at step {} ran out of budget; continuing on the previous route",
                            obstacle, step
                        );
                        outcomes.push(ReplanOutcome::BudgetExceeded { step, position, obstacle });
                    } else if repaired.is_empty() {
                        warn!(
                            "no alternative around {} at step {}; continuing on the previous route",
                            obstacle, step
                        );
                        outcomes.push(ReplanOutcome::NoAlternative { step, position, obstacle });
                    } else {
                        debug!("replanned at step {}: {} cells to {}", step, repaired.len(), goal);
                        outcomes.push(ReplanOutcome::Replanned(ReplanEvent {
                            step,
                            position,
                            obstacle,
                            new_path_length: repaired.len(),
                        }));
                        current_path.truncate(step + 1);
                        current_path.extend_from_slice(&repaired[1..]);
                    }
                } else {
                    debug!("obstacle {} at step {} is off the remaining route", obstacle, step);
                }
            }

            step += 1;
        }

        let summary = ExecutionSummary {
            executed,
            outcomes,
            battery_remaining: battery,
            coverage_pct: self.grid.coverage_fraction(),
            status,
        };
        info!(
            "execution finished ({:?}): {} steps, {} replans, battery {:.1}",
            summary.status,
            summary.executed.len(),
            summary.replanning_events().count(),
            summary.battery_remaining
        );
        summary
    }

    /// Fresh D* Lite search from `position` to `goal`, then block `obstacle`
    /// and extract the repaired path (empty if none exists). The path is
    /// only meaningful when the search converged.
    fn repair(&mut self, position: Cell, goal: Cell, obstacle: Cell) -> (SearchStatus, Vec<Cell>) {
        let mut replanner = DStarLite::new(&mut *self.grid, position, goal, self.replanner.clone());
        let initial = replanner.compute_shortest_path();
        // A later search resumes from the queue the earlier one left behind,
        // so the most recent status describes the final state
        let search = match replanner.notify_obstacle(obstacle) {
            ObstacleUpdate::Applied(status) => status,
            ObstacleUpdate::Unchanged => initial,
        };
        if search == SearchStatus::BudgetExceeded {
            return (search, Vec::new());
        }
        (search, replanner.extract_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ObstacleLog;
    use crate::mapping::ZoneKind;

    fn row_path(row: i32, cols: i32) -> Vec<Cell> {
        (0..cols).map(|c| Cell::new(row, c)).collect()
    }

    fn schedule(entries: &[(usize, (i32, i32))]) -> ObstacleSchedule {
        entries.iter().map(|&(step, (r, c))| (step, Cell::new(r, c))).collect()
    }

    #[test]
    fn test_replans_around_obstacle_ahead() {
        let mut grid = GridModel::new(3, 5);
        grid.set_start(Cell::new(0, 0));
        let mut mission = DynamicMission::new(&mut grid, row_path(0, 5), 100.0, schedule(&[(1, (0, 3))]));
        let summary = mission.run();

        assert_eq!(summary.status, ExecutionStatus::Completed);
        let events: Vec<_> = summary.replanning_events().cloned().collect();
        assert_eq!(
            events,
            vec![ReplanEvent {
                step: 1,
                position: Cell::new(0, 1),
                obstacle: Cell::new(0, 3),
                new_path_length: 6,
            }]
        );
        assert_eq!(summary.executed.len(), 7);
        assert_eq!(&summary.executed[..2], &[Cell::new(0, 0), Cell::new(0, 1)]);
        assert_eq!(summary.executed.last(), Some(&Cell::new(0, 4)));
        assert!(!summary.executed.contains(&Cell::new(0, 3)));
        assert!((summary.battery_remaining - 93.0).abs() < 1e-9);
        assert_eq!(grid.dynamic_obstacles(), &[Cell::new(0, 3)]);
    }

    #[test]
    fn test_keeps_route_when_no_alternative() {
        let mut grid = GridModel::new(1, 5);
        let planned = row_path(0, 5);
        let mut mission = DynamicMission::new(&mut grid, planned.clone(), 100.0, schedule(&[(0, (0, 2))]));
        let summary = mission.run();

        assert_eq!(
            summary.outcomes,
            vec![ReplanOutcome::NoAlternative {
                step: 0,
                position: Cell::new(0, 0),
                obstacle: Cell::new(0, 2),
            }]
        );
        assert_eq!(summary.executed, planned);
        assert_eq!(summary.replanning_events().count(), 0);
    }

    #[test]
    fn test_obstacle_off_route_is_ignored() {
        let mut grid = GridModel::new(3, 5);
        let mut mission = DynamicMission::new(&mut grid, row_path(0, 5), 100.0, schedule(&[(2, (2, 2)), (3, (0, 1))]));
        let summary = mission.run();
        assert!(summary.outcomes.is_empty());
        assert_eq!(summary.executed, row_path(0, 5));
    }

    #[test]
    fn test_flat_step_charge_and_exhaustion() {
        let mut grid = GridModel::new(1, 5);
        let summary = DynamicMission::new(&mut grid, row_path(0, 5), 3.0, ObstacleSchedule::new()).run();
        assert_eq!(summary.status, ExecutionStatus::BatteryExhausted);
        assert_eq!(summary.executed.len(), 3);
        assert_eq!(summary.battery_remaining, 0.0);

        let mut grid = GridModel::new(1, 5);
        let summary = DynamicMission::new(&mut grid, row_path(0, 5), 2.5, ObstacleSchedule::new()).run();
        assert_eq!(summary.executed.len(), 2);
        assert!((summary.battery_remaining - 0.5).abs() < 1e-9);

        let mut grid = GridModel::new(1, 5);
        let summary = DynamicMission::new(&mut grid, row_path(0, 5), 5.0, ObstacleSchedule::new())
            .with_execution(ExecutionConfig { step_charge: 0.5 })
            .run();
        assert_eq!(summary.status, ExecutionStatus::Completed);
        assert!((summary.battery_remaining - 2.5).abs() < 1e-9);
        assert_eq!(summary.coverage_pct, 100.0);
    }

    #[test]
    fn test_memory_records_replanning_obstacles() {
        let mut grid = GridModel::new(3, 6);
        grid.stamp_zone(2, 3, 0, 6, ZoneKind::NoFly);
        let mut memory = ObstacleLog::new();
        let mut mission = DynamicMission::new(
            &mut grid,
            row_path(0, 6),
            100.0,
            schedule(&[(0, (0, 2)), (3, (1, 0))]),
        );
        mission.run_with_memory(&mut memory);
        assert_eq!(memory.known_obstacles(), vec![Cell::new(0, 2)]);
    }

    #[test]
    fn test_exhausted_replan_budget_is_reported() {
        let mut grid = GridModel::new(3, 5);
        let summary = DynamicMission::new(&mut grid, row_path(0, 5), 100.0, schedule(&[(1, (0, 3))]))
            .with_replanner(ReplannerConfig {
                max_iterations: Some(3),
            })
            .run();

        assert_eq!(
            summary.outcomes,
            vec![ReplanOutcome::BudgetExceeded {
                step: 1,
                position: Cell::new(0, 1),
                obstacle: Cell::new(0, 3),
            }]
        );
        assert_eq!(summary.replanning_events().count(), 0);
        assert_eq!(summary.executed, row_path(0, 5));
    }

    #[test]
    fn test_ample_replan_budget_still_detours() {
        let mut grid = GridModel::new(3, 5);
        let summary = DynamicMission::new(&mut grid, row_path(0, 5), 100.0, schedule(&[(1, (0, 3))]))
            .with_replanner(ReplannerConfig {
                max_iterations: Some(1_000),
            })
            .run();

        assert_eq!(summary.replanning_events().count(), 1);
        assert!(!summary.executed.contains(&Cell::new(0, 3)));
        assert_eq!(summary.executed.last(), Some(&Cell::new(0, 4)));
    }

    #[test]
    fn test_execution_config_validation() {
        assert!(ExecutionConfig::default().validate().is_ok());
        assert!(ExecutionConfig { step_charge: -1.0 }.validate().is_err());
    }
}
