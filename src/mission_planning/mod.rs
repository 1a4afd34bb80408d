//! Mission planning: the coverage planning stage and the execution stage
//! that reacts to obstacles discovered in flight

pub mod coverage_planner;
pub mod dynamic_mission;
pub mod obstacle_schedule;
pub mod report;

pub use coverage_planner::*;
pub use dynamic_mission::*;
pub use obstacle_schedule::*;
pub use report::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ObstacleLog, ObstacleMemory};
    use crate::config::MissionConfig;
    use crate::mapping::CellState;
    use crate::path_planning::ReplannerConfig;
    use itertools::Itertools;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sample_mission_end_to_end() {
        let config = MissionConfig::default();
        let mut planning_grid = config.map.build_grid().unwrap();
        let plan = CoveragePlanner::new(config.router.clone(), config.battery).plan(&mut planning_grid);
        assert!(plan.stats.coverage_pct > 0.0);

        let mut grid = config.map.build_grid().unwrap();
        let mut memory = ObstacleLog::new();
        let summary = DynamicMission::new(&mut grid, plan.path.clone(), config.battery, config.map.schedule())
            .with_execution(config.execution.clone())
            .with_replanner(config.replanner.clone())
            .run_with_memory(&mut memory);

        assert!(!summary.executed.is_empty());
        assert!(summary.battery_remaining >= 0.0);
        assert_eq!(summary.executed[0], plan.path[0]);
        for event in summary.replanning_events() {
            assert!(!summary.executed[event.step + 1..].contains(&event.obstacle));
            assert_eq!(grid.state(event.obstacle), Some(CellState::Obstacle));
        }
        assert_eq!(memory.len(), summary.outcomes.len());
    }

    #[test]
    fn test_random_obstacles_never_flown_into_after_replan() {
        let config = MissionConfig::default();
        let mut planning_grid = config.map.build_grid().unwrap();
        let plan = CoveragePlanner::new(config.router.clone(), config.battery).plan(&mut planning_grid);

        let mut rng = StdRng::seed_from_u64(2024);
        let schedule = ObstacleSchedule::random(&plan.path, 6, &mut rng);
        let mut grid = config.map.build_grid().unwrap();
        let mut memory = ObstacleLog::new();
        let summary =
            DynamicMission::new(&mut grid, plan.path.clone(), config.battery, schedule).run_with_memory(&mut memory);

        for event in summary.replanning_events() {
            assert!(!summary.executed[event.step + 1..].contains(&event.obstacle));
        }
        assert!(grid.dynamic_obstacles().len() >= summary.replanning_events().count());
        let expected: Vec<_> = summary.outcomes.iter().map(|o| o.obstacle()).unique().collect();
        assert_eq!(memory.known_obstacles(), expected);
    }

    #[test]
    fn test_sample_mission_with_replanner_budget() {
        let mut config = MissionConfig::default();
        config.replanner = ReplannerConfig {
            max_iterations: Some(100_000),
        };
        let mut planning_grid = config.map.build_grid().unwrap();
        let plan = CoveragePlanner::new(config.router.clone(), config.battery).plan(&mut planning_grid);

        let mut grid = config.map.build_grid().unwrap();
        let summary = DynamicMission::new(&mut grid, plan.path.clone(), config.battery, config.map.schedule())
            .with_replanner(config.replanner.clone())
            .run();
        assert!(!summary
            .outcomes
            .iter()
            .any(|o| matches!(o, ReplanOutcome::BudgetExceeded { .. })));

        let mut grid = config.map.build_grid().unwrap();
        let starved = DynamicMission::new(&mut grid, plan.path.clone(), config.battery, config.map.schedule())
            .with_replanner(ReplannerConfig {
                max_iterations: Some(1),
            })
            .run();
        assert_eq!(starved.replanning_events().count(), 0);
        assert!(starved
            .outcomes
            .iter()
            .all(|o| matches!(o, ReplanOutcome::BudgetExceeded { .. })));
    }
}
