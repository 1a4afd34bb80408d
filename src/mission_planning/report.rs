//! Plan, execution and statistics bundled for export

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::{Cell, SurveyResult};
use crate::mission_planning::{CoveragePlan, ExecutionSummary, MissionStats, PlanStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionReport {
    pub waypoints: Vec<Cell>,
    pub plan: Vec<Cell>,
    pub plan_status: PlanStatus,
    pub plan_stats: MissionStats,
    pub execution: Option<ExecutionSummary>,
}

impl MissionReport {
    pub fn new(plan: &CoveragePlan, execution: Option<ExecutionSummary>) -> Self {
        MissionReport {
            waypoints: plan.waypoints.clone(),
            plan: plan.path.clone(),
            plan_status: plan.status,
            plan_stats: plan.stats.clone(),
            execution,
        }
    }

    pub fn to_json_pretty(&self) -> SurveyResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> SurveyResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> SurveyResult<()> {
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::GridModel;
    use crate::mission_planning::{CoveragePlanner, DynamicMission, ObstacleSchedule};
    use crate::path_planning::RouterConfig;

    #[test]
    fn test_report_json_keeps_stats() {
        let mut grid = GridModel::new(3, 4);
        grid.set_start(Cell::new(0, 0));
        let plan = CoveragePlanner::new(RouterConfig::default(), 100.0).plan(&mut grid);

        let mut fresh = GridModel::new(3, 4);
        fresh.set_start(Cell::new(0, 0));
        let execution = DynamicMission::new(&mut fresh, plan.path.clone(), 100.0, ObstacleSchedule::new()).run();

        let report = MissionReport::new(&plan, Some(execution));
        let json = report.to_json_pretty().unwrap();
        assert!(json.contains("\"coverage_pct\": 100.0"));
        assert!(json.contains("\"battery_remaining\""));

        let restored = MissionReport::from_json(&json).unwrap();
        assert_eq!(restored.plan_stats.total_steps, plan.stats.total_steps);
        assert!((restored.plan_stats.total_energy - plan.stats.total_energy).abs() < 1e-9);
        assert_eq!(restored.plan_status, plan.status);
        assert_eq!(restored.plan.len(), plan.path.len());
    }
}
