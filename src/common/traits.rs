//! Common traits shared between the planner and its collaborators

use serde::{Deserialize, Serialize};

use crate::common::error::SurveyResult;
use crate::common::types::Cell;

/// Store of obstacles discovered in flight that outlives a single mission
///
/// Writes go through `&mut self`, so while a mission runs it is the only
/// writer. An implementation shared by missions running concurrently must
/// serialize its writers itself (at most one writer at a time).
pub trait ObstacleMemory {
    /// Remember an obstacle discovered at `cell`
    fn record_obstacle(&mut self, cell: Cell);

    /// Every obstacle remembered so far, in discovery order
    fn known_obstacles(&self) -> Vec<Cell>;
}

/// In-memory obstacle memory with JSON import/export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObstacleLog {
    obstacles: Vec<Cell>,
}

impl ObstacleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn to_json(&self) -> SurveyResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> SurveyResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl ObstacleMemory for ObstacleLog {
    fn record_obstacle(&mut self, cell: Cell) {
        if !self.obstacles.contains(&cell) {
            self.obstacles.push(cell);
        }
    }

    fn known_obstacles(&self) -> Vec<Cell> {
        self.obstacles.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obstacle_log_deduplicates() {
        let mut log = ObstacleLog::new();
        log.record_obstacle(Cell::new(3, 10));
        log.record_obstacle(Cell::new(7, 14));
        log.record_obstacle(Cell::new(3, 10));
        assert_eq!(log.known_obstacles(), vec![Cell::new(3, 10), Cell::new(7, 14)]);
    }

    #[test]
    fn test_obstacle_log_json_import_export() {
        let mut log = ObstacleLog::new();
        log.record_obstacle(Cell::new(15, 8));
        let json = log.to_json().unwrap();
        let restored = ObstacleLog::from_json(&json).unwrap();
        assert_eq!(restored, log);
    }

    #[test]
    fn test_obstacle_log_rejects_garbage() {
        assert!(ObstacleLog::from_json("not json").is_err());
    }
}
