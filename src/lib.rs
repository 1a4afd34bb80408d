//! survey_planner - coverage path planning for a survey drone
//!
//! A grid world with no-fly zones and obstacles is swept boustrophedon
//! style, consecutive waypoints are joined by an energy-aware A* router
//! under a battery budget, and the committed path is then flown while a
//! D* Lite replanner repairs it around obstacles discovered in flight.

// Core modules
pub mod common;
pub mod config;

// Algorithm modules
pub mod mapping;
pub mod path_planning;
pub mod mission_planning;

// Re-export common types for convenience
pub use common::{Cell, Direction, Route, ALL_MOVES, STRAIGHT_MOVES};
pub use common::{ObstacleLog, ObstacleMemory};
pub use common::{SurveyError, SurveyResult};
pub use config::{MapConfig, MissionConfig};
