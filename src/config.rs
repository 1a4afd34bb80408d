//! Mission configuration
//!
//! Everything a mission needs is described here and deserialized from TOML.
//! Every field is defaulted, so an empty file yields the sample surveillance
//! mission: a 20x20 area with two no-fly zones, a few static obstacles and
//! three obstacles that only show up in flight.

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::common::{Cell, SurveyError, SurveyResult};
use crate::mapping::{GridModel, ZoneKind};
use crate::mission_planning::{ExecutionConfig, ObstacleSchedule};
use crate::path_planning::{ReplannerConfig, RouterConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    /// Battery available to both stages
    pub battery: f64,
    pub router: RouterConfig,
    pub replanner: ReplannerConfig,
    pub execution: ExecutionConfig,
    pub map: MapConfig,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            battery: 500.0,
            router: RouterConfig::default(),
            replanner: ReplannerConfig::default(),
            execution: ExecutionConfig::default(),
            map: MapConfig::default(),
        }
    }
}

impl MissionConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> SurveyResult<Self> {
        let config: MissionConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> SurveyResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        info!("loaded mission configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> SurveyResult<()> {
        if !(self.battery.is_finite() && self.battery >= 0.0) {
            return Err(SurveyError::Config(format!(
                "battery must be non-negative, got {}",
                self.battery
            )));
        }
        self.router.validate()?;
        self.execution.validate()?;
        self.map.validate()
    }
}

/// Rectangular zone, rows `row_start..row_end` x cols `col_start..col_end`
/// (half-open). Parts outside the grid are clipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub row_start: i32,
    pub row_end: i32,
    pub col_start: i32,
    pub col_end: i32,
    #[serde(default = "default_zone_kind")]
    pub kind: ZoneKind,
}

fn default_zone_kind() -> ZoneKind {
    ZoneKind::NoFly
}

impl ZoneSpec {
    pub fn no_fly(row_start: i32, row_end: i32, col_start: i32, col_end: i32) -> Self {
        Self {
            row_start,
            row_end,
            col_start,
            col_end,
            kind: ZoneKind::NoFly,
        }
    }
}

/// Obstacle that becomes known once `step` cells have been flown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledObstacle {
    pub step: usize,
    pub cell: Cell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub rows: usize,
    pub cols: usize,
    pub start: Cell,
    pub no_fly_zones: Vec<ZoneSpec>,
    pub obstacles: Vec<Cell>,
    pub dynamic_obstacles: Vec<ScheduledObstacle>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self::sample(20, 20)
    }
}

const SAMPLE_OBSTACLES: [(i32, i32); 21] = [
    (2, 5), (2, 6), (3, 5), (3, 6),
    (8, 2), (8, 3), (9, 2), (9, 3),
    (12, 15), (13, 15), (12, 16),
    (1, 18), (2, 18), (3, 18), (4, 18),
    (17, 12), (17, 13), (18, 12),
    (6, 18), (7, 18), (7, 17),
];

const SAMPLE_DISCOVERIES: [(usize, (i32, i32)); 3] = [(50, (3, 10)), (120, (7, 14)), (200, (15, 8))];

impl MapConfig {
    /// Sample surveillance map laid out for a 20x20 area. On a smaller grid
    /// the cells that fall outside are dropped and the zones are clipped.
    pub fn sample(rows: usize, cols: usize) -> Self {
        let inside = |cell: &Cell| {
            cell.row >= 0 && cell.col >= 0 && (cell.row as usize) < rows && (cell.col as usize) < cols
        };
        Self {
            rows,
            cols,
            start: Cell::new(0, 0),
            no_fly_zones: vec![ZoneSpec::no_fly(5, 9, 10, 14), ZoneSpec::no_fly(14, 18, 3, 7)],
            obstacles: SAMPLE_OBSTACLES
                .iter()
                .map(|&(r, c)| Cell::new(r, c))
                .filter(inside)
                .collect(),
            dynamic_obstacles: SAMPLE_DISCOVERIES
                .iter()
                .map(|&(step, (r, c))| ScheduledObstacle {
                    step,
                    cell: Cell::new(r, c),
                })
                .filter(|o| inside(&o.cell))
                .collect(),
        }
    }

    fn in_bounds(&self, cell: Cell) -> bool {
        cell.row >= 0 && cell.col >= 0 && (cell.row as usize) < self.rows && (cell.col as usize) < self.cols
    }

    pub fn validate(&self) -> SurveyResult<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(SurveyError::InvalidMap(format!(
                "grid must not be empty, got {}x{}",
                self.rows, self.cols
            )));
        }
        if !self.in_bounds(self.start) {
            return Err(SurveyError::InvalidMap(format!("start {} is outside the grid", self.start)));
        }
        for zone in &self.no_fly_zones {
            if zone.row_start > zone.row_end || zone.col_start > zone.col_end {
                return Err(SurveyError::InvalidMap(format!("inverted zone {:?}", zone)));
            }
        }
        if let Some(cell) = self.obstacles.iter().find(|&&c| !self.in_bounds(c)) {
            return Err(SurveyError::InvalidMap(format!("obstacle {} is outside the grid", cell)));
        }
        if let Some(o) = self.dynamic_obstacles.iter().find(|o| !self.in_bounds(o.cell)) {
            return Err(SurveyError::InvalidMap(format!(
                "obstacle {} scheduled at step {} is outside the grid",
                o.cell, o.step
            )));
        }
        Ok(())
    }

    /// Build the pre-flight grid: start first, then zones, then static
    /// obstacles. Neither overwrites the launch cell.
    pub fn build_grid(&self) -> SurveyResult<GridModel> {
        self.validate()?;
        let mut grid = GridModel::new(self.rows, self.cols);
        grid.set_start(self.start);
        for zone in &self.no_fly_zones {
            grid.stamp_zone(zone.row_start, zone.row_end, zone.col_start, zone.col_end, zone.kind);
        }
        for &cell in &self.obstacles {
            grid.add_obstacle(cell);
        }
        Ok(grid)
    }

    pub fn schedule(&self) -> ObstacleSchedule {
        self.dynamic_obstacles.iter().map(|o| (o.step, o.cell)).collect()
    }
}
