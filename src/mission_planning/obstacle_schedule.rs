//! Mid-flight obstacle discoveries keyed by execution step

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::common::Cell;

/// Which obstacle becomes known at which executed step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSchedule {
    events: BTreeMap<usize, Cell>,
}

impl ObstacleSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `cell` for discovery at `step`, replacing any earlier entry
    pub fn insert(&mut self, step: usize, cell: Cell) -> Option<Cell> {
        self.events.insert(step, cell)
    }

    pub fn at(&self, step: usize) -> Option<Cell> {
        self.events.get(&step).copied()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Cell)> + '_ {
        self.events.iter().map(|(&step, &cell)| (step, cell))
    }

    /// Draw up to `count` discoveries, each placed on a cell of `path` that
    /// is still ahead of the drone at the step it is discovered. The launch
    /// cell is never chosen.
    pub fn random<R: Rng>(path: &[Cell], count: usize, rng: &mut R) -> Self {
        let mut schedule = Self::new();
        if path.len() < 3 {
            return schedule;
        }
        let launch = path[0];
        for _ in 0..count {
            let step = rng.gen_range(0..path.len() - 1);
            let cell = path[rng.gen_range(step + 1..path.len())];
            if cell != launch {
                schedule.insert(step, cell);
            }
        }
        schedule
    }
}

impl FromIterator<(usize, Cell)> for ObstacleSchedule {
    fn from_iter<I: IntoIterator<Item = (usize, Cell)>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}
