//! Boustrophedon (lawnmower) coverage ordering
//!
//! Rows are swept top to bottom, even rows left to right and odd rows right
//! to left. Only cells traversable at call time are emitted; obstacles found
//! later are left to the router and the executor.

use crate::common::Cell;
use crate::mapping::GridModel;

/// Ordered waypoints covering every currently traversable cell once
pub fn boustrophedon_sweep(grid: &GridModel) -> Vec<Cell> {
    let mut waypoints = Vec::new();
    for row in 0..grid.rows() {
        let cols: Box<dyn Iterator<Item = i32>> = if row % 2 == 0 {
            Box::new(0..grid.cols())
        } else {
            Box::new((0..grid.cols()).rev())
        };
        waypoints.extend(
            cols.map(|col| Cell::new(row, col))
                .filter(|&cell| grid.is_traversable(cell)),
        );
    }
    waypoints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::ZoneKind;

    #[test]
    fn test_sweep_alternates_by_row_parity() {
        let grid = GridModel::new(3, 3);
        let sweep = boustrophedon_sweep(&grid);
        let expected: Vec<Cell> = [
            (0, 0), (0, 1), (0, 2),
            (1, 2), (1, 1), (1, 0),
            (2, 0), (2, 1), (2, 2),
        ]
        .iter()
        .map(|&(r, c)| Cell::new(r, c))
        .collect();
        assert_eq!(sweep, expected);
    }

    #[test]
    fn test_sweep_skips_blocked_cells() {
        let mut grid = GridModel::new(4, 5);
        grid.set_start(Cell::new(0, 0));
        grid.stamp_zone(1, 3, 1, 3, ZoneKind::NoFly);
        grid.add_obstacle(Cell::new(3, 4));
        let sweep = boustrophedon_sweep(&grid);
        assert_eq!(sweep.len(), 20 - 4 - 1);
        assert_eq!(sweep[0], Cell::new(0, 0));
        assert!(sweep.iter().all(|&c| grid.is_traversable(c)));
    }

    #[test]
    fn test_sweep_is_deterministic() {
        let mut grid = GridModel::new(6, 7);
        grid.stamp_zone(2, 4, 2, 5, ZoneKind::Obstacle);
        assert_eq!(boustrophedon_sweep(&grid), boustrophedon_sweep(&grid));
    }

    #[test]
    fn test_sweep_is_not_revised_retroactively() {
        let mut grid = GridModel::new(2, 2);
        let sweep = boustrophedon_sweep(&grid);
        grid.discover_obstacle(Cell::new(1, 1));
        assert!(sweep.contains(&Cell::new(1, 1)));
        assert_eq!(boustrophedon_sweep(&grid).len(), 3);
    }
}
