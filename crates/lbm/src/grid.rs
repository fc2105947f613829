//! Lattice grid - a rows x cols array of D2Q9 cells plus the solid mask.
//!
//! Two grids exist during a simulation run: the *current* grid (read-only
//! for the duration of one step) and the *work* grid being written by the
//! workers. Swapping them is an O(1) index flip owned by the orchestrator.

use glam::DVec2;

use crate::boundary::BoundaryConditions;
use crate::cell::Cell;

/// Externally supplied obstacle map, consumed once when a grid is built.
///
/// Coordinates are `(x, y)` = (column, row) throughout the crate.
#[derive(Clone, Debug)]
pub struct ObstacleMask {
    pub rows: usize,
    pub cols: usize,
    blocked: Vec<bool>,
}

impl ObstacleMask {
    /// Mask with no obstacles.
    pub fn open(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            blocked: vec![false; rows * cols],
        }
    }

    /// Mask built from a predicate over `(x, y)`.
    pub fn from_fn(rows: usize, cols: usize, mut blocked: impl FnMut(usize, usize) -> bool) -> Self {
        let mut mask = Self::open(rows, cols);
        for y in 0..rows {
            for x in 0..cols {
                mask.blocked[y * cols + x] = blocked(x, y);
            }
        }
        mask
    }

    /// Mark a single site as an obstacle.
    pub fn block(&mut self, x: usize, y: usize) {
        self.blocked[y * self.cols + x] = true;
    }

    #[inline]
    pub fn is_blocked(&self, x: usize, y: usize) -> bool {
        self.blocked[y * self.cols + x]
    }
}

/// A rows x cols lattice of cells, flat row-major storage.
pub struct Grid {
    pub rows: usize,
    pub cols: usize,
    pub(crate) cells: Vec<Cell>,
    solid: Vec<bool>,
}

impl Grid {
    /// Build the initial grid from an obstacle mask. Obstacle sites and,
    /// under non-periodic boundary conditions, the top and bottom rows are
    /// marked solid (all-zero); every other site starts at rest equilibrium.
    pub fn from_mask(mask: &ObstacleMask, boundary: BoundaryConditions) -> Self {
        let (rows, cols) = (mask.rows, mask.cols);
        let mut cells = vec![Cell::default(); rows * cols];
        let mut solid = vec![false; rows * cols];

        for y in 0..rows {
            for x in 0..cols {
                let wall_row =
                    boundary != BoundaryConditions::Periodic && (y == 0 || y == rows - 1);
                if mask.is_blocked(x, y) || wall_row {
                    cells[y * cols + x] = Cell::solid();
                    solid[y * cols + x] = true;
                }
            }
        }

        Self {
            rows,
            cols,
            cells,
            solid,
        }
    }

    /// Fresh work buffer with the same shape and solid pattern.
    pub fn work_buffer(&self) -> Self {
        let cells = self
            .solid
            .iter()
            .map(|&s| if s { Cell::solid() } else { Cell::default() })
            .collect();
        Self {
            rows: self.rows,
            cols: self.cols,
            cells,
            solid: self.solid.clone(),
        }
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.cols && y < self.rows);
        y * self.cols + x
    }

    #[inline]
    pub fn cell(&self, x: usize, y: usize) -> &Cell {
        &self.cells[y * self.cols + x]
    }

    #[inline]
    pub fn set_cell(&mut self, x: usize, y: usize, cell: Cell) {
        self.cells[y * self.cols + x] = cell;
    }

    #[inline]
    pub fn is_solid(&self, x: usize, y: usize) -> bool {
        self.solid[y * self.cols + x]
    }

    /// Macroscopic velocity at a site (zero on solids).
    #[inline]
    pub fn velocity(&self, x: usize, y: usize) -> DVec2 {
        self.cell(x, y).velocity()
    }

    /// Total density summed over the whole lattice. Diagnostic: invariant
    /// on a fully periodic domain without forcing or inlet/outlet.
    pub fn total_density(&self) -> f64 {
        self.cells.iter().map(Cell::density).sum()
    }
}
