//! Collide-and-stream kernel for one worker's column range.
//!
//! The kernel is a gather (pull) formulation of collide-then-stream: each
//! worker first computes post-collision distributions from the read-only
//! current grid for its columns plus one wrapped halo column on each side,
//! then assembles every target cell in its own range from those values.
//! Workers therefore write only their own disjoint columns of the work
//! grid; the halo columns are recomputed by both neighbors instead of being
//! exchanged, which keeps the step free of inter-worker synchronization.
//!
//! Streaming wraps along x; along y it wraps under `Periodic` and reflects
//! (half-way bounce-back) off solid sites, which under `BounceBack` include
//! the top and bottom wall rows. Each post-collision value is consumed
//! exactly once, so the interior update conserves mass.

use std::ops::Range;

use crate::boundary::{self, BoundaryConditions, EdgeCondition};
use crate::cell::{Cell, OPPOSITE, Q, VELOCITIES, WEIGHTS};
use crate::config::LatticeConfig;
use crate::grid::Grid;

/// Per-step physics parameters, frozen for the lifetime of one run.
#[derive(Clone, Copy, Debug)]
pub struct KernelParams {
    pub tau: f64,
    /// Forcing magnitude: acceleration times relaxation time.
    pub accel_x_tau: f64,
    pub use_accel_x: bool,
    pub boundary: BoundaryConditions,
    pub inlet: Option<EdgeCondition>,
    pub outlet: Option<EdgeCondition>,
}

impl KernelParams {
    pub fn from_config(config: &LatticeConfig) -> Self {
        Self {
            tau: config.tau,
            accel_x_tau: config.accel_x * config.tau,
            use_accel_x: config.use_accel_x,
            boundary: config.boundary_conditions,
            inlet: config.inlet,
            outlet: config.outlet,
        }
    }
}

/// Kernel state owned by one worker: its column range and the persistent
/// post-collision buffer covering that range plus the two halo columns.
pub struct ColumnWorker {
    columns: Range<usize>,
    rows: usize,
    grid_cols: usize,
    params: KernelParams,
    /// Post-collision cells, `(columns.len() + 2) * rows`, halo columns at
    /// local index 0 and len+1.
    post: Vec<Cell>,
}

impl ColumnWorker {
    pub fn new(columns: Range<usize>, rows: usize, grid_cols: usize, params: KernelParams) -> Self {
        let len = columns.len();
        Self {
            columns,
            rows,
            grid_cols,
            params,
            post: vec![Cell::solid(); (len + 2) * rows],
        }
    }

    /// Advance this worker's columns by one step, reading `current` and
    /// emitting each finished cell through `write`.
    pub fn step<W: FnMut(usize, usize, Cell)>(&mut self, current: &Grid, mut write: W) {
        let len = self.columns.len();
        let rows = self.rows;

        // Pass 1: relax toward equilibrium over the halo-extended range.
        for local in 0..len + 2 {
            let x = self.global_x(local);
            for y in 0..rows {
                self.post[local * rows + y] = if current.is_solid(x, y) {
                    Cell::solid()
                } else {
                    self.post_collision(current.cell(x, y))
                };
            }
        }

        // Pass 2: gather streamed populations into the owned columns.
        for local in 1..=len {
            let x = self.columns.start + local - 1;
            for y in 0..rows {
                if current.is_solid(x, y) {
                    write(x, y, Cell::solid());
                    continue;
                }

                let here = self.post[local * rows + y];
                let mut f = [0.0; Q];
                f[0] = here.f[0];
                for i in 1..Q {
                    let [ex, ey] = VELOCITIES[i];
                    let source_local = (local as i32 - ex) as usize;
                    f[i] = match self.source_row(y, ey) {
                        Some(sy) if !current.is_solid(self.global_x(source_local), sy) => {
                            self.post[source_local * rows + sy].f[i]
                        }
                        // Solid or out-of-domain source: the population
                        // this cell emitted toward it comes back reversed.
                        _ => here.f[OPPOSITE[i]],
                    };
                }

                if x == 0 {
                    if let Some(condition) = self.params.inlet {
                        boundary::apply_inlet(&mut f, condition);
                    }
                } else if x == self.grid_cols - 1 {
                    if let Some(condition) = self.params.outlet {
                        boundary::apply_outlet(&mut f, condition);
                    }
                }

                write(x, y, Cell { f });
            }
        }
    }

    /// BGK relaxation plus optional horizontal forcing.
    fn post_collision(&self, cell: &Cell) -> Cell {
        let rho = cell.density();
        if rho <= 0.0 {
            return Cell::solid();
        }
        let u = cell.momentum() / rho;
        let eq = Cell::equilibrium(rho, u);

        let mut f = [0.0; Q];
        for i in 0..Q {
            f[i] = cell.f[i] - (cell.f[i] - eq.f[i]) / self.params.tau;
        }
        if self.params.use_accel_x {
            for i in 0..Q {
                f[i] += 3.0 * WEIGHTS[i] * rho * VELOCITIES[i][0] as f64 * self.params.accel_x_tau;
            }
        }
        Cell { f }
    }

    /// Global column for a local buffer index (0 and len+1 are the wrapped
    /// halo columns).
    #[inline]
    fn global_x(&self, local: usize) -> usize {
        (self.columns.start as i32 + local as i32 - 1).rem_euclid(self.grid_cols as i32) as usize
    }

    /// Source row for a population arriving with vertical component `ey`,
    /// or `None` when the source lies beyond a non-periodic edge.
    #[inline]
    fn source_row(&self, y: usize, ey: i32) -> Option<usize> {
        let sy = y as i32 - ey;
        if (0..self.rows as i32).contains(&sy) {
            Some(sy as usize)
        } else if self.params.boundary == BoundaryConditions::Periodic {
            Some(sy.rem_euclid(self.rows as i32) as usize)
        } else {
            None
        }
    }
}
