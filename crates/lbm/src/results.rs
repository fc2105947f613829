//! Reduction of the lattice into the scalar results matrix.

use serde::{Deserialize, Serialize};

use crate::boundary::BoundaryConditions;
use crate::grid::Grid;

/// Scalar field extracted for the external consumer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultsType {
    /// Per-cell sum of the 9 distribution values.
    #[default]
    Density,
    /// Euclidean magnitude of the per-cell velocity.
    Speed,
    /// Discrete curl of the velocity field.
    Vorticity,
}

/// Reduce `grid` into `out` (rows x cols, row-major). The caller holds the
/// results lock for the duration of the call.
pub fn extract(grid: &Grid, boundary: BoundaryConditions, what: ResultsType, out: &mut [f64]) {
    debug_assert_eq!(out.len(), grid.rows * grid.cols);

    match what {
        ResultsType::Density => {
            for y in 0..grid.rows {
                for x in 0..grid.cols {
                    out[grid.idx(x, y)] = grid.cell(x, y).density();
                }
            }
        }
        ResultsType::Speed => {
            for y in 0..grid.rows {
                for x in 0..grid.cols {
                    out[grid.idx(x, y)] = grid.velocity(x, y).length();
                }
            }
        }
        ResultsType::Vorticity => {
            for y in 0..grid.rows {
                for x in 0..grid.cols {
                    out[grid.idx(x, y)] = vorticity(grid, boundary, x, y);
                }
            }
        }
    }
}

/// Forward-difference curl `d(uy)/dx - d(ux)/dy`. Neighbor lookups wrap
/// under `Periodic`; at a domain edge under `BounceBack` the missing
/// difference contributes zero.
fn vorticity(grid: &Grid, boundary: BoundaryConditions, x: usize, y: usize) -> f64 {
    let v = grid.velocity(x, y);

    let duy_dx = match forward_neighbor(x, grid.cols, boundary) {
        Some(xn) => grid.velocity(xn, y).y - v.y,
        None => 0.0,
    };
    let dux_dy = match forward_neighbor(y, grid.rows, boundary) {
        Some(yn) => grid.velocity(x, yn).x - v.x,
        None => 0.0,
    };

    duy_dx - dux_dy
}

#[inline]
fn forward_neighbor(i: usize, extent: usize, boundary: BoundaryConditions) -> Option<usize> {
    if i + 1 < extent {
        Some(i + 1)
    } else if boundary == BoundaryConditions::Periodic {
        Some(0)
    } else {
        None
    }
}
