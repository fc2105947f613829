//! Boundary physics: vertical-edge treatment and inlet/outlet conditions.
//!
//! The top/bottom edges are governed by [`BoundaryConditions`]: either the
//! wall rows reflect populations (bounce-back) or the rows wrap. The left
//! (inlet, column 0) and right (outlet, last column) edges may each carry an
//! [`EdgeCondition`] that prescribes density or horizontal velocity; the
//! missing inward-pointing populations are reconstructed with the standard
//! Zou/He formulas, assuming no transverse velocity at the edge.

use serde::{Deserialize, Serialize};

/// Treatment of the top and bottom domain edges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryConditions {
    /// Solid reflective wall rows at top and bottom.
    #[default]
    BounceBack,
    /// Top and bottom edges wrap around.
    Periodic,
}

/// Prescribed condition on an inlet or outlet column. `None` in the
/// configuration leaves the column to the kernel's wraparound streaming,
/// which makes the domain fully periodic along the flow axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum EdgeCondition {
    /// Fix the summed density, inferring the edge-normal velocity.
    Density(f64),
    /// Fix the edge-normal velocity, inferring the density.
    Velocity(f64),
}

/// Zou/He reconstruction on the inlet (west) column. Unknowns are the
/// east-pointing populations 1, 5, 8; everything else is kept.
pub fn apply_inlet(f: &mut [f64; 9], condition: EdgeCondition) {
    // Density recoverable from the populations not crossing the edge.
    let known = f[0] + f[2] + f[4] + 2.0 * (f[3] + f[6] + f[7]);
    let (rho, ux) = match condition {
        EdgeCondition::Velocity(ux) => (known / (1.0 - ux), ux),
        EdgeCondition::Density(rho) => (rho, 1.0 - known / rho),
    };

    let transverse = 0.5 * (f[2] - f[4]);
    f[1] = f[3] + (2.0 / 3.0) * rho * ux;
    f[5] = f[7] - transverse + (1.0 / 6.0) * rho * ux;
    f[8] = f[6] + transverse + (1.0 / 6.0) * rho * ux;
}

/// Zou/He reconstruction on the outlet (east) column. Unknowns are the
/// west-pointing populations 3, 6, 7.
pub fn apply_outlet(f: &mut [f64; 9], condition: EdgeCondition) {
    let known = f[0] + f[2] + f[4] + 2.0 * (f[1] + f[5] + f[8]);
    let (rho, ux) = match condition {
        EdgeCondition::Velocity(ux) => (known / (1.0 + ux), ux),
        EdgeCondition::Density(rho) => (rho, known / rho - 1.0),
    };

    let transverse = 0.5 * (f[2] - f[4]);
    f[3] = f[1] - (2.0 / 3.0) * rho * ux;
    f[7] = f[5] + transverse - (1.0 / 6.0) * rho * ux;
    f[6] = f[8] - transverse - (1.0 / 6.0) * rho * ux;
}
