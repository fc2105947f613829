//! D2Q9 lattice cell - distribution values and macroscopic quantities.
//!
//! Direction layout (index into the distribution array):
//!
//! ```text
//!   6   2   5
//!     \ | /
//!   3 - 0 - 1
//!     / | \
//!   7   4   8
//! ```
//!
//! 0 is the rest population; 1-4 are the axis directions (E, N, W, S);
//! 5-8 are the diagonals (NE, NW, SW, SE).

use glam::DVec2;

/// Number of discrete velocities.
pub const Q: usize = 9;

/// Discrete velocity vectors `[ex, ey]` for each direction.
pub const VELOCITIES: [[i32; 2]; Q] = [
    [0, 0],
    [1, 0],
    [0, 1],
    [-1, 0],
    [0, -1],
    [1, 1],
    [-1, 1],
    [-1, -1],
    [1, -1],
];

/// Quadrature weights: 4/9 rest, 1/9 axes, 1/36 diagonals.
pub const WEIGHTS: [f64; Q] = [
    4.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
];

/// Index of the reversed direction, used by bounce-back reflection.
pub const OPPOSITE: [usize; Q] = [0, 3, 4, 1, 2, 7, 8, 5, 6];

/// Lattice speed of sound squared.
pub const CS2: f64 = 1.0 / 3.0;

/// A single lattice site holding the 9 distribution values.
///
/// A solid site (obstacle or bounce-back wall row) is represented by an
/// all-zero distribution; it then reports zero density and velocity and
/// participates only as a reflector for its neighbors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub f: [f64; Q],
}

impl Default for Cell {
    fn default() -> Self {
        // Rest equilibrium at unit density.
        Self::equilibrium(1.0, DVec2::ZERO)
    }
}

impl Cell {
    /// All-zero cell marking a solid site.
    #[inline]
    pub const fn solid() -> Self {
        Self { f: [0.0; Q] }
    }

    /// Equilibrium distribution for the given density and velocity:
    /// `f_i = w_i rho (1 + 3 e.u + 4.5 (e.u)^2 - 1.5 u.u)`.
    pub fn equilibrium(rho: f64, u: DVec2) -> Self {
        let u_sq = u.length_squared();
        let mut f = [0.0; Q];
        for i in 0..Q {
            let e = DVec2::new(VELOCITIES[i][0] as f64, VELOCITIES[i][1] as f64);
            let eu = e.dot(u);
            f[i] = WEIGHTS[i] * rho * (1.0 + 3.0 * eu + 4.5 * eu * eu - 1.5 * u_sq);
        }
        Self { f }
    }

    /// Local density: sum of the 9 distribution values.
    #[inline]
    pub fn density(&self) -> f64 {
        self.f.iter().sum()
    }

    /// First moment of the distribution over the discrete velocities.
    #[inline]
    pub fn momentum(&self) -> DVec2 {
        let mut m = DVec2::ZERO;
        for i in 1..Q {
            m.x += self.f[i] * VELOCITIES[i][0] as f64;
            m.y += self.f[i] * VELOCITIES[i][1] as f64;
        }
        m
    }

    /// Macroscopic velocity (momentum / density, zero for an empty site).
    #[inline]
    pub fn velocity(&self) -> DVec2 {
        let rho = self.density();
        if rho > 0.0 {
            self.momentum() / rho
        } else {
            DVec2::ZERO
        }
    }
}
