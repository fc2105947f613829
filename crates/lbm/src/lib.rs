//! Parallel 2D lattice Boltzmann (D2Q9) flow solver.
//!
//! Advances a grid of particle-distribution cells through repeated
//! collide-and-stream steps to approximate incompressible flow around
//! obstacles:
//! - double-buffered lattice with O(1) swap between steps
//! - fixed pool of worker threads over disjoint column ranges,
//!   re-synchronized per step by a reusable two-phase barrier
//! - bounce-back or periodic vertical edges, Zou/He inlet/outlet
//! - density / speed / vorticity extraction into a lock-guarded results
//!   matrix for an external consumer
//!
//! This crate is rendering-agnostic: it produces the results matrix only.
//! Parameter loading, visualization and persistence live with the caller.
//!
//! ```
//! use lbm::{Lattice, LatticeConfig, ObstacleMask, BoundaryConditions};
//!
//! let config = LatticeConfig {
//!     boundary_conditions: BoundaryConditions::Periodic,
//!     inlet: None,
//!     outlet: None,
//!     num_threads: 2,
//!     warmup_steps: 0,
//!     refresh_steps: 1,
//!     ..Default::default()
//! };
//! let mut lattice = Lattice::new(config);
//! lattice.init(&ObstacleMask::open(10, 10)).unwrap();
//! lattice.simulate_for(5).unwrap();
//! let field = lattice.results_snapshot();
//! assert_eq!(field.len(), 100);
//! ```

pub mod barrier;
pub mod boundary;
pub mod cell;
pub mod config;
pub mod error;
pub mod grid;
pub mod kernel;
pub mod lattice;
pub mod partition;
pub mod results;

pub use boundary::{BoundaryConditions, EdgeCondition};
pub use cell::Cell;
pub use config::LatticeConfig;
pub use error::LatticeError;
pub use grid::{Grid, ObstacleMask};
pub use lattice::{Lattice, ResultsHandle, SimulationState};
pub use results::ResultsType;
