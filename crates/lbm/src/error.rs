//! Error types surfaced by `init` / `simulate`.
//!
//! Misconfiguration is detected synchronously before any worker is spawned.
//! Steady-state numerical issues (NaN, negative density under an unstable
//! tau) are not errors; they are data, visible through the results matrix.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum LatticeError {
    #[error("obstacle mask has zero rows or columns")]
    EmptyObstacleMask,

    #[error("worker thread count must be at least 1")]
    InvalidThreadCount,

    #[error("{threads} worker threads cannot partition {cols} lattice columns")]
    TooManyThreads { threads: usize, cols: usize },

    #[error("relaxation time tau must be positive, got {0}")]
    InvalidTau(f64),

    #[error("results refresh interval must be at least 1 step")]
    InvalidRefreshInterval,

    #[error("simulation requires init() before simulate()")]
    NotInitialized,

    #[error("a worker thread panicked during a simulation step")]
    WorkerPanicked,
}
