//! Simulation configuration.

use serde::{Deserialize, Serialize};

use crate::boundary::{BoundaryConditions, EdgeCondition};
use crate::error::LatticeError;
use crate::results::ResultsType;

/// Full parameter set consumed at `init()` / `simulate()` entry.
///
/// Defaults mirror a stable channel-flow setup: tau 0.6, a mild inlet and
/// outlet velocity of 0.5, eight workers, results refreshed every 10 steps
/// after a 2000-step warm-up.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatticeConfig {
    /// Scalar field written to the results matrix.
    pub results_type: ResultsType,
    /// Top/bottom edge treatment.
    pub boundary_conditions: BoundaryConditions,
    /// BGK relaxation time.
    pub tau: f64,
    /// Uniform horizontal body force (acceleration per step).
    pub accel_x: f64,
    /// Enable flag for `accel_x`.
    pub use_accel_x: bool,
    /// Condition on column 0; `None` leaves the column periodic.
    pub inlet: Option<EdgeCondition>,
    /// Condition on the last column; `None` leaves the column periodic.
    pub outlet: Option<EdgeCondition>,
    /// Size of the worker pool.
    pub num_threads: usize,
    /// Extraction interval in steps, after warm-up.
    pub refresh_steps: u64,
    /// Steps to run before the first extraction, letting transients settle.
    pub warmup_steps: u64,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            results_type: ResultsType::Density,
            boundary_conditions: BoundaryConditions::BounceBack,
            tau: 0.6,
            accel_x: 0.015,
            use_accel_x: false,
            inlet: Some(EdgeCondition::Velocity(0.5)),
            outlet: Some(EdgeCondition::Velocity(0.5)),
            num_threads: 8,
            refresh_steps: 10,
            warmup_steps: 2000,
        }
    }
}

impl LatticeConfig {
    /// Reject configurations that would produce undefined partitioning or
    /// a degenerate collision step. Runs before any worker is spawned.
    pub fn validate(&self, cols: usize) -> Result<(), LatticeError> {
        if self.num_threads == 0 {
            return Err(LatticeError::InvalidThreadCount);
        }
        if self.num_threads > cols {
            return Err(LatticeError::TooManyThreads {
                threads: self.num_threads,
                cols,
            });
        }
        if !(self.tau > 0.0) {
            return Err(LatticeError::InvalidTau(self.tau));
        }
        if self.refresh_steps == 0 {
            return Err(LatticeError::InvalidRefreshInterval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        LatticeConfig::default().validate(64).unwrap();
    }

    #[test]
    fn zero_threads_rejected() {
        let config = LatticeConfig {
            num_threads: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(64), Err(LatticeError::InvalidThreadCount));
    }

    #[test]
    fn more_threads_than_columns_rejected() {
        let config = LatticeConfig {
            num_threads: 9,
            ..Default::default()
        };
        assert_eq!(
            config.validate(8),
            Err(LatticeError::TooManyThreads { threads: 9, cols: 8 })
        );
    }

    #[test]
    fn nan_tau_rejected() {
        let config = LatticeConfig {
            tau: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(config.validate(64), Err(LatticeError::InvalidTau(_))));
    }
}
