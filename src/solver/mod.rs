//! Numerical solvers
//!
//! # The Architecture (WHAT vs HOW)
//!
//! 1. **Scenario** (`Scenario`) - WHAT to solve: model + initial condition
//! 2. **Configuration** (`SolverConfiguration`) - HOW to solve: step count or
//!    step size, recording stride
//! 3. **Solver** (`Solver` trait) - the numerical method (Euler, RK4)
//!
//! # Quick Start Example
//!
//! ```rust
//! use biosim_rs::models::Relaxation;
//! use biosim_rs::physics::PhysicalQuantity;
//! use biosim_rs::solver::{RK4Solver, Scenario, Solver, SolverConfiguration};
//!
//! let scenario = Scenario::from_model(Box::new(Relaxation::new(0.0)));
//! let config = SolverConfiguration::fixed_step(10.0, 0.1);
//! let result = RK4Solver::new().solve(&scenario, &config)?;
//!
//! let x = result.final_state.get(PhysicalQuantity::Concentration).unwrap().as_scalar();
//! assert!((x - (1.0 - (-10.0f64).exp())).abs() < 1e-6);
//! # Ok::<(), biosim_rs::SimulationError>(())
//! ```
//!
//! # Error Handling
//!
//! All solver methods return [`crate::error::Result`]. Common errors:
//! - Invalid configuration (negative time, zero steps)
//! - Invalid scenario (no initial condition)
//! - Numerical instability (NaN or Inf in a stored state)

// =================================================================================================
// Module Declarations
// =================================================================================================
mod boundary;
pub mod convergence;
mod methods;
mod scenario;
mod traits;

// =================================================================================================
// Parallel Execution Threshold
// =================================================================================================
//
// Stored in an AtomicUsize so that benchmarks and tests can change it at
// runtime without a mutex on every `apply()` call. Relaxed ordering is
// enough: the value is a performance hint, not a synchronisation point.
// =================================================================================================

use std::sync::atomic::{AtomicUsize, Ordering};

/// Default number of elements above which [`PhysicalData::apply()`](crate::physics::PhysicalData::apply)
/// switches to parallel iteration.
///
/// A 1500 m column at 0.5 m resolution has 3001 cells, so eDNA profiles are
/// processed in parallel while kinetic models stay sequential.
const DEFAULT_PARALLEL_THRESHOLD: usize = 999;

static PARALLEL_THRESHOLD: AtomicUsize = AtomicUsize::new(DEFAULT_PARALLEL_THRESHOLD);

/// Return the current parallel-execution threshold.
///
/// ```rust
/// use biosim_rs::solver::parallel_threshold;
///
/// assert!(parallel_threshold() > 0);
/// ```
pub fn parallel_threshold() -> usize {
    PARALLEL_THRESHOLD.load(Ordering::Relaxed)
}

/// Set the parallel-execution threshold to a new value.
///
/// # Panics
///
/// Panics when `threshold == 0`.
pub fn set_parallel_threshold(threshold: usize) {
    assert!(threshold > 0, "parallel threshold must be at least 1");
    PARALLEL_THRESHOLD.store(threshold, Ordering::Relaxed);
}

/// RAII guard that sets a threshold and restores the previous one on drop
#[cfg(test)]
pub(crate) struct ThresholdGuard {
    previous: usize,
}

#[cfg(test)]
impl ThresholdGuard {
    pub(crate) fn save(new_value: usize) -> Self {
        let previous = parallel_threshold();
        set_parallel_threshold(new_value);
        Self { previous }
    }
}

#[cfg(test)]
impl Drop for ThresholdGuard {
    fn drop(&mut self) {
        PARALLEL_THRESHOLD.store(self.previous, Ordering::Relaxed);
    }
}

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use traits::{SimulationResult, Solver, SolverConfiguration, SolverType};

pub use boundary::{DimensionBoundary, DomainBoundaries, TimeAxisConvention};
pub use scenario::Scenario;

pub use methods::{EulerSolver, RK4Solver};

// =================================================================================================
// Helper Functions
// =================================================================================================

use crate::error::{NonFinite, Result, SimulationError};
use crate::physics::PhysicalState;

/// Check that a state holds no NaN or Inf values
pub(crate) fn validate_state(state: &PhysicalState, step: usize) -> Result<()> {
    for (quantity, data) in state.iter() {
        if let Some(is_nan) = data.first_non_finite() {
            return Err(SimulationError::Instability {
                quantity: *quantity,
                kind: if is_nan { NonFinite::NaN } else { NonFinite::Infinity },
                step,
            });
        }
    }
    Ok(())
}

/// Collects the stored part of a trajectory according to the recording stride
pub(crate) struct TrajectoryRecorder {
    stride: usize,
    total_steps: usize,
    time_points: Vec<f64>,
    states: Vec<PhysicalState>,
}

impl TrajectoryRecorder {
    pub(crate) fn new(initial: &PhysicalState, total_steps: usize, stride: usize) -> Self {
        let capacity = total_steps / stride + 2;
        let mut time_points = Vec::with_capacity(capacity);
        let mut states = Vec::with_capacity(capacity);
        time_points.push(0.0);
        states.push(initial.clone());
        Self {
            stride,
            total_steps,
            time_points,
            states,
        }
    }

    /// Offer the state reached after `step` steps (1-based)
    pub(crate) fn record(&mut self, step: usize, time: f64, state: &PhysicalState) {
        if step % self.stride == 0 || step == self.total_steps {
            self.time_points.push(time);
            self.states.push(state.clone());
        }
    }

    pub(crate) fn finish(self, final_state: PhysicalState) -> SimulationResult {
        SimulationResult::new(self.time_points, self.states, final_state)
    }
}

/// Initial condition of a scenario, or an error
pub(crate) fn initial_state(scenario: &Scenario) -> Result<PhysicalState> {
    scenario
        .conditions
        .initial_condition()
        .cloned()
        .ok_or_else(|| {
            SimulationError::InvalidScenario("No initial condition found in domain boundaries".to_string())
        })
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{PhysicalData, PhysicalQuantity};

    #[test]
    fn test_default_threshold_value() {
        assert_eq!(DEFAULT_PARALLEL_THRESHOLD, 999);
    }

    #[test]
    fn test_threshold_guard_restores_previous_value() {
        let before = parallel_threshold();
        {
            let _guard = ThresholdGuard::save(42);
            assert_eq!(parallel_threshold(), 42);
        }
        assert_eq!(parallel_threshold(), before);
    }

    #[test]
    #[should_panic(expected = "parallel threshold must be at least 1")]
    fn test_zero_threshold_panics() {
        set_parallel_threshold(0);
    }

    #[test]
    fn test_validate_state_reports_quantity() {
        let state = PhysicalState::new(
            PhysicalQuantity::SmallEdna,
            PhysicalData::from_vec(vec![0.0, f64::INFINITY]),
        );
        match validate_state(&state, 7) {
            Err(SimulationError::Instability { quantity, kind, step }) => {
                assert_eq!(quantity, PhysicalQuantity::SmallEdna);
                assert_eq!(kind, NonFinite::Infinity);
                assert_eq!(step, 7);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_recorder_keeps_first_and_last() {
        let state = PhysicalState::new(PhysicalQuantity::Concentration, PhysicalData::Scalar(0.0));
        let mut recorder = TrajectoryRecorder::new(&state, 7, 3);
        for step in 1..=7 {
            recorder.record(step, step as f64, &state);
        }
        let result = recorder.finish(state);
        assert_eq!(result.time_points, vec![0.0, 3.0, 6.0, 7.0]);
    }
}
