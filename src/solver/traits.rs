//! Numerical solver traits and types
//!
//! - Central enum `SolverType` defines the kind of numerical solution
//! - `SolverConfiguration` wraps it together with output options
//! - `SimulationResult` stores the integrated trajectory
//! - `Solver` is the interface every integrator implements

use std::collections::HashMap;

use nalgebra::DMatrix;

use crate::error::{Result, SimulationError};
use crate::physics::{PhysicalData, PhysicalQuantity, PhysicalState};
use crate::solver::Scenario;

// ============================================================================
// Central Solver Type Enumeration
// ============================================================================

/// Type of numerical solution method
///
/// # Examples
///
/// ```rust
/// use biosim_rs::solver::SolverType;
///
/// // N steps over a horizon
/// let evolution = SolverType::TimeEvolution { total_time: 10.0, time_steps: 1000 };
/// assert_eq!(evolution.time_grid(), Some((0.01, 1000)));
///
/// // A fixed step, as in a `t = 0, dt, 2dt, ... < T` grid
/// let fixed = SolverType::FixedStep { total_time: 10.0, dt: 0.3 };
/// assert_eq!(fixed.time_grid().unwrap().1, 33);
/// ```
#[derive(Clone, Debug)]
pub enum SolverType {
    /// Time evolution with a given number of equal steps
    ///
    /// - `total_time`: Total simulated time
    /// - `time_steps`: Number of time steps (dt = total_time / time_steps)
    TimeEvolution { total_time: f64, time_steps: usize },

    /// Time evolution with a given step size
    ///
    /// Takes ⌊total_time / dt⌋ steps, so the last time point never exceeds
    /// `total_time`.
    FixedStep { total_time: f64, dt: f64 },

    /// Iterative solution to convergence
    Iterative { tolerance: f64, max_iterations: usize },

    /// Analytical exact solution
    Analytical { evaluation_time: Option<f64> },
}

impl SolverType {
    /// Get name identifier
    pub fn name(&self) -> &str {
        match self {
            SolverType::TimeEvolution { .. } => "TimeEvolution",
            SolverType::FixedStep { .. } => "FixedStep",
            SolverType::Iterative { .. } => "Iterative",
            SolverType::Analytical { .. } => "Analytical",
        }
    }

    /// Validate that parameters are physically meaningful
    pub fn validate(&self) -> Result<()> {
        match self {
            SolverType::TimeEvolution { total_time, time_steps } => {
                if !total_time.is_finite() || *total_time <= 0.0 {
                    return Err(SimulationError::InvalidConfiguration(
                        "Total time must be positive".to_string(),
                    ));
                }
                if *time_steps == 0 {
                    return Err(SimulationError::InvalidConfiguration(
                        "Time steps must be greater than 0".to_string(),
                    ));
                }
                Ok(())
            }
            SolverType::FixedStep { total_time, dt } => {
                if !total_time.is_finite() || *total_time <= 0.0 {
                    return Err(SimulationError::InvalidConfiguration(
                        "Total time must be positive".to_string(),
                    ));
                }
                if !dt.is_finite() || *dt <= 0.0 {
                    return Err(SimulationError::InvalidConfiguration(
                        "Time step must be positive".to_string(),
                    ));
                }
                if *dt > *total_time {
                    return Err(SimulationError::InvalidConfiguration(format!(
                        "Time step {} exceeds total time {}",
                        dt, total_time
                    )));
                }
                Ok(())
            }
            SolverType::Iterative { tolerance, max_iterations } => {
                if *tolerance <= 0.0 {
                    return Err(SimulationError::InvalidConfiguration(
                        "Tolerance must be positive".to_string(),
                    ));
                }
                if *max_iterations == 0 {
                    return Err(SimulationError::InvalidConfiguration(
                        "Maximum iterations must be positive".to_string(),
                    ));
                }
                Ok(())
            }
            SolverType::Analytical { .. } => Ok(()),
        }
    }

    /// Step size and step count for time-stepping types
    pub fn time_grid(&self) -> Option<(f64, usize)> {
        match self {
            SolverType::TimeEvolution { total_time, time_steps } => {
                Some((total_time / *time_steps as f64, *time_steps))
            }
            SolverType::FixedStep { total_time, dt } => {
                // The small epsilon keeps T = k·dt from losing its last step to rounding
                let steps = (total_time / dt + 1e-9).floor() as usize;
                Some((*dt, steps))
            }
            _ => None,
        }
    }
}

// =================================================================================================
// Solver configuration
// =================================================================================================

/// Configuration for numerical solver
#[derive(Clone, Debug)]
pub struct SolverConfiguration {
    /// Type of solver and its parameters
    pub solver_type: SolverType,

    /// Keep one state out of `record_every` (first and last always kept)
    pub record_every: usize,
}

impl SolverConfiguration {
    /// Create a new configuration with a given solver type
    pub fn new(solver_type: SolverType) -> Self {
        Self {
            solver_type,
            record_every: 1,
        }
    }

    /// Create a time evolution configuration with N equal steps
    pub fn time_evolution(total_time: f64, time_steps: usize) -> Self {
        Self::new(SolverType::TimeEvolution { total_time, time_steps })
    }

    /// Create a time evolution configuration with a fixed step size
    pub fn fixed_step(total_time: f64, dt: f64) -> Self {
        Self::new(SolverType::FixedStep { total_time, dt })
    }

    /// Create an iterative solver configuration
    pub fn iterative(tolerance: f64, max_iterations: usize) -> Self {
        Self::new(SolverType::Iterative { tolerance, max_iterations })
    }

    /// Create an analytical solver configuration
    pub fn analytical(evaluation_time: f64) -> Self {
        Self::new(SolverType::Analytical {
            evaluation_time: Some(evaluation_time),
        })
    }

    /// Store only every n-th state of the trajectory
    pub fn recording_every(mut self, stride: usize) -> Self {
        self.record_every = stride;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.record_every == 0 {
            return Err(SimulationError::InvalidConfiguration(
                "Recording stride must be at least 1".to_string(),
            ));
        }
        self.solver_type.validate()
    }

    /// Step size and count, or an error naming the solver for other types
    pub(crate) fn require_time_grid(&self, solver_name: &str) -> Result<(f64, usize)> {
        self.solver_type.time_grid().ok_or_else(|| {
            SimulationError::InvalidConfiguration(format!(
                "{} only supports time-stepping configurations, got {}",
                solver_name,
                self.solver_type.name()
            ))
        })
    }
}

// =================================================================================================
// Simulation result
// =================================================================================================

/// Result of a time integration
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Times of the stored states
    pub time_points: Vec<f64>,

    /// Stored states (same length as `time_points`)
    pub state_trajectory: Vec<PhysicalState>,

    /// State at the end of the integration
    pub final_state: PhysicalState,

    /// Free-form diagnostics (solver name, dt, ...)
    pub metadata: HashMap<String, String>,
}

impl SimulationResult {
    pub fn new(
        time_points: Vec<f64>,
        state_trajectory: Vec<PhysicalState>,
        final_state: PhysicalState,
    ) -> Self {
        Self {
            time_points,
            state_trajectory,
            final_state,
            metadata: HashMap::new(),
        }
    }

    /// Number of stored states
    pub fn len(&self) -> usize {
        self.time_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_points.is_empty()
    }

    pub fn add_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), value.to_string());
    }

    /// Time series of one component of a quantity
    ///
    /// Scalars ignore `component`; vectors and matrices are indexed in their
    /// flat (column-major) order. Missing values yield `None`.
    pub fn series(&self, quantity: PhysicalQuantity, component: usize) -> Option<Vec<f64>> {
        self.state_trajectory
            .iter()
            .map(|state| match state.get(quantity)? {
                PhysicalData::Scalar(value) => Some(*value),
                PhysicalData::Vector(v) => v.get(component).copied(),
                PhysicalData::Matrix(m) => m.as_slice().get(component).copied(),
                PhysicalData::Array(a) => a.iter().nth(component).copied(),
            })
            .collect()
    }

    /// Stack a vector-valued quantity into a time × component matrix
    pub fn matrix(&self, quantity: PhysicalQuantity) -> Option<DMatrix<f64>> {
        let rows: Vec<Vec<f64>> = self
            .state_trajectory
            .iter()
            .map(|state| state.get(quantity).map(|data| data.to_vec()))
            .collect::<Option<_>>()?;
        let ncols = rows.first()?.len();
        if rows.iter().any(|row| row.len() != ncols) {
            return None;
        }
        Some(DMatrix::from_fn(rows.len(), ncols, |i, j| rows[i][j]))
    }

    /// Uniformly thinned copy keeping every n-th state plus the last one
    pub fn sample_every(&self, stride: usize) -> SimulationResult {
        let stride = stride.max(1);
        let last = self.len().saturating_sub(1);
        let indices: Vec<usize> = (0..self.len())
            .filter(|i| i % stride == 0 || *i == last)
            .collect();

        let mut thinned = SimulationResult::new(
            indices.iter().map(|&i| self.time_points[i]).collect(),
            indices.iter().map(|&i| self.state_trajectory[i].clone()).collect(),
            self.final_state.clone(),
        );
        thinned.metadata = self.metadata.clone();
        thinned
    }
}

// =================================================================================================
// Solver trait
// =================================================================================================

/// Interface implemented by every numerical method
pub trait Solver {
    /// Integrate `scenario` according to `config`
    fn solve(&self, scenario: &Scenario, config: &SolverConfiguration) -> Result<SimulationResult>;

    /// Human-readable method name
    fn name(&self) -> &str;
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_evolution_grid() {
        let solver_type = SolverType::TimeEvolution { total_time: 5.0, time_steps: 50 };
        assert!(solver_type.validate().is_ok());
        let (dt, steps) = solver_type.time_grid().unwrap();
        assert!((dt - 0.1).abs() < 1e-15);
        assert_eq!(steps, 50);
    }

    #[test]
    fn test_fixed_step_grid_truncates() {
        let (dt, steps) = SolverType::FixedStep { total_time: 10.0, dt: 1.5 }
            .time_grid()
            .unwrap();
        assert_eq!(dt, 1.5);
        assert_eq!(steps, 6);
    }

    #[test]
    fn test_fixed_step_grid_exact_multiple() {
        let (_, steps) = SolverType::FixedStep { total_time: 10.0, dt: 0.1 }
            .time_grid()
            .unwrap();
        assert_eq!(steps, 100);
    }

    #[test]
    fn test_invalid_configurations() {
        assert!(SolverConfiguration::time_evolution(-1.0, 10).validate().is_err());
        assert!(SolverConfiguration::time_evolution(1.0, 0).validate().is_err());
        assert!(SolverConfiguration::fixed_step(1.0, 2.0).validate().is_err());
        assert!(SolverConfiguration::iterative(0.0, 10).validate().is_err());
        assert!(
            SolverConfiguration::time_evolution(1.0, 10)
                .recording_every(0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_non_stepping_types_have_no_grid() {
        assert!(SolverType::Analytical { evaluation_time: None }.time_grid().is_none());
        let config = SolverConfiguration::iterative(1e-6, 10);
        let err = config.require_time_grid("Forward Euler").unwrap_err();
        assert!(err.to_string().contains("only supports time-stepping"));
    }

    fn scalar_result(values: &[f64]) -> SimulationResult {
        let states: Vec<PhysicalState> = values
            .iter()
            .map(|&v| PhysicalState::new(PhysicalQuantity::Concentration, PhysicalData::Scalar(v)))
            .collect();
        let times = (0..values.len()).map(|i| i as f64).collect();
        let last = states.last().cloned().unwrap();
        SimulationResult::new(times, states, last)
    }

    #[test]
    fn test_series_and_sampling() {
        let result = scalar_result(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(
            result.series(PhysicalQuantity::Concentration, 0).unwrap(),
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]
        );
        assert!(result.series(PhysicalQuantity::Population, 0).is_none());

        let thinned = result.sample_every(2);
        assert_eq!(thinned.time_points, vec![0.0, 2.0, 4.0, 5.0]);
    }

    #[test]
    fn test_matrix_stacking() {
        let states = vec![
            PhysicalState::new(PhysicalQuantity::Population, PhysicalData::from_vec(vec![1.0, 2.0])),
            PhysicalState::new(PhysicalQuantity::Population, PhysicalData::from_vec(vec![3.0, 4.0])),
        ];
        let result = SimulationResult::new(vec![0.0, 1.0], states.clone(), states[1].clone());
        let matrix = result.matrix(PhysicalQuantity::Population).unwrap();
        assert_eq!(matrix.shape(), (2, 2));
        assert_eq!(matrix[(1, 0)], 3.0);
    }
}
