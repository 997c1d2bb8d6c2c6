//! Step-size studies against closed-form solutions
//!
//! Runs forward Euler and RK4 on the same model for a sweep of step sizes
//! and measures their error against the exact solution.

use log::debug;

use crate::error::{Result, SimulationError};
use crate::physics::{PhysicalModel, PhysicalQuantity};
use crate::solver::{EulerSolver, RK4Solver, Scenario, SimulationResult, Solver, SolverConfiguration};

/// A model with a known closed-form trajectory for one scalar quantity
pub trait AnalyticalSolution: PhysicalModel {
    /// Quantity compared against the exact solution
    fn observed_quantity(&self) -> PhysicalQuantity;

    /// Exact value at time `t`
    fn exact(&self, t: f64) -> f64;
}

/// Error of one method at one step size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MethodError {
    /// Largest absolute error over the stored time points
    pub max_abs: f64,
    /// Absolute error at the last time point
    pub final_abs: f64,
}

/// Euler and RK4 errors at one step size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergencePoint {
    pub dt: f64,
    pub euler: MethodError,
    pub rk4: MethodError,
}

/// Error of a single trajectory against the exact solution
pub fn trajectory_error<M: AnalyticalSolution + ?Sized>(
    model: &M,
    result: &SimulationResult,
) -> Result<MethodError> {
    let values = result.series(model.observed_quantity(), 0).ok_or_else(|| {
        SimulationError::InvalidScenario(format!(
            "Trajectory has no {} values",
            model.observed_quantity()
        ))
    })?;

    let errors: Vec<f64> = result
        .time_points
        .iter()
        .zip(values.iter())
        .map(|(&t, &x)| (x - model.exact(t)).abs())
        .collect();

    Ok(MethodError {
        max_abs: errors.iter().cloned().fold(0.0, f64::max),
        final_abs: errors.last().copied().unwrap_or(0.0),
    })
}

/// Run Euler and RK4 for every step size in `dts` over `[0, total_time]`
///
/// `make_model` builds a fresh model for each run.
///
/// ```rust
/// use biosim_rs::models::Relaxation;
/// use biosim_rs::solver::convergence::compare_methods;
///
/// let study = compare_methods(|| Relaxation::new(0.0), 10.0, &[0.1, 0.5, 1.0])?;
/// assert!(study.iter().all(|point| point.rk4.max_abs < point.euler.max_abs));
/// # Ok::<(), biosim_rs::SimulationError>(())
/// ```
pub fn compare_methods<M, F>(make_model: F, total_time: f64, dts: &[f64]) -> Result<Vec<ConvergencePoint>>
where
    M: AnalyticalSolution + 'static,
    F: Fn() -> M,
{
    let euler = EulerSolver::new();
    let rk4 = RK4Solver::new();

    dts.iter()
        .map(|&dt| {
            let config = SolverConfiguration::fixed_step(total_time, dt);
            let reference = make_model();

            let euler_result = euler.solve(&Scenario::from_model(Box::new(make_model())), &config)?;
            let rk4_result = rk4.solve(&Scenario::from_model(Box::new(make_model())), &config)?;

            let point = ConvergencePoint {
                dt,
                euler: trajectory_error(&reference, &euler_result)?,
                rk4: trajectory_error(&reference, &rk4_result)?,
            };
            debug!(
                "dt = {}: Euler max error {:.3e}, RK4 max error {:.3e}",
                dt, point.euler.max_abs, point.rk4.max_abs
            );
            Ok(point)
        })
        .collect()
}

/// Step sizes 0.1, 0.2, ..., 1.5 used for the relaxation study
pub fn default_step_sweep() -> Vec<f64> {
    (1..=15).map(|i| i as f64 / 10.0).collect()
}

/// Observed order of accuracy between two step sizes: log(e1/e2) / log(dt1/dt2)
pub fn observed_order(dt_coarse: f64, error_coarse: f64, dt_fine: f64, error_fine: f64) -> f64 {
    (error_coarse / error_fine).ln() / (dt_coarse / dt_fine).ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Relaxation;

    #[test]
    fn test_default_sweep() {
        let sweep = default_step_sweep();
        assert_eq!(sweep.len(), 15);
        assert!((sweep[0] - 0.1).abs() < 1e-15);
        assert!((sweep[14] - 1.5).abs() < 1e-15);
    }

    #[test]
    fn test_observed_order_of_known_rates() {
        assert!((observed_order(0.2, 4e-2, 0.1, 2e-2) - 1.0).abs() < 1e-12);
        assert!((observed_order(0.2, 16e-4, 0.1, 1e-4) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_rk4_beats_euler_on_relaxation() {
        let study = compare_methods(|| Relaxation::new(0.0), 10.0, &default_step_sweep()).unwrap();
        for point in &study {
            assert!(
                point.rk4.max_abs < point.euler.max_abs,
                "dt = {}: RK4 {} vs Euler {}",
                point.dt,
                point.rk4.max_abs,
                point.euler.max_abs
            );
        }
    }
}
