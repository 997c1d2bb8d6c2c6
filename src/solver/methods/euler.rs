//! Forward Euler numerical solver
//!
//! # Mathematical Background
//!
//! ```text
//! dy/dt = f(y, t)
//! y_{n+1} = y_n + dt * f(y_n, t_n)
//! ```
//!
//! - **Order**: First-order accurate (global error ~ O(dt))
//! - **Stability**: Conditionally stable; for dy/dt = -λy it requires dt < 2/λ
//! - **Cost**: 1 function evaluation per step
//!
//! Forward Euler is also the scheme for which the eDNA model's discrete mass
//! budget closes exactly: the mass change over a step equals dt times the
//! production minus decay evaluated at the start of the step.

use log::debug;

use crate::error::Result;
use crate::solver::{
    Scenario, SimulationResult, Solver, SolverConfiguration, TrajectoryRecorder, initial_state,
    validate_state,
};

// =================================================================================================
// Forward Euler Solver
// =================================================================================================

/// Forward Euler time-stepping solver
///
/// # Example
///
/// ```rust
/// use biosim_rs::models::Relaxation;
/// use biosim_rs::solver::{EulerSolver, Scenario, Solver, SolverConfiguration};
///
/// let scenario = Scenario::from_model(Box::new(Relaxation::new(0.0)));
/// let result = EulerSolver::new().solve(&scenario, &SolverConfiguration::fixed_step(10.0, 0.5))?;
/// assert_eq!(result.len(), 21);
/// # Ok::<(), biosim_rs::SimulationError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct EulerSolver;

impl EulerSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Solver for EulerSolver {
    fn solve(&self, scenario: &Scenario, config: &SolverConfiguration) -> Result<SimulationResult> {
        // ====== Step 1: Validation ======

        config.validate()?;
        scenario.validate()?;

        let (dt, time_steps) = config.require_time_grid(self.name())?;

        // ====== Step 2: Setup ======

        let mut state = initial_state(scenario)?;
        let mut recorder = TrajectoryRecorder::new(&state, time_steps, config.record_every);

        debug!(
            "{}: integrating '{}' over {} steps of {}",
            self.name(),
            scenario.get_model_name(),
            time_steps,
            dt
        );

        // ====== Step 3: Time Integration ======

        for step in 0..time_steps {
            // t_n computed from the index to avoid accumulating rounding errors
            let t = step as f64 * dt;
            state.set_metadata("time", t);

            let derivative = scenario.model.compute_physics(&state);
            let mut next = state.clone() + derivative * dt;

            let t_next = (step as f64 + 1.0) * dt;
            next.set_metadata("time", t_next);

            scenario.model.on_step(&state, &next, t, dt);
            state = next;

            validate_state(&state, step + 1)?;
            recorder.record(step + 1, t_next, &state);
        }

        // ====== Step 4: Build Result ======

        let mut result = recorder.finish(state);

        result.add_metadata("solver", "Forward Euler");
        result.add_metadata("time steps", &time_steps.to_string());
        result.add_metadata("dt", &dt.to_string());
        result.add_metadata("total time", &(time_steps as f64 * dt).to_string());
        result.add_metadata("function evaluations", &time_steps.to_string());

        Ok(result)
    }

    fn name(&self) -> &'static str {
        "Forward Euler"
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimulationError;
    use crate::physics::{PhysicalData, PhysicalModel, PhysicalQuantity, PhysicalState};
    use std::sync::Mutex;

    /// dy/dt = -k * y
    struct ExponentialDecay {
        decay_rate: f64,
    }

    impl PhysicalModel for ExponentialDecay {
        fn points(&self) -> usize {
            3
        }

        fn compute_physics(&self, state: &PhysicalState) -> PhysicalState {
            let mut result = state.clone();
            if let Some(conc) = result.get_mut(PhysicalQuantity::Concentration) {
                conc.apply(|y| -self.decay_rate * y);
            }
            result
        }

        fn setup_initial_state(&self) -> PhysicalState {
            PhysicalState::new(PhysicalQuantity::Concentration, PhysicalData::uniform_vector(3, 1.0))
        }

        fn name(&self) -> &str {
            "Exponential Decay"
        }
    }

    /// dy/dt = t, records the times at which it is evaluated
    struct TimeRamp {
        seen: Mutex<Vec<f64>>,
        steps: Mutex<Vec<(f64, f64)>>,
    }

    impl PhysicalModel for TimeRamp {
        fn points(&self) -> usize {
            1
        }

        fn compute_physics(&self, state: &PhysicalState) -> PhysicalState {
            self.seen.lock().unwrap().push(state.time());
            PhysicalState::new(PhysicalQuantity::Concentration, PhysicalData::Scalar(state.time()))
        }

        fn setup_initial_state(&self) -> PhysicalState {
            PhysicalState::new(PhysicalQuantity::Concentration, PhysicalData::Scalar(0.0))
        }

        fn name(&self) -> &str {
            "Time Ramp"
        }

        fn on_step(&self, _previous: &PhysicalState, _next: &PhysicalState, time: f64, dt: f64) {
            self.steps.lock().unwrap().push((time, dt));
        }
    }

    fn scenario_for(model: Box<dyn PhysicalModel>) -> Scenario {
        Scenario::from_model(model)
    }

    #[test]
    fn test_euler_solver_name() {
        assert_eq!(EulerSolver::default().name(), "Forward Euler");
    }

    #[test]
    fn test_euler_rejects_iterative() {
        let scenario = scenario_for(Box::new(ExponentialDecay { decay_rate: 1.0 }));
        let result = EulerSolver::new().solve(&scenario, &SolverConfiguration::iterative(1e-6, 10));
        assert!(matches!(result, Err(SimulationError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_euler_exponential_decay_matches_discrete_solution() {
        // Euler on dy/dt = -k y gives y_n = (1 - k dt)^n exactly
        let scenario = scenario_for(Box::new(ExponentialDecay { decay_rate: 0.5 }));
        let result = EulerSolver::new()
            .solve(&scenario, &SolverConfiguration::time_evolution(2.0, 20))
            .unwrap();

        let final_value = result.final_state.get(PhysicalQuantity::Concentration).unwrap().as_vector()[0];
        let expected = (1.0f64 - 0.5 * 0.1).powi(20);
        assert!((final_value - expected).abs() < 1e-12);
    }

    #[test]
    fn test_euler_time_points_and_metadata() {
        let scenario = scenario_for(Box::new(ExponentialDecay { decay_rate: 0.1 }));
        let result = EulerSolver::new()
            .solve(&scenario, &SolverConfiguration::time_evolution(100.0, 500))
            .unwrap();

        assert_eq!(result.len(), 501);
        assert!((result.time_points[500] - 100.0).abs() < 1e-10);
        assert_eq!(result.metadata.get("solver"), Some(&"Forward Euler".to_string()));
        assert_eq!(result.metadata.get("time steps"), Some(&"500".to_string()));
    }

    #[test]
    fn test_euler_evaluates_at_step_start() {
        let model = TimeRamp {
            seen: Mutex::new(Vec::new()),
            steps: Mutex::new(Vec::new()),
        };
        let scenario = scenario_for(Box::new(model));
        let result = EulerSolver::new()
            .solve(&scenario, &SolverConfiguration::fixed_step(1.0, 0.25))
            .unwrap();

        // x_{n+1} = x_n + dt * t_n  →  x(1) = 0.25 * (0 + 0.25 + 0.5 + 0.75)
        let x = result.final_state.get(PhysicalQuantity::Concentration).unwrap().as_scalar();
        assert!((x - 0.375).abs() < 1e-12);
        assert_eq!(result.final_state.time(), 1.0);
    }

    #[test]
    fn test_euler_on_step_sees_each_step_once() {
        let model = std::sync::Arc::new(TimeRamp {
            seen: Mutex::new(Vec::new()),
            steps: Mutex::new(Vec::new()),
        });
        let scenario = scenario_for(Box::new(model.clone()));
        EulerSolver::new()
            .solve(&scenario, &SolverConfiguration::fixed_step(1.0, 0.25))
            .unwrap();

        assert_eq!(*model.seen.lock().unwrap(), vec![0.0, 0.25, 0.5, 0.75]);
        let steps = model.steps.lock().unwrap();
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[3], (0.75, 0.25));
    }

    #[test]
    fn test_euler_recording_stride() {
        let scenario = scenario_for(Box::new(ExponentialDecay { decay_rate: 0.1 }));
        let config = SolverConfiguration::time_evolution(10.0, 10).recording_every(4);
        let result = EulerSolver::new().solve(&scenario, &config).unwrap();
        assert_eq!(result.time_points, vec![0.0, 4.0, 8.0, 10.0]);
    }

    #[test]
    fn test_euler_detects_instability() {
        // Growth factor |1 - k dt| ~ 2e200 overflows on the second step
        let scenario = scenario_for(Box::new(ExponentialDecay { decay_rate: 1e200 }));
        let result = EulerSolver::new().solve(&scenario, &SolverConfiguration::time_evolution(10.0, 5));
        assert!(matches!(result, Err(SimulationError::Instability { .. })));
    }
}
