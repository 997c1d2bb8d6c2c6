//! Runge-Kutta 4 (RK4) numerical solver
//!
//! # Mathematical Background
//!
//! ```text
//! k₁ = f(yₙ, tₙ)
//! k₂ = f(yₙ + dt/2 * k₁, tₙ + dt/2)
//! k₃ = f(yₙ + dt/2 * k₂, tₙ + dt/2)
//! k₄ = f(yₙ + dt * k₃, tₙ + dt)
//!
//! yₙ₊₁ = yₙ + dt/6 * (k₁ + 2k₂ + 2k₃ + k₄)
//! ```
//!
//! - **Order**: Fourth-order accurate (global error ~ O(dt⁴))
//! - **Cost**: 4 function evaluations per step
//!
//! Halving dt reduces the global error by a factor of about 16, against 2
//! for forward Euler. On dx/dt = 1 - x with dt = 1 the RK4 error is already
//! below 1e-2 while Euler is off by more than 0.1.
//!
//! The stage times are written to the state metadata, so time-dependent
//! forcing (such as a diel source pattern) is sampled at tₙ, tₙ + dt/2 and
//! tₙ + dt. Model bookkeeping done in [`PhysicalModel::on_step`](crate::physics::PhysicalModel::on_step)
//! is frozen during the four stages and updated once per step, after the
//! new state is known.

use log::debug;

use crate::error::Result;
use crate::solver::{
    Scenario, SimulationResult, Solver, SolverConfiguration, TrajectoryRecorder, initial_state,
    validate_state,
};

// =================================================================================================
// RK4 Solver
// =================================================================================================

/// Classical fourth-order Runge-Kutta solver
///
/// # Example
///
/// ```rust
/// use biosim_rs::models::Relaxation;
/// use biosim_rs::physics::PhysicalQuantity;
/// use biosim_rs::solver::{RK4Solver, Scenario, Solver, SolverConfiguration};
///
/// let scenario = Scenario::from_model(Box::new(Relaxation::new(0.0)));
/// let result = RK4Solver::new().solve(&scenario, &SolverConfiguration::fixed_step(5.0, 0.5))?;
/// let x = result.final_state.get(PhysicalQuantity::Concentration).unwrap().as_scalar();
/// assert!((x - (1.0 - (-5.0f64).exp())).abs() < 1e-3);
/// # Ok::<(), biosim_rs::SimulationError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RK4Solver;

impl RK4Solver {
    pub fn new() -> Self {
        Self
    }
}

impl Solver for RK4Solver {
    fn solve(&self, scenario: &Scenario, config: &SolverConfiguration) -> Result<SimulationResult> {
        // ====== Step 1: Validation ======

        config.validate()?;
        scenario.validate()?;

        let (dt, time_steps) = config.require_time_grid(self.name())?;

        // ====== Step 2: Setup ======

        let mut state = initial_state(scenario)?;
        let mut recorder = TrajectoryRecorder::new(&state, time_steps, config.record_every);
        let half = dt / 2.0;

        debug!(
            "{}: integrating '{}' over {} steps of {}",
            self.name(),
            scenario.get_model_name(),
            time_steps,
            dt
        );

        // ====== Step 3: Time Integration ======

        for step in 0..time_steps {
            let t = step as f64 * dt;
            state.set_metadata("time", t);

            // Stage 1: slope at the beginning of the interval
            let k1 = scenario.model.compute_physics(&state);

            // Stage 2: slope at the midpoint predicted with k₁
            let mut state_k2 = state.clone() + k1.clone() * half;
            state_k2.set_metadata("time", t + half);
            let k2 = scenario.model.compute_physics(&state_k2);

            // Stage 3: slope at the midpoint predicted with k₂
            let mut state_k3 = state.clone() + k2.clone() * half;
            state_k3.set_metadata("time", t + half);
            let k3 = scenario.model.compute_physics(&state_k3);

            // Stage 4: slope at the end predicted with k₃
            let mut state_k4 = state.clone() + k3.clone() * dt;
            state_k4.set_metadata("time", t + dt);
            let k4 = scenario.model.compute_physics(&state_k4);

            // Simpson weights: 1/6 at the ends, 1/3 at the midpoints
            let weighted_slope = k1 + k2 * 2.0 + k3 * 2.0 + k4;
            let mut next = state.clone() + weighted_slope * (dt / 6.0);

            let t_next = (step as f64 + 1.0) * dt;
            next.set_metadata("time", t_next);

            scenario.model.on_step(&state, &next, t, dt);
            state = next;

            validate_state(&state, step + 1)?;
            recorder.record(step + 1, t_next, &state);
        }

        // ====== Step 4: Build Result ======

        let mut result = recorder.finish(state);

        result.add_metadata("solver", "Runge-Kutta 4");
        result.add_metadata("time steps", &time_steps.to_string());
        result.add_metadata("dt", &dt.to_string());
        result.add_metadata("total time", &(time_steps as f64 * dt).to_string());
        result.add_metadata("function evaluations", &(4 * time_steps).to_string());

        Ok(result)
    }

    fn name(&self) -> &'static str {
        "Runge Kutta (RK4)"
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

    /// dy/dt = c
    struct ConstantGrowth {
        growth_rate: f64,
    }

    impl PhysicalModel for ConstantGrowth {
        fn points(&self) -> usize {
            5
        }

        fn compute_physics(&self, _state: &PhysicalState) -> PhysicalState {
            PhysicalState::new(
                PhysicalQuantity::Concentration,
                PhysicalData::uniform_vector(5, self.growth_rate),
            )
        }

        fn setup_initial_state(&self) -> PhysicalState {
            PhysicalState::new(PhysicalQuantity::Concentration, PhysicalData::uniform_vector(5, 0.0))
        }

        fn name(&self) -> &str {
            "Constant Growth"
        }
    }

    /// dy/dt = 3t², exact solution t³ which Simpson weights integrate exactly
    struct CubicClock;

    impl PhysicalModel for CubicClock {
        fn points(&self) -> usize {
            1
        }

        fn compute_physics(&self, state: &PhysicalState) -> PhysicalState {
            let t = state.time();
            PhysicalState::new(PhysicalQuantity::Concentration, PhysicalData::Scalar(3.0 * t * t))
        }

        fn setup_initial_state(&self) -> PhysicalState {
            PhysicalState::new(PhysicalQuantity::Concentration, PhysicalData::Scalar(0.0))
        }

        fn name(&self) -> &str {
            "Cubic Clock"
        }
    }

    /// Harmonic oscillator y'' = -ω²y as a first-order system
    struct HarmonicOscillator {
        omega: f64,
    }

    const VELOCITY: PhysicalQuantity = PhysicalQuantity::Custom("Velocity");

    impl PhysicalModel for HarmonicOscillator {
        fn points(&self) -> usize {
            1
        }

        fn compute_physics(&self, state: &PhysicalState) -> PhysicalState {
            let y = state.get(PhysicalQuantity::Concentration).unwrap().as_scalar();
            let v = state.get(VELOCITY).unwrap().as_scalar();
            PhysicalState::new(PhysicalQuantity::Concentration, PhysicalData::Scalar(v))
                .with(VELOCITY, PhysicalData::Scalar(-self.omega * self.omega * y))
        }

        fn setup_initial_state(&self) -> PhysicalState {
            PhysicalState::new(PhysicalQuantity::Concentration, PhysicalData::Scalar(1.0))
                .with(VELOCITY, PhysicalData::Scalar(0.0))
        }

        fn name(&self) -> &str {
            "Harmonic Oscillator"
        }
    }

    #[test]
    fn test_rk4_solver_name() {
        assert_eq!(RK4Solver::new().name(), "Runge Kutta (RK4)");
    }

    #[test]
    fn test_rk4_rejects_analytical() {
        let scenario = Scenario::from_model(Box::new(ConstantGrowth { growth_rate: 1.0 }));
        let result = RK4Solver::new().solve(&scenario, &SolverConfiguration::analytical(5.0));
        assert!(matches!(result, Err(SimulationError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_rk4_constant_growth_is_exact() {
        let scenario = Scenario::from_model(Box::new(ConstantGrowth { growth_rate: 2.0 }));
        let result = RK4Solver::new()
            .solve(&scenario, &SolverConfiguration::time_evolution(10.0, 100))
            .unwrap();

        let value = result.final_state.get(PhysicalQuantity::Concentration).unwrap().as_vector()[0];
        assert!((value - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_rk4_uses_stage_times() {
        // Exact only if stages see t, t + dt/2, t + dt/2 and t + dt
        let scenario = Scenario::from_model(Box::new(CubicClock));
        let result = RK4Solver::new()
            .solve(&scenario, &SolverConfiguration::fixed_step(2.0, 0.5))
            .unwrap();

        let value = result.final_state.get(PhysicalQuantity::Concentration).unwrap().as_scalar();
        assert!((value - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_rk4_harmonic_oscillator_energy() {
        let scenario = Scenario::from_model(Box::new(HarmonicOscillator { omega: 2.0 }));
        let result = RK4Solver::new()
            .solve(&scenario, &SolverConfiguration::time_evolution(std::f64::consts::PI, 1000))
            .unwrap();

        // After one full period (2π/ω = π) the oscillator is back at y = 1, v = 0
        let y = result.final_state.get(PhysicalQuantity::Concentration).unwrap().as_scalar();
        let v = result.final_state.get(VELOCITY).unwrap().as_scalar();
        assert!((y - 1.0).abs() < 1e-8);
        assert!(v.abs() < 1e-6);
    }

    #[test]
    fn test_rk4_metadata() {
        let scenario = Scenario::from_model(Box::new(ConstantGrowth { growth_rate: 1.0 }));
        let result = RK4Solver::new()
            .solve(&scenario, &SolverConfiguration::time_evolution(1.0, 25))
            .unwrap();
        assert_eq!(result.metadata.get("function evaluations"), Some(&"100".to_string()));
    }
}
