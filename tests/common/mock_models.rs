//! Mock physical models for testing
//!
//! Both models have closed-form solutions, so solver accuracy can be
//! checked exactly.

use biosim_rs::physics::{PhysicalData, PhysicalModel, PhysicalQuantity, PhysicalState};
use biosim_rs::solver::convergence::AnalyticalSolution;

// =================================================================================================
// Exponential Decay: dy/dt = -k*y
// =================================================================================================

/// Exponential decay of a population: dy/dt = -k*y, y(t) = y₀·exp(-k*t)
pub struct ExponentialDecay {
    pub points: usize,
    pub decay_rate: f64,
}

impl ExponentialDecay {
    pub fn new(points: usize, decay_rate: f64) -> Self {
        Self { points, decay_rate }
    }

    pub fn analytical_solution(&self, t: f64, y0: f64) -> f64 {
        y0 * (-self.decay_rate * t).exp()
    }
}

impl PhysicalModel for ExponentialDecay {
    fn points(&self) -> usize {
        self.points
    }

    fn compute_physics(&self, state: &PhysicalState) -> PhysicalState {
        let mut result = state.clone();

        if let Some(population) = result.get_mut(PhysicalQuantity::Population) {
            population.apply(|y| -self.decay_rate * y);
        }

        result
    }

    fn setup_initial_state(&self) -> PhysicalState {
        PhysicalState::new(
            PhysicalQuantity::Population,
            PhysicalData::uniform_vector(self.points, 1.0),
        )
    }

    fn name(&self) -> &str {
        "Exponential Decay"
    }
}

impl AnalyticalSolution for ExponentialDecay {
    fn observed_quantity(&self) -> PhysicalQuantity {
        PhysicalQuantity::Population
    }

    fn exact(&self, t: f64) -> f64 {
        self.analytical_solution(t, 1.0)
    }
}

// =================================================================================================
// Constant Growth: dy/dt = c
// =================================================================================================

/// Constant production: dy/dt = c, y(t) = y₀ + c*t
///
/// Euler and RK4 are both exact.
pub struct ConstantGrowth {
    pub points: usize,
    pub growth_rate: f64,
}

impl ConstantGrowth {
    pub fn new(points: usize, growth_rate: f64) -> Self {
        Self { points, growth_rate }
    }

    pub fn analytical_solution(&self, t: f64, y0: f64) -> f64 {
        y0 + self.growth_rate * t
    }
}

impl PhysicalModel for ConstantGrowth {
    fn points(&self) -> usize {
        self.points
    }

    fn compute_physics(&self, _state: &PhysicalState) -> PhysicalState {
        PhysicalState::new(
            PhysicalQuantity::Concentration,
            PhysicalData::uniform_vector(self.points, self.growth_rate),
        )
    }

    fn setup_initial_state(&self) -> PhysicalState {
        PhysicalState::new(
            PhysicalQuantity::Concentration,
            PhysicalData::uniform_vector(self.points, 0.0),
        )
    }

    fn name(&self) -> &str {
        "Constant Growth"
    }
}
