//! First-order relaxation dx/dt = 1 - x
//!
//! Exact solution x(t) = 1 - (1 - x₀)·e^{-t}. Used to compare the accuracy
//! of forward Euler and RK4 over a sweep of step sizes.

use crate::physics::{PhysicalData, PhysicalModel, PhysicalQuantity, PhysicalState};
use crate::solver::convergence::AnalyticalSolution;

/// Relaxation towards the fixed point x* = 1
#[derive(Debug, Clone, Copy)]
pub struct Relaxation {
    initial_value: f64,
}

impl Relaxation {
    pub fn new(initial_value: f64) -> Self {
        Self { initial_value }
    }

    pub fn initial_value(&self) -> f64 {
        self.initial_value
    }
}

impl Default for Relaxation {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl PhysicalModel for Relaxation {
    fn points(&self) -> usize {
        1
    }

    fn compute_physics(&self, state: &PhysicalState) -> PhysicalState {
        let x = state
            .get(PhysicalQuantity::Concentration)
            .and_then(PhysicalData::try_as_scalar)
            .unwrap_or(self.initial_value);
        PhysicalState::new(PhysicalQuantity::Concentration, PhysicalData::Scalar(1.0 - x))
    }

    fn setup_initial_state(&self) -> PhysicalState {
        PhysicalState::new(
            PhysicalQuantity::Concentration,
            PhysicalData::Scalar(self.initial_value),
        )
    }

    fn name(&self) -> &str {
        "Relaxation dx/dt = 1 - x"
    }
}

impl AnalyticalSolution for Relaxation {
    fn observed_quantity(&self) -> PhysicalQuantity {
        PhysicalQuantity::Concentration
    }

    fn exact(&self, t: f64) -> f64 {
        1.0 - (1.0 - self.initial_value) * (-t).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rate_vanishes_at_fixed_point() {
        let model = Relaxation::new(1.0);
        let rate = model.compute_physics(&model.setup_initial_state());
        assert_eq!(rate.get(PhysicalQuantity::Concentration).unwrap().as_scalar(), 0.0);
    }

    #[test]
    fn test_exact_solution() {
        let model = Relaxation::new(0.0);
        assert_eq!(model.exact(0.0), 0.0);
        assert_relative_eq!(model.exact(1.0), 1.0 - (-1.0f64).exp(), epsilon = 1e-15);
        assert_relative_eq!(Relaxation::new(3.0).exact(2.0), 1.0 + 2.0 * (-2.0f64).exp(), epsilon = 1e-15);
    }
}
