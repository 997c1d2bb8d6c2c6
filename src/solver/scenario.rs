//! Simulation scenario definition
//!
//! A scenario combines a physical model with its domain (initial condition).
use crate::error::Result;
use crate::physics::PhysicalModel;
use crate::solver::boundary::DomainBoundaries;

/// Simulation scenario: WHAT to solve
///
/// The same scenario can be integrated with different numerical methods,
/// which is how forward Euler and RK4 are compared on one problem.
pub struct Scenario {
    /// Physical model (equations)
    pub model: Box<dyn PhysicalModel>,

    /// Conditions and boundaries
    pub conditions: DomainBoundaries,
}

impl Scenario {
    pub fn new(model: Box<dyn PhysicalModel>, conditions: DomainBoundaries) -> Self {
        Self { model, conditions }
    }

    /// Scenario starting from the model's own initial state
    pub fn from_model(model: Box<dyn PhysicalModel>) -> Self {
        let conditions = DomainBoundaries::temporal(model.setup_initial_state());
        Self::new(model, conditions)
    }

    /// Verify scenario content (mainly boundaries)
    pub fn validate(&self) -> Result<()> {
        self.conditions.validate()
    }

    pub fn get_model_name(&self) -> &str {
        self.model.name()
    }

    pub fn ndim(&self) -> usize {
        self.conditions.ndim()
    }

    pub fn is_time_dependent(&self) -> bool {
        self.conditions.is_time_dependent()
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.get_model_name())
            .field("dimension", &self.ndim())
            .field("is time dependent", &self.is_time_dependent())
            .field("Boundaries / conditions", &self.conditions)
            .finish()
    }
}

// ================================================================================================
// Tests
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{PhysicalData, PhysicalQuantity, PhysicalState};

    struct MockModel;

    impl PhysicalModel for MockModel {
        fn points(&self) -> usize {
            10
        }

        fn compute_physics(&self, state: &PhysicalState) -> PhysicalState {
            state.clone()
        }

        fn setup_initial_state(&self) -> PhysicalState {
            PhysicalState::new(PhysicalQuantity::Concentration, PhysicalData::uniform_vector(10, 1.0))
        }

        fn name(&self) -> &str {
            "MockModel"
        }
    }

    #[test]
    fn test_scenario_from_model() {
        let scenario = Scenario::from_model(Box::new(MockModel));
        assert_eq!(scenario.get_model_name(), "MockModel");
        assert!(scenario.validate().is_ok());
        assert!(scenario.conditions.initial_condition().is_some());
    }

    #[test]
    fn test_default_boundaries_are_invalid() {
        let scenario = Scenario::new(Box::new(MockModel), DomainBoundaries::default());
        assert!(scenario.validate().is_err());
        assert!(!scenario.is_time_dependent());
    }
}
