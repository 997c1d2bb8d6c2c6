//! Helper functions for integration tests

use biosim_rs::physics::{PhysicalModel, PhysicalState};
use biosim_rs::solver::{DomainBoundaries, Scenario};

/// Assert that every quantity present in both states agrees within `tolerance`
pub fn assert_states_close(state1: &PhysicalState, state2: &PhysicalState, tolerance: f64, message: &str) {
    for (quantity, data1) in state1.iter() {
        let Some(data2) = state2.get(*quantity) else {
            continue;
        };
        let values1 = data1.to_vec();
        let values2 = data2.to_vec();

        assert_eq!(values1.len(), values2.len(), "{}: Dimension mismatch for {}", message, quantity);

        for (i, (v1, v2)) in values1.iter().zip(values2.iter()).enumerate() {
            let diff = (v1 - v2).abs();
            assert!(
                diff < tolerance,
                "{}: {} element {} differs by {} (tolerance {})",
                message, quantity, i, diff, tolerance
            );
        }
    }
}

/// Scenario starting from the model's own initial state
pub fn create_simple_scenario(model: Box<dyn PhysicalModel>) -> Scenario {
    let initial = model.setup_initial_state();
    let boundaries = DomainBoundaries::temporal(initial);
    Scenario::new(model, boundaries)
}

/// Compute relative error: |actual - expected| / |expected|
pub fn relative_error(actual: f64, expected: f64) -> f64 {
    if expected.abs() < 1e-10 {
        (actual - expected).abs()
    } else {
        (actual - expected).abs() / expected.abs()
    }
}
