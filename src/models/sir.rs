//! Well-mixed SIR epidemic with fatalities
//!
//! ```text
//! dS/dt = -β·S·I/N
//! dI/dt =  β·S·I/N - γ·I
//! dR/dt = (1 - f)·γ·I
//! dD/dt =  f·γ·I
//! ```
//!
//! The population vector is stored as `[S, I, R, D]` under
//! [`PhysicalQuantity::Population`]. The right-hand side sums to zero, so
//! S + I + R + D stays equal to N up to round-off.

use crate::physics::{PhysicalData, PhysicalModel, PhysicalQuantity, PhysicalState};
use crate::solver::SimulationResult;

/// Index of each compartment in the population vector
pub const SUSCEPTIBLE: usize = 0;
pub const INFECTED: usize = 1;
pub const RECOVERED: usize = 2;
pub const DEAD: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SirModel {
    /// Transmission rate β
    pub beta: f64,
    /// Removal rate γ (inverse infectious period)
    pub gamma: f64,
    /// Fraction f of removals that are deaths
    pub fatality: f64,
    /// Total population N
    pub population: f64,
    /// Infected at t = 0
    pub initial_infected: f64,
}

impl SirModel {
    pub fn new(beta: f64, gamma: f64, fatality: f64, population: f64, initial_infected: f64) -> Self {
        Self {
            beta,
            gamma,
            fatality,
            population,
            initial_infected,
        }
    }

    /// R₀ = β/γ
    pub fn basic_reproduction_number(&self) -> f64 {
        self.beta / self.gamma
    }
}

impl PhysicalModel for SirModel {
    fn points(&self) -> usize {
        4
    }

    fn compute_physics(&self, state: &PhysicalState) -> PhysicalState {
        let Some(p) = state
            .get(PhysicalQuantity::Population)
            .and_then(PhysicalData::try_as_vector)
        else {
            return PhysicalState::new(PhysicalQuantity::Population, PhysicalData::uniform_vector(4, 0.0));
        };

        let infections = self.beta * p[SUSCEPTIBLE] * p[INFECTED] / self.population;
        let removals = self.gamma * p[INFECTED];

        PhysicalState::new(
            PhysicalQuantity::Population,
            PhysicalData::from_vec(vec![
                -infections,
                infections - removals,
                (1.0 - self.fatality) * removals,
                self.fatality * removals,
            ]),
        )
    }

    fn setup_initial_state(&self) -> PhysicalState {
        PhysicalState::new(
            PhysicalQuantity::Population,
            PhysicalData::from_vec(vec![
                self.population - self.initial_infected,
                self.initial_infected,
                0.0,
                0.0,
            ]),
        )
    }

    fn name(&self) -> &str {
        "SIR with fatalities"
    }
}

/// Time and size of the infection peak in a trajectory
pub fn peak_infected(result: &SimulationResult) -> Option<(f64, f64)> {
    let infected = result.series(PhysicalQuantity::Population, INFECTED)?;
    result
        .time_points
        .iter()
        .copied()
        .zip(infected)
        .max_by(|a, b| a.1.total_cmp(&b.1))
}
