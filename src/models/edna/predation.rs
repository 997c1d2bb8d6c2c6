//! Predation pathway: eDNA eaten by migrating predators and released later
//!
//! Predators follow their own DVM pattern. Where they overlap with the prey
//! (source) pattern they remove eDNA from the water at rate
//!
//! ```text
//! sink(z) = ε · P_prey(t, z) · P_pred(t, z) · C(z)
//! ```
//!
//! Every step the eaten mass is stored as a meal. After the digestion delay a
//! meal joins the digesting pool, which is released back to the water at the
//! first-order rate λ, spread over the depths where the predators are at the
//! time of release. Eaten eDNA is therefore delayed and moved, not destroyed:
//! water plus stomach inventory only changes by shedding and decay.
//!
//! The column-integrated eaten and released masses are integrated with the
//! water as cumulative scalars ([`EATEN_LARGE`], [`RELEASED_LARGE`], ...), so
//! every solver moves exactly the same mass out of the water and into the
//! stomach. The meal queue itself is bookkeeping outside the state: once per
//! accepted step [`PhysicalModel::on_step`] turns the increments of those
//! scalars into a new meal and a smaller digesting pool. The pool stays
//! frozen during the stages of a multi-stage solver.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use nalgebra::DVector;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::transport::{EdnaTransport, MassBudget};
use crate::error::{Result, SimulationError};
use crate::physics::{PhysicalData, PhysicalModel, PhysicalQuantity, PhysicalState};

/// Cumulative large eDNA eaten by the predators (column-integrated)
pub const EATEN_LARGE: PhysicalQuantity = PhysicalQuantity::Custom("Eaten large eDNA");
/// Cumulative small eDNA eaten by the predators (column-integrated)
pub const EATEN_SMALL: PhysicalQuantity = PhysicalQuantity::Custom("Eaten small eDNA");
/// Cumulative large eDNA released back to the water
pub const RELEASED_LARGE: PhysicalQuantity = PhysicalQuantity::Custom("Released large eDNA");
/// Cumulative small eDNA released back to the water
pub const RELEASED_SMALL: PhysicalQuantity = PhysicalQuantity::Custom("Released small eDNA");

fn cumulative(state: &PhysicalState, quantity: PhysicalQuantity) -> f64 {
    state.get(quantity).and_then(PhysicalData::try_as_scalar).unwrap_or(0.0)
}

/// Predator behaviour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredationParameters {
    /// Sink efficiency ε (s⁻¹ per unit overlap)
    pub efficiency: f64,
    /// Delay before a meal starts being released (h)
    pub digestion_hours: f64,
    /// First-order release rate λ of digested meals (h⁻¹)
    pub release_per_hour: f64,
}

impl Default for PredationParameters {
    fn default() -> Self {
        Self {
            efficiency: 0.09,
            digestion_hours: 6.5,
            release_per_hour: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Meal {
    eaten_at: f64,
    large: f64,
    small: f64,
}

/// Stomach content of the predator population (column-integrated mass)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stomach {
    undigested: VecDeque<Meal>,
    digesting_large: f64,
    digesting_small: f64,
}

impl Stomach {
    /// Mass still waiting for the digestion delay, as (large, small)
    pub fn undigested(&self) -> (f64, f64) {
        self.undigested
            .iter()
            .fold((0.0, 0.0), |(l, s), meal| (l + meal.large, s + meal.small))
    }

    /// Mass being released, as (large, small)
    pub fn digesting(&self) -> (f64, f64) {
        (self.digesting_large, self.digesting_small)
    }

    pub fn total_mass(&self) -> f64 {
        let (l, s) = self.undigested();
        l + s + self.digesting_large + self.digesting_small
    }

    pub fn meals(&self) -> usize {
        self.undigested.len()
    }
}

/// [`EdnaTransport`] with a predator sink and delayed release
#[derive(Debug)]
pub struct PredatorTransport {
    transport: EdnaTransport,
    predator: Array2<f64>,
    parameters: PredationParameters,
    stomach: Mutex<Stomach>,
}

impl PredatorTransport {
    pub fn new(transport: EdnaTransport, predator: Array2<f64>, parameters: PredationParameters) -> Result<Self> {
        if predator.dim() != transport.source().dim() {
            return Err(SimulationError::InvalidConfiguration(format!(
                "Predator pattern {:?} does not match the source pattern {:?}",
                predator.dim(),
                transport.source().dim()
            )));
        }
        if parameters.efficiency < 0.0 || parameters.digestion_hours < 0.0 || parameters.release_per_hour < 0.0 {
            return Err(SimulationError::InvalidConfiguration(
                "Predation parameters must be non-negative".to_string(),
            ));
        }
        Ok(Self {
            transport,
            predator,
            parameters,
            stomach: Mutex::new(Stomach::default()),
        })
    }

    pub fn transport(&self) -> &EdnaTransport {
        &self.transport
    }

    pub fn parameters(&self) -> &PredationParameters {
        &self.parameters
    }

    fn digestion_delay(&self) -> f64 {
        self.parameters.digestion_hours * 3600.0
    }

    fn release_rate(&self) -> f64 {
        self.parameters.release_per_hour / 3600.0
    }

    fn lock(&self) -> MutexGuard<'_, Stomach> {
        self.stomach.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of the current stomach content
    pub fn stomach(&self) -> Stomach {
        self.lock().clone()
    }

    /// Empty the stomach before reusing the model for another run
    pub fn reset_stomach(&self) {
        *self.lock() = Stomach::default();
    }

    fn predator_row(&self, t: f64) -> ndarray::ArrayView1<'_, f64> {
        self.predator.row(EdnaTransport::pattern_row(self.predator.nrows(), t))
    }

    /// Sink rate per cell for one fragment class
    fn sink(&self, concentration: &DVector<f64>, t: f64) -> DVector<f64> {
        let prey = self.transport.source_row(t);
        let predator = self.predator_row(t);
        DVector::from_iterator(
            concentration.len(),
            (0..concentration.len()).map(|i| self.parameters.efficiency * prey[i] * predator[i] * concentration[i]),
        )
    }

    /// Release per cell from a column-integrated release rate, or None when no predators are present
    fn release_profile(&self, t: f64) -> Option<DVector<f64>> {
        let predator = self.predator_row(t);
        let weight = predator.sum() * self.transport.grid().dz();
        (weight > 0.0).then(|| DVector::from_iterator(predator.len(), predator.iter().map(|p| p / weight)))
    }

    /// Stomach content implied by the cumulative eaten and released masses of `state`
    pub fn stomach_mass(state: &PhysicalState) -> f64 {
        cumulative(state, EATEN_LARGE) + cumulative(state, EATEN_SMALL)
            - cumulative(state, RELEASED_LARGE)
            - cumulative(state, RELEASED_SMALL)
    }

    /// Column inventory of water and stomach with its source/sink rates
    ///
    /// Predation only moves mass between the two, so it does not appear in
    /// the rates.
    pub fn mass_budget(&self, state: &PhysicalState, t: f64) -> Result<MassBudget> {
        let water = self.transport.mass_budget(state, t)?;
        Ok(MassBudget {
            total_mass: water.total_mass + Self::stomach_mass(state),
            ..water
        })
    }

    fn initial_state(&self) -> PhysicalState {
        self.transport
            .setup_initial_state()
            .with(EATEN_LARGE, PhysicalData::Scalar(0.0))
            .with(EATEN_SMALL, PhysicalData::Scalar(0.0))
            .with(RELEASED_LARGE, PhysicalData::Scalar(0.0))
            .with(RELEASED_SMALL, PhysicalData::Scalar(0.0))
    }
}

impl PhysicalModel for PredatorTransport {
    fn points(&self) -> usize {
        self.transport.points()
    }

    fn compute_physics(&self, state: &PhysicalState) -> PhysicalState {
        let Some((large, small)) = EdnaTransport::fragments(state) else {
            return self.initial_state();
        };
        let t = state.time();
        let dz = self.transport.grid().dz();
        let (mut d_large, mut d_small) = self.transport.tendencies(large, small, t);

        let sink_large = self.sink(large, t);
        let sink_small = self.sink(small, t);
        let eaten = (sink_large.sum() * dz, sink_small.sum() * dz);
        d_large -= sink_large;
        d_small -= sink_small;

        // The release profile integrates to one over the column
        let mut released = (0.0, 0.0);
        if let Some(profile) = self.release_profile(t) {
            let (pool_large, pool_small) = self.lock().digesting();
            let lambda = self.release_rate();
            released = (lambda * pool_large, lambda * pool_small);
            d_large += &profile * released.0;
            d_small += &profile * released.1;
        }

        PhysicalState::new(PhysicalQuantity::LargeEdna, PhysicalData::Vector(d_large))
            .with(PhysicalQuantity::SmallEdna, PhysicalData::Vector(d_small))
            .with(EATEN_LARGE, PhysicalData::Scalar(eaten.0))
            .with(EATEN_SMALL, PhysicalData::Scalar(eaten.1))
            .with(RELEASED_LARGE, PhysicalData::Scalar(released.0))
            .with(RELEASED_SMALL, PhysicalData::Scalar(released.1))
    }

    fn setup_initial_state(&self) -> PhysicalState {
        self.reset_stomach();
        self.initial_state()
    }

    fn name(&self) -> &str {
        "eDNA vertical transport with predation"
    }

    fn description(&self) -> Option<&str> {
        Some("Predators eat eDNA where they meet the prey layer and release it after digestion")
    }

    fn on_step(&self, previous: &PhysicalState, next: &PhysicalState, time: f64, dt: f64) {
        let increment = |quantity| cumulative(next, quantity) - cumulative(previous, quantity);
        let eaten_large = increment(EATEN_LARGE);
        let eaten_small = increment(EATEN_SMALL);
        let released_large = increment(RELEASED_LARGE);
        let released_small = increment(RELEASED_SMALL);
        let delay = self.digestion_delay();

        let mut stomach = self.lock();

        stomach.digesting_large -= released_large;
        stomach.digesting_small -= released_small;

        stomach.undigested.push_back(Meal {
            eaten_at: time,
            large: eaten_large,
            small: eaten_small,
        });

        let now = time + dt;
        while let Some(meal) = stomach.undigested.front().copied() {
            if now - meal.eaten_at + 1e-9 < delay {
                break;
            }
            stomach.undigested.pop_front();
            stomach.digesting_large += meal.large;
            stomach.digesting_small += meal.small;
        }
    }
}
