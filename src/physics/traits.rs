//! Physical models traits and types
//!
//! This module defines the core API for physical models:
//! - `PhysicalModel`: trait for all physical models
//! - `PhysicalState`: flexible state container
//! - `PhysicalQuantity`: type-safe quantity identifiers

use std::collections::HashMap;
use std::fmt;

use crate::physics::PhysicalData;

// =================================================================================================
// Physical quantities (Type-safe Identifiers)
// =================================================================================================

/// Known physical quantities (type-safe enum)
///
/// If a model needs a quantity that is not listed, use `Custom` rather than
/// string keys so that states remain type-checked.
///
/// # Example
/// ```
/// use biosim_rs::physics::{PhysicalData, PhysicalQuantity, PhysicalState};
///
/// let stomach = PhysicalQuantity::Custom("Stomach");
/// let mut state = PhysicalState::empty();
/// state.set(stomach, PhysicalData::Scalar(0.0));
/// assert!(state.get(stomach).is_some());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalQuantity {
    /// Metabolite or chemical concentration
    Concentration,

    /// Compartment populations (epidemic models)
    Population,

    /// Large-size-class eDNA concentration on a depth grid
    LargeEdna,

    /// Small-size-class eDNA concentration on a depth grid
    SmallEdna,

    /// Custom quantity (for use extension)
    Custom(&'static str),
}

impl fmt::Display for PhysicalQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicalQuantity::Concentration => write!(f, "Concentration"),
            PhysicalQuantity::Population => write!(f, "Population"),
            PhysicalQuantity::LargeEdna => write!(f, "Large eDNA"),
            PhysicalQuantity::SmallEdna => write!(f, "Small eDNA"),
            PhysicalQuantity::Custom(name) => write!(f, "{}", name),
        }
    }
}

// =================================================================================================
// Physical State (Flexible State Container)
// =================================================================================================

/// Physical state of the system
///
/// Holds every physical quantity at a given time together with scalar
/// metadata. Solvers write the evaluation time under the `"time"` key before
/// each right-hand-side evaluation, so time-dependent forcing can read it.
#[derive(Debug, Clone)]
pub struct PhysicalState {
    /// Physical quantities stored in a dictionary
    pub(crate) quantities: HashMap<PhysicalQuantity, PhysicalData>,

    /// Scalar metadata (e.g. time)
    pub(crate) metadata: HashMap<String, f64>,
}

impl PhysicalState {
    /// Create a new state with primary quantity
    pub fn new(quantity: PhysicalQuantity, value: PhysicalData) -> Self {
        let mut quantities = HashMap::new();
        quantities.insert(quantity, value);

        Self {
            quantities,
            metadata: HashMap::new(),
        }
    }

    /// Create an empty state
    pub fn empty() -> Self {
        Self {
            quantities: HashMap::new(),
            metadata: HashMap::new(),
        }
    }

    /// Get a quantity by type
    pub fn get(&self, quantity: PhysicalQuantity) -> Option<&PhysicalData> {
        self.quantities.get(&quantity)
    }

    /// Get mutable reference to a quantity
    pub fn get_mut(&mut self, quantity: PhysicalQuantity) -> Option<&mut PhysicalData> {
        self.quantities.get_mut(&quantity)
    }

    /// Set a quantity
    pub fn set(&mut self, quantity: PhysicalQuantity, value: PhysicalData) {
        self.quantities.insert(quantity, value);
    }

    /// Builder-style variant of [`set`](Self::set)
    pub fn with(mut self, quantity: PhysicalQuantity, value: PhysicalData) -> Self {
        self.set(quantity, value);
        self
    }

    /// List of available physical state quantities
    pub fn available_quantities(&self) -> Vec<PhysicalQuantity> {
        self.quantities.keys().cloned().collect()
    }

    /// Iterate over (quantity, data) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&PhysicalQuantity, &PhysicalData)> {
        self.quantities.iter()
    }

    /// Get a metadata
    pub fn get_metadata(&self, key: &str) -> Option<f64> {
        self.metadata.get(key).copied()
    }

    /// Set a metadata
    pub fn set_metadata(&mut self, key: impl Into<String>, value: f64) {
        self.metadata.insert(key.into(), value);
    }

    /// Evaluation time written by the solver (0 when absent)
    pub fn time(&self) -> f64 {
        self.get_metadata("time").unwrap_or(0.0)
    }
}

// Operator overloading for numerical operations

impl std::ops::Add for PhysicalState {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        for (quantity, value) in rhs.quantities {
            match self.quantities.remove(&quantity) {
                Some(existing) => {
                    self.quantities.insert(quantity, existing + value);
                }
                None => {
                    self.quantities.insert(quantity, value);
                }
            }
        }
        self
    }
}

impl std::ops::Mul<f64> for PhysicalState {
    type Output = Self;

    fn mul(mut self, scalar: f64) -> Self::Output {
        for data in self.quantities.values_mut() {
            data.apply(|x| x * scalar);
        }
        self
    }
}

// ==================================================================================================
// Physical Model Trait
// =================================================================================================

/// Trait for physical models
///
/// # Responsibility
/// Computes the right-hand side of dy/dt = f(y, t) at a given state.
/// Does NOT integrate it (that's the Solver's job).
pub trait PhysicalModel: Send + Sync {
    /// Number of spatial points (1 for well-mixed models)
    fn points(&self) -> usize;

    /// Computes dy/dt at the given state
    ///
    /// The returned state holds one entry per integrated quantity, with the
    /// same shape as in `state`. Quantities absent from the result are held
    /// constant by the solvers. The evaluation time is `state.time()`.
    fn compute_physics(&self, state: &PhysicalState) -> PhysicalState;

    /// Creates the initial state for this physical model
    fn setup_initial_state(&self) -> PhysicalState;

    /// Name of the model (used to display and logging)
    fn name(&self) -> &str;

    /// Description of the model (option)
    fn description(&self) -> Option<&str> {
        None
    }

    /// Called once after every accepted solver step
    ///
    /// `previous` is the state at the start of the step and `next` the state
    /// the solver accepted, `time` the start time and `dt` the step length.
    /// Models with bookkeeping outside the integrated state (such as a
    /// predator's stomach content) update it here from the increments of
    /// integrated quantities, so the update agrees with any solver.
    fn on_step(&self, _previous: &PhysicalState, _next: &PhysicalState, _time: f64, _dt: f64) {}
}

/// A shared model can be handed to a scenario and still be inspected after
/// the run
impl<M: PhysicalModel + ?Sized> PhysicalModel for std::sync::Arc<M> {
    fn points(&self) -> usize {
        (**self).points()
    }

    fn compute_physics(&self, state: &PhysicalState) -> PhysicalState {
        (**self).compute_physics(state)
    }

    fn setup_initial_state(&self) -> PhysicalState {
        (**self).setup_initial_state()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn description(&self) -> Option<&str> {
        (**self).description()
    }

    fn on_step(&self, previous: &PhysicalState, next: &PhysicalState, time: f64, dt: f64) {
        (**self).on_step(previous, next, time, dt)
    }
}

// =================================================================================================
// Tests
// =================================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_physical_state() {
        let physics = PhysicalState::empty();

        assert_eq!(physics.quantities.len(), 0);
        assert_eq!(physics.metadata.len(), 0);
        assert_eq!(physics.time(), 0.0);
    }

    #[test]
    fn test_new_physical_state() {
        let quantity = PhysicalQuantity::Custom("Stomach");
        let physics = PhysicalState::new(quantity, PhysicalData::from_vec(vec![1.0, 2.0]));

        assert_eq!(physics.quantities.len(), 1);
        assert!(physics.available_quantities().contains(&quantity));
        assert_eq!(physics.get(quantity).unwrap().len(), 2);
    }

    #[test]
    fn test_metadata_time() {
        let mut physics = PhysicalState::new(
            PhysicalQuantity::Population,
            PhysicalData::from_vec(vec![990.0, 10.0, 0.0, 0.0]),
        );

        physics.set_metadata("time", 12.5);
        assert_eq!(physics.time(), 12.5);
    }

    #[test]
    fn test_addition() {
        let large = PhysicalState::new(
            PhysicalQuantity::LargeEdna,
            PhysicalData::from_vec(vec![780.0, 1024.0]),
        );
        let increment = PhysicalState::new(
            PhysicalQuantity::LargeEdna,
            PhysicalData::from_vec(vec![230.0, -24.0]),
        );
        let small = PhysicalState::new(
            PhysicalQuantity::SmallEdna,
            PhysicalData::from_vec(vec![0.0, 273.15]),
        );

        let summed = large.clone() + increment;
        let merged = small + large;

        let values = summed.get(PhysicalQuantity::LargeEdna).unwrap().as_vector();
        assert_eq!(values[0], 1010.0);
        assert_eq!(values[1], 1000.0);

        assert_eq!(merged.available_quantities().len(), 2);
        assert_eq!(merged.get(PhysicalQuantity::SmallEdna).unwrap().as_vector()[0], 0.0);
    }

    #[test]
    fn test_addition_keeps_left_metadata() {
        let mut left = PhysicalState::new(PhysicalQuantity::Concentration, PhysicalData::Scalar(1.0));
        left.set_metadata("time", 3.0);
        let mut right = PhysicalState::new(PhysicalQuantity::Concentration, PhysicalData::Scalar(1.0));
        right.set_metadata("time", 9.0);

        let sum = left + right;
        assert_eq!(sum.time(), 3.0);
        assert_eq!(sum.get(PhysicalQuantity::Concentration).unwrap().as_scalar(), 2.0);
    }

    #[test]
    fn test_multiplication() {
        let state = PhysicalState::new(
            PhysicalQuantity::Concentration,
            PhysicalData::from_vec(vec![1.0, 2.0]),
        ) * 10.0;

        let values = state.get(PhysicalQuantity::Concentration).unwrap().as_vector();
        assert_eq!(values[0], 10.0);
        assert_eq!(values[1], 20.0);
    }
}
