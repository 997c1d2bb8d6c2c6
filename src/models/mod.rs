//! Physical models
//!
//! All models implement the [`PhysicalModel`](crate::physics::PhysicalModel) trait.
//! The solver calls `compute_physics` at each time step; models are responsible
//! for the right-hand side, the solver for the time integration.
//!
//! # Available Models
//!
//! ## [`Relaxation`]
//!
//! dx/dt = 1 - x with its exact solution, the reference problem for comparing
//! forward Euler and RK4.
//!
//! ## [`EnzymePathway`]
//!
//! Three enzymatic steps in series with Michaelis-Menten or mass-action
//! kinetics, and the fitting of mass-action constants.
//!
//! ## [`SirModel`]
//!
//! Well-mixed susceptible / infected / recovered / dead compartments.
//!
//! ## [`flux_balance`]
//!
//! Steady-state metabolic fluxes by linear programming. Not a time-dependent
//! model: it is solved directly with [`MetabolicNetwork::optimize`].
//!
//! ## [`edna`]
//!
//! Vertical transport of environmental DNA shed by migrating organisms,
//! with an optional predator pathway.

// =================================================================================================
// Module Declarations
// =================================================================================================

pub mod edna;
pub mod enzyme;
pub mod flux_balance;
pub mod relaxation;
pub mod sir;

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use edna::{EdnaTransport, PredatorTransport};
pub use enzyme::{EnzymePathway, MassActionFit, RateLaw, fit_mass_action};
pub use flux_balance::{FluxSolution, FluxStatus, MetabolicNetwork, textbook_network};
pub use relaxation::Relaxation;
pub use sir::SirModel;
