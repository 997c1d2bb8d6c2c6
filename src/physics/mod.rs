//! Physical models
//!
//! A physical model encapsulates the equations of a system (a kinetic
//! pathway, an epidemic, a column of seawater carrying eDNA).
//!
//! # Architecture
//!
//! Physical models are **separate from numerical solvers**:
//! - The model provides the **equations** (right-hand side)
//! - The solver provides the **method** to integrate them (Euler, RK4)
//!
//! The same relaxation equation can therefore be integrated by both solvers
//! to compare their accuracy, and the same solver drives every model of the
//! crate.
//!
//! # Example
//!
//! ```rust
//! use biosim_rs::physics::{PhysicalData, PhysicalModel, PhysicalQuantity, PhysicalState};
//!
//! struct Decay;
//!
//! impl PhysicalModel for Decay {
//!     fn points(&self) -> usize { 1 }
//!     fn compute_physics(&self, state: &PhysicalState) -> PhysicalState {
//!         let x = state.get(PhysicalQuantity::Concentration).unwrap().as_scalar();
//!         PhysicalState::new(PhysicalQuantity::Concentration, PhysicalData::Scalar(-x))
//!     }
//!     fn setup_initial_state(&self) -> PhysicalState {
//!         PhysicalState::new(PhysicalQuantity::Concentration, PhysicalData::Scalar(1.0))
//!     }
//!     fn name(&self) -> &str { "Decay" }
//! }
//!
//! let model = Decay;
//! let rate = model.compute_physics(&model.setup_initial_state());
//! assert_eq!(rate.get(PhysicalQuantity::Concentration).unwrap().as_scalar(), -1.0);
//! ```

pub mod data;
pub mod traits;

pub use data::PhysicalData;
pub use traits::{PhysicalModel, PhysicalQuantity, PhysicalState};
