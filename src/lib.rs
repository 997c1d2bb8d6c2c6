//! biosim-rs: numerical systems-biology exercises
//!
//! Deterministic and stochastic models of small biological systems, all
//! driven through one model/solver interface where that fits:
//!
//! - ODE integration with forward Euler and RK4 ([`solver`]) of models
//!   implementing [`physics::PhysicalModel`]: relaxation, enzyme pathways,
//!   compartmental SIR and eDNA vertical transport ([`models`])
//! - Nelder-Mead parameter fitting and a simplex LP solver for flux balance
//!   analysis ([`optimize`], [`models::flux_balance`])
//! - Gillespie simulations of reaction networks ([`stochastic`])
//! - A particle-based SIR epidemic ([`agents`])
//! - Plots and CSV export ([`output`])
//!
//! # Architecture
//!
//! Physics and numerics are kept apart: a model only returns the time
//! derivative of its state, a solver decides how to step it.
//!
//! ```rust
//! use biosim_rs::prelude::*;
//! use biosim_rs::models::Relaxation;
//!
//! // dx/dt = 1 - x from x(0) = 0
//! let scenario = Scenario::from_model(Box::new(Relaxation::new(0.0)));
//! let config = SolverConfiguration::fixed_step(5.0, 0.01);
//!
//! let result = RK4Solver::new().solve(&scenario, &config)?;
//! let x = result.final_state.get(PhysicalQuantity::Concentration).unwrap().as_scalar();
//! assert!((x - (1.0 - (-5.0f64).exp())).abs() < 1e-8);
//! # Ok::<(), biosim_rs::SimulationError>(())
//! ```
//!
//! # Modules
//!
//! - [`physics`]: state containers and the model trait
//! - [`solver`]: scenarios, configurations, Euler and RK4, convergence studies
//! - [`models`]: the deterministic models
//! - [`optimize`]: Nelder-Mead fitting and linear programming
//! - [`stochastic`]: Gillespie direct method and ensembles
//! - [`agents`]: agent-based epidemic
//! - [`config`]: JSON run configurations
//! - [`output`]: visualization and export

pub mod error;
pub mod physics;

pub mod agents;
pub mod config;
pub mod models;
pub mod optimize;
pub mod output;
pub mod solver;
pub mod stochastic;

pub use error::{Result, SimulationError};

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use biosim_rs::prelude::*;
    //! ```
    pub use crate::error::{Result, SimulationError};
    pub use crate::physics::{PhysicalData, PhysicalModel, PhysicalQuantity, PhysicalState};
    pub use crate::solver::{
        EulerSolver, RK4Solver, Scenario, SimulationResult, Solver, SolverConfiguration, SolverType,
    };
}
