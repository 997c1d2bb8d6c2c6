//! Optimization back-ends
//!
//! - [`linprog`]: dense two-phase simplex used by flux balance analysis
//! - [`fitting`]: Nelder-Mead based parameter fitting (argmin)

pub mod fitting;
pub mod linprog;

pub use fitting::{MultiStartOptions, Minimum, NelderMeadOptions, minimize, minimize_bounded};
pub use linprog::{LinearProgram, LpError, LpSolution};
