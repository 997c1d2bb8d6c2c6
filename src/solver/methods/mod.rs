//! Numerical methods for time integration
//!
//! Concrete implementations of the [`Solver`](crate::solver::Solver) trait.
//!
//! - **[`EulerSolver`]**: Forward Euler, first order, 1 evaluation per step
//! - **[`RK4Solver`]**: classical Runge-Kutta, fourth order, 4 evaluations per step
//!
//! Both are stateless unit structs and can be reused across scenarios.

mod euler;
mod rk4;

pub use euler::EulerSolver;
pub use rk4::RK4Solver;
