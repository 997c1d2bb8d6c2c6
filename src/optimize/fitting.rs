//! Derivative-free parameter fitting
//!
//! Thin layer over argmin's Nelder-Mead:
//! - [`minimize`] refines a single starting point
//! - every local search is restarted from its best vertex with a fresh
//!   simplex until a restart no longer lowers the cost (argmin only stops on
//!   the spread of the vertex costs, which is zero for a simplex straddling
//!   the minimum with equal costs)
//! - [`minimize_bounded`] draws seeded random starts inside a box, keeps the
//!   best few and refines them, clamping every evaluation into the box
//!
//! Objectives are plain closures `Fn(&[f64]) -> f64`. Non-finite objective
//! values (for instance a simulation that blew up) are replaced by a large
//! finite cost so that the simplex simply moves away from them.

use argmin::core::{CostFunction, Error, Executor};
use argmin::solver::neldermead::NelderMead;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Result, SimulationError};

/// Cost assigned to evaluations that returned NaN or infinity
pub const FAILED_COST: f64 = 1e300;

/// Nelder-Mead settings
#[derive(Debug, Clone, Copy)]
pub struct NelderMeadOptions {
    /// Maximum number of iterations, shared by all restarts
    pub max_iters: u64,
    /// Stop when the standard deviation of the simplex costs drops below this
    pub sd_tolerance: f64,
    /// Initial simplex edge, relative to each coordinate
    pub relative_step: f64,
    /// Maximum number of restarts from the best vertex
    pub restarts: usize,
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        Self {
            max_iters: 2000,
            sd_tolerance: 1e-12,
            relative_step: 0.1,
            restarts: 10,
        }
    }
}

/// Settings of the bounded multi-start search
#[derive(Debug, Clone, Copy)]
pub struct MultiStartOptions {
    /// Number of random points evaluated in the box
    pub samples: usize,
    /// Number of best samples refined with Nelder-Mead
    pub refinements: usize,
    /// Random seed of the sampling stage
    pub seed: u64,
    /// Local refinement settings (`relative_step` is relative to the box width)
    pub local: NelderMeadOptions,
}

impl Default for MultiStartOptions {
    fn default() -> Self {
        Self {
            samples: 200,
            refinements: 4,
            seed: 42,
            local: NelderMeadOptions::default(),
        }
    }
}

/// Best point found by an optimizer
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub param: Vec<f64>,
    pub cost: f64,
    pub iterations: u64,
}

struct ClosureCost<'a, F> {
    objective: &'a F,
}

impl<F> CostFunction for ClosureCost<'_, F>
where
    F: Fn(&[f64]) -> f64,
{
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> std::result::Result<Self::Output, Error> {
        let value = (self.objective)(param);
        Ok(if value.is_finite() { value } else { FAILED_COST })
    }
}

/// Simplex made of `x0` and one vertex per coordinate shifted by `steps[i]`
pub fn initial_simplex(x0: &[f64], steps: &[f64]) -> Vec<Vec<f64>> {
    let mut vertices = Vec::with_capacity(x0.len() + 1);
    vertices.push(x0.to_vec());
    for (i, step) in steps.iter().enumerate() {
        let mut vertex = x0.to_vec();
        vertex[i] += step;
        vertices.push(vertex);
    }
    vertices
}

fn relative_steps(x0: &[f64], relative_step: f64) -> Vec<f64> {
    x0.iter()
        .map(|&x| if x == 0.0 { 0.00025 } else { relative_step * x })
        .collect()
}

/// Edge of each coordinate in a simplex built by [`initial_simplex`]
fn simplex_steps(simplex: &[Vec<f64>]) -> Vec<f64> {
    simplex
        .iter()
        .skip(1)
        .enumerate()
        .map(|(i, vertex)| {
            let step = vertex[i] - simplex[0][i];
            if step == 0.0 { 0.00025 } else { step }
        })
        .collect()
}

fn run_nelder_mead<F>(objective: &F, simplex: Vec<Vec<f64>>, options: &NelderMeadOptions) -> Result<Minimum>
where
    F: Fn(&[f64]) -> f64,
{
    let steps = simplex_steps(&simplex);
    let mut best = single_nelder_mead(objective, simplex, options.sd_tolerance, options.max_iters)?;

    for restart in 0..options.restarts {
        let remaining = options.max_iters.saturating_sub(best.iterations);
        if remaining == 0 {
            break;
        }
        let simplex = initial_simplex(&best.param, &steps);
        let next = single_nelder_mead(objective, simplex, options.sd_tolerance, remaining)?;
        let improvement = best.cost - next.cost;
        let iterations = best.iterations + next.iterations;
        debug!("Nelder-Mead restart {}: {:.3e} -> {:.3e}", restart + 1, best.cost, next.cost);

        if next.cost < best.cost {
            best = Minimum { iterations, ..next };
        } else {
            best.iterations = iterations;
        }
        if improvement <= options.sd_tolerance {
            break;
        }
    }

    Ok(best)
}

fn single_nelder_mead<F>(objective: &F, simplex: Vec<Vec<f64>>, sd_tolerance: f64, max_iters: u64) -> Result<Minimum>
where
    F: Fn(&[f64]) -> f64,
{
    let solver: NelderMead<Vec<f64>, f64> = NelderMead::new(simplex).with_sd_tolerance(sd_tolerance)?;
    let result = Executor::new(ClosureCost { objective }, solver)
        .configure(|state| state.max_iters(max_iters))
        .run()?;

    let state = result.state;
    let param = state
        .best_param
        .ok_or_else(|| SimulationError::Optimization("Nelder-Mead returned no parameters".to_string()))?;

    Ok(Minimum {
        param,
        cost: state.best_cost,
        iterations: state.iter,
    })
}

/// Unconstrained Nelder-Mead from `x0`
///
/// ```rust
/// use biosim_rs::optimize::{minimize, NelderMeadOptions};
///
/// let rosen = |p: &[f64]| (1.0 - p[0]).powi(2) + 100.0 * (p[1] - p[0] * p[0]).powi(2);
/// let best = minimize(&rosen, &[-1.2, 1.0], &NelderMeadOptions::default())?;
/// assert!((best.param[0] - 1.0).abs() < 1e-3);
/// # Ok::<(), biosim_rs::SimulationError>(())
/// ```
pub fn minimize<F>(objective: &F, x0: &[f64], options: &NelderMeadOptions) -> Result<Minimum>
where
    F: Fn(&[f64]) -> f64,
{
    if x0.is_empty() {
        return Err(SimulationError::Optimization("Empty starting point".to_string()));
    }
    let simplex = initial_simplex(x0, &relative_steps(x0, options.relative_step));
    run_nelder_mead(objective, simplex, options)
}

/// Clamp every coordinate into its bounds
pub fn clamp_to_bounds(param: &[f64], bounds: &[(f64, f64)]) -> Vec<f64> {
    param
        .iter()
        .zip(bounds.iter())
        .map(|(&x, &(lo, hi))| x.clamp(lo, hi))
        .collect()
}

/// Global-then-local search inside a box
///
/// The objective is only ever evaluated at points inside `bounds`. The
/// simplex may wander outside; such vertices are evaluated at their clamped
/// image plus a quadratic penalty on the distance to the box.
pub fn minimize_bounded<F>(objective: &F, bounds: &[(f64, f64)], options: &MultiStartOptions) -> Result<Minimum>
where
    F: Fn(&[f64]) -> f64,
{
    if bounds.is_empty() {
        return Err(SimulationError::Optimization("No parameters to optimize".to_string()));
    }
    if let Some((lo, hi)) = bounds.iter().find(|(lo, hi)| !(lo.is_finite() && hi.is_finite() && lo <= hi)) {
        return Err(SimulationError::Optimization(format!("Invalid bounds ({}, {})", lo, hi)));
    }

    let bounded = |param: &[f64]| {
        let clamped = clamp_to_bounds(param, bounds);
        let outside: f64 = param
            .iter()
            .zip(clamped.iter())
            .zip(bounds.iter())
            .map(|((x, c), (lo, hi))| {
                let width = (hi - lo).max(f64::EPSILON);
                ((x - c) / width).powi(2)
            })
            .sum();
        objective(&clamped) + 1e3 * outside
    };

    // ====== Global stage: seeded uniform samples ======

    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut samples: Vec<(Vec<f64>, f64)> = (0..options.samples.max(1))
        .map(|_| {
            let point: Vec<f64> = bounds
                .iter()
                .map(|&(lo, hi)| if hi > lo { rng.random_range(lo..=hi) } else { lo })
                .collect();
            let cost = objective(&point);
            (point, if cost.is_finite() { cost } else { FAILED_COST })
        })
        .collect();
    samples.sort_by(|a, b| a.1.total_cmp(&b.1));

    // ====== Local stage: Nelder-Mead from the best samples ======

    let steps: Vec<f64> = bounds
        .iter()
        .map(|(lo, hi)| (options.local.relative_step * (hi - lo)).max(1e-6))
        .collect();

    let mut best: Option<Minimum> = None;
    for (start, start_cost) in samples.into_iter().take(options.refinements.max(1)) {
        let simplex: Vec<Vec<f64>> = initial_simplex(&start, &steps)
            .into_iter()
            .map(|vertex| {
                // Reflect vertices that leave the box back inside
                vertex
                    .iter()
                    .zip(start.iter())
                    .zip(bounds.iter())
                    .map(|((&v, &s), &(lo, hi))| if v > hi { s - (v - s) } else { v }.clamp(lo, hi))
                    .collect()
            })
            .collect();

        let local = run_nelder_mead(&bounded, simplex, &options.local)?;
        let param = clamp_to_bounds(&local.param, bounds);
        let cost = objective(&param);
        debug!("multi-start refinement: {:.3e} -> {:.3e}", start_cost, cost);

        if best.as_ref().is_none_or(|b| cost < b.cost) {
            best = Some(Minimum {
                param,
                cost,
                iterations: local.iterations,
            });
        }
    }

    best.ok_or_else(|| SimulationError::Optimization("Multi-start search produced no candidate".to_string()))
}
