//! Decomposition of an observed distribution into DVM modes
//!
//! An observed `time × depth` distribution is approximated by a weighted sum
//! of `n` DVM patterns. Each mode has six parameters
//!
//! ```text
//! [shallow depth, deep depth, up start (h), down start (h), thickness (m), weight]
//! ```
//!
//! with 3 h migration windows. The objective is the mean squared error of
//! the combined pattern plus `100·(shallow - deep + 1)²` for every mode whose
//! shallow depth is not above its deep depth.

use log::debug;
use ndarray::Array2;

use super::grid::DepthGrid;
use super::migration::{DvmSpec, combine_dvm, dvm};
use crate::error::{Result, SimulationError};
use crate::optimize::fitting::clamp_to_bounds;
use crate::optimize::{MultiStartOptions, NelderMeadOptions, minimize, minimize_bounded};

/// Parameters per mode
pub const PARAMETERS_PER_MODE: usize = 6;

#[derive(Debug, Clone)]
pub struct DecompositionOptions {
    /// Global sampling and local refinement settings
    pub search: MultiStartOptions,
    /// Optional starting point refined alongside the random starts
    pub initial_guess: Option<Vec<f64>>,
}

impl Default for DecompositionOptions {
    fn default() -> Self {
        Self {
            search: MultiStartOptions {
                samples: 300,
                refinements: 4,
                seed: 42,
                local: NelderMeadOptions {
                    max_iters: 3000,
                    sd_tolerance: 1e-14,
                    ..Default::default()
                },
            },
            initial_guess: None,
        }
    }
}

/// One fitted mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedMode {
    pub spec: DvmSpec,
    /// Weight after normalization over all modes
    pub weight: f64,
}

#[derive(Debug, Clone)]
pub struct Decomposition {
    /// Raw parameter vector, six entries per mode
    pub parameters: Vec<f64>,
    pub modes: Vec<FittedMode>,
    pub individual_patterns: Vec<Array2<f64>>,
    pub combined_model: Array2<f64>,
    /// Objective value (MSE plus ordering penalty) at the optimum
    pub fit_error: f64,
}

impl Decomposition {
    pub fn weights(&self) -> Vec<f64> {
        self.modes.iter().map(|m| m.weight).collect()
    }
}

/// Goodness of fit of a predicted pattern
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitMetrics {
    pub mse: f64,
    pub rmse: f64,
    /// Coefficient of determination, 0 when the observation is constant
    pub r_squared: f64,
    /// Pearson correlation of the flattened arrays, 0 when undefined
    pub correlation: f64,
}

/// Search box of one mode on `grid`
pub fn mode_bounds(grid: &DepthGrid) -> [(f64, f64); PARAMETERS_PER_MODE] {
    let depth = (0.0, grid.z_max());
    [depth, depth, (0.0, 21.0), (0.0, 21.0), (1.0, 200.0), (0.1, 1.0)]
}

fn mode_spec(chunk: &[f64]) -> DvmSpec {
    DvmSpec::new(chunk[0], chunk[1], chunk[2], chunk[3], chunk[4])
}

/// Individual patterns and raw weights described by a parameter vector
pub fn patterns_from_parameters(
    parameters: &[f64],
    grid: &DepthGrid,
    steps_per_day: usize,
) -> (Vec<Array2<f64>>, Vec<f64>) {
    parameters
        .chunks_exact(PARAMETERS_PER_MODE)
        .map(|chunk| (dvm(grid, steps_per_day, &mode_spec(chunk)), chunk[5]))
        .unzip()
}

/// Mean squared error plus ordering penalty
pub fn migration_objective(parameters: &[f64], observed: &Array2<f64>, grid: &DepthGrid) -> Result<f64> {
    let penalty: f64 = parameters
        .chunks_exact(PARAMETERS_PER_MODE)
        .filter(|chunk| chunk[0] >= chunk[1])
        .map(|chunk| 100.0 * (chunk[0] - chunk[1] + 1.0).powi(2))
        .sum();

    let (patterns, weights) = patterns_from_parameters(parameters, grid, observed.nrows());
    let combined = combine_dvm(&patterns, &weights)?;
    Ok(mean_squared_error(observed, &combined) + penalty)
}

fn mean_squared_error(observed: &Array2<f64>, predicted: &Array2<f64>) -> f64 {
    let n = observed.len().max(1) as f64;
    observed
        .iter()
        .zip(predicted.iter())
        .map(|(o, p)| (o - p).powi(2))
        .sum::<f64>()
        / n
}

/// Fit `n_modes` DVM modes to `observed` (`steps × grid.len()`, one day)
pub fn fit_migration_model(
    observed: &Array2<f64>,
    grid: &DepthGrid,
    n_modes: usize,
    options: &DecompositionOptions,
) -> Result<Decomposition> {
    if n_modes == 0 {
        return Err(SimulationError::InvalidConfiguration("At least one mode is needed".to_string()));
    }
    if observed.ncols() != grid.len() || observed.nrows() == 0 {
        return Err(SimulationError::InvalidConfiguration(format!(
            "Observed pattern is {}x{}, expected steps x {}",
            observed.nrows(),
            observed.ncols(),
            grid.len()
        )));
    }

    let bounds: Vec<(f64, f64)> = (0..n_modes).flat_map(|_| mode_bounds(grid)).collect();
    let objective = |p: &[f64]| {
        migration_objective(&clamp_to_bounds(p, &bounds), observed, grid).unwrap_or(f64::INFINITY)
    };

    // ====== Global search, then optional refinement of the caller's guess ======

    let mut best = minimize_bounded(&objective, &bounds, &options.search)?;

    if let Some(guess) = &options.initial_guess {
        if guess.len() != bounds.len() {
            return Err(SimulationError::InvalidConfiguration(format!(
                "Initial guess has {} values, expected {}",
                guess.len(),
                bounds.len()
            )));
        }
        let local = minimize(&objective, &clamp_to_bounds(guess, &bounds), &options.search.local)?;
        let param = clamp_to_bounds(&local.param, &bounds);
        let cost = objective(&param);
        if cost < best.cost {
            best.param = param;
            best.cost = cost;
        }
    }

    // ====== Assemble the result ======

    let parameters = clamp_to_bounds(&best.param, &bounds);
    let (individual_patterns, raw_weights) = patterns_from_parameters(&parameters, grid, observed.nrows());
    let total: f64 = raw_weights.iter().sum();
    let weights: Vec<f64> = raw_weights.iter().map(|w| w / total).collect();
    let combined_model = combine_dvm(&individual_patterns, &weights)?;
    let fit_error = migration_objective(&parameters, observed, grid)?;

    let modes = parameters
        .chunks_exact(PARAMETERS_PER_MODE)
        .zip(weights.iter())
        .map(|(chunk, &weight)| FittedMode {
            spec: mode_spec(chunk),
            weight,
        })
        .collect();

    debug!("decomposed into {} modes, fit error {:.3e}", n_modes, fit_error);

    Ok(Decomposition {
        parameters,
        modes,
        individual_patterns,
        combined_model,
        fit_error,
    })
}

/// MSE, RMSE, R² and Pearson correlation of `predicted` against `observed`
pub fn eval_model_fit(observed: &Array2<f64>, predicted: &Array2<f64>) -> Result<FitMetrics> {
    if observed.dim() != predicted.dim() {
        return Err(SimulationError::InvalidConfiguration(format!(
            "Cannot compare patterns of shape {:?} and {:?}",
            observed.dim(),
            predicted.dim()
        )));
    }

    let mse = mean_squared_error(observed, predicted);
    let n = observed.len().max(1) as f64;
    let mean_o = observed.sum() / n;
    let mean_p = predicted.sum() / n;

    let ss_tot: f64 = observed.iter().map(|o| (o - mean_o).powi(2)).sum();
    let ss_res = mse * n;
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    let ss_pred: f64 = predicted.iter().map(|p| (p - mean_p).powi(2)).sum();
    let covariance: f64 = observed
        .iter()
        .zip(predicted.iter())
        .map(|(o, p)| (o - mean_o) * (p - mean_p))
        .sum();
    let correlation = if ss_tot > 0.0 && ss_pred > 0.0 {
        covariance / (ss_tot * ss_pred).sqrt()
    } else {
        0.0
    };

    Ok(FitMetrics {
        mse,
        rmse: mse.sqrt(),
        r_squared,
        correlation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid() -> DepthGrid {
        DepthGrid::new(600.0, 20.0).unwrap()
    }

    fn truth() -> Array2<f64> {
        dvm(&grid(), 48, &DvmSpec::new(100.0, 500.0, 18.0, 6.0, 100.0))
    }

    #[test]
    fn test_objective_vanishes_at_truth() {
        let cost = migration_objective(&[100.0, 500.0, 18.0, 6.0, 100.0, 1.0], &truth(), &grid()).unwrap();
        assert!(cost < 1e-20);
    }

    #[test]
    fn test_ordering_penalty() {
        let ordered = migration_objective(&[100.0, 500.0, 18.0, 6.0, 100.0, 1.0], &truth(), &grid()).unwrap();
        let swapped = migration_objective(&[500.0, 100.0, 18.0, 6.0, 100.0, 1.0], &truth(), &grid()).unwrap();
        assert!(swapped >= 100.0 * 401.0 * 401.0);
        assert!(ordered < swapped);
    }

    #[test]
    fn test_eval_perfect_and_constant() {
        let observed = truth();
        let perfect = eval_model_fit(&observed, &observed).unwrap();
        assert_eq!(perfect.mse, 0.0);
        assert_relative_eq!(perfect.r_squared, 1.0, epsilon = 1e-12);
        assert_relative_eq!(perfect.correlation, 1.0, epsilon = 1e-12);

        let flat = Array2::from_elem(observed.dim(), 0.5);
        let metrics = eval_model_fit(&flat, &observed).unwrap();
        assert_eq!(metrics.r_squared, 0.0);
        assert_eq!(metrics.correlation, 0.0);
        assert_relative_eq!(metrics.rmse, metrics.mse.sqrt());

        assert!(eval_model_fit(&observed, &Array2::zeros((2, 2))).is_err());
    }

    #[test]
    fn test_fit_refines_a_rough_guess() {
        let observed = truth();
        let guess = vec![120.0, 460.0, 17.0, 7.0, 120.0, 0.8];
        let guess_error = migration_objective(&guess, &observed, &grid()).unwrap();

        let options = DecompositionOptions {
            search: MultiStartOptions {
                samples: 40,
                refinements: 1,
                seed: 7,
                local: NelderMeadOptions {
                    max_iters: 400,
                    ..Default::default()
                },
            },
            initial_guess: Some(guess),
        };
        let decomposition = fit_migration_model(&observed, &grid(), 1, &options).unwrap();

        assert!(decomposition.fit_error <= guess_error);
        assert_eq!(decomposition.modes.len(), 1);
        assert_relative_eq!(decomposition.weights()[0], 1.0, epsilon = 1e-12);
        assert_eq!(decomposition.combined_model.dim(), observed.dim());

        let metrics = eval_model_fit(&observed, &decomposition.combined_model).unwrap();
        let spec = decomposition.modes[0].spec;
        assert!(spec.shallow_depth < spec.deep_depth);
        assert!(metrics.mse <= guess_error);
    }

    #[test]
    fn test_rejects_bad_input() {
        let observed = truth();
        assert!(fit_migration_model(&observed, &grid(), 0, &DecompositionOptions::default()).is_err());
        let wrong_grid = DepthGrid::new(300.0, 20.0).unwrap();
        assert!(fit_migration_model(&observed, &wrong_grid, 1, &DecompositionOptions::default()).is_err());
    }
}
