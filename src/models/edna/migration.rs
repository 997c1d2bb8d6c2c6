//! Diel vertical migration (DVM) patterns
//!
//! A pattern is a `steps × depths` array covering one day. Each row is the
//! vertical distribution of a population at that time of day: a layer of the
//! given thickness with uniform weight `1/cells`, so every row sums to one.
//!
//! The layer centre sits at the shallow or the deep depth and moves linearly
//! between them during the upward and downward migration windows (hours of
//! the day).

use log::warn;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::grid::DepthGrid;
use crate::error::{Result, SimulationError};

/// Parameters of one migrating population
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DvmSpec {
    pub shallow_depth: f64,
    pub deep_depth: f64,
    /// Upward migration window (h)
    pub up_start: f64,
    pub up_end: f64,
    /// Downward migration window (h)
    pub down_start: f64,
    pub down_end: f64,
    /// Layer thickness (m)
    #[serde(default = "default_thickness")]
    pub layer_thickness: f64,
}

fn default_thickness() -> f64 {
    20.0
}

impl DvmSpec {
    /// Population migrating over 3 h windows starting at `up_start` and `down_start`
    pub fn new(shallow_depth: f64, deep_depth: f64, up_start: f64, down_start: f64, layer_thickness: f64) -> Self {
        Self {
            shallow_depth,
            deep_depth,
            up_start,
            up_end: up_start + 3.0,
            down_start,
            down_end: down_start + 3.0,
            layer_thickness,
        }
    }

    /// Layer centre at hour `t` of the day, before clipping to the grid
    pub fn center_depth(&self, t: f64, shallow: f64, deep: f64) -> f64 {
        if self.down_start < t && t < self.down_end {
            shallow + (deep - shallow) * (t - self.down_start) / (self.down_end - self.down_start)
        } else if self.up_start < t && t < self.up_end {
            deep - (deep - shallow) * (t - self.up_start) / (self.up_end - self.up_start)
        } else if self.up_end < self.down_start {
            // Shallow between the end of the ascent and the start of the descent
            if t <= self.up_start || t >= self.down_end {
                deep
            } else {
                shallow
            }
        } else if t <= self.down_start || t >= self.up_end {
            shallow
        } else {
            deep
        }
    }
}

/// One-day migration pattern with `steps_per_day` rows
pub fn dvm(grid: &DepthGrid, steps_per_day: usize, spec: &DvmSpec) -> Array2<f64> {
    let nz = grid.len();
    let mut intensity = Array2::zeros((steps_per_day, nz));
    if nz == 0 {
        return intensity;
    }

    let (z_min, z_max) = (0.0, grid.z_max());
    let dz = grid.dz();
    let shallow = spec.shallow_depth.clamp(z_min, z_max);
    let deep = spec.deep_depth.clamp(z_min, z_max);
    let thickness = spec.layer_thickness.min(z_max - z_min).max(1.0);
    let half_layer = (thickness / 2.0 / dz) as usize;
    let hours_per_step = 24.0 / steps_per_day as f64;

    for (t_idx, mut row) in intensity.rows_mut().into_iter().enumerate() {
        let t = t_idx as f64 * hours_per_step;
        let center = spec.center_depth(t, shallow, deep).clamp(z_min, z_max);

        let center_idx = ((center / dz) as usize).min(nz - 1);
        let start = center_idx.saturating_sub(half_layer);
        let end = (center_idx + half_layer).min(nz);

        if end > start {
            let weight = 1.0 / (end - start) as f64;
            row.slice_mut(ndarray::s![start..end]).fill(weight);
        } else {
            row[center_idx] = 1.0;
        }
    }

    intensity
}

/// Weighted sum of patterns with weights normalized to one
///
/// All-zero weights fall back to equal weights.
pub fn combine_dvm(patterns: &[Array2<f64>], weights: &[f64]) -> Result<Array2<f64>> {
    let Some(first) = patterns.first() else {
        return Err(SimulationError::InvalidConfiguration("No patterns to combine".to_string()));
    };
    if weights.len() != patterns.len() {
        return Err(SimulationError::InvalidConfiguration(format!(
            "{} weights for {} patterns",
            weights.len(),
            patterns.len()
        )));
    }
    if let Some(pattern) = patterns.iter().find(|p| p.dim() != first.dim()) {
        return Err(SimulationError::InvalidConfiguration(format!(
            "Pattern shapes differ: {:?} vs {:?}",
            first.dim(),
            pattern.dim()
        )));
    }

    let total: f64 = weights.iter().sum();
    let normalized: Vec<f64> = if total == 0.0 {
        warn!("all pattern weights are zero, combining with equal weights");
        vec![1.0 / weights.len() as f64; weights.len()]
    } else {
        weights.iter().map(|w| w / total).collect()
    };

    let mut combined = Array2::zeros(first.dim());
    for (pattern, weight) in patterns.iter().zip(normalized) {
        combined.scaled_add(weight, pattern);
    }
    Ok(combined)
}

/// Depth of the maximum of every row (first one on ties)
pub fn center_depth_trajectory(pattern: &Array2<f64>, grid: &DepthGrid) -> Vec<f64> {
    pattern
        .rows()
        .into_iter()
        .map(|row| {
            let (index, _) = row
                .iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
            grid.depths().get(index).copied().unwrap_or(0.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn coarse_grid() -> DepthGrid {
        DepthGrid::new(600.0, 10.0).unwrap()
    }

    #[test]
    fn test_rows_sum_to_one() {
        let pattern = dvm(&coarse_grid(), 240, &DvmSpec::new(100.0, 500.0, 18.0, 6.0, 100.0));
        assert_eq!(pattern.dim(), (240, 61));
        for row in pattern.rows() {
            assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_night_shallow_day_deep() {
        let grid = coarse_grid();
        // Descends 6-9 h, ascends 18-21 h: deep during the day
        let pattern = dvm(&grid, 24, &DvmSpec::new(100.0, 500.0, 18.0, 6.0, 100.0));
        let centers = center_depth_trajectory(&pattern, &grid);

        // Layer of 10 cells centred on cell 10 starts at cell 5
        assert_eq!(centers[0], 50.0);
        assert_eq!(centers[12], 450.0);
        assert_eq!(centers[23], 50.0);
        // Halfway through the descent (7.5 h is not on the hourly grid; 8 h is 2/3 of the way)
        assert!(centers[8] > 50.0 && centers[8] < 450.0);
    }

    #[test]
    fn test_reverse_migration() {
        let grid = coarse_grid();
        // Ascends 6-9 h, descends 18-21 h: shallow during the day
        let spec = DvmSpec::new(100.0, 500.0, 6.0, 18.0, 100.0);
        assert_eq!(spec.center_depth(3.0, 100.0, 500.0), 500.0);
        assert_eq!(spec.center_depth(12.0, 100.0, 500.0), 100.0);
        assert_eq!(spec.center_depth(22.0, 100.0, 500.0), 500.0);
        assert_eq!(spec.center_depth(7.5, 100.0, 500.0), 300.0);

        let pattern = dvm(&grid, 24, &spec);
        assert_eq!(pattern.dim(), (24, 61));
    }

    #[test]
    fn test_thin_layer_occupies_one_cell() {
        let grid = coarse_grid();
        let pattern = dvm(&grid, 4, &DvmSpec::new(100.0, 500.0, 18.0, 6.0, 1.0));
        assert_eq!(pattern[[0, 10]], 1.0);
        assert_eq!(pattern.row(0).sum(), 1.0);
    }

    #[test]
    fn test_depths_clipped_to_grid() {
        let grid = coarse_grid();
        let pattern = dvm(&grid, 24, &DvmSpec::new(-50.0, 5000.0, 18.0, 6.0, 40.0));
        let centers = center_depth_trajectory(&pattern, &grid);
        assert_eq!(centers[0], 0.0);
        // Bottom layer is cut by the grid end: cells 58..61
        assert_eq!(centers[12], 580.0);
        assert_relative_eq!(pattern.row(12).sum(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_combine_normalizes_weights() {
        let grid = coarse_grid();
        let a = dvm(&grid, 24, &DvmSpec::new(100.0, 500.0, 18.0, 6.0, 100.0));
        let b = dvm(&grid, 24, &DvmSpec::new(100.0, 500.0, 6.0, 18.0, 100.0));

        let combined = combine_dvm(&[a.clone(), b.clone()], &[0.7, 0.3]).unwrap();
        let expected = &a * 0.7 + &b * 0.3;
        assert!(combined.iter().zip(expected.iter()).all(|(x, y)| (x - y).abs() < 1e-12));

        let scaled = combine_dvm(&[a.clone(), b.clone()], &[7.0, 3.0]).unwrap();
        assert!(combined.iter().zip(scaled.iter()).all(|(x, y)| (x - y).abs() < 1e-12));

        let equal = combine_dvm(&[a.clone(), b.clone()], &[0.0, 0.0]).unwrap();
        let half = (&a + &b) * 0.5;
        assert!(equal.iter().zip(half.iter()).all(|(x, y)| (x - y).abs() < 1e-12));
    }

    #[test]
    fn test_combine_rejects_mismatch() {
        let grid = coarse_grid();
        let a = dvm(&grid, 24, &DvmSpec::new(100.0, 500.0, 18.0, 6.0, 100.0));
        let b = dvm(&grid, 12, &DvmSpec::new(100.0, 500.0, 18.0, 6.0, 100.0));
        assert!(combine_dvm(&[a.clone(), b], &[0.5, 0.5]).is_err());
        assert!(combine_dvm(&[a], &[0.5, 0.5]).is_err());
        assert!(combine_dvm(&[], &[]).is_err());
    }
}
