//! Physical profiles of the water column
//!
//! - Vertical diffusivity with a tanh mixed layer
//! - Piecewise linear vertical advection
//! - Temperature-dependent eDNA decay, optionally read from a CSV table
//!
//! Units: depth in m, diffusivity in m²/s, velocity in m/s (positive
//! downward), decay rates in h⁻¹ when read and s⁻¹ once placed on a grid.

use std::path::Path;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use super::grid::DepthGrid;
use crate::error::{Result, SimulationError};

/// Diffusivity inside the surface mixed layer (m²/s)
pub const KAPPA_SURFACE: f64 = 1e-3;

/// Diffusivity below the mixed layer (m²/s)
pub const KAPPA_DEEP: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Summer,
    Spring,
    Fall,
    Winter,
}

impl Season {
    /// Mixed-layer depth in m
    pub fn mixed_layer_depth(&self) -> f64 {
        match self {
            Season::Summer => 30.0,
            Season::Spring => 70.0,
            Season::Fall => 90.0,
            Season::Winter => 140.0,
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Season::Summer => write!(f, "Summer"),
            Season::Spring => write!(f, "Spring"),
            Season::Fall => write!(f, "Fall"),
            Season::Winter => write!(f, "Winter"),
        }
    }
}

/// κ(z) = κ_deep + (κ_surface - κ_deep)·½·(1 - tanh((z - h)/L))
pub fn kappa_profile(depths: &[f64], season: Season, l_scale: f64) -> DVector<f64> {
    let h = season.mixed_layer_depth();
    DVector::from_iterator(
        depths.len(),
        depths
            .iter()
            .map(|&z| KAPPA_DEEP + (KAPPA_SURFACE - KAPPA_DEEP) * 0.5 * (1.0 - ((z - h) / l_scale).tanh())),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvectionDirection {
    Up,
    Down,
}

/// Vertical velocity rising linearly to `w_max` at 200 m and back to 0 at 400 m
///
/// The sign follows `direction` (downward positive); the magnitude of
/// `w_max` is used.
pub fn vertical_advection_profile(depths: &[f64], w_max: f64, direction: AdvectionDirection) -> DVector<f64> {
    let peak = match direction {
        AdvectionDirection::Down => w_max.abs(),
        AdvectionDirection::Up => -w_max.abs(),
    };
    DVector::from_iterator(
        depths.len(),
        depths.iter().map(|&z| {
            if (0.0..=200.0).contains(&z) {
                peak * z / 200.0
            } else if z > 200.0 && z <= 400.0 {
                peak - (z - 200.0) * peak / 200.0
            } else {
                0.0
            }
        }),
    )
}

/// Decay rate in h⁻¹ at temperature `temperature` (°C)
pub fn decay_rate_from_temp(temperature: f64) -> f64 {
    0.05 + 0.0014 * temperature
}

#[derive(Debug, Deserialize)]
struct DecayRow {
    #[serde(rename = "Depth")]
    depth: f64,
    #[serde(rename = "Summer")]
    summer: f64,
    #[serde(rename = "Spring")]
    spring: f64,
    #[serde(rename = "Fall")]
    fall: f64,
    #[serde(rename = "Winter")]
    winter: f64,
}

impl DecayRow {
    fn rate(&self, season: Season) -> f64 {
        match season {
            Season::Summer => self.summer,
            Season::Spring => self.spring,
            Season::Fall => self.fall,
            Season::Winter => self.winter,
        }
    }
}

/// Decay rate (h⁻¹) tabulated against depth
#[derive(Debug, Clone, PartialEq)]
pub struct DecayProfile {
    depths: Vec<f64>,
    rates_per_hour: Vec<f64>,
}

impl DecayProfile {
    pub fn new(depths: Vec<f64>, rates_per_hour: Vec<f64>) -> Result<Self> {
        if depths.is_empty() || depths.len() != rates_per_hour.len() {
            return Err(SimulationError::InvalidConfiguration(format!(
                "Decay table needs matching, non-empty columns (got {} depths, {} rates)",
                depths.len(),
                rates_per_hour.len()
            )));
        }
        if depths.windows(2).any(|w| w[1] <= w[0]) {
            return Err(SimulationError::InvalidConfiguration(
                "Decay table depths must be strictly increasing".to_string(),
            ));
        }
        if let Some(rate) = rates_per_hour.iter().find(|r| !(r.is_finite() && **r >= 0.0)) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "Decay rates must be finite and non-negative, got {}",
                rate
            )));
        }
        Ok(Self {
            depths,
            rates_per_hour,
        })
    }

    /// Same rate everywhere
    pub fn uniform(rate_per_hour: f64) -> Result<Self> {
        Self::new(vec![0.0], vec![rate_per_hour])
    }

    /// Rates from a temperature profile through [`decay_rate_from_temp`]
    pub fn from_temperatures(depths: Vec<f64>, temperatures: &[f64]) -> Result<Self> {
        let rates = temperatures.iter().map(|&t| decay_rate_from_temp(t)).collect();
        Self::new(depths, rates)
    }

    /// Read a `Depth,Summer,Spring,Fall,Winter` table and keep one season
    pub fn from_csv<P: AsRef<Path>>(path: P, season: Season) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut depths = Vec::new();
        let mut rates = Vec::new();
        for row in reader.deserialize() {
            let row: DecayRow = row?;
            depths.push(row.depth);
            rates.push(row.rate(season));
        }
        Self::new(depths, rates)
    }

    /// Linear interpolation in h⁻¹, constant beyond the table ends
    pub fn rate_per_hour_at(&self, depth: f64) -> f64 {
        let n = self.depths.len();
        if depth <= self.depths[0] {
            return self.rates_per_hour[0];
        }
        if depth >= self.depths[n - 1] {
            return self.rates_per_hour[n - 1];
        }
        let upper = self.depths.partition_point(|&d| d < depth);
        let (z0, z1) = (self.depths[upper - 1], self.depths[upper]);
        let (r0, r1) = (self.rates_per_hour[upper - 1], self.rates_per_hour[upper]);
        r0 + (r1 - r0) * (depth - z0) / (z1 - z0)
    }

    /// Rates on the grid cells, converted to s⁻¹
    pub fn on_grid(&self, grid: &DepthGrid) -> DVector<f64> {
        DVector::from_iterator(
            grid.len(),
            grid.depths().iter().map(|&z| self.rate_per_hour_at(z) / 3600.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    #[test]
    fn test_kappa_limits() {
        let kappa = kappa_profile(&[0.0, 30.0, 500.0], Season::Summer, 2.0);
        assert_relative_eq!(kappa[0], KAPPA_SURFACE, epsilon = 1e-9);
        assert_relative_eq!(kappa[1], 0.5 * (KAPPA_SURFACE + KAPPA_DEEP), epsilon = 1e-15);
        assert_relative_eq!(kappa[2], KAPPA_DEEP, epsilon = 1e-15);
    }

    #[test]
    fn test_winter_mixes_deeper() {
        let summer = kappa_profile(&[100.0], Season::Summer, 2.0);
        let winter = kappa_profile(&[100.0], Season::Winter, 2.0);
        assert!(winter[0] > 50.0 * summer[0]);
    }

    #[test]
    fn test_advection_shape() {
        let w = vertical_advection_profile(&[0.0, 100.0, 200.0, 300.0, 400.0, 600.0], 1e-4, AdvectionDirection::Down);
        assert_relative_eq!(w[1], 5e-5, epsilon = 1e-18);
        assert_relative_eq!(w[2], 1e-4, epsilon = 1e-18);
        assert_relative_eq!(w[3], 5e-5, epsilon = 1e-18);
        assert_eq!(w[4], 0.0);
        assert_eq!(w[5], 0.0);

        let up = vertical_advection_profile(&[200.0], 1e-4, AdvectionDirection::Up);
        assert_relative_eq!(up[0], -1e-4, epsilon = 1e-18);
    }

    #[test]
    fn test_decay_from_temperature() {
        assert_relative_eq!(decay_rate_from_temp(0.0), 0.05);
        assert_relative_eq!(decay_rate_from_temp(20.0), 0.078, epsilon = 1e-12);
    }

    #[test]
    fn test_interpolation() {
        let profile = DecayProfile::new(vec![0.0, 100.0], vec![0.1, 0.2]).unwrap();
        assert_relative_eq!(profile.rate_per_hour_at(-10.0), 0.1);
        assert_relative_eq!(profile.rate_per_hour_at(25.0), 0.125, epsilon = 1e-12);
        assert_relative_eq!(profile.rate_per_hour_at(500.0), 0.2);

        let grid = DepthGrid::new(100.0, 50.0).unwrap();
        let on_grid = profile.on_grid(&grid);
        assert_relative_eq!(on_grid[1], 0.15 / 3600.0, epsilon = 1e-15);
    }

    #[test]
    fn test_invalid_tables() {
        assert!(DecayProfile::new(vec![], vec![]).is_err());
        assert!(DecayProfile::new(vec![0.0, 0.0], vec![0.1, 0.1]).is_err());
        assert!(DecayProfile::new(vec![0.0], vec![-1.0]).is_err());
    }

    #[test]
    fn test_from_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Depth,Summer,Spring,Fall,Winter").unwrap();
        writeln!(file, "0,0.085,0.07,0.075,0.06").unwrap();
        writeln!(file, "1000,0.056,0.056,0.056,0.056").unwrap();
        file.flush().unwrap();

        let summer = DecayProfile::from_csv(file.path(), Season::Summer).unwrap();
        assert_relative_eq!(summer.rate_per_hour_at(0.0), 0.085);
        assert_relative_eq!(summer.rate_per_hour_at(500.0), 0.0705, epsilon = 1e-12);

        let winter = DecayProfile::from_csv(file.path(), Season::Winter).unwrap();
        assert_relative_eq!(winter.rate_per_hour_at(0.0), 0.06);
    }

    #[test]
    fn test_season_serde() {
        let season: Season = serde_json::from_str("\"winter\"").unwrap();
        assert_eq!(season, Season::Winter);
        assert_eq!(season.to_string(), "Winter");
    }
}
