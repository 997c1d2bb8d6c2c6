//! Depth grid and run length of an eDNA simulation

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::solver::SolverConfiguration;

/// Seconds in a day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Uniform depth grid z = 0, dz, 2dz, ..., z_max (depth positive downward)
#[derive(Debug, Clone, PartialEq)]
pub struct DepthGrid {
    dz: f64,
    depths: Vec<f64>,
}

impl DepthGrid {
    pub fn new(z_max: f64, dz: f64) -> Result<Self> {
        if !(dz > 0.0 && dz.is_finite()) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "Depth resolution must be positive, got {}",
                dz
            )));
        }
        if !(z_max > 0.0 && z_max.is_finite()) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "Maximum depth must be positive, got {}",
                z_max
            )));
        }

        let intervals = (z_max / dz + 1e-9).floor() as usize;
        let depths = (0..=intervals).map(|i| i as f64 * dz).collect();
        Ok(Self { dz, depths })
    }

    pub fn dz(&self) -> f64 {
        self.dz
    }

    pub fn depths(&self) -> &[f64] {
        &self.depths
    }

    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    pub fn z_max(&self) -> f64 {
        self.depths.last().copied().unwrap_or(0.0)
    }

    /// Cell containing `depth` (clamped to the grid)
    pub fn index_of(&self, depth: f64) -> usize {
        let index = (depth.max(0.0) / self.dz + 1e-9).floor() as usize;
        index.min(self.len().saturating_sub(1))
    }

    /// Column integral Σ cᵢ·dz
    pub fn integrate(&self, values: &[f64]) -> f64 {
        values.iter().sum::<f64>() * self.dz
    }
}

/// Grid plus time stepping of a multi-day run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSetup {
    pub days: f64,
    pub z_max: f64,
    pub dz: f64,
    /// Time step in seconds
    pub dt: f64,
}

impl Default for SimulationSetup {
    fn default() -> Self {
        Self {
            days: 4.0,
            z_max: 1500.0,
            dz: 0.5,
            dt: 10.0,
        }
    }
}

impl SimulationSetup {
    pub fn new(days: f64, z_max: f64, dz: f64) -> Self {
        Self {
            days,
            z_max,
            dz,
            ..Default::default()
        }
    }

    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    pub fn grid(&self) -> Result<DepthGrid> {
        DepthGrid::new(self.z_max, self.dz)
    }

    pub fn total_time(&self) -> f64 {
        self.days * SECONDS_PER_DAY
    }

    pub fn total_steps(&self) -> usize {
        (self.total_time() / self.dt + 1e-9).floor() as usize
    }

    /// Rows of a one-day migration pattern sampled at the solver step
    pub fn steps_per_day(&self) -> usize {
        (SECONDS_PER_DAY / self.dt + 1e-9).floor() as usize
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.days > 0.0 && self.dt > 0.0) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "Run length and time step must be positive, got {} days with dt = {}",
                self.days, self.dt
            )));
        }
        if self.dt > SECONDS_PER_DAY {
            return Err(SimulationError::InvalidConfiguration(format!(
                "Time step {} s exceeds one day",
                self.dt
            )));
        }
        self.grid().map(|_| ())
    }

    /// Fixed-step configuration covering the whole run
    pub fn solver_configuration(&self) -> SolverConfiguration {
        SolverConfiguration::time_evolution(self.total_steps() as f64 * self.dt, self.total_steps())
    }
}
