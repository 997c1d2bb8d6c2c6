//! JSON run configurations
//!
//! Every field has a default, so a configuration file only needs to name
//! what it changes:
//!
//! ```json
//! {
//!   "setup": { "days": 2, "z_max": 600, "dz": 2 },
//!   "transport": { "season": "winter" },
//!   "prey": [
//!     { "shallow_depth": 100, "deep_depth": 500, "up_start": 18, "up_end": 21,
//!       "down_start": 6, "down_end": 9, "weight": 1 }
//!   ]
//! }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::debug;
use ndarray::Array2;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::models::edna::{
    DecayProfile, DepthGrid, DvmSpec, EdnaTransport, PredationParameters, PredatorTransport, SimulationSetup,
    TransportParameters, combine_dvm, dvm,
};

/// Read a JSON file into any deserializable configuration
pub fn load_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let value = serde_json::from_reader(BufReader::new(file))?;
    debug!("loaded configuration from {}", path.display());
    Ok(value)
}

fn unit_weight() -> f64 {
    1.0
}

/// A migrating population and its share of the total source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedDvm {
    #[serde(flatten)]
    pub spec: DvmSpec,
    #[serde(default = "unit_weight")]
    pub weight: f64,
}

/// Predators following their own migration pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredatorConfig {
    pub patterns: Vec<WeightedDvm>,
    #[serde(default)]
    pub parameters: PredationParameters,
}

/// Everything needed to build an eDNA transport run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdnaRunConfig {
    pub setup: SimulationSetup,
    pub transport: TransportParameters,
    /// Rows per day of the source patterns
    pub pattern_rows: usize,
    pub prey: Vec<WeightedDvm>,
    pub predator: Option<PredatorConfig>,
    /// Depth-resolved decay table; the uniform rate is used when absent
    pub decay_csv: Option<PathBuf>,
}

impl Default for EdnaRunConfig {
    fn default() -> Self {
        Self {
            setup: SimulationSetup::default(),
            transport: TransportParameters::default(),
            pattern_rows: 288,
            prey: vec![
                WeightedDvm {
                    spec: DvmSpec::new(100.0, 500.0, 18.0, 6.0, 20.0),
                    weight: 0.5,
                },
                WeightedDvm {
                    spec: DvmSpec::new(100.0, 500.0, 6.0, 18.0, 20.0),
                    weight: 0.5,
                },
            ],
            predator: None,
            decay_csv: None,
        }
    }
}

impl EdnaRunConfig {
    /// Load from JSON; a relative `decay_csv` is taken relative to the file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config: Self = load_json(path)?;
        if let (Some(csv), Some(dir)) = (&config.decay_csv, path.parent()) {
            if csv.is_relative() {
                config.decay_csv = Some(dir.join(csv));
            }
        }
        Ok(config)
    }

    pub fn grid(&self) -> Result<DepthGrid> {
        self.setup.grid()
    }

    fn combined(&self, patterns: &[WeightedDvm], grid: &DepthGrid) -> Result<Array2<f64>> {
        if patterns.is_empty() {
            return Err(SimulationError::InvalidConfiguration(
                "At least one migration pattern is needed".to_string(),
            ));
        }
        let individual: Vec<_> = patterns.iter().map(|p| dvm(grid, self.pattern_rows, &p.spec)).collect();
        let weights: Vec<_> = patterns.iter().map(|p| p.weight).collect();
        combine_dvm(&individual, &weights)
    }

    /// Combined prey pattern (`pattern_rows × grid`)
    pub fn source_pattern(&self, grid: &DepthGrid) -> Result<Array2<f64>> {
        self.combined(&self.prey, grid)
    }

    pub fn decay_profile(&self) -> Result<Option<DecayProfile>> {
        self.decay_csv
            .as_ref()
            .map(|path| DecayProfile::from_csv(path, self.transport.season))
            .transpose()
    }

    pub fn build_transport(&self) -> Result<EdnaTransport> {
        self.setup.validate()?;
        if self.pattern_rows == 0 {
            return Err(SimulationError::InvalidConfiguration("pattern_rows must be positive".to_string()));
        }
        let grid = self.grid()?;
        let source = self.source_pattern(&grid)?;
        let decay = self.decay_profile()?;
        EdnaTransport::new(grid, source, self.transport.clone(), decay.as_ref())
    }

    /// Transport with predators, or `None` when no predator is configured
    pub fn build_predator_transport(&self) -> Result<Option<PredatorTransport>> {
        let Some(predator) = &self.predator else {
            return Ok(None);
        };
        let transport = self.build_transport()?;
        let pattern = self.combined(&predator.patterns, transport.grid())?;
        PredatorTransport::new(transport, pattern, predator.parameters).map(Some)
    }
}

/// Alpha sweep of the stochastic toggle switch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToggleSwitchConfig {
    pub alphas: Vec<f64>,
    pub beta: f64,
    pub delta: f64,
    pub u0: [i64; 2],
    pub t_end: f64,
    pub runs: usize,
    pub num_points: usize,
    pub seed: u64,
}

impl Default for ToggleSwitchConfig {
    fn default() -> Self {
        Self {
            alphas: vec![5.0, 50.0, 500.0, 5000.0],
            beta: 4.0,
            delta: 1.0,
            u0: [5, 0],
            t_end: 20.0,
            runs: 100,
            num_points: 100,
            seed: 42,
        }
    }
}
