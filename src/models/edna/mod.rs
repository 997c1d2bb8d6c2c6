//! Environmental DNA in the water column
//!
//! Organisms shed eDNA where they are, and they do not stay put: many
//! zooplankton populations perform diel vertical migration between a
//! shallow night layer and a deep day layer. The models here follow the
//! shed material as it is advected, mixed, settled, broken down and decayed.
//!
//! - [`grid`]: depth grid and run length
//! - [`profiles`]: diffusivity, advection and decay profiles
//! - [`migration`]: one-day DVM source patterns
//! - [`transport`]: the [`EdnaTransport`] model
//! - [`predation`]: [`PredatorTransport`], eDNA eaten and released by predators
//! - [`decomposition`]: recovering DVM modes from an observed distribution

pub mod decomposition;
pub mod grid;
pub mod migration;
pub mod predation;
pub mod profiles;
pub mod transport;

pub use decomposition::{Decomposition, DecompositionOptions, FitMetrics, eval_model_fit, fit_migration_model};
pub use grid::{DepthGrid, SimulationSetup};
pub use migration::{DvmSpec, center_depth_trajectory, combine_dvm, dvm};
pub use predation::{PredationParameters, PredatorTransport, Stomach};
pub use profiles::{AdvectionDirection, DecayProfile, Season, decay_rate_from_temp, kappa_profile, vertical_advection_profile};
pub use transport::{EdnaTransport, MassBudget, TransportParameters, total_concentration};
