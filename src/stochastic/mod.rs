//! Stochastic chemical kinetics
//!
//! Exact trajectories of small reaction networks with the Gillespie
//! direct method, and ensembles of independent replicates.

pub mod ensemble;
pub mod gillespie;

pub use ensemble::{
    EnsembleStatistics, LateTimeSummary, late_time_summary, run_ensemble, run_sampled_ensemble, sample_and_average,
    sample_times,
};
pub use gillespie::{ReactionNetwork, ToggleSwitch, Trajectory, gillespie};
