//! Independent replicates of a stochastic simulation and their statistics
//!
//! Replicate `i` uses the seed `seed + i`, so an ensemble is reproducible
//! whether or not it runs in parallel.

use rand::SeedableRng;
use rand::rngs::StdRng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::gillespie::{ReactionNetwork, Trajectory, gillespie};
use crate::error::{Result, SimulationError};

/// Per-species mean and population standard deviation on a time grid
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleStatistics {
    pub times: Vec<f64>,
    /// `mean[species][point]`
    pub mean: Vec<Vec<f64>>,
    pub std: Vec<Vec<f64>>,
    pub runs: usize,
}

/// Averages over the second half of the time grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LateTimeSummary {
    pub mean: f64,
    pub std: f64,
}

fn replicate<N: ReactionNetwork + ?Sized>(network: &N, u0: &[i64], t_end: f64, seed: u64, run: usize) -> Result<Trajectory> {
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(run as u64));
    gillespie(network, u0, 0.0, t_end, &mut rng)
}

fn map_runs<T, F>(runs: usize, f: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(usize) -> Result<T> + Send + Sync,
{
    #[cfg(feature = "parallel")]
    {
        (0..runs).into_par_iter().map(f).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..runs).map(f).collect()
    }
}

/// `runs` independent trajectories from `u0` over `[0, t_end)`
pub fn run_ensemble<N: ReactionNetwork>(network: &N, u0: &[i64], t_end: f64, runs: usize, seed: u64) -> Result<Vec<Trajectory>> {
    map_runs(runs, |run| replicate(network, u0, t_end, seed, run))
}

/// Uniform grid of `num_points` times over `[0, end]`
pub fn sample_times(end: f64, num_points: usize) -> Vec<f64> {
    match num_points {
        0 => Vec::new(),
        1 => vec![0.0],
        n => (0..n).map(|i| end * i as f64 / (n - 1) as f64).collect(),
    }
}

/// Samples of every species at `times`, as `[species][point]`
fn sample(trajectory: &Trajectory, times: &[f64]) -> Vec<Vec<f64>> {
    let mut samples = vec![Vec::with_capacity(times.len()); trajectory.species()];
    for &t in times {
        if let Some(state) = trajectory.state_at(t) {
            for (series, &count) in samples.iter_mut().zip(state) {
                series.push(count as f64);
            }
        }
    }
    samples
}

fn statistics(samples: &[Vec<Vec<f64>>], times: Vec<f64>, species: usize) -> EnsembleStatistics {
    let runs = samples.len();
    let points = times.len();
    let mut mean = vec![vec![0.0; points]; species];
    let mut std = vec![vec![0.0; points]; species];

    for s in 0..species {
        for p in 0..points {
            let values = samples.iter().map(|run| run[s][p]);
            let m = values.clone().sum::<f64>() / runs as f64;
            let variance = values.map(|v| (v - m).powi(2)).sum::<f64>() / runs as f64;
            mean[s][p] = m;
            std[s][p] = variance.sqrt();
        }
    }

    EnsembleStatistics { times, mean, std, runs }
}

/// Mean and standard deviation on a uniform grid over `[0, longest end time]`
///
/// Each trajectory is read as a step function; after its last event it
/// keeps its final state.
pub fn sample_and_average(trajectories: &[Trajectory], num_points: usize) -> Result<EnsembleStatistics> {
    let Some(first) = trajectories.first() else {
        return Err(SimulationError::InvalidScenario("No trajectories to average".to_string()));
    };
    if trajectories.iter().any(|t| t.is_empty() || t.species() != first.species()) {
        return Err(SimulationError::InvalidScenario(
            "Trajectories must be non-empty and share their species".to_string(),
        ));
    }

    let end = trajectories.iter().map(Trajectory::end_time).fold(0.0, f64::max);
    let times = sample_times(end, num_points);
    let samples: Vec<_> = trajectories.iter().map(|t| sample(t, &times)).collect();
    Ok(statistics(&samples, times, first.species()))
}

/// Run an ensemble and keep only its samples on `[0, t_end]`
///
/// Each trajectory is sampled as soon as it is generated and then dropped,
/// which keeps memory flat for networks with millions of events.
pub fn run_sampled_ensemble<N: ReactionNetwork>(
    network: &N,
    u0: &[i64],
    t_end: f64,
    runs: usize,
    seed: u64,
    num_points: usize,
) -> Result<EnsembleStatistics> {
    if runs == 0 {
        return Err(SimulationError::InvalidConfiguration("Ensemble needs at least one run".to_string()));
    }
    let times = sample_times(t_end, num_points);
    let samples = map_runs(runs, |run| {
        replicate(network, u0, t_end, seed, run).map(|trajectory| sample(&trajectory, &times))
    })?;
    Ok(statistics(&samples, times, network.species()))
}

/// Mean of the mean and of the standard deviation over the second half of the grid
pub fn late_time_summary(statistics: &EnsembleStatistics) -> Vec<LateTimeSummary> {
    let half = statistics.times.len() / 2;
    statistics
        .mean
        .iter()
        .zip(statistics.std.iter())
        .map(|(mean, std)| {
            let late = (mean.len() - half).max(1) as f64;
            LateTimeSummary {
                mean: mean[half..].iter().sum::<f64>() / late,
                std: std[half..].iter().sum::<f64>() / late,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stochastic::ToggleSwitch;
    use approx::assert_relative_eq;

    fn step(times: &[f64], counts: &[i64]) -> Trajectory {
        let mut trajectory = Trajectory::new(1);
        for (&t, &n) in times.iter().zip(counts) {
            trajectory.push(t, &[n]);
        }
        trajectory
    }

    #[test]
    fn test_sample_times() {
        assert_eq!(sample_times(2.0, 5), vec![0.0, 0.5, 1.0, 1.5, 2.0]);
        assert_eq!(sample_times(2.0, 1), vec![0.0]);
        assert!(sample_times(2.0, 0).is_empty());
    }

    #[test]
    fn test_sample_and_average() {
        let a = step(&[0.0, 1.0, 2.0], &[0, 2, 4]);
        let b = step(&[0.0, 0.5], &[2, 0]);
        let stats = sample_and_average(&[a, b], 3).unwrap();

        assert_eq!(stats.times, vec![0.0, 1.0, 2.0]);
        // t = 0: (0, 2), t = 1: (2, 0), t = 2: (4, 0)
        assert_eq!(stats.mean[0], vec![1.0, 1.0, 2.0]);
        assert_eq!(stats.std[0], vec![1.0, 1.0, 2.0]);
        assert_eq!(stats.runs, 2);

        let summary = late_time_summary(&stats);
        assert_relative_eq!(summary[0].mean, 1.5);
        assert_relative_eq!(summary[0].std, 1.5);
    }

    #[test]
    fn test_sample_and_average_rejects_empty() {
        assert!(sample_and_average(&[], 10).is_err());
        assert!(sample_and_average(&[Trajectory::new(1)], 10).is_err());
    }

    #[test]
    fn test_ensemble_is_reproducible() {
        let switch = ToggleSwitch::new(50.0);
        let first = run_ensemble(&switch, &[5, 0], 2.0, 8, 42).unwrap();
        let second = run_ensemble(&switch, &[5, 0], 2.0, 8, 42).unwrap();
        assert_eq!(first, second);
        assert_ne!(first[0], first[1]);
    }

    #[test]
    fn test_sampled_ensemble_matches_full_ensemble() {
        let switch = ToggleSwitch::new(5.0);
        let full = run_ensemble(&switch, &[5, 0], 3.0, 6, 11).unwrap();
        let times = sample_times(3.0, 7);
        let sampled = run_sampled_ensemble(&switch, &[5, 0], 3.0, 6, 11, 7).unwrap();

        for (p, &t) in times.iter().enumerate() {
            let mean = full.iter().map(|tr| tr.state_at(t).unwrap()[0] as f64).sum::<f64>() / 6.0;
            assert_relative_eq!(sampled.mean[0][p], mean, epsilon = 1e-12);
        }
    }
}
