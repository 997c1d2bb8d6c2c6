//! Gillespie stochastic simulation algorithm (direct method)
//!
//! For a well-mixed system with integer copy numbers, each reaction j fires
//! with propensity aⱼ(u). The direct method draws
//!
//! ```text
//! τ ~ Exp(a₀),  a₀ = Σⱼ aⱼ(u)        time to the next event
//! j  with probability aⱼ/a₀           which reaction fires
//! ```
//!
//! and applies the stoichiometry of reaction j. The run stops once the time
//! reaches `t_end` (the event that crosses it is kept) or when no reaction
//! can fire any more.

use rand::Rng;
use rand_distr::Exp;

use crate::error::{Result, SimulationError};

/// A set of reactions acting on integer species counts
pub trait ReactionNetwork: Send + Sync {
    /// Number of species
    fn species(&self) -> usize;

    /// Propensity of every reaction at `state`, written into `out`
    fn propensities(&self, state: &[i64], out: &mut [f64]);

    /// Change of every species when each reaction fires (reactions × species)
    fn stoichiometry(&self) -> Vec<Vec<i64>>;

    fn name(&self) -> String {
        "Reaction network".to_string()
    }
}

/// Event times and the state right after each event
///
/// States are stored flat, `species` values per event.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub times: Vec<f64>,
    states: Vec<i64>,
    species: usize,
}

impl Trajectory {
    pub fn new(species: usize) -> Self {
        Self {
            times: Vec::new(),
            states: Vec::new(),
            species,
        }
    }

    pub fn push(&mut self, time: f64, state: &[i64]) {
        self.times.push(time);
        self.states.extend_from_slice(state);
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn species(&self) -> usize {
        self.species
    }

    pub fn state(&self, index: usize) -> &[i64] {
        &self.states[index * self.species..(index + 1) * self.species]
    }

    pub fn end_time(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }

    pub fn final_state(&self) -> Option<&[i64]> {
        (!self.is_empty()).then(|| self.state(self.len() - 1))
    }

    /// State in effect at time `t`: the last event at or before `t`
    ///
    /// Times before the first event map to the initial state.
    pub fn state_at(&self, t: f64) -> Option<&[i64]> {
        if self.is_empty() {
            return None;
        }
        let index = self.times.partition_point(|&time| time <= t).max(1) - 1;
        Some(self.state(index))
    }

    /// Time series of one species
    pub fn species_series(&self, species: usize) -> Vec<f64> {
        (0..self.len()).map(|i| self.state(i)[species] as f64).collect()
    }
}

/// Run the direct method from `u0` over `[t_start, t_end)`
pub fn gillespie<N, R>(network: &N, u0: &[i64], t_start: f64, t_end: f64, rng: &mut R) -> Result<Trajectory>
where
    N: ReactionNetwork + ?Sized,
    R: Rng,
{
    if u0.len() != network.species() {
        return Err(SimulationError::InvalidScenario(format!(
            "Initial state has {} species, network '{}' has {}",
            u0.len(),
            network.name(),
            network.species()
        )));
    }
    if t_end < t_start {
        return Err(SimulationError::InvalidConfiguration(format!(
            "End time {} is before start time {}",
            t_end, t_start
        )));
    }

    let stoichiometry = network.stoichiometry();
    if let Some(row) = stoichiometry.iter().find(|row| row.len() != u0.len()) {
        return Err(SimulationError::InvalidScenario(format!(
            "Stoichiometry row has {} entries for {} species",
            row.len(),
            u0.len()
        )));
    }

    let waiting = Exp::new(1.0).map_err(|e| SimulationError::InvalidConfiguration(e.to_string()))?;
    let mut propensities = vec![0.0; stoichiometry.len()];
    let mut state = u0.to_vec();
    let mut t = t_start;

    let mut trajectory = Trajectory::new(u0.len());
    trajectory.push(t, &state);

    while t < t_end {
        network.propensities(&state, &mut propensities);
        let total: f64 = propensities.iter().sum();
        if !(total > 0.0) {
            break;
        }

        let tau: f64 = rng.sample(waiting) / total;

        let threshold = rng.random::<f64>() * total;
        let mut cumulative = 0.0;
        let mut reaction = propensities.len() - 1;
        for (j, a) in propensities.iter().enumerate() {
            cumulative += a;
            if threshold < cumulative {
                reaction = j;
                break;
            }
        }

        for (count, change) in state.iter_mut().zip(stoichiometry[reaction].iter()) {
            *count += change;
        }
        t += tau;
        trajectory.push(t, &state);
    }

    Ok(trajectory)
}

/// Mutually repressing genes
///
/// ```text
/// ∅ -> P1   a₁ = α / (1 + N₂^β)
/// ∅ -> P2   a₂ = α / (1 + N₁^β)
/// P1 -> ∅   a₃ = δ·N₁
/// P2 -> ∅   a₄ = δ·N₂
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToggleSwitch {
    pub alpha: f64,
    pub beta: f64,
    pub delta: f64,
}

impl ToggleSwitch {
    /// Toggle switch with Hill coefficient 4 and unit degradation
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            beta: 4.0,
            delta: 1.0,
        }
    }
}

impl ReactionNetwork for ToggleSwitch {
    fn species(&self) -> usize {
        2
    }

    fn propensities(&self, state: &[i64], out: &mut [f64]) {
        let (n1, n2) = (state[0] as f64, state[1] as f64);
        out[0] = self.alpha / (1.0 + n2.powf(self.beta));
        out[1] = self.alpha / (1.0 + n1.powf(self.beta));
        out[2] = self.delta * n1;
        out[3] = self.delta * n2;
    }

    fn stoichiometry(&self) -> Vec<Vec<i64>> {
        vec![vec![1, 0], vec![0, 1], vec![-1, 0], vec![0, -1]]
    }

    fn name(&self) -> String {
        format!("Toggle switch (alpha = {})", self.alpha)
    }
}
