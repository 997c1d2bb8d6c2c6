//! Flux balance analysis
//!
//! A metabolic network is described by its stoichiometric matrix S
//! (metabolites × reactions) and flux bounds. At steady state the internal
//! metabolites neither accumulate nor deplete, so the feasible fluxes are
//!
//! ```text
//! S·v = 0,    lb ≤ v ≤ ub
//! ```
//!
//! and FBA picks the flux vector maximizing a linear objective cᵀv (usually
//! a biomass reaction). Flux variability analysis then asks how far each
//! individual flux can move while the objective stays near its optimum.

use std::collections::HashMap;

use log::debug;
use nalgebra::{DMatrix, DVector};

use crate::error::{Result, SimulationError};
use crate::optimize::{LinearProgram, LpError};

/// Default bound magnitude for reversible or unbounded reactions
pub const DEFAULT_FLUX_BOUND: f64 = 1000.0;

/// Outcome of an FBA run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FluxStatus {
    Optimal,
    Infeasible,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FluxSolution {
    pub objective_value: f64,
    pub fluxes: DVector<f64>,
    pub status: FluxStatus,
}

impl FluxSolution {
    fn infeasible(reactions: usize) -> Self {
        Self {
            objective_value: 0.0,
            fluxes: DVector::zeros(reactions),
            status: FluxStatus::Infeasible,
        }
    }
}

/// Range of a single flux over the near-optimal solution space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluxRange {
    pub minimum: f64,
    pub maximum: f64,
}

#[derive(Debug, Clone, Default)]
pub struct MetabolicNetwork {
    metabolites: Vec<String>,
    reactions: Vec<String>,
    // Sparse columns: reaction -> (metabolite index, coefficient)
    columns: Vec<Vec<(usize, f64)>>,
    bounds: Vec<(f64, f64)>,
    objective: Vec<f64>,
}

impl MetabolicNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a metabolite, returning its row index (existing names are reused)
    pub fn add_metabolite(&mut self, name: &str) -> usize {
        match self.metabolite_index(name) {
            Some(index) => index,
            None => {
                self.metabolites.push(name.to_string());
                self.metabolites.len() - 1
            }
        }
    }

    /// Register a reaction from `(metabolite, coefficient)` pairs
    ///
    /// Negative coefficients are consumed, positive ones produced. Unknown
    /// metabolites are created on the fly.
    pub fn add_reaction(&mut self, name: &str, stoichiometry: &[(&str, f64)], lower: f64, upper: f64) -> Result<usize> {
        if self.reaction_index(name).is_some() {
            return Err(SimulationError::InvalidScenario(format!("Reaction '{}' already exists", name)));
        }
        if lower > upper {
            return Err(SimulationError::InvalidScenario(format!(
                "Reaction '{}' has lower bound {} above upper bound {}",
                name, lower, upper
            )));
        }

        let column = stoichiometry
            .iter()
            .map(|&(metabolite, coefficient)| (self.add_metabolite(metabolite), coefficient))
            .collect();

        self.reactions.push(name.to_string());
        self.columns.push(column);
        self.bounds.push((lower, upper));
        self.objective.push(0.0);
        Ok(self.reactions.len() - 1)
    }

    /// Make `reaction` the (sole) objective with coefficient 1
    pub fn set_objective(&mut self, reaction: &str) -> Result<()> {
        let index = self.require_reaction(reaction)?;
        self.objective.iter_mut().for_each(|c| *c = 0.0);
        self.objective[index] = 1.0;
        Ok(())
    }

    pub fn set_bounds(&mut self, reaction: &str, lower: f64, upper: f64) -> Result<()> {
        let index = self.require_reaction(reaction)?;
        self.bounds[index] = (lower, upper);
        Ok(())
    }

    pub fn metabolites(&self) -> &[String] {
        &self.metabolites
    }

    pub fn reactions(&self) -> &[String] {
        &self.reactions
    }

    pub fn bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    pub fn metabolite_index(&self, name: &str) -> Option<usize> {
        self.metabolites.iter().position(|m| m == name)
    }

    pub fn reaction_index(&self, name: &str) -> Option<usize> {
        self.reactions.iter().position(|r| r == name)
    }

    fn require_reaction(&self, name: &str) -> Result<usize> {
        self.reaction_index(name)
            .ok_or_else(|| SimulationError::InvalidScenario(format!("Unknown reaction '{}'", name)))
    }

    /// Dense stoichiometric matrix (metabolites × reactions)
    pub fn stoichiometric_matrix(&self) -> DMatrix<f64> {
        let mut s = DMatrix::zeros(self.metabolites.len(), self.reactions.len());
        for (j, column) in self.columns.iter().enumerate() {
            for &(i, coefficient) in column {
                s[(i, j)] += coefficient;
            }
        }
        s
    }

    /// ‖S·v‖∞
    pub fn mass_balance_residual(&self, fluxes: &DVector<f64>) -> f64 {
        (self.stoichiometric_matrix() * fluxes).amax()
    }

    fn linear_program(&self) -> LinearProgram {
        let m = self.metabolites.len();
        LinearProgram::maximize(DVector::from_vec(self.objective.clone()))
            .with_equalities(self.stoichiometric_matrix(), DVector::zeros(m))
            .with_bounds(self.bounds.clone())
    }

    /// Maximize the objective subject to S·v = 0 and the flux bounds
    pub fn optimize(&self) -> Result<FluxSolution> {
        if self.reactions.is_empty() {
            return Err(SimulationError::InvalidScenario("Network has no reactions".to_string()));
        }

        match self.linear_program().solve() {
            Ok(solution) => {
                debug!(
                    "FBA: {} metabolites, {} reactions, objective {:.6}",
                    self.metabolites.len(),
                    self.reactions.len(),
                    solution.objective_value
                );
                Ok(FluxSolution {
                    objective_value: solution.objective_value,
                    fluxes: solution.x,
                    status: FluxStatus::Optimal,
                })
            }
            Err(LpError::Infeasible) => Ok(FluxSolution::infeasible(self.reactions.len())),
            Err(error) => Err(error.into()),
        }
    }

    /// Min and max of every flux with the objective kept ≥ `fraction` × optimum
    pub fn flux_variability(&self, fraction: f64) -> Result<Vec<FluxRange>> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "Optimum fraction must be in [0, 1], got {}",
                fraction
            )));
        }

        let optimum = self.optimize()?;
        if optimum.status != FluxStatus::Optimal {
            return Err(SimulationError::Optimization("Network is infeasible".to_string()));
        }

        // -cᵀv ≤ -fraction·z*, loosened slightly against round-off
        let n = self.reactions.len();
        let floor = fraction * optimum.objective_value - 1e-9 * (1.0 + optimum.objective_value.abs());
        let a_ub = DMatrix::from_row_iterator(1, n, self.objective.iter().map(|c| -c));
        let b_ub = DVector::from_element(1, -floor);
        let base = self.linear_program().with_inequalities(a_ub, b_ub);

        (0..n)
            .map(|j| {
                let mut direction = DVector::zeros(n);
                direction[j] = 1.0;
                let maximum = base.clone().with_objective(direction.clone()).solve()?.objective_value;
                let minimum = -base.clone().with_objective(-direction).solve()?.objective_value;
                Ok(FluxRange { minimum, maximum })
            })
            .collect()
    }

    /// Copy of the network with `reaction` forced to zero flux
    pub fn knockout(&self, reaction: &str) -> Result<MetabolicNetwork> {
        let mut mutant = self.clone();
        mutant.set_bounds(reaction, 0.0, 0.0)?;
        Ok(mutant)
    }
}

/// Toy network with a capacity-limited efficient branch
///
/// ```text
/// EX_A:  -> A          [0, 10]
/// R1:    A -> B
/// R2:    A -> 2 C
/// R3:    B -> D
/// R4:    C -> D        [0, 6]
/// EX_C:  C ->
/// BIOMASS: D ->        (objective)
/// ```
///
/// The optimum routes 3 units of A through the efficient R2/R4 branch until
/// R4 saturates and the remaining 7 through R1/R3, for a biomass flux of 13.
pub fn textbook_network() -> Result<MetabolicNetwork> {
    let mut network = MetabolicNetwork::new();
    network.add_reaction("EX_A", &[("A", 1.0)], 0.0, 10.0)?;
    network.add_reaction("R1", &[("A", -1.0), ("B", 1.0)], 0.0, DEFAULT_FLUX_BOUND)?;
    network.add_reaction("R2", &[("A", -1.0), ("C", 2.0)], 0.0, DEFAULT_FLUX_BOUND)?;
    network.add_reaction("R3", &[("B", -1.0), ("D", 1.0)], 0.0, DEFAULT_FLUX_BOUND)?;
    network.add_reaction("R4", &[("C", -1.0), ("D", 1.0)], 0.0, 6.0)?;
    network.add_reaction("EX_C", &[("C", -1.0)], 0.0, DEFAULT_FLUX_BOUND)?;
    network.add_reaction("BIOMASS", &[("D", -1.0)], 0.0, DEFAULT_FLUX_BOUND)?;
    network.set_objective("BIOMASS")?;
    Ok(network)
}

/// Flux of every reaction keyed by name
pub fn flux_table(network: &MetabolicNetwork, solution: &FluxSolution) -> HashMap<String, f64> {
    network
        .reactions()
        .iter()
        .cloned()
        .zip(solution.fluxes.iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_stoichiometric_matrix_layout() {
        let network = textbook_network().unwrap();
        let s = network.stoichiometric_matrix();
        assert_eq!(s.shape(), (4, 7));
        let a = network.metabolite_index("A").unwrap();
        let r2 = network.reaction_index("R2").unwrap();
        let c = network.metabolite_index("C").unwrap();
        assert_eq!(s[(a, r2)], -1.0);
        assert_eq!(s[(c, r2)], 2.0);
    }

    #[test]
    fn test_textbook_optimum() {
        let network = textbook_network().unwrap();
        let solution = network.optimize().unwrap();
        assert_eq!(solution.status, FluxStatus::Optimal);
        assert_relative_eq!(solution.objective_value, 13.0, epsilon = 1e-9);

        let fluxes = flux_table(&network, &solution);
        assert_relative_eq!(fluxes["R1"], 7.0, epsilon = 1e-9);
        assert_relative_eq!(fluxes["R2"], 3.0, epsilon = 1e-9);
        assert_relative_eq!(fluxes["R4"], 6.0, epsilon = 1e-9);
        assert_relative_eq!(fluxes["EX_C"], 0.0, epsilon = 1e-9);

        assert!(network.mass_balance_residual(&solution.fluxes) <= 1e-9);
    }

    #[test]
    fn test_knockouts() {
        let network = textbook_network().unwrap();
        assert_relative_eq!(network.knockout("R4").unwrap().optimize().unwrap().objective_value, 10.0, epsilon = 1e-9);
        assert_relative_eq!(network.knockout("R1").unwrap().optimize().unwrap().objective_value, 6.0, epsilon = 1e-9);
        assert!(network.knockout("R9").is_err());
    }

    #[test]
    fn test_flux_variability() {
        let network = textbook_network().unwrap();
        let r1 = network.reaction_index("R1").unwrap();

        let tight = network.flux_variability(1.0).unwrap();
        assert_relative_eq!(tight[r1].minimum, 7.0, epsilon = 1e-6);
        assert_relative_eq!(tight[r1].maximum, 7.0, epsilon = 1e-6);

        let loose = network.flux_variability(0.9).unwrap();
        assert_relative_eq!(loose[r1].minimum, 5.7, epsilon = 1e-6);
        assert_relative_eq!(loose[r1].maximum, 8.3, epsilon = 1e-6);

        assert!(network.flux_variability(1.5).is_err());
    }

    #[test]
    fn test_infeasible_network() {
        let mut network = MetabolicNetwork::new();
        network.add_reaction("IN", &[("X", 1.0)], 5.0, 10.0).unwrap();
        network.add_reaction("OUT", &[("X", -1.0)], 0.0, 1.0).unwrap();
        network.set_objective("OUT").unwrap();
        assert_eq!(network.optimize().unwrap().status, FluxStatus::Infeasible);
    }

    #[test]
    fn test_duplicate_reaction_rejected() {
        let mut network = textbook_network().unwrap();
        assert!(network.add_reaction("R1", &[("A", -1.0)], 0.0, 1.0).is_err());
    }
}
