//! Three-step enzymatic pathway
//!
//! ```text
//!   influx      v₁         v₂         v₃
//!  ───────> S₁ ────> S₂ ────> S₃ ────>
//! ```
//!
//! ```text
//! dS₁/dt = J - v₁(S₁)
//! dS₂/dt = v₁(S₁) - v₂(S₂)
//! dS₃/dt = v₂(S₂) - v₃(S₃)
//! ```
//!
//! Each step follows either Michaelis-Menten kinetics `vᵢ = Vmaxᵢ·S/(Kmᵢ + S)`
//! or first-order mass action `vᵢ = kᵢ·S`. At steady state every flux equals
//! the influx J, which gives closed forms for both rate laws:
//!
//! - Michaelis-Menten: `Sᵢ* = J·Kmᵢ / (Vmaxᵢ - J)`, which needs `Vmaxᵢ > J`
//! - Mass action: `Sᵢ* = J / kᵢ`
//!
//! Three ways of choosing mass-action constants are provided:
//! - [`EnzymePathway::linearized_mass_action`]: `k = Vmax/Km`, the slope at S = 0
//! - [`EnzymePathway::matched_mass_action`]: `k = Vmax/(Km + S*)`, reproduces the
//!   Michaelis-Menten steady state exactly
//! - [`fit_mass_action`]: Nelder-Mead search for the constants whose
//!   simulated end state is closest to a target

use log::debug;
use nalgebra::DVector;

use crate::error::{Result, SimulationError};
use crate::optimize::{NelderMeadOptions, minimize};
use crate::physics::{PhysicalData, PhysicalModel, PhysicalQuantity, PhysicalState};
use crate::solver::{RK4Solver, Scenario, Solver, SolverConfiguration};

/// Maximum velocities of the three steps
pub const DEFAULT_VMAX: [f64; 3] = [9.0, 12.0, 15.0];

/// Michaelis constants of the three steps
pub const DEFAULT_KM: [f64; 3] = [1.0, 0.4, 3.0];

/// Constant influx into the first pool
pub const DEFAULT_INFLUX: f64 = 2.0;

/// Rate law shared by the three steps
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateLaw {
    MichaelisMenten { vmax: [f64; 3], km: [f64; 3] },
    MassAction { k: [f64; 3] },
}

impl RateLaw {
    /// Reaction velocity of step `i` at substrate concentration `s`
    pub fn velocity(&self, i: usize, s: f64) -> f64 {
        match self {
            RateLaw::MichaelisMenten { vmax, km } => vmax[i] * s / (km[i] + s),
            RateLaw::MassAction { k } => k[i] * s,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RateLaw::MichaelisMenten { .. } => "Michaelis-Menten",
            RateLaw::MassAction { .. } => "mass action",
        }
    }
}

/// Linear three-pool pathway with constant influx
#[derive(Debug, Clone, PartialEq)]
pub struct EnzymePathway {
    rate_law: RateLaw,
    influx: f64,
    initial: [f64; 3],
}

impl EnzymePathway {
    pub fn new(rate_law: RateLaw, influx: f64, initial: [f64; 3]) -> Self {
        Self {
            rate_law,
            influx,
            initial,
        }
    }

    /// Michaelis-Menten pathway with the default constants
    pub fn michaelis_menten(initial: [f64; 3]) -> Self {
        Self::new(
            RateLaw::MichaelisMenten {
                vmax: DEFAULT_VMAX,
                km: DEFAULT_KM,
            },
            DEFAULT_INFLUX,
            initial,
        )
    }

    pub fn mass_action(k: [f64; 3], initial: [f64; 3]) -> Self {
        Self::new(RateLaw::MassAction { k }, DEFAULT_INFLUX, initial)
    }

    pub fn rate_law(&self) -> RateLaw {
        self.rate_law
    }

    pub fn influx(&self) -> f64 {
        self.influx
    }

    /// Same pathway started from another initial condition
    pub fn with_initial(&self, initial: [f64; 3]) -> Self {
        Self { initial, ..self.clone() }
    }

    /// Closed-form steady state
    pub fn analytical_steady_state(&self) -> Result<[f64; 3]> {
        let mut steady = [0.0; 3];
        for (i, value) in steady.iter_mut().enumerate() {
            *value = match self.rate_law {
                RateLaw::MichaelisMenten { vmax, km } => {
                    if vmax[i] <= self.influx {
                        return Err(SimulationError::InvalidScenario(format!(
                            "Step {} saturates: Vmax = {} does not exceed the influx {}",
                            i + 1,
                            vmax[i],
                            self.influx
                        )));
                    }
                    self.influx * km[i] / (vmax[i] - self.influx)
                }
                RateLaw::MassAction { k } => {
                    if k[i] <= 0.0 {
                        return Err(SimulationError::InvalidScenario(format!(
                            "Step {} has non-positive rate constant {}",
                            i + 1,
                            k[i]
                        )));
                    }
                    self.influx / k[i]
                }
            };
        }
        Ok(steady)
    }

    /// Mass-action constants `Vmax/(Km + S*)` sharing the Michaelis-Menten steady state
    pub fn matched_mass_action(&self) -> Result<[f64; 3]> {
        let RateLaw::MichaelisMenten { vmax, km } = self.rate_law else {
            return Err(SimulationError::InvalidScenario(
                "Matched constants need a Michaelis-Menten pathway".to_string(),
            ));
        };
        let steady = self.analytical_steady_state()?;
        Ok([
            vmax[0] / (km[0] + steady[0]),
            vmax[1] / (km[1] + steady[1]),
            vmax[2] / (km[2] + steady[2]),
        ])
    }

    /// Mass-action constants `Vmax/Km` from the low-substrate limit
    pub fn linearized_mass_action(&self) -> Result<[f64; 3]> {
        let RateLaw::MichaelisMenten { vmax, km } = self.rate_law else {
            return Err(SimulationError::InvalidScenario(
                "Linearized constants need a Michaelis-Menten pathway".to_string(),
            ));
        };
        Ok([vmax[0] / km[0], vmax[1] / km[1], vmax[2] / km[2]])
    }

    fn concentrations(state: &PhysicalState) -> Option<&DVector<f64>> {
        state
            .get(PhysicalQuantity::Concentration)
            .and_then(PhysicalData::try_as_vector)
    }
}

impl PhysicalModel for EnzymePathway {
    fn points(&self) -> usize {
        3
    }

    fn compute_physics(&self, state: &PhysicalState) -> PhysicalState {
        let s = match Self::concentrations(state) {
            Some(s) if s.len() == 3 => s,
            _ => return PhysicalState::new(PhysicalQuantity::Concentration, PhysicalData::uniform_vector(3, 0.0)),
        };

        let v: Vec<f64> = (0..3).map(|i| self.rate_law.velocity(i, s[i])).collect();
        let ds = vec![self.influx - v[0], v[0] - v[1], v[1] - v[2]];

        PhysicalState::new(PhysicalQuantity::Concentration, PhysicalData::from_vec(ds))
    }

    fn setup_initial_state(&self) -> PhysicalState {
        PhysicalState::new(PhysicalQuantity::Concentration, PhysicalData::from_vec(self.initial.to_vec()))
    }

    fn name(&self) -> &str {
        match self.rate_law {
            RateLaw::MichaelisMenten { .. } => "Enzyme pathway (Michaelis-Menten)",
            RateLaw::MassAction { .. } => "Enzyme pathway (mass action)",
        }
    }

    fn description(&self) -> Option<&str> {
        Some("Three substrate pools in series fed by a constant influx")
    }
}

/// Integrate a pathway with RK4 and return the state at `horizon`
pub fn end_state(pathway: &EnzymePathway, horizon: f64, dt: f64) -> Result<[f64; 3]> {
    let config = SolverConfiguration::fixed_step(horizon, dt).recording_every(usize::MAX);
    let result = RK4Solver::new().solve(&Scenario::from_model(Box::new(pathway.clone())), &config)?;
    let s = EnzymePathway::concentrations(&result.final_state)
        .ok_or_else(|| SimulationError::InvalidScenario("Pathway lost its concentrations".to_string()))?;
    Ok([s[0], s[1], s[2]])
}

/// Result of fitting mass-action constants
#[derive(Debug, Clone, PartialEq)]
pub struct MassActionFit {
    pub k: [f64; 3],
    /// Sum of squared differences between the simulated end state and the target
    pub residual: f64,
    pub iterations: u64,
}

/// Search the mass-action constants whose end state at `horizon` matches `target`
///
/// Every evaluation integrates the pathway from `initial` with RK4. Constants
/// that are not strictly positive, or that make the integration blow up, get
/// an infinite cost.
pub fn fit_mass_action(
    target: [f64; 3],
    initial_k: [f64; 3],
    initial: [f64; 3],
    horizon: f64,
    dt: f64,
) -> Result<MassActionFit> {
    let objective = |k: &[f64]| {
        if k.iter().any(|&ki| ki <= 0.0) {
            return f64::INFINITY;
        }
        let pathway = EnzymePathway::mass_action([k[0], k[1], k[2]], initial);
        match end_state(&pathway, horizon, dt) {
            Ok(end) => end.iter().zip(target.iter()).map(|(s, t)| (s - t).powi(2)).sum(),
            Err(_) => f64::INFINITY,
        }
    };

    let options = NelderMeadOptions {
        max_iters: 3000,
        sd_tolerance: 1e-16,
        ..Default::default()
    };
    let best = minimize(&objective, &initial_k, &options)?;
    debug!(
        "mass-action fit: k = {:?}, residual {:.3e} after {} iterations",
        best.param, best.cost, best.iterations
    );

    Ok(MassActionFit {
        k: [best.param[0], best.param[1], best.param[2]],
        residual: best.cost,
        iterations: best.iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_michaelis_menten_steady_state() {
        let pathway = EnzymePathway::michaelis_menten([0.3, 0.2, 0.1]);
        let steady = pathway.analytical_steady_state().unwrap();
        assert_relative_eq!(steady[0], 2.0 / 7.0, epsilon = 1e-12);
        assert_relative_eq!(steady[1], 0.08, epsilon = 1e-12);
        assert_relative_eq!(steady[2], 6.0 / 13.0, epsilon = 1e-12);

        // All fluxes balance the influx at the steady state
        let rate = pathway.compute_physics(&pathway.with_initial(steady).setup_initial_state());
        let ds = rate.get(PhysicalQuantity::Concentration).unwrap().as_vector();
        assert!(ds.iter().all(|d| d.abs() < 1e-12));
    }

    #[test]
    fn test_saturated_step_has_no_steady_state() {
        let pathway = EnzymePathway::new(
            RateLaw::MichaelisMenten {
                vmax: [1.5, 12.0, 15.0],
                km: DEFAULT_KM,
            },
            DEFAULT_INFLUX,
            [0.0; 3],
        );
        assert!(pathway.analytical_steady_state().is_err());
    }

    #[test]
    fn test_matched_and_linearized_constants() {
        let pathway = EnzymePathway::michaelis_menten([0.3, 0.2, 0.1]);
        let matched = pathway.matched_mass_action().unwrap();
        assert_relative_eq!(matched[0], 7.0, epsilon = 1e-12);
        assert_relative_eq!(matched[1], 25.0, epsilon = 1e-12);
        assert_relative_eq!(matched[2], 13.0 / 3.0, epsilon = 1e-12);

        assert_eq!(pathway.linearized_mass_action().unwrap(), [9.0, 30.0, 5.0]);
        assert!(EnzymePathway::mass_action([1.0; 3], [0.0; 3]).matched_mass_action().is_err());
    }

    #[test]
    fn test_both_rate_laws_reach_the_same_steady_state() {
        for initial in [[0.3, 0.2, 0.1], [6.0, 4.0, 4.0]] {
            let mm = EnzymePathway::michaelis_menten(initial);
            let ma = EnzymePathway::mass_action(mm.matched_mass_action().unwrap(), initial);
            let target = mm.analytical_steady_state().unwrap();

            let mm_end = end_state(&mm, 20.0, 0.01).unwrap();
            let ma_end = end_state(&ma, 20.0, 0.01).unwrap();
            for i in 0..3 {
                assert_relative_eq!(mm_end[i], target[i], epsilon = 1e-6);
                assert_relative_eq!(ma_end[i], target[i], epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_fit_recovers_matched_constants() {
        let mm = EnzymePathway::michaelis_menten([0.3, 0.2, 0.1]);
        let target = mm.analytical_steady_state().unwrap();
        let matched = mm.matched_mass_action().unwrap();

        let fit = fit_mass_action(target, mm.linearized_mass_action().unwrap(), [0.3, 0.2, 0.1], 5.0, 0.05).unwrap();

        assert!(fit.residual < 1e-8, "residual {}", fit.residual);
        for i in 0..3 {
            assert!(
                (fit.k[i] - matched[i]).abs() / matched[i] < 1e-2,
                "k[{}] = {} vs {}",
                i,
                fit.k[i],
                matched[i]
            );
        }
    }
}
