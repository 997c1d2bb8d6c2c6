//! Vertical transport of large and small eDNA fragments
//!
//! # Mathematical Model
//!
//! With depth z positive downward and C_L, C_S the large and small fragment
//! concentrations:
//!
//! ```text
//! ∂C_L/∂t = -∂/∂z[(w + w_s)·C_L - κ·∂C_L/∂z] - (k + δ)·C_L + S_L·P(t, z)
//! ∂C_S/∂t = -∂/∂z[ w·C_S        - κ·∂C_S/∂z] -  k·C_S + δ·C_L + S_S·P(t, z)
//! ```
//!
//! - `w(z)`: vertical advection, `w_s`: settling of large fragments
//! - `κ(z)`: vertical diffusivity
//! - `k(z)`: decay, `δ`: breakdown of large into small fragments
//! - `P(t, z)`: shedding pattern of the source population (one-day DVM
//!   pattern, repeated every day), with shedding rates `S_L` and `S_S`
//!
//! # Discretization
//!
//! Finite volumes of width dz centred on the grid depths. Advective fluxes
//! are upwinded with the face velocity, diffusive fluxes use the mean
//! diffusivity of the two neighbouring cells, and both boundary faces carry
//! no flux. Transport therefore only moves mass between cells, and the
//! column inventory changes by shedding minus decay alone.

use nalgebra::DVector;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::grid::{DepthGrid, SECONDS_PER_DAY};
use super::profiles::{AdvectionDirection, DecayProfile, Season, kappa_profile, vertical_advection_profile};
use crate::error::{Result, SimulationError};
use crate::physics::{PhysicalData, PhysicalModel, PhysicalQuantity, PhysicalState};

/// Physical parameters of the water column, in configuration units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportParameters {
    pub season: Season,
    /// Width of the mixed-layer transition (m)
    pub l_scale: f64,
    /// Switch vertical diffusion off entirely
    pub diffusion: bool,
    /// Peak advection velocity (m/s)
    pub w_max: f64,
    pub direction: AdvectionDirection,
    /// Settling velocity of large fragments (m/s, downward positive)
    pub settling_velocity: f64,
    /// Breakdown rate δ (h⁻¹)
    pub breakdown_per_hour: f64,
    /// Uniform decay rate (h⁻¹) used when no decay table is given
    pub decay_per_hour: f64,
    /// Total shedding rate (s⁻¹ per unit pattern intensity)
    pub shedding_rate: f64,
    /// Share of the shedding released as large fragments
    pub large_fraction: f64,
}

impl Default for TransportParameters {
    fn default() -> Self {
        Self {
            season: Season::Summer,
            l_scale: 2.0,
            diffusion: true,
            w_max: 1e-4,
            direction: AdvectionDirection::Down,
            settling_velocity: 0.0,
            breakdown_per_hour: 0.19,
            decay_per_hour: 0.08,
            shedding_rate: 0.1,
            large_fraction: 0.5,
        }
    }
}

/// Inventory and source/sink rates of the water column at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassBudget {
    /// ∫ (C_L + C_S) dz
    pub total_mass: f64,
    /// Shedding rate ∫ (S_L + S_S)·P dz
    pub production_rate: f64,
    /// Decay rate ∫ k·(C_L + C_S) dz
    pub decay_rate: f64,
}

/// Face quantities shared by the L and S equations
#[derive(Debug, Clone)]
pub(crate) struct FaceCoefficients {
    /// Advection velocity at the interior faces (between cells i and i + 1)
    velocity: Vec<f64>,
    /// Diffusivity at the interior faces
    diffusivity: Vec<f64>,
}

impl FaceCoefficients {
    fn new(velocity: &DVector<f64>, diffusivity: &DVector<f64>) -> Self {
        let faces = velocity.len().saturating_sub(1);
        Self {
            velocity: (0..faces).map(|i| 0.5 * (velocity[i] + velocity[i + 1])).collect(),
            diffusivity: (0..faces).map(|i| 0.5 * (diffusivity[i] + diffusivity[i + 1])).collect(),
        }
    }

    /// -∂F/∂z for the flux F = w·C - κ·∂C/∂z, written into `out`
    fn divergence(&self, c: &[f64], dz: f64, out: &mut [f64]) {
        out.iter_mut().for_each(|v| *v = 0.0);
        for (face, (&w, &kappa)) in self.velocity.iter().zip(self.diffusivity.iter()).enumerate() {
            let upwind = if w > 0.0 { c[face] } else { c[face + 1] };
            let flux = w * upwind - kappa * (c[face + 1] - c[face]) / dz;
            // Positive flux leaves cell `face` and enters `face + 1`
            out[face] -= flux / dz;
            out[face + 1] += flux / dz;
        }
    }
}

/// Large/small eDNA transport in a 1-D water column
#[derive(Debug, Clone)]
pub struct EdnaTransport {
    grid: DepthGrid,
    source: Array2<f64>,
    decay: DVector<f64>,
    breakdown: f64,
    shedding_large: f64,
    shedding_small: f64,
    large_faces: FaceCoefficients,
    small_faces: FaceCoefficients,
    parameters: TransportParameters,
}

impl EdnaTransport {
    /// Build the model from a one-day source pattern (`rows × grid.len()`)
    ///
    /// `decay` overrides the uniform decay rate of `parameters`.
    pub fn new(
        grid: DepthGrid,
        source: Array2<f64>,
        parameters: TransportParameters,
        decay: Option<&DecayProfile>,
    ) -> Result<Self> {
        if source.ncols() != grid.len() || source.nrows() == 0 {
            return Err(SimulationError::InvalidConfiguration(format!(
                "Source pattern is {}x{}, expected rows x {}",
                source.nrows(),
                source.ncols(),
                grid.len()
            )));
        }
        if !(0.0..=1.0).contains(&parameters.large_fraction) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "Large fragment share must be in [0, 1], got {}",
                parameters.large_fraction
            )));
        }
        if parameters.l_scale.is_nan() || parameters.l_scale <= 0.0 {
            return Err(SimulationError::InvalidConfiguration(format!(
                "Mixed-layer transition width must be positive, got {}",
                parameters.l_scale
            )));
        }
        if parameters.breakdown_per_hour < 0.0 || parameters.shedding_rate < 0.0 {
            return Err(SimulationError::InvalidConfiguration(
                "Breakdown and shedding rates must be non-negative".to_string(),
            ));
        }

        let decay = match decay {
            Some(profile) => profile.on_grid(&grid),
            None => DecayProfile::uniform(parameters.decay_per_hour)?.on_grid(&grid),
        };

        let diffusivity = if parameters.diffusion {
            kappa_profile(grid.depths(), parameters.season, parameters.l_scale)
        } else {
            DVector::zeros(grid.len())
        };
        let velocity = vertical_advection_profile(grid.depths(), parameters.w_max, parameters.direction);
        let settled = velocity.add_scalar(parameters.settling_velocity);

        Ok(Self {
            large_faces: FaceCoefficients::new(&settled, &diffusivity),
            small_faces: FaceCoefficients::new(&velocity, &diffusivity),
            breakdown: parameters.breakdown_per_hour / 3600.0,
            shedding_large: parameters.shedding_rate * parameters.large_fraction,
            shedding_small: parameters.shedding_rate * (1.0 - parameters.large_fraction),
            grid,
            source,
            decay,
            parameters,
        })
    }

    pub fn grid(&self) -> &DepthGrid {
        &self.grid
    }

    pub fn source(&self) -> &Array2<f64> {
        &self.source
    }

    pub fn parameters(&self) -> &TransportParameters {
        &self.parameters
    }

    /// Decay rate on the grid (s⁻¹)
    pub fn decay(&self) -> &DVector<f64> {
        &self.decay
    }

    /// Largest stable explicit step: min over cells of dz/|w| and dz²/(2κ)
    pub fn stable_time_step(&self) -> f64 {
        let dz = self.grid.dz();
        let faces = self.large_faces.velocity.iter().chain(self.small_faces.velocity.iter());
        let advective = faces.fold(f64::INFINITY, |m, &w| if w != 0.0 { m.min(dz / w.abs()) } else { m });
        let diffusive = self
            .large_faces
            .diffusivity
            .iter()
            .fold(f64::INFINITY, |m, &k| if k > 0.0 { m.min(dz * dz / (2.0 * k)) } else { m });
        advective.min(diffusive)
    }

    /// Row of a one-day pattern active at time `t` (s)
    pub(crate) fn pattern_row(rows: usize, t: f64) -> usize {
        let row_length = SECONDS_PER_DAY / rows as f64;
        ((t / row_length + 1e-9).floor().max(0.0) as usize) % rows
    }

    pub(crate) fn source_row(&self, t: f64) -> ndarray::ArrayView1<'_, f64> {
        self.source.row(Self::pattern_row(self.source.nrows(), t))
    }

    pub(crate) fn fragments(state: &PhysicalState) -> Option<(&DVector<f64>, &DVector<f64>)> {
        let large = state.get(PhysicalQuantity::LargeEdna)?.try_as_vector()?;
        let small = state.get(PhysicalQuantity::SmallEdna)?.try_as_vector()?;
        Some((large, small))
    }

    /// Transport, reactions and shedding at `state`, as (dC_L/dt, dC_S/dt)
    pub(crate) fn tendencies(&self, large: &DVector<f64>, small: &DVector<f64>, t: f64) -> (DVector<f64>, DVector<f64>) {
        let n = self.grid.len();
        let dz = self.grid.dz();
        let mut d_large = DVector::zeros(n);
        let mut d_small = DVector::zeros(n);

        self.large_faces.divergence(large.as_slice(), dz, d_large.as_mut_slice());
        self.small_faces.divergence(small.as_slice(), dz, d_small.as_mut_slice());

        let source = self.source_row(t);
        for i in 0..n {
            let breakdown = self.breakdown * large[i];
            d_large[i] += -(self.decay[i] * large[i]) - breakdown + self.shedding_large * source[i];
            d_small[i] += -(self.decay[i] * small[i]) + breakdown + self.shedding_small * source[i];
        }

        (d_large, d_small)
    }

    /// Column inventory and its source/sink rates at time `t`
    pub fn mass_budget(&self, state: &PhysicalState, t: f64) -> Result<MassBudget> {
        let (large, small) = Self::fragments(state)
            .ok_or_else(|| SimulationError::InvalidScenario("State has no eDNA fragments".to_string()))?;
        let dz = self.grid.dz();
        let source = self.source_row(t);

        Ok(MassBudget {
            total_mass: (large.sum() + small.sum()) * dz,
            production_rate: (self.shedding_large + self.shedding_small) * source.sum() * dz,
            decay_rate: self
                .decay
                .iter()
                .zip(large.iter().zip(small.iter()))
                .map(|(k, (l, s))| k * (l + s))
                .sum::<f64>()
                * dz,
        })
    }

    pub(crate) fn zero_state(&self) -> PhysicalState {
        let n = self.grid.len();
        PhysicalState::new(PhysicalQuantity::LargeEdna, PhysicalData::uniform_vector(n, 0.0))
            .with(PhysicalQuantity::SmallEdna, PhysicalData::uniform_vector(n, 0.0))
    }
}

impl PhysicalModel for EdnaTransport {
    fn points(&self) -> usize {
        self.grid.len()
    }

    fn compute_physics(&self, state: &PhysicalState) -> PhysicalState {
        let Some((large, small)) = Self::fragments(state) else {
            return self.zero_state();
        };
        let (d_large, d_small) = self.tendencies(large, small, state.time());

        PhysicalState::new(PhysicalQuantity::LargeEdna, PhysicalData::Vector(d_large))
            .with(PhysicalQuantity::SmallEdna, PhysicalData::Vector(d_small))
    }

    fn setup_initial_state(&self) -> PhysicalState {
        self.zero_state()
    }

    fn name(&self) -> &str {
        "eDNA vertical transport"
    }

    fn description(&self) -> Option<&str> {
        Some("Advection, diffusion, settling, decay and breakdown of large and small eDNA fragments")
    }
}

/// Sum of the large and small concentrations of every stored state (time × depth)
pub fn total_concentration(result: &crate::solver::SimulationResult) -> Option<nalgebra::DMatrix<f64>> {
    let large = result.matrix(PhysicalQuantity::LargeEdna)?;
    let small = result.matrix(PhysicalQuantity::SmallEdna)?;
    Some(large + small)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::edna::migration::{DvmSpec, dvm};
    use crate::solver::{EulerSolver, Scenario, Solver, SolverConfiguration};
    use approx::assert_relative_eq;

    fn small_column() -> EdnaTransport {
        let grid = DepthGrid::new(600.0, 10.0).unwrap();
        let source = dvm(&grid, 24, &DvmSpec::new(100.0, 500.0, 18.0, 6.0, 100.0));
        EdnaTransport::new(grid, source, TransportParameters::default(), None).unwrap()
    }

    #[test]
    fn test_pattern_row_lookup() {
        assert_eq!(EdnaTransport::pattern_row(24, 0.0), 0);
        assert_eq!(EdnaTransport::pattern_row(24, 3599.0), 0);
        assert_eq!(EdnaTransport::pattern_row(24, 3600.0), 1);
        assert_eq!(EdnaTransport::pattern_row(24, SECONDS_PER_DAY + 7200.0), 2);
    }

    #[test]
    fn test_transport_conserves_mass() {
        let model = small_column();
        let n = model.grid().len();
        let large = DVector::from_fn(n, |i, _| (i as f64 * 0.3).sin().abs());
        let small = DVector::from_fn(n, |i, _| (i as f64 * 0.7).cos().abs());

        let mut d_large = vec![0.0; n];
        model.large_faces.divergence(large.as_slice(), 10.0, &mut d_large);
        let mut d_small = vec![0.0; n];
        model.small_faces.divergence(small.as_slice(), 10.0, &mut d_small);

        assert!(d_large.iter().sum::<f64>().abs() < 1e-15);
        assert!(d_small.iter().sum::<f64>().abs() < 1e-15);
    }

    #[test]
    fn test_downward_advection_moves_mass_down() {
        let grid = DepthGrid::new(400.0, 10.0).unwrap();
        let source = Array2::zeros((1, grid.len()));
        let parameters = TransportParameters {
            diffusion: false,
            ..Default::default()
        };
        let model = EdnaTransport::new(grid, source, parameters, None).unwrap();

        let mut large = DVector::zeros(41);
        large[10] = 1.0;
        let (d_large, _) = model.tendencies(&large, &DVector::zeros(41), 0.0);
        assert!(d_large[10] < 0.0);
        assert!(d_large[11] > 0.0);
        assert_eq!(d_large[9], 0.0);
    }

    #[test]
    fn test_rejects_mismatched_source() {
        let grid = DepthGrid::new(100.0, 10.0).unwrap();
        let source = Array2::zeros((24, 5));
        assert!(EdnaTransport::new(grid, source, TransportParameters::default(), None).is_err());
    }

    #[test]
    fn test_rejects_non_positive_transition_width() {
        let grid = DepthGrid::new(100.0, 10.0).unwrap();
        let source = Array2::zeros((24, grid.len()));
        for l_scale in [0.0, -2.0, f64::NAN] {
            let parameters = TransportParameters {
                l_scale,
                ..Default::default()
            };
            let result = EdnaTransport::new(grid.clone(), source.clone(), parameters, None);
            assert!(matches!(result, Err(SimulationError::InvalidConfiguration(_))));
        }
    }

    #[test]
    fn test_stable_time_step() {
        let model = small_column();
        // Diffusive limit in the mixed layer: 100 / 2e-3
        assert!(model.stable_time_step() > 1000.0);
        assert!(model.stable_time_step() < 60_000.0);
    }

    #[test]
    fn test_euler_mass_balance() {
        let model = small_column();
        let dt = 60.0;
        let steps = 600;
        let scenario = Scenario::from_model(Box::new(model.clone()));
        let result = EulerSolver::new()
            .solve(&scenario, &SolverConfiguration::fixed_step(steps as f64 * dt, dt))
            .unwrap();

        assert_eq!(result.len(), steps + 1);
        for (window, times) in result.state_trajectory.windows(2).zip(result.time_points.windows(2)) {
            let before = model.mass_budget(&window[0], times[0]).unwrap();
            let after = model.mass_budget(&window[1], times[1]).unwrap();
            let expected = before.total_mass + dt * (before.production_rate - before.decay_rate);
            assert_relative_eq!(after.total_mass, expected, epsilon = 1e-9 * (1.0 + expected.abs()));
        }

        let last = model.mass_budget(&result.final_state, result.time_points[steps]).unwrap();
        assert!(last.total_mass > 0.0);
    }
}
