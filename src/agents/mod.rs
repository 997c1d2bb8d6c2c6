//! Particle-based SIR epidemic
//!
//! Agents are discs bouncing in a rectangular box. They collide
//! elastically, infected agents pass the disease on to susceptible
//! neighbours within an infection distance, and after a fixed infectious
//! period each infected agent either recovers or dies. Dead agents leave
//! the box, so the population counts always satisfy
//!
//! ```text
//! S + I + R + D = initial population
//! ```
//!
//! # Example
//!
//! ```rust
//! use biosim_rs::agents::{AgentConfig, run_epidemic};
//!
//! let config = AgentConfig {
//!     num_agents: 40,
//!     max_frames: 50,
//!     ..AgentConfig::default()
//! };
//! let run = run_epidemic(&config)?;
//! let last = run.history.last().unwrap();
//! assert_eq!(last.total(), 40);
//! # Ok::<(), biosim_rs::SimulationError>(())
//! ```

pub mod epidemic;
pub mod particle;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

pub use epidemic::{AgentFrame, AgentSimulation, EpidemicCounts, EpidemicHistory, EpidemicRun, run_epidemic};
pub use particle::{Agent, place_agents};

/// Health of one agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Susceptible,
    Infected,
    Recovered,
    Dead,
}

impl HealthState {
    /// RGB colour used when drawing agents
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            HealthState::Susceptible => (0, 0, 255),
            HealthState::Infected => (255, 0, 0),
            HealthState::Recovered => (0, 255, 0),
            HealthState::Dead => (0, 0, 0),
        }
    }
}

/// Box, particle and disease parameters of an agent-based run
///
/// Distances are in pixels, speeds in pixels per second. One frame lasts
/// `1 / frames_per_second` seconds of particle motion and counts as one
/// hour of disease progression when `steps_per_day` is 24.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub width: f64,
    pub height: f64,
    pub num_agents: usize,
    pub radius: f64,
    pub speed: f64,
    pub mass: f64,
    /// Fraction of agents (lowest ids first) that never move
    pub isolated: f64,
    pub isolated_mass: f64,
    pub infected_fraction: f64,
    pub infection_distance: f64,
    pub infect_prob: f64,
    pub reinfect_prob: f64,
    /// Frames an agent stays infected before recovering or dying
    pub infectious_period: usize,
    pub death_prob: f64,
    pub frames_per_second: f64,
    pub steps_per_day: usize,
    pub max_frames: usize,
    /// Keep a snapshot every this many frames, 0 for none
    pub snapshot_every: usize,
    pub seed: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let radius = 5.0;
        Self {
            width: 500.0,
            height: 500.0,
            num_agents: 400,
            radius,
            speed: 150.0,
            mass: 0.1,
            isolated: 0.0,
            isolated_mass: 100.0,
            infected_fraction: 0.01,
            infection_distance: 2.0 * radius + 1.0,
            infect_prob: 0.5,
            reinfect_prob: 0.0,
            infectious_period: 30 * 24,
            death_prob: 0.0044,
            frames_per_second: 120.0,
            steps_per_day: 24,
            max_frames: 50_000,
            snapshot_every: 0,
            seed: 42,
        }
    }
}

impl AgentConfig {
    /// Number of agents infected at the start
    pub fn initial_infected(&self) -> usize {
        (self.num_agents as f64 * self.infected_fraction) as usize
    }

    /// Seconds of motion per frame
    pub fn frame_duration(&self) -> f64 {
        1.0 / self.frames_per_second
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(SimulationError::InvalidConfiguration(message));

        if self.num_agents == 0 {
            return invalid("At least one agent is needed".to_string());
        }
        if !(self.radius > 0.0) || !(self.mass > 0.0) || !(self.isolated_mass > 0.0) {
            return invalid("Agent radius and masses must be positive".to_string());
        }
        if !(self.width > 2.0 * self.radius) || !(self.height > 2.0 * self.radius) {
            return invalid(format!(
                "Box {}x{} is too small for agents of radius {}",
                self.width, self.height, self.radius
            ));
        }
        for (name, value) in [
            ("isolated", self.isolated),
            ("infected_fraction", self.infected_fraction),
            ("infect_prob", self.infect_prob),
            ("reinfect_prob", self.reinfect_prob),
            ("death_prob", self.death_prob),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{} must lie in [0, 1], got {}", name, value));
            }
        }
        if !(self.frames_per_second > 0.0) || self.steps_per_day == 0 {
            return invalid("Frame rate and steps per day must be positive".to_string());
        }
        if self.speed < 0.0 || self.infection_distance < 0.0 {
            return invalid("Speed and infection distance cannot be negative".to_string());
        }
        Ok(())
    }
}
