//! Frame loop of the agent-based epidemic

use log::debug;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};

use super::particle::{Agent, place_agents, resolve_collisions};
use super::{AgentConfig, HealthState};
use crate::error::Result;

/// Population counts after one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EpidemicCounts {
    pub susceptible: usize,
    pub infected: usize,
    pub recovered: usize,
    pub dead: usize,
}

impl EpidemicCounts {
    pub fn total(&self) -> usize {
        self.susceptible + self.infected + self.recovered + self.dead
    }

    pub fn get(&self, state: HealthState) -> usize {
        match state {
            HealthState::Susceptible => self.susceptible,
            HealthState::Infected => self.infected,
            HealthState::Recovered => self.recovered,
            HealthState::Dead => self.dead,
        }
    }
}

/// S/I/R/D counts per frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EpidemicHistory {
    pub counts: Vec<EpidemicCounts>,
    pub steps_per_day: usize,
}

impl EpidemicHistory {
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn last(&self) -> Option<EpidemicCounts> {
        self.counts.last().copied()
    }

    /// Elapsed days at every recorded frame
    pub fn days(&self) -> Vec<f64> {
        let per_day = self.steps_per_day.max(1) as f64;
        (0..self.counts.len()).map(|i| i as f64 / per_day).collect()
    }

    pub fn series(&self, state: HealthState) -> Vec<f64> {
        self.counts.iter().map(|c| c.get(state) as f64).collect()
    }

    /// Frame and size of the largest infected count
    pub fn peak_infected(&self) -> Option<(usize, usize)> {
        self.counts
            .iter()
            .enumerate()
            .max_by_key(|(frame, c)| (c.infected, std::cmp::Reverse(*frame)))
            .map(|(frame, c)| (frame, c.infected))
    }
}

/// Positions and health of the living agents at one frame
#[derive(Debug, Clone, PartialEq)]
pub struct AgentFrame {
    pub frame: usize,
    pub positions: Vec<[f64; 2]>,
    pub health: Vec<HealthState>,
}

/// History and snapshots of a finished run
#[derive(Debug, Clone)]
pub struct EpidemicRun {
    pub history: EpidemicHistory,
    pub frames: Vec<AgentFrame>,
}

pub struct AgentSimulation {
    config: AgentConfig,
    agents: Vec<Agent>,
    rng: StdRng,
    frame: usize,
    history: EpidemicHistory,
    frames: Vec<AgentFrame>,
}

impl AgentSimulation {
    /// Place the agents and infect the initial cases
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut agents = place_agents(&config, &mut rng)?;

        for index in sample(&mut rng, agents.len(), config.initial_infected()) {
            agents[index].health = HealthState::Infected;
        }

        let history = EpidemicHistory {
            counts: Vec::new(),
            steps_per_day: config.steps_per_day,
        };

        Ok(Self {
            config,
            agents,
            rng,
            frame: 0,
            history,
            frames: Vec::new(),
        })
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn history(&self) -> &EpidemicHistory {
        &self.history
    }

    /// Advance one frame and record the counts
    pub fn step(&mut self) -> EpidemicCounts {
        self.frame += 1;

        resolve_collisions(&mut self.agents);

        let size = [self.config.width, self.config.height];
        let dt = self.config.frame_duration();
        for agent in &mut self.agents {
            agent.bounce(size);
            if !agent.isolated {
                agent.advance(dt);
            }
        }

        self.spread_infection();
        self.progress_infections();

        let counts = self.count();
        self.history.counts.push(counts);

        self.agents.retain(|a| a.health != HealthState::Dead);

        let every = self.config.snapshot_every;
        if every > 0 && (self.frame - 1) % every == 0 {
            self.frames.push(self.snapshot());
        }

        counts
    }

    /// Step until nobody is infected or the frame limit is reached
    pub fn run(mut self) -> EpidemicRun {
        debug!(
            "starting agent epidemic: {} agents, infect_prob {}, isolated {}",
            self.config.num_agents, self.config.infect_prob, self.config.isolated
        );

        while self.frame < self.config.max_frames {
            if self.step().infected == 0 {
                break;
            }
        }

        if let Some(last) = self.history.last() {
            debug!(
                "agent epidemic finished after {} frames: S {} I {} R {} D {}",
                self.frame, last.susceptible, last.infected, last.recovered, last.dead
            );
        }

        EpidemicRun {
            history: self.history,
            frames: self.frames,
        }
    }

    fn spread_infection(&mut self) {
        let reach = self.config.infection_distance;

        for i in 0..self.agents.len() {
            if self.agents[i].health != HealthState::Infected {
                continue;
            }
            self.agents[i].infected_frames += 1;

            for j in 0..self.agents.len() {
                if i == j || self.agents[i].distance(&self.agents[j]) >= reach {
                    continue;
                }
                let probability = match self.agents[j].health {
                    HealthState::Susceptible => self.config.infect_prob,
                    HealthState::Recovered => self.config.reinfect_prob,
                    _ => continue,
                };
                if self.rng.random::<f64>() < probability {
                    let target = &mut self.agents[j];
                    if target.health == HealthState::Recovered {
                        target.infected_frames = 0;
                    }
                    target.health = HealthState::Infected;
                }
            }
        }
    }

    fn progress_infections(&mut self) {
        for agent in &mut self.agents {
            if agent.health == HealthState::Infected && agent.infected_frames >= self.config.infectious_period {
                agent.health = if self.rng.random::<f64>() < self.config.death_prob {
                    HealthState::Dead
                } else {
                    HealthState::Recovered
                };
            }
        }
    }

    fn count(&self) -> EpidemicCounts {
        let mut counts = EpidemicCounts::default();
        for agent in &self.agents {
            match agent.health {
                HealthState::Susceptible => counts.susceptible += 1,
                HealthState::Infected => counts.infected += 1,
                HealthState::Recovered => counts.recovered += 1,
                HealthState::Dead => {}
            }
        }
        counts.dead = self.config.num_agents - (counts.susceptible + counts.infected + counts.recovered);
        counts
    }

    fn snapshot(&self) -> AgentFrame {
        AgentFrame {
            frame: self.frame,
            positions: self.agents.iter().map(|a| a.position).collect(),
            health: self.agents.iter().map(|a| a.health).collect(),
        }
    }
}

/// Run one agent-based epidemic
pub fn run_epidemic(config: &AgentConfig) -> Result<EpidemicRun> {
    Ok(AgentSimulation::new(config.clone())?.run())
}
