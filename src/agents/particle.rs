//! Discs moving in a box: placement, elastic collisions, wall bounces

use rand::Rng;

use super::{AgentConfig, HealthState};
use crate::error::{Result, SimulationError};

/// Placement attempts per agent before giving up
const MAX_PLACEMENT_ATTEMPTS: usize = 10_000;

/// Separation overshoot applied when resolving overlaps
const SEPARATION_FACTOR: f64 = 1.1;

#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub position: [f64; 2],
    pub velocity: [f64; 2],
    pub radius: f64,
    pub mass: f64,
    pub isolated: bool,
    pub health: HealthState,
    /// Frames spent infected
    pub infected_frames: usize,
}

impl Agent {
    pub fn distance(&self, other: &Agent) -> f64 {
        let dx = self.position[0] - other.position[0];
        let dy = self.position[1] - other.position[1];
        dx.hypot(dy)
    }

    pub fn advance(&mut self, dt: f64) {
        self.position[0] += self.velocity[0] * dt;
        self.position[1] += self.velocity[1] * dt;
    }

    /// Reverse the velocity component heading out through a wall
    pub fn bounce(&mut self, size: [f64; 2]) {
        for axis in 0..2 {
            let (s, v) = (self.position[axis], self.velocity[axis]);
            if (s < self.radius && v < 0.0) || (s + self.radius > size[axis] && v > 0.0) {
                self.velocity[axis] = -v;
            }
        }
    }

    pub fn momentum(&self) -> [f64; 2] {
        [self.mass * self.velocity[0], self.mass * self.velocity[1]]
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * (self.velocity[0].powi(2) + self.velocity[1].powi(2))
    }
}

fn random_agent<R: Rng>(config: &AgentConfig, id: usize, rng: &mut R) -> Agent {
    let position = [
        rng.random_range(0.0..config.width - 1.0),
        rng.random_range(0.0..config.height - 1.0),
    ];
    let isolated = (id as f64) < config.num_agents as f64 * config.isolated;

    let (mass, velocity) = if isolated {
        (config.isolated_mass, [0.0, 0.0])
    } else {
        let angle = rng.random_range(0.0..std::f64::consts::TAU);
        (config.mass, [config.speed * angle.cos(), config.speed * angle.sin()])
    };

    Agent {
        position,
        velocity,
        radius: config.radius,
        mass,
        isolated,
        health: HealthState::Susceptible,
        infected_frames: 0,
    }
}

/// Place `config.num_agents` non-overlapping agents uniformly in the box
pub fn place_agents<R: Rng>(config: &AgentConfig, rng: &mut R) -> Result<Vec<Agent>> {
    let mut agents: Vec<Agent> = Vec::with_capacity(config.num_agents);

    for id in 0..config.num_agents {
        let placed = (0..MAX_PLACEMENT_ATTEMPTS)
            .map(|_| random_agent(config, id, rng))
            .find(|candidate| agents.iter().all(|a| a.distance(candidate) >= a.radius + candidate.radius));

        match placed {
            Some(agent) => agents.push(agent),
            None => {
                return Err(SimulationError::InvalidScenario(format!(
                    "Could not place agent {} of {} without overlap in a {}x{} box",
                    id + 1,
                    config.num_agents,
                    config.width,
                    config.height
                )));
            }
        }
    }

    Ok(agents)
}

/// Separate two overlapping agents and exchange momentum along their normal
///
/// Returns `false` when the agents do not touch.
pub fn collide(a: &mut Agent, b: &mut Agent) -> bool {
    let d = a.distance(b);
    let reach = a.radius + b.radius;
    if d > reach {
        return false;
    }

    let normal = if d > 0.0 {
        [(a.position[0] - b.position[0]) / d, (a.position[1] - b.position[1]) / d]
    } else {
        [1.0, 0.0]
    };
    let tangent = [-normal[1], normal[0]];
    let total_mass = a.mass + b.mass;

    let push_a = SEPARATION_FACTOR * (reach - d) * b.mass / total_mass;
    let push_b = SEPARATION_FACTOR * (reach - d) * a.mass / total_mass;
    for axis in 0..2 {
        a.position[axis] += normal[axis] * push_a;
        b.position[axis] -= normal[axis] * push_b;
    }

    let dot = |u: [f64; 2], v: [f64; 2]| u[0] * v[0] + u[1] * v[1];
    let (an, at) = (dot(normal, a.velocity), dot(tangent, a.velocity));
    let (bn, bt) = (dot(normal, b.velocity), dot(tangent, b.velocity));

    let an_after = (an * (a.mass - b.mass) + 2.0 * b.mass * bn) / total_mass;
    let bn_after = (bn * (b.mass - a.mass) + 2.0 * a.mass * an) / total_mass;

    for axis in 0..2 {
        a.velocity[axis] = normal[axis] * an_after + tangent[axis] * at;
        b.velocity[axis] = normal[axis] * bn_after + tangent[axis] * bt;
    }
    true
}

/// Resolve every touching pair once, in index order
pub fn resolve_collisions(agents: &mut [Agent]) -> usize {
    let mut collisions = 0;
    for i in 0..agents.len() {
        let (head, tail) = agents.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail.iter_mut() {
            if collide(a, b) {
                collisions += 1;
            }
        }
    }
    collisions
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn disc(x: f64, y: f64, vx: f64, vy: f64, mass: f64) -> Agent {
        Agent {
            position: [x, y],
            velocity: [vx, vy],
            radius: 5.0,
            mass,
            isolated: false,
            health: HealthState::Susceptible,
            infected_frames: 0,
        }
    }

    #[test]
    fn test_head_on_equal_masses_swap_velocities() {
        let mut a = disc(0.0, 0.0, 1.0, 0.0, 0.1);
        let mut b = disc(9.0, 0.0, -1.0, 0.0, 0.1);
        assert!(collide(&mut a, &mut b));

        assert_relative_eq!(a.velocity[0], -1.0, epsilon = 1e-12);
        assert_relative_eq!(b.velocity[0], 1.0, epsilon = 1e-12);
        assert!(a.distance(&b) >= 10.0);
    }

    #[test]
    fn test_oblique_collision_conserves_momentum_and_energy() {
        let mut a = disc(0.0, 0.0, 3.0, 1.0, 0.1);
        let mut b = disc(6.0, 7.0, -2.0, 0.5, 0.4);
        let p0 = [a.momentum()[0] + b.momentum()[0], a.momentum()[1] + b.momentum()[1]];
        let e0 = a.kinetic_energy() + b.kinetic_energy();

        assert!(collide(&mut a, &mut b));

        assert_relative_eq!(a.momentum()[0] + b.momentum()[0], p0[0], epsilon = 1e-12);
        assert_relative_eq!(a.momentum()[1] + b.momentum()[1], p0[1], epsilon = 1e-12);
        assert_relative_eq!(a.kinetic_energy() + b.kinetic_energy(), e0, epsilon = 1e-12);
    }

    #[test]
    fn test_apart_agents_do_not_collide() {
        let mut a = disc(0.0, 0.0, 1.0, 0.0, 0.1);
        let mut b = disc(20.0, 0.0, -1.0, 0.0, 0.1);
        assert!(!collide(&mut a, &mut b));
        assert_eq!(a.velocity, [1.0, 0.0]);
    }

    #[test]
    fn test_bounce() {
        let mut agent = disc(2.0, 250.0, -5.0, 3.0, 0.1);
        agent.bounce([500.0, 500.0]);
        assert_eq!(agent.velocity, [5.0, 3.0]);

        // Already heading back inside
        agent.bounce([500.0, 500.0]);
        assert_eq!(agent.velocity, [5.0, 3.0]);

        let mut agent = disc(250.0, 498.0, 0.0, 4.0, 0.1);
        agent.bounce([500.0, 500.0]);
        assert_eq!(agent.velocity, [0.0, -4.0]);
    }

    #[test]
    fn test_placement() {
        let config = AgentConfig {
            num_agents: 100,
            isolated: 0.25,
            ..AgentConfig::default()
        };
        let agents = place_agents(&config, &mut StdRng::seed_from_u64(5)).unwrap();

        assert_eq!(agents.len(), 100);
        assert_eq!(agents.iter().filter(|a| a.isolated).count(), 25);
        assert!(agents.iter().filter(|a| a.isolated).all(|a| a.velocity == [0.0, 0.0] && a.mass == 100.0));
        for (i, a) in agents.iter().enumerate() {
            for b in &agents[i + 1..] {
                assert!(a.distance(b) >= 10.0);
            }
        }
    }

    #[test]
    fn test_placement_fails_when_crowded() {
        let config = AgentConfig {
            width: 120.0,
            height: 120.0,
            radius: 50.0,
            num_agents: 10,
            ..AgentConfig::default()
        };
        assert!(place_agents(&config, &mut StdRng::seed_from_u64(1)).is_err());
    }
}
