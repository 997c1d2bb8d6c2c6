//! Stochastic and agent-based runs loaded from JSON

use biosim_rs::agents::{AgentConfig, HealthState, run_epidemic};
use biosim_rs::config::{ToggleSwitchConfig, load_json};
use biosim_rs::stochastic::{ToggleSwitch, late_time_summary, run_sampled_ensemble};

fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn test_toggle_switch_sweep_from_file() {
    let (_dir, path) = write_config(r#"{ "alphas": [5, 500], "t_end": 5, "runs": 10, "num_points": 51, "seed": 3 }"#);
    let config: ToggleSwitchConfig = load_json(&path).unwrap();
    assert_eq!(config.beta, 4.0);

    let summaries: Vec<_> = config
        .alphas
        .iter()
        .map(|&alpha| {
            let switch = ToggleSwitch {
                alpha,
                beta: config.beta,
                delta: config.delta,
            };
            let statistics =
                run_sampled_ensemble(&switch, &config.u0, config.t_end, config.runs, config.seed, config.num_points)
                    .unwrap();
            assert_eq!(statistics.times.len(), 51);
            assert_eq!(statistics.runs, 10);
            assert_eq!(statistics.mean[0][0], 5.0);
            assert_eq!(statistics.std[0][0], 0.0);
            late_time_summary(&statistics)
        })
        .collect();

    let (weak, strong) = (&summaries[0], &summaries[1]);
    // The head start of the first gene locks it on for large alpha
    assert!(strong[0].mean > 300.0, "N1 = {}", strong[0].mean);
    assert!(strong[1].mean < 5.0, "N2 = {}", strong[1].mean);
    assert!(weak[0].mean < 10.0, "N1 = {}", weak[0].mean);
}

#[test]
fn test_agent_epidemic_from_file() {
    let (_dir, path) = write_config(
        r#"{
            "width": 200, "height": 200, "num_agents": 60, "infected_fraction": 0.1,
            "infect_prob": 1.0, "infectious_period": 20, "death_prob": 0.2,
            "frames_per_second": 10, "max_frames": 4000, "seed": 11
        }"#,
    );
    let config: AgentConfig = load_json(&path).unwrap();
    assert_eq!(config.radius, 5.0);
    assert_eq!(config.initial_infected(), 6);

    let run = run_epidemic(&config).unwrap();
    let history = &run.history;
    let last = history.last().unwrap();

    assert!(history.counts.iter().all(|c| c.total() == 60));
    assert!(last.recovered + last.dead > 6, "the infection never spread: {:?}", last);
    let (_, peak) = history.peak_infected().unwrap();
    assert!(peak >= 6);
    assert_eq!(history.days().len(), history.len());
    assert!(run.frames.is_empty());
}

#[test]
fn test_no_transmission_only_removes_initial_cases() {
    let config = AgentConfig {
        width: 200.0,
        height: 200.0,
        num_agents: 60,
        infected_fraction: 0.1,
        infect_prob: 0.0,
        infectious_period: 20,
        frames_per_second: 10.0,
        seed: 5,
        ..AgentConfig::default()
    };
    let run = run_epidemic(&config).unwrap();
    let last = run.history.last().unwrap();

    assert_eq!(run.history.len(), 20);
    assert_eq!(last.get(HealthState::Susceptible), 54);
    assert_eq!(last.recovered + last.dead, 6);
    assert_eq!(last.infected, 0);
}
