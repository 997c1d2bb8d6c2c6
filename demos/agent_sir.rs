//! Example: particle-based SIR epidemic
//!
//! Agents bounce around a box, collide elastically and infect each other
//! within the infection distance. A share of the population can be
//! isolated (immobile and heavy). The run stops when nobody is infected.
//!
//! Usage:
//!
//! ```bash
//! cargo run --release --example agent_sir [data/agents.json]
//! ```
//!
//! Outputs: the S/I/R/D curves, a CSV of the counts and, when
//! `snapshot_every` is set, an animated GIF of the box.

use std::time::Instant;

use biosim_rs::{
    agents::{AgentConfig, HealthState, run_epidemic},
    config::load_json,
    output::{PlotConfig, export_time_series_csv, plot_time_series, render_agents_gif},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("═══════════════════════════════════════════════════════");
    println!("  Agent-Based SIR Epidemic");
    println!("═══════════════════════════════════════════════════════\n");

    let config: AgentConfig = match std::env::args().nth(1) {
        Some(path) => load_json(path)?,
        None => AgentConfig {
            snapshot_every: 24,
            ..AgentConfig::default()
        },
    };

    println!("Parameters:");
    println!("  Box            : {} × {}", config.width, config.height);
    println!("  Agents         : {} ({} infected)", config.num_agents, config.initial_infected());
    println!("  Isolated       : {:.0} %", config.isolated * 100.0);
    println!("  Infection prob : {}", config.infect_prob);
    println!("  Death prob     : {}\n", config.death_prob);

    let start = Instant::now();
    let run = run_epidemic(&config)?;
    let history = &run.history;
    let last = history.last().ok_or("Empty history")?;

    println!("✓ {} frames in {:.2}s", history.len(), start.elapsed().as_secs_f64());
    println!(
        "  Final   : S {} I {} R {} D {}",
        last.susceptible, last.infected, last.recovered, last.dead
    );
    if let Some((frame, peak)) = history.peak_infected() {
        println!("  Peak    : {} infected on day {:.1}", peak, frame as f64 / config.steps_per_day as f64);
    }

    // ====== Curves and table ======

    let tmp_dir = std::env::temp_dir();
    let days = history.days();
    let series: Vec<Vec<f64>> = [
        HealthState::Susceptible,
        HealthState::Infected,
        HealthState::Recovered,
        HealthState::Dead,
    ]
    .iter()
    .map(|&state| history.series(state))
    .collect();
    let labels = ["Susceptible", "Infected", "Recovered", "Dead"];

    let path = tmp_dir.join("agent_sir.png");
    plot_time_series(
        &days,
        &series,
        &labels,
        path.to_str().ok_or("Invalid path")?,
        Some(&PlotConfig::epidemic(format!("Isolation {:.0} %", config.isolated * 100.0))),
    )?;

    let csv_path = tmp_dir.join("agent_sir.csv");
    export_time_series_csv(&days, &series, &labels, csv_path.to_str().ok_or("Invalid path")?, None)?;
    println!("\n✓ Curves saved to {} and {}", path.display(), csv_path.display());

    // ====== Animation ======

    if !run.frames.is_empty() {
        let gif_path = tmp_dir.join("agent_sir.gif");
        render_agents_gif(
            &run.frames,
            (config.width as u32, config.height as u32),
            config.radius,
            Some(history),
            gif_path.to_str().ok_or("Invalid path")?,
            50,
        )?;
        println!("✓ {} frames animated in {}", run.frames.len(), gif_path.display());
    }

    Ok(())
}
