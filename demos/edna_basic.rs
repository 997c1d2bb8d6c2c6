//! Example: eDNA shed by migrating zooplankton
//!
//! Two populations perform opposite diel vertical migrations between 100 m
//! and 500 m. Their eDNA is shed as large fragments, broken down into small
//! ones, advected downwards and decayed at depth-dependent summer rates.
//!
//! Usage:
//!
//! ```bash
//! cargo run --release --example edna_basic [data/edna_basic.json]
//! ```
//!
//! Outputs (in the system temporary directory):
//! - `edna_source.png`: the combined one-day source pattern
//! - `edna_concentration.png`: log10 of large + small eDNA, 0-600 m
//! - `edna_concentration.csv`: the same matrix, one row per stored time

use std::time::Instant;

use biosim_rs::{
    config::EdnaRunConfig,
    models::edna::{grid::SECONDS_PER_DAY, total_concentration},
    output::{
        CsvConfig, HeatmapOptions, PlotConfig, export_matrix_csv, plot_depth_time_heatmap,
        visualization::pattern_matrix,
    },
    solver::{EulerSolver, Scenario, Solver},
};

/// Keep one state every ten minutes of simulated time
const RECORD_SECONDS: f64 = 600.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("═══════════════════════════════════════════════════════");
    println!("  eDNA Vertical Transport (DVM source)");
    println!("═══════════════════════════════════════════════════════\n");

    let path = std::env::args().nth(1).unwrap_or_else(|| "data/edna_basic.json".to_string());
    let config = EdnaRunConfig::load(&path)?;
    let setup = &config.setup;

    let transport = config.build_transport()?;
    let reference = transport.clone();
    let grid = transport.grid().clone();

    println!("Configuration: {}", path);
    println!("  Days           : {}", setup.days);
    println!("  Column         : 0 - {} m, dz = {} m ({} cells)", grid.z_max(), grid.dz(), grid.len());
    println!("  Time step      : {} s ({} steps)", setup.dt, setup.total_steps());
    println!("  Season         : {}", config.transport.season);
    println!("  Diffusion      : {}", config.transport.diffusion);
    println!("  Prey patterns  : {}", config.prey.len());

    let stable = transport.stable_time_step();
    if setup.dt > stable {
        println!("  ⚠ dt = {} s exceeds the explicit stability limit {:.1} s", setup.dt, stable);
    } else {
        println!("  Stability limit: {:.1} s", stable);
    }

    // ====== Source pattern ======

    let tmp_dir = std::env::temp_dir();
    let source = pattern_matrix(transport.source());
    let source_times: Vec<f64> = (0..source.nrows()).map(|i| i as f64 / source.nrows() as f64).collect();
    let path = tmp_dir.join("edna_source.png");
    plot_depth_time_heatmap(
        &source,
        &source_times,
        grid.depths(),
        path.to_str().ok_or("Invalid path")?,
        Some(&PlotConfig::depth_time("Source pattern")),
        &HeatmapOptions {
            log10: false,
            depth_range: Some((0.0, 600.0)),
            colorbar_label: "Intensity".to_string(),
            ..HeatmapOptions::default()
        },
    )?;
    println!("\n✓ Source pattern saved to {}", path.display());

    // ====== Simulation ======

    let stride = ((RECORD_SECONDS / setup.dt).round() as usize).max(1);
    let solver_config = setup.solver_configuration().recording_every(stride);

    println!("\nRunning forward Euler...");
    let start = Instant::now();
    let result = EulerSolver::new().solve(&Scenario::from_model(Box::new(transport)), &solver_config)?;
    println!("✓ {} states stored in {:.2} s", result.len(), start.elapsed().as_secs_f64());

    let end_time = result.time_points.last().copied().unwrap_or(0.0);
    let budget = reference.mass_budget(&result.final_state, end_time)?;
    println!("\nColumn budget at t = {:.2} days:", end_time / SECONDS_PER_DAY);
    println!("  Inventory      : {:.4e}", budget.total_mass);
    println!("  Shedding rate  : {:.4e} /s", budget.production_rate);
    println!("  Decay rate     : {:.4e} /s", budget.decay_rate);

    // ====== Concentration heatmap and table ======

    let total = total_concentration(&result).ok_or("Result holds no eDNA")?;
    let days: Vec<f64> = result.time_points.iter().map(|t| t / SECONDS_PER_DAY).collect();

    let path = tmp_dir.join("edna_concentration.png");
    plot_depth_time_heatmap(
        &total,
        &days,
        grid.depths(),
        path.to_str().ok_or("Invalid path")?,
        Some(&PlotConfig::depth_time("eDNA concentration")),
        &HeatmapOptions {
            value_range: Some((-1.0, 2.0)),
            depth_range: Some((0.0, 600.0)),
            ..HeatmapOptions::default()
        },
    )?;
    println!("\n✓ Concentration heatmap saved to {}", path.display());

    let path = tmp_dir.join("edna_concentration.csv");
    export_matrix_csv(
        &total,
        &days,
        grid.depths(),
        path.to_str().ok_or("Invalid path")?,
        Some(&CsvConfig::default().time_header("Day")),
    )?;
    println!("✓ Concentration table saved to {}", path.display());

    Ok(())
}
