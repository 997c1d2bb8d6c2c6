//! Example: predators feeding on migrating copepods
//!
//! The copepod population splits between a 50-200 m migration and a
//! resident layer at 200 m. A predator population living near 40-55 m eats
//! the eDNA it overlaps with, digests it for 6.5 h and then releases it back
//! into the water at its own depth. The same column is run with and without
//! predators.
//!
//! Usage:
//!
//! ```bash
//! cargo run --release --example edna_predator [data/edna_predator.json]
//! ```

use std::sync::Arc;
use std::time::Instant;

use biosim_rs::{
    config::EdnaRunConfig,
    models::edna::{center_depth_trajectory, dvm, grid::SECONDS_PER_DAY, total_concentration},
    output::{HeatmapOptions, PlotConfig, plot_depth_time_heatmap, plot_time_series},
    solver::{EulerSolver, Scenario, Solver},
};

const RECORD_SECONDS: f64 = 600.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("═══════════════════════════════════════════════════════");
    println!("  eDNA Transport with Predation");
    println!("═══════════════════════════════════════════════════════\n");

    let path = std::env::args().nth(1).unwrap_or_else(|| "data/edna_predator.json".to_string());
    let config = EdnaRunConfig::load(&path)?;
    let predator = config
        .build_predator_transport()?
        .ok_or("The configuration has no predator section")?;
    let predator = Arc::new(predator);
    let plain = config.build_transport()?;
    let reference = plain.clone();
    let grid = plain.grid().clone();
    let parameters = *predator.parameters();

    println!("Configuration: {}", path);
    println!("  Days           : {}", config.setup.days);
    println!("  Cells          : {} (dz = {} m)", grid.len(), grid.dz());
    println!("  Efficiency     : {} /s", parameters.efficiency);
    println!("  Digestion      : {} h", parameters.digestion_hours);
    println!("  Release rate   : {} /h", parameters.release_per_hour);

    let stride = ((RECORD_SECONDS / config.setup.dt).round() as usize).max(1);
    let solver_config = config.setup.solver_configuration().recording_every(stride);
    let solver = EulerSolver::new();

    // ====== Both runs ======

    let start = Instant::now();
    let without = solver.solve(&Scenario::from_model(Box::new(plain)), &solver_config)?;
    println!("\n✓ Without predators: {:.2} s", start.elapsed().as_secs_f64());

    let start = Instant::now();
    let with = solver.solve(&Scenario::from_model(Box::new(Arc::clone(&predator))), &solver_config)?;
    println!("✓ With predators   : {:.2} s", start.elapsed().as_secs_f64());

    let end_time = with.time_points.last().copied().unwrap_or(0.0);
    let water_without = reference.mass_budget(&without.final_state, end_time)?.total_mass;
    let water_with = reference.mass_budget(&with.final_state, end_time)?.total_mass;
    let stomach = predator.stomach();
    let (undigested_large, undigested_small) = stomach.undigested();
    let (digesting_large, digesting_small) = stomach.digesting();

    println!("\nInventory at t = {:.2} days:", end_time / SECONDS_PER_DAY);
    println!("  Water, no predators   : {:.4e}", water_without);
    println!("  Water, with predators : {:.4e}", water_with);
    println!("  Stomach               : {:.4e} ({} meals waiting)", stomach.total_mass(), stomach.meals());
    println!("    undigested (L, S)   : ({:.3e}, {:.3e})", undigested_large, undigested_small);
    println!("    releasing  (L, S)   : ({:.3e}, {:.3e})", digesting_large, digesting_small);
    if water_without > 0.0 {
        println!("  Removed from water    : {:.1} %", 100.0 * (1.0 - water_with / water_without));
    }

    // ====== Heatmaps ======

    let tmp_dir = std::env::temp_dir();
    let days: Vec<f64> = with.time_points.iter().map(|t| t / SECONDS_PER_DAY).collect();
    let options = HeatmapOptions {
        value_range: Some((-1.0, 2.0)),
        depth_range: Some((0.0, 600.0)),
        ..HeatmapOptions::default()
    };

    for (label, result) in [("without", &without), ("with", &with)] {
        let total = total_concentration(result).ok_or("Result holds no eDNA")?;
        let path = tmp_dir.join(format!("edna_{}_predators.png", label));
        plot_depth_time_heatmap(
            &total,
            &days,
            grid.depths(),
            path.to_str().ok_or("Invalid path")?,
            Some(&PlotConfig::depth_time(format!("eDNA {} predators", label))),
            &options,
        )?;
        println!("\n✓ Heatmap saved to {}", path.display());
    }

    // ====== Where prey and predators are during the day ======

    let prey_depth = center_depth_trajectory(reference.source(), &grid);
    let hours: Vec<f64> = (0..prey_depth.len())
        .map(|i| 24.0 * i as f64 / prey_depth.len() as f64)
        .collect();
    let predator_config = config.predator.as_ref().ok_or("The configuration has no predator section")?;
    let predator_pattern = dvm(&grid, prey_depth.len(), &predator_config.patterns[0].spec);
    let predator_depth = center_depth_trajectory(&predator_pattern, &grid);

    let mut plot = PlotConfig::time_series("Layer centres");
    plot.xlabel = "Hour".to_string();
    plot.ylabel = "Depth (m)".to_string();
    let path = tmp_dir.join("edna_layer_centres.png");
    plot_time_series(
        &hours,
        &[prey_depth, predator_depth],
        &["Prey (strongest layer)", "Predator"],
        path.to_str().ok_or("Invalid path")?,
        Some(&plot),
    )?;
    println!("✓ Layer centres saved to {}", path.display());

    Ok(())
}
