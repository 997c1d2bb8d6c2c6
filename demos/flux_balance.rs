//! Example: flux balance analysis of a toy network
//!
//! Maximises the biomass flux of the textbook network subject to S·v = 0
//! and flux bounds, then runs flux variability analysis at 90 % of the
//! optimum and single-reaction knockouts.

use biosim_rs::models::flux_balance::{FluxStatus, flux_table, textbook_network};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("═══════════════════════════════════════════════════════");
    println!("  Flux Balance Analysis");
    println!("═══════════════════════════════════════════════════════\n");

    let network = textbook_network()?;
    println!(
        "Network: {} metabolites, {} reactions\n",
        network.metabolites().len(),
        network.reactions().len()
    );

    // ====== Optimum ======

    let solution = network.optimize()?;
    println!("Status          : {:?}", solution.status);
    println!("Biomass flux    : {:.4}", solution.objective_value);
    println!("‖S·v‖∞          : {:.2e}\n", network.mass_balance_residual(&solution.fluxes));

    let table = flux_table(&network, &solution);
    println!("{:<10} {:>10} {:>10} {:>10}", "Reaction", "Flux", "Min(90%)", "Max(90%)");
    println!("{:-<43}", "");

    // ====== Flux variability ======

    let ranges = network.flux_variability(0.9)?;
    for (name, range) in network.reactions().iter().zip(&ranges) {
        println!(
            "{:<10} {:>10.4} {:>10.4} {:>10.4}",
            name, table[name], range.minimum, range.maximum
        );
    }

    // ====== Knockouts ======

    println!("\nSingle knockouts:");
    for name in network.reactions() {
        let mutant = network.knockout(name)?.optimize()?;
        let growth = match mutant.status {
            FluxStatus::Optimal => format!("{:.4}", mutant.objective_value),
            FluxStatus::Infeasible => "infeasible".to_string(),
        };
        println!("  Δ{:<9} biomass {}", name, growth);
    }

    Ok(())
}
