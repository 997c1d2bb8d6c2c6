//! Example: Forward Euler vs Runge-Kutta 4 on dx/dt = 1 - x
//!
//! Solves the relaxation equation from x(0) = 0 up to t = 10 with both
//! methods for step sizes 0.1, 0.2, ..., 1.5 and compares them with the
//! exact solution x(t) = 1 - e^{-t}.
//!
//! Outputs (in the system temporary directory):
//! - `relaxation_dt_0.5.png`: both numerical solutions and the exact curve
//! - `relaxation_errors.png`: maximum error against step size
//! - `relaxation_errors.csv`: the same table

use biosim_rs::{
    models::Relaxation,
    output::{CsvConfig, PlotConfig, export_time_series_csv, plot_time_series},
    physics::PhysicalQuantity,
    solver::{
        EulerSolver, RK4Solver, Scenario, Solver, SolverConfiguration,
        convergence::{AnalyticalSolution, compare_methods, default_step_sweep, observed_order},
    },
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("═══════════════════════════════════════════════════════");
    println!("  Relaxation dx/dt = 1 - x : Euler vs RK4");
    println!("═══════════════════════════════════════════════════════\n");

    let total_time = 10.0;
    let model = Relaxation::new(0.0);
    let tmp_dir = std::env::temp_dir();

    // ====== One step size in detail ======

    let dt = 0.5;
    let config = SolverConfiguration::fixed_step(total_time, dt);
    let euler = EulerSolver::new().solve(&Scenario::from_model(Box::new(model)), &config)?;
    let rk4 = RK4Solver::new().solve(&Scenario::from_model(Box::new(model)), &config)?;

    let exact: Vec<f64> = euler.time_points.iter().map(|&t| model.exact(t)).collect();
    let euler_x = euler.series(PhysicalQuantity::Concentration, 0).ok_or("Euler result has no x")?;
    let rk4_x = rk4.series(PhysicalQuantity::Concentration, 0).ok_or("RK4 result has no x")?;

    let mut plot = PlotConfig::time_series(format!("dx/dt = 1 - x, dt = {}", dt));
    plot.ylabel = "x".to_string();
    let path = tmp_dir.join("relaxation_dt_0.5.png");
    plot_time_series(
        &euler.time_points,
        &[exact, euler_x, rk4_x],
        &["Exact", "Euler", "RK4"],
        path.to_str().ok_or("Invalid path")?,
        Some(&plot),
    )?;
    println!("✓ Solutions saved to {}\n", path.display());

    // ====== Step-size sweep ======

    let sweep = default_step_sweep();
    let study = compare_methods(|| Relaxation::new(0.0), total_time, &sweep)?;

    println!("{:>6} {:>14} {:>14} {:>10}", "dt", "Euler max err", "RK4 max err", "ratio");
    println!("{:-<48}", "");
    for point in &study {
        println!(
            "{:>6.1} {:>14.3e} {:>14.3e} {:>10.1}",
            point.dt,
            point.euler.max_abs,
            point.rk4.max_abs,
            point.euler.max_abs / point.rk4.max_abs
        );
    }

    let (fine, coarse) = (&study[0], &study[1]);
    println!(
        "\nObserved order between dt = {} and {}: Euler {:.2}, RK4 {:.2}",
        coarse.dt,
        fine.dt,
        observed_order(coarse.dt, coarse.euler.max_abs, fine.dt, fine.euler.max_abs),
        observed_order(coarse.dt, coarse.rk4.max_abs, fine.dt, fine.rk4.max_abs)
    );

    // ====== Error plot and table ======

    let dts: Vec<f64> = study.iter().map(|p| p.dt).collect();
    let euler_errors: Vec<f64> = study.iter().map(|p| p.euler.max_abs).collect();
    let rk4_errors: Vec<f64> = study.iter().map(|p| p.rk4.max_abs).collect();

    let mut plot = PlotConfig::time_series("Maximum absolute error");
    plot.xlabel = "dt".to_string();
    plot.ylabel = "max |x - x_exact|".to_string();
    let path = tmp_dir.join("relaxation_errors.png");
    plot_time_series(
        &dts,
        &[euler_errors.clone(), rk4_errors.clone()],
        &["Euler", "RK4"],
        path.to_str().ok_or("Invalid path")?,
        Some(&plot),
    )?;

    let csv_path = tmp_dir.join("relaxation_errors.csv");
    export_time_series_csv(
        &dts,
        &[euler_errors, rk4_errors],
        &["Euler", "RK4"],
        csv_path.to_str().ok_or("Invalid path")?,
        Some(&CsvConfig::high_precision().time_header("dt")),
    )?;

    println!("✓ Errors saved to {} and {}", path.display(), csv_path.display());
    Ok(())
}
