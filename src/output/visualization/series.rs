//! Line plots against time
//!
//! - [`plot_time_series`]: one line per series on a shared time axis
//! - [`plot_result_series`]: components of a [`SimulationResult`] quantity
//! - [`plot_ensemble`]: ensemble means with ±1 standard deviation bands

use std::error::Error;
use std::path::Path;

use plotters::prelude::*;

use super::config::{NO_TITLE, PlotConfig};
use crate::physics::PhysicalQuantity;
use crate::solver::SimulationResult;
use crate::stochastic::EnsembleStatistics;

pub(crate) fn is_svg(path: &str) -> bool {
    Path::new(path).extension().and_then(|s| s.to_str()) == Some("svg")
}

/// Finite min and max of all values, widened when they coincide
pub(crate) fn value_range<'a>(values: impl Iterator<Item = &'a f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    if hi - lo < 1e-12 {
        let pad = lo.abs().max(1.0) * 0.05;
        return (lo - pad, hi + pad);
    }
    let pad = 0.05 * (hi - lo);
    (lo - pad, hi + pad)
}

/// Plot several series sharing a time axis
///
/// `.svg` paths produce vector output, anything else a bitmap.
pub fn plot_time_series(
    time: &[f64],
    series: &[Vec<f64>],
    labels: &[&str],
    output_path: &str,
    config: Option<&PlotConfig>,
) -> Result<(), Box<dyn Error>> {
    if time.is_empty() || series.is_empty() {
        return Err("No data to plot".into());
    }
    if let Some(bad) = series.iter().position(|s| s.len() != time.len()) {
        return Err(format!("Series {} has {} values for {} times", bad, series[bad].len(), time.len()).into());
    }

    let default_config = PlotConfig::time_series(NO_TITLE);
    let config = config.unwrap_or(&default_config);

    if is_svg(output_path) {
        let backend = SVGBackend::new(output_path, (config.width, config.height));
        plot_lines_impl(backend, time, series, labels, config)
    } else {
        let backend = BitMapBackend::new(output_path, (config.width, config.height));
        plot_lines_impl(backend, time, series, labels, config)
    }
}

/// Plot selected components of one quantity of a simulation result
pub fn plot_result_series(
    result: &SimulationResult,
    quantity: PhysicalQuantity,
    components: &[usize],
    labels: &[&str],
    output_path: &str,
    config: Option<&PlotConfig>,
) -> Result<(), Box<dyn Error>> {
    let series = components
        .iter()
        .map(|&c| {
            result
                .series(quantity, c)
                .ok_or_else(|| format!("Component {} of {} is missing from the trajectory", c, quantity))
        })
        .collect::<Result<Vec<_>, _>>()?;

    plot_time_series(&result.time_points, &series, labels, output_path, config)
}

/// Plot ensemble means with a shaded ±1 std band per species
pub fn plot_ensemble(
    statistics: &EnsembleStatistics,
    labels: &[&str],
    output_path: &str,
    config: Option<&PlotConfig>,
) -> Result<(), Box<dyn Error>> {
    if statistics.times.is_empty() || statistics.mean.is_empty() {
        return Err("No ensemble statistics to plot".into());
    }

    let default_config = PlotConfig::time_series(NO_TITLE);
    let config = config.unwrap_or(&default_config);

    if is_svg(output_path) {
        let backend = SVGBackend::new(output_path, (config.width, config.height));
        plot_ensemble_impl(backend, statistics, labels, config)
    } else {
        let backend = BitMapBackend::new(output_path, (config.width, config.height));
        plot_ensemble_impl(backend, statistics, labels, config)
    }
}

fn plot_lines_impl<DB: DrawingBackend>(
    backend: DB,
    time: &[f64],
    series: &[Vec<f64>],
    labels: &[&str],
    config: &PlotConfig,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let root = backend.into_drawing_area();
    root.fill(&config.background)?;

    let (t0, t1) = value_range(time.iter());
    let (y0, y1) = value_range(series.iter().flatten());

    let mut chart = ChartBuilder::on(&root)
        .caption(&config.title, ("sans-serif", 32).into_font())
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(t0..t1, y0..y1)?;

    let mut mesh = chart.configure_mesh();
    mesh.x_desc(&config.xlabel).y_desc(&config.ylabel);
    if !config.show_grid {
        mesh.disable_mesh();
    }
    mesh.draw()?;

    for (k, values) in series.iter().enumerate() {
        let color = config.get_species_color(k);
        let drawn = chart.draw_series(LineSeries::new(
            time.iter().zip(values.iter()).map(|(t, v)| (*t, *v)),
            ShapeStyle::from(&color).stroke_width(config.line_width),
        ))?;
        if let Some(label) = labels.get(k) {
            drawn
                .label(*label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }
    }

    if !labels.is_empty() {
        chart
            .configure_series_labels()
            .background_style(config.background.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

fn plot_ensemble_impl<DB: DrawingBackend>(
    backend: DB,
    statistics: &EnsembleStatistics,
    labels: &[&str],
    config: &PlotConfig,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let root = backend.into_drawing_area();
    root.fill(&config.background)?;

    let times = &statistics.times;
    let lower: Vec<Vec<f64>> = statistics
        .mean
        .iter()
        .zip(&statistics.std)
        .map(|(m, s)| m.iter().zip(s).map(|(m, s)| m - s).collect())
        .collect();
    let upper: Vec<Vec<f64>> = statistics
        .mean
        .iter()
        .zip(&statistics.std)
        .map(|(m, s)| m.iter().zip(s).map(|(m, s)| m + s).collect())
        .collect();

    let (t0, t1) = value_range(times.iter());
    let (y0, y1) = value_range(lower.iter().chain(upper.iter()).flatten());

    let mut chart = ChartBuilder::on(&root)
        .caption(&config.title, ("sans-serif", 32).into_font())
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(t0..t1, y0..y1)?;

    let mut mesh = chart.configure_mesh();
    mesh.x_desc(&config.xlabel).y_desc(&config.ylabel);
    if !config.show_grid {
        mesh.disable_mesh();
    }
    mesh.draw()?;

    for (k, mean) in statistics.mean.iter().enumerate() {
        let color = config.get_species_color(k);

        let band: Vec<(f64, f64)> = times
            .iter()
            .zip(&upper[k])
            .map(|(t, v)| (*t, *v))
            .chain(times.iter().zip(&lower[k]).rev().map(|(t, v)| (*t, *v)))
            .collect();
        chart.draw_series(std::iter::once(Polygon::new(band, color.mix(0.2).filled())))?;

        let drawn = chart.draw_series(LineSeries::new(
            times.iter().zip(mean).map(|(t, v)| (*t, *v)),
            ShapeStyle::from(&color).stroke_width(config.line_width),
        ))?;
        if let Some(label) = labels.get(k) {
            drawn
                .label(*label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }
    }

    if !labels.is_empty() {
        chart
            .configure_series_labels()
            .background_style(config.background.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}
