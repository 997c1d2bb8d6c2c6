//! Depth-time heatmaps
//!
//! Time runs to the right and depth downwards. Large matrices are thinned
//! to at most one cell per pixel before drawing.

use std::error::Error;

use nalgebra::DMatrix;
use ndarray::Array2;
use plotters::prelude::*;

use super::config::{NO_TITLE, PlotConfig};
use super::series::is_svg;

/// Colour scaling of a heatmap
#[derive(Debug, Clone)]
pub struct HeatmapOptions {
    /// Colour range after the optional log transform; data range when `None`
    pub value_range: Option<(f64, f64)>,
    pub log10: bool,
    /// With `log10`, cells below this exponent (or non-positive) are left blank
    pub log_floor: f64,
    /// Shown depth window (m)
    pub depth_range: Option<(f64, f64)>,
    /// Fraction of the jet colormap in use, from its blue end
    pub colormap_extent: f64,
    pub colorbar_label: String,
}

impl Default for HeatmapOptions {
    fn default() -> Self {
        Self {
            value_range: None,
            log10: true,
            log_floor: -5.0,
            depth_range: None,
            colormap_extent: 0.65,
            colorbar_label: "Log10(eDNA)".to_string(),
        }
    }
}

/// Jet colormap at `x` in [0, 1]
pub fn jet(x: f64) -> RGBColor {
    let x = x.clamp(0.0, 1.0);
    let channel = |center: f64| ((1.5 - (4.0 * x - center).abs()).clamp(0.0, 1.0) * 255.0).round() as u8;
    RGBColor(channel(3.0), channel(2.0), channel(1.0))
}

/// Jet restricted to `[0, extent]`
pub fn truncated_jet(x: f64, extent: f64) -> RGBColor {
    jet(x.clamp(0.0, 1.0) * extent)
}

/// Convert a `time × depth` pattern to a matrix for plotting
pub fn pattern_matrix(pattern: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(pattern.nrows(), pattern.ncols(), |i, j| pattern[[i, j]])
}

fn transform(value: f64, options: &HeatmapOptions) -> Option<f64> {
    if options.log10 {
        if value > 0.0 {
            Some(value.log10()).filter(|l| *l >= options.log_floor)
        } else {
            None
        }
    } else {
        Some(value).filter(|v| v.is_finite())
    }
}

/// Start and end coordinate of a cell spanning `stride` samples
fn cell_edges(axis: &[f64], index: usize, stride: usize) -> (f64, f64) {
    let n = axis.len();
    let start = axis[index];
    let end = if index + stride < n {
        axis[index + stride]
    } else {
        let step = if n > 1 { axis[n - 1] - axis[n - 2] } else { 1.0 };
        axis[n - 1] + step
    };
    (start, end)
}

/// Plot a `time × depth` matrix
///
/// `times` labels the rows (any unit, usually days) and `depths` the
/// columns.
pub fn plot_depth_time_heatmap(
    values: &DMatrix<f64>,
    times: &[f64],
    depths: &[f64],
    output_path: &str,
    config: Option<&PlotConfig>,
    options: &HeatmapOptions,
) -> Result<(), Box<dyn Error>> {
    if values.nrows() != times.len() || values.ncols() != depths.len() {
        return Err(format!(
            "Heatmap values are {}x{} but axes are {}x{}",
            values.nrows(),
            values.ncols(),
            times.len(),
            depths.len()
        )
        .into());
    }
    if times.is_empty() || depths.is_empty() {
        return Err("No data to plot".into());
    }

    let default_config = PlotConfig::depth_time(NO_TITLE);
    let config = config.unwrap_or(&default_config);

    if is_svg(output_path) {
        let backend = SVGBackend::new(output_path, (config.width, config.height));
        plot_heatmap_impl(backend, values, times, depths, config, options)
    } else {
        let backend = BitMapBackend::new(output_path, (config.width, config.height));
        plot_heatmap_impl(backend, values, times, depths, config, options)
    }
}

fn plot_heatmap_impl<DB: DrawingBackend>(
    backend: DB,
    values: &DMatrix<f64>,
    times: &[f64],
    depths: &[f64],
    config: &PlotConfig,
    options: &HeatmapOptions,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    // ====== Visible window and colour range ======

    let (z_top, z_bottom) = options
        .depth_range
        .unwrap_or((depths[0], depths[depths.len() - 1]));
    let columns: Vec<usize> = (0..depths.len())
        .filter(|&j| depths[j] >= z_top && depths[j] <= z_bottom)
        .collect();
    if columns.is_empty() {
        return Err(format!("No depth inside the window {}..{} m", z_top, z_bottom).into());
    }

    let (vmin, vmax) = match options.value_range {
        Some(range) => range,
        None => {
            let (lo, hi) = columns
                .iter()
                .flat_map(|&j| values.column(j).iter().filter_map(|&v| transform(v, options)).collect::<Vec<_>>())
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
            if lo.is_finite() && hi > lo { (lo, hi) } else { (0.0, 1.0) }
        }
    };
    let color_of = |v: f64| truncated_jet((v - vmin) / (vmax - vmin), options.colormap_extent);

    // ====== Layout ======

    let root = backend.into_drawing_area();
    root.fill(&config.background)?;
    let bar_width = 110.min(config.width / 4);
    let (main, bar) = root.split_horizontally(config.width - bar_width);

    let t_start = times[0];
    let t_end = cell_edges(times, times.len() - 1, 1).1;
    let z_first = columns[0];
    let z_last = columns[columns.len() - 1];
    let (y_low, y_high) = (-cell_edges(depths, z_last, 1).1, -depths[z_first]);

    let mut chart = ChartBuilder::on(&main)
        .caption(&config.title, ("sans-serif", 28).into_font())
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(t_start..t_end, y_low..y_high)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_desc(&config.xlabel)
        .y_desc(&config.ylabel)
        .y_label_formatter(&|y| format!("{:.0}", -y))
        .draw()?;

    // ====== Cells, at most one per pixel ======

    let time_stride = times.len().div_ceil(config.width.max(1) as usize).max(1);
    let depth_stride = columns.len().div_ceil(config.height.max(1) as usize).max(1);

    let cells = (0..times.len()).step_by(time_stride).flat_map(|i| {
        columns.iter().step_by(depth_stride).filter_map(move |&j| {
            let value = transform(values[(i, j)], options)?;
            let (x0, x1) = cell_edges(times, i, time_stride);
            let (z0, z1) = cell_edges(depths, j, depth_stride);
            Some(Rectangle::new([(x0, -z0), (x1, -z1)], color_of(value).filled()))
        })
    });
    chart.draw_series(cells)?;

    // ====== Colour bar ======

    let mut colorbar = ChartBuilder::on(&bar)
        .margin_top(60)
        .margin_bottom(60)
        .margin_right(10)
        .y_label_area_size(55)
        .build_cartesian_2d(0.0..1.0, vmin..vmax)?;

    colorbar
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .disable_x_axis()
        .y_desc(&options.colorbar_label)
        .draw()?;

    let steps = 100;
    let height = (vmax - vmin) / steps as f64;
    colorbar.draw_series((0..steps).map(|k| {
        let v = vmin + k as f64 * height;
        Rectangle::new([(0.0, v), (1.0, v + height)], color_of(v + 0.5 * height).filled())
    }))?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jet_endpoints() {
        assert_eq!(jet(0.0), RGBColor(0, 0, 128));
        assert_eq!(jet(0.5), RGBColor(128, 255, 128));
        assert_eq!(jet(1.0), RGBColor(128, 0, 0));
        assert_eq!(truncated_jet(1.0, 0.5), jet(0.5));
    }

    #[test]
    fn test_log_transform_floor() {
        let options = HeatmapOptions::default();
        assert_eq!(transform(100.0, &options), Some(2.0));
        assert_eq!(transform(1e-6, &options), None);
        assert_eq!(transform(0.0, &options), None);

        let linear = HeatmapOptions {
            log10: false,
            ..HeatmapOptions::default()
        };
        assert_eq!(transform(-3.0, &linear), Some(-3.0));
        assert_eq!(transform(f64::NAN, &linear), None);
    }

    #[test]
    fn test_cell_edges() {
        let axis = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(cell_edges(&axis, 0, 2), (0.0, 2.0));
        assert_eq!(cell_edges(&axis, 2, 2), (2.0, 4.0));
        assert_eq!(cell_edges(&[5.0], 0, 1), (5.0, 6.0));
    }

    #[test]
    fn test_pattern_matrix() {
        let pattern = Array2::from_shape_vec((2, 3), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let matrix = pattern_matrix(&pattern);
        assert_eq!(matrix[(1, 2)], 6.0);
        assert_eq!(matrix.shape(), (2, 3));
    }

    #[test]
    fn test_rejects_mismatched_axes() {
        let values = DMatrix::zeros(2, 3);
        let result = plot_depth_time_heatmap(&values, &[0.0], &[0.0, 1.0, 2.0], "unused.png", None, &HeatmapOptions::default());
        assert!(result.is_err());
    }
}
