//! Plots and data files
//!
//! ```text
//! output/
//! ├── visualization/   PNG, SVG and GIF output with plotters
//! └── export/          CSV files
//! ```
//!
//! Both halves take plain slices and matrices as well as solver results,
//! so stochastic and agent-based runs go through the same functions.

pub mod export;
pub mod visualization;

pub use export::{CsvConfig, CsvExporter, CsvMetadata, Exporter, export_matrix_csv, export_time_series_csv};
pub use visualization::{
    HeatmapOptions, PlotConfig, plot_depth_time_heatmap, plot_ensemble, plot_result_series, plot_time_series,
    render_agents_gif,
};
