//! Plots with `plotters`
//!
//! | Use case | Function |
//! |----------|----------|
//! | Lines against time | [`plot_time_series`] |
//! | Components of a solver result | [`plot_result_series`] |
//! | Ensemble mean ± std | [`plot_ensemble`] |
//! | eDNA depth-time distribution | [`plot_depth_time_heatmap`] |
//! | Agent epidemic animation | [`render_agents_gif`] |
//!
//! Paths ending in `.svg` produce vector output, anything else PNG.
//!
//! ```rust,ignore
//! use biosim_rs::output::visualization::{plot_result_series, PlotConfig};
//! use biosim_rs::physics::PhysicalQuantity;
//!
//! let config = PlotConfig::time_series("SIR");
//! plot_result_series(&result, PhysicalQuantity::Population, &[0, 1, 2], &["S", "I", "R"], "sir.png", Some(&config))?;
//! ```

pub mod animation;
pub mod config;
pub mod heatmap;
pub mod series;

pub use animation::render_agents_gif;
pub use config::{NO_TITLE, PlotConfig};
pub use heatmap::{HeatmapOptions, pattern_matrix, plot_depth_time_heatmap, truncated_jet};
pub use series::{plot_ensemble, plot_result_series, plot_time_series};
