//! Export of simulation results
//!
//! [`Exporter`] abstracts the file format; each format lives in its own
//! sub-module. Only CSV is implemented.
//!
//! ```rust,ignore
//! use biosim_rs::output::export::{CsvExporter, Exporter};
//! use biosim_rs::physics::PhysicalQuantity;
//!
//! let exporter = CsvExporter::default();
//!
//! // Every stored state
//! exporter.export_result(&result, PhysicalQuantity::Concentration, &["x"], None, "relax.csv")?;
//!
//! // Thinned to 500 rows, first and last state kept
//! exporter.export_result(&result, PhysicalQuantity::Population, &["S", "I", "R", "D"], Some(500), "sir.csv")?;
//! ```

pub mod csv;

pub use self::csv::{
    CsvConfig, CsvError, CsvExporter, CsvMetadata, downsample_indices, export_matrix_csv, export_time_series_csv,
};

use crate::physics::PhysicalQuantity;
use crate::solver::SimulationResult;

/// Writes the trajectory of one quantity to a file
pub trait Exporter {
    /// Error type specific to the format
    type Error: std::error::Error;

    /// Export every component of `quantity` over time
    ///
    /// `labels` names the components (empty for generated names).
    /// `n_points` thins the output uniformly; the first and last states are
    /// always written.
    fn export_result(
        &self,
        result: &SimulationResult,
        quantity: PhysicalQuantity,
        labels: &[&str],
        n_points: Option<usize>,
        path: &str,
    ) -> Result<(), Self::Error>;
}
