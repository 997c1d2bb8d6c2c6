//! CSV export of time series, matrices and simulation results
//!
//! Files are written by hand rather than through a CSV writer so the
//! delimiter and decimal separator can both be configured.
//!
//! # Examples
//!
//! ```rust,ignore
//! use biosim_rs::output::export::{export_time_series_csv, CsvConfig, CsvMetadata};
//!
//! let metadata = CsvMetadata::from_simulation("Relaxation", "RK4", 10.0, 100);
//! let config = CsvConfig::default().with_metadata(metadata);
//!
//! export_time_series_csv(&time, &[x], &["x"], "relaxation.csv", Some(&config))?;
//! ```
//!
//! **Output**:
//! ```csv
//! # Simulation Data
//! # Generated: 2026-02-11T15:30:00+00:00
//! # Model: Relaxation
//! # Solver: RK4
//! # Total Time: 10 s
//! # Time Steps: 100
//! #
//! Time (s),x
//! 0.000000,0.000000
//! ...
//! ```

use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};

use nalgebra::DMatrix;
use thiserror::Error;

use super::Exporter;
use crate::physics::PhysicalQuantity;
use crate::solver::SimulationResult;

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Length mismatch: {0}")]
    LengthMismatch(String),

    #[error("Invalid data: NaN or Inf detected in {0}")]
    NonFinite(String),

    #[error("Quantity {0} is missing from the trajectory")]
    MissingQuantity(PhysicalQuantity),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Formatting options for CSV export
///
/// ```rust,ignore
/// let config = CsvConfig {
///     delimiter: ';',
///     precision: 10,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Column delimiter (default: ',')
    pub delimiter: char,

    /// Decimal separator (default: '.')
    pub decimal_separator: char,

    /// Decimal places for floating-point values (default: 6)
    pub precision: usize,

    /// Write `#` comment lines before the header (default: false)
    pub include_metadata: bool,

    pub metadata: Option<CsvMetadata>,

    /// Header of the first column (default: "Time (s)")
    pub time_header: String,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            decimal_separator: '.',
            precision: 6,
            include_metadata: false,
            metadata: None,
            time_header: "Time (s)".to_string(),
        }
    }
}

impl CsvConfig {
    /// Semicolon delimiter and decimal comma
    pub fn european() -> Self {
        Self {
            delimiter: ';',
            decimal_separator: ',',
            ..Default::default()
        }
    }

    pub fn high_precision() -> Self {
        Self {
            precision: 12,
            ..Default::default()
        }
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn time_header(mut self, header: &str) -> Self {
        self.time_header = header.to_string();
        self
    }

    pub fn with_metadata(mut self, metadata: CsvMetadata) -> Self {
        self.include_metadata = true;
        self.metadata = Some(metadata);
        self
    }
}

/// Header comments; only the fields that are set get written
#[derive(Debug, Clone, Default)]
pub struct CsvMetadata {
    pub model_name: Option<String>,
    pub solver_name: Option<String>,
    /// Simulated time (s)
    pub total_time: Option<f64>,
    pub time_steps: Option<usize>,
    pub custom: Vec<(String, String)>,
}

impl CsvMetadata {
    pub fn from_simulation(model: &str, solver: &str, total_time: f64, time_steps: usize) -> Self {
        Self {
            model_name: Some(model.to_string()),
            solver_name: Some(solver.to_string()),
            total_time: Some(total_time),
            time_steps: Some(time_steps),
            ..Default::default()
        }
    }

    pub fn add_custom(&mut self, key: &str, value: impl ToString) {
        self.custom.push((key.to_string(), value.to_string()));
    }
}

fn write_metadata_header<W: Write>(out: &mut W, metadata: &CsvMetadata) -> std::io::Result<()> {
    writeln!(out, "# Simulation Data")?;
    writeln!(out, "# Generated: {}", chrono::Utc::now().to_rfc3339())?;

    if let Some(model) = &metadata.model_name {
        writeln!(out, "# Model: {}", model)?;
    }
    if let Some(solver) = &metadata.solver_name {
        writeln!(out, "# Solver: {}", solver)?;
    }
    if let Some(total_time) = metadata.total_time {
        writeln!(out, "# Total Time: {} s", total_time)?;
    }
    if let Some(time_steps) = metadata.time_steps {
        writeln!(out, "# Time Steps: {}", time_steps)?;
    }
    for (key, value) in &metadata.custom {
        writeln!(out, "# {}: {}", key, value)?;
    }

    writeln!(out, "#")
}

fn format_number(value: f64, config: &CsvConfig) -> String {
    let formatted = format!("{:.prec$}", value, prec = config.precision);
    if config.decimal_separator != '.' {
        formatted.replace('.', &config.decimal_separator.to_string())
    } else {
        formatted
    }
}

/// Indices of `n_points` evenly spread samples out of `len`, first and last included
pub fn downsample_indices(len: usize, n_points: Option<usize>) -> Vec<usize> {
    match n_points {
        Some(n) if len > 2 && n < len => {
            let n = n.max(2);
            let mut indices: Vec<usize> = (0..n)
                .map(|i| ((i as f64) * (len - 1) as f64 / (n - 1) as f64).round() as usize)
                .collect();
            indices.dedup();
            indices
        }
        _ => (0..len).collect(),
    }
}

/// Write a first column plus one column per series
fn write_columns(
    first: &[f64],
    columns: &[Vec<f64>],
    headers: &[String],
    rows: &[usize],
    path: &str,
    config: &CsvConfig,
) -> Result<(), CsvError> {
    // ============================= Validation =============================

    if first.is_empty() || columns.is_empty() {
        return Err(CsvError::EmptyData("time and value columns must not be empty".to_string()));
    }
    if columns.len() != headers.len() {
        return Err(CsvError::LengthMismatch(format!(
            "{} value columns versus {} headers",
            columns.len(),
            headers.len()
        )));
    }
    if first.iter().any(|t| !t.is_finite()) {
        return Err(CsvError::NonFinite(config.time_header.clone()));
    }
    for (column, header) in columns.iter().zip(headers) {
        if column.len() != first.len() {
            return Err(CsvError::LengthMismatch(format!(
                "column '{}' has {} values for {} times",
                header,
                column.len(),
                first.len()
            )));
        }
        if column.iter().any(|v| !v.is_finite()) {
            return Err(CsvError::NonFinite(header.clone()));
        }
    }

    // ============================= Write ==================================

    let mut out = BufWriter::new(File::create(path)?);

    if config.include_metadata {
        if let Some(metadata) = &config.metadata {
            write_metadata_header(&mut out, metadata)?;
        }
    }

    write!(out, "{}", config.time_header)?;
    for header in headers {
        write!(out, "{}{}", config.delimiter, header)?;
    }
    writeln!(out)?;

    for &i in rows {
        write!(out, "{}", format_number(first[i], config))?;
        for column in columns {
            write!(out, "{}{}", config.delimiter, format_number(column[i], config))?;
        }
        writeln!(out)?;
    }

    out.flush()?;
    Ok(())
}

/// Export one or more time series sharing a time axis
pub fn export_time_series_csv(
    time: &[f64],
    series: &[Vec<f64>],
    headers: &[&str],
    output_path: &str,
    config: Option<&CsvConfig>,
) -> Result<(), Box<dyn Error>> {
    let default_config = CsvConfig::default();
    let config = config.unwrap_or(&default_config);
    let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let rows: Vec<usize> = (0..time.len()).collect();

    write_columns(time, series, &headers, &rows, output_path, config)?;
    Ok(())
}

/// Export a `rows × columns` matrix, e.g. time × depth
///
/// The header row holds `column_values` (depths), the first column holds
/// `row_values` (times).
pub fn export_matrix_csv(
    matrix: &DMatrix<f64>,
    row_values: &[f64],
    column_values: &[f64],
    output_path: &str,
    config: Option<&CsvConfig>,
) -> Result<(), Box<dyn Error>> {
    if matrix.nrows() != row_values.len() || matrix.ncols() != column_values.len() {
        return Err(CsvError::LengthMismatch(format!(
            "matrix is {}x{}, labels are {}x{}",
            matrix.nrows(),
            matrix.ncols(),
            row_values.len(),
            column_values.len()
        ))
        .into());
    }

    let default_config = CsvConfig::default();
    let config = config.unwrap_or(&default_config);

    let headers: Vec<String> = column_values.iter().map(|v| format_number(*v, config)).collect();
    let columns: Vec<Vec<f64>> = matrix.column_iter().map(|c| c.iter().copied().collect()).collect();
    let rows: Vec<usize> = (0..row_values.len()).collect();

    write_columns(row_values, &columns, &headers, &rows, output_path, config)?;
    Ok(())
}

/// CSV implementation of [`Exporter`]
#[derive(Debug, Clone, Default)]
pub struct CsvExporter {
    pub config: CsvConfig,
}

impl CsvExporter {
    pub fn new(config: CsvConfig) -> Self {
        Self { config }
    }
}

impl Exporter for CsvExporter {
    type Error = CsvError;

    fn export_result(
        &self,
        result: &SimulationResult,
        quantity: PhysicalQuantity,
        labels: &[&str],
        n_points: Option<usize>,
        path: &str,
    ) -> Result<(), CsvError> {
        if result.is_empty() {
            return Err(CsvError::EmptyData("the result holds no states".to_string()));
        }
        let matrix = result.matrix(quantity).ok_or(CsvError::MissingQuantity(quantity))?;

        let headers: Vec<String> = if labels.is_empty() {
            (0..matrix.ncols()).map(|i| format!("{} {}", quantity, i)).collect()
        } else {
            labels.iter().map(|l| l.to_string()).collect()
        };
        let columns: Vec<Vec<f64>> = matrix.column_iter().map(|c| c.iter().copied().collect()).collect();
        let rows = downsample_indices(result.len(), n_points);

        write_columns(&result.time_points, &columns, &headers, &rows, path, &self.config)
    }
}
