//! Error types shared by solvers, models and configuration loading

use thiserror::Error;

use crate::physics::PhysicalQuantity;

/// Kind of non-finite value found in a state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonFinite {
    NaN,
    Infinity,
}

impl std::fmt::Display for NonFinite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonFinite::NaN => write!(f, "NaN"),
            NonFinite::Infinity => write!(f, "Infinity"),
        }
    }
}

/// Errors raised while setting up or running a simulation
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("{kind} detected in {quantity} at step {step}; reduce the time step")]
    Instability {
        quantity: PhysicalQuantity,
        kind: NonFinite,
        step: usize,
    },

    #[error("Optimization failed: {0}")]
    Optimization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<argmin::core::Error> for SimulationError {
    fn from(error: argmin::core::Error) -> Self {
        SimulationError::Optimization(error.to_string())
    }
}

impl From<crate::optimize::LpError> for SimulationError {
    fn from(error: crate::optimize::LpError) -> Self {
        SimulationError::Optimization(error.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, SimulationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instability_message() {
        let error = SimulationError::Instability {
            quantity: PhysicalQuantity::LargeEdna,
            kind: NonFinite::NaN,
            step: 12,
        };
        let message = error.to_string();
        assert!(message.contains("NaN"));
        assert!(message.contains("step 12"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: SimulationError = io.into();
        assert!(matches!(error, SimulationError::Io(_)));
    }
}
