//! Domain boundaries with time convention
//!
//! Every model of this crate is integrated in time only: spatial boundary
//! conditions (zero flux at the sea surface and floor) are part of the model
//! equations. The domain therefore carries a list of named dimensions and a
//! convention telling which one is time; the temporal dimension stores the
//! initial condition.

use std::collections::HashSet;
use std::fmt;

use crate::error::{Result, SimulationError};
use crate::physics::PhysicalState;

// =================================================================================================
// Domain Boundaries
// =================================================================================================

/// Domain boundaries: named dimensions plus the time convention
#[derive(Debug, Clone)]
pub struct DomainBoundaries {
    /// Boundaries for each dimension
    pub dimensions: Vec<DimensionBoundary>,

    /// Convention for identifying time dimensions
    pub convention: TimeAxisConvention,
}

impl DomainBoundaries {
    /// Create with time as the last dimension
    pub fn new(dimensions: Vec<DimensionBoundary>) -> Self {
        Self {
            dimensions,
            convention: TimeAxisConvention::Last,
        }
    }

    /// Create temporal-only domain (ODE) from an initial condition
    ///
    /// ```rust
    /// use biosim_rs::physics::PhysicalState;
    /// use biosim_rs::solver::DomainBoundaries;
    ///
    /// let boundaries = DomainBoundaries::temporal(PhysicalState::empty());
    /// assert_eq!(boundaries.ndim(), 1);
    /// assert_eq!(boundaries.sdim(), 0);
    /// assert!(boundaries.is_time_dependent());
    /// ```
    pub fn temporal(initial: PhysicalState) -> Self {
        Self::new(vec![DimensionBoundary::new("t", vec![initial])])
    }

    // ===================================== Query methods =========================================

    /// Total number of dimensions
    pub fn ndim(&self) -> usize {
        self.dimensions.len()
    }

    /// Number of non-temporal dimensions
    pub fn sdim(&self) -> usize {
        match self.convention {
            TimeAxisConvention::None => self.ndim(),
            _ => self.ndim().saturating_sub(1),
        }
    }

    /// Check time dependant equation
    pub fn is_time_dependent(&self) -> bool {
        self.convention != TimeAxisConvention::None
    }

    /// Get time dimension index
    pub fn time_index(&self) -> Option<usize> {
        match self.convention {
            TimeAxisConvention::Last => self.ndim().checked_sub(1),
            TimeAxisConvention::First => Some(0),
            TimeAxisConvention::None => None,
            TimeAxisConvention::Index(i) => Some(i),
        }
    }

    /// Get temporal boundary
    pub fn time_boundary(&self) -> Option<&DimensionBoundary> {
        self.time_index().and_then(|index| self.dimensions.get(index))
    }

    /// Initial condition: first state of the temporal boundary
    pub fn initial_condition(&self) -> Option<&PhysicalState> {
        self.time_boundary().and_then(|boundary| boundary.states.first())
    }

    /// Validate the object contents
    pub fn validate(&self) -> Result<()> {
        if self.dimensions.is_empty() {
            return Err(SimulationError::InvalidScenario(
                "Dimension boundaries cannot be empty".to_string(),
            ));
        }

        for dimension in &self.dimensions {
            dimension.validate()?;
        }

        let names: HashSet<&str> = self.dimensions.iter().map(|d| d.name.as_str()).collect();
        if names.len() != self.dimensions.len() {
            return Err(SimulationError::InvalidScenario(
                "Two dimensions cannot share the same name".to_string(),
            ));
        }

        if self.is_time_dependent() && self.time_boundary().is_none() {
            return Err(SimulationError::InvalidScenario(format!(
                "Time axis {} points outside the {} dimensions",
                self.convention,
                self.ndim()
            )));
        }

        Ok(())
    }
}

impl Default for DomainBoundaries {
    fn default() -> Self {
        Self {
            dimensions: Vec::new(),
            convention: TimeAxisConvention::None,
        }
    }
}

// =================================================================================================
// Dimension Boundary
// =================================================================================================

/// Boundary states of one dimension
#[derive(Debug, Clone)]
pub struct DimensionBoundary {
    /// Dimension name
    pub name: String,

    /// Physical states at boundaries
    pub states: Vec<PhysicalState>,
}

impl DimensionBoundary {
    pub fn new(name: impl Into<String>, states: Vec<PhysicalState>) -> Self {
        Self {
            name: name.into(),
            states,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(SimulationError::InvalidScenario(format!(
                "Dimension '{}' must have at least one boundary state",
                self.name
            )));
        }
        Ok(())
    }
}

// =================================================================================================
// Time Axis Convention
// =================================================================================================

/// Which dimension (if any) is time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeAxisConvention {
    /// No time dimension (steady-state)
    None,

    /// First dimension is time
    First,

    /// Last dimension is time
    Last,

    /// Explicit index
    Index(usize),
}

impl fmt::Display for TimeAxisConvention {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TimeAxisConvention::None => write!(f, "None"),
            TimeAxisConvention::First => write!(f, "First"),
            TimeAxisConvention::Last => write!(f, "Last"),
            TimeAxisConvention::Index(u) => write!(f, "Index ({})", u),
        }
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{PhysicalData, PhysicalQuantity};

    #[test]
    fn test_axis_convention_display() {
        assert_eq!(format!("{}", TimeAxisConvention::First), "First");
        assert_eq!(format!("{}", TimeAxisConvention::Index(10)), "Index (10)");
    }

    #[test]
    fn test_temporal_initial_condition() {
        let initial = PhysicalState::new(
            PhysicalQuantity::Concentration,
            PhysicalData::from_vec(vec![0.3, 0.2, 0.1]),
        );
        let boundary = DomainBoundaries::temporal(initial);

        assert_eq!(boundary.convention, TimeAxisConvention::Last);
        assert_eq!(boundary.time_index(), Some(0));
        let ic = boundary.initial_condition().unwrap();
        assert_eq!(ic.get(PhysicalQuantity::Concentration).unwrap().as_vector()[1], 0.2);
        assert!(boundary.validate().is_ok());
    }

    #[test]
    fn test_empty_boundary() {
        let result = DomainBoundaries::new(vec![]).validate();
        assert!(matches!(result, Err(SimulationError::InvalidScenario(_))));
    }

    #[test]
    fn test_duplicate_dimensions() {
        let boundary = DomainBoundaries {
            dimensions: vec![
                DimensionBoundary::new("t", vec![PhysicalState::empty()]),
                DimensionBoundary::new("t", vec![PhysicalState::empty()]),
            ],
            convention: TimeAxisConvention::First,
        };
        let message = boundary.validate().unwrap_err().to_string();
        assert!(message.contains("same name"));
    }

    #[test]
    fn test_dimension_without_state() {
        let boundary = DomainBoundaries::new(vec![DimensionBoundary::new("t", vec![])]);
        let message = boundary.validate().unwrap_err().to_string();
        assert!(message.contains("Dimension 't'"));
    }

    #[test]
    fn test_out_of_range_time_index() {
        let boundary = DomainBoundaries {
            dimensions: vec![DimensionBoundary::new("t", vec![PhysicalState::empty()])],
            convention: TimeAxisConvention::Index(3),
        };
        assert!(boundary.validate().is_err());
    }
}
