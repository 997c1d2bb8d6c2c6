//! Physical data types
//!
//! Container for the values of one physical quantity. Depending on the model
//! these are a single number (a well-mixed pool), a vector (species of a
//! pathway, compartments of an epidemic, cells of a depth grid) or a matrix
//! (time × depth intensity patterns).

use nalgebra::{DMatrix, DVector};
use ndarray::{Array, ArrayD, IxDyn};
use std::fmt;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::solver::parallel_threshold;

/// Physical data container supporting scalar to n-dimensional arrays
///
/// # Storage Types
///
/// - **Scalar**: Single uniform value (0D)
/// - **Vector**: 1D array (species, compartments or depth cells)
/// - **Matrix**: 2D array (e.g. depth × size class)
/// - **Array**: 3D+ multidimensional array
///
/// # Examples
///
/// ```rust
/// use biosim_rs::physics::PhysicalData;
///
/// let pools = PhysicalData::from_vec(vec![0.3, 0.2, 0.1]);
/// assert_eq!(pools.len(), 3);
/// assert!((pools.sum() - 0.6).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicalData {
    /// Scalar value (0D)
    Scalar(f64),

    /// Vector (1D)
    Vector(DVector<f64>),

    /// Matrix (2D)
    Matrix(DMatrix<f64>),

    /// Multidimensional array (3D+)
    Array(ArrayD<f64>),
}

impl PhysicalData {
    // ======================================= constructors =======================================

    /// Create from vector
    pub fn from_vec(vector: Vec<f64>) -> Self {
        Self::Vector(DVector::from_vec(vector))
    }

    /// Create uniform vector
    pub fn uniform_vector(size: usize, value: f64) -> Self {
        Self::Vector(DVector::from_element(size, value))
    }

    /// Create uniform matrix
    pub fn uniform_matrix(rows: usize, columns: usize, value: f64) -> Self {
        Self::Matrix(DMatrix::from_element(rows, columns, value))
    }

    /// Create uniform n-D array from shape
    pub fn uniform_array(shape: &[usize], value: f64) -> Self {
        Self::Array(Array::from_elem(IxDyn(shape), value))
    }

    // ========================================== Queries ==========================================

    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Self::Vector(_))
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self, Self::Matrix(_))
    }

    /// Get data dimension
    ///
    /// Returns: 0 (scalar), 1 (vector), 2 (matrix), 3+ (array)
    pub fn ndim(&self) -> usize {
        match self {
            PhysicalData::Scalar(_) => 0,
            PhysicalData::Vector(_) => 1,
            PhysicalData::Matrix(_) => 2,
            PhysicalData::Array(a) => a.ndim(),
        }
    }

    /// Get shape as a vector
    pub fn shape(&self) -> Vec<usize> {
        match self {
            PhysicalData::Scalar(_) => vec![],
            PhysicalData::Vector(v) => vec![v.len()],
            PhysicalData::Matrix(m) => vec![m.nrows(), m.ncols()],
            PhysicalData::Array(a) => a.shape().to_vec(),
        }
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        match self {
            PhysicalData::Scalar(_) => 1,
            PhysicalData::Vector(v) => v.len(),
            PhysicalData::Matrix(m) => m.len(),
            PhysicalData::Array(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of all stored values
    pub fn sum(&self) -> f64 {
        match self {
            PhysicalData::Scalar(value) => *value,
            PhysicalData::Vector(v) => v.sum(),
            PhysicalData::Matrix(m) => m.sum(),
            PhysicalData::Array(a) => a.sum(),
        }
    }

    /// First non-finite value found, if any (`true` for NaN, `false` for infinity)
    pub fn first_non_finite(&self) -> Option<bool> {
        let check = |x: &f64| {
            if x.is_nan() {
                Some(true)
            } else if x.is_infinite() {
                Some(false)
            } else {
                None
            }
        };
        match self {
            PhysicalData::Scalar(value) => check(value),
            PhysicalData::Vector(v) => v.iter().find_map(check),
            PhysicalData::Matrix(m) => m.iter().find_map(check),
            PhysicalData::Array(a) => a.iter().find_map(check),
        }
    }

    /// Check that every value is finite
    pub fn is_finite(&self) -> bool {
        self.first_non_finite().is_none()
    }

    /// Flatten to a plain `Vec<f64>` (column-major for matrices)
    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            PhysicalData::Scalar(value) => vec![*value],
            PhysicalData::Vector(v) => v.as_slice().to_vec(),
            PhysicalData::Matrix(m) => m.as_slice().to_vec(),
            PhysicalData::Array(a) => a.iter().copied().collect(),
        }
    }

    // ======================================== Extractions ========================================

    /// Extract as a scalar (panic if not)
    pub fn as_scalar(&self) -> f64 {
        match self {
            PhysicalData::Scalar(value) => *value,
            _ => panic!("Not a scalar value"),
        }
    }

    /// Try to extract as a scalar
    pub fn try_as_scalar(&self) -> Option<f64> {
        match self {
            PhysicalData::Scalar(value) => Some(*value),
            _ => None,
        }
    }

    /// Extract as a DVector (panic if not)
    pub fn as_vector(&self) -> &DVector<f64> {
        match self {
            PhysicalData::Vector(value) => value,
            _ => panic!("Not a vector value"),
        }
    }

    /// Try to extract as a DVector
    pub fn try_as_vector(&self) -> Option<&DVector<f64>> {
        match self {
            PhysicalData::Vector(value) => Some(value),
            _ => None,
        }
    }

    /// Extract as a DMatrix (panic if not)
    pub fn as_matrix(&self) -> &DMatrix<f64> {
        match self {
            PhysicalData::Matrix(value) => value,
            _ => panic!("Not a matrix value"),
        }
    }

    /// Try to extract as a DMatrix
    pub fn try_as_matrix(&self) -> Option<&DMatrix<f64>> {
        match self {
            PhysicalData::Matrix(value) => Some(value),
            _ => None,
        }
    }

    // ====================================== Apply functions ======================================

    /// Apply a function f to every value
    ///
    /// Switches to rayon above [`parallel_threshold()`] elements when the
    /// `parallel` feature is enabled.
    pub fn apply<F>(&mut self, f: F)
    where
        F: Fn(f64) -> f64 + Sync + Send,
    {
        let threshold = parallel_threshold();
        match self {
            PhysicalData::Scalar(value) => *value = f(*value),

            PhysicalData::Vector(value) => {
                if value.len() > threshold {
                    #[cfg(feature = "parallel")]
                    value.as_mut_slice().par_iter_mut().for_each(|x| *x = f(*x));
                    #[cfg(not(feature = "parallel"))]
                    value.iter_mut().for_each(|x| *x = f(*x));
                } else {
                    value.iter_mut().for_each(|x| *x = f(*x));
                }
            }

            PhysicalData::Matrix(value) => {
                if value.len() > threshold {
                    #[cfg(feature = "parallel")]
                    value.as_mut_slice().par_iter_mut().for_each(|x| *x = f(*x));
                    #[cfg(not(feature = "parallel"))]
                    value.iter_mut().for_each(|x| *x = f(*x));
                } else {
                    value.iter_mut().for_each(|x| *x = f(*x));
                }
            }

            PhysicalData::Array(value) => {
                if value.len() > threshold {
                    #[cfg(feature = "parallel")]
                    value.par_mapv_inplace(f);
                    #[cfg(not(feature = "parallel"))]
                    value.mapv_inplace(f);
                } else {
                    value.mapv_inplace(f);
                }
            }
        }
    }
}

// ================================== Simple arithmetic functions ==================================

impl std::ops::Add for PhysicalData {
    type Output = PhysicalData;
    fn add(self, rhs: Self) -> Self::Output {
        use PhysicalData::*;
        match (self, rhs) {
            (Scalar(x), Scalar(y)) => Scalar(x + y),
            (Scalar(x), Vector(y)) | (Vector(y), Scalar(x)) => Vector(y.map(|e| e + x)),
            (Scalar(x), Matrix(y)) | (Matrix(y), Scalar(x)) => Matrix(y.map(|e| e + x)),
            (Scalar(x), Array(y)) | (Array(y), Scalar(x)) => Array(&y + x),

            (Vector(x), Vector(y)) => {
                assert_eq!(x.len(), y.len(), "Vector length must match");
                Vector(x + y)
            }

            (Matrix(x), Matrix(y)) => {
                assert_eq!(x.shape(), y.shape(), "Matrices dimensions must match");
                Matrix(x + y)
            }

            (Array(x), Array(y)) => {
                assert_eq!(x.shape(), y.shape(), "Arrays dimensions must match");
                Array(&x + &y)
            }

            _ => panic!("Cannot add different PhysicalData types other than with scalar"),
        }
    }
}

impl std::ops::Mul<f64> for PhysicalData {
    type Output = PhysicalData;
    fn mul(self, scalar: f64) -> Self::Output {
        match self {
            PhysicalData::Scalar(x) => PhysicalData::Scalar(x * scalar),
            PhysicalData::Vector(x) => PhysicalData::Vector(x * scalar),
            PhysicalData::Matrix(x) => PhysicalData::Matrix(x * scalar),
            PhysicalData::Array(x) => PhysicalData::Array(&x * scalar),
        }
    }
}

impl std::ops::Mul<PhysicalData> for f64 {
    type Output = PhysicalData;
    fn mul(self, rhs: PhysicalData) -> Self::Output {
        rhs * self
    }
}

// ======================== Display ============================

impl fmt::Display for PhysicalData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicalData::Scalar(value) => write!(f, "Scalar ({})", value),
            PhysicalData::Vector(value) => write!(f, "Vector [{}]", value.len()),
            PhysicalData::Matrix(value) => {
                write!(f, "Matrix [{} * {}]", value.nrows(), value.ncols())
            }
            PhysicalData::Array(value) => {
                let str_shape = value
                    .shape()
                    .iter()
                    .map(|n| n.to_string())
                    .collect::<Vec<_>>()
                    .join(" * ");
                write!(f, "Array [{}]", str_shape)
            }
        }
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::ThresholdGuard;

    #[test]
    fn test_scalar() {
        let data = PhysicalData::Scalar(42.0);
        assert!(data.is_scalar());
        assert_eq!(data.ndim(), 0);
        assert_eq!(data.len(), 1);
        assert!(data.try_as_vector().is_none());
    }

    #[test]
    fn test_vector_sum() {
        let data = PhysicalData::from_vec(vec![1.0, 2.5, -0.5]);
        assert!(data.is_vector());
        assert_eq!(data.len(), 3);
        assert!((data.sum() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_matrix_shape() {
        let data = PhysicalData::uniform_matrix(48, 601, 0.5);
        assert!(data.is_matrix());
        assert_eq!(data.shape(), vec![48, 601]);
    }

    #[test]
    fn test_non_finite_detection() {
        let nan = PhysicalData::from_vec(vec![0.0, f64::NAN]);
        let inf = PhysicalData::from_vec(vec![f64::INFINITY, 0.0]);
        let ok = PhysicalData::uniform_vector(4, 1.0);
        assert_eq!(nan.first_non_finite(), Some(true));
        assert_eq!(inf.first_non_finite(), Some(false));
        assert!(ok.is_finite());
    }

    #[test]
    fn test_addition_with_scalar_broadcast() {
        let a = PhysicalData::uniform_vector(3, 1.0);
        let c = a + PhysicalData::Scalar(2.0);
        assert_eq!(c.as_vector()[2], 3.0);
    }

    #[test]
    #[should_panic(expected = "Vector length must match")]
    fn test_addition_length_mismatch_panics() {
        let _ = PhysicalData::uniform_vector(3, 1.0) + PhysicalData::uniform_vector(4, 1.0);
    }

    #[test]
    fn test_multiplication() {
        let data = PhysicalData::uniform_vector(10, 2.0);
        let result = 3.0 * data;
        assert_eq!(result.as_vector()[0], 6.0);
    }

    #[test]
    fn test_apply_above_threshold_matches_sequential() {
        let _guard = ThresholdGuard::save(10);
        let mut large = PhysicalData::uniform_vector(100, 2.0);
        let mut small = PhysicalData::uniform_vector(5, 2.0);
        large.apply(|x| x * x - 1.0);
        small.apply(|x| x * x - 1.0);
        assert!(large.as_vector().iter().all(|&x| x == 3.0));
        assert!(small.as_vector().iter().all(|&x| x == 3.0));
    }

    #[test]
    fn test_to_vec_and_display() {
        let array = PhysicalData::uniform_array(&[2, 3, 4], 1.0);
        assert_eq!(array.to_vec().len(), 24);
        assert_eq!(format!("{}", array), "Array [2 * 3 * 4]");
    }
}
