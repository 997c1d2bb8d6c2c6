//! Dense two-phase simplex for small linear programs
//!
//! Solves
//!
//! ```text
//! maximize    cᵀx
//! subject to  A_eq x  = b_eq
//!             A_ub x <= b_ub
//!             l <= x <= u        (finite bounds)
//! ```
//!
//! Variables are shifted to `y = x - l` so that every column is
//! non-negative, upper bounds become explicit rows, and the resulting
//! standard form is solved on a dense tableau. Phase 1 drives a set of
//! artificial variables to zero; phase 2 optimizes the real objective.
//! Bland's rule (smallest eligible index) is used for both entering and
//! leaving variables, which rules out cycling on degenerate problems such as
//! flux balance models.

use log::debug;
use nalgebra::{DMatrix, DVector};
use thiserror::Error;

const PIVOT_TOLERANCE: f64 = 1e-9;
const FEASIBILITY_TOLERANCE: f64 = 1e-7;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LpError {
    #[error("Linear program is infeasible")]
    Infeasible,

    #[error("Linear program is unbounded")]
    Unbounded,

    #[error("Simplex did not finish within {0} pivots")]
    IterationLimit(usize),

    #[error("Invalid linear program: {0}")]
    InvalidProblem(String),
}

/// Optimal vertex of a linear program
#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution {
    pub x: DVector<f64>,
    pub objective_value: f64,
    pub iterations: usize,
}

/// A bounded linear program in maximization form
#[derive(Debug, Clone)]
pub struct LinearProgram {
    objective: DVector<f64>,
    a_eq: DMatrix<f64>,
    b_eq: DVector<f64>,
    a_ub: DMatrix<f64>,
    b_ub: DVector<f64>,
    bounds: Vec<(f64, f64)>,
    max_pivots: Option<usize>,
}

impl LinearProgram {
    /// Maximize `objective · x` with every variable in `[0, 1000]`
    pub fn maximize(objective: DVector<f64>) -> Self {
        let n = objective.len();
        Self {
            objective,
            a_eq: DMatrix::zeros(0, n),
            b_eq: DVector::zeros(0),
            a_ub: DMatrix::zeros(0, n),
            b_ub: DVector::zeros(0),
            bounds: vec![(0.0, 1000.0); n],
            max_pivots: None,
        }
    }

    /// Same constraints, another objective
    pub fn with_objective(mut self, objective: DVector<f64>) -> Self {
        self.objective = objective;
        self
    }

    pub fn with_equalities(mut self, a_eq: DMatrix<f64>, b_eq: DVector<f64>) -> Self {
        self.a_eq = a_eq;
        self.b_eq = b_eq;
        self
    }

    pub fn with_inequalities(mut self, a_ub: DMatrix<f64>, b_ub: DVector<f64>) -> Self {
        self.a_ub = a_ub;
        self.b_ub = b_ub;
        self
    }

    pub fn with_bounds(mut self, bounds: Vec<(f64, f64)>) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_max_pivots(mut self, max_pivots: usize) -> Self {
        self.max_pivots = Some(max_pivots);
        self
    }

    pub fn num_variables(&self) -> usize {
        self.objective.len()
    }

    fn validate(&self) -> Result<(), LpError> {
        let n = self.num_variables();
        if n == 0 {
            return Err(LpError::InvalidProblem("No variables".to_string()));
        }
        if self.a_eq.ncols() != n || self.a_eq.nrows() != self.b_eq.len() {
            return Err(LpError::InvalidProblem(format!(
                "Equality block is {}x{} with {} right-hand sides, expected {} columns",
                self.a_eq.nrows(),
                self.a_eq.ncols(),
                self.b_eq.len(),
                n
            )));
        }
        if self.a_ub.ncols() != n || self.a_ub.nrows() != self.b_ub.len() {
            return Err(LpError::InvalidProblem(format!(
                "Inequality block is {}x{} with {} right-hand sides, expected {} columns",
                self.a_ub.nrows(),
                self.a_ub.ncols(),
                self.b_ub.len(),
                n
            )));
        }
        if self.bounds.len() != n {
            return Err(LpError::InvalidProblem(format!(
                "{} bounds for {} variables",
                self.bounds.len(),
                n
            )));
        }
        for (j, &(lo, hi)) in self.bounds.iter().enumerate() {
            if !lo.is_finite() || !hi.is_finite() {
                return Err(LpError::InvalidProblem(format!("Variable {} has a non-finite bound", j)));
            }
            if lo > hi {
                return Err(LpError::Infeasible);
            }
        }
        Ok(())
    }

    /// Solve with the two-phase simplex method
    pub fn solve(&self) -> Result<LpSolution, LpError> {
        self.validate()?;

        let n = self.num_variables();
        let lower = DVector::from_iterator(n, self.bounds.iter().map(|b| b.0));
        let widths: Vec<f64> = self.bounds.iter().map(|(lo, hi)| hi - lo).collect();

        // ====== Standard form in the shifted variables y = x - l ======

        let rhs_eq = &self.b_eq - &self.a_eq * &lower;
        let rhs_ub = &self.b_ub - &self.a_ub * &lower;

        let m_eq = self.a_eq.nrows();
        let m_ub = self.a_ub.nrows();
        let m = m_eq + m_ub + n;
        let n_slack = m_ub + n;
        let art_start = n + n_slack;
        let rhs_col = art_start + m;

        let mut tableau = DMatrix::<f64>::zeros(m + 1, rhs_col + 1);

        for i in 0..m_eq {
            for j in 0..n {
                tableau[(i, j)] = self.a_eq[(i, j)];
            }
            tableau[(i, rhs_col)] = rhs_eq[i];
        }
        for i in 0..m_ub {
            let row = m_eq + i;
            for j in 0..n {
                tableau[(row, j)] = self.a_ub[(i, j)];
            }
            tableau[(row, n + i)] = 1.0;
            tableau[(row, rhs_col)] = rhs_ub[i];
        }
        for (j, &width) in widths.iter().enumerate() {
            let row = m_eq + m_ub + j;
            tableau[(row, j)] = 1.0;
            tableau[(row, n + m_ub + j)] = 1.0;
            tableau[(row, rhs_col)] = width;
        }

        // Non-negative right-hand sides, then one artificial per row
        for i in 0..m {
            if tableau[(i, rhs_col)] < 0.0 {
                for j in 0..art_start {
                    tableau[(i, j)] = -tableau[(i, j)];
                }
                tableau[(i, rhs_col)] = -tableau[(i, rhs_col)];
            }
            tableau[(i, art_start + i)] = 1.0;
        }

        let mut simplex = Tableau {
            t: tableau,
            basis: (art_start..art_start + m).collect(),
            rhs_col,
            pivots: 0,
            max_pivots: self.max_pivots.unwrap_or(50 * (m + rhs_col)),
        };

        // ====== Phase 1: minimize the sum of artificials ======

        let mut phase1 = vec![0.0; rhs_col];
        phase1[art_start..].iter_mut().for_each(|c| *c = 1.0);
        simplex.price(&phase1);
        simplex.run(rhs_col)?;

        let infeasibility = -simplex.t[(m, rhs_col)];
        let scale = 1.0 + simplex.t.column(rhs_col).rows(0, m).amax();
        if infeasibility > FEASIBILITY_TOLERANCE * scale {
            debug!("phase 1 ended with infeasibility {:.3e}", infeasibility);
            return Err(LpError::Infeasible);
        }

        // Pivot remaining zero-level artificials out of the basis where possible.
        // Rows where that fails are redundant and keep their artificial at zero.
        for row in 0..m {
            if simplex.basis[row] >= art_start {
                if let Some(col) = (0..art_start).find(|&j| simplex.t[(row, j)].abs() > PIVOT_TOLERANCE) {
                    simplex.pivot(row, col);
                }
            }
        }

        // ====== Phase 2: the real objective ======

        let mut phase2 = vec![0.0; rhs_col];
        for j in 0..n {
            phase2[j] = -self.objective[j];
        }
        simplex.price(&phase2);
        simplex.run(art_start)?;

        let mut y = DVector::zeros(n);
        for (row, &var) in simplex.basis.iter().enumerate() {
            if var < n {
                y[var] = simplex.t[(row, rhs_col)];
            }
        }
        let x = DVector::from_iterator(
            n,
            y.iter()
                .zip(self.bounds.iter())
                .map(|(&yj, &(lo, hi))| (yj + lo).clamp(lo, hi)),
        );
        let objective_value = self.objective.dot(&x);

        debug!(
            "simplex: {} variables, {} rows, optimum {:.6} after {} pivots",
            n, m, objective_value, simplex.pivots
        );

        Ok(LpSolution {
            x,
            objective_value,
            iterations: simplex.pivots,
        })
    }
}

struct Tableau {
    t: DMatrix<f64>,
    basis: Vec<usize>,
    rhs_col: usize,
    pivots: usize,
    max_pivots: usize,
}

impl Tableau {
    fn rows(&self) -> usize {
        self.basis.len()
    }

    /// Write the reduced costs of `costs` (to be minimized) into the last row
    fn price(&mut self, costs: &[f64]) {
        let m = self.rows();
        for j in 0..=self.rhs_col {
            let direct = if j < self.rhs_col { costs[j] } else { 0.0 };
            let basic: f64 = (0..m).map(|i| costs[self.basis[i]] * self.t[(i, j)]).sum();
            self.t[(m, j)] = direct - basic;
        }
    }

    /// Iterate until optimal, considering only columns below `allowed`
    fn run(&mut self, allowed: usize) -> Result<(), LpError> {
        let m = self.rows();
        loop {
            let Some(col) = (0..allowed).find(|&j| self.t[(m, j)] < -PIVOT_TOLERANCE) else {
                return Ok(());
            };

            let mut leaving: Option<(usize, f64)> = None;
            for row in 0..m {
                let a = self.t[(row, col)];
                if a > PIVOT_TOLERANCE {
                    let ratio = self.t[(row, self.rhs_col)] / a;
                    let better = match leaving {
                        None => true,
                        Some((best_row, best_ratio)) => {
                            ratio < best_ratio - PIVOT_TOLERANCE
                                || (ratio <= best_ratio + PIVOT_TOLERANCE && self.basis[row] < self.basis[best_row])
                        }
                    };
                    if better {
                        leaving = Some((row, ratio));
                    }
                }
            }

            let Some((row, _)) = leaving else {
                return Err(LpError::Unbounded);
            };

            if self.pivots >= self.max_pivots {
                return Err(LpError::IterationLimit(self.max_pivots));
            }
            self.pivot(row, col);
        }
    }

    fn pivot(&mut self, row: usize, col: usize) {
        let width = self.rhs_col + 1;
        let pivot = self.t[(row, col)];
        for j in 0..width {
            self.t[(row, j)] /= pivot;
        }
        let pivot_row: Vec<f64> = (0..width).map(|j| self.t[(row, j)]).collect();

        for i in 0..self.t.nrows() {
            if i == row {
                continue;
            }
            let factor = self.t[(i, col)];
            if factor != 0.0 {
                for (j, &p) in pivot_row.iter().enumerate() {
                    self.t[(i, j)] -= factor * p;
                }
            }
        }
        self.basis[row] = col;
        self.pivots += 1;
    }
}
