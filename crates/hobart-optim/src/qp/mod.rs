//! Convex quadratic programming.
//!
//! Problems have the form
//!
//! ```text
//! minimize    ½ xᵀ G x + aᵀ x
//! subject to  nᵢᵀ x = bᵢ   (equalities)
//!             nⱼᵀ x ≥ bⱼ   (inequalities)
//! ```
//!
//! with `G` symmetric positive definite. The optimizers only depend on the
//! [`ConvexQpSolver`] trait; [`DualActiveSetSolver`] is the bundled
//! implementation.

mod active_set;

pub use active_set::DualActiveSetSolver;

use crate::error::SolverError;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Solver configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Maximum number of active-set changes (default: 500)
    pub max_iterations: usize,

    /// Feasibility tolerance (default: 1e-10)
    pub tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            tolerance: 1e-10,
        }
    }
}

/// A single linear constraint `normalᵀ x (= or ≥) rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    /// Constraint normal
    pub normal: Array1<f64>,
    /// Right-hand side
    pub rhs: f64,
}

/// Quadratic program with linear equality and inequality constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadraticProgram {
    hessian: Array2<f64>,
    linear: Array1<f64>,
    equalities: Vec<LinearConstraint>,
    inequalities: Vec<LinearConstraint>,
}

impl QuadraticProgram {
    /// Unconstrained problem `min ½ xᵀ G x + aᵀ x`.
    pub const fn new(hessian: Array2<f64>, linear: Array1<f64>) -> Self {
        Self {
            hessian,
            linear,
            equalities: Vec::new(),
            inequalities: Vec::new(),
        }
    }

    /// Add `normalᵀ x = rhs`.
    pub fn equality(mut self, normal: Array1<f64>, rhs: f64) -> Self {
        self.equalities.push(LinearConstraint { normal, rhs });
        self
    }

    /// Add `normalᵀ x ≥ rhs`.
    pub fn greater_equal(mut self, normal: Array1<f64>, rhs: f64) -> Self {
        self.inequalities.push(LinearConstraint { normal, rhs });
        self
    }

    /// Add `normalᵀ x ≤ rhs`.
    pub fn less_equal(self, normal: Array1<f64>, rhs: f64) -> Self {
        self.greater_equal(-normal, -rhs)
    }

    /// Add `lower[i] ≤ x[i] ≤ upper[i]` for every coordinate.
    ///
    /// Infinite bounds are skipped.
    pub fn box_bounds(mut self, lower: &[f64], upper: &[f64]) -> Self {
        let n = self.dim();
        for (i, (&lo, &hi)) in lower.iter().zip(upper).enumerate() {
            if lo.is_finite() {
                let mut normal = Array1::zeros(n);
                normal[i] = 1.0;
                self = self.greater_equal(normal, lo);
            }
            if hi.is_finite() {
                let mut normal = Array1::zeros(n);
                normal[i] = 1.0;
                self = self.less_equal(normal, hi);
            }
        }
        self
    }

    /// Number of variables.
    pub fn dim(&self) -> usize {
        self.linear.len()
    }

    /// Quadratic term `G`.
    pub const fn hessian(&self) -> &Array2<f64> {
        &self.hessian
    }

    /// Linear term `a`.
    pub const fn linear(&self) -> &Array1<f64> {
        &self.linear
    }

    /// Equality constraints.
    pub fn equalities(&self) -> &[LinearConstraint] {
        &self.equalities
    }

    /// Inequality constraints.
    pub fn inequalities(&self) -> &[LinearConstraint] {
        &self.inequalities
    }

    /// Objective value at `x`.
    pub fn objective(&self, x: &Array1<f64>) -> f64 {
        0.5 * x.dot(&self.hessian.dot(x)) + self.linear.dot(x)
    }

    /// Check that every component has the right size.
    ///
    /// # Errors
    /// Returns [`SolverError::DimensionMismatch`] naming the first bad component.
    pub fn validate(&self) -> Result<(), SolverError> {
        let n = self.dim();
        if self.hessian.dim() != (n, n) {
            return Err(SolverError::DimensionMismatch {
                what: "hessian",
                expected: n,
                actual: self.hessian.nrows().max(self.hessian.ncols()),
            });
        }
        let mut all = self.equalities.iter().chain(&self.inequalities);
        if let Some(bad) = all.find(|c| c.normal.len() != n) {
            return Err(SolverError::DimensionMismatch {
                what: "constraint normal",
                expected: n,
                actual: bad.normal.len(),
            });
        }
        Ok(())
    }
}

/// Solution of a [`QuadraticProgram`].
#[derive(Debug, Clone, PartialEq)]
pub struct QpSolution {
    /// Minimizer
    pub x: Array1<f64>,
    /// Objective value at the minimizer
    pub objective: f64,
    /// Active-set changes performed
    pub iterations: usize,
}

/// Capability to solve small strictly convex quadratic programs.
pub trait ConvexQpSolver: Send + Sync {
    /// Solve the problem.
    ///
    /// # Errors
    /// [`SolverError::Infeasible`] when no point satisfies the constraints,
    /// [`SolverError::DidNotConverge`] on numerical failure.
    fn solve(&self, problem: &QuadraticProgram) -> Result<QpSolution, SolverError>;
}
