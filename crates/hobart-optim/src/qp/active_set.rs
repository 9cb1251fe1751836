//! Dual active-set method of Goldfarb and Idnani.
//!
//! Starts from the unconstrained minimizer `x = -G⁻¹a`, which is dual
//! feasible, and repeatedly adds the most violated constraint while keeping
//! every active inequality multiplier non-negative. Constraints whose
//! multiplier would turn negative are dropped along the way. The method
//! needs no feasible starting point and reports infeasibility when a
//! violated constraint can be neither added nor made reachable by dropping
//! another one.

use super::{ConvexQpSolver, QpSolution, QuadraticProgram, SolverConfig};
use crate::error::SolverError;
use hobart_risk::linalg::{inverse_spd, solve_spd};
use ndarray::{Array1, Array2};
use tracing::debug;

/// Curvature below this fraction of `nᵀG⁻¹n` counts as a zero primal step.
///
/// Must stay well above the Cholesky pivot tolerance so that every accepted
/// constraint keeps the active normals independent.
const DEGENERACY_RATIO: f64 = 1e-9;

/// Goldfarb–Idnani dual active-set solver
#[derive(Debug, Clone, Default)]
pub struct DualActiveSetSolver {
    config: SolverConfig,
}

#[derive(Debug)]
struct ActiveConstraint {
    index: usize,
    normal: Array1<f64>,
    equality: bool,
    multiplier: f64,
}

impl DualActiveSetSolver {
    /// Create a solver
    pub const fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Solver configuration
    pub const fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Pick the next constraint to add, oriented so that it reads `nᵀx ≥ b`
    /// with `nᵀx - b ≤ 0` at the current point.
    ///
    /// Inactive equalities come first; then the inequality with the largest
    /// scaled violation.
    fn next_violated(
        &self,
        problem: &QuadraticProgram,
        x: &Array1<f64>,
        active: &[ActiveConstraint],
        redundant: &[bool],
    ) -> Option<(usize, Array1<f64>, f64)> {
        let is_active = |idx: usize| active.iter().any(|c| c.index == idx);

        for (k, c) in problem.equalities().iter().enumerate() {
            if redundant[k] || is_active(k) {
                continue;
            }
            let slack = c.normal.dot(x) - c.rhs;
            return Some(if slack > 0.0 {
                (k, -&c.normal, -c.rhs)
            } else {
                (k, c.normal.clone(), c.rhs)
            });
        }

        let n_eq = problem.equalities().len();
        problem
            .inequalities()
            .iter()
            .enumerate()
            .filter(|(j, _)| !is_active(n_eq + j))
            .map(|(j, c)| (j, c, (c.normal.dot(x) - c.rhs) / (1.0 + c.rhs.abs())))
            .filter(|(_, _, violation)| *violation < -self.config.tolerance)
            .min_by(|a, b| a.2.total_cmp(&b.2))
            .map(|(j, c, _)| (n_eq + j, c.normal.clone(), c.rhs))
    }
}

/// Primal direction `z` and dual direction `r` for adding `normal`.
///
/// With `N` the active normals: `r = (NᵀG⁻¹N)⁻¹ NᵀG⁻¹ n` and
/// `z = G⁻¹n - G⁻¹N r`.
///
/// A singular `NᵀG⁻¹N` means the last constraint added was numerically a
/// combination of the others with no multiplier left to release, so the
/// constraints cannot all hold.
fn step_directions(
    g_inv: &Array2<f64>,
    active: &[ActiveConstraint],
    normal: &Array1<f64>,
) -> Result<(Array1<f64>, Array1<f64>), SolverError> {
    let h_n = g_inv.dot(normal);
    if active.is_empty() {
        return Ok((h_n, Array1::zeros(0)));
    }

    let mut n_mat = Array2::<f64>::zeros((normal.len(), active.len()));
    for (j, c) in active.iter().enumerate() {
        n_mat.column_mut(j).assign(&c.normal);
    }
    let b = g_inv.dot(&n_mat);
    let m = n_mat.t().dot(&b);
    let r = solve_spd(&m, &b.t().dot(normal)).map_err(|err| {
        SolverError::Infeasible(format!("active constraints are linearly dependent: {err}"))
    })?;
    let z = h_n - b.dot(&r);
    Ok((z, r))
}

impl ConvexQpSolver for DualActiveSetSolver {
    fn solve(&self, problem: &QuadraticProgram) -> Result<QpSolution, SolverError> {
        problem.validate()?;
        let tol = self.config.tolerance;

        let g_inv = inverse_spd(problem.hessian())
            .map_err(|err| SolverError::NotPositiveDefinite(err.to_string()))?;
        let mut x = -g_inv.dot(problem.linear());

        let n_eq = problem.equalities().len();
        let mut redundant = vec![false; n_eq];
        let mut active: Vec<ActiveConstraint> = Vec::new();
        let mut iterations = 0;

        while let Some((index, normal, rhs)) = self.next_violated(problem, &x, &active, &redundant)
        {
            let equality = index < n_eq;
            let mut multiplier = 0.0;

            loop {
                iterations += 1;
                if iterations > self.config.max_iterations {
                    return Err(SolverError::DidNotConverge {
                        iterations: self.config.max_iterations,
                        reason: "iteration limit reached".to_string(),
                    });
                }

                let slack = normal.dot(&x) - rhs;
                let (z, r) = step_directions(&g_inv, &active, &normal)?;

                // Largest dual step keeping active inequality multipliers >= 0
                let mut t1 = f64::INFINITY;
                let mut blocking = None;
                for (j, (c, &rj)) in active.iter().zip(r.iter()).enumerate() {
                    if !c.equality && rj > tol {
                        let ratio = c.multiplier / rj;
                        if ratio < t1 {
                            t1 = ratio;
                            blocking = Some(j);
                        }
                    }
                }

                // Full step that makes the new constraint tight
                let curvature = z.dot(&normal);
                let scale = normal.dot(&g_inv.dot(&normal));
                let t2 = if curvature > DEGENERACY_RATIO * scale {
                    -slack / curvature
                } else {
                    f64::INFINITY
                };

                match (blocking, t2.is_finite()) {
                    (None, false) => {
                        if equality && slack.abs() <= tol * (1.0 + rhs.abs()) {
                            // Implied by the constraints already active
                            redundant[index] = true;
                            break;
                        }
                        return Err(SolverError::Infeasible(format!(
                            "constraint {index} cannot be satisfied together with the active set"
                        )));
                    }
                    (Some(j), false) => {
                        for (c, &rj) in active.iter_mut().zip(r.iter()) {
                            c.multiplier -= t1 * rj;
                        }
                        multiplier += t1;
                        active.remove(j);
                    }
                    (_, true) => {
                        let t = t1.min(t2);
                        x.scaled_add(t, &z);
                        for (c, &rj) in active.iter_mut().zip(r.iter()) {
                            c.multiplier -= t * rj;
                        }
                        multiplier += t;

                        if t2 <= t1 {
                            active.push(ActiveConstraint {
                                index,
                                normal,
                                equality,
                                multiplier,
                            });
                            break;
                        }
                        if let Some(j) = blocking {
                            active.remove(j);
                        }
                    }
                }
            }
        }

        debug!(iterations, active = active.len(), "quadratic program solved");
        Ok(QpSolution {
            objective: problem.objective(&x),
            x,
            iterations,
        })
    }
}
