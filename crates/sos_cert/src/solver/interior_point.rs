//! Interior-point phase-I backend.
//!
//! Solves `min t  s.t.  A x = b,  X_k + t I > 0` with a log-det barrier
//! and damped Newton steps on the KKT system. The optimal margin `t*`
//! classifies the program: a clearly negative or tiny `t*` means the
//! equality system admits a PSD point, a `t*` bounded away from zero is a
//! genuine infeasibility certificate. This is the only backend allowed to
//! return `Infeasible`.
//!
//! All matrices here are dense; program sizes on the certificate path are
//! small (tens of Gram variables), so factorization cost is irrelevant
//! next to robustness.

use super::{psd_sides, ConicSolver, SolverOptions, SolverResult, SolverStatus};
use crate::conic::ConicProgram;
use sos_linalg::{
    min_eigenvalue, smat, solve_linear, tri_len, CholeskyFactor, DenseMatrix, Floats, SQRT_2,
};
use std::time::Instant;
use tracing::{debug, trace};

/// Diagonal regularization for the initial min-norm projection.
const AAT_REG: f64 = 1e-10;

/// Barrier parameter schedule.
const MU_SHRINK: f64 = 0.15;
const MU_MIN: f64 = 1e-9;

/// Tikhonov term on the Hessian block of the KKT matrix.
const HESS_REG: f64 = 1e-12;

/// Newton steps per centering before the schedule advances anyway.
const MAX_CENTERING: usize = 40;

/// Squared-Newton-decrement threshold for a centered iterate.
const CENTER_TOL: f64 = 1e-9;

#[derive(Clone, Debug, Default)]
pub struct InteriorPoint;

/// PSD blocks as (offset into x, side) pairs.
fn block_spans(sides: &[usize]) -> Vec<(usize, usize)> {
    let mut spans = Vec::with_capacity(sides.len());
    let mut offset = 0;
    for &side in sides {
        spans.push((offset, side));
        offset += tri_len(side);
    }
    spans
}

/// Cholesky factors of the slacks `S_k = X_k + t I`, or `None` if any
/// fails to be PD.
fn slack_factors(x: &[f64], t: f64, spans: &[(usize, usize)]) -> Option<Vec<CholeskyFactor>> {
    let mut out = Vec::with_capacity(spans.len());
    for &(offset, side) in spans {
        let mut s = smat(side, &x[offset..offset + tri_len(side)]);
        for i in 0..side {
            *s.at_mut(i, i) += t;
        }
        out.push(CholeskyFactor::factor(&s, 0.0)?);
    }
    Some(out)
}

/// Barrier objective `t / mu - sum_k log det S_k` at a point, `None` when
/// the point leaves the cone interior.
fn barrier_value(x: &[f64], t: f64, mu: f64, spans: &[(usize, usize)]) -> Option<f64> {
    let factors = slack_factors(x, t, spans)?;
    let log_dets: f64 = factors.iter().map(CholeskyFactor::log_det).sum();
    Some(t / mu - log_dets)
}

/// Hessian entry of `-log det S` in svec coordinates: direction pair
/// `(p, q)` against `(r, s)` through `S^{-1}`.
fn barrier_hess_entry(inv: &DenseMatrix<f64>, (p, q): (usize, usize), (r, s): (usize, usize)) -> f64 {
    let base = if p == q {
        inv.at(r, p) * inv.at(s, p)
    } else {
        (inv.at(r, p) * inv.at(s, q) + inv.at(r, q) * inv.at(s, p)) / SQRT_2
    };
    if r == s {
        base
    } else {
        base * SQRT_2
    }
}

impl ConicSolver for InteriorPoint {
    fn name(&self) -> &'static str {
        "interior-point"
    }

    fn solve(&self, prog: &ConicProgram, opts: &SolverOptions) -> SolverResult {
        let start = Instant::now();
        let n = prog.num_vars();
        let n_eq = prog.num_rows();
        let spans = block_spans(&psd_sides(prog));
        let dim = n + 1; // x plus the margin t
        let failed = |iterations: usize| SolverResult {
            status: SolverStatus::Failed,
            iterations,
            wall_time: start.elapsed(),
            x: None,
        };

        // Min-norm point on {A x = b}. A residual here is a residual of
        // the equality system itself: the program is infeasible before any
        // cone enters the picture.
        let Some(aat_chol) = CholeskyFactor::factor(&prog.a.aat(), AAT_REG) else {
            return failed(0);
        };
        let lam = aat_chol.solve(&prog.b);
        let mut x = prog.a.mat_tvec(&lam);
        let b_norm = prog.b.iter().fold(0.0_f64, |a, v| a.max(v.abs()));
        let eq_residual = prog
            .a
            .mat_vec(&x)
            .iter()
            .zip(prog.b.iter())
            .fold(0.0_f64, |a, (l, r)| a.max((l - r).abs()));
        if eq_residual > 1e-6 * (1.0 + b_norm) {
            debug!(eq_residual, "equality system inconsistent");
            return SolverResult {
                status: SolverStatus::Infeasible,
                iterations: 0,
                wall_time: start.elapsed(),
                x: None,
            };
        }

        // Margin that makes every slack comfortably PD at the start.
        let mut t: f64 = 1.0;
        for &(offset, side) in &spans {
            let s = smat(side, &x[offset..offset + tri_len(side)]);
            t = t.max(1.0 - min_eigenvalue(&s));
        }

        let arith = Floats::default();
        let mut a_dense = DenseMatrix::zeros(n_eq, n);
        for c in 0..prog.a.ncols {
            for k in prog.a.colptr[c]..prog.a.colptr[c + 1] {
                a_dense.set(prog.a.rowval[k], c, prog.a.nzval[k]);
            }
        }

        let mut mu = t.abs().max(1.0);
        let mut newton_steps = 0;
        let mut exhausted = false;

        'outer: while mu > MU_MIN {
            for _ in 0..MAX_CENTERING {
                if newton_steps >= opts.max_iterations {
                    exhausted = true;
                    break 'outer;
                }
                if let Some(limit) = opts.time_limit {
                    if start.elapsed() >= limit {
                        exhausted = true;
                        break 'outer;
                    }
                }
                newton_steps += 1;

                let Some(factors) = slack_factors(&x, t, &spans) else {
                    return failed(newton_steps);
                };

                // Gradient and Hessian of t/mu - sum log det S_k, in svec
                // coordinates (an isometry, so no extra scaling appears).
                let mut grad = vec![0.0; dim];
                grad[n] = 1.0 / mu;
                let mut hess = DenseMatrix::zeros(dim, dim);
                for (&(offset, side), chol) in spans.iter().zip(factors.iter()) {
                    let inv = chol.inverse();
                    let mut inv2 = DenseMatrix::zeros(side, side);
                    for p in 0..side {
                        for q in 0..side {
                            let mut acc = 0.0;
                            for k in 0..side {
                                acc += inv.at(p, k) * inv.at(k, q);
                            }
                            inv2.set(p, q, acc);
                        }
                    }

                    let mut coords = Vec::with_capacity(tri_len(side));
                    for p in 0..side {
                        for q in p..side {
                            coords.push((p, q));
                        }
                    }
                    for (i, &(p, q)) in coords.iter().enumerate() {
                        let gi = if p == q {
                            *inv.at(p, p)
                        } else {
                            inv.at(p, q) * SQRT_2
                        };
                        grad[offset + i] -= gi;
                        let cross = if p == q {
                            *inv2.at(p, p)
                        } else {
                            inv2.at(p, q) * SQRT_2
                        };
                        *hess.at_mut(offset + i, n) += cross;
                        *hess.at_mut(n, offset + i) += cross;
                        for (j, &pq2) in coords.iter().enumerate() {
                            *hess.at_mut(offset + i, offset + j) +=
                                barrier_hess_entry(&inv, (p, q), pq2);
                        }
                    }
                    for p in 0..side {
                        grad[n] -= inv.at(p, p);
                        *hess.at_mut(n, n) += inv2.at(p, p);
                    }
                }

                // KKT system [[H, A~^T], [A~, 0]] with A~ = [A | 0]: the
                // margin t is unconstrained by the equalities.
                let kdim = dim + n_eq;
                let mut kkt = DenseMatrix::zeros(kdim, kdim);
                for i in 0..dim {
                    for j in 0..dim {
                        kkt.set(i, j, *hess.at(i, j));
                    }
                    *kkt.at_mut(i, i) += HESS_REG;
                }
                for r in 0..n_eq {
                    for c in 0..n {
                        let v = *a_dense.at(r, c);
                        kkt.set(dim + r, c, v);
                        kkt.set(c, dim + r, v);
                    }
                }
                let ax = prog.a.mat_vec(&x);
                let mut rhs = vec![0.0; kdim];
                for i in 0..dim {
                    rhs[i] = -grad[i];
                }
                for r in 0..n_eq {
                    rhs[dim + r] = prog.b[r] - ax[r];
                }
                let Some(sol) = solve_linear(&arith, &kkt, &rhs) else {
                    return failed(newton_steps);
                };
                let dy = &sol[..dim];

                let decrement = -grad.iter().zip(dy.iter()).map(|(g, d)| g * d).sum::<f64>();
                trace!(mu, t, decrement, step = newton_steps, "newton step");
                if decrement.abs() < CENTER_TOL {
                    break;
                }

                // Backtrack until the step stays interior and decreases
                // the barrier objective.
                let g_dot_dy = -decrement;
                let Some(f_cur) = barrier_value(&x, t, mu, &spans) else {
                    return failed(newton_steps);
                };
                let mut alpha = 1.0;
                let mut accepted = false;
                for _ in 0..60 {
                    let x_try: Vec<f64> = x
                        .iter()
                        .zip(dy.iter())
                        .map(|(xi, di)| xi + alpha * di)
                        .collect();
                    let t_try = t + alpha * dy[n];
                    if let Some(f_try) = barrier_value(&x_try, t_try, mu, &spans) {
                        if f_try <= f_cur + 1e-4 * alpha * g_dot_dy {
                            x = x_try;
                            t = t_try;
                            accepted = true;
                            break;
                        }
                    }
                    alpha *= 0.5;
                }
                if !accepted {
                    // Line search stalled at this mu; let the schedule
                    // move on with the current iterate.
                    break;
                }
            }

            // A negative or tiny margin already settles the question.
            if t < 0.0 || t <= 0.1 * opts.abs_tol {
                break;
            }
            mu *= MU_SHRINK;
        }

        let status = if t <= opts.abs_tol {
            SolverStatus::Solved
        } else if t <= opts.rel_tol {
            SolverStatus::AlmostSolved
        } else if exhausted {
            SolverStatus::Failed
        } else {
            SolverStatus::Infeasible
        };
        debug!(?status, t, newton_steps, "interior point finished");
        SolverResult {
            status,
            iterations: newton_steps,
            wall_time: start.elapsed(),
            x: match status {
                SolverStatus::Solved | SolverStatus::AlmostSolved => Some(x),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conic::{Cone, ConicProgram};
    use crate::layout::BlockLayout;
    use sos_linalg::CscMatrix;

    fn tiny_program(b0: f64) -> ConicProgram {
        let mut layout = BlockLayout::default();
        layout.push_block(1, None, 0);
        ConicProgram {
            a: CscMatrix::from_triplets(1, 1, vec![(0, 0, 1.0)]),
            b: vec![b0],
            c: vec![0.0],
            cones: vec![Cone::Zero(1), Cone::Psd(1)],
            layout,
            scale: 1.0,
        }
    }

    #[test]
    fn feasible_scalar_problem() {
        let prog = tiny_program(2.0);
        let res = InteriorPoint.solve(&prog, &SolverOptions::default());
        assert_eq!(res.status, SolverStatus::Solved);
        let x = res.x.unwrap();
        assert!((x[0] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn infeasible_scalar_problem_is_certified() {
        // x = -1 with x >= 0: the optimal margin is t* = 1.
        let prog = tiny_program(-1.0);
        let res = InteriorPoint.solve(&prog, &SolverOptions::default());
        assert_eq!(res.status, SolverStatus::Infeasible);
        assert!(res.x.is_none());
    }

    #[test]
    fn time_limit_stops_before_any_newton_step() {
        // The budget is checked at the top of every Newton step; an
        // expired one leaves the undecided margin as Failed, not as a
        // bogus infeasibility claim.
        let prog = tiny_program(-1.0);
        let opts = SolverOptions {
            time_limit: Some(std::time::Duration::ZERO),
            ..Default::default()
        };
        let res = InteriorPoint.solve(&prog, &opts);
        assert_eq!(res.status, SolverStatus::Failed);
        assert_eq!(res.iterations, 0);
    }

    #[test]
    fn inconsistent_equalities_are_infeasible_without_iterating() {
        // Two contradictory equalities on one variable.
        let mut layout = BlockLayout::default();
        layout.push_block(1, None, 0);
        let prog = ConicProgram {
            a: CscMatrix::from_triplets(2, 1, vec![(0, 0, 1.0), (1, 0, 1.0)]),
            b: vec![1.0, 3.0],
            c: vec![0.0],
            cones: vec![Cone::Zero(2), Cone::Psd(1)],
            layout,
            scale: 1.0,
        };
        let res = InteriorPoint.solve(&prog, &SolverOptions::default());
        assert_eq!(res.status, SolverStatus::Infeasible);
        assert_eq!(res.iterations, 0);
    }

    #[test]
    fn two_by_two_block_with_coupled_entries() {
        // Gram variables (svec of a 2x2 block) tied by x_00 + x_11 = 2 and
        // the off-diagonal pinned to zero: diag(1, 1) is strictly feasible.
        let mut layout = BlockLayout::default();
        layout.push_block(2, None, 1);
        let prog = ConicProgram {
            a: CscMatrix::from_triplets(
                2,
                3,
                vec![(0, 0, 1.0), (0, 2, 1.0), (1, 1, 1.0)],
            ),
            b: vec![2.0, 0.0],
            c: vec![0.0; 3],
            cones: vec![Cone::Zero(2), Cone::Psd(2)],
            layout,
            scale: 1.0,
        };
        let res = InteriorPoint.solve(&prog, &SolverOptions::default());
        assert_eq!(res.status, SolverStatus::Solved);
        let x = res.x.unwrap();
        assert!((x[0] + x[2] - 2.0).abs() < 1e-6);
        assert!(x[1].abs() < 1e-4);
        let s = smat(2, &x);
        assert!(min_eigenvalue(&s) > -1e-7);
    }
}
