//! First-order splitting backend.
//!
//! ADMM on the feasibility split `x = z`, `A x = b`, `z in K`:
//! alternate an affine projection (through a cached Cholesky of
//! `A A^T + reg I`) with per-block PSD projections, plus a scaled dual
//! update. Iterations are cheap, but on certificates with near-zero
//! margin the residuals can stall above tolerance; that stall is reported
//! as `AlmostSolved`, never as infeasibility (alternating projections
//! cannot certify it).

use super::{psd_sides, ConicSolver, SolverOptions, SolverResult, SolverStatus};
use crate::conic::ConicProgram;
use sos_linalg::{project_psd_svec, tri_len, CholeskyFactor};
use std::time::Instant;
use tracing::{debug, trace};

/// Diagonal regularization for `A A^T` (redundant equality rows are
/// common: every monomial gets a row whether or not the target mentions
/// it).
const AAT_REG: f64 = 1e-10;

/// How often residuals are checked.
const CHECK_EVERY: usize = 10;

#[derive(Clone, Debug, Default)]
pub struct FirstOrderSplitting;

impl ConicSolver for FirstOrderSplitting {
    fn name(&self) -> &'static str {
        "first-order-splitting"
    }

    fn solve(&self, prog: &ConicProgram, opts: &SolverOptions) -> SolverResult {
        let start = Instant::now();
        let n = prog.num_vars();
        let sides = psd_sides(prog);
        debug_assert_eq!(sides.iter().map(|&s| tri_len(s)).sum::<usize>(), n);

        let aat = prog.a.aat();
        let Some(chol) = CholeskyFactor::factor(&aat, AAT_REG) else {
            return SolverResult {
                status: SolverStatus::Failed,
                iterations: 0,
                wall_time: start.elapsed(),
                x: None,
            };
        };

        let b_norm = prog.b.iter().fold(0.0_f64, |a, v| a.max(v.abs()));
        let project_affine = |w: &[f64]| -> Vec<f64> {
            let mut r = prog.a.mat_vec(w);
            for (ri, bi) in r.iter_mut().zip(prog.b.iter()) {
                *ri -= bi;
            }
            let lam = chol.solve(&r);
            let corr = prog.a.mat_tvec(&lam);
            w.iter().zip(corr.iter()).map(|(wi, ci)| wi - ci).collect()
        };

        let mut x = vec![0.0; n];
        let mut z = vec![0.0; n];
        let mut u = vec![0.0; n];
        let mut primal = f64::INFINITY;
        let mut consensus = f64::INFINITY;
        let mut iters = 0;

        for iter in 1..=opts.max_iterations {
            iters = iter;

            // x-step: project z - u onto {A x = b}.
            let w: Vec<f64> = z.iter().zip(u.iter()).map(|(zi, ui)| zi - ui).collect();
            x = project_affine(&w);

            // z-step: project x + u onto the PSD cone stack.
            for (zi, (xi, ui)) in z.iter_mut().zip(x.iter().zip(u.iter())) {
                *zi = xi + ui;
            }
            let mut offset = 0;
            for &side in &sides {
                let len = tri_len(side);
                project_psd_svec(&mut z[offset..offset + len], side);
                offset += len;
            }

            // Dual update.
            for (ui, (xi, zi)) in u.iter_mut().zip(x.iter().zip(z.iter())) {
                *ui += xi - zi;
            }

            if iter % CHECK_EVERY == 0 || iter == opts.max_iterations {
                let ax = prog.a.mat_vec(&x);
                primal = ax
                    .iter()
                    .zip(prog.b.iter())
                    .fold(0.0_f64, |a, (l, r)| a.max((l - r).abs()))
                    / (1.0 + b_norm);
                consensus = x
                    .iter()
                    .zip(z.iter())
                    .fold(0.0_f64, |a, (l, r)| a.max((l - r).abs()));
                trace!(iter, primal, consensus, "splitting residuals");
                if primal <= opts.abs_tol && consensus <= opts.abs_tol {
                    debug!(iter, primal, consensus, "splitting converged");
                    return SolverResult {
                        status: SolverStatus::Solved,
                        iterations: iter,
                        wall_time: start.elapsed(),
                        x: Some(x),
                    };
                }
                if let Some(limit) = opts.time_limit {
                    if start.elapsed() >= limit {
                        break;
                    }
                }
            }
        }

        // Stalled: near-feasible iterates are still useful to a caller
        // that validates residuals before trusting the certificate.
        let status = if primal <= opts.rel_tol && consensus <= opts.rel_tol {
            SolverStatus::AlmostSolved
        } else {
            SolverStatus::Failed
        };
        debug!(?status, primal, consensus, "splitting stopped");
        SolverResult {
            status,
            iterations: iters,
            wall_time: start.elapsed(),
            x: if status == SolverStatus::AlmostSolved {
                Some(x)
            } else {
                None
            },
        }
    }
}
