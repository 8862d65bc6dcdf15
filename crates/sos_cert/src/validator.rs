//! Certificate validation.
//!
//! A solver's "solved" status is a claim, not a proof. The validator reads
//! the Gram blocks back out of the flat conic solution (undoing the svec
//! scaling and the RHS conditioning exactly once each), recomputes
//! `sigma_0 + sum_i g_i * sigma_i` coefficient by coefficient, and reports
//! the worst residual against the target together with every block's
//! minimum eigenvalue. Everything is measured in the original units of the
//! input polynomial, so residual tolerances scale with its coefficients.

use crate::conic::ConicProgram;
use serde::Serialize;
use sos_linalg::{min_eigenvalue, DenseMatrix, SQRT_2};
use sos_poly::{CoefficientMap, MonomialBasis};
use tracing::debug;

/// What the validator measures about a claimed certificate.
#[derive(Clone, Debug, Serialize)]
pub struct CertificateReport {
    /// Largest absolute coefficient of `rebuilt - target`.
    pub max_residual: f64,
    /// Minimum eigenvalue of each Gram block, in layout order.
    pub block_min_eigenvalues: Vec<f64>,
    /// Conditioning factor the program was solved under; residual
    /// tolerances in original units should grow with it.
    pub scale: f64,
}

impl CertificateReport {
    /// Whether every block is PSD up to `eig_tol` and the reconstruction
    /// residual stays under `residual_tol`.
    pub fn passes(&self, residual_tol: f64, eig_tol: f64) -> bool {
        self.max_residual <= residual_tol
            && self.block_min_eigenvalues.iter().all(|&w| w >= -eig_tol)
    }
}

/// Gram matrices recovered from a flat conic solution, in original
/// (unconditioned) units.
pub fn gram_blocks(prog: &ConicProgram, x: &[f64]) -> Vec<DenseMatrix<f64>> {
    let mut out = Vec::with_capacity(prog.layout.blocks.len());
    for block in &prog.layout.blocks {
        let mut g = DenseMatrix::zeros(block.side, block.side);
        for p in 0..block.side {
            for q in p..block.side {
                let v = x[block.tri_index(p, q)];
                let unscaled = if p == q { v } else { v / SQRT_2 };
                let entry = unscaled * prog.scale;
                g.set(p, q, entry);
                g.set(q, p, entry);
            }
        }
        out.push(g);
    }
    out
}

/// Check a claimed certificate against the target and its constraints.
///
/// `constraints` must be the same slice the program was built from: block
/// multiplier indices refer into it (dropped blocks simply never appear in
/// the layout).
pub fn validate(
    target: &CoefficientMap,
    constraints: &[CoefficientMap],
    prog: &ConicProgram,
    x: &[f64],
) -> CertificateReport {
    let nvars = target.nvars();
    let blocks = gram_blocks(prog, x);

    let mut rebuilt = CoefficientMap::new(nvars);
    for (meta, gram) in prog.layout.blocks.iter().zip(blocks.iter()) {
        let basis = MonomialBasis::generate(nvars, meta.half_degree);
        debug_assert_eq!(basis.len(), meta.side);

        // sigma = v^T G v expanded over the block's monomial basis.
        let mut sigma = CoefficientMap::new(nvars);
        for p in 0..meta.side {
            for q in p..meta.side {
                let w = if p == q {
                    *gram.at(p, q)
                } else {
                    2.0 * gram.at(p, q)
                };
                if w == 0.0 {
                    continue;
                }
                sigma.add_term(basis.monomials()[p].mul(&basis.monomials()[q]), w);
            }
        }

        match meta.multiplier {
            None => {
                for (m, c) in sigma.iter() {
                    rebuilt.add_term(m.clone(), c);
                }
            }
            Some(i) => {
                for (beta, g_coeff) in constraints[i].iter() {
                    for (m, c) in sigma.iter() {
                        rebuilt.add_term(beta.mul(m), g_coeff * c);
                    }
                }
            }
        }
    }

    let max_residual = rebuilt.sub(target).max_abs_coeff();
    let block_min_eigenvalues: Vec<f64> = blocks.iter().map(min_eigenvalue).collect();
    debug!(
        max_residual,
        worst_eig = block_min_eigenvalues
            .iter()
            .fold(f64::INFINITY, |a, &b| a.min(b)),
        "validated certificate"
    );
    CertificateReport {
        max_residual,
        block_min_eigenvalues,
        scale: prog.scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_program;
    use crate::conic::assemble;
    use sos_poly::{encode, Expr};

    fn x() -> Expr {
        Expr::var(0)
    }

    fn y() -> Expr {
        Expr::var(1)
    }

    fn program_for(
        target: &Expr,
        constraints: &[Expr],
        nvars: usize,
    ) -> (CoefficientMap, Vec<CoefficientMap>, ConicProgram) {
        let p = encode(target, nvars).unwrap();
        let gs: Vec<CoefficientMap> = constraints
            .iter()
            .map(|g| encode(g, nvars).unwrap())
            .collect();
        let (sys, _) = build_program(&p, &gs).unwrap();
        let (prog, _) = assemble(&sys);
        (p, gs, prog)
    }

    #[test]
    fn exact_diagonal_certificate_has_zero_residual() {
        // x^2 + y^2 = v^T diag(0, 1, 1) v over v = (1, x, y).
        let (p, gs, prog) = program_for(&(x().pow(2) + y().pow(2)), &[], 2);
        let sol = vec![0.0, 0.0, 0.0, 1.0, 0.0, 1.0];
        let report = validate(&p, &gs, &prog, &sol);
        assert!(report.max_residual < 1e-12);
        assert_eq!(report.block_min_eigenvalues.len(), 1);
        assert!(report.block_min_eigenvalues[0].abs() < 1e-12);
        assert!(report.passes(1e-9, 1e-9));
    }

    #[test]
    fn off_diagonal_scaling_is_undone_exactly_once() {
        // (x + y)^2: Gram has a unit off-diagonal, stored as sqrt(2) in
        // the conic vector.
        let (p, gs, prog) = program_for(&((x() + y()).pow(2)), &[], 2);
        let sol = vec![0.0, 0.0, 0.0, 1.0, SQRT_2, 1.0];
        let report = validate(&p, &gs, &prog, &sol);
        assert!(report.max_residual < 1e-12);
        let grams = gram_blocks(&prog, &sol);
        assert!((grams[0].at(1, 2) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn conditioning_scale_is_reapplied() {
        // 500 x^2 solves as x^2 after conditioning; the report must be in
        // original units.
        let (p, gs, prog) = program_for(&(Expr::num(500.0) * x().pow(2)), &[], 1);
        assert_eq!(prog.scale, 500.0);
        let sol = vec![0.0, 0.0, 1.0];
        let report = validate(&p, &gs, &prog, &sol);
        assert!(report.max_residual < 1e-9);
        assert_eq!(report.scale, 500.0);
        let grams = gram_blocks(&prog, &sol);
        assert!((grams[0].at(1, 1) - 500.0).abs() < 1e-9);
    }

    #[test]
    fn constraint_blocks_multiply_through() {
        // P = x over {x >= 0}: sigma_0 = 0, sigma_1 = 1.
        let (p, gs, prog) = program_for(&x(), &[x()], 1);
        let sol = vec![0.0, 1.0];
        let report = validate(&p, &gs, &prog, &sol);
        assert!(report.max_residual < 1e-12);
        assert_eq!(report.block_min_eigenvalues, vec![0.0, 1.0]);
    }

    #[test]
    fn symbolic_residual_agrees_with_grid_evaluation() {
        // Cross-check: v^T G v evaluated pointwise must match the target
        // wherever the coefficient residual is zero.
        let (p, gs, prog) = program_for(&((x() + y()).pow(2)), &[], 2);
        let sol = vec![0.0, 0.0, 0.0, 1.0, SQRT_2, 1.0];
        let report = validate(&p, &gs, &prog, &sol);
        assert!(report.max_residual < 1e-12);

        let gram = &gram_blocks(&prog, &sol)[0];
        let basis = MonomialBasis::generate(2, prog.layout.blocks[0].half_degree);
        for &(px, py) in &[(0.0, 0.0), (1.0, -1.0), (0.5, 2.0), (-3.0, 1.0)] {
            let point = [px, py];
            let v: Vec<f64> = basis
                .iter()
                .map(|m| {
                    CoefficientMap::from_terms(2, [(m.clone(), 1.0)]).eval_at(&point)
                })
                .collect();
            let mut quad = 0.0;
            for p_i in 0..3 {
                for q_i in 0..3 {
                    quad += v[p_i] * gram.at(p_i, q_i) * v[q_i];
                }
            }
            assert!((quad - p.eval_at(&point)).abs() < 1e-10);
        }
    }

    #[test]
    fn wrong_solution_reports_residual() {
        let (p, gs, prog) = program_for(&(x().pow(2) + y().pow(2)), &[], 2);
        // Missing the y^2 contribution entirely.
        let sol = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let report = validate(&p, &gs, &prog, &sol);
        assert!((report.max_residual - 1.0).abs() < 1e-12);
        assert!(!report.passes(1e-6, 1e-6));
    }
}
