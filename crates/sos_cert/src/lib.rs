//! Numerical Putinar certificates for polynomial nonnegativity.
//!
//! Given a target polynomial `P` and domain constraints `g_i >= 0`, the
//! pipeline searches for PSD Gram matrices witnessing
//! `P = sigma_0 + sum_i g_i * sigma_i` with each `sigma` a sum of squares:
//!
//! 1. [`builder`] matches monomial bases and emits one equality row per
//!    target monomial over the flat Gram variables,
//! 2. [`conic`] flattens that into `{A x = b, x in cones}` with svec
//!    scaling and RHS conditioning,
//! 3. [`solver`] runs one of two backends (first-order splitting or an
//!    interior-point phase-I method),
//! 4. [`validator`] rebuilds the decomposition coefficient-wise and
//!    measures how much of the claim actually holds.
//!
//! Fatal conditions (non-polynomial input, variable count mismatches) are
//! errors; everything else is data: warnings ride along in a `Vec`,
//! solver failure is a status, and a bad certificate is a report with a
//! large residual.

pub mod builder;
pub mod conic;
pub mod error;
pub mod layout;
pub mod solver;
pub mod system;
pub mod validator;

pub use builder::build_program;
pub use conic::{assemble, Cone, ConicProgram};
pub use error::{BuildWarning, CertError};
pub use layout::{BlockLayout, GramBlock};
pub use solver::{
    solve_with, Backend, ConicSolver, FirstOrderSplitting, InteriorPoint, SolverOptions,
    SolverResult, SolverStatus,
};
pub use system::ConstraintSystem;
pub use validator::{gram_blocks, validate, CertificateReport};

use sos_poly::CoefficientMap;
use tracing::{debug, info};

/// Everything one certificate attempt produces.
#[derive(Clone, Debug)]
pub struct CertifyOutcome {
    /// Which backend produced `result`.
    pub backend: Backend,
    pub result: SolverResult,
    /// Present whenever the backend handed back a candidate solution.
    pub report: Option<CertificateReport>,
    pub warnings: Vec<BuildWarning>,
}

impl CertifyOutcome {
    /// Solved status plus a validated reconstruction within tolerance.
    pub fn is_certified(&self, opts: &SolverOptions) -> bool {
        matches!(
            self.result.status,
            SolverStatus::Solved | SolverStatus::AlmostSolved
        ) && self
            .report
            .as_ref()
            .is_some_and(|r| r.passes(opts.rel_tol * r.scale.max(1.0), opts.rel_tol))
    }
}

/// Run the full pipeline with one backend.
pub fn certify(
    target: &CoefficientMap,
    constraints: &[CoefficientMap],
    backend: Backend,
    opts: &SolverOptions,
) -> Result<CertifyOutcome, CertError> {
    let (system, mut warnings) = build_program(target, constraints)?;
    let (prog, assembly_warnings) = assemble(&system);
    warnings.extend(assembly_warnings);

    let result = solve_with(backend, &prog, opts);
    let report = result
        .x
        .as_deref()
        .map(|x| validate(target, constraints, &prog, x));
    info!(
        ?backend,
        status = ?result.status,
        iterations = result.iterations,
        "certificate attempt finished"
    );
    Ok(CertifyOutcome {
        backend,
        result,
        report,
        warnings,
    })
}

/// Expression-level front end: encode the target and constraints in
/// `nvars` variables, then run [`certify`]. Encoder failures are fatal
/// for this instance and propagate as [`CertError::Poly`].
pub fn certify_expr(
    target: &sos_poly::Expr,
    constraints: &[sos_poly::Expr],
    nvars: usize,
    backend: Backend,
    opts: &SolverOptions,
) -> Result<CertifyOutcome, CertError> {
    let p = sos_poly::encode(target, nvars)?;
    let gs = constraints
        .iter()
        .map(|g| sos_poly::encode(g, nvars))
        .collect::<Result<Vec<_>, _>>()?;
    certify(&p, &gs, backend, opts)
}

/// Cheap-first policy: try the splitting backend, escalate to interior
/// point when the result is not a validated certificate. The escalation
/// also covers the splitting method's blind spot: it can never certify
/// infeasibility, the interior-point method can.
pub fn certify_with_fallback(
    target: &CoefficientMap,
    constraints: &[CoefficientMap],
    opts: &SolverOptions,
) -> Result<CertifyOutcome, CertError> {
    let first = certify(target, constraints, Backend::FirstOrder, opts)?;
    if first.is_certified(opts) {
        return Ok(first);
    }
    debug!(
        status = ?first.result.status,
        "first-order attempt not certified, escalating"
    );
    certify(target, constraints, Backend::InteriorPoint, opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sos_poly::{encode, Expr};

    #[test]
    fn certify_simple_sos_with_first_order() {
        let x = Expr::var(0);
        let p = encode(&(x.pow(2) + Expr::num(1.0)), 1).unwrap();
        let outcome = certify(&p, &[], Backend::FirstOrder, &SolverOptions::default()).unwrap();
        assert_eq!(outcome.result.status, SolverStatus::Solved);
        assert!(outcome.is_certified(&SolverOptions::default()));
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn fallback_escalates_to_an_infeasibility_certificate() {
        // P = -1 is not nonnegative anywhere; only the interior-point
        // backend can say so.
        let p = encode(&Expr::num(-1.0), 1).unwrap();
        let outcome =
            certify_with_fallback(&p, &[], &SolverOptions::default()).unwrap();
        assert_eq!(outcome.backend, Backend::InteriorPoint);
        assert_eq!(outcome.result.status, SolverStatus::Infeasible);
        assert!(outcome.report.is_none());
    }

    #[test]
    fn expr_front_end_rejects_non_polynomials() {
        let e = Expr::func("sin", Expr::var(0));
        assert!(matches!(
            certify_expr(&e, &[], 1, Backend::FirstOrder, &SolverOptions::default()),
            Err(CertError::Poly(_))
        ));
    }

    #[test]
    fn var_mismatch_propagates() {
        let p = encode(&Expr::var(0), 1).unwrap();
        let g = encode(&Expr::var(1), 2).unwrap();
        assert!(matches!(
            certify_with_fallback(&p, &[g], &SolverOptions::default()),
            Err(CertError::VarMismatch { .. })
        ));
    }
}
