//! Solver backends behind one interface.
//!
//! Two interchangeable backends solve the conic feasibility problem:
//! a first-order splitting method (cheap iterations, may stall near a
//! zero-margin certificate) and an interior-point phase-I method (slower,
//! robust on tight margins, and the only one that certifies
//! infeasibility). Which one to run is caller policy, not part of this
//! module's contract. Backends never panic and never return `Err`:
//! failure is a status.

mod first_order;
mod interior_point;

pub use first_order::FirstOrderSplitting;
pub use interior_point::InteriorPoint;

use crate::conic::ConicProgram;
use serde::Serialize;
use std::time::Duration;

/// Numerical knobs shared by both backends.
#[derive(Clone, Debug)]
pub struct SolverOptions {
    /// Iteration cap (splitting iterations / Newton steps).
    pub max_iterations: usize,
    /// Residual / feasibility margin for `Solved`.
    pub abs_tol: f64,
    /// Looser margin for `AlmostSolved`.
    pub rel_tol: f64,
    /// Best-effort wall-clock budget, checked between iterations.
    pub time_limit: Option<Duration>,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 20_000,
            abs_tol: 1e-7,
            rel_tol: 1e-4,
            time_limit: None,
        }
    }
}

/// Normalized solver outcome. `Unbounded` cannot occur for the pure
/// feasibility programs this pipeline emits (`c = 0`) but is part of the
/// shared result model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverStatus {
    Solved,
    AlmostSolved,
    Infeasible,
    Unbounded,
    Failed,
}

impl SolverStatus {
    pub fn is_solved(self) -> bool {
        matches!(self, SolverStatus::Solved)
    }
}

/// What a backend hands back; never an error.
#[derive(Clone, Debug, Serialize)]
pub struct SolverResult {
    pub status: SolverStatus,
    pub iterations: usize,
    pub wall_time: Duration,
    /// Flat conic solution (svec coordinates, still conditioned) when one
    /// is available.
    pub x: Option<Vec<f64>>,
}

/// The common backend interface.
pub trait ConicSolver {
    fn name(&self) -> &'static str;
    fn solve(&self, prog: &ConicProgram, opts: &SolverOptions) -> SolverResult;
}

/// Backend selection, a caller policy decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Backend {
    FirstOrder,
    InteriorPoint,
}

/// Run the selected backend.
pub fn solve_with(backend: Backend, prog: &ConicProgram, opts: &SolverOptions) -> SolverResult {
    match backend {
        Backend::FirstOrder => FirstOrderSplitting::default().solve(prog, opts),
        Backend::InteriorPoint => InteriorPoint::default().solve(prog, opts),
    }
}

/// PSD block sides of a program (skipping the equality annotation).
pub(crate) fn psd_sides(prog: &ConicProgram) -> Vec<usize> {
    prog.cones
        .iter()
        .filter_map(|c| match c {
            crate::conic::Cone::Psd(n) => Some(*n),
            crate::conic::Cone::Zero(_) => None,
        })
        .collect()
}
