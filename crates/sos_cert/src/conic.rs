//! Flattening into the generic conic form `{A x = b, x in cones}`.
//!
//! `c = 0`: this is a pure feasibility problem. The cone list annotates
//! the equality rows first (`Zero(n_eq)`), then each PSD block over a
//! consecutive svec segment of the variable vector.
//!
//! The one numeric convention that matters: PSD backends store the
//! triangular part with off-diagonals weighted by sqrt(2). Every
//! off-diagonal Gram free variable is scaled by sqrt(2) exactly once when
//! mapped into the conic vector (row coefficients divided by sqrt(2)
//! here), and the validator inverts that exactly once when reading a
//! solution back. Missing or doubling the factor silently yields a wrong
//! but often still "solved" certificate.

use crate::error::BuildWarning;
use crate::layout::BlockLayout;
use crate::system::ConstraintSystem;
use serde::Serialize;
use sos_linalg::{CscMatrix, TripletBuffer};
use tracing::debug;

const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// Conditioning scales outside this band trigger a warning.
const SCALE_BAND: (f64, f64) = (1e-8, 1e8);

/// Cone annotations for the conic program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Cone {
    /// Equality rows.
    Zero(usize),
    /// PSD block of the given side over an svec variable segment.
    Psd(usize),
}

/// `{A x = b, x in cones}` with `c = 0`.
#[derive(Clone, Debug)]
pub struct ConicProgram {
    pub a: CscMatrix,
    pub b: Vec<f64>,
    pub c: Vec<f64>,
    pub cones: Vec<Cone>,
    /// Gram block layout carried along for solution read-back.
    pub layout: BlockLayout,
    /// Conditioning factor: the original RHS was divided by this.
    pub scale: f64,
}

impl ConicProgram {
    pub fn num_rows(&self) -> usize {
        self.a.nrows
    }

    pub fn num_vars(&self) -> usize {
        self.a.ncols
    }
}

/// Flatten the equality system into conic form, applying the svec scaling
/// and RHS conditioning.
pub fn assemble(system: &ConstraintSystem) -> (ConicProgram, Vec<BuildWarning>) {
    let n_eq = system.num_rows();
    let n_vars = system.num_vars();
    let mut warnings = Vec::new();

    // Condition by the largest target coefficient (scale 1 for the zero
    // polynomial).
    let max_coeff = system.rhs.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let scale = if max_coeff == 0.0 { 1.0 } else { max_coeff };
    if scale < SCALE_BAND.0 || scale > SCALE_BAND.1 {
        warnings.push(BuildWarning::IllConditioned { scale });
    }
    let b: Vec<f64> = system.rhs.iter().map(|v| v / scale).collect();

    // Off-diagonal columns absorb 1/sqrt(2): the conic variable is the
    // svec entry, sqrt(2) times the Gram entry.
    let mut diagonal = vec![false; n_vars];
    for block in &system.layout.blocks {
        for local in 0..block.tri_len() {
            diagonal[block.offset + local] = block.is_diagonal(local);
        }
    }

    let mut triplets = TripletBuffer::new(n_eq, n_vars);
    for (r, row) in system.rows.iter().enumerate() {
        for &(col, coeff) in row {
            let v = if diagonal[col] { coeff } else { coeff / SQRT_2 };
            triplets.push(r, col, v);
        }
    }
    let a = triplets.into_csc();

    let mut cones = vec![Cone::Zero(n_eq)];
    cones.extend(system.layout.blocks.iter().map(|b| Cone::Psd(b.side)));

    debug!(
        rows = n_eq,
        vars = n_vars,
        nnz = a.nnz(),
        scale,
        "assembled conic program"
    );

    (
        ConicProgram {
            a,
            b,
            c: vec![0.0; n_vars],
            cones,
            layout: system.layout.clone(),
            scale,
        },
        warnings,
    )
}
