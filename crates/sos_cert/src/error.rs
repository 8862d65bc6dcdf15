//! Error and warning taxonomy.
//!
//! Fatal errors abort one certificate instance and propagate with `?`.
//! Everything soft is data: warnings accumulate in a `Vec` next to the
//! normal result, and solver failures live in `SolverStatus`, so a batch
//! sweep over many instances keeps going past individual failures.

use serde::Serialize;
use thiserror::Error;

/// Fatal pipeline errors.
#[derive(Debug, Error)]
pub enum CertError {
    /// The input is not a polynomial; nothing downstream has meaning.
    #[error(transparent)]
    Poly(#[from] sos_poly::PolyError),
    /// A constraint was encoded over a different variable count than the
    /// target.
    #[error("constraint {index} has {got} variables, target has {expected}")]
    VarMismatch {
        index: usize,
        got: usize,
        expected: usize,
    },
}

/// Soft conditions surfaced alongside normal results.
#[derive(Clone, Debug, PartialEq, Error, Serialize)]
pub enum BuildWarning {
    /// A constraint's degree exceeds the target's: its multiplier block is
    /// dropped and contributes nothing.
    #[error(
        "constraint {constraint} has degree {constraint_degree} > target degree {target_degree}; multiplier block dropped"
    )]
    DegreeMismatch {
        constraint: usize,
        constraint_degree: u32,
        target_degree: u32,
    },
    /// The conditioning scale factor is extreme; treat the certificate's
    /// numerical tolerance with extra skepticism.
    #[error("conditioning scale factor {scale:.3e} is outside [1e-8, 1e8]")]
    IllConditioned { scale: f64 },
}
