//! The assembled equality system.

use crate::layout::BlockLayout;
use sos_poly::Monomial;

/// One equality row per target monomial (including zero-RHS rows for
/// monomials absent from the target: those still force the corresponding
/// Gram combination to vanish), plus the PSD block layout.
#[derive(Clone, Debug)]
pub struct ConstraintSystem {
    pub nvars: usize,
    pub target_degree: u32,
    /// Sparse rows, aligned with `target_monomials`.
    pub rows: Vec<Vec<(usize, f64)>>,
    /// Right-hand side: the target coefficient of each row's monomial.
    pub rhs: Vec<f64>,
    /// Gram block layout (main block first, then retained constraints).
    pub layout: BlockLayout,
    /// Row monomials in basis order.
    pub target_monomials: Vec<Monomial>,
}

impl ConstraintSystem {
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_vars(&self) -> usize {
        self.layout.num_vars
    }
}
