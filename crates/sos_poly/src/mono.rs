//! Exponent-tuple monomials.
//!
//! A monomial is a vector of exponents aligned with the variable list;
//! multiplication is element-wise addition. Ordering is graded
//! lexicographic (total degree first, earlier variables dominate within a
//! degree), which is the order every basis and variable layout downstream
//! relies on.

use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;

/// Exponent type (u32 matches the degree bounds we ever see in practice).
pub type Exp = u32;

/// Inline capacity covers the variable counts of the superadditivity
/// instances without heap allocation.
const INLINE_VARS: usize = 6;

/// Monomial: exponent tuple of length `nvars`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Monomial(SmallVec<[Exp; INLINE_VARS]>);

impl Monomial {
    /// The constant monomial `1` in `nvars` variables.
    pub fn constant(nvars: usize) -> Self {
        Monomial(SmallVec::from_elem(0, nvars))
    }

    /// The monomial `x_i` in `nvars` variables.
    pub fn var(nvars: usize, i: usize) -> Self {
        debug_assert!(i < nvars);
        let mut exps = SmallVec::from_elem(0, nvars);
        exps[i] = 1;
        Monomial(exps)
    }

    /// Build from an exponent slice.
    pub fn from_exps(exps: &[Exp]) -> Self {
        Monomial(SmallVec::from_slice(exps))
    }

    /// Number of variables (length of the exponent tuple).
    #[inline]
    pub fn nvars(&self) -> usize {
        self.0.len()
    }

    /// Exponent of variable `i`.
    #[inline]
    pub fn exp(&self, i: usize) -> Exp {
        self.0.get(i).copied().unwrap_or(0)
    }

    /// Exponents as a slice.
    #[inline]
    pub fn exps(&self) -> &[Exp] {
        &self.0
    }

    /// Total degree (sum of exponents).
    #[inline]
    pub fn total_degree(&self) -> u32 {
        self.0.iter().sum()
    }

    /// True for the constant monomial.
    pub fn is_constant(&self) -> bool {
        self.0.iter().all(|&e| e == 0)
    }

    /// Product of two monomials: element-wise exponent addition.
    pub fn mul(&self, other: &Self) -> Self {
        debug_assert_eq!(self.nvars(), other.nvars());
        Monomial(
            self.0
                .iter()
                .zip(other.0.iter())
                .map(|(a, b)| a + b)
                .collect(),
        )
    }

    /// Quotient `self / other` if every exponent stays non-negative.
    pub fn checked_div(&self, other: &Self) -> Option<Self> {
        debug_assert_eq!(self.nvars(), other.nvars());
        let mut exps = SmallVec::with_capacity(self.nvars());
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            if a < b {
                return None;
            }
            exps.push(a - b);
        }
        Some(Monomial(exps))
    }
}

impl Ord for Monomial {
    /// Graded lex: ascending total degree, then earlier variables first
    /// within a degree (`x^2 < x*y < y^2`).
    fn cmp(&self, other: &Self) -> Ordering {
        self.total_degree()
            .cmp(&other.total_degree())
            .then_with(|| other.0.cmp(&self.0))
    }
}

impl PartialOrd for Monomial {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_constant() {
            return write!(f, "1");
        }
        let mut first = true;
        for (i, &e) in self.0.iter().enumerate() {
            if e == 0 {
                continue;
            }
            if !first {
                write!(f, "*")?;
            }
            first = false;
            if e == 1 {
                write!(f, "x{}", i)?;
            } else {
                write!(f, "x{}^{}", i, e)?;
            }
        }
        Ok(())
    }
}
