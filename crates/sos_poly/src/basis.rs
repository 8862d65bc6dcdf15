//! Ordered monomial bases.
//!
//! `generate` is deterministic by construction: it walks total degrees
//! ascending and, within a degree, assigns exponents to earlier variables
//! first. Downstream variable layouts index into the basis, so two calls
//! with the same `(nvars, max_degree)` must agree position by position.

use crate::mono::{Exp, Monomial};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Ordered, deduplicated monomials of total degree `0..=max_degree`.
#[derive(Clone, Debug)]
pub struct MonomialBasis {
    nvars: usize,
    max_degree: u32,
    monos: Vec<Monomial>,
    index: FxHashMap<Monomial, usize>,
}

impl MonomialBasis {
    /// Enumerate the basis in graded-lex order.
    ///
    /// Size is `C(nvars + max_degree, max_degree)`.
    pub fn generate(nvars: usize, max_degree: u32) -> Self {
        let mut monos = Vec::new();
        if nvars == 0 {
            monos.push(Monomial::constant(0));
        } else {
            let mut prefix: SmallVec<[Exp; 6]> = SmallVec::new();
            for degree in 0..=max_degree {
                fill_degree(nvars, degree, &mut prefix, &mut monos);
            }
        }
        let index = monos
            .iter()
            .enumerate()
            .map(|(i, m)| (m.clone(), i))
            .collect();
        Self {
            nvars,
            max_degree,
            monos,
            index,
        }
    }

    /// Position of a monomial in the basis, if present.
    #[inline]
    pub fn index_of(&self, m: &Monomial) -> Option<usize> {
        self.index.get(m).copied()
    }

    /// Monomial at position `i`.
    #[inline]
    pub fn get(&self, i: usize) -> &Monomial {
        &self.monos[i]
    }

    pub fn len(&self) -> usize {
        self.monos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monos.is_empty()
    }

    pub fn nvars(&self) -> usize {
        self.nvars
    }

    pub fn max_degree(&self) -> u32 {
        self.max_degree
    }

    pub fn iter(&self) -> impl Iterator<Item = &Monomial> {
        self.monos.iter()
    }

    pub fn monomials(&self) -> &[Monomial] {
        &self.monos
    }
}

/// Emit all monomials of exactly `degree`, earlier variables taking the
/// larger exponents first (graded-lex within the degree).
fn fill_degree(
    nvars_left: usize,
    remaining: u32,
    prefix: &mut SmallVec<[Exp; 6]>,
    out: &mut Vec<Monomial>,
) {
    if nvars_left == 1 {
        prefix.push(remaining);
        out.push(Monomial::from_exps(prefix));
        prefix.pop();
        return;
    }
    for e in (0..=remaining).rev() {
        prefix.push(e);
        fill_degree(nvars_left - 1, remaining - e, prefix, out);
        prefix.pop();
    }
}

/// Binomial coefficient C(n, k) without overflow for the sizes we handle.
pub fn binomial(n: u64, k: u64) -> u128 {
    let k = k.min(n - k.min(n));
    let mut acc: u128 = 1;
    for i in 0..k {
        acc = acc * (n - i) as u128 / (i + 1) as u128;
    }
    acc
}
