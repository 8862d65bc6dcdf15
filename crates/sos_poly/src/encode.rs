//! Sparse coefficient maps and the expression encoder.
//!
//! `encode` flattens an `Expr` into a monomial -> coefficient map by
//! structural recursion. Anything that is not a polynomial in the given
//! variables is a fatal `NonPolynomial` error: the rest of the pipeline
//! has no meaning for such inputs.

use crate::expr::Expr;
use crate::mono::Monomial;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from polynomial encoding.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum PolyError {
    #[error("expression is not a polynomial in the given variables")]
    NonPolynomial,
    #[error("exponent must be a non-negative integer, got {0}")]
    BadExponent(i64),
    #[error("division by a non-constant expression")]
    NonConstantDivision,
    #[error("variable index {index} out of range for {nvars} variables")]
    VarOutOfRange { index: usize, nvars: usize },
}

/// Sparse monomial -> coefficient map for one polynomial.
///
/// Zero coefficients are never stored; the degree is the maximum total
/// exponent sum over the stored entries.
#[derive(Clone, Debug, PartialEq)]
pub struct CoefficientMap {
    nvars: usize,
    terms: BTreeMap<Monomial, f64>,
}

impl CoefficientMap {
    pub fn new(nvars: usize) -> Self {
        Self {
            nvars,
            terms: BTreeMap::new(),
        }
    }

    pub fn from_terms<I>(nvars: usize, terms: I) -> Self
    where
        I: IntoIterator<Item = (Monomial, f64)>,
    {
        let mut map = Self::new(nvars);
        for (m, c) in terms {
            map.add_term(m, c);
        }
        map
    }

    /// Add `c` to the coefficient of `mono`, dropping the entry if the
    /// result cancels to zero.
    pub fn add_term(&mut self, mono: Monomial, c: f64) {
        debug_assert_eq!(mono.nvars(), self.nvars);
        if c == 0.0 {
            return;
        }
        use std::collections::btree_map::Entry;
        match self.terms.entry(mono) {
            Entry::Occupied(mut e) => {
                let v = e.get() + c;
                if v == 0.0 {
                    e.remove();
                } else {
                    *e.get_mut() = v;
                }
            }
            Entry::Vacant(e) => {
                e.insert(c);
            }
        }
    }

    /// Coefficient of `mono` (zero when absent).
    pub fn get(&self, mono: &Monomial) -> f64 {
        self.terms.get(mono).copied().unwrap_or(0.0)
    }

    /// Total degree: max exponent sum over nonzero entries.
    pub fn degree(&self) -> u32 {
        self.terms
            .keys()
            .map(Monomial::total_degree)
            .max()
            .unwrap_or(0)
    }

    pub fn nvars(&self) -> usize {
        self.nvars
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Monomial, f64)> {
        self.terms.iter().map(|(m, &c)| (m, c))
    }

    /// Largest absolute coefficient (zero for the zero polynomial).
    pub fn max_abs_coeff(&self) -> f64 {
        self.terms.values().fold(0.0, |acc, c| acc.max(c.abs()))
    }

    /// New map with every coefficient multiplied by `k`.
    pub fn scaled(&self, k: f64) -> Self {
        Self::from_terms(self.nvars, self.iter().map(|(m, c)| (m.clone(), c * k)))
    }

    /// `self - other` (same variable count expected).
    pub fn sub(&self, other: &Self) -> Self {
        debug_assert_eq!(self.nvars, other.nvars);
        let mut out = self.clone();
        for (m, c) in other.iter() {
            out.add_term(m.clone(), -c);
        }
        out
    }

    /// Evaluate at a point.
    pub fn eval_at(&self, point: &[f64]) -> f64 {
        debug_assert_eq!(point.len(), self.nvars);
        self.iter()
            .map(|(m, c)| {
                let v: f64 = m
                    .exps()
                    .iter()
                    .enumerate()
                    .map(|(i, &e)| point[i].powi(e as i32))
                    .product();
                c * v
            })
            .sum()
    }
}

/// Encode an expression as a polynomial in `nvars` variables.
pub fn encode(expr: &Expr, nvars: usize) -> Result<CoefficientMap, PolyError> {
    match expr {
        Expr::Num(c) => {
            let mut map = CoefficientMap::new(nvars);
            map.add_term(Monomial::constant(nvars), *c);
            Ok(map)
        }
        Expr::Var(i) => {
            if *i >= nvars {
                return Err(PolyError::VarOutOfRange {
                    index: *i,
                    nvars,
                });
            }
            let mut map = CoefficientMap::new(nvars);
            map.add_term(Monomial::var(nvars, *i), 1.0);
            Ok(map)
        }
        Expr::Neg(a) => Ok(encode(a, nvars)?.scaled(-1.0)),
        Expr::Add(a, b) => {
            let mut pa = encode(a, nvars)?;
            let pb = encode(b, nvars)?;
            for (m, c) in pb.iter() {
                pa.add_term(m.clone(), c);
            }
            Ok(pa)
        }
        Expr::Sub(a, b) => {
            let pa = encode(a, nvars)?;
            let pb = encode(b, nvars)?;
            Ok(pa.sub(&pb))
        }
        Expr::Mul(a, b) => {
            let pa = encode(a, nvars)?;
            let pb = encode(b, nvars)?;
            Ok(mul_maps(&pa, &pb))
        }
        Expr::Div(a, b) => {
            let pa = encode(a, nvars)?;
            let pb = encode(b, nvars)?;
            // Division only by nonzero constants keeps us polynomial.
            match constant_value(&pb) {
                Some(c) if c != 0.0 => Ok(pa.scaled(1.0 / c)),
                Some(_) => Err(PolyError::NonPolynomial),
                None => Err(PolyError::NonConstantDivision),
            }
        }
        Expr::Pow(base, e) => {
            if *e < 0 {
                return Err(PolyError::BadExponent(*e));
            }
            let pb = encode(base, nvars)?;
            Ok(pow_map(&pb, *e as u32, nvars))
        }
        Expr::Func(_, _) => Err(PolyError::NonPolynomial),
    }
}

fn constant_value(p: &CoefficientMap) -> Option<f64> {
    if p.is_empty() {
        return Some(0.0);
    }
    if p.len() == 1 {
        if let Some((m, c)) = p.iter().next() {
            if m.is_constant() {
                return Some(c);
            }
        }
    }
    None
}

fn mul_maps(a: &CoefficientMap, b: &CoefficientMap) -> CoefficientMap {
    let mut out = CoefficientMap::new(a.nvars());
    for (ma, ca) in a.iter() {
        for (mb, cb) in b.iter() {
            out.add_term(ma.mul(mb), ca * cb);
        }
    }
    out
}

/// Binary exponentiation on coefficient maps.
fn pow_map(p: &CoefficientMap, mut e: u32, nvars: usize) -> CoefficientMap {
    let mut result = CoefficientMap::new(nvars);
    result.add_term(Monomial::constant(nvars), 1.0);
    if e == 0 {
        return result;
    }
    let mut base = p.clone();
    while e > 0 {
        if e & 1 == 1 {
            result = mul_maps(&result, &base);
        }
        e >>= 1;
        if e > 0 {
            base = mul_maps(&base, &base);
        }
    }
    result
}
