//! Arithmetic backends.
//!
//! Elimination, null-space and solve are written once against this trait;
//! the backend decides exactness, zero tests and pivot preference. The
//! prime-field backend lives in `modp`.

use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::fmt::Debug;

/// A field of scalars, carried by value so backends can hold parameters
/// (modulus, zero tolerance).
pub trait Arithmetic {
    type Elem: Clone + PartialEq + Debug;

    fn zero(&self) -> Self::Elem;
    fn one(&self) -> Self::Elem;
    fn add(&self, a: &Self::Elem, b: &Self::Elem) -> Self::Elem;
    fn sub(&self, a: &Self::Elem, b: &Self::Elem) -> Self::Elem;
    fn neg(&self, a: &Self::Elem) -> Self::Elem;
    fn mul(&self, a: &Self::Elem, b: &Self::Elem) -> Self::Elem;
    /// Multiplicative inverse; `None` for zero (or a non-unit).
    fn inv(&self, a: &Self::Elem) -> Option<Self::Elem>;
    fn is_zero(&self, a: &Self::Elem) -> bool;

    /// Pivot preference during elimination; larger is better. Exact
    /// backends only need nonzero/zero, floats want magnitude.
    fn pivot_weight(&self, a: &Self::Elem) -> f64 {
        if self.is_zero(a) {
            0.0
        } else {
            1.0
        }
    }
}

/// Exact rational arithmetic over `BigRational`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rationals;

impl Arithmetic for Rationals {
    type Elem = BigRational;

    fn zero(&self) -> BigRational {
        BigRational::zero()
    }

    fn one(&self) -> BigRational {
        BigRational::one()
    }

    fn add(&self, a: &BigRational, b: &BigRational) -> BigRational {
        a + b
    }

    fn sub(&self, a: &BigRational, b: &BigRational) -> BigRational {
        a - b
    }

    fn neg(&self, a: &BigRational) -> BigRational {
        -a
    }

    fn mul(&self, a: &BigRational, b: &BigRational) -> BigRational {
        a * b
    }

    fn inv(&self, a: &BigRational) -> Option<BigRational> {
        if a.is_zero() {
            None
        } else {
            Some(a.recip())
        }
    }

    fn is_zero(&self, a: &BigRational) -> bool {
        a.is_zero()
    }

    fn pivot_weight(&self, a: &BigRational) -> f64 {
        if a.is_zero() {
            0.0
        } else {
            // Prefer small exact pivots to keep intermediate swell down.
            let size = a.abs().to_f64().unwrap_or(1.0);
            1.0 / (1.0 + (size - 1.0).abs())
        }
    }
}

/// Floating-point arithmetic with a zero tolerance.
#[derive(Clone, Copy, Debug)]
pub struct Floats {
    /// Magnitudes at or below this count as zero during elimination.
    pub eps: f64,
}

impl Default for Floats {
    fn default() -> Self {
        Self { eps: 1e-12 }
    }
}

impl Arithmetic for Floats {
    type Elem = f64;

    fn zero(&self) -> f64 {
        0.0
    }

    fn one(&self) -> f64 {
        1.0
    }

    fn add(&self, a: &f64, b: &f64) -> f64 {
        a + b
    }

    fn sub(&self, a: &f64, b: &f64) -> f64 {
        a - b
    }

    fn neg(&self, a: &f64) -> f64 {
        -a
    }

    fn mul(&self, a: &f64, b: &f64) -> f64 {
        a * b
    }

    fn inv(&self, a: &f64) -> Option<f64> {
        if self.is_zero(a) {
            None
        } else {
            Some(1.0 / a)
        }
    }

    fn is_zero(&self, a: &f64) -> bool {
        a.abs() <= self.eps
    }

    fn pivot_weight(&self, a: &f64) -> f64 {
        a.abs()
    }
}
