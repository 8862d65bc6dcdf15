//! Prime-field backend.
//!
//! Residues are `u64`; products go through `u128` so any modulus below
//! 2^64 is safe. Inversion is extended Euclid.

use crate::arith::Arithmetic;

/// 2^64 - 59, the largest prime fitting in u64.
pub const DEFAULT_PRIME: u64 = 0xFFFF_FFFF_FFFF_FFC5;

/// The field Z/pZ for a prime modulus `p`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrimeField {
    pub p: u64,
}

impl PrimeField {
    pub fn new(p: u64) -> Self {
        debug_assert!(p > 1);
        Self { p }
    }

    #[inline]
    pub fn reduce(&self, a: u64) -> u64 {
        a % self.p
    }

    #[inline]
    fn add_raw(&self, a: u64, b: u64) -> u64 {
        ((a as u128 + b as u128) % self.p as u128) as u64
    }

    #[inline]
    fn sub_raw(&self, a: u64, b: u64) -> u64 {
        if a >= b {
            a - b
        } else {
            self.p - (b - a)
        }
    }

    #[inline]
    fn mul_raw(&self, a: u64, b: u64) -> u64 {
        ((a as u128 * b as u128) % self.p as u128) as u64
    }

    /// a^e mod p by binary exponentiation.
    pub fn pow(&self, mut base: u64, mut e: u64) -> u64 {
        let mut acc = 1u64;
        base %= self.p;
        while e > 0 {
            if e & 1 == 1 {
                acc = self.mul_raw(acc, base);
            }
            e >>= 1;
            base = self.mul_raw(base, base);
        }
        acc
    }

    fn inv_raw(&self, a: u64) -> Option<u64> {
        if a % self.p == 0 {
            return None;
        }
        // Iterative extended Euclid on (a, p).
        let (mut r0, mut r1) = (a as i128 % self.p as i128, self.p as i128);
        let (mut s0, mut s1) = (1i128, 0i128);
        while r1 != 0 {
            let q = r0 / r1;
            (r0, r1) = (r1, r0 - q * r1);
            (s0, s1) = (s1, s0 - q * s1);
        }
        if r0 != 1 {
            return None;
        }
        let p = self.p as i128;
        Some((((s0 % p) + p) % p) as u64)
    }
}

impl Arithmetic for PrimeField {
    type Elem = u64;

    fn zero(&self) -> u64 {
        0
    }

    fn one(&self) -> u64 {
        1 % self.p
    }

    fn add(&self, a: &u64, b: &u64) -> u64 {
        self.add_raw(*a, *b)
    }

    fn sub(&self, a: &u64, b: &u64) -> u64 {
        self.sub_raw(a % self.p, b % self.p)
    }

    fn neg(&self, a: &u64) -> u64 {
        let a = a % self.p;
        if a == 0 {
            0
        } else {
            self.p - a
        }
    }

    fn mul(&self, a: &u64, b: &u64) -> u64 {
        self.mul_raw(*a, *b)
    }

    fn inv(&self, a: &u64) -> Option<u64> {
        self.inv_raw(*a)
    }

    fn is_zero(&self, a: &u64) -> bool {
        a % self.p == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_round_trip() {
        let f = PrimeField::new(17);
        for a in 1..17u64 {
            let inv = f.inv(&a).unwrap();
            assert_eq!(f.mul(&a, &inv), 1, "a = {}", a);
        }
        assert_eq!(f.inv(&0), None);
    }

    #[test]
    fn pow_fermat() {
        let f = PrimeField::new(1_000_000_007);
        assert_eq!(f.pow(3, 1_000_000_006), 1);
        assert_eq!(f.pow(2, 10), 1024);
    }

    #[test]
    fn large_prime_products_do_not_overflow() {
        let f = PrimeField::new(DEFAULT_PRIME);
        let a = DEFAULT_PRIME - 2;
        let b = DEFAULT_PRIME - 3;
        let ab = f.mul(&a, &b);
        // (-2)(-3) = 6 mod p
        assert_eq!(ab, 6);
    }

    #[test]
    fn subtraction_wraps() {
        let f = PrimeField::new(17);
        assert_eq!(f.sub(&5, &10), 12);
        assert_eq!(f.neg(&5), 12);
    }
}
