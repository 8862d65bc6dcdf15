//! Product tables: which basis pairs multiply to which monomial.
//!
//! Building the table costs O(m^2) over the basis size m and dominates
//! large degree bounds, so a table is built once per basis and reused for
//! every coefficient lookup against that basis.

use crate::basis::MonomialBasis;
use crate::mono::Monomial;
use rustc_hash::FxHashMap;

/// For each result monomial, the list of index pairs `(i, j)`, `i <= j`,
/// whose basis product equals it. Every pair lands in exactly one bucket.
#[derive(Clone, Debug)]
pub struct ProductTable {
    buckets: FxHashMap<Monomial, Vec<(usize, usize)>>,
    pair_count: usize,
}

impl ProductTable {
    /// Build the table for a basis.
    pub fn build(basis: &MonomialBasis) -> Self {
        let m = basis.len();
        let mut buckets: FxHashMap<Monomial, Vec<(usize, usize)>> = FxHashMap::default();
        for i in 0..m {
            for j in i..m {
                let prod = basis.get(i).mul(basis.get(j));
                buckets.entry(prod).or_default().push((i, j));
            }
        }
        let pair_count = m * (m + 1) / 2;
        Self {
            buckets,
            pair_count,
        }
    }

    /// Pairs multiplying to `mono` (empty when none do).
    #[inline]
    pub fn pairs(&self, mono: &Monomial) -> &[(usize, usize)] {
        self.buckets.get(mono).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of pairs across all buckets: m(m+1)/2.
    pub fn pair_count(&self) -> usize {
        self.pair_count
    }

    /// Number of distinct product monomials.
    pub fn num_products(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::MonomialBasis;

    #[test]
    fn pairs_partition() {
        let basis = MonomialBasis::generate(2, 2);
        let table = ProductTable::build(&basis);
        let total: usize = table.buckets.values().map(Vec::len).sum();
        assert_eq!(total, table.pair_count());
        assert_eq!(table.pair_count(), basis.len() * (basis.len() + 1) / 2);
    }

    #[test]
    fn bucket_contents_for_x2() {
        // Basis {1, x, y}: x^2 comes only from (x, x).
        let basis = MonomialBasis::generate(2, 1);
        let table = ProductTable::build(&basis);
        let x2 = Monomial::from_exps(&[2, 0]);
        assert_eq!(table.pairs(&x2), &[(1, 1)]);
        // x comes only from (1, x).
        let x = Monomial::from_exps(&[1, 0]);
        assert_eq!(table.pairs(&x), &[(0, 1)]);
    }

    #[test]
    fn every_pair_in_exactly_one_bucket() {
        let basis = MonomialBasis::generate(3, 2);
        let table = ProductTable::build(&basis);
        let m = basis.len();
        for i in 0..m {
            for j in i..m {
                let prod = basis.get(i).mul(basis.get(j));
                let hits = table
                    .buckets
                    .values()
                    .flat_map(|v| v.iter())
                    .filter(|&&(a, b)| (a, b) == (i, j))
                    .count();
                assert_eq!(hits, 1, "pair ({}, {})", i, j);
                assert!(table.pairs(&prod).contains(&(i, j)));
            }
        }
    }

    #[test]
    fn missing_monomial_has_no_pairs() {
        let basis = MonomialBasis::generate(2, 1);
        let table = ProductTable::build(&basis);
        // Degree 3 is out of reach for a half-degree-1 basis.
        let m = Monomial::from_exps(&[3, 0]);
        assert!(table.pairs(&m).is_empty());
    }

    #[test]
    fn bucket_contents_independent_of_visit_order() {
        // Building twice (same basis) must give identical buckets; the
        // bucket content is a function of the basis, not iteration order.
        let basis = MonomialBasis::generate(2, 3);
        let a = ProductTable::build(&basis);
        let b = ProductTable::build(&basis);
        for (mono, pairs) in &a.buckets {
            assert_eq!(b.pairs(mono), pairs.as_slice());
        }
    }
}
