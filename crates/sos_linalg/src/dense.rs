//! Dense row-major matrices and backend-generic elimination.

use crate::arith::Arithmetic;

/// Row-major dense matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseMatrix<T> {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<T>,
}

impl<T> DenseMatrix<T> {
    pub fn new(rows: usize, cols: usize, data: Vec<T>) -> Self {
        assert_eq!(data.len(), rows * cols, "dimension mismatch");
        Self { rows, cols, data }
    }

    #[inline]
    pub fn at(&self, r: usize, c: usize) -> &T {
        &self.data[r * self.cols + c]
    }

    #[inline]
    pub fn at_mut(&mut self, r: usize, c: usize) -> &mut T {
        &mut self.data[r * self.cols + c]
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, v: T) {
        self.data[r * self.cols + c] = v;
    }

    pub fn row(&self, r: usize) -> &[T] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for c in 0..self.cols {
            self.data.swap(a * self.cols + c, b * self.cols + c);
        }
    }
}

impl<T: Clone> DenseMatrix<T> {
    pub fn filled(rows: usize, cols: usize, v: T) -> Self {
        Self {
            rows,
            cols,
            data: vec![v; rows * cols],
        }
    }

    pub fn from_rows(rows: Vec<Vec<T>>) -> Self {
        let nrows = rows.len();
        let ncols = rows.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(nrows * ncols);
        for row in rows {
            assert_eq!(row.len(), ncols, "ragged rows");
            data.extend(row);
        }
        Self {
            rows: nrows,
            cols: ncols,
            data,
        }
    }
}

impl DenseMatrix<f64> {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.set(i, i, 1.0);
        }
        m
    }
}

/// Outcome of reduction to reduced row echelon form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Echelon {
    pub rank: usize,
    pub pivot_cols: Vec<usize>,
}

/// Reduce `m` in place to reduced row echelon form.
pub fn eliminate<F: Arithmetic>(f: &F, m: &mut DenseMatrix<F::Elem>) -> Echelon {
    let cols = m.cols;
    eliminate_cols(f, m, cols)
}

/// Reduction restricted to the first `limit` columns; trailing columns are
/// carried along (used for augmented solves, where the RHS must never be
/// chosen as a pivot).
pub(crate) fn eliminate_cols<F: Arithmetic>(
    f: &F,
    m: &mut DenseMatrix<F::Elem>,
    limit: usize,
) -> Echelon {
    let mut pivot_cols = Vec::new();
    let mut row = 0;
    for col in 0..limit.min(m.cols) {
        if row >= m.rows {
            break;
        }
        // Backend-chosen pivot among the remaining rows.
        let mut best_row = None;
        let mut best_weight = 0.0_f64;
        for r in row..m.rows {
            let w = f.pivot_weight(m.at(r, col));
            if w > best_weight {
                best_weight = w;
                best_row = Some(r);
            }
        }
        let pr = match best_row {
            Some(r) if !f.is_zero(m.at(r, col)) => r,
            _ => continue,
        };
        m.swap_rows(row, pr);

        let inv = match f.inv(m.at(row, col)) {
            Some(v) => v,
            None => continue,
        };
        for c in col..m.cols {
            let v = f.mul(m.at(row, c), &inv);
            m.set(row, c, v);
        }
        for r in 0..m.rows {
            if r == row || f.is_zero(m.at(r, col)) {
                continue;
            }
            let factor = m.at(r, col).clone();
            for c in col..m.cols {
                let v = f.sub(m.at(r, c), &f.mul(m.at(row, c), &factor));
                m.set(r, c, v);
            }
        }
        pivot_cols.push(col);
        row += 1;
    }
    Echelon {
        rank: row,
        pivot_cols,
    }
}

/// Basis of the null space of `a`.
pub fn null_space<F: Arithmetic>(f: &F, a: &DenseMatrix<F::Elem>) -> Vec<Vec<F::Elem>> {
    let mut m = a.clone();
    let ech = eliminate(f, &mut m);
    let mut basis = Vec::new();
    let mut is_pivot = vec![false; a.cols];
    for &c in &ech.pivot_cols {
        is_pivot[c] = true;
    }
    for free in 0..a.cols {
        if is_pivot[free] {
            continue;
        }
        let mut v = vec![f.zero(); a.cols];
        v[free] = f.one();
        for (r, &pc) in ech.pivot_cols.iter().enumerate() {
            v[pc] = f.neg(m.at(r, free));
        }
        basis.push(v);
    }
    basis
}

/// Solve `a x = b`, free variables pinned to zero.
///
/// `None` when the system is inconsistent.
pub fn solve_linear<F: Arithmetic>(
    f: &F,
    a: &DenseMatrix<F::Elem>,
    b: &[F::Elem],
) -> Option<Vec<F::Elem>> {
    assert_eq!(b.len(), a.rows);
    let mut aug = DenseMatrix::filled(a.rows, a.cols + 1, f.zero());
    for r in 0..a.rows {
        for c in 0..a.cols {
            aug.set(r, c, a.at(r, c).clone());
        }
        aug.set(r, a.cols, b[r].clone());
    }
    let ech = eliminate_cols(f, &mut aug, a.cols);
    for r in ech.rank..a.rows {
        if !f.is_zero(aug.at(r, a.cols)) {
            return None;
        }
    }
    let mut x = vec![f.zero(); a.cols];
    for (r, &pc) in ech.pivot_cols.iter().enumerate() {
        x[pc] = aug.at(r, a.cols).clone();
    }
    Some(x)
}

/// `a x` as a fresh vector.
pub fn mat_vec<F: Arithmetic>(f: &F, a: &DenseMatrix<F::Elem>, x: &[F::Elem]) -> Vec<F::Elem> {
    assert_eq!(x.len(), a.cols);
    let mut y = Vec::with_capacity(a.rows);
    for r in 0..a.rows {
        let mut acc = f.zero();
        for c in 0..a.cols {
            acc = f.add(&acc, &f.mul(a.at(r, c), &x[c]));
        }
        y.push(acc);
    }
    y
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::arith::{Floats, Rationals};
    use crate::modp::PrimeField;
    use num_bigint::BigInt;
    use num_rational::BigRational;
    use proptest::prelude::*;

    const P: u64 = 1_000_000_007;

    fn q(n: i64) -> BigRational {
        BigRational::from(BigInt::from(n))
    }

    // Small integer entries keep every minor far below the modulus, so
    // rank and consistency over Q, F_p and f64 must coincide.
    fn entries() -> impl Strategy<Value = Vec<Vec<i64>>> {
        proptest::collection::vec(proptest::collection::vec(-5i64..=5, 3), 3)
    }

    fn over_q(rows: &[Vec<i64>]) -> DenseMatrix<BigRational> {
        DenseMatrix::from_rows(rows.iter().map(|r| r.iter().map(|&v| q(v)).collect()).collect())
    }

    fn over_p(rows: &[Vec<i64>]) -> DenseMatrix<u64> {
        DenseMatrix::from_rows(
            rows.iter()
                .map(|r| r.iter().map(|&v| v.rem_euclid(P as i64) as u64).collect())
                .collect(),
        )
    }

    fn over_f(rows: &[Vec<i64>]) -> DenseMatrix<f64> {
        DenseMatrix::from_rows(
            rows.iter()
                .map(|r| r.iter().map(|&v| v as f64).collect())
                .collect(),
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn rank_agrees_across_backends(rows in entries()) {
            let rank_q = eliminate(&Rationals, &mut over_q(&rows)).rank;
            let rank_p = eliminate(&PrimeField::new(P), &mut over_p(&rows)).rank;
            let rank_f = eliminate(&Floats::default(), &mut over_f(&rows)).rank;
            prop_assert_eq!(rank_q, rank_p);
            prop_assert_eq!(rank_q, rank_f);
        }

        #[test]
        fn null_space_complements_rank(rows in entries()) {
            let f = Rationals;
            let a = over_q(&rows);
            let rank = eliminate(&f, &mut a.clone()).rank;
            let ns = null_space(&f, &a);
            prop_assert_eq!(ns.len(), a.cols - rank);
            for v in &ns {
                for y in mat_vec(&f, &a, v) {
                    prop_assert!(f.is_zero(&y));
                }
            }
        }

        #[test]
        fn solve_consistency_agrees_across_backends(
            rows in entries(),
            b in proptest::collection::vec(-5i64..=5, 3),
        ) {
            let f_q = Rationals;
            let a_q = over_q(&rows);
            let b_q: Vec<BigRational> = b.iter().map(|&v| q(v)).collect();
            let x_q = solve_linear(&f_q, &a_q, &b_q);

            let f_p = PrimeField::new(P);
            let b_p: Vec<u64> = b.iter().map(|&v| v.rem_euclid(P as i64) as u64).collect();
            let x_p = solve_linear(&f_p, &over_p(&rows), &b_p);

            let f_f = Floats::default();
            let a_f = over_f(&rows);
            let b_f: Vec<f64> = b.iter().map(|&v| v as f64).collect();
            let x_f = solve_linear(&f_f, &a_f, &b_f);

            prop_assert_eq!(x_q.is_some(), x_p.is_some());
            prop_assert_eq!(x_q.is_some(), x_f.is_some());
            if let Some(x) = x_q {
                for (y, rhs) in mat_vec(&f_q, &a_q, &x).iter().zip(b_q.iter()) {
                    prop_assert_eq!(y, rhs);
                }
            }
            if let Some(x) = x_f {
                for (y, rhs) in mat_vec(&f_f, &a_f, &x).iter().zip(b_f.iter()) {
                    prop_assert!((y - rhs).abs() < 1e-9);
                }
            }
        }
    }
}
