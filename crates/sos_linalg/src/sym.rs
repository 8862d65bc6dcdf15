//! Dense symmetric f64 kernels: Cholesky, cyclic Jacobi eigendecomposition
//! and the scaled-triangle svec/smat pair used by the PSD cones.

use crate::dense::DenseMatrix;

/// sqrt(2) scaling applied to off-diagonal svec entries so the triangular
/// storage preserves the symmetric-matrix inner product.
pub const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// Length of the packed upper triangle of an n x n symmetric matrix.
#[inline]
pub fn tri_len(n: usize) -> usize {
    n * (n + 1) / 2
}

/// Packed scaled upper triangle (row-major, off-diagonals times sqrt(2)).
pub fn svec(m: &DenseMatrix<f64>) -> Vec<f64> {
    debug_assert_eq!(m.rows, m.cols);
    let n = m.rows;
    let mut v = Vec::with_capacity(tri_len(n));
    for p in 0..n {
        for q in p..n {
            let x = *m.at(p, q);
            v.push(if p == q { x } else { x * SQRT_2 });
        }
    }
    v
}

/// Inverse of [`svec`]: rebuild the full symmetric matrix.
pub fn smat(n: usize, v: &[f64]) -> DenseMatrix<f64> {
    debug_assert_eq!(v.len(), tri_len(n));
    let mut m = DenseMatrix::zeros(n, n);
    let mut k = 0;
    for p in 0..n {
        for q in p..n {
            let x = if p == q { v[k] } else { v[k] / SQRT_2 };
            m.set(p, q, x);
            m.set(q, p, x);
            k += 1;
        }
    }
    m
}

/// Cyclic Jacobi eigendecomposition of a symmetric matrix.
///
/// Returns `(eigenvalues, eigenvectors)` with eigenvectors in the columns,
/// so `a = V diag(w) V^T`. Eigenvalues are unsorted.
pub fn jacobi_eigen(a: &DenseMatrix<f64>) -> (Vec<f64>, DenseMatrix<f64>) {
    debug_assert_eq!(a.rows, a.cols);
    let n = a.rows;
    let mut m = a.clone();
    let mut v = DenseMatrix::identity(n);
    if n <= 1 {
        return (m.data.clone(), v);
    }
    let norm: f64 = a.data.iter().map(|x| x * x).sum::<f64>().sqrt();
    let tol = 1e-14 * norm.max(1.0);

    for _sweep in 0..64 {
        let mut off = 0.0;
        for p in 0..n {
            for q in (p + 1)..n {
                off += m.at(p, q) * m.at(p, q);
            }
        }
        if off.sqrt() <= tol {
            break;
        }
        for p in 0..n - 1 {
            for q in (p + 1)..n {
                let apq = *m.at(p, q);
                if apq.abs() <= tol * 1e-2 {
                    continue;
                }
                let app = *m.at(p, p);
                let aqq = *m.at(q, q);
                let theta = (aqq - app) / (2.0 * apq);
                let t = if theta >= 0.0 {
                    1.0 / (theta + (1.0 + theta * theta).sqrt())
                } else {
                    1.0 / (theta - (1.0 + theta * theta).sqrt())
                };
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = t * c;

                m.set(p, p, app - t * apq);
                m.set(q, q, aqq + t * apq);
                m.set(p, q, 0.0);
                m.set(q, p, 0.0);
                for k in 0..n {
                    if k == p || k == q {
                        continue;
                    }
                    let akp = *m.at(k, p);
                    let akq = *m.at(k, q);
                    let nkp = c * akp - s * akq;
                    let nkq = s * akp + c * akq;
                    m.set(k, p, nkp);
                    m.set(p, k, nkp);
                    m.set(k, q, nkq);
                    m.set(q, k, nkq);
                }
                for k in 0..n {
                    let vkp = *v.at(k, p);
                    let vkq = *v.at(k, q);
                    v.set(k, p, c * vkp - s * vkq);
                    v.set(k, q, s * vkp + c * vkq);
                }
            }
        }
    }
    let evals = (0..n).map(|i| *m.at(i, i)).collect();
    (evals, v)
}

/// Smallest eigenvalue of a symmetric matrix.
pub fn min_eigenvalue(a: &DenseMatrix<f64>) -> f64 {
    let (evals, _) = jacobi_eigen(a);
    evals.into_iter().fold(f64::INFINITY, f64::min)
}

/// Project a packed svec block onto the PSD cone in place (clamp negative
/// eigenvalues to zero).
pub fn project_psd_svec(v: &mut [f64], n: usize) {
    let m = smat(n, v);
    let (evals, vecs) = jacobi_eigen(&m);
    if evals.iter().all(|&w| w >= 0.0) {
        return;
    }
    let mut out = DenseMatrix::zeros(n, n);
    for (idx, &w) in evals.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        for p in 0..n {
            let up = *vecs.at(p, idx);
            for q in 0..n {
                *out.at_mut(p, q) += w * up * vecs.at(q, idx);
            }
        }
    }
    v.copy_from_slice(&svec(&out));
}

/// Cholesky factor of a symmetric positive definite matrix, with a static
/// diagonal regularization term added before factoring.
#[derive(Clone, Debug)]
pub struct CholeskyFactor {
    n: usize,
    l: DenseMatrix<f64>,
}

impl CholeskyFactor {
    /// `None` when the (regularized) matrix is not positive definite.
    pub fn factor(a: &DenseMatrix<f64>, reg: f64) -> Option<Self> {
        debug_assert_eq!(a.rows, a.cols);
        let n = a.rows;
        let mut l = DenseMatrix::zeros(n, n);
        for j in 0..n {
            let mut d = a.at(j, j) + reg;
            for k in 0..j {
                d -= l.at(j, k) * l.at(j, k);
            }
            if d <= 0.0 || !d.is_finite() {
                return None;
            }
            let ljj = d.sqrt();
            l.set(j, j, ljj);
            for i in (j + 1)..n {
                let mut v = *a.at(i, j);
                for k in 0..j {
                    v -= l.at(i, k) * l.at(j, k);
                }
                l.set(i, j, v / ljj);
            }
        }
        Some(Self { n, l })
    }

    /// Solve `A x = b` via forward/backward substitution.
    pub fn solve(&self, b: &[f64]) -> Vec<f64> {
        debug_assert_eq!(b.len(), self.n);
        let n = self.n;
        let mut y = vec![0.0; n];
        for i in 0..n {
            let mut v = b[i];
            for k in 0..i {
                v -= self.l.at(i, k) * y[k];
            }
            y[i] = v / self.l.at(i, i);
        }
        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let mut v = y[i];
            for k in (i + 1)..n {
                v -= self.l.at(k, i) * x[k];
            }
            x[i] = v / self.l.at(i, i);
        }
        x
    }

    /// log det(A) = 2 * sum(log L_ii).
    pub fn log_det(&self) -> f64 {
        (0..self.n).map(|i| self.l.at(i, i).ln()).sum::<f64>() * 2.0
    }

    /// Dense inverse, column by column.
    pub fn inverse(&self) -> DenseMatrix<f64> {
        let n = self.n;
        let mut inv = DenseMatrix::zeros(n, n);
        let mut e = vec![0.0; n];
        for j in 0..n {
            e[j] = 1.0;
            let col = self.solve(&e);
            e[j] = 0.0;
            for i in 0..n {
                inv.set(i, j, col[i]);
            }
        }
        inv
    }
}
