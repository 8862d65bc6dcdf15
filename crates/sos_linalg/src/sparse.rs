//! Scoped triplet accumulation and a minimal CSC matrix.
//!
//! A `TripletBuffer` is created once per solve call, filled append-only
//! while the equality system is flattened, and consumed into a `CscMatrix`.
//! Nothing here is shared across calls.

use crate::dense::DenseMatrix;

/// Append-only (row, col, value) accumulator.
#[derive(Clone, Debug, Default)]
pub struct TripletBuffer {
    nrows: usize,
    ncols: usize,
    entries: Vec<(usize, usize, f64)>,
}

impl TripletBuffer {
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, row: usize, col: usize, val: f64) {
        debug_assert!(row < self.nrows && col < self.ncols);
        if val != 0.0 {
            self.entries.push((row, col, val));
        }
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Consume into compressed-sparse-column form; duplicates are summed.
    pub fn into_csc(mut self) -> CscMatrix {
        self.entries
            .sort_by(|a, b| (a.1, a.0).cmp(&(b.1, b.0)));
        let mut colptr = vec![0usize; self.ncols + 1];
        let mut rowval: Vec<usize> = Vec::with_capacity(self.entries.len());
        let mut nzval: Vec<f64> = Vec::with_capacity(self.entries.len());
        let mut last: Option<(usize, usize)> = None;
        for &(r, c, v) in &self.entries {
            if last == Some((c, r)) {
                // Duplicate coordinate: accumulate.
                if let Some(tail) = nzval.last_mut() {
                    *tail += v;
                }
                continue;
            }
            rowval.push(r);
            nzval.push(v);
            colptr[c + 1] += 1;
            last = Some((c, r));
        }
        for c in 0..self.ncols {
            colptr[c + 1] += colptr[c];
        }
        CscMatrix {
            nrows: self.nrows,
            ncols: self.ncols,
            colptr,
            rowval,
            nzval,
        }
    }
}

/// Compressed sparse column matrix.
#[derive(Clone, Debug)]
pub struct CscMatrix {
    pub nrows: usize,
    pub ncols: usize,
    pub colptr: Vec<usize>,
    pub rowval: Vec<usize>,
    pub nzval: Vec<f64>,
}

impl CscMatrix {
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        triplets: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Self {
        let mut buf = TripletBuffer::new(nrows, ncols);
        for (r, c, v) in triplets {
            buf.push(r, c, v);
        }
        buf.into_csc()
    }

    pub fn nnz(&self) -> usize {
        self.nzval.len()
    }

    /// `y = A x`.
    pub fn mat_vec(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(x.len(), self.ncols);
        let mut y = vec![0.0; self.nrows];
        for c in 0..self.ncols {
            let xc = x[c];
            if xc == 0.0 {
                continue;
            }
            for k in self.colptr[c]..self.colptr[c + 1] {
                y[self.rowval[k]] += self.nzval[k] * xc;
            }
        }
        y
    }

    /// `y = A^T x`.
    pub fn mat_tvec(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(x.len(), self.nrows);
        let mut y = vec![0.0; self.ncols];
        for c in 0..self.ncols {
            let mut acc = 0.0;
            for k in self.colptr[c]..self.colptr[c + 1] {
                acc += self.nzval[k] * x[self.rowval[k]];
            }
            y[c] = acc;
        }
        y
    }

    /// Dense `A A^T`, used for the affine-projection factorizations.
    pub fn aat(&self) -> DenseMatrix<f64> {
        let mut out = DenseMatrix::zeros(self.nrows, self.nrows);
        for c in 0..self.ncols {
            for k in self.colptr[c]..self.colptr[c + 1] {
                let (ri, vi) = (self.rowval[k], self.nzval[k]);
                for k2 in self.colptr[c]..self.colptr[c + 1] {
                    *out.at_mut(ri, self.rowval[k2]) += vi * self.nzval[k2];
                }
            }
        }
        out
    }
}
