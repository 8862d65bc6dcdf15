//! Linear algebra for the SOS pipeline.
//!
//! One elimination/null-space/solve interface, polymorphic over an
//! arithmetic backend (exact rationals, a prime field, floating point)
//! selected by value rather than by duplicated code paths. On top of that:
//! the dense symmetric f64 kernels the conic solvers need (Cholesky,
//! Jacobi eigendecomposition, scaled-triangle svec/smat) and a minimal CSC
//! sparse matrix built from scoped triplet buffers.

pub mod arith;
pub mod dense;
pub mod modp;
pub mod sparse;
pub mod sym;

pub use arith::{Arithmetic, Floats, Rationals};
pub use dense::{eliminate, mat_vec, null_space, solve_linear, DenseMatrix, Echelon};
pub use modp::PrimeField;
pub use sparse::{CscMatrix, TripletBuffer};
pub use sym::{
    jacobi_eigen, min_eigenvalue, project_psd_svec, smat, svec, tri_len, CholeskyFactor, SQRT_2,
};
