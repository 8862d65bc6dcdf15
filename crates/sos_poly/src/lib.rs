//! Monomial bookkeeping and sparse polynomial encoding for the SOS pipeline.
//!
//! The certificate builder needs three things from this crate: a
//! deterministic ordered monomial basis up to a degree bound, the pair
//! table telling which basis products land on which monomial, and a sparse
//! monomial -> coefficient view of the target and constraint polynomials.

pub mod basis;
pub mod encode;
pub mod expr;
pub mod mono;
pub mod table;

pub use basis::{binomial, MonomialBasis};
pub use encode::{encode, CoefficientMap, PolyError};
pub use expr::Expr;
pub use mono::Monomial;
pub use table::ProductTable;
