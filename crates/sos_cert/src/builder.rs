//! Putinar program construction.
//!
//! Builds the equality system for
//! `P = sigma_0 + sum_i g_i * sigma_i`
//! over Gram free variables: one row per monomial `alpha` with
//! `|alpha| <= deg P`, diagonal entries with coefficient 1, off-diagonal
//! entries with 2 (they appear twice by symmetry), and constraint
//! contributions `g_i[beta] * mult` at the pair buckets of `alpha - beta`.
//!
//! Degree mismatches never raise: the affected multiplier block is dropped,
//! a warning is recorded, and the layout closes the gap.

use crate::error::{BuildWarning, CertError};
use crate::layout::BlockLayout;
use crate::system::ConstraintSystem;
use rustc_hash::FxHashMap;
use sos_poly::{CoefficientMap, MonomialBasis, ProductTable};
use std::collections::BTreeMap;
use tracing::debug;

/// Basis + product table, cached per half-degree so blocks of equal
/// half-degree share one O(m^2) table build.
struct BasisCache {
    nvars: usize,
    entries: BTreeMap<u32, (MonomialBasis, ProductTable)>,
}

impl BasisCache {
    fn new(nvars: usize) -> Self {
        Self {
            nvars,
            entries: BTreeMap::new(),
        }
    }

    fn ensure(&mut self, half_degree: u32) {
        self.entries.entry(half_degree).or_insert_with(|| {
            let basis = MonomialBasis::generate(self.nvars, half_degree);
            let table = ProductTable::build(&basis);
            (basis, table)
        });
    }

    fn get(&self, half_degree: u32) -> &(MonomialBasis, ProductTable) {
        &self.entries[&half_degree]
    }
}

/// Build the equality system and PSD layout for a target and its domain
/// constraints. Soft conditions come back as warnings, never as errors.
pub fn build_program(
    target: &CoefficientMap,
    constraints: &[CoefficientMap],
) -> Result<(ConstraintSystem, Vec<BuildWarning>), CertError> {
    let nvars = target.nvars();
    for (i, g) in constraints.iter().enumerate() {
        if g.nvars() != nvars {
            return Err(CertError::VarMismatch {
                index: i,
                got: g.nvars(),
                expected: nvars,
            });
        }
    }

    let deg_p = target.degree();
    let half0 = deg_p / 2;
    let mut warnings = Vec::new();

    // Degree matching: a multiplier for g_i of degree d_i needs
    // half_i = floor((deg P - d_i) / 2) >= 0.
    let mut retained: Vec<(usize, u32)> = Vec::new();
    for (i, g) in constraints.iter().enumerate() {
        let deg_g = g.degree();
        if deg_g > deg_p {
            warnings.push(BuildWarning::DegreeMismatch {
                constraint: i,
                constraint_degree: deg_g,
                target_degree: deg_p,
            });
            continue;
        }
        retained.push((i, (deg_p - deg_g) / 2));
    }

    let mut cache = BasisCache::new(nvars);
    cache.ensure(half0);
    for &(_, half) in &retained {
        cache.ensure(half);
    }

    let mut layout = BlockLayout::default();
    layout.push_block(cache.get(half0).0.len(), None, half0);
    for &(i, half) in &retained {
        layout.push_block(cache.get(half).0.len(), Some(i), half);
    }

    // Every monomial up to deg P gets a row; absent target monomials are
    // real zero-RHS constraints.
    let row_basis = MonomialBasis::generate(nvars, deg_p);
    let mut rows = Vec::with_capacity(row_basis.len());
    let mut rhs = Vec::with_capacity(row_basis.len());

    for alpha in row_basis.iter() {
        let mut row: FxHashMap<usize, f64> = FxHashMap::default();

        // Main block: sigma_0 contribution.
        let main = &layout.blocks[0];
        let (_, table0) = cache.get(half0);
        for &(p, q) in table0.pairs(alpha) {
            let mult = if p == q { 1.0 } else { 2.0 };
            *row.entry(main.tri_index(p, q)).or_insert(0.0) += mult;
        }

        // Retained constraint blocks: g_i * sigma_i contributions.
        for (block_idx, &(i, half)) in retained.iter().enumerate() {
            let block = &layout.blocks[1 + block_idx];
            let (_, table) = cache.get(half);
            for (beta, g_coeff) in constraints[i].iter() {
                let Some(diff) = alpha.checked_div(beta) else {
                    continue;
                };
                for &(p, q) in table.pairs(&diff) {
                    let mult = if p == q { 1.0 } else { 2.0 };
                    *row.entry(block.tri_index(p, q)).or_insert(0.0) += g_coeff * mult;
                }
            }
        }

        let mut row: Vec<(usize, f64)> = row.into_iter().filter(|&(_, v)| v != 0.0).collect();
        row.sort_by_key(|&(col, _)| col);
        rows.push(row);
        rhs.push(target.get(alpha));
    }

    debug!(
        rows = rows.len(),
        vars = layout.num_vars,
        blocks = layout.blocks.len(),
        dropped = warnings.len(),
        "built SOS equality system"
    );

    let system = ConstraintSystem {
        nvars,
        target_degree: deg_p,
        rows,
        rhs,
        layout,
        target_monomials: row_basis.monomials().to_vec(),
    };
    Ok((system, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sos_poly::{encode, Expr};

    fn x() -> Expr {
        Expr::var(0)
    }

    fn y() -> Expr {
        Expr::var(1)
    }

    #[test]
    fn main_block_layout_for_x2_plus_y2() {
        let p = encode(&(x().pow(2) + y().pow(2)), 2).unwrap();
        let (sys, warnings) = build_program(&p, &[]).unwrap();
        assert!(warnings.is_empty());
        // Main basis {1, x, y}: one 3x3 block, 6 free variables.
        assert_eq!(sys.layout.block_sizes(), vec![3]);
        assert_eq!(sys.num_vars(), 6);
        // Rows for all monomials up to degree 2.
        assert_eq!(sys.num_rows(), 6);
        // RHS: zero everywhere except x^2 and y^2.
        let nonzero: Vec<f64> = sys.rhs.iter().copied().filter(|&v| v != 0.0).collect();
        assert_eq!(nonzero, vec![1.0, 1.0]);
    }

    #[test]
    fn absent_monomials_still_get_rows() {
        let p = encode(&(x().pow(2) + y().pow(2)), 2).unwrap();
        let (sys, _) = build_program(&p, &[]).unwrap();
        // The xy row exists with RHS 0 and a nonzero coefficient pattern
        // (it pins the (x, y) Gram entry).
        let xy_pos = sys
            .target_monomials
            .iter()
            .position(|m| m.exps() == [1, 1])
            .unwrap();
        assert_eq!(sys.rhs[xy_pos], 0.0);
        assert!(!sys.rows[xy_pos].is_empty());
    }

    #[test]
    fn off_diagonal_coefficient_is_two() {
        let p = encode(&(x().pow(2) + y().pow(2)), 2).unwrap();
        let (sys, _) = build_program(&p, &[]).unwrap();
        let main = &sys.layout.blocks[0];
        // Row for x (= basis pair (1, x)) carries coefficient 2 on the
        // off-diagonal variable, rows for x^2 carry 1 on the diagonal.
        let x_pos = sys
            .target_monomials
            .iter()
            .position(|m| m.exps() == [1, 0])
            .unwrap();
        assert_eq!(sys.rows[x_pos], vec![(main.tri_index(0, 1), 2.0)]);
        let x2_pos = sys
            .target_monomials
            .iter()
            .position(|m| m.exps() == [2, 0])
            .unwrap();
        assert_eq!(sys.rows[x2_pos], vec![(main.tri_index(1, 1), 1.0)]);
    }

    #[test]
    fn degree_mismatch_drops_block_without_gap() {
        let p = encode(&(x().pow(2) + y().pow(2)), 2).unwrap();
        let g_ok = encode(&x(), 2).unwrap();
        let g_too_big = encode(&(x().pow(4)), 2).unwrap();
        let (sys, warnings) = build_program(&p, &[g_too_big, g_ok]).unwrap();
        assert_eq!(
            warnings,
            vec![BuildWarning::DegreeMismatch {
                constraint: 0,
                constraint_degree: 4,
                target_degree: 2,
            }]
        );
        // Only the main block and g_1's block survive, and offsets are
        // contiguous.
        assert_eq!(sys.layout.blocks.len(), 2);
        assert_eq!(sys.layout.blocks[1].multiplier, Some(1));
        assert_eq!(
            sys.layout.blocks[1].offset,
            sys.layout.blocks[0].tri_len()
        );
    }

    #[test]
    fn constraint_contribution_uses_shifted_buckets() {
        // P = x over {x >= 0}: sigma_0, sigma_1 are scalars (bases {1}).
        let p = encode(&x(), 1).unwrap();
        let g = encode(&x(), 1).unwrap();
        let (sys, warnings) = build_program(&p, &[g]).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(sys.layout.block_sizes(), vec![1, 1]);
        // Constant row: sigma_0 only. x row: sigma_1 only.
        assert_eq!(sys.rows[0], vec![(0, 1.0)]);
        assert_eq!(sys.rhs[0], 0.0);
        assert_eq!(sys.rows[1], vec![(1, 1.0)]);
        assert_eq!(sys.rhs[1], 1.0);
    }

    #[test]
    fn shared_half_degree_reuses_table() {
        // Two degree-2 constraints under a degree-4 target share half = 1.
        let p = encode(&((x().pow(2) + y().pow(2)).pow(2)), 2).unwrap();
        let g1 = encode(&(x() * x()), 2).unwrap();
        let g2 = encode(&(y() * y()), 2).unwrap();
        let (sys, warnings) = build_program(&p, &[g1, g2]).unwrap();
        assert!(warnings.is_empty());
        // Main basis has degree bound 2 (size 6); both multipliers get the
        // degree-1 basis (size 3).
        assert_eq!(sys.layout.block_sizes(), vec![6, 3, 3]);
    }

    #[test]
    fn var_mismatch_is_fatal() {
        let p = encode(&x(), 1).unwrap();
        let g = encode(&y(), 2).unwrap();
        assert!(matches!(
            build_program(&p, &[g]),
            Err(CertError::VarMismatch { index: 0, .. })
        ));
    }
}
