//! Gram block bookkeeping.
//!
//! Every multiplier (`sigma_0` for the unconstrained part, `sigma_i`
//! paired with constraint `g_i`) is one symmetric matrix variable,
//! represented by its `m(m+1)/2` upper-triangular free scalars. Blocks are
//! laid out flat: main block first, then each retained constraint block in
//! input order, with no index gaps.

use serde::Serialize;

/// One symmetric matrix variable in the flat layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GramBlock {
    /// Side length of the matrix (size of its monomial basis).
    pub side: usize,
    /// First flat variable index of this block.
    pub offset: usize,
    /// `None` for the main block, `Some(i)` for constraint `g_i`.
    pub multiplier: Option<usize>,
    /// Half-degree bound of the block's monomial basis.
    pub half_degree: u32,
}

impl GramBlock {
    /// Number of free scalars: m(m+1)/2.
    #[inline]
    pub fn tri_len(&self) -> usize {
        self.side * (self.side + 1) / 2
    }

    /// Flat variable index of upper-triangle entry `(p, q)`, `p <= q`
    /// (row-major over the upper triangle, matching svec order).
    #[inline]
    pub fn tri_index(&self, p: usize, q: usize) -> usize {
        debug_assert!(p <= q && q < self.side);
        let before = p * self.side - p * (p + 1) / 2 + p;
        self.offset + before + (q - p)
    }

    /// Whether flat-local index `k` sits on the diagonal.
    pub fn is_diagonal(&self, local: usize) -> bool {
        let mut k = local;
        for p in 0..self.side {
            let row_len = self.side - p;
            if k < row_len {
                return k == 0;
            }
            k -= row_len;
        }
        false
    }
}

/// Ordered Gram blocks plus the total flat variable count.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BlockLayout {
    pub blocks: Vec<GramBlock>,
    pub num_vars: usize,
}

impl BlockLayout {
    /// Append a block of the given side, returning its index.
    pub fn push_block(&mut self, side: usize, multiplier: Option<usize>, half_degree: u32) -> usize {
        let block = GramBlock {
            side,
            offset: self.num_vars,
            multiplier,
            half_degree,
        };
        self.num_vars += block.tri_len();
        self.blocks.push(block);
        self.blocks.len() - 1
    }

    /// PSD block sides in layout order.
    pub fn block_sizes(&self) -> Vec<usize> {
        self.blocks.iter().map(|b| b.side).collect()
    }
}
