//! Row layout of the opening-check trace.
//!
//! Every spot check `j` owns one block per committed matrix `k`. A block
//! holds one row per opened symbol (one per matrix row), hashing the leaf as a MiMC chain, then
//! `depth` rows climbing the Merkle path. Rows past the last block are
//! padding and carry the MiMC trace of `(0, 0)`.

use crate::field::FieldElement;
use crate::hash::mimc::{permutation_trace, MIMC_ROUNDS};
use crate::utils::next_power_of_two;

use crate::compiler::vortex::VortexCtx;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RowKind {
    Leaf {
        block_start: bool,
        spot_start: bool,
    },
    Path {
        level: usize,
        first: bool,
        block_end: bool,
        spot_end: bool,
    },
    Padding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Row {
    pub spot: usize,
    pub matrix: usize,
    pub kind: RowKind,
}

/// Number of rows used before padding.
pub(crate) fn used_rows(ctx: &VortexCtx) -> usize {
    ctx.spot_checks * (ctx.num_rows() + ctx.matrices.len() * ctx.depth)
}

pub(crate) fn trace_size(ctx: &VortexCtx) -> usize {
    next_power_of_two(used_rows(ctx))
}

pub(crate) fn layout(ctx: &VortexCtx) -> Vec<Row> {
    let size = trace_size(ctx);
    let mut rows = Vec::with_capacity(size);
    let last_matrix = ctx.matrices.len().saturating_sub(1);
    for spot in 0..ctx.spot_checks {
        for (matrix, info) in ctx.matrices.iter().enumerate() {
            for position in 0..info.num_rows() {
                rows.push(Row {
                    spot,
                    matrix,
                    kind: RowKind::Leaf {
                        block_start: position == 0,
                        spot_start: position == 0 && matrix == 0,
                    },
                });
            }
            for level in 0..ctx.depth {
                let block_end = level + 1 == ctx.depth;
                rows.push(Row {
                    spot,
                    matrix,
                    kind: RowKind::Path {
                        level,
                        first: level == 0,
                        block_end,
                        spot_end: block_end && matrix == last_matrix,
                    },
                });
            }
        }
    }
    rows.resize(
        size,
        Row {
            spot: 0,
            matrix: 0,
            kind: RowKind::Padding,
        },
    );
    rows
}

/// Fixed columns describing the layout.
#[derive(Debug, Clone, Default)]
pub(crate) struct Selectors {
    pub leaf: Vec<FieldElement>,
    pub leaf_start: Vec<FieldElement>,
    pub path: Vec<FieldElement>,
    pub path_start: Vec<FieldElement>,
    pub block_end: Vec<FieldElement>,
    pub spot_start: Vec<FieldElement>,
    pub spot_end: Vec<FieldElement>,
    pub pow2: Vec<FieldElement>,
    pub spot_id: Vec<FieldElement>,
    pub matrix_id: Vec<FieldElement>,
}

impl Selectors {
    pub(crate) fn new(rows: &[Row]) -> Self {
        let mut out = Selectors::default();
        for row in rows {
            let (leaf, leaf_start, spot_start) = match row.kind {
                RowKind::Leaf {
                    block_start,
                    spot_start,
                } => (true, block_start, spot_start),
                _ => (false, false, false),
            };
            let (path, path_start, block_end, spot_end, pow2) = match row.kind {
                RowKind::Path {
                    level,
                    first,
                    block_end,
                    spot_end,
                } => (true, first, block_end, spot_end, FieldElement::from(1u64 << level)),
                _ => (false, false, false, false, FieldElement::ZERO),
            };
            out.leaf.push(leaf.into());
            out.leaf_start.push(leaf_start.into());
            out.spot_start.push(spot_start.into());
            out.path.push(path.into());
            out.path_start.push(path_start.into());
            out.block_end.push(block_end.into());
            out.spot_end.push(spot_end.into());
            out.pow2.push(pow2);
            out.spot_id.push(FieldElement::from(row.spot as u64));
            out.matrix_id.push(FieldElement::from(row.matrix as u64));
        }
        out
    }
}

/// Prover-side trace columns.
#[derive(Debug, Clone, Default)]
pub(crate) struct Trace {
    pub key: Vec<FieldElement>,
    pub msg: Vec<FieldElement>,
    pub sib: Vec<FieldElement>,
    pub bit: Vec<FieldElement>,
    pub pos: Vec<FieldElement>,
    pub acc: Vec<FieldElement>,
    pub out: Vec<FieldElement>,
    pub states: Vec<Vec<FieldElement>>,
}

impl Trace {
    pub(crate) fn with_capacity(rows: usize) -> Self {
        Self {
            key: Vec::with_capacity(rows),
            msg: Vec::with_capacity(rows),
            sib: Vec::with_capacity(rows),
            bit: Vec::with_capacity(rows),
            pos: Vec::with_capacity(rows),
            acc: Vec::with_capacity(rows),
            out: Vec::with_capacity(rows),
            states: vec![Vec::with_capacity(rows); MIMC_ROUNDS],
        }
    }

    /// Appends one compression `C(key, msg)` and returns its output.
    pub(crate) fn push(
        &mut self,
        key: FieldElement,
        msg: FieldElement,
        sib: FieldElement,
        bit: bool,
        pos: FieldElement,
        acc: FieldElement,
    ) -> FieldElement {
        let states = permutation_trace(key, msg);
        let out = states[MIMC_ROUNDS - 1] + key.double() + msg;
        for (column, state) in self.states.iter_mut().zip(states) {
            column.push(state);
        }
        self.key.push(key);
        self.msg.push(msg);
        self.sib.push(sib);
        self.bit.push(bit.into());
        self.pos.push(pos);
        self.acc.push(acc);
        self.out.push(out);
        out
    }

    pub(crate) fn len(&self) -> usize {
        self.key.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iop::{CoinId, ColumnId, EvalPoint, SlotId};
    use crate::compiler::vortex::VortexMatrix;
    use crate::params::HashFamily;

    fn ctx(widths: &[usize], spot_checks: usize, depth: usize) -> VortexCtx {
        VortexCtx {
            name: "V".into(),
            instance: 0,
            hash: HashFamily::Mimc,
            blowup: 2,
            width: 1 << (depth - 1),
            spot_checks,
            depth,
            matrices: widths
                .iter()
                .enumerate()
                .map(|(k, &w)| VortexMatrix {
                    round: k,
                    columns: (0..w).map(|c| ColumnId::from_index(k * 10 + c)).collect(),
                    chunks: vec![1; w],
                    root: SlotId::from_index(k),
                })
                .collect(),
            point: EvalPoint::Constant(FieldElement::ZERO),
            eval_round: 0,
            claims: Vec::new(),
            public_claims: Vec::new(),
            split: None,
            alpha: CoinId::from_index(0),
            u_alpha: ColumnId::from_index(100),
            spots: CoinId::from_index(1),
            opened: ColumnId::from_index(101),
            paths: SlotId::from_index(9),
            self_recursed: true,
        }
    }

    #[test]
    fn blocks_follow_spots_then_matrices() {
        let ctx = ctx(&[2, 1], 2, 3);
        let rows = layout(&ctx);
        assert_eq!(used_rows(&ctx), 2 * (3 + 2 * 3));
        assert_eq!(rows.len(), 32);
        let selectors = Selectors::new(&rows);
        let ends: Vec<usize> = (0..rows.len()).filter(|&i| selectors.block_end[i] == FieldElement::ONE).collect();
        assert_eq!(ends, vec![4, 8, 13, 17]);
        let spot_ends: Vec<usize> = (0..rows.len()).filter(|&i| selectors.spot_end[i] == FieldElement::ONE).collect();
        assert_eq!(spot_ends, vec![8, 17]);
        assert_eq!(selectors.pow2[4], FieldElement::from(4u64));
        assert!(matches!(rows[18].kind, RowKind::Padding));
    }
}
