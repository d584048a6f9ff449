//! Dry-run cost model.

use serde::{Deserialize, Serialize};

use crate::compiler::vortex;
use crate::field::FieldElement;
use crate::iop::{ColumnKind, Specification};
use crate::merkle::DIGEST_SIZE;
use crate::proof::ProofLayout;

/// Resources a proof of `spec` needs, computed without a witness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CostEstimate {
    pub rounds: usize,
    /// Cells hidden behind a commitment (hash or Vortex matrix).
    pub committed_cells: u64,
    /// Reed-Solomon symbols produced by Vortex.
    pub encoded_cells: u64,
    /// Leaf and node hashes of every Merkle tree.
    pub hash_invocations: u64,
    pub proof_bytes: u64,
    /// Upper bound on the memory held by one prover runtime.
    pub peak_bytes: u64,
}

pub fn estimate(spec: &Specification) -> CostEstimate {
    let felt = core::mem::size_of::<FieldElement>() as u64;
    let mut committed_cells = 0u64;
    let mut all_cells = 0u64;
    for (_, info) in spec.columns().iter() {
        all_cells += info.size as u64;
        if info.kind == ColumnKind::Committed {
            committed_cells += info.size as u64;
        }
    }

    let mut encoded_cells = 0u64;
    let mut hash_invocations = 0u64;
    for ctx in vortex::contexts(spec) {
        let leaves = (ctx.width * ctx.blowup) as u64;
        for matrix in &ctx.matrices {
            let rows = matrix.num_rows() as u64;
            committed_cells += rows * ctx.width as u64;
            encoded_cells += rows * leaves;
            hash_invocations += 2 * leaves - 1;
        }
    }

    let proof_bytes = ProofLayout::of(spec).encoded_len(spec) as u64;
    let peak_bytes = felt * (all_cells + encoded_cells) + DIGEST_SIZE as u64 * hash_invocations;
    CostEstimate {
        rounds: spec.num_rounds(),
        committed_cells,
        encoded_cells,
        hash_invocations,
        proof_bytes,
        peak_bytes,
    }
}
