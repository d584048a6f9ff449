use serde::{Deserialize, Serialize};

use crate::field::FieldElement;
use crate::iop::{ColumnId, ColumnKind, QueryId, QueryParams, SlotId, SlotVisibility, Specification};
use crate::merkle::Digest;

pub const PROOF_VERSION: u8 = 1;

/// Output of the prover. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub version: u8,
    pub spec_digest: Digest,
    pub column_commitments: Vec<Digest>,
    pub messages: Vec<Vec<FieldElement>>,
    pub digests: Vec<Vec<Digest>>,
    pub params: Vec<QueryParams>,
}

/// Which registry entries fill which proof vector, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofLayout {
    pub commitments: Vec<ColumnId>,
    pub messages: Vec<ColumnId>,
    pub digests: Vec<SlotId>,
    pub params: Vec<QueryId>,
}

impl ProofLayout {
    pub fn of(spec: &Specification) -> Self {
        let columns_of = |kind: ColumnKind| {
            spec.columns()
                .iter()
                .filter(|(_, info)| info.kind == kind)
                .map(|(id, _)| id)
                .collect::<Vec<_>>()
        };
        Self {
            commitments: columns_of(ColumnKind::Committed),
            messages: columns_of(ColumnKind::Proof),
            digests: spec
                .slots()
                .iter()
                .enumerate()
                .filter(|(_, slot)| slot.visibility == SlotVisibility::Sent)
                .map(|(index, _)| SlotId::from_index(index))
                .collect(),
            params: spec
                .queries()
                .iter()
                .filter(|(_, info)| info.query.result_len().is_some())
                .map(|(id, _)| id)
                .collect(),
        }
    }

    /// Exact length of the serialized proof.
    pub fn encoded_len(&self, spec: &Specification) -> usize {
        let column_size = |id: &ColumnId| spec.columns().get(*id).map_or(0, |info| info.size);
        let slot_count = |id: &SlotId| spec.slot(*id).map_or(0, |slot| slot.count);
        let result_len = |id: &QueryId| {
            spec.queries()
                .get(*id)
                .and_then(|info| info.query.result_len())
                .unwrap_or(0)
        };
        1 + 32
            + 4
            + 32 * self.commitments.len()
            + 4
            + self.messages.iter().map(|id| 4 + 8 * column_size(id)).sum::<usize>()
            + 4
            + self.digests.iter().map(|id| 4 + 32 * slot_count(id)).sum::<usize>()
            + 4
            + self.params.iter().map(|id| 4 + 8 * result_len(id)).sum::<usize>()
    }
}
