use serde::{Deserialize, Serialize};

/// Hash families that may back Merkle commitments.
///
/// | Variant | Digest | Notes |
/// |---------|--------|-------|
/// | `Blake2s` | 32 bytes | Byte-oriented, fastest natively. |
/// | `Mimc` | one field element | Field-native; required for self-recursion. |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HashFamily {
    #[default]
    Blake2s,
    Mimc,
}

impl HashFamily {
    pub(crate) const fn code(self) -> u8 {
        match self {
            HashFamily::Blake2s => 1,
            HashFamily::Mimc => 2,
        }
    }

    pub(crate) const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(HashFamily::Blake2s),
            2 => Some(HashFamily::Mimc),
            _ => None,
        }
    }
}

/// Vortex commitment configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VortexParams {
    /// Reed-Solomon blow-up factor (inverse code rate).
    pub blowup: u32,
    /// Hash family of the Merkle trees over encoded rows.
    pub merkle_hash: HashFamily,
    /// Cap on the matrix width; defaults to `2^10`. Columns longer than
    /// the width are split into coefficient chunks.
    pub matrix_width: Option<u32>,
    /// Explicit spot-check count overriding the derived one.
    pub num_opened: Option<u32>,
}

/// Global soundness budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityBudget {
    pub target_bits: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecursionParams {
    /// Number of self-recursion passes after the first Vortex.
    pub levels: u8,
}

/// Resource ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitParams {
    /// Maximum number of rounds of a compiled specification.
    pub round_budget: u32,
    /// Committed cells above which the prover refuses to start.
    pub max_committed_cells: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptParams {
    pub protocol_tag: u64,
}
