//! Column registry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::errors::DefinitionError;
use super::ids::{CoinId, ColumnId, QueryId, SlotId};

/// How the values of a column reach the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Hidden behind a commitment.
    Committed,
    /// Sent in the clear inside the proof.
    Proof,
    /// Fixed at definition time and known to both parties.
    Precomputed,
    /// Derived by the verifier from coins, digests and query results.
    VerifierDefined,
    /// Assigned by the prover but neither sent nor committed; a compiler pass
    /// has taken over its soundness.
    Ignored,
}

impl ColumnKind {
    pub(crate) const fn code(self) -> u8 {
        match self {
            ColumnKind::Committed => 0,
            ColumnKind::Proof => 1,
            ColumnKind::Precomputed => 2,
            ColumnKind::VerifierDefined => 3,
            ColumnKind::Ignored => 4,
        }
    }

    /// The verifier reads the values without any opening argument.
    pub const fn is_public(self) -> bool {
        matches!(
            self,
            ColumnKind::Proof | ColumnKind::Precomputed | ColumnKind::VerifierDefined
        )
    }
}

/// Who produces the values of a prover-side column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnOrigin {
    /// Supplied by the witness source.
    Witness,
    /// Computed by a prover action registered by a compiler pass.
    Derived,
}

/// Recipe of a verifier-defined column. Entries are zero-padded to the
/// column size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerifierColumn {
    /// Entries of an integer-vector coin.
    IntegerCoin { coin: CoinId },
    /// Field encodings of every digest held by the slots, in order.
    DigestSlots { slots: Vec<SlotId> },
    /// First result of each listed query.
    QueryResults { queries: Vec<QueryId> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub size: usize,
    pub round: usize,
    pub kind: ColumnKind,
    pub origin: ColumnOrigin,
}

/// Append-only registry of columns, addressable by id and by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnRegistry {
    entries: Vec<ColumnInfo>,
    by_name: BTreeMap<String, ColumnId>,
}

impl ColumnRegistry {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: ColumnId) -> Option<&ColumnInfo> {
        self.entries.get(id.index())
    }

    pub fn lookup(&self, name: &str) -> Option<ColumnId> {
        self.by_name.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ColumnId, &ColumnInfo)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, info)| (ColumnId::from_index(index), info))
    }

    /// Ids minted by this registry are always in range.
    pub(crate) fn info(&self, id: ColumnId) -> &ColumnInfo {
        &self.entries[id.index()]
    }

    pub(crate) fn contains(&self, id: ColumnId) -> bool {
        id.index() < self.entries.len()
    }

    pub(crate) fn insert(&mut self, info: ColumnInfo) -> Result<ColumnId, DefinitionError> {
        if info.size == 0 || !info.size.is_power_of_two() {
            return Err(DefinitionError::InvalidSize {
                name: info.name,
                size: info.size,
            });
        }
        if self.by_name.contains_key(&info.name) {
            return Err(DefinitionError::DuplicateName { name: info.name });
        }
        let id = ColumnId::from_index(self.entries.len());
        self.by_name.insert(info.name.clone(), id);
        self.entries.push(info);
        Ok(id)
    }

    pub(crate) fn set_kind(&mut self, id: ColumnId, kind: ColumnKind) {
        if let Some(entry) = self.entries.get_mut(id.index()) {
            entry.kind = kind;
        }
    }
}
