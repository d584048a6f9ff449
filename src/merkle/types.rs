use serde::{Deserialize, Serialize};
use std::fmt;

use crate::field::FieldElement;

/// Size of every digest in bytes.
pub const DIGEST_SIZE: usize = 32;

/// Canonical digest used inside Merkle paths and commitments.
///
/// Field-native hashers store their output as the little-endian canonical
/// integer in the first eight bytes, the remaining bytes being zero.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Digest(pub [u8; DIGEST_SIZE]);

impl Digest {
    pub const fn new(bytes: [u8; DIGEST_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns a reference to the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }

    pub fn from_field(value: FieldElement) -> Self {
        let mut bytes = [0u8; DIGEST_SIZE];
        bytes[..8].copy_from_slice(&value.0.to_le_bytes());
        Self(bytes)
    }

    /// Reads back a field-native digest; `None` if the encoding is not one.
    pub fn to_field(&self) -> Option<FieldElement> {
        if self.0[8..].iter().any(|byte| *byte != 0) {
            return None;
        }
        let mut word = [0u8; 8];
        word.copy_from_slice(&self.0[..8]);
        FieldElement::from_canonical(u64::from_le_bytes(word))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest(0x")?;
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, ")")
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Authentication path for a single leaf, siblings ordered leaf to root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerklePath {
    pub index: usize,
    pub siblings: Vec<Digest>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MerkleError {
    #[error("cannot commit to an empty set of leaves")]
    EmptyLeaves,
    #[error("leaf count {count} is not a power of two")]
    NonPowerOfTwo { count: usize },
    #[error("leaf index {index} out of range for {leaves} leaves")]
    IndexOutOfRange { index: usize, leaves: usize },
    #[error("path has {got} siblings, expected {expected}")]
    PathLength { expected: usize, got: usize },
    #[error("recomputed root does not match the commitment")]
    RootMismatch,
}
