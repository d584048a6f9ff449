use crate::field::FieldElement;
use crate::params::HashFamily;

use super::types::Digest;

/// Hash abstraction used by the Merkle commitment layer.
pub trait MerkleHasher: Send + Sync {
    /// Hashes one leaf (a row of field elements).
    fn hash_leaf(&self, values: &[FieldElement]) -> Digest;

    /// Hashes two ordered children into their parent.
    fn hash_nodes(&self, left: &Digest, right: &Digest) -> Digest;

    fn hash_family(&self) -> HashFamily;
}
