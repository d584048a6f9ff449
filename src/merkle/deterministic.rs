use crate::field::FieldElement;
use crate::hash::Hasher;
use crate::params::HashFamily;

use super::traits::MerkleHasher;
use super::types::Digest;

pub(crate) const LEAF_DOMAIN_TAG: u8 = 0x00;
pub(crate) const NODE_DOMAIN_TAG: u8 = 0x01;

/// Blake2s Merkle hasher: `H(tag || u64_le(domain_sep) || payload)`.
#[derive(Debug, Clone, Copy)]
pub struct Blake2sMerkleHasher {
    domain_sep: u64,
}

impl Blake2sMerkleHasher {
    pub const fn new(domain_sep: u64) -> Self {
        Self { domain_sep }
    }

    fn start(&self, tag: u8) -> Hasher {
        let mut hasher = Hasher::new();
        hasher.update(&[tag]);
        hasher.update_u64(self.domain_sep);
        hasher
    }
}

impl MerkleHasher for Blake2sMerkleHasher {
    fn hash_leaf(&self, values: &[FieldElement]) -> Digest {
        let mut hasher = self.start(LEAF_DOMAIN_TAG);
        hasher.update_felts(values);
        Digest(hasher.finalize().into_bytes())
    }

    fn hash_nodes(&self, left: &Digest, right: &Digest) -> Digest {
        let mut hasher = self.start(NODE_DOMAIN_TAG);
        hasher.update(left.as_bytes());
        hasher.update(right.as_bytes());
        Digest(hasher.finalize().into_bytes())
    }

    fn hash_family(&self) -> HashFamily {
        HashFamily::Blake2s
    }
}
