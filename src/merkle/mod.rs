//! Binary Merkle commitments.
//!
//! * **Arity:** binary; the leaf count must be a power of two.
//! * **Leaf layout:** a leaf is a row of field elements, hashed by the
//!   configured [`MerkleHasher`].
//! * **Domain separation:** the Blake2s hasher prefixes a one byte node tag
//!   (`0x00` for leaves, `0x01` for internal nodes) and a `u64` domain
//!   separator. The MiMC hasher works on field elements and is separated by
//!   construction (leaves chain from zero, nodes compress two digests).
//! * **Hash family:** selected through [`crate::params::HashFamily`] via
//!   [`hasher_for`].

mod deterministic;
mod mimc;
mod proof;
pub mod traits;
mod tree;
mod types;

pub use deterministic::Blake2sMerkleHasher;
pub use mimc::MimcMerkleHasher;
pub use proof::{compute_root, verify_path};
pub use traits::MerkleHasher;
pub use tree::MerkleTree;
pub use types::{Digest, MerkleError, MerklePath, DIGEST_SIZE};

use crate::params::HashFamily;

static BLAKE2S_HASHER: Blake2sMerkleHasher = Blake2sMerkleHasher::new(0);
static MIMC_HASHER: MimcMerkleHasher = MimcMerkleHasher;

/// Returns the shared hasher instance for a hash family.
pub fn hasher_for(family: HashFamily) -> &'static dyn MerkleHasher {
    match family {
        HashFamily::Blake2s => &BLAKE2S_HASHER,
        HashFamily::Mimc => &MIMC_HASHER,
    }
}
