use super::traits::MerkleHasher;
use super::types::{Digest, MerkleError, MerklePath};

/// Folds a leaf digest up its authentication path. Bit `i` of `index`
/// tells whether the running node is the right child at level `i`.
pub fn compute_root(hasher: &dyn MerkleHasher, leaf: Digest, path: &MerklePath) -> Digest {
    let mut node = leaf;
    for (level, sibling) in path.siblings.iter().enumerate() {
        node = if (path.index >> level) & 1 == 1 {
            hasher.hash_nodes(sibling, &node)
        } else {
            hasher.hash_nodes(&node, sibling)
        };
    }
    node
}

/// Checks a path of exactly `depth` siblings against `root`.
pub fn verify_path(
    hasher: &dyn MerkleHasher,
    root: &Digest,
    depth: usize,
    leaf: Digest,
    path: &MerklePath,
) -> Result<(), MerkleError> {
    if path.siblings.len() != depth {
        return Err(MerkleError::PathLength {
            expected: depth,
            got: path.siblings.len(),
        });
    }
    if path.index >> depth != 0 {
        return Err(MerkleError::IndexOutOfRange {
            index: path.index,
            leaves: 1 << depth,
        });
    }
    if compute_root(hasher, leaf, path) != *root {
        return Err(MerkleError::RootMismatch);
    }
    Ok(())
}
