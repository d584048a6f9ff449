use crate::field::FieldElement;
use crate::utils::{par_map, preferred_chunk_size};

use super::traits::MerkleHasher;
use super::types::{Digest, MerkleError, MerklePath};

/// Merkle tree storing every hashed level for subsequent openings.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    levels: Vec<Vec<Digest>>,
}

impl MerkleTree {
    /// Hashes each leaf row and builds the tree above them.
    pub fn from_rows(
        hasher: &dyn MerkleHasher,
        rows: &[Vec<FieldElement>],
        parallel: bool,
    ) -> Result<Self, MerkleError> {
        let chunk = preferred_chunk_size(rows.len());
        let leaves = par_map(parallel, chunk, rows, |row| hasher.hash_leaf(row));
        Self::from_leaves(hasher, leaves, parallel)
    }

    /// Builds the tree over already hashed leaves.
    pub fn from_leaves(
        hasher: &dyn MerkleHasher,
        leaves: Vec<Digest>,
        parallel: bool,
    ) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyLeaves);
        }
        if !leaves.len().is_power_of_two() {
            return Err(MerkleError::NonPowerOfTwo {
                count: leaves.len(),
            });
        }
        let mut levels = vec![leaves];
        while let Some(current) = levels.last() {
            if current.len() == 1 {
                break;
            }
            let pairs: Vec<(Digest, Digest)> = current
                .chunks_exact(2)
                .map(|pair| (pair[0], pair[1]))
                .collect();
            let chunk = preferred_chunk_size(pairs.len());
            let next = par_map(parallel, chunk, &pairs, |(left, right)| {
                hasher.hash_nodes(left, right)
            });
            levels.push(next);
        }
        Ok(Self { levels })
    }

    pub fn root(&self) -> Digest {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or_default()
    }

    /// Number of levels above the leaves.
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    pub fn leaf(&self, index: usize) -> Option<Digest> {
        self.levels.first().and_then(|level| level.get(index)).copied()
    }

    /// Authentication path for leaf `index`.
    pub fn open(&self, index: usize) -> Result<MerklePath, MerkleError> {
        let leaves = self.leaf_count();
        if index >= leaves {
            return Err(MerkleError::IndexOutOfRange { index, leaves });
        }
        let siblings = self.levels[..self.depth()]
            .iter()
            .enumerate()
            .map(|(level, nodes)| nodes[(index >> level) ^ 1])
            .collect();
        Ok(MerklePath { index, siblings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle::{hasher_for, verify_path};
    use crate::params::HashFamily;

    fn rows(count: usize) -> Vec<Vec<FieldElement>> {
        (0..count as u64)
            .map(|i| vec![FieldElement::from(i), FieldElement::from(i * 7 + 1)])
            .collect()
    }

    #[test]
    fn openings_verify_for_both_families() {
        for family in [HashFamily::Blake2s, HashFamily::Mimc] {
            let hasher = hasher_for(family);
            let rows = rows(8);
            let tree = MerkleTree::from_rows(hasher, &rows, false).unwrap();
            for (index, row) in rows.iter().enumerate() {
                let path = tree.open(index).unwrap();
                verify_path(hasher, &tree.root(), tree.depth(), hasher.hash_leaf(row), &path)
                    .unwrap();
            }
        }
    }

    #[test]
    fn tampered_leaf_is_rejected() {
        let hasher = hasher_for(HashFamily::Blake2s);
        let rows = rows(4);
        let tree = MerkleTree::from_rows(hasher, &rows, true).unwrap();
        let path = tree.open(2).unwrap();
        let forged = hasher.hash_leaf(&rows[1]);
        assert_eq!(
            verify_path(hasher, &tree.root(), tree.depth(), forged, &path),
            Err(MerkleError::RootMismatch)
        );
    }

    #[test]
    fn rejects_non_power_of_two_leaf_count() {
        let hasher = hasher_for(HashFamily::Mimc);
        assert_eq!(
            MerkleTree::from_rows(hasher, &rows(3), false).unwrap_err(),
            MerkleError::NonPowerOfTwo { count: 3 }
        );
    }
}
