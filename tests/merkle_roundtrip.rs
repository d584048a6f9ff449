use proptest::prelude::*;
use rpp_wizard::field::FieldElement;
use rpp_wizard::merkle::{compute_root, hasher_for, verify_path, Digest, MerkleError, MerkleTree};
use rpp_wizard::params::HashFamily;

const FAMILIES: [HashFamily; 2] = [HashFamily::Blake2s, HashFamily::Mimc];

fn make_rows(count: usize, width: usize) -> Vec<Vec<FieldElement>> {
    (0..count)
        .map(|i| {
            (0..width)
                .map(|j| FieldElement::from((i * width + j) as u64))
                .collect()
        })
        .collect()
}

#[test]
fn roundtrip_every_leaf() {
    for family in FAMILIES {
        let hasher = hasher_for(family);
        let rows = make_rows(16, 3);
        let tree = MerkleTree::from_rows(hasher, &rows, false).unwrap();
        assert_eq!(tree.depth(), 4);
        assert_eq!(tree.leaf_count(), 16);
        for (index, row) in rows.iter().enumerate() {
            let leaf = hasher.hash_leaf(row);
            assert_eq!(tree.leaf(index), Some(leaf));
            let path = tree.open(index).unwrap();
            verify_path(hasher, &tree.root(), tree.depth(), leaf, &path).unwrap();
        }
    }
}

#[test]
fn single_leaf_tree_is_its_own_root() {
    let hasher = hasher_for(HashFamily::Blake2s);
    let rows = make_rows(1, 4);
    let tree = MerkleTree::from_rows(hasher, &rows, false).unwrap();
    assert_eq!(tree.depth(), 0);
    assert_eq!(tree.root(), hasher.hash_leaf(&rows[0]));
    let path = tree.open(0).unwrap();
    assert!(path.siblings.is_empty());
}

#[test]
fn families_commit_differently() {
    let rows = make_rows(8, 2);
    let blake = MerkleTree::from_rows(hasher_for(HashFamily::Blake2s), &rows, false).unwrap();
    let mimc = MerkleTree::from_rows(hasher_for(HashFamily::Mimc), &rows, false).unwrap();
    assert_ne!(blake.root(), mimc.root());
    assert!(mimc.root().to_field().is_some());
}

#[test]
fn shape_errors() {
    let hasher = hasher_for(HashFamily::Mimc);
    assert_eq!(
        MerkleTree::from_leaves(hasher, Vec::new(), false).unwrap_err(),
        MerkleError::EmptyLeaves
    );
    assert_eq!(
        MerkleTree::from_rows(hasher, &make_rows(6, 1), false).unwrap_err(),
        MerkleError::NonPowerOfTwo { count: 6 }
    );
    let tree = MerkleTree::from_rows(hasher, &make_rows(4, 1), false).unwrap();
    assert_eq!(
        tree.open(4).unwrap_err(),
        MerkleError::IndexOutOfRange { index: 4, leaves: 4 }
    );
}

#[test]
fn malformed_paths_are_rejected() {
    let hasher = hasher_for(HashFamily::Blake2s);
    let rows = make_rows(8, 2);
    let tree = MerkleTree::from_rows(hasher, &rows, false).unwrap();
    let leaf = hasher.hash_leaf(&rows[5]);
    let path = tree.open(5).unwrap();

    let mut short = path.clone();
    short.siblings.pop();
    assert_eq!(
        verify_path(hasher, &tree.root(), tree.depth(), leaf, &short),
        Err(MerkleError::PathLength { expected: 3, got: 2 })
    );

    let mut far = path.clone();
    far.index = 8;
    assert!(matches!(
        verify_path(hasher, &tree.root(), tree.depth(), leaf, &far),
        Err(MerkleError::IndexOutOfRange { index: 8, .. })
    ));

    let mut moved = path.clone();
    moved.index = 4;
    assert_eq!(
        verify_path(hasher, &tree.root(), tree.depth(), leaf, &moved),
        Err(MerkleError::RootMismatch)
    );

    let mut forged = path;
    forged.siblings[1] = Digest::default();
    assert_eq!(
        verify_path(hasher, &tree.root(), tree.depth(), leaf, &forged),
        Err(MerkleError::RootMismatch)
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn parallel_and_sequential_trees_agree(log in 0usize..=6, width in 1usize..=4) {
        for family in FAMILIES {
            let hasher = hasher_for(family);
            let rows = make_rows(1 << log, width);
            let sequential = MerkleTree::from_rows(hasher, &rows, false).unwrap();
            let parallel = MerkleTree::from_rows(hasher, &rows, true).unwrap();
            prop_assert_eq!(sequential.root(), parallel.root());
        }
    }

    #[test]
    fn any_changed_cell_moves_the_root(log in 1usize..=5, pick in any::<prop::sample::Index>(), delta in 1u64..1_000) {
        for family in FAMILIES {
            let hasher = hasher_for(family);
            let mut rows = make_rows(1 << log, 2);
            let tree = MerkleTree::from_rows(hasher, &rows, false).unwrap();
            let index = pick.index(rows.len());
            let path = tree.open(index).unwrap();
            rows[index][1] += FieldElement::from(delta);
            let leaf = hasher.hash_leaf(&rows[index]);
            prop_assert_ne!(compute_root(hasher, leaf, &path), tree.root());
            prop_assert!(verify_path(hasher, &tree.root(), tree.depth(), leaf, &path).is_err());
        }
    }
}
