//! Merkle tree over event leaf hashes
//!
//! # Design
//!
//! - Binary Merkle tree with SHA-256 hashing
//! - Leaves padded up to the next power of two by repeating the last real leaf
//! - Domain separation: leaf nodes are `H(0x00 ‖ leaf)`, internal nodes are
//!   `H(0x01 ‖ left ‖ right)`
//! - Rebuilt from scratch per snapshot (O(n)); every level is kept so
//!   authentication paths can be read off directly

use crate::canonical::sha256;
use crate::types::Digest;
use sha2::{Digest as _, Sha256};

/// Prefix for leaf node hashing
pub const LEAF_PREFIX: u8 = 0x00;

/// Prefix for internal node hashing
pub const NODE_PREFIX: u8 = 0x01;

/// Published sentinel whose hash is the root of an empty tree
pub const EMPTY_TREE_SENTINEL: &[u8] = b"empty_ledger";

/// Root of a tree with no leaves
pub fn empty_root() -> Digest {
    sha256(EMPTY_TREE_SENTINEL)
}

/// Hash a leaf node: `SHA256(0x00 ‖ leaf_hash)`
pub fn hash_leaf(leaf_hash: &Digest) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(leaf_hash);
    hasher.finalize().into()
}

/// Hash an internal node: `SHA256(0x01 ‖ left ‖ right)`
pub fn hash_node(left: &Digest, right: &Digest) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update([NODE_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Tree height for a given number of real leaves
///
/// `ceil(log2(next_power_of_two(n)))`, and 0 for an empty tree. `None` when
/// the padded size does not fit in a `usize`.
pub fn height_for(leaf_count: usize) -> Option<u32> {
    if leaf_count == 0 {
        return Some(0);
    }
    leaf_count
        .checked_next_power_of_two()
        .map(|padded| padded.trailing_zeros())
}

/// Immutable Merkle tree snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    /// Real (unpadded) leaf hashes, in append order
    leaves: Vec<Digest>,
    /// Node hashes per level; `levels[0]` holds the padded leaf nodes
    levels: Vec<Vec<Digest>>,
    /// Root hash
    root: Digest,
    /// Number of levels above the leaves
    height: u32,
}

impl MerkleTree {
    /// Build a tree from an ordered sequence of leaf hashes
    pub fn build(leaf_hashes: &[Digest]) -> Self {
        let Some(last) = leaf_hashes.last() else {
            return Self {
                leaves: Vec::new(),
                levels: Vec::new(),
                root: empty_root(),
                height: 0,
            };
        };

        let padded_len = leaf_hashes.len().next_power_of_two();
        let mut current_level: Vec<Digest> = Vec::with_capacity(padded_len);
        current_level.extend(leaf_hashes.iter().map(hash_leaf));
        let padding = hash_leaf(last);
        current_level.resize(padded_len, padding);

        let mut levels = Vec::with_capacity(padded_len.trailing_zeros() as usize + 1);
        while current_level.len() > 1 {
            debug_assert!(current_level.len() % 2 == 0, "padded level must have even width");
            let next_level: Vec<Digest> = current_level
                .chunks_exact(2)
                .map(|pair| hash_node(&pair[0], &pair[1]))
                .collect();
            levels.push(std::mem::replace(&mut current_level, next_level));
        }
        levels.push(current_level);

        let root = levels
            .last()
            .and_then(|top| top.first())
            .copied()
            .unwrap_or_else(empty_root);

        Self {
            leaves: leaf_hashes.to_vec(),
            height: padded_len.trailing_zeros(),
            levels,
            root,
        }
    }

    /// Root hash
    pub fn root(&self) -> Digest {
        self.root
    }

    /// Height (0 for empty and single-leaf trees)
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of real leaves
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Number of leaves after padding
    pub fn padded_len(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// Real leaf hash at `index`
    pub fn leaf(&self, index: usize) -> Option<Digest> {
        self.leaves.get(index).copied()
    }

    /// Real leaf hashes
    pub fn leaves(&self) -> &[Digest] {
        &self.leaves
    }

    /// Node hash at `(level, index)`, level 0 being the leaf nodes
    pub fn node(&self, level: usize, index: usize) -> Option<Digest> {
        self.levels.get(level)?.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_data(data: &[u8]) -> Digest {
        sha256(data)
    }

    fn leaves(n: usize) -> Vec<Digest> {
        (0..n)
            .map(|i| hash_data(format!("leaf{}", i).as_bytes()))
            .collect()
    }

    #[test]
    fn test_empty_tree() {
        let tree = MerkleTree::build(&[]);
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.root(), hash_data(b"empty_ledger"));
    }

    #[test]
    fn test_single_leaf() {
        let leaf = hash_data(b"leaf1");
        let tree = MerkleTree::build(&[leaf]);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.root(), hash_leaf(&leaf));
        assert_ne!(tree.root(), leaf);
    }

    #[test]
    fn test_two_leaves() {
        let l = leaves(2);
        let tree = MerkleTree::build(&l);

        let expected = hash_node(&hash_leaf(&l[0]), &hash_leaf(&l[1]));
        assert_eq!(tree.root(), expected);
        assert_eq!(tree.height(), 1);
    }

    #[test]
    fn test_odd_count_pads_with_last_leaf() {
        let l = leaves(3);
        let tree = MerkleTree::build(&l);

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.padded_len(), 4);
        assert_eq!(tree.height(), 2);

        let h01 = hash_node(&hash_leaf(&l[0]), &hash_leaf(&l[1]));
        let h22 = hash_node(&hash_leaf(&l[2]), &hash_leaf(&l[2]));
        assert_eq!(tree.root(), hash_node(&h01, &h22));
    }

    #[test]
    fn test_five_leaves_pad_to_eight() {
        let l = leaves(5);
        let tree = MerkleTree::build(&l);
        assert_eq!(tree.padded_len(), 8);
        assert_eq!(tree.height(), 3);
        for i in 5..8 {
            assert_eq!(tree.node(0, i), Some(hash_leaf(&l[4])));
        }
    }

    #[test]
    fn test_padding_is_not_a_synthetic_leaf() {
        // [a, b, c] pads to [a, b, c, c] and so commits to the same root as [a, b, c, c]
        let l = leaves(3);
        let mut explicit = l.clone();
        explicit.push(l[2]);
        assert_eq!(MerkleTree::build(&l).root(), MerkleTree::build(&explicit).root());
    }

    #[test]
    fn test_leaf_and_node_domains_differ() {
        let a = hash_data(b"a");
        let b = hash_data(b"b");
        let mut concat = [0u8; 64];
        concat[..32].copy_from_slice(&a);
        concat[32..].copy_from_slice(&b);
        assert_ne!(hash_node(&a, &b), hash_data(&concat));
        assert_ne!(hash_leaf(&a), hash_data(&a));
    }

    #[test]
    fn test_height_law() {
        assert_eq!(height_for(0), Some(0));
        assert_eq!(height_for(1), Some(0));
        assert_eq!(height_for(2), Some(1));
        assert_eq!(height_for(3), Some(2));
        assert_eq!(height_for(4), Some(2));
        assert_eq!(height_for(5), Some(3));
        assert_eq!(height_for(1024), Some(10));
        assert_eq!(height_for(1025), Some(11));
        for n in 0..40 {
            assert_eq!(Some(MerkleTree::build(&leaves(n)).height()), height_for(n));
        }
    }

    #[test]
    fn test_height_for_overflow() {
        let top = 1usize << (usize::BITS - 1);
        assert_eq!(height_for(top), Some(usize::BITS - 1));
        assert_eq!(height_for(top + 1), None);
        assert_eq!(height_for(usize::MAX), None);
    }

    #[test]
    fn test_root_changes_with_count() {
        let l = leaves(4);
        let roots: Vec<Digest> = (0..=4).map(|n| MerkleTree::build(&l[..n]).root()).collect();
        for i in 0..roots.len() {
            for j in (i + 1)..roots.len() {
                assert_ne!(roots[i], roots[j]);
            }
        }
    }
}
