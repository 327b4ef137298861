//! Inclusion proofs (authentication paths)
//!
//! RFC 6962-style paths over the domain-separated tree in [`crate::merkle`].
//! A proof is only meaningful against the root computed at the exact
//! `event_count` it names; there are no consistency proofs between roots of
//! different sizes.

use crate::ledger::ChainSnapshot;
use crate::merkle::{hash_leaf, hash_node, height_for};
use crate::types::{Digest, DIGEST_LEN};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Side of the sibling at one step of the path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Sibling is the left child: `parent = H(0x01 ‖ sibling ‖ current)`
    SiblingIsLeft,
    /// Sibling is the right child: `parent = H(0x01 ‖ current ‖ sibling)`
    SiblingIsRight,
}

impl Direction {
    /// Expected direction for a node at `index` within its level
    pub fn for_index(index: usize) -> Self {
        if index & 1 == 0 {
            Direction::SiblingIsRight
        } else {
            Direction::SiblingIsLeft
        }
    }
}

/// One step of an authentication path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    /// Sibling node hash
    #[serde(with = "hex")]
    pub sibling_hash: Digest,
    /// Side the sibling sits on
    pub direction: Direction,
}

/// Authentication path from one leaf to a chain root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPath {
    /// Position of the event in append order
    pub leaf_index: usize,
    /// Canonical event hash
    #[serde(with = "hex")]
    pub leaf_hash: Digest,
    /// Domain-separated leaf node hash
    #[serde(with = "hex")]
    pub leaf_node_hash: Digest,
    /// Steps from leaf to root
    pub path: Vec<ProofStep>,
    /// Tree height at generation time
    pub tree_height: u32,
    /// Root the path resolves to
    #[serde(with = "hex")]
    pub root: Digest,
    /// Chain the proof belongs to
    pub chain_id: String,
    /// Event count the proof is valid against
    pub event_count: usize,
}

impl AuthPath {
    /// Check the path is structurally sound
    pub fn validate(&self) -> Result<()> {
        if self.leaf_index >= self.event_count {
            return Err(Error::MalformedProof(format!(
                "leaf index {} not below event count {}",
                self.leaf_index, self.event_count
            )));
        }
        let expected_height = height_for(self.event_count).ok_or_else(|| {
            Error::MalformedProof(format!("event count {} is too large", self.event_count))
        })?;
        if self.tree_height != expected_height {
            return Err(Error::MalformedProof(format!(
                "declared height {} does not match {} events",
                self.tree_height, self.event_count
            )));
        }
        if self.path.len() != self.tree_height as usize {
            return Err(Error::MalformedProof(format!(
                "path has {} steps, declared height is {}",
                self.path.len(),
                self.tree_height
            )));
        }
        if self.leaf_node_hash != hash_leaf(&self.leaf_hash) {
            return Err(Error::MalformedProof(
                "leaf node hash does not match leaf hash".to_string(),
            ));
        }

        let mut index = self.leaf_index;
        for (level, step) in self.path.iter().enumerate() {
            if step.direction != Direction::for_index(index) {
                return Err(Error::MalformedProof(format!(
                    "direction at level {} disagrees with leaf index {}",
                    level, self.leaf_index
                )));
            }
            index >>= 1;
        }

        Ok(())
    }

    /// Verify this path's own leaf against a claimed root
    pub fn verify_against(&self, claimed_root: &Digest) -> bool {
        verify(&self.leaf_hash, self, claimed_root)
    }

    /// Check the path resolves to the root it carries
    pub fn is_self_consistent(&self) -> bool {
        self.verify_against(&self.root)
    }
}

/// Generate the authentication path for `leaf_index` in a chain snapshot
pub fn prove_inclusion(snapshot: &ChainSnapshot, leaf_index: usize) -> Result<AuthPath> {
    let tree = snapshot.tree();
    let event_count = tree.len();

    let leaf_hash = tree.leaf(leaf_index).ok_or(Error::IndexOutOfRange {
        index: leaf_index,
        event_count,
    })?;

    let height = tree.height();
    let mut path = Vec::with_capacity(height as usize);
    let mut index = leaf_index;

    for level in 0..height as usize {
        let sibling_hash = tree.node(level, index ^ 1).ok_or_else(|| {
            Error::MalformedProof(format!(
                "missing sibling at level {} index {}",
                level,
                index ^ 1
            ))
        })?;
        path.push(ProofStep {
            sibling_hash,
            direction: Direction::for_index(index),
        });
        index >>= 1;
    }

    tracing::debug!(
        chain_id = %snapshot.chain_id(),
        leaf_index,
        event_count,
        "generated inclusion proof"
    );

    Ok(AuthPath {
        leaf_index,
        leaf_hash,
        leaf_node_hash: hash_leaf(&leaf_hash),
        path,
        tree_height: height,
        root: tree.root(),
        chain_id: snapshot.chain_id().to_string(),
        event_count,
    })
}

/// Recompute the root from `leaf_hash` along `auth_path`
///
/// Fails with [`Error::MalformedProof`] on wrong digest lengths or a
/// structurally invalid path.
pub fn compute_root(leaf_hash: &[u8], auth_path: &AuthPath) -> Result<Digest> {
    let leaf = Digest::try_from(leaf_hash).map_err(|_| {
        Error::MalformedProof(format!(
            "leaf hash is {} bytes, expected {}",
            leaf_hash.len(),
            DIGEST_LEN
        ))
    })?;
    auth_path.validate()?;

    let mut current = hash_leaf(&leaf);
    for step in &auth_path.path {
        current = match step.direction {
            Direction::SiblingIsLeft => hash_node(&step.sibling_hash, &current),
            Direction::SiblingIsRight => hash_node(&current, &step.sibling_hash),
        };
    }
    Ok(current)
}

/// Verify that `leaf_hash` is included under `claimed_root`
///
/// Never panics; any malformed input yields `false`.
pub fn verify(leaf_hash: &[u8], auth_path: &AuthPath, claimed_root: &[u8]) -> bool {
    if claimed_root.len() != DIGEST_LEN {
        return false;
    }
    match compute_root(leaf_hash, auth_path) {
        Ok(root) => root.as_slice() == claimed_root,
        Err(_) => false,
    }
}

/// [`verify`] over hex-encoded leaf hash and root
pub fn verify_hex(leaf_hash_hex: &str, auth_path: &AuthPath, claimed_root_hex: &str) -> bool {
    match (hex::decode(leaf_hash_hex), hex::decode(claimed_root_hex)) {
        (Ok(leaf), Ok(root)) => verify(&leaf, auth_path, &root),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::sha256;
    use crate::ledger::ChainSnapshot;
    use crate::merkle::MerkleTree;
    use std::sync::Arc;

    fn snapshot(n: usize) -> ChainSnapshot {
        let leaves: Vec<Digest> = (0..n)
            .map(|i| sha256(format!("event-{}", i).as_bytes()))
            .collect();
        ChainSnapshot::from_tree("test-chain", Arc::new(MerkleTree::build(&leaves)))
    }

    #[test]
    fn test_every_leaf_verifies() {
        for n in 1..=17 {
            let snap = snapshot(n);
            let root = snap.root();
            for i in 0..n {
                let proof = prove_inclusion(&snap, i).unwrap();
                assert_eq!(proof.path.len(), proof.tree_height as usize);
                assert!(verify(&proof.leaf_hash, &proof, &root), "n={} i={}", n, i);
            }
        }
    }

    #[test]
    fn test_single_leaf_has_empty_path() {
        let snap = snapshot(1);
        let proof = prove_inclusion(&snap, 0).unwrap();
        assert!(proof.path.is_empty());
        assert_eq!(proof.tree_height, 0);
        assert_eq!(proof.root, hash_leaf(&proof.leaf_hash));
        assert!(proof.is_self_consistent());
    }

    #[test]
    fn test_out_of_range() {
        let snap = snapshot(3);
        assert!(matches!(
            prove_inclusion(&snap, 3),
            Err(Error::IndexOutOfRange { index: 3, event_count: 3 })
        ));
        assert!(matches!(
            prove_inclusion(&snapshot(0), 0),
            Err(Error::IndexOutOfRange { index: 0, event_count: 0 })
        ));
    }

    #[test]
    fn test_two_leaf_directions() {
        let snap = snapshot(2);
        let p0 = prove_inclusion(&snap, 0).unwrap();
        let p1 = prove_inclusion(&snap, 1).unwrap();
        assert_eq!(p0.path[0].direction, Direction::SiblingIsRight);
        assert_eq!(p0.path[0].sibling_hash, p1.leaf_node_hash);
        assert_eq!(p1.path[0].direction, Direction::SiblingIsLeft);
        assert_eq!(p1.path[0].sibling_hash, p0.leaf_node_hash);
    }

    #[test]
    fn test_padded_sibling_flip_is_rejected() {
        // leaf 2 of 3 has its own duplicate as sibling
        let snap = snapshot(3);
        let mut proof = prove_inclusion(&snap, 2).unwrap();
        assert_eq!(proof.path[0].sibling_hash, proof.leaf_node_hash);
        proof.path[0].direction = Direction::SiblingIsLeft;
        assert!(!verify(&proof.leaf_hash, &proof, &snap.root()));
    }

    #[test]
    fn test_tampered_sibling_fails() {
        let snap = snapshot(8);
        let proof = prove_inclusion(&snap, 5).unwrap();
        for step in 0..proof.path.len() {
            let mut tampered = proof.clone();
            tampered.path[step].sibling_hash[0] ^= 0x01;
            assert!(!verify(&tampered.leaf_hash, &tampered, &snap.root()));
        }
    }

    #[test]
    fn test_wrong_leaf_or_root_fails() {
        let snap = snapshot(4);
        let proof = prove_inclusion(&snap, 1).unwrap();
        let other = prove_inclusion(&snap, 2).unwrap();
        assert!(!verify(&other.leaf_hash, &proof, &snap.root()));
        assert!(!verify(&proof.leaf_hash, &proof, &sha256(b"fake_root")));
    }

    #[test]
    fn test_malformed_inputs_rejected() {
        let snap = snapshot(4);
        let root = snap.root();
        let proof = prove_inclusion(&snap, 0).unwrap();

        assert!(!verify(&proof.leaf_hash[..31], &proof, &root));
        assert!(!verify(&proof.leaf_hash, &proof, &[]));
        assert!(!verify(&proof.leaf_hash, &proof, &root[..16]));

        let mut short = proof.clone();
        short.path.pop();
        assert!(!verify(&short.leaf_hash, &short, &root));
        assert!(matches!(short.validate(), Err(Error::MalformedProof(_))));

        let mut long = proof.clone();
        long.path.push(long.path[0]);
        assert!(matches!(long.validate(), Err(Error::MalformedProof(_))));

        let mut wrong_height = proof.clone();
        wrong_height.tree_height = 3;
        assert!(!verify(&wrong_height.leaf_hash, &wrong_height, &root));

        let mut wrong_index = proof;
        wrong_index.leaf_index = 9;
        assert!(matches!(wrong_index.validate(), Err(Error::MalformedProof(_))));
    }

    #[test]
    fn test_oversized_event_count_rejected() {
        let snap = snapshot(5);
        let root = snap.root();
        let proof = prove_inclusion(&snap, 2).unwrap();

        for (leaf_index, event_count) in [
            (2, usize::MAX),
            (usize::MAX - 1, usize::MAX),
            (1usize << (usize::BITS - 1), (1usize << (usize::BITS - 1)) + 1),
        ] {
            let mut huge = proof.clone();
            huge.leaf_index = leaf_index;
            huge.event_count = event_count;
            assert!(!verify(&huge.leaf_hash, &huge, &root));
            assert!(matches!(huge.validate(), Err(Error::MalformedProof(_))));
        }

        // no declared height matches a count whose padding overflows
        let mut padded = proof;
        padded.event_count = usize::MAX;
        padded.tree_height = usize::BITS;
        assert!(!verify(&padded.leaf_hash, &padded, &root));
    }

    #[test]
    fn test_hex_verification_and_json_shape() {
        let snap = snapshot(5);
        let proof = prove_inclusion(&snap, 3).unwrap();
        let leaf_hex = hex::encode(proof.leaf_hash);
        let root_hex = hex::encode(snap.root());
        assert!(verify_hex(&leaf_hex, &proof, &root_hex));
        assert!(!verify_hex("not-hex", &proof, &root_hex));
        assert!(!verify_hex(&leaf_hex, &proof, ""));

        let json = serde_json::to_value(&proof).unwrap();
        assert_eq!(json["leaf_hash"].as_str().unwrap(), leaf_hex);
        assert_eq!(json["root"].as_str().unwrap(), root_hex);
        assert_eq!(json["path"][0]["direction"], "SIBLING_IS_LEFT");
        assert_eq!(json["path"][0]["sibling_hash"].as_str().unwrap().len(), 64);

        let parsed: AuthPath = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, proof);
    }
}
