//! Boundary for external verifiers (MPC, ZK, auditors)
//!
//! Downstream proof systems consume a certificate and the chain's leaf
//! hashes as public inputs and report a boolean outcome plus an opaque
//! artifact. They never reach into the Merkle tree.

use crate::certificate::Certificate;
use crate::merkle::MerkleTree;
use crate::types::Digest;
use serde::{Deserialize, Serialize};

/// Result reported by an external verifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    /// Verifier name
    pub verifier: String,
    /// Outcome
    pub verified: bool,
    /// Opaque proof artifact
    #[serde(with = "hex")]
    pub artifact: Vec<u8>,
}

/// Source of verification results over a certificate
pub trait AttestationVerifier: Send + Sync {
    /// Verifier name
    fn name(&self) -> &str;

    /// Attest to `certificate` given the leaf hashes it commits to
    fn attest(&self, certificate: &Certificate, leaf_hashes: &[Digest]) -> Attestation;
}

/// Checks that the leaf hashes rebuild the certificate's root
#[derive(Debug, Clone, Copy, Default)]
pub struct RootMatchVerifier;

impl AttestationVerifier for RootMatchVerifier {
    fn name(&self) -> &str {
        "root-match"
    }

    fn attest(&self, certificate: &Certificate, leaf_hashes: &[Digest]) -> Attestation {
        let rebuilt = MerkleTree::build(leaf_hashes).root();
        let verified =
            leaf_hashes.len() == certificate.total_events && rebuilt == certificate.root;
        Attestation {
            verifier: self.name().to_string(),
            verified,
            artifact: rebuilt.to_vec(),
        }
    }
}
