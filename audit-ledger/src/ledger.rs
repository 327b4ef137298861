//! Append-only compliance event chain
//!
//! A [`LedgerChain`] owns the ordered events of one logical log (one per
//! model provider in practice). Appends take the chain's write lock, so the
//! event order is total and a root is never computed from a partial append.
//! Readers get an immutable [`ChainSnapshot`] whose events and tree were
//! taken under the same lock.
//!
//! # Example
//!
//! ```
//! use audit_ledger::{AppendRequest, ComplianceStatus, LedgerChain, LedgerConfig};
//!
//! let chain = LedgerChain::new("apex", LedgerConfig::default())?;
//! chain.append(AppendRequest::new("gpt-4", "prompt", "answer", ComplianceStatus::Pass))?;
//!
//! let finalized = chain.finalize();
//! let proof = chain.prove_inclusion(0)?;
//! assert!(audit_ledger::proof::verify(&proof.leaf_hash, &proof, &finalized.root));
//! # Ok::<(), audit_ledger::Error>(())
//! ```

use crate::{
    canonical::data_digest,
    certificate::{Certificate, CertificateIssuer, StatusTally},
    config::LedgerConfig,
    merkle::MerkleTree,
    metrics::Metrics,
    proof::{self, AuthPath},
    types::{to_hex, AppendRequest, Digest, EventRecord},
    Error, Result,
};
use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Root published by [`LedgerChain::finalize`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedRoot {
    /// Chain identifier
    pub chain_id: String,
    /// Merkle root
    #[serde(with = "hex")]
    pub root: Digest,
    /// Events committed under `root`
    pub event_count: usize,
    /// Tree height
    pub tree_height: u32,
}

/// Chain overview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    /// Chain identifier
    pub chain_id: String,
    /// Chain creation time
    pub created_at: DateTime<Utc>,
    /// Current root (hex)
    pub root: String,
    /// Events in the chain
    pub event_count: usize,
    /// Tree height
    pub tree_height: u32,
    /// Leaf hash of the first event
    pub first_event_hash: Option<String>,
    /// Leaf hash of the latest event
    pub latest_event_hash: Option<String>,
}

/// Full export of a chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditTrail {
    /// Chain overview
    pub ledger: LedgerSummary,
    /// Certificate for the same snapshot
    pub certificate: Certificate,
    /// Every event, in append order
    pub events: Vec<EventRecord>,
}

impl AuditTrail {
    /// Render as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a previously exported trail
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Immutable view of a chain at one event count
#[derive(Debug, Clone)]
pub struct ChainSnapshot {
    chain_id: String,
    created_at: DateTime<Utc>,
    events: Vec<EventRecord>,
    tree: Arc<MerkleTree>,
}

impl ChainSnapshot {
    /// Snapshot over a bare tree, without event bodies
    #[cfg(test)]
    pub(crate) fn from_tree(chain_id: &str, tree: Arc<MerkleTree>) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            created_at: Utc::now(),
            events: Vec::new(),
            tree,
        }
    }

    /// Chain identifier
    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// Chain creation time
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Events covered by this snapshot (empty if taken without bodies)
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Number of events committed under the root
    pub fn event_count(&self) -> usize {
        self.tree.len()
    }

    /// Merkle root
    pub fn root(&self) -> Digest {
        self.tree.root()
    }

    /// Tree height
    pub fn tree_height(&self) -> u32 {
        self.tree.height()
    }

    /// Underlying tree
    pub fn tree(&self) -> &MerkleTree {
        &self.tree
    }

    /// Leaf hashes in append order
    pub fn leaf_hashes(&self) -> &[Digest] {
        self.tree.leaves()
    }

    /// Finalize response for this snapshot
    pub fn finalized_root(&self) -> FinalizedRoot {
        FinalizedRoot {
            chain_id: self.chain_id.clone(),
            root: self.root(),
            event_count: self.event_count(),
            tree_height: self.tree_height(),
        }
    }

    /// Overview of this snapshot
    pub fn summary(&self) -> LedgerSummary {
        let leaves = self.leaf_hashes();
        LedgerSummary {
            chain_id: self.chain_id.clone(),
            created_at: self.created_at,
            root: to_hex(&self.root()),
            event_count: self.event_count(),
            tree_height: self.tree_height(),
            first_event_hash: leaves.first().map(to_hex),
            latest_event_hash: leaves.last().map(to_hex),
        }
    }
}

#[derive(Debug, Default)]
struct ChainState {
    events: Vec<EventRecord>,
    leaf_hashes: Vec<Digest>,
    /// Cached tree; `None` once an append has happened since the last build
    tree: Option<Arc<MerkleTree>>,
}

/// Append-only chain of compliance events
#[derive(Debug)]
pub struct LedgerChain {
    chain_id: String,
    created_at: DateTime<Utc>,
    config: LedgerConfig,
    issuer: CertificateIssuer,
    state: RwLock<ChainState>,
    metrics: Option<Metrics>,
}

impl LedgerChain {
    /// Create an empty chain
    pub fn new(chain_id: impl Into<String>, config: LedgerConfig) -> Result<Self> {
        let chain_id = chain_id.into();
        if chain_id.trim().is_empty() {
            return Err(Error::InvalidInput("chain_id must not be empty".to_string()));
        }

        Ok(Self {
            chain_id,
            created_at: Utc::now(),
            issuer: CertificateIssuer::from_config(&config),
            config,
            state: RwLock::new(ChainState::default()),
            metrics: None,
        })
    }

    /// Attach a metrics collector
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Chain identifier
    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// Chain creation time
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.state.read().events.len()
    }

    /// Check if chain has no events
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the cached root reflects every appended event
    pub fn is_finalized(&self) -> bool {
        self.state.read().tree.is_some()
    }

    /// Append a new event
    ///
    /// Input and output payloads are digested here and never stored.
    pub fn append(&self, request: AppendRequest) -> Result<EventRecord> {
        request.validate()?;

        let hex_len = self.config.data_digest_hex_len;
        let input_hash = data_digest(&request.input_data, hex_len);
        let output_hash = data_digest(&request.output_data, hex_len);
        let event = EventRecord::from_request(request, input_hash, output_hash);
        let leaf_hash = event.leaf_hash();

        let event_count = {
            let mut state = self.state.write();
            state.events.push(event.clone());
            state.leaf_hashes.push(leaf_hash);
            state.tree = None;
            state.events.len()
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_event_append();
        }

        tracing::debug!(
            chain_id = %self.chain_id,
            event_id = %event.event_id,
            status = %event.compliance_status,
            event_count,
            "appended event"
        );

        Ok(event)
    }

    /// Rebuild the tree if stale and return the root
    ///
    /// Idempotent while no append happens in between.
    pub fn finalize(&self) -> FinalizedRoot {
        self.take_snapshot(false).finalized_root()
    }

    /// Current root (finalizing first if needed)
    pub fn root(&self) -> Digest {
        self.finalize().root
    }

    /// Consistent snapshot of events and tree
    pub fn snapshot(&self) -> ChainSnapshot {
        self.take_snapshot(true)
    }

    /// Generate an inclusion proof for the event at `leaf_index`
    pub fn prove_inclusion(&self, leaf_index: usize) -> Result<AuthPath> {
        let snapshot = self.take_snapshot(false);
        let auth_path = proof::prove_inclusion(&snapshot, leaf_index)?;
        if let Some(metrics) = &self.metrics {
            metrics.record_proof();
        }
        Ok(auth_path)
    }

    /// Percentage of PASS events, 0 for an empty chain
    pub fn compliance_score(&self) -> f64 {
        let state = self.state.read();
        StatusTally::from_events(&state.events).compliance_score()
    }

    /// Issue a certificate for the current state
    pub fn certificate(&self) -> Certificate {
        let certificate = self.issuer.issue(&self.snapshot());
        if let Some(metrics) = &self.metrics {
            metrics.record_certificate();
        }
        tracing::info!(
            chain_id = %self.chain_id,
            certificate_id = %certificate.certificate_id,
            total_events = certificate.total_events,
            status = ?certificate.status,
            "issued certificate"
        );
        certificate
    }

    /// Event at `index`
    pub fn event(&self, index: usize) -> Option<EventRecord> {
        self.state.read().events.get(index).cloned()
    }

    /// All events in append order
    pub fn events(&self) -> Vec<EventRecord> {
        self.state.read().events.clone()
    }

    /// Overview of the current state
    pub fn summary(&self) -> LedgerSummary {
        self.take_snapshot(false).summary()
    }

    /// Export summary, certificate and events from one snapshot
    pub fn export_audit_trail(&self) -> AuditTrail {
        let snapshot = self.snapshot();
        let certificate = self.issuer.issue(&snapshot);
        if let Some(metrics) = &self.metrics {
            metrics.record_certificate();
        }
        AuditTrail {
            ledger: snapshot.summary(),
            certificate,
            events: snapshot.events,
        }
    }

    /// Root over the first `event_count` events
    ///
    /// Lets an orphaned proof be checked against the root it was issued for.
    pub fn root_at(&self, event_count: usize) -> Result<Digest> {
        let state = self.state.read();
        let leaves = state
            .leaf_hashes
            .get(..event_count)
            .ok_or(Error::IndexOutOfRange {
                index: event_count,
                event_count: state.leaf_hashes.len(),
            })?;
        Ok(MerkleTree::build(leaves).root())
    }

    /// Check a proof still matches the chain's current event count
    ///
    /// Returns the advisory [`Error::StaleSnapshot`] when the chain has grown.
    pub fn check_proof_freshness(&self, auth_path: &AuthPath) -> Result<()> {
        self.ensure_same_chain(auth_path)?;
        let current_event_count = self.len();
        if auth_path.event_count != current_event_count {
            tracing::warn!(
                chain_id = %self.chain_id,
                proof_event_count = auth_path.event_count,
                current_event_count,
                "stale inclusion proof"
            );
            return Err(Error::StaleSnapshot {
                proof_event_count: auth_path.event_count,
                current_event_count,
            });
        }
        Ok(())
    }

    /// Verify a proof against the historical root of the event count it names
    pub fn verify_inclusion(&self, auth_path: &AuthPath) -> Result<bool> {
        self.ensure_same_chain(auth_path)?;
        let root = self.root_at(auth_path.event_count)?;
        let included = proof::verify(&auth_path.leaf_hash, auth_path, &root);
        if !included {
            tracing::warn!(
                chain_id = %self.chain_id,
                leaf_index = auth_path.leaf_index,
                "inclusion proof rejected"
            );
        }
        Ok(included)
    }

    fn ensure_same_chain(&self, auth_path: &AuthPath) -> Result<()> {
        if auth_path.chain_id != self.chain_id {
            return Err(Error::InvalidInput(format!(
                "proof belongs to chain {}, not {}",
                auth_path.chain_id, self.chain_id
            )));
        }
        Ok(())
    }

    fn take_snapshot(&self, with_events: bool) -> ChainSnapshot {
        {
            let state = self.state.read();
            if let Some(tree) = state.tree.clone() {
                let events = if with_events { state.events.clone() } else { Vec::new() };
                return self.make_snapshot(tree, events);
            }
        }

        // only one upgradable reader at a time; re-check after acquiring
        let state = self.state.upgradable_read();
        if let Some(tree) = state.tree.clone() {
            let events = if with_events { state.events.clone() } else { Vec::new() };
            return self.make_snapshot(tree, events);
        }

        let mut state = RwLockUpgradableReadGuard::upgrade(state);
        let tree = Arc::new(MerkleTree::build(&state.leaf_hashes));
        state.tree = Some(Arc::clone(&tree));

        if let Some(metrics) = &self.metrics {
            metrics.record_finalize();
        }
        tracing::info!(
            chain_id = %self.chain_id,
            event_count = tree.len(),
            tree_height = tree.height(),
            root = %to_hex(&tree.root()),
            "finalized chain"
        );

        let events = if with_events { state.events.clone() } else { Vec::new() };
        self.make_snapshot(tree, events)
    }

    fn make_snapshot(&self, tree: Arc<MerkleTree>, events: Vec<EventRecord>) -> ChainSnapshot {
        ChainSnapshot {
            chain_id: self.chain_id.clone(),
            created_at: self.created_at,
            events,
            tree,
        }
    }
}
