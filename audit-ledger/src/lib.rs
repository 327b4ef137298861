//! Audit Ledger
//!
//! Append-only, tamper-evident ledger of AI compliance events with Merkle
//! inclusion proofs and derived compliance certificates.
//!
//! # Architecture
//!
//! - **Canonical hashing**: each event's fixed fields hash to a 32-byte leaf
//! - **Merkle tree**: power-of-two padded, domain-separated (`0x00` leaf, `0x01` node)
//! - **Inclusion proofs**: authentication paths checkable without the other events
//! - **Single writer**: appends to one chain are serialized (lock or actor)
//!
//! # Invariants
//!
//! - Append-only: events are never modified, deleted or reordered
//! - Deterministic: the same ordered events always produce the same root
//! - A proof is valid only against the root at the event count it names

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod canonical;
pub mod merkle;
pub mod proof;
pub mod ledger;
pub mod certificate;
pub mod registry;
pub mod actor;
pub mod attestation;
pub mod error;
pub mod config;
pub mod metrics;

// Re-exports
pub use error::{Error, ErrorKind, Result};
pub use types::{AppendRequest, ComplianceStatus, Digest, EventRecord, RiskLevel};
pub use ledger::{AuditTrail, ChainSnapshot, FinalizedRoot, LedgerChain, LedgerSummary};
pub use proof::{AuthPath, Direction, ProofStep};
pub use certificate::{Certificate, CertificateIssuer, CertificateStatus};
pub use registry::LedgerRegistry;
pub use config::{Config, LedgerConfig};
pub use metrics::Metrics;
