//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the ledger.
//!
//! # Metrics
//!
//! - `audit_ledger_events_total` - Total number of events appended
//! - `audit_ledger_finalize_total` - Merkle tree rebuilds
//! - `audit_ledger_proofs_total` - Inclusion proofs generated
//! - `audit_ledger_certificates_total` - Certificates issued
//! - `audit_ledger_chains` - Chains held by the registry

use prometheus::{IntCounter, IntGauge, Registry};
use std::fmt;
use std::sync::Arc;

/// Metrics collector
///
/// Owns its registry, so several collectors can coexist in one process.
#[derive(Clone)]
pub struct Metrics {
    /// Total events appended
    pub events_total: IntCounter,

    /// Merkle tree rebuilds
    pub finalize_total: IntCounter,

    /// Inclusion proofs generated
    pub proofs_total: IntCounter,

    /// Certificates issued
    pub certificates_total: IntCounter,

    /// Active chains
    pub chains: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let events_total =
            IntCounter::new("audit_ledger_events_total", "Total number of events appended")?;
        registry.register(Box::new(events_total.clone()))?;

        let finalize_total =
            IntCounter::new("audit_ledger_finalize_total", "Merkle tree rebuilds")?;
        registry.register(Box::new(finalize_total.clone()))?;

        let proofs_total =
            IntCounter::new("audit_ledger_proofs_total", "Inclusion proofs generated")?;
        registry.register(Box::new(proofs_total.clone()))?;

        let certificates_total =
            IntCounter::new("audit_ledger_certificates_total", "Certificates issued")?;
        registry.register(Box::new(certificates_total.clone()))?;

        let chains = IntGauge::new("audit_ledger_chains", "Chains held by the registry")?;
        registry.register(Box::new(chains.clone()))?;

        Ok(Self {
            events_total,
            finalize_total,
            proofs_total,
            certificates_total,
            chains,
            registry,
        })
    }

    /// Record event append
    pub fn record_event_append(&self) {
        self.events_total.inc();
    }

    /// Record tree rebuild
    pub fn record_finalize(&self) {
        self.finalize_total.inc();
    }

    /// Record proof generation
    pub fn record_proof(&self) {
        self.proofs_total.inc();
    }

    /// Record certificate issue
    pub fn record_certificate(&self) {
        self.certificates_total.inc();
    }

    /// Update chain count
    pub fn set_chains(&self, count: usize) {
        self.chains.set(count as i64);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics")
            .field("events_total", &self.events_total.get())
            .field("finalize_total", &self.finalize_total.get())
            .field("proofs_total", &self.proofs_total.get())
            .field("certificates_total", &self.certificates_total.get())
            .field("chains", &self.chains.get())
            .finish()
    }
}
