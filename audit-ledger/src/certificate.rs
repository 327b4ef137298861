//! Compliance certificates
//!
//! A certificate is a pure function of a [`ChainSnapshot`]: root, event
//! count, per-status tally and the articles referenced. Only
//! `certificate_id` and `issued_at` vary between two issues against an
//! unchanged chain.

use crate::config::LedgerConfig;
use crate::ledger::ChainSnapshot;
use crate::types::{ComplianceStatus, Digest, EventRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Event counts per compliance status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTally {
    /// PENDING events
    pub pending: usize,
    /// PASS events
    pub pass: usize,
    /// FAIL events
    pub fail: usize,
    /// WARNING events
    pub warning: usize,
}

impl StatusTally {
    /// Tally a sequence of events
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a EventRecord>) -> Self {
        let mut tally = Self::default();
        for event in events {
            tally.record(event.compliance_status);
        }
        tally
    }

    /// Count one status
    pub fn record(&mut self, status: ComplianceStatus) {
        match status {
            ComplianceStatus::Pending => self.pending += 1,
            ComplianceStatus::Pass => self.pass += 1,
            ComplianceStatus::Fail => self.fail += 1,
            ComplianceStatus::Warning => self.warning += 1,
        }
    }

    /// Total events counted
    pub fn total(&self) -> usize {
        self.pending + self.pass + self.fail + self.warning
    }

    /// `100 * PASS / total`, or 0 with no events
    pub fn compliance_score(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.pass * 100) as f64 / total as f64
    }
}

/// Certificate verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateStatus {
    /// Score at or above the threshold
    Compliant,
    /// Score below the threshold
    ReviewRequired,
}

/// Point-in-time compliance summary of one chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    /// `CERT-{chain_id}-{unix_seconds}-{suffix}`
    pub certificate_id: String,
    /// Chain the certificate covers
    pub chain_id: String,
    /// Issue time
    pub issued_at: DateTime<Utc>,
    /// Merkle root at issue time
    #[serde(with = "hex")]
    pub root: Digest,
    /// Events committed under `root`
    pub total_events: usize,
    /// Percentage of PASS events, two decimals
    pub compliance_score: f64,
    /// Distinct article references
    pub articles_covered: BTreeSet<i64>,
    /// Events per status
    pub status_tally: StatusTally,
    /// Verdict
    pub status: CertificateStatus,
    /// Certificate format version
    pub version: String,
}

impl Certificate {
    /// Compare everything except `certificate_id` and `issued_at`
    pub fn same_body(&self, other: &Certificate) -> bool {
        self.chain_id == other.chain_id
            && self.root == other.root
            && self.total_events == other.total_events
            && self.compliance_score == other.compliance_score
            && self.articles_covered == other.articles_covered
            && self.status_tally == other.status_tally
            && self.status == other.status
            && self.version == other.version
    }
}

/// Derives certificates from chain snapshots
#[derive(Debug, Clone)]
pub struct CertificateIssuer {
    compliant_threshold: f64,
    version: String,
}

impl CertificateIssuer {
    /// Create issuer
    pub fn new(compliant_threshold: f64, version: impl Into<String>) -> Self {
        Self {
            compliant_threshold,
            version: version.into(),
        }
    }

    /// Create issuer from ledger configuration
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.compliant_threshold, config.certificate_version.clone())
    }

    /// Verdict for a raw score
    pub fn status_for(&self, score: f64) -> CertificateStatus {
        if score >= self.compliant_threshold {
            CertificateStatus::Compliant
        } else {
            CertificateStatus::ReviewRequired
        }
    }

    /// Issue a certificate for a snapshot
    ///
    /// The score is rounded to two decimals and the verdict is taken on the
    /// rounded value, so the two fields of the body always agree.
    pub fn issue(&self, snapshot: &ChainSnapshot) -> Certificate {
        let events = snapshot.events();
        let tally = StatusTally::from_events(events);
        let score = round2(tally.compliance_score());
        let issued_at = Utc::now();

        let suffix = Uuid::new_v4().simple().to_string();
        let certificate_id = format!(
            "CERT-{}-{}-{}",
            snapshot.chain_id(),
            issued_at.timestamp(),
            &suffix[..8]
        );

        Certificate {
            certificate_id,
            chain_id: snapshot.chain_id().to_string(),
            issued_at,
            root: snapshot.root(),
            total_events: snapshot.event_count(),
            compliance_score: score,
            articles_covered: events.iter().map(|e| e.article_reference).collect(),
            status_tally: tally,
            status: self.status_for(score),
            version: self.version.clone(),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
