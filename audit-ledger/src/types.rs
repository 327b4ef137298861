//! Core types for the audit ledger
//!
//! All types are designed for:
//! - Deterministic canonical encoding (see [`crate::canonical`])
//! - Privacy by construction (only digests of model input/output are kept)
//! - JSON interchange with an outer API layer (serde)

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Length of every digest handled by the ledger (SHA-256)
pub const DIGEST_LEN: usize = 32;

/// A 256-bit digest
pub type Digest = [u8; DIGEST_LEN];

/// Render a digest as lowercase hex
pub fn to_hex(digest: &Digest) -> String {
    hex::encode(digest)
}

/// Parse a 64-character hex string into a digest
pub fn digest_from_hex(s: &str) -> Option<Digest> {
    let mut out = [0u8; DIGEST_LEN];
    hex::decode_to_slice(s, &mut out).ok()?;
    Some(out)
}

/// Outcome recorded for a compliance event
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    /// Not yet assessed
    #[default]
    Pending,
    /// Check passed
    Pass,
    /// Check failed
    Fail,
    /// Passed with findings
    Warning,
}

impl ComplianceStatus {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::Pending => "PENDING",
            ComplianceStatus::Pass => "PASS",
            ComplianceStatus::Fail => "FAIL",
            ComplianceStatus::Warning => "WARNING",
        }
    }
}

impl FromStr for ComplianceStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "PENDING" => Ok(ComplianceStatus::Pending),
            "PASS" => Ok(ComplianceStatus::Pass),
            "FAIL" => Ok(ComplianceStatus::Fail),
            "WARNING" => Ok(ComplianceStatus::Warning),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown compliance status: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk classification of the AI system that produced the event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// High-risk system
    #[default]
    HighRisk,
    /// Medium-risk system
    MediumRisk,
    /// Low-risk system
    LowRisk,
}

impl RiskLevel {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::HighRisk => "HIGH_RISK",
            RiskLevel::MediumRisk => "MEDIUM_RISK",
            RiskLevel::LowRisk => "LOW_RISK",
        }
    }
}

impl FromStr for RiskLevel {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "HIGH_RISK" => Ok(RiskLevel::HighRisk),
            "MEDIUM_RISK" => Ok(RiskLevel::MediumRisk),
            "LOW_RISK" => Ok(RiskLevel::LowRisk),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown risk level: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default regulatory article for new events
pub const DEFAULT_ARTICLE: i64 = 12;

fn default_article() -> i64 {
    DEFAULT_ARTICLE
}

/// One compliance event committed to a chain
///
/// Only `input_hash`/`output_hash` digests are stored, never the raw payloads.
/// `metadata` is carried along but is not part of the leaf hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique event ID (UUIDv4, assigned by the chain)
    pub event_id: Uuid,

    /// Creation time, microsecond precision
    pub timestamp: DateTime<Utc>,

    /// Model that produced the event
    pub model_id: String,

    /// Truncated digest of the model input
    pub input_hash: String,

    /// Truncated digest of the model output
    pub output_hash: String,

    /// Assessment outcome
    pub compliance_status: ComplianceStatus,

    /// Risk classification
    pub risk_level: RiskLevel,

    /// Regulatory article the event relates to
    pub article_reference: i64,

    /// Intended purpose of the system
    #[serde(default)]
    pub system_purpose: String,

    /// Where the system is deployed
    #[serde(default)]
    pub deployment_context: String,

    /// Human oversight mechanism, if any
    #[serde(default)]
    pub oversight_mechanism: Option<String>,

    /// Free-form metadata (not hashed)
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl EventRecord {
    /// Build a record from an append request and precomputed data digests
    pub(crate) fn from_request(request: AppendRequest, input_hash: String, output_hash: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now().trunc_subsecs(6),
            model_id: request.model_id,
            input_hash,
            output_hash,
            compliance_status: request.compliance_status,
            risk_level: request.risk_level,
            article_reference: request.article_reference,
            system_purpose: request.system_purpose,
            deployment_context: request.deployment_context,
            oversight_mechanism: request.oversight_mechanism,
            metadata: request.metadata,
        }
    }

    /// Canonical leaf hash of this record
    pub fn leaf_hash(&self) -> Digest {
        crate::canonical::hash_event(self)
    }
}

/// Request to append one event to a chain
///
/// The ledger digests `input_data`/`output_data` itself before storing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppendRequest {
    /// Model that produced the event
    pub model_id: String,

    /// Raw input (digested, never stored)
    #[serde(alias = "input_data_digest_source")]
    pub input_data: String,

    /// Raw output (digested, never stored)
    #[serde(alias = "output_data_digest_source")]
    pub output_data: String,

    /// Assessment outcome
    #[serde(default)]
    pub compliance_status: ComplianceStatus,

    /// Risk classification
    #[serde(default)]
    pub risk_level: RiskLevel,

    /// Regulatory article
    #[serde(default = "default_article")]
    pub article_reference: i64,

    /// Intended purpose
    #[serde(default)]
    pub system_purpose: String,

    /// Deployment context
    #[serde(default)]
    pub deployment_context: String,

    /// Human oversight mechanism
    #[serde(default)]
    pub oversight_mechanism: Option<String>,

    /// Free-form metadata
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl AppendRequest {
    /// Create a request with defaults for the optional fields
    pub fn new(
        model_id: impl Into<String>,
        input_data: impl Into<String>,
        output_data: impl Into<String>,
        compliance_status: ComplianceStatus,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            input_data: input_data.into(),
            output_data: output_data.into(),
            compliance_status,
            risk_level: RiskLevel::default(),
            article_reference: DEFAULT_ARTICLE,
            system_purpose: String::new(),
            deployment_context: String::new(),
            oversight_mechanism: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Set the risk level
    pub fn with_risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = risk_level;
        self
    }

    /// Set the article reference
    pub fn with_article(mut self, article_reference: i64) -> Self {
        self.article_reference = article_reference;
        self
    }

    /// Set purpose and deployment context
    pub fn with_context(
        mut self,
        system_purpose: impl Into<String>,
        deployment_context: impl Into<String>,
    ) -> Self {
        self.system_purpose = system_purpose.into();
        self.deployment_context = deployment_context.into();
        self
    }

    /// Set the oversight mechanism
    pub fn with_oversight(mut self, oversight_mechanism: impl Into<String>) -> Self {
        self.oversight_mechanism = Some(oversight_mechanism.into());
        self
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Reject requests missing required fields
    pub fn validate(&self) -> crate::Result<()> {
        if self.model_id.trim().is_empty() {
            return Err(crate::Error::InvalidInput(
                "model_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
