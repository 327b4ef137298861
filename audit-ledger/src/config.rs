//! Configuration for the ledger

use serde::{Deserialize, Serialize};

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Default tracing directive (`RUST_LOG` takes precedence)
    pub log_level: String,

    /// Log output format
    pub log_format: LogFormat,

    /// Ledger behaviour
    pub ledger: LedgerConfig,

    /// Single-writer actor
    pub actor: ActorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "audit-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            ledger: LedgerConfig::default(),
            actor: ActorConfig::default(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable
    Pretty,
    /// One JSON object per line
    Json,
}

/// Ledger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Minimum compliance score (percent) for a COMPLIANT certificate
    pub compliant_threshold: f64,

    /// Hex characters kept from input/output data digests (1..=64)
    pub data_digest_hex_len: usize,

    /// Version string stamped on certificates
    pub certificate_version: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            compliant_threshold: 80.0,
            data_digest_hex_len: 16,
            certificate_version: "1.0.0".to_string(),
        }
    }
}

/// Actor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Bounded mailbox size (backpressure)
    pub mailbox_capacity: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1000,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(level) = std::env::var("AUDIT_LEDGER_LOG_LEVEL") {
            config.log_level = level;
        }

        if let Ok(format) = std::env::var("AUDIT_LEDGER_LOG_FORMAT") {
            config.log_format = match format.to_ascii_lowercase().as_str() {
                "pretty" => LogFormat::Pretty,
                "json" => LogFormat::Json,
                other => {
                    return Err(crate::Error::Config(format!(
                        "Unknown log format: {}",
                        other
                    )))
                }
            };
        }

        if let Ok(threshold) = std::env::var("AUDIT_LEDGER_COMPLIANT_THRESHOLD") {
            config.ledger.compliant_threshold = threshold.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid compliant threshold: {}", e))
            })?;
        }

        if let Ok(capacity) = std::env::var("AUDIT_LEDGER_MAILBOX_CAPACITY") {
            config.actor.mailbox_capacity = capacity.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid mailbox capacity: {}", e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> crate::Result<()> {
        let threshold = self.ledger.compliant_threshold;
        if !(0.0..=100.0).contains(&threshold) {
            return Err(crate::Error::Config(format!(
                "compliant_threshold must be within 0..=100, got {}",
                threshold
            )));
        }
        if !(1..=64).contains(&self.ledger.data_digest_hex_len) {
            return Err(crate::Error::Config(format!(
                "data_digest_hex_len must be within 1..=64, got {}",
                self.ledger.data_digest_hex_len
            )));
        }
        if self.actor.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "mailbox_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
