//! Canonical serialization for leaf hashing
//!
//! Ensures a deterministic byte representation of an [`EventRecord`].
//! Fields are written in a fixed order; strings are length-prefixed
//! (u32 big-endian) and integers are fixed-width big-endian, so no two
//! distinct records share an encoding.

use crate::types::{Digest, EventRecord};
use chrono::SecondsFormat;
use sha2::{Digest as _, Sha256};

/// Leading tag of every canonical event encoding
pub const CANONICAL_TAG: &str = "audit-ledger/event/v1";

/// Canonical serializer
#[derive(Debug, Default)]
pub struct CanonicalSerializer {
    buffer: Vec<u8>,
}

impl CanonicalSerializer {
    /// Create new serializer
    pub fn new() -> Self {
        Self::default()
    }

    /// Write string (length-prefixed)
    fn write_string(&mut self, s: &str) {
        let bytes = s.as_bytes();
        self.buffer
            .extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        self.buffer.extend_from_slice(bytes);
    }

    /// Write i64 (big-endian)
    fn write_i64(&mut self, n: i64) {
        self.buffer.extend_from_slice(&n.to_be_bytes());
    }

    /// Serialize the fixed compliance fields of an event
    ///
    /// An absent `oversight_mechanism` is written as the empty string.
    pub fn serialize_event(mut self, event: &EventRecord) -> Vec<u8> {
        self.write_string(CANONICAL_TAG);
        self.write_string(&event.event_id.hyphenated().to_string());
        self.write_string(
            &event
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Micros, true),
        );
        self.write_string(&event.model_id);
        self.write_string(&event.input_hash);
        self.write_string(&event.output_hash);
        self.write_string(event.compliance_status.as_str());
        self.write_string(event.risk_level.as_str());
        self.write_i64(event.article_reference);
        self.write_string(&event.system_purpose);
        self.write_string(&event.deployment_context);
        self.write_string(event.oversight_mechanism.as_deref().unwrap_or(""));
        self.buffer
    }
}

/// Canonical bytes of an event
pub fn canonical_bytes(event: &EventRecord) -> Vec<u8> {
    CanonicalSerializer::new().serialize_event(event)
}

/// SHA-256 of arbitrary bytes
pub fn sha256(data: &[u8]) -> Digest {
    Sha256::digest(data).into()
}

/// Leaf hash of an event: SHA-256 over its canonical bytes
pub fn hash_event(event: &EventRecord) -> Digest {
    sha256(&canonical_bytes(event))
}

/// Size-bounded digest of a raw data payload
///
/// Lowercase hex SHA-256 truncated to `hex_len` characters (clamped to 1..=64).
pub fn data_digest(data: &str, hex_len: usize) -> String {
    let mut hex = hex::encode(sha256(data.as_bytes()));
    hex.truncate(hex_len.clamp(1, 64));
    hex
}
