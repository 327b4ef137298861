//! Error types for the ledger

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or empty required field
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Proof requested for an event that does not exist
    #[error("Index {index} out of range for chain with {event_count} events")]
    IndexOutOfRange {
        /// Requested leaf index
        index: usize,
        /// Events in the chain
        event_count: usize,
    },

    /// Structurally invalid authentication path
    #[error("Malformed proof: {0}")]
    MalformedProof(String),

    /// Proof was generated against a different event count
    #[error("Stale snapshot: proof covers {proof_event_count} events, chain has {current_event_count}")]
    StaleSnapshot {
        /// Event count the proof was generated against
        proof_event_count: usize,
        /// Current event count of the chain
        current_event_count: usize,
    },

    /// No chain registered under this id
    #[error("Chain not found: {0}")]
    ChainNotFound(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse error classification for an outer API layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad request data
    InvalidInput,
    /// Unknown event index or chain
    IndexOutOfRange,
    /// Structurally invalid proof
    MalformedProof,
    /// Advisory: proof no longer matches the current chain length
    StaleSnapshot,
    /// Anything not caused by the caller
    Internal,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::IndexOutOfRange { .. } | Error::ChainNotFound(_) => ErrorKind::IndexOutOfRange,
            Error::MalformedProof(_) => ErrorKind::MalformedProof,
            Error::StaleSnapshot { .. } => ErrorKind::StaleSnapshot,
            Error::Concurrency(_) | Error::Config(_) | Error::Serialization(_) | Error::Io(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Stale snapshots are advisory and never fatal
    pub fn is_advisory(&self) -> bool {
        matches!(self, Error::StaleSnapshot { .. })
    }
}
