//! Error types for CairnKV
//!
//! Provides a unified error type for all operations.
//!
//! Per-command failures never surface here: the dispatcher degrades them to
//! a textual reply. These errors cover startup, persistence and transport.

use thiserror::Error;

/// Result type alias using CairnError
pub type Result<T> = std::result::Result<T, CairnError>;

/// Unified error type for CairnKV operations
#[derive(Debug, Error)]
pub enum CairnError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Snapshot Errors
    // -------------------------------------------------------------------------
    #[error("Snapshot corruption detected: {0}")]
    SnapshotCorruption(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for CairnError {
    fn from(err: bincode::Error) -> Self {
        CairnError::Serialization(err.to_string())
    }
}
