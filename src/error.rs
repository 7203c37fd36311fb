//! Error types for the E-LIP bridge
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using ElipError
pub type Result<T> = std::result::Result<T, ElipError>;

/// Unified error type for E-LIP bridge operations
#[derive(Debug, Error)]
pub enum ElipError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Transport failure: {0}")]
    Transport(String),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Session error: {0}")]
    Session(String),
}

impl ElipError {
    /// Whether this error ends the current connection.
    ///
    /// Malformed inbound frames count as connection-ending: the stream can no
    /// longer be trusted to be aligned on a frame boundary.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            ElipError::Io(_) | ElipError::Transport(_) | ElipError::MalformedFrame(_)
        )
    }
}
