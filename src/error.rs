//! Error types for cinnabar
//!
//! Provides a unified error type for all client operations.

use thiserror::Error;

/// Result type alias using CinnabarError
pub type Result<T> = std::result::Result<T, CinnabarError>;

/// Unified error type for cinnabar operations
#[derive(Debug, Error)]
pub enum CinnabarError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Argument Validation Errors (raised before any network I/O)
    // -------------------------------------------------------------------------
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Value of {size} bytes exceeds the 1 GiB payload limit")]
    ValueTooLarge { size: usize },

    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    #[error("Connection error: {0}")]
    Connection(String),

    // -------------------------------------------------------------------------
    // Server-Reported Errors (`-` reply lines, `ERR ` prefix stripped)
    // -------------------------------------------------------------------------
    #[error("Server error: {0}")]
    Server(String),

    // -------------------------------------------------------------------------
    // Protocol Errors (malformed or unexpected replies; fatal to the call)
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),
}
