//! # cinnabar
//!
//! A synchronous client for the Redis text/binary hybrid wire protocol:
//! - One lazily-opened TCP connection per client
//! - Typed commands rendered into the line-oriented command syntax
//! - The five reply shapes (status, error, integer, bulk, multi-bulk)
//!   decoded into typed results
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Command Facade                           │
//! │        (generic / strings / lists / sets / admin)            │
//! └─────────────┬───────────────────────────────▲───────────────┘
//!               │ encode                        │ convert
//! ┌─────────────▼─────────────┐   ┌─────────────┴───────────────┐
//! │       Codec (encode)       │   │       Codec (decode)        │
//! │  inline / bulk frames      │   │  five-way reply dispatch    │
//! └─────────────┬─────────────┘   └─────────────▲───────────────┘
//!               │ send                          │ read
//! ┌─────────────▼─────────────────────────────────────────────────┐
//! │                    Connection Manager                          │
//! │        (lazy connect, AUTH, teardown on failure)               │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Strictly request/response: a command is never sent before the prior
//! reply has been fully consumed. Blocking I/O throughout; no pooling,
//! pipelining, pub/sub or TLS.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod connection;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CinnabarError, Result};
pub use config::Config;
pub use protocol::{KeyType, Reply};
pub use client::Client;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of cinnabar
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
