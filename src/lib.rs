//! # E-LIP Bridge
//!
//! A persistent client for E-LIP elevator access-control controllers:
//! - Single TCP session with automatic reconnect and retry cooldown
//! - Periodic health checks interleaved with application traffic
//! - FIFO outbound queue, safe to feed from any thread
//! - Binary codec with 2-bit-per-floor door permission bitmaps
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Callers                                │
//! │               (any thread: send / start / stop)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ outbound FIFO
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Session                                 │
//! │       (worker thread: connect, health check, poll, send)     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Transport  │─────────▶│    Codec    │
//!   │    (TCP)    │          │  (frames)   │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ElipError, Result};
pub use config::Config;
pub use network::{Session, TcpTransport, Transport};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the bridge
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
