//! # nfcast-core
//!
//! Core crate for the BSE NFCAST feed handler, providing:
//!
//! - **Types** (`types`) — per-stage packet, depth, and quote structures
//! - **Configuration** (`config`) — JSON config deserialization
//! - **Error types** (`error`) — domain-specific `FeedError` via thiserror
//! - **Contract master** (`contract`) — token → instrument metadata map
//! - **Multicast receiver** (`udp`) — timeout-bounded datagram source
//! - **Time utilities** (`time_util`) — quote timestamp composition
//! - **Logging** (`logging`) — tracing-based structured logging

pub mod config;
pub mod contract;
pub mod error;
pub mod logging;
pub mod time_util;
pub mod types;
pub mod udp;

// Re-export types at crate root for convenience.
pub use types::*;
