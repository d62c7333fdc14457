//! Typed error definitions for the NFCAST feed handler.
//!
//! Provides [`FeedError`] for the fatal startup and socket failure modes.
//! Per-datagram and per-record failures never surface here: the decoder and
//! decompressor carry their own error enums and the pipeline converts them
//! into counters. All variants implement `std::error::Error` via `thiserror`,
//! so they integrate seamlessly with `anyhow::Result`.

use thiserror::Error;

/// Domain-specific errors for the NFCAST feed handler.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Configuration parsing or validation error.
    #[error("config error: {0}")]
    Config(String),

    /// Contract master load or parse error.
    #[error("contract master error: {0}")]
    Master(String),

    /// Multicast socket bind, join, or receive error.
    #[error("socket error: {0}")]
    Socket(String),

    /// Output file creation error at sink construction.
    #[error("sink error: {0}")]
    Sink(String),
}

impl From<std::io::Error> for FeedError {
    fn from(e: std::io::Error) -> Self {
        FeedError::Socket(e.to_string())
    }
}
