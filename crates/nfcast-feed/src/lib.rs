//! # nfcast-feed
//!
//! Pipeline stages for the BSE NFCAST market-picture feed.
//!
//! ## Architecture
//!
//! Five stages compose a strictly forward pipeline; each is a pure
//! transformation on typed values with no shared mutable state between
//! stages:
//!
//! ```text
//! FeedReceiver ──► decoder ──► decompress ──► normalize ──► sink
//!   (bytes)       RawRecord    DepthRecord      Quote      JSON+CSV
//! ```
//!
//! - [`decoder`] — 36-byte header parse + fixed-stride record extraction
//! - [`decompress`] — differential reconstruction of OHLC and 5-level depth
//! - [`normalize`] — contract-master join, scaling, validation
//! - [`sink`] — daily-rotated JSON-lines and CSV writers
//! - [`pipeline`] — the cooperative run loop wiring it all together
//! - [`stats`] — per-run counters

pub mod decoder;
pub mod decompress;
pub mod normalize;
pub mod pipeline;
pub mod sink;
pub mod stats;

#[cfg(test)]
pub(crate) mod testutil;
