//! Normalized, persistence-ready quote structures.
//!
//! All prices here are **rupees** as `f64` (`paise / 100.0` exactly). The
//! field order of [`Quote`] matches the CSV column order so both sinks stay
//! in lockstep.

use serde::Serialize;

/// One normalized depth level, rupee-scaled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct QuoteLevel {
    pub price: f64,
    pub quantity: u64,
    pub orders: u32,
}

/// A normalized per-instrument quote, ready for the sink.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Quote {
    pub token: u32,
    /// Base symbol (e.g. `SENSEX`), or `UNKNOWN` on contract-master miss.
    pub symbol: String,
    /// Display name, e.g. `SENSEX27NOV2025_84100CE`. Empty for unknown tokens.
    pub symbol_name: String,
    /// Expiry as carried by the contract master (`DD-MMM-YYYY`).
    pub expiry: String,
    /// `CE`/`PE` for options, empty for futures.
    pub option_type: String,
    pub strike: f64,
    /// `YYYY-MM-DD HH:MM:SS.mmm`.
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub ltp: f64,
    pub volume: u64,
    pub prev_close: f64,
    pub bid_levels: Vec<QuoteLevel>,
    pub ask_levels: Vec<QuoteLevel>,
}

impl std::fmt::Display for Quote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Quote({} token={} ltp={:.2} vol={} @ {})",
            if self.symbol_name.is_empty() { &self.symbol } else { &self.symbol_name },
            self.token,
            self.ltp,
            self.volume,
            self.timestamp,
        )
    }
}
