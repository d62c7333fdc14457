//! Quote normalization: contract-master join, scaling, validation.
//!
//! Joins each reconstructed depth record with the contract master, builds the
//! display symbol name, scales paise to rupees, and applies the hard
//! validation rules. Unknown tokens are *not* dropped: the quote goes out
//! with `symbol = "UNKNOWN"` so downstream consumers still see the token; the
//! miss is warned once per token.

use std::sync::Arc;

use ahash::AHashSet;
use chrono::{DateTime, Local};
use nfcast_core::contract::{ContractInfo, ContractMaster};
use nfcast_core::time_util::quote_timestamp;
use nfcast_core::types::{DepthLevel, DepthRecord, Quote, QuoteLevel};
use tracing::warn;

/// Symbol used when the token is missing from the contract master.
pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";

/// Stateful normalizer. The contract master is shared read-only; the only
/// mutable state is the seen-unknown-token set behind the warn-once rule.
pub struct Normalizer {
    master: Arc<ContractMaster>,
    unknown_seen: AHashSet<u32>,
}

impl Normalizer {
    pub fn new(master: Arc<ContractMaster>) -> Self {
        Self { master, unknown_seen: AHashSet::new() }
    }

    /// Normalize one depth record into a quote.
    ///
    /// Returns `None` when the record fails hard validation (`ltp <= 0`);
    /// the caller counts the drop.
    pub fn normalize(&mut self, rec: &DepthRecord, now: DateTime<Local>) -> Option<Quote> {
        if rec.ltp <= 0 {
            return None;
        }

        let mut quote = Quote {
            token: rec.token,
            timestamp: quote_timestamp(rec.time, now),
            open: paise_to_rupees(rec.open),
            high: paise_to_rupees(rec.high),
            low: paise_to_rupees(rec.low),
            close: paise_to_rupees(rec.close),
            ltp: paise_to_rupees(rec.ltp),
            volume: u64::from(rec.volume),
            prev_close: paise_to_rupees(rec.prev_close),
            bid_levels: normalize_side(&rec.bids),
            ask_levels: normalize_side(&rec.asks),
            ..Quote::default()
        };

        match self.master.get(rec.token) {
            Some(info) => {
                quote.symbol = info.symbol.clone();
                quote.symbol_name = symbol_name(info);
                quote.expiry = info.expiry.clone();
                quote.option_type = info.option_type.clone();
                quote.strike = info.strike;
            }
            None => {
                quote.symbol = UNKNOWN_SYMBOL.to_string();
                if self.unknown_seen.insert(rec.token) {
                    warn!("token {} not in contract master", rec.token);
                }
            }
        }

        Some(quote)
    }

    /// Number of distinct unknown tokens seen so far.
    pub fn unknown_tokens(&self) -> u64 {
        self.unknown_seen.len() as u64
    }
}

/// Scale a paise value to rupees.
#[inline]
fn paise_to_rupees(paise: i64) -> f64 {
    paise as f64 / 100.0
}

/// Drop non-positive-price levels from a side and scale the survivors;
/// negative quantities and order counts clamp to zero.
fn normalize_side(levels: &[DepthLevel]) -> Vec<QuoteLevel> {
    levels
        .iter()
        .filter(|l| l.price > 0)
        .map(|l| QuoteLevel {
            price: paise_to_rupees(l.price),
            quantity: l.quantity.max(0) as u64,
            orders: l.orders.clamp(0, i64::from(u32::MAX)) as u32,
        })
        .collect()
}

/// Build the display symbol name.
///
/// Options: `{SYMBOL}{DD}{MMM}{YYYY}_{STRIKE}{CE|PE}`; futures:
/// `{SYMBOL}{DD}{MMM}{YYYY}_FUT`. The expiry `DD-MMM-YYYY` is compacted and
/// the month uppercased; integral strikes render without a decimal point.
fn symbol_name(info: &ContractInfo) -> String {
    let expiry = info.expiry.replace('-', "").to_uppercase();
    match info.option_type.as_str() {
        "CE" | "PE" => format!(
            "{}{}_{}{}",
            info.symbol,
            expiry,
            format_strike(info.strike),
            info.option_type,
        ),
        _ => format!("{}{}_FUT", info.symbol, expiry),
    }
}

fn format_strike(strike: f64) -> String {
    if strike.fract() == 0.0 {
        format!("{}", strike as i64)
    } else {
        format!("{strike}")
    }
}
