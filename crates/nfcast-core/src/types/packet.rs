//! Datagram-scoped structures: packet header, raw records, and depth records.
//!
//! All price fields here are **paise** (1/100 rupee), exactly as they appear
//! on the wire. Scaling to rupees happens only in the normalizer.

// ---------------------------------------------------------------------------
// WallTime
// ---------------------------------------------------------------------------

/// Hour/minute/second triple carried in the datagram header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallTime {
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
}

impl WallTime {
    /// A header time is usable only when all three fields are in range.
    pub fn is_valid(&self) -> bool {
        self.hour < 24 && self.minute < 60 && self.second < 60
    }
}

// ---------------------------------------------------------------------------
// PacketHeader
// ---------------------------------------------------------------------------

/// Parsed 36-byte datagram header.
///
/// `time` is `None` when the header carried an out-of-range triple; the
/// normalizer then falls back to the local wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Equals the datagram's total byte length in this protocol.
    pub format_id: u16,
    /// 2020 = Market Picture, 2021 = Complex Market Picture.
    pub message_type: u16,
    pub time: Option<WallTime>,
}

// ---------------------------------------------------------------------------
// RawRecord
// ---------------------------------------------------------------------------

/// One per-instrument record slot, pre-decompression.
///
/// `cursor` and `region_end` delimit this record's compressed region inside
/// the datagram; `ltp` and `ltq` are the rate and quantity bases for
/// differential reconstruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub token: u32,
    /// Previous close in paise.
    pub prev_close: i64,
    /// Open/high/low hints in paise (resolved values in the uncompressed
    /// variant, ignored in the compressed variant).
    pub open: i64,
    pub high: i64,
    pub low: i64,
    pub num_trades: u32,
    pub volume: u32,
    /// Last traded quantity, the quantity base.
    pub ltq: u64,
    /// Last traded price in paise, the rate base.
    pub ltp: i64,
    /// Whether OHLC/depth must be reconstructed differentially.
    pub compressed: bool,
    /// Empty slot marker (token below the empty-slot threshold).
    pub empty: bool,
    /// Byte offset into the datagram where the compressed region begins.
    pub cursor: usize,
    /// Byte offset one past the end of this record's slot.
    pub region_end: usize,
}

// ---------------------------------------------------------------------------
// Depth
// ---------------------------------------------------------------------------

/// Maximum depth levels per side.
pub const MAX_DEPTH: usize = 5;

/// One reconstructed depth level, paise-scaled, best-first ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepthLevel {
    pub price: i64,
    pub quantity: i64,
    pub orders: i64,
}

/// Fully reconstructed per-instrument market picture, still paise-scaled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepthRecord {
    pub token: u32,
    pub open: i64,
    pub high: i64,
    pub low: i64,
    /// Close equals the last traded price in this feed.
    pub close: i64,
    pub ltp: i64,
    pub prev_close: i64,
    pub volume: u32,
    pub num_trades: u32,
    /// Bid levels, best (highest) first. At most [`MAX_DEPTH`].
    pub bids: Vec<DepthLevel>,
    /// Ask levels, best (lowest) first. At most [`MAX_DEPTH`].
    pub asks: Vec<DepthLevel>,
    /// Header time of the datagram this record arrived in.
    pub time: Option<WallTime>,
}

impl std::fmt::Display for DepthRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DepthRecord(token={} ltp={} vol={} bids={} asks={})",
            self.token,
            self.ltp,
            self.volume,
            self.bids.len(),
            self.asks.len(),
        )
    }
}
