//! NFCAST differential decompressor.
//!
//! The compressed region of a record encodes every value as a 2-byte signed
//! differential against a running base, and it is the only part of the
//! packet that uses **big-endian**. Three sentinel values steer the decode:
//!
//! | Sentinel | Meaning |
//! |----------|---------|
//! | `32767`  | escape: the next 4 bytes are a big-endian absolute value, which also replaces the running base |
//! | `32766`  | terminator for the bid side |
//! | `−32766` | terminator for the ask side |
//!
//! Scalars decode against the record's rate base (`ltp`) or quantity base
//! (`ltq`). Depth levels cascade: level 1 decodes against
//! `(rate, qty, qty, qty)` and each subsequent level against the previous
//! level's four decoded values.
//!
//! A decode that runs past the record's region, or meets a terminator outside
//! a depth-level boundary, fails **that record only**: the caller drops the
//! partial result and moves on to the next record in the datagram.

use nfcast_core::types::{DepthLevel, DepthRecord, MAX_DEPTH, RawRecord, WallTime};
use thiserror::Error;

/// Escape to a 4-byte absolute value.
const ESCAPE: i16 = 32767;

/// Bid-side depth terminator.
const BID_TERMINATOR: i16 = 32766;

/// Ask-side depth terminator.
const ASK_TERMINATOR: i16 = -32766;

/// Per-record decompression failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecompressError {
    #[error("compressed region overrun at byte {0}")]
    Overrun(usize),

    #[error("terminator outside a depth level boundary")]
    UnexpectedTerminator,
}

/// One decoded element of the differential stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decoded {
    /// `base + d` reconstruction.
    Diff(i64),
    /// Escaped absolute value; replaces the running base.
    Absolute(i64),
    BidEnd,
    AskEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Bid,
    Ask,
}

/// Big-endian reader over one record's compressed region.
struct DiffReader<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> DiffReader<'a> {
    fn new(data: &'a [u8], pos: usize, end: usize) -> Self {
        Self { data, pos, end: end.min(data.len()) }
    }

    fn read_i16(&mut self) -> Result<i16, DecompressError> {
        if self.pos + 2 > self.end {
            return Err(DecompressError::Overrun(self.pos));
        }
        let v = i16::from_be_bytes(self.data[self.pos..self.pos + 2].try_into().unwrap_or([0; 2]));
        self.pos += 2;
        Ok(v)
    }

    fn read_i32(&mut self) -> Result<i32, DecompressError> {
        if self.pos + 4 > self.end {
            return Err(DecompressError::Overrun(self.pos));
        }
        let v = i32::from_be_bytes(self.data[self.pos..self.pos + 4].try_into().unwrap_or([0; 4]));
        self.pos += 4;
        Ok(v)
    }

    /// Decode the next element against `base`.
    fn next(&mut self, base: i64) -> Result<Decoded, DecompressError> {
        match self.read_i16()? {
            ESCAPE => Ok(Decoded::Absolute(i64::from(self.read_i32()?))),
            BID_TERMINATOR => Ok(Decoded::BidEnd),
            ASK_TERMINATOR => Ok(Decoded::AskEnd),
            d => Ok(Decoded::Diff(base + i64::from(d))),
        }
    }
}

/// Decode one scalar field; an escape replaces the running base.
fn scalar(reader: &mut DiffReader<'_>, base: &mut i64) -> Result<i64, DecompressError> {
    match reader.next(*base)? {
        Decoded::Diff(v) => Ok(v),
        Decoded::Absolute(v) => {
            *base = v;
            Ok(v)
        }
        Decoded::BidEnd | Decoded::AskEnd => Err(DecompressError::UnexpectedTerminator),
    }
}

/// Decode one depth-level field; terminators are only legal as the first
/// field of a level, which the caller handles.
fn depth_field(reader: &mut DiffReader<'_>, base: i64) -> Result<i64, DecompressError> {
    match reader.next(base)? {
        Decoded::Diff(v) | Decoded::Absolute(v) => Ok(v),
        Decoded::BidEnd | Decoded::AskEnd => Err(DecompressError::UnexpectedTerminator),
    }
}

/// Decode up to [`MAX_DEPTH`] levels of one side, cascading the base tuple.
fn depth_side(
    reader: &mut DiffReader<'_>,
    side: Side,
    rate_base: i64,
    qty_base: i64,
) -> Result<Vec<DepthLevel>, DecompressError> {
    let mut levels = Vec::with_capacity(MAX_DEPTH);
    let (mut rate, mut qty, mut orders, mut implied) = (rate_base, qty_base, qty_base, qty_base);

    for _ in 0..MAX_DEPTH {
        let price = match reader.next(rate)? {
            Decoded::Diff(v) | Decoded::Absolute(v) => v,
            Decoded::BidEnd if side == Side::Bid => return Ok(levels),
            Decoded::AskEnd if side == Side::Ask => return Ok(levels),
            Decoded::BidEnd | Decoded::AskEnd => {
                return Err(DecompressError::UnexpectedTerminator);
            }
        };
        let quantity = depth_field(reader, qty)?;
        let order_count = depth_field(reader, orders)?;
        let implied_qty = depth_field(reader, implied)?;

        levels.push(DepthLevel { price, quantity, orders: order_count });
        (rate, qty, orders, implied) = (price, quantity, order_count, implied_qty);
    }

    Ok(levels)
}

/// Expand one raw record into a [`DepthRecord`].
///
/// The uncompressed variant passes the decoder's resolved fields through with
/// empty depth; the compressed variant reconstructs everything differentially
/// from the record's cursor.
pub fn expand(
    raw: &RawRecord,
    datagram: &[u8],
    time: Option<WallTime>,
) -> Result<DepthRecord, DecompressError> {
    if !raw.compressed {
        return Ok(DepthRecord {
            token: raw.token,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.ltp,
            ltp: raw.ltp,
            prev_close: raw.prev_close,
            volume: raw.volume,
            num_trades: raw.num_trades,
            bids: Vec::new(),
            asks: Vec::new(),
            time,
        });
    }

    let mut reader = DiffReader::new(datagram, raw.cursor, raw.region_end);
    let mut rate_base = raw.ltp;
    let mut qty_base = raw.ltq as i64;

    let open = scalar(&mut reader, &mut rate_base)?;
    let prev_close = scalar(&mut reader, &mut rate_base)?;
    let high = scalar(&mut reader, &mut rate_base)?;
    let low = scalar(&mut reader, &mut rate_base)?;
    let _reserved = scalar(&mut reader, &mut rate_base)?;
    let _indicative_eq_price = scalar(&mut reader, &mut rate_base)?;
    let _indicative_eq_qty = scalar(&mut reader, &mut qty_base)?;
    let _total_bid_qty = scalar(&mut reader, &mut qty_base)?;
    let _total_offer_qty = scalar(&mut reader, &mut qty_base)?;
    let _lower_circuit = scalar(&mut reader, &mut rate_base)?;
    let _upper_circuit = scalar(&mut reader, &mut rate_base)?;
    let _weighted_average = scalar(&mut reader, &mut rate_base)?;

    let bids = depth_side(&mut reader, Side::Bid, rate_base, qty_base)?;
    let asks = depth_side(&mut reader, Side::Ask, rate_base, qty_base)?;

    Ok(DepthRecord {
        token: raw.token,
        open,
        high,
        low,
        close: raw.ltp,
        ltp: raw.ltp,
        prev_close,
        volume: raw.volume,
        num_trades: raw.num_trades,
        bids,
        asks,
        time,
    })
}
