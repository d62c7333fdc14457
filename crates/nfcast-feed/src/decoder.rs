//! NFCAST datagram decoder.
//!
//! Parses the fixed 36-byte header and extracts the fixed-stride record
//! blocks. The header and the uncompressed record prefix are **little-endian**
//! (the compressed region is big-endian and belongs to the decompressor).
//!
//! # Header layout (bytes 0..35)
//!
//! | Offset | Size | Field        | Description                              |
//! |--------|------|--------------|------------------------------------------|
//! | 0      | 4    | reserved     | must be all zero                         |
//! | 4      | 2    | format_id    | equals the datagram's total byte length  |
//! | 8      | 2    | message_type | 2020 = Market Picture, 2021 = Complex    |
//! | 20     | 2    | hour         |                                          |
//! | 22     | 2    | minute       |                                          |
//! | 24     | 2    | second       |                                          |
//!
//! Remaining header bytes are reserved and ignored.
//!
//! # Record layout (264-byte slot, offsets relative to the slot)
//!
//! | Offset | Size | Field      | Encoding   |
//! |--------|------|------------|------------|
//! | 0      | 4    | token      | LE unsigned |
//! | 4      | 4    | prev_close | LE signed, paise |
//! | 8      | 4    | open hint  | LE signed, paise |
//! | 12     | 4    | high hint  | LE signed, paise |
//! | 16     | 4    | low hint   | LE signed, paise |
//! | 20     | 4    | num_trades | LE unsigned |
//! | 24     | 4    | volume     | LE unsigned |
//! | 28     | 8    | ltq        | LE unsigned, the quantity base |
//! | 36     | 4    | ltp        | LE signed, paise, the rate base |
//! | 40     | 224  | compressed region | big-endian differentials |
//!
//! The decoder is pure: it neither logs nor counts. The pipeline maps
//! [`DecodeError`] variants onto its drop counters, and decoding the same
//! bytes twice yields identical records.

use nfcast_core::types::{PacketHeader, RawRecord, WallTime};
use thiserror::Error;

/// Fixed header length.
pub const HEADER_LEN: usize = 36;

/// Record slot stride: `(564 − 36) / 2`.
pub const RECORD_STRIDE: usize = 264;

/// Canonical production format id (and datagram length).
pub const FORMAT_CANONICAL: u16 = 564;

/// Legacy single-record format id.
pub const FORMAT_LEGACY: u16 = 300;

/// Market Picture (4-byte instrument codes).
pub const MSG_MARKET_PICTURE: u16 = 2020;

/// Complex Market Picture (8-byte instrument codes).
pub const MSG_COMPLEX_MARKET_PICTURE: u16 = 2021;

// Record-relative field offsets.
const OFF_TOKEN: usize = 0;
const OFF_PREV_CLOSE: usize = 4;
const OFF_OPEN: usize = 8;
const OFF_HIGH: usize = 12;
const OFF_LOW: usize = 16;
const OFF_NUM_TRADES: usize = 20;
const OFF_VOLUME: usize = 24;
const OFF_LTQ: usize = 28;
const OFF_LTP: usize = 36;

/// Offset of the compressed region within a record slot (one past the rate
/// base).
pub const OFF_COMPRESSED: usize = 40;

/// Reasons a whole datagram is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("datagram shorter than the header ({0} bytes)")]
    Truncated(usize),

    #[error("bad leading bytes")]
    BadLeadingBytes,

    #[error("format id {format_id} does not match datagram length {len}")]
    LengthMismatch { format_id: u16, len: usize },

    #[error("unsupported format id {0}")]
    UnsupportedFormat(u16),

    #[error("unsupported message type {0}")]
    UnsupportedType(u16),
}

/// Decoder settings, derived from the feed config.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Accept the 300-byte legacy format.
    pub allow_legacy: bool,
    /// Treat canonical packets as carrying interleaved compressed depth.
    pub compressed_depth: bool,
    /// Tokens below this value mark empty record slots.
    pub min_token: u32,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self { allow_legacy: false, compressed_depth: false, min_token: 2 }
    }
}

/// A decoded datagram: header plus its record slots in declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPacket {
    pub header: PacketHeader,
    pub records: Vec<RawRecord>,
}

#[inline]
fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes(data[offset..offset + 2].try_into().unwrap_or([0; 2]))
}

#[inline]
fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap_or([0; 4]))
}

#[inline]
fn read_i32_le(data: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes(data[offset..offset + 4].try_into().unwrap_or([0; 4]))
}

#[inline]
fn read_u64_le(data: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(data[offset..offset + 8].try_into().unwrap_or([0; 8]))
}

/// Decode one datagram into a header and raw records.
pub fn decode_datagram(
    config: &DecoderConfig,
    data: &[u8],
) -> Result<DecodedPacket, DecodeError> {
    if data.len() < HEADER_LEN {
        return Err(DecodeError::Truncated(data.len()));
    }
    if data[0..4] != [0, 0, 0, 0] {
        return Err(DecodeError::BadLeadingBytes);
    }

    let format_id = read_u16_le(data, 4);
    if usize::from(format_id) != data.len() {
        return Err(DecodeError::LengthMismatch { format_id, len: data.len() });
    }
    let recognized =
        format_id == FORMAT_CANONICAL || (config.allow_legacy && format_id == FORMAT_LEGACY);
    if !recognized {
        return Err(DecodeError::UnsupportedFormat(format_id));
    }

    let message_type = read_u16_le(data, 8);
    if message_type != MSG_MARKET_PICTURE && message_type != MSG_COMPLEX_MARKET_PICTURE {
        return Err(DecodeError::UnsupportedType(message_type));
    }

    let time = WallTime {
        hour: read_u16_le(data, 20),
        minute: read_u16_le(data, 22),
        second: read_u16_le(data, 24),
    };
    let header = PacketHeader {
        format_id,
        message_type,
        time: time.is_valid().then_some(time),
    };

    let compressed = config.compressed_depth || format_id != FORMAT_CANONICAL;
    let num_records = (usize::from(format_id) - HEADER_LEN) / RECORD_STRIDE;
    let mut records = Vec::with_capacity(num_records);
    for slot in 0..num_records {
        let base = HEADER_LEN + slot * RECORD_STRIDE;
        records.push(parse_record(config, data, base, compressed));
    }

    Ok(DecodedPacket { header, records })
}

/// Parse one 264-byte record slot starting at `base`.
fn parse_record(config: &DecoderConfig, data: &[u8], base: usize, compressed: bool) -> RawRecord {
    let token = read_u32_le(data, base + OFF_TOKEN);
    if token < config.min_token {
        return RawRecord { token, empty: true, ..RawRecord::default() };
    }

    RawRecord {
        token,
        prev_close: i64::from(read_i32_le(data, base + OFF_PREV_CLOSE)),
        open: i64::from(read_i32_le(data, base + OFF_OPEN)),
        high: i64::from(read_i32_le(data, base + OFF_HIGH)),
        low: i64::from(read_i32_le(data, base + OFF_LOW)),
        num_trades: read_u32_le(data, base + OFF_NUM_TRADES),
        volume: read_u32_le(data, base + OFF_VOLUME),
        ltq: read_u64_le(data, base + OFF_LTQ),
        ltp: i64::from(read_i32_le(data, base + OFF_LTP)),
        compressed,
        empty: false,
        cursor: base + OFF_COMPRESSED,
        region_end: base + RECORD_STRIDE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{RecordSpec, build_datagram};

    #[test]
    fn decodes_canonical_header_and_records() {
        let specs = [
            RecordSpec {
                token: 873870,
                prev_close: 119_000,
                open: 118_500,
                high: 121_000,
                low: 118_000,
                num_trades: 12,
                volume: 480,
                ltq: 20,
                ltp: 120_775,
                ..RecordSpec::default()
            },
            RecordSpec::default(), // token 0, an empty slot
        ];
        let data = build_datagram(MSG_MARKET_PICTURE, (10, 15, 30), &specs);
        assert_eq!(data.len(), 564);

        let packet = decode_datagram(&DecoderConfig::default(), &data).unwrap();
        assert_eq!(packet.header.format_id, FORMAT_CANONICAL);
        assert_eq!(packet.header.message_type, MSG_MARKET_PICTURE);
        assert_eq!(
            packet.header.time,
            Some(WallTime { hour: 10, minute: 15, second: 30 })
        );
        assert_eq!(packet.records.len(), 2);

        let rec = &packet.records[0];
        assert!(!rec.empty);
        assert!(!rec.compressed);
        assert_eq!(rec.token, 873870);
        assert_eq!(rec.prev_close, 119_000);
        assert_eq!(rec.open, 118_500);
        assert_eq!(rec.high, 121_000);
        assert_eq!(rec.low, 118_000);
        assert_eq!(rec.num_trades, 12);
        assert_eq!(rec.volume, 480);
        assert_eq!(rec.ltq, 20);
        assert_eq!(rec.ltp, 120_775);
        assert_eq!(rec.cursor, HEADER_LEN + OFF_COMPRESSED);
        assert_eq!(rec.region_end, HEADER_LEN + RECORD_STRIDE);

        assert!(packet.records[1].empty);
    }

    #[test]
    fn rejects_bad_leading_bytes() {
        let mut data = build_datagram(MSG_MARKET_PICTURE, (10, 0, 0), &two_slots());
        data[2] = 0x7F;
        let err = decode_datagram(&DecoderConfig::default(), &data).unwrap_err();
        assert_eq!(err, DecodeError::BadLeadingBytes);
    }

    #[test]
    fn rejects_length_mismatch() {
        let mut data = build_datagram(MSG_MARKET_PICTURE, (10, 0, 0), &two_slots());
        data.push(0); // 565 bytes, format_id still 564
        let err = decode_datagram(&DecoderConfig::default(), &data).unwrap_err();
        assert_eq!(err, DecodeError::LengthMismatch { format_id: 564, len: 565 });
    }

    #[test]
    fn rejects_unsupported_message_type() {
        let data = build_datagram(2016, (10, 0, 0), &two_slots());
        let err = decode_datagram(&DecoderConfig::default(), &data).unwrap_err();
        assert_eq!(err, DecodeError::UnsupportedType(2016));
    }

    #[test]
    fn rejects_short_datagram() {
        let err = decode_datagram(&DecoderConfig::default(), &[0u8; 20]).unwrap_err();
        assert_eq!(err, DecodeError::Truncated(20));
    }

    #[test]
    fn legacy_format_gated_by_config() {
        let specs = [RecordSpec { token: 861384, ltp: 50_000, ..RecordSpec::default() }];
        let data = build_datagram(MSG_MARKET_PICTURE, (11, 0, 0), &specs);
        assert_eq!(data.len(), 300);

        let err = decode_datagram(&DecoderConfig::default(), &data).unwrap_err();
        assert_eq!(err, DecodeError::UnsupportedFormat(300));

        let config = DecoderConfig { allow_legacy: true, ..DecoderConfig::default() };
        let packet = decode_datagram(&config, &data).unwrap();
        assert_eq!(packet.records.len(), 1);
        // Legacy payloads carry compressed depth.
        assert!(packet.records[0].compressed);
    }

    #[test]
    fn out_of_range_header_time_is_dropped_to_none() {
        let data = build_datagram(MSG_MARKET_PICTURE, (24, 0, 0), &two_slots());
        let packet = decode_datagram(&DecoderConfig::default(), &data).unwrap();
        assert_eq!(packet.header.time, None);
    }

    #[test]
    fn complex_market_picture_is_accepted() {
        let data = build_datagram(MSG_COMPLEX_MARKET_PICTURE, (10, 0, 0), &two_slots());
        let packet = decode_datagram(&DecoderConfig::default(), &data).unwrap();
        assert_eq!(packet.header.message_type, MSG_COMPLEX_MARKET_PICTURE);
    }

    #[test]
    fn token_one_is_an_empty_slot() {
        let specs = [
            RecordSpec { token: 1, ltp: 99, ..RecordSpec::default() },
            RecordSpec { token: 861384, ltp: 50_000, ..RecordSpec::default() },
        ];
        let data = build_datagram(MSG_MARKET_PICTURE, (10, 0, 0), &specs);
        let packet = decode_datagram(&DecoderConfig::default(), &data).unwrap();
        assert!(packet.records[0].empty);
        assert!(!packet.records[1].empty);
    }

    #[test]
    fn decoding_is_idempotent() {
        let data = build_datagram(MSG_MARKET_PICTURE, (10, 15, 30), &two_slots());
        let config = DecoderConfig::default();
        let first = decode_datagram(&config, &data).unwrap();
        let second = decode_datagram(&config, &data).unwrap();
        assert_eq!(first, second);
    }

    fn two_slots() -> [RecordSpec; 2] {
        [
            RecordSpec { token: 873870, ltp: 120_775, volume: 480, ..RecordSpec::default() },
            RecordSpec::default(),
        ]
    }
}
