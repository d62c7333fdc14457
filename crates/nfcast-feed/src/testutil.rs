//! Synthetic datagram builders shared by the stage tests.

use crate::decoder::{HEADER_LEN, OFF_COMPRESSED, RECORD_STRIDE};

/// Field values for one synthetic record slot. `Default` produces an empty
/// slot (token 0, everything zeroed).
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordSpec {
    pub token: u32,
    pub prev_close: i32,
    pub open: i32,
    pub high: i32,
    pub low: i32,
    pub num_trades: u32,
    pub volume: u32,
    pub ltq: u64,
    pub ltp: i32,
    /// Copied into the slot starting at the compressed-region offset;
    /// the remainder of the slot stays zero.
    pub compressed_region: Vec<u8>,
}

/// Build a well-formed datagram: zeroed leading bytes, format id equal to the
/// total length, the given message type and header time, and one 264-byte
/// slot per record spec.
pub(crate) fn build_datagram(
    message_type: u16,
    time: (u16, u16, u16),
    records: &[RecordSpec],
) -> Vec<u8> {
    let len = HEADER_LEN + records.len() * RECORD_STRIDE;
    let mut buf = vec![0u8; len];

    buf[4..6].copy_from_slice(&(len as u16).to_le_bytes());
    buf[8..10].copy_from_slice(&message_type.to_le_bytes());
    buf[20..22].copy_from_slice(&time.0.to_le_bytes());
    buf[22..24].copy_from_slice(&time.1.to_le_bytes());
    buf[24..26].copy_from_slice(&time.2.to_le_bytes());

    for (slot, spec) in records.iter().enumerate() {
        let base = HEADER_LEN + slot * RECORD_STRIDE;
        buf[base..base + 4].copy_from_slice(&spec.token.to_le_bytes());
        buf[base + 4..base + 8].copy_from_slice(&spec.prev_close.to_le_bytes());
        buf[base + 8..base + 12].copy_from_slice(&spec.open.to_le_bytes());
        buf[base + 12..base + 16].copy_from_slice(&spec.high.to_le_bytes());
        buf[base + 16..base + 20].copy_from_slice(&spec.low.to_le_bytes());
        buf[base + 20..base + 24].copy_from_slice(&spec.num_trades.to_le_bytes());
        buf[base + 24..base + 28].copy_from_slice(&spec.volume.to_le_bytes());
        buf[base + 28..base + 36].copy_from_slice(&spec.ltq.to_le_bytes());
        buf[base + 36..base + 40].copy_from_slice(&spec.ltp.to_le_bytes());

        let region = &spec.compressed_region;
        assert!(region.len() <= RECORD_STRIDE - OFF_COMPRESSED, "compressed region too long");
        buf[base + OFF_COMPRESSED..base + OFF_COMPRESSED + region.len()].copy_from_slice(region);
    }

    buf
}

/// Append a big-endian 2-byte differential to a compressed stream.
pub(crate) fn push_diff(buf: &mut Vec<u8>, d: i16) {
    buf.extend_from_slice(&d.to_be_bytes());
}

/// Append an escape marker followed by a big-endian 4-byte absolute value.
pub(crate) fn push_abs(buf: &mut Vec<u8>, v: i32) {
    push_diff(buf, 32767);
    buf.extend_from_slice(&v.to_be_bytes());
}
