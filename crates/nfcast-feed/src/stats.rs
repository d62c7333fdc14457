//! Per-run pipeline counters.
//!
//! One instance lives in the pipeline; a snapshot is logged periodically and
//! once at shutdown. Not thread-safe; the pipeline is a single task.

/// Counters for everything the pipeline observed, accepted, and dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Datagrams received from the socket.
    pub datagrams: u64,
    /// Datagrams whose header passed validation.
    pub accepted: u64,

    // -- Datagram drop reasons --
    pub dropped_bad_lead: u64,
    pub dropped_length: u64,
    pub dropped_format: u64,
    pub dropped_type: u64,

    /// Headers with an out-of-range time triple (wall clock substituted).
    pub bad_timestamps: u64,

    /// Non-empty records extracted.
    pub records: u64,
    /// Empty record slots skipped.
    pub empty_records: u64,
    /// Records dropped by the decompressor.
    pub decompress_errors: u64,

    /// Quotes emitted to the sink.
    pub quotes: u64,
    /// Records dropped by normalizer validation.
    pub quotes_dropped: u64,
    /// Distinct tokens missing from the contract master.
    pub unknown_tokens: u64,

    /// Sink write failures.
    pub sink_errors: u64,
}

impl FeedStats {
    /// Total datagrams dropped before record extraction.
    pub fn dropped_datagrams(&self) -> u64 {
        self.dropped_bad_lead + self.dropped_length + self.dropped_format + self.dropped_type
    }
}

impl std::fmt::Display for FeedStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "datagrams={} accepted={} dropped={} (lead={} len={} fmt={} type={}) \
             bad_ts={} records={} empty={} decomp_err={} quotes={} quote_drops={} \
             unknown={} sink_err={}",
            self.datagrams,
            self.accepted,
            self.dropped_datagrams(),
            self.dropped_bad_lead,
            self.dropped_length,
            self.dropped_format,
            self.dropped_type,
            self.bad_timestamps,
            self.records,
            self.empty_records,
            self.decompress_errors,
            self.quotes,
            self.quotes_dropped,
            self.unknown_tokens,
            self.sink_errors,
        )
    }
}
