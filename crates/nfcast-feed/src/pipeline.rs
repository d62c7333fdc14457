//! The pipeline run loop: receive → decode → decompress → normalize → save.
//!
//! One logical task executes the whole pipeline; the bounded receive call is
//! the sole yield point and the only place the shutdown flag is observed. A
//! datagram that has already been received is always processed to completion,
//! and its records are persisted in declared slot order. No internal
//! buffering: if the sink cannot keep up, datagrams accumulate in the kernel
//! receive buffer.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Local;
use nfcast_core::config::FeedConfig;
use nfcast_core::contract::ContractMaster;
use nfcast_core::error::FeedError;
use nfcast_core::udp::FeedReceiver;
use tracing::{debug, info, warn};

use crate::decoder::{self, DecodeError, DecoderConfig};
use crate::decompress;
use crate::normalize::Normalizer;
use crate::sink::QuoteSink;
use crate::stats::FeedStats;

/// Log a stats snapshot every this many datagrams.
const STATS_LOG_INTERVAL: u64 = 10_000;

/// The assembled pipeline: decoder settings, normalizer, sink, counters.
pub struct FeedPipeline {
    decoder: DecoderConfig,
    normalizer: Normalizer,
    sink: QuoteSink,
    stats: FeedStats,
}

impl FeedPipeline {
    pub fn new(config: &FeedConfig, master: Arc<ContractMaster>) -> Result<Self, FeedError> {
        let sink =
            QuoteSink::new(config.effective_output_json(), config.effective_output_csv())?;
        let decoder = DecoderConfig {
            allow_legacy: config.allow_legacy(),
            compressed_depth: config.compressed_depth(),
            min_token: config.effective_min_token(),
        };
        // A threshold above the smallest listed token would swallow real
        // instruments as empty slots.
        if let Some(smallest) = master.min_token()
            && decoder.min_token > smallest
        {
            warn!(
                "empty-slot threshold {} exceeds the smallest contract-master token {}; \
                 records for lower tokens will be skipped as empty slots",
                decoder.min_token, smallest,
            );
        }
        Ok(Self {
            decoder,
            normalizer: Normalizer::new(master),
            sink,
            stats: FeedStats::default(),
        })
    }

    /// Run until the shutdown flag is set.
    ///
    /// Receive timeouts loop silently; a socket-level error aborts the run
    /// and surfaces to the supervisor.
    pub async fn run(
        &mut self,
        receiver: &mut FeedReceiver,
        shutdown: &AtomicBool,
    ) -> Result<(), FeedError> {
        info!("pipeline running");
        while !shutdown.load(Ordering::Relaxed) {
            match receiver.next_datagram().await? {
                // Timeout: go around and re-check the shutdown flag.
                None => continue,
                Some((datagram, source)) => {
                    self.process_datagram(&datagram, source);
                    if self.stats.datagrams % STATS_LOG_INTERVAL == 0 {
                        info!("{}", self.snapshot());
                    }
                }
            }
        }
        info!("shutdown observed, pipeline stopping");
        Ok(())
    }

    /// Decode one datagram and push every non-empty record through the rest
    /// of the pipeline. Never fails: every per-datagram and per-record
    /// problem becomes a counter.
    pub fn process_datagram(&mut self, datagram: &[u8], source: SocketAddr) {
        self.stats.datagrams += 1;

        let packet = match decoder::decode_datagram(&self.decoder, datagram) {
            Ok(packet) => packet,
            Err(e) => {
                self.count_drop(&e);
                debug!("dropped datagram from {source}: {e}");
                return;
            }
        };
        self.stats.accepted += 1;

        if packet.header.time.is_none() {
            self.stats.bad_timestamps += 1;
            warn!("datagram from {source} has an out-of-range header time, using wall clock");
        }

        let now = Local::now();
        for record in &packet.records {
            if record.empty {
                self.stats.empty_records += 1;
                continue;
            }
            self.stats.records += 1;

            let depth = match decompress::expand(record, datagram, packet.header.time) {
                Ok(depth) => depth,
                Err(e) => {
                    self.stats.decompress_errors += 1;
                    debug!("dropped record token {}: {e}", record.token);
                    continue;
                }
            };

            match self.normalizer.normalize(&depth, now) {
                Some(quote) => {
                    self.sink.save(&quote, now);
                    self.stats.quotes += 1;
                }
                None => self.stats.quotes_dropped += 1,
            }
        }
    }

    fn count_drop(&mut self, error: &DecodeError) {
        match error {
            DecodeError::BadLeadingBytes => self.stats.dropped_bad_lead += 1,
            DecodeError::Truncated(_) | DecodeError::LengthMismatch { .. } => {
                self.stats.dropped_length += 1;
            }
            DecodeError::UnsupportedFormat(_) => self.stats.dropped_format += 1,
            DecodeError::UnsupportedType(_) => self.stats.dropped_type += 1,
        }
    }

    /// Counter snapshot with the normalizer/sink-owned counters filled in.
    pub fn snapshot(&self) -> FeedStats {
        let mut stats = self.stats;
        stats.unknown_tokens = self.normalizer.unknown_tokens();
        stats.sink_errors = self.sink.write_errors();
        stats
    }

    /// Flush the sink and log the final statistics snapshot.
    pub fn finish(&mut self) {
        self.sink.flush();
        info!("final stats: {}", self.snapshot());
    }
}
