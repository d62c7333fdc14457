//! Logging initialization for the feed handler.
//!
//! Console output is human-readable; the optional file output is daily-rotated
//! **JSON lines**, mirroring the sink's rotation scheme so a day's log file
//! sits next to a day's quote files. File writes go through a non-blocking
//! worker so a slow disk cannot stall the receive loop; the returned guard
//! must be held for the lifetime of the process or buffered lines are lost on
//! exit.
//!
//! The level string comes from the config (or the CLI override) and is
//! validated here: an unparseable level is a configuration error, which is
//! fatal at startup like any other. `RUST_LOG`, when set, wins over both.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber. Call once at program start.
///
/// Returns the file writer's guard when `log_dir` is set; drop it only at
/// process exit.
pub fn init_logging(log_level: &str, log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level)
            .map_err(|e| anyhow::anyhow!("invalid logging level {log_level:?}: {e}"))?,
    };

    let console_layer = fmt::layer().with_target(true).with_ansi(true);

    let guard = match log_dir {
        Some(dir) => {
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "nfcast.log"));
            let file_layer = fmt::layer().json().with_writer(writer).with_ansi(false);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .with(file_layer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(env_filter).with(console_layer).init();
            None
        }
    };

    Ok(guard)
}
