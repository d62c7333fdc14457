//! # nfcast-runner
//!
//! Main entry point for the BSE NFCAST feed handler.
//!
//! Loads a JSON configuration file and the contract master, joins the
//! multicast group, and runs the ingestion pipeline until interrupted.
//!
//! # Usage
//!
//! ```bash
//! nfcast-runner nfcast.json --log-level info
//! ```
//!
//! Exit code 0 on graceful shutdown; non-zero on fatal startup errors
//! (configuration, contract master, socket bind/join).

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::Parser;
use nfcast_core::contract::ContractMaster;
use nfcast_core::udp::FeedReceiver;
use nfcast_feed::pipeline::FeedPipeline;
use tracing::{info, warn};

/// BSE NFCAST Market Picture Feed Handler.
#[derive(Parser)]
#[command(name = "nfcast-runner", about = "BSE NFCAST Market Picture Feed Handler")]
struct Cli {
    /// Configuration file path (JSON).
    #[arg(default_value = "nfcast.json")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error). Overrides the config
    /// file's `logging_level`.
    #[arg(short, long)]
    log_level: Option<String>,

    /// Optional log directory for daily-rotated JSON file output.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load configuration, fatal before any socket work.
    let config = nfcast_core::config::load_config(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;

    // 2. Initialize logging (CLI flag wins over the config key). The guard
    //    keeps the non-blocking file writer alive until exit.
    let log_level = cli.log_level.as_deref().unwrap_or(config.effective_logging_level());
    let _log_guard =
        nfcast_core::logging::init_logging(log_level, cli.log_dir.as_deref()).context("initializing logging")?;
    info!("nfcast-runner starting — config={}, log_level={log_level}", cli.config.display());

    // 3. Load the contract master.
    let master = Arc::new(
        ContractMaster::load(&config.token_file)
            .with_context(|| format!("loading contract master {}", config.token_file.display()))?,
    );
    info!("contract master loaded — {} instruments", master.len());
    if master.is_empty() {
        warn!("contract master is empty; every quote will carry symbol=UNKNOWN");
    }

    // 4. Join the multicast group and assemble the pipeline.
    let mut receiver = FeedReceiver::bind(
        &config.multicast,
        config.buffer_size,
        config.effective_timeout(),
    )?;
    let mut pipeline = FeedPipeline::new(&config, master)?;

    // 5. Ctrl-C sets a flag that the run loop observes between receives;
    //    an already-received datagram is processed to completion.
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            flag.store(true, Ordering::Relaxed);
        }
    });

    // 6. Run until shutdown, then flush and report.
    let result = pipeline.run(&mut receiver, &shutdown).await;
    pipeline.finish();
    result?;

    info!("nfcast-runner stopped — goodbye");
    Ok(())
}
