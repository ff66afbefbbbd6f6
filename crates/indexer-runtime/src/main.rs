//! # Alexandria Indexer
//!
//! Reads ledger transactions as JSON lines on stdin, writes verified
//! announcements as JSON lines on stdout. Logs go to stderr.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging
//! 2. Load and validate configuration
//! 3. Build the ledger client, sink and protocol service
//! 4. Process input until end of file or Ctrl+C

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tracing::{info, warn};

use alexandria_telemetry::{init_logging, TelemetryConfig};
use indexer_runtime::{build_service, IndexerConfig, IndexerRuntime};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(&TelemetryConfig::from_env()).context("initializing logging")?;

    let config = IndexerConfig::from_env().context("loading configuration")?;
    let service = build_service(&config, std::io::stdout()).context("building service")?;
    info!(
        "[alx] indexing from block {} via {}",
        config.start_block,
        service.ledger().url()
    );

    let mut runtime = IndexerRuntime::new(service, config.start_block);
    let input = BufReader::new(tokio::io::stdin());

    tokio::select! {
        summary = runtime.run(input) => {
            let summary = summary?;
            info!(
                "[alx] done: {} lines, {} recorded, {} chunks, {} ignored, {} skipped, {} rejected",
                summary.lines,
                summary.recorded,
                summary.chunks,
                summary.ignored,
                summary.skipped,
                summary.rejected_total()
            );
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("[alx] interrupted, stopping");
        }
    }

    Ok(())
}
