//! # Container
//!
//! Configuration and wiring of the indexer's collaborators.

pub mod config;

pub use config::{ConfigError, IndexerConfig, RpcConfig};

use crate::adapters::{JsonLinesSink, JsonRpcLedger};
use alexandria_protocol::ProtocolService;
use std::io::Write;

/// Build the protocol service the binary runs: JSON-RPC ledger, JSON-lines output.
pub fn build_service<W: Write + Send>(
    config: &IndexerConfig,
    output: W,
) -> Result<ProtocolService<JsonRpcLedger, JsonLinesSink<W>>, ConfigError> {
    config.validate()?;
    let ledger = JsonRpcLedger::new(&config.rpc).map_err(|e| ConfigError::RpcClient(e.to_string()))?;
    Ok(ProtocolService::with_config(
        ledger,
        JsonLinesSink::new(output),
        config.assembly.clone(),
    ))
}
