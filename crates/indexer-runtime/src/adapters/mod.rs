//! # Adapters
//!
//! Production implementations of the protocol crate's outbound ports.

pub mod ledger_rpc;
pub mod record_sink;

pub use ledger_rpc::JsonRpcLedger;
pub use record_sink::{JsonLinesSink, SinkRecord};
