//! # Alexandria Indexer Runtime
//!
//! Wires the protocol crate to a ledger node and an output stream.
//!
//! ## Modular Structure
//!
//! - `container/` - Configuration and service construction
//! - `adapters/` - JSON-RPC ledger client and JSON-lines record sink
//! - `runtime` - The per-transaction loop
//!
//! ## Data Flow
//!
//! ```text
//! stdin (JSON lines) ──→ IndexerRuntime ──→ ProtocolService ──→ JsonLinesSink ──→ stdout
//!                                               │
//!                                               ↓
//!                                         JsonRpcLedger ──→ ledger node
//! ```

pub mod adapters;
pub mod container;
pub mod runtime;

pub use container::{build_service, ConfigError, IndexerConfig, RpcConfig};
pub use runtime::{IndexerRuntime, RunSummary};
