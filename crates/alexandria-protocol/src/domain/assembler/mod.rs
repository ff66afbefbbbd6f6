//! # Reassembly Tracker
//!
//! Accumulates multipart chunks per reference and decides when an assembly
//! is whole.
//!
//! ## Lifecycle
//!
//! 1. The first chunk for a reference opens a [`PendingAssembly`] and fixes its `max`
//! 2. Chunks may arrive in any order and may be re-delivered
//! 3. Once parts `0..=max` are each present exactly once the assembly completes,
//!    is removed, and its reference is remembered so it is never emitted twice
//! 4. An assembly that observes more records than `max + 1` (or a conflicting
//!    `max`) is corrupt and never completes; its chunks stay only while the
//!    assembly is live
//!
//! Stale and excess assemblies are purged by [`MultipartAssemblyBuffer::gc_stale`]
//! and [`MultipartAssemblyBuffer::enforce_max_pending`]; when to call them is up
//! to the caller.
//!
//! ## Module Structure
//!
//! - `buffer` - MultipartAssemblyBuffer implementation
//! - `config` - AssemblyConfig configuration
//! - `pending` - PendingAssembly struct
//! - `security` - Configuration bounds

mod buffer;
mod config;
mod pending;
pub mod security;


use super::entities::TxId;
use serde::Serialize;

pub use buffer::MultipartAssemblyBuffer;
pub use config::AssemblyConfig;
pub use pending::PendingAssembly;

/// What the tracker did with a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkDisposition {
    /// Stored in a live assembly.
    Accepted,
    /// The same part from the same transaction was already stored.
    Duplicate,
    /// The reference was already assembled and emitted.
    AlreadyCompleted,
    /// The reference is corrupt. The chunk is held with the assembly while it
    /// is live, and dropped once the assembly has been purged.
    Quarantined,
}

/// A whole multipart payload, removed from the tracker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletedAssembly {
    pub reference: TxId,
    /// `data` of parts `0..=max`, concatenated in part order.
    pub data: Vec<u8>,
    /// Highest block height among the chunks.
    pub block_height: u64,
}
