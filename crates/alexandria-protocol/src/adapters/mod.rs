//! # Adapters Module
//!
//! In-memory implementations of the outbound ports, for tests and for
//! embedders that supply their own verification data.

pub mod memory;

pub use memory::{InMemoryRecordStore, StaticLedger};
