//! # Ports Layer
//!
//! Trait definitions for the hexagonal architecture.
//! - **Inbound (Driving)**: API that the indexer calls
//! - **Outbound (Driven)**: the ledger and persistence capabilities this crate needs

pub mod inbound;
pub mod outbound;
