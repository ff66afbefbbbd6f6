//! # Domain Layer
//!
//! Pure protocol logic with no I/O dependencies.
//! This is the inner layer of the hexagonal architecture.
//!
//! ## Modules
//!
//! - `envelope` - Single-pass decoding of the signed JSON envelope
//! - `schema` - Field-level rules for media and publisher drafts
//! - `preimage` - Canonical signed strings
//! - `multipart` - Fixed-offset multipart comment grammar
//! - `assembler` - Per-reference chunk reassembly
//! - `entities` - Drafts, chunks, and verification outcomes
//! - `value_objects` - Protocol literals
//! - `errors` - Domain error types

pub mod assembler;
pub mod entities;
pub mod envelope;
pub mod errors;
pub mod multipart;
pub mod preimage;
pub mod schema;
pub mod value_objects;
