//! # Alexandria Protocol Verification
//!
//! Validates signed "media" and "publisher" announcements embedded in the
//! comment field of ledger transactions, and reassembles announcements that
//! were split across several transactions.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): envelope decoding, schema rules, preimages,
//!   the multipart grammar and the reassembly buffer. No I/O.
//! - **Ports Layer** (`ports/`): the inbound verification API and the outbound
//!   ledger and persistence capabilities
//! - **Service Layer** (`service/`): wires the domain to the ports, owns the
//!   signature authenticator and the shared assembly buffer
//! - **Adapters Layer** (`adapters/`): in-memory capabilities for tests and
//!   embedders
//!
//! ## Control Flow
//!
//! ```text
//! tx comment ──multipart prefix──→ [Grammar Parser] ──chunk──→ [Reassembly Buffer]
//!      │                                                          │ complete
//!      │                                                          ↓
//!      └────────────── "{...}" ──────────────→ [Envelope] → [Schema] → [Preimage] → [Authenticator]
//!                                                                                        │
//!                                                                                        ↓
//!                                                                                  RecordStore
//! ```
//!
//! ## Security Notes
//!
//! - Comment bytes are attacker-controlled: every grammar window is bounds
//!   checked before it is sliced
//! - Ledger failures never verify a record; they are logged and treated as
//!   "not verified"
//! - A multipart reference that sees more parts than it declared is
//!   quarantined for good

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::{InMemoryRecordStore, StaticLedger};
pub use domain::assembler::{
    AssemblyConfig, ChunkDisposition, CompletedAssembly, MultipartAssemblyBuffer, PendingAssembly,
};
pub use domain::entities::{
    LedgerTransaction, MediaDraft, MultipartChunk, PublisherDraft, RecordKind,
    TransactionOutcome, TxId, VerifiedRecord,
};
pub use domain::envelope::Envelope;
pub use domain::errors::{ProtocolError, RejectReason};
pub use domain::multipart::{parse_header, MultipartHeader};
pub use domain::value_objects::{
    MEDIA_ROOT_KEY, MULTIPART_PREFIX, PUBLISHER_ROOT_KEY, SENTINEL_REFERENCE, SIGNATURE_KEY,
};
pub use ports::inbound::RecordVerificationApi;
pub use ports::outbound::{
    AddressValidation, LedgerError, LedgerVerifier, RecordStore, StoreError, StoredMedia,
    StoredPublisher,
};
pub use service::{ProtocolService, SignatureAuthenticator};
