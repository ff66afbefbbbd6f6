//! # Inbound Ports (Driving Ports / API)
//!
//! The verification API the indexer drives.

use crate::domain::assembler::{ChunkDisposition, CompletedAssembly};
use crate::domain::entities::{
    LedgerTransaction, MediaDraft, MultipartChunk, PublisherDraft, TransactionOutcome,
};
use crate::domain::errors::ProtocolError;

/// Primary record verification API.
///
/// Single-document and chunk verification are stateless and may run
/// concurrently. The chunk methods share one reassembly buffer.
#[async_trait::async_trait]
pub trait RecordVerificationApi: Send + Sync {
    // =========================================================================
    // Single documents
    // =========================================================================

    /// Decode, schema-check and authenticate an `alexandria-media` envelope.
    async fn verify_media(&self, bytes: &[u8]) -> Result<MediaDraft, ProtocolError>;

    /// Decode, schema-check and authenticate an `alexandria-publisher` envelope.
    async fn verify_publisher(&self, bytes: &[u8]) -> Result<PublisherDraft, ProtocolError>;

    // =========================================================================
    // Multipart
    // =========================================================================

    /// Parse and authenticate one multipart chunk comment.
    ///
    /// # Errors
    /// In check order: `WrongPrefix`, `TruncatedMultipart`, `BadPartIndex`,
    /// `MalformedSeparator`, `InvalidAddress`, `MalformedTerminator`,
    /// `SignatureMismatch`, then `BadSentinelReference` or `InvalidReference`.
    async fn parse_multipart(
        &self,
        comment: &str,
        txid: &str,
        block_height: u64,
    ) -> Result<MultipartChunk, ProtocolError>;

    /// File a chunk under its reference.
    fn add_chunk(&self, chunk: MultipartChunk) -> Result<ChunkDisposition, ProtocolError>;

    /// The concatenated payload of a complete, non-corrupt reference, at most once.
    fn try_complete(&self, reference: &str) -> Option<Vec<u8>>;

    /// `add_chunk` followed by completion, observed atomically.
    fn ingest_chunk(
        &self,
        chunk: MultipartChunk,
    ) -> Result<(ChunkDisposition, Option<CompletedAssembly>), ProtocolError>;

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Route one ledger transaction by its comment and persist what verifies.
    async fn process_transaction(
        &self,
        tx: &LedgerTransaction,
    ) -> Result<TransactionOutcome, ProtocolError>;
}
