//! # Protocol Service
//!
//! Application service layer that implements the `RecordVerificationApi` trait.
//!
//! ## Architecture
//!
//! This is the hexagonal "application service" that:
//! - Implements the inbound port (`RecordVerificationApi`)
//! - Uses the outbound ports (`LedgerVerifier`, `RecordStore`)
//! - Delegates decoding, schema rules, preimages, the grammar and reassembly
//!   to the domain layer
//!
//! ## Concurrency
//!
//! Verification holds no shared state. The reassembly buffer sits behind one
//! mutex that is never held across an await, so a chunk's `add_chunk` and
//! completion check are observed together and a payload is emitted once.

mod authenticator;

#[cfg(test)]
mod tests;

pub use authenticator::SignatureAuthenticator;

use crate::domain::assembler::{
    AssemblyConfig, ChunkDisposition, CompletedAssembly, MultipartAssemblyBuffer,
};
use crate::domain::entities::{
    LedgerTransaction, MediaDraft, MultipartChunk, PublisherDraft, RecordKind, TransactionOutcome,
    TxId, VerifiedRecord,
};
use crate::domain::envelope::Envelope;
use crate::domain::errors::ProtocolError;
use crate::domain::multipart::parse_header;
use crate::domain::preimage::{media_preimage, publisher_preimage};
use crate::domain::schema::{validate_media, validate_publisher};
use crate::domain::value_objects::MULTIPART_PREFIX;
use crate::ports::inbound::RecordVerificationApi;
use crate::ports::outbound::{LedgerVerifier, RecordStore, StoredMedia, StoredPublisher};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// Protocol verification service.
///
/// Generic over the ledger capability and the record store so that tests and
/// embedders can plug in their own.
pub struct ProtocolService<L: LedgerVerifier, S: RecordStore> {
    authenticator: SignatureAuthenticator<L>,
    store: S,
    assemblies: Mutex<MultipartAssemblyBuffer>,
}

impl<L: LedgerVerifier, S: RecordStore> ProtocolService<L, S> {
    /// Create a service with the default assembly configuration.
    pub fn new(ledger: L, store: S) -> Self {
        Self::with_config(ledger, store, AssemblyConfig::default())
    }

    /// Create a service with a custom assembly configuration.
    pub fn with_config(ledger: L, store: S, config: AssemblyConfig) -> Self {
        Self {
            authenticator: SignatureAuthenticator::new(ledger),
            store,
            assemblies: Mutex::new(MultipartAssemblyBuffer::new(config)),
        }
    }

    pub fn ledger(&self) -> &L {
        self.authenticator.ledger()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Number of live multipart assemblies.
    pub fn pending_assemblies(&self) -> usize {
        self.assemblies.lock().len()
    }

    /// Whether a reference has been excluded from completion.
    pub fn is_corrupt(&self, reference: &str) -> bool {
        self.assemblies.lock().is_corrupt(reference)
    }

    /// Drop chunks mined above `height` after a ledger reorganisation.
    pub fn rollback_above(&self, height: u64) -> Vec<TxId> {
        let affected = self.assemblies.lock().rollback_above(height);
        if !affected.is_empty() {
            info!(
                "[alx] reorg above height {} touched {} assemblies",
                height,
                affected.len()
            );
        }
        affected
    }

    /// Purge stale assemblies, then evict the oldest beyond the cap.
    ///
    /// Returns every purged reference.
    pub fn collect_garbage(&self, current_height: u64) -> Vec<TxId> {
        let mut assemblies = self.assemblies.lock();
        let mut purged = assemblies.gc_stale(current_height);
        purged.extend(assemblies.enforce_max_pending());
        drop(assemblies);

        for reference in &purged {
            debug!("[alx] dropped incomplete assembly {}", reference);
        }
        purged
    }

    // =========================================================================
    // Envelope verification
    // =========================================================================

    async fn authenticate_media(&self, envelope: Envelope) -> Result<MediaDraft, ProtocolError> {
        let draft = envelope.into_media()?;
        validate_media(&draft)?;
        self.authenticator
            .require(
                &draft.publisher_address,
                &draft.signature,
                &media_preimage(&draft),
            )
            .await?;
        Ok(draft)
    }

    async fn authenticate_publisher(
        &self,
        envelope: Envelope,
    ) -> Result<PublisherDraft, ProtocolError> {
        let draft = envelope.into_publisher()?;
        validate_publisher(&draft)?;
        self.authenticator
            .require(&draft.address, &draft.signature, &publisher_preimage(&draft))
            .await?;
        Ok(draft)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    async fn record_media(
        &self,
        draft: MediaDraft,
        txid: TxId,
        block_height: u64,
        multipart: bool,
    ) -> Result<VerifiedRecord, ProtocolError> {
        self.store
            .store_media(StoredMedia::new(
                draft.clone(),
                txid.clone(),
                block_height,
                multipart,
            ))
            .await
            .map_err(|e| ProtocolError::Transport(e.to_string()))?;

        info!(
            "[alx] media {} stored from {} at height {}",
            draft.torrent_hash, txid, block_height
        );
        Ok(VerifiedRecord::Media {
            draft,
            txid,
            block_height,
            multipart,
        })
    }

    async fn record_publisher(
        &self,
        draft: PublisherDraft,
        txid: TxId,
        block_height: u64,
    ) -> Result<VerifiedRecord, ProtocolError> {
        self.store
            .store_publisher(StoredPublisher {
                draft: draft.clone(),
                txid: txid.clone(),
                block_height,
            })
            .await
            .map_err(|e| ProtocolError::Transport(e.to_string()))?;

        info!(
            "[alx] publisher {} stored from {} at height {}",
            draft.address, txid, block_height
        );
        Ok(VerifiedRecord::Publisher {
            draft,
            txid,
            block_height,
        })
    }

    async fn process_chunk(
        &self,
        tx: &LedgerTransaction,
    ) -> Result<TransactionOutcome, ProtocolError> {
        let chunk = self
            .parse_multipart(&tx.comment, &tx.txid, tx.block_height)
            .await?;
        let reference = chunk.reference.clone();
        let part = chunk.part;

        let (disposition, completed) = self.ingest_chunk(chunk)?;
        let Some(assembly) = completed else {
            debug!(
                "[alx] chunk {} of {} is {:?}",
                part, reference, disposition
            );
            return Ok(TransactionOutcome::Chunk {
                reference,
                part,
                disposition,
            });
        };

        info!(
            "[alx] assembly {} complete ({} bytes)",
            assembly.reference,
            assembly.data.len()
        );
        let draft = self.verify_media(&assembly.data).await?;
        let record = self
            .record_media(draft, assembly.reference, assembly.block_height, true)
            .await?;
        Ok(TransactionOutcome::Recorded(record))
    }
}

#[async_trait::async_trait]
impl<L: LedgerVerifier, S: RecordStore> RecordVerificationApi for ProtocolService<L, S> {
    async fn verify_media(&self, bytes: &[u8]) -> Result<MediaDraft, ProtocolError> {
        let envelope = Envelope::decode_expecting(bytes, RecordKind::Media)?;
        self.authenticate_media(envelope).await
    }

    async fn verify_publisher(&self, bytes: &[u8]) -> Result<PublisherDraft, ProtocolError> {
        let envelope = Envelope::decode_expecting(bytes, RecordKind::Publisher)?;
        self.authenticate_publisher(envelope).await
    }

    async fn parse_multipart(
        &self,
        comment: &str,
        txid: &str,
        block_height: u64,
    ) -> Result<MultipartChunk, ProtocolError> {
        let header = parse_header(comment)?;

        if !self.authenticator.address_is_valid(header.address).await {
            return Err(ProtocolError::InvalidAddress {
                address: header.address.to_string(),
            });
        }

        let (signature, data) = header.split_body()?;
        self.authenticator
            .require(header.address, signature, &header.preimage(data))
            .await?;

        header.into_chunk(signature, data, txid, block_height)
    }

    fn add_chunk(&self, chunk: MultipartChunk) -> Result<ChunkDisposition, ProtocolError> {
        self.assemblies.lock().add_chunk(chunk).inspect_err(report_corruption)
    }

    fn try_complete(&self, reference: &str) -> Option<Vec<u8>> {
        self.assemblies.lock().try_complete(reference)
    }

    fn ingest_chunk(
        &self,
        chunk: MultipartChunk,
    ) -> Result<(ChunkDisposition, Option<CompletedAssembly>), ProtocolError> {
        let reference = chunk.reference.clone();
        let mut assemblies = self.assemblies.lock();

        let disposition = assemblies.add_chunk(chunk).inspect_err(report_corruption)?;
        let completed = match disposition {
            ChunkDisposition::Accepted => assemblies.take_complete(&reference),
            _ => None,
        };
        Ok((disposition, completed))
    }

    async fn process_transaction(
        &self,
        tx: &LedgerTransaction,
    ) -> Result<TransactionOutcome, ProtocolError> {
        if tx.comment.starts_with(MULTIPART_PREFIX) {
            return self.process_chunk(tx).await;
        }

        if !tx.comment.trim_start().starts_with('{') {
            return Ok(TransactionOutcome::Ignored);
        }

        let envelope = Envelope::decode(tx.comment.as_bytes())?;
        let record = match envelope.kind() {
            RecordKind::Media => {
                let draft = self.authenticate_media(envelope).await?;
                self.record_media(draft, tx.txid.clone(), tx.block_height, false)
                    .await?
            }
            RecordKind::Publisher => {
                let draft = self.authenticate_publisher(envelope).await?;
                self.record_publisher(draft, tx.txid.clone(), tx.block_height)
                    .await?
            }
        };
        Ok(TransactionOutcome::Recorded(record))
    }
}

fn report_corruption(err: &ProtocolError) {
    if let ProtocolError::TooManyParts {
        reference,
        max,
        observed,
    } = err
    {
        warn!(
            "[alx] assembly {} corrupt: {} records for max part {}, excluded from completion",
            reference, observed, max
        );
    }
}
