//! # Outbound Ports (Driven Ports / SPI)
//!
//! Capabilities this crate needs but does not implement: the ledger node that
//! checks address-held signatures, and persistence of verified records.

use crate::domain::entities::{MediaDraft, PublisherDraft, TxId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Ledger
// =============================================================================

/// Error from the ledger node.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The node could not be reached or answered with garbage.
    #[error("Ledger transport error: {0}")]
    Transport(String),

    /// The node answered with an RPC error object.
    #[error("Ledger RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
}

/// Result of an address validity query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressValidation {
    #[serde(rename = "isvalid")]
    pub is_valid: bool,
}

/// Signature and address checks performed by a ledger node.
///
/// Each call is an out-of-process round trip and may suspend for as long as
/// the node takes. Timeouts and retries are the implementation's concern.
#[async_trait::async_trait]
pub trait LedgerVerifier: Send + Sync {
    /// Whether `signature` is `address`'s signature over `message`.
    ///
    /// # Errors
    /// * `LedgerError::Transport` - the node is unreachable
    /// * `LedgerError::Rpc` - the node rejected the request
    async fn verify_message(
        &self,
        address: &str,
        signature: &str,
        message: &str,
    ) -> Result<bool, LedgerError>;

    /// Whether `address` is a well-formed address on this ledger.
    async fn validate_address(&self, address: &str) -> Result<AddressValidation, LedgerError>;
}

// =============================================================================
// Persistence
// =============================================================================

/// Error from the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store refused the record.
    #[error("Record rejected by store: {reason}")]
    Rejected { reason: String },

    /// Communication error
    #[error("Store I/O error: {0}")]
    Io(String),
}

/// A verified media record as handed to persistence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredMedia {
    pub draft: MediaDraft,
    pub txid: TxId,
    pub block_height: u64,
    pub multipart: bool,
    /// `payment` sub-document as JSON text.
    pub payment: Option<String>,
    /// `info.extra-info` sub-document as JSON text.
    pub extra_info: Option<String>,
}

impl StoredMedia {
    pub fn new(draft: MediaDraft, txid: TxId, block_height: u64, multipart: bool) -> Self {
        let payment = draft.payment_json();
        let extra_info = draft.extra_info_json();
        Self {
            draft,
            txid,
            block_height,
            multipart,
            payment,
            extra_info,
        }
    }
}

/// A verified publisher record as handed to persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredPublisher {
    pub draft: PublisherDraft,
    pub txid: TxId,
    pub block_height: u64,
}

/// Persistence of verified records.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a verified media record.
    async fn store_media(&self, record: StoredMedia) -> Result<(), StoreError>;

    /// Persist a verified publisher record.
    async fn store_publisher(&self, record: StoredPublisher) -> Result<(), StoreError>;
}
