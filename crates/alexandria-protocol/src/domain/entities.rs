//! # Domain Entities
//!
//! Typed drafts of the two announcement kinds, multipart chunks, and the
//! outcomes handed back to the indexer.

use super::assembler::ChunkDisposition;
use super::value_objects::{MEDIA_ROOT_KEY, PUBLISHER_ROOT_KEY};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Hex transaction id as reported by the ledger.
pub type TxId = String;

// =============================================================================
// Ledger input
// =============================================================================

/// One ledger transaction as seen by the indexer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    /// Transaction id.
    pub txid: TxId,
    /// Height of the block that mined the transaction.
    pub block_height: u64,
    /// Free-text comment field.
    pub comment: String,
}

// =============================================================================
// Announcement drafts
// =============================================================================

/// The two announcement kinds, identified by their envelope root key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Media,
    Publisher,
}

impl RecordKind {
    /// Envelope root key for this kind.
    pub fn root_key(self) -> &'static str {
        match self {
            Self::Media => MEDIA_ROOT_KEY,
            Self::Publisher => PUBLISHER_ROOT_KEY,
        }
    }

    /// Kind named by an envelope root key.
    pub fn from_root_key(key: &str) -> Option<Self> {
        match key {
            MEDIA_ROOT_KEY => Some(Self::Media),
            PUBLISHER_ROOT_KEY => Some(Self::Publisher),
            _ => None,
        }
    }
}

/// A media announcement decoded from an `alexandria-media` envelope.
///
/// Constructed per verification call and never mutated once it passes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MediaDraft {
    /// Opaque content identifier (torrent info hash).
    pub torrent_hash: String,
    /// Address that signed the announcement.
    pub publisher_address: String,
    /// Seconds since epoch.
    pub timestamp: i64,
    /// Free-text category ("song", "movie", ...).
    pub record_type: String,
    pub title: String,
    pub description: String,
    pub year: i64,
    /// Optional payload size in bytes.
    pub size: Option<i64>,
    /// Opaque `info.extra-info` sub-document.
    pub extra_info: Option<Value>,
    /// Opaque `payment` sub-document.
    pub payment: Option<Value>,
    pub extras: Option<String>,
    /// Signature asserted by the envelope.
    pub signature: String,
}

impl MediaDraft {
    /// `payment` serialized for the persistence layer.
    pub fn payment_json(&self) -> Option<String> {
        self.payment.as_ref().map(Value::to_string)
    }

    /// `extra-info` serialized for the persistence layer.
    pub fn extra_info_json(&self) -> Option<String> {
        self.extra_info.as_ref().map(Value::to_string)
    }
}

/// A publisher announcement decoded from an `alexandria-publisher` envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PublisherDraft {
    pub name: String,
    pub address: String,
    pub timestamp: i64,
    /// MD5 of the publisher's e-mail address.
    pub email_hash: Option<String>,
    /// Secondary contact (Bitmessage address).
    pub alternate_contact: Option<String>,
    pub signature: String,
}

// =============================================================================
// Multipart
// =============================================================================

/// One transaction's contribution to a multipart assembly.
///
/// Created once per authenticated comment and never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipartChunk {
    /// 0-based index of this part.
    pub part: u8,
    /// 0-based highest part index of the assembly.
    pub max: u8,
    /// Assembly reference: the transaction id of part 0.
    pub reference: TxId,
    pub address: String,
    pub signature: String,
    /// Payload slice carried by this part.
    pub data: String,
    pub source_txid: TxId,
    pub source_block_height: u64,
}

// =============================================================================
// Outcomes
// =============================================================================

/// An announcement that passed every check.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VerifiedRecord {
    Media {
        draft: MediaDraft,
        txid: TxId,
        block_height: u64,
        /// Whether the record was reassembled from multipart chunks.
        multipart: bool,
    },
    Publisher {
        draft: PublisherDraft,
        txid: TxId,
        block_height: u64,
    },
}

impl VerifiedRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Media { .. } => RecordKind::Media,
            Self::Publisher { .. } => RecordKind::Publisher,
        }
    }

    pub fn txid(&self) -> &str {
        match self {
            Self::Media { txid, .. } | Self::Publisher { txid, .. } => txid,
        }
    }
}

/// What happened to one processed transaction.
#[derive(Clone, Debug, PartialEq)]
pub enum TransactionOutcome {
    /// The comment carries no announcement.
    Ignored,
    /// A multipart chunk was handed to the reassembly buffer.
    Chunk {
        reference: TxId,
        part: u8,
        disposition: ChunkDisposition,
    },
    /// A verified announcement was handed to the record store.
    Recorded(VerifiedRecord),
}
