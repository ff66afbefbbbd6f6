//! # Protocol Errors
//!
//! Error types for envelope verification and multipart reassembly.
//!
//! Every variant carries enough context to log the offending record and skip
//! it. Nothing in this crate terminates the process on bad input.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while verifying an announcement or a chunk.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The bytes are not a well-formed envelope document.
    #[error("Malformed document: {reason}")]
    MalformedDocument { reason: String },

    /// A top-level key other than the expected root and `signature`.
    #[error("Unexpected root key: {key:?}")]
    UnexpectedRootKey { key: String },

    /// A schema rule failed for the named field.
    #[error("Invalid field: {0}")]
    InvalidField(&'static str),

    /// Two signature assertions in one document disagree.
    #[error("Asserted signature does not match the envelope signature")]
    SignatureFieldMismatch,

    /// The ledger did not confirm the signature over the preimage.
    #[error("Signature verification failed for address {address}")]
    SignatureMismatch { address: String },

    /// The comment does not start with the multipart prefix.
    #[error("Wrong prefix in transaction comment")]
    WrongPrefix,

    /// The comment is shorter than the fixed multipart header.
    #[error("Truncated multipart comment: {len} bytes after prefix, minimum {minimum}")]
    TruncatedMultipart { len: usize, minimum: usize },

    /// `part` or `max` is not a single decimal digit.
    #[error("Bad part index at offset {offset}")]
    BadPartIndex { offset: usize },

    /// A fixed comma of the multipart header is missing.
    #[error("Missing multipart separator at offset {offset}")]
    MalformedSeparator { offset: usize },

    /// The ledger does not recognise the chunk address.
    #[error("Invalid address: {address:?}")]
    InvalidAddress { address: String },

    /// No `"):"` terminator follows the signature.
    #[error("Missing or misplaced multipart terminator")]
    MalformedTerminator,

    /// Part 0 must carry the all-zero reference.
    #[error("Part 0 must carry the sentinel reference, got {reference:?}")]
    BadSentinelReference { reference: String },

    /// A part > 0 names something that cannot be a part 0 transaction id.
    #[error("Invalid multipart reference: {reference:?}")]
    InvalidReference { reference: String },

    /// More parts were observed than the assembly declared.
    #[error("Too many parts for reference {reference}: observed {observed}, declared max {max}")]
    TooManyParts {
        reference: String,
        max: u8,
        observed: usize,
    },

    /// An external capability failed.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ProtocolError {
    /// Shorthand for [`ProtocolError::MalformedDocument`].
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            reason: reason.into(),
        }
    }

    /// Stable reason code for operator reporting.
    pub fn reason(&self) -> RejectReason {
        RejectReason::from(self)
    }
}

/// Machine-readable reason code for a dropped record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MalformedDocument,
    UnexpectedRootKey,
    InvalidField,
    SignatureFieldMismatch,
    SignatureMismatch,
    WrongPrefix,
    TruncatedMultipart,
    BadPartIndex,
    MalformedSeparator,
    InvalidAddress,
    MalformedTerminator,
    BadSentinelReference,
    InvalidReference,
    TooManyParts,
    TransportError,
}

impl From<&ProtocolError> for RejectReason {
    fn from(err: &ProtocolError) -> Self {
        match err {
            ProtocolError::MalformedDocument { .. } => Self::MalformedDocument,
            ProtocolError::UnexpectedRootKey { .. } => Self::UnexpectedRootKey,
            ProtocolError::InvalidField(_) => Self::InvalidField,
            ProtocolError::SignatureFieldMismatch => Self::SignatureFieldMismatch,
            ProtocolError::SignatureMismatch { .. } => Self::SignatureMismatch,
            ProtocolError::WrongPrefix => Self::WrongPrefix,
            ProtocolError::TruncatedMultipart { .. } => Self::TruncatedMultipart,
            ProtocolError::BadPartIndex { .. } => Self::BadPartIndex,
            ProtocolError::MalformedSeparator { .. } => Self::MalformedSeparator,
            ProtocolError::InvalidAddress { .. } => Self::InvalidAddress,
            ProtocolError::MalformedTerminator => Self::MalformedTerminator,
            ProtocolError::BadSentinelReference { .. } => Self::BadSentinelReference,
            ProtocolError::InvalidReference { .. } => Self::InvalidReference,
            ProtocolError::TooManyParts { .. } => Self::TooManyParts,
            ProtocolError::Transport(_) => Self::TransportError,
        }
    }
}
