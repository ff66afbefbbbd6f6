//! # Schema Validation
//!
//! Field-level rules for decoded drafts. Rules run in a fixed order and stop
//! at the first violation.
//!
//! The optional-payment protocol variant is enforced: `info.size` and
//! `payment` may be absent and are not range-checked.

use super::entities::{MediaDraft, PublisherDraft};
use super::errors::ProtocolError;

/// Validate a media draft.
///
/// Order: `torrent` (> 1 char), `publisher` (non-empty), `timestamp` (> 0),
/// `type` (> 1 char), `info.title`, `info.description` (non-empty),
/// `info.year` (> 0).
pub fn validate_media(draft: &MediaDraft) -> Result<(), ProtocolError> {
    if draft.torrent_hash.len() <= 1 {
        return Err(ProtocolError::InvalidField("torrent"));
    }
    if draft.publisher_address.is_empty() {
        return Err(ProtocolError::InvalidField("publisher"));
    }
    if draft.timestamp <= 0 {
        return Err(ProtocolError::InvalidField("timestamp"));
    }
    if draft.record_type.len() <= 1 {
        return Err(ProtocolError::InvalidField("type"));
    }
    if draft.title.is_empty() {
        return Err(ProtocolError::InvalidField("info.title"));
    }
    if draft.description.is_empty() {
        return Err(ProtocolError::InvalidField("info.description"));
    }
    if draft.year <= 0 {
        return Err(ProtocolError::InvalidField("info.year"));
    }
    Ok(())
}

/// Validate a publisher draft: `name`, `address` non-empty, `timestamp` > 0.
pub fn validate_publisher(draft: &PublisherDraft) -> Result<(), ProtocolError> {
    if draft.name.is_empty() {
        return Err(ProtocolError::InvalidField("name"));
    }
    if draft.address.is_empty() {
        return Err(ProtocolError::InvalidField("address"));
    }
    if draft.timestamp <= 0 {
        return Err(ProtocolError::InvalidField("timestamp"));
    }
    Ok(())
}
