//! # Signature Preimages
//!
//! The exact strings an address must have signed. Fields are joined with `-`
//! so that adjoining numeric and string fields cannot shift into each other.

use super::entities::{MediaDraft, PublisherDraft};

/// `torrent + "-" + publisher + "-" + timestamp`
pub fn media_preimage(draft: &MediaDraft) -> String {
    format!(
        "{}-{}-{}",
        draft.torrent_hash, draft.publisher_address, draft.timestamp
    )
}

/// `name + "-" + address + "-" + timestamp`
pub fn publisher_preimage(draft: &PublisherDraft) -> String {
    format!("{}-{}-{}", draft.name, draft.address, draft.timestamp)
}

/// `part + "-" + max + "-" + address + "-" + reference + "-" + data`
///
/// Part 0 signs against the sentinel reference, which is what its comment
/// carries, not the transaction id it is later filed under.
pub fn chunk_preimage(part: u8, max: u8, address: &str, reference: &str, data: &str) -> String {
    format!("{part}-{max}-{address}-{reference}-{data}")
}
