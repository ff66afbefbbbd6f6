//! # Value Objects
//!
//! Protocol literals shared by the envelope decoder and the multipart grammar.

/// Root key of a media announcement envelope.
pub const MEDIA_ROOT_KEY: &str = "alexandria-media";

/// Root key of a publisher announcement envelope.
pub const PUBLISHER_ROOT_KEY: &str = "alexandria-publisher";

/// Top-level key carrying the address signature.
pub const SIGNATURE_KEY: &str = "signature";

/// Prefix of a multipart chunk comment.
pub const MULTIPART_PREFIX: &str = "alexandria-media-multipart(";

/// Reference carried by part 0, which cannot know its own transaction id yet.
pub const SENTINEL_REFERENCE: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Length of a hex transaction id / multipart reference.
pub const REFERENCE_LEN: usize = 64;

/// Length of a ledger address in the multipart grammar.
pub const ADDRESS_LEN: usize = 34;

/// Returns `true` if `value` is a 64-character hex transaction id.
pub fn is_hex_reference(value: &str) -> bool {
    value.len() == REFERENCE_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}
