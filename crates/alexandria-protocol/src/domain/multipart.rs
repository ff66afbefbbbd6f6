//! # Multipart Grammar
//!
//! Fixed-offset, case-sensitive ASCII grammar of a multipart chunk comment:
//!
//! ```text
//! alexandria-media-multipart(<part>,<max>,<address>,<reference>,<signature>):<data>
//! ```
//!
//! Byte offsets once the prefix is stripped:
//!
//! | Offset | Width | Field |
//! |--------|-------|-------|
//! | 0 | 1 | `part` (decimal digit) |
//! | 1 | 1 | `,` |
//! | 2 | 1 | `max` (decimal digit) |
//! | 3 | 1 | `,` |
//! | 4 | 34 | `address` |
//! | 38 | 1 | `,` |
//! | 39 | 64 | `reference` (hex, sentinel for part 0) |
//! | 103 | 1 | `,` |
//! | 104 | .. | `signature`, up to the first `):` |
//! | .. | .. | `data`, everything after `):` |
//!
//! ## Security
//!
//! Comments are attacker-controlled ledger data. Total length is checked
//! before any field is read and every window is taken with checked access,
//! so short or non-ASCII input becomes an error, never a panic.

use super::entities::{MultipartChunk, TxId};
use super::errors::ProtocolError;
use super::preimage::chunk_preimage;
use super::value_objects::{
    is_hex_reference, ADDRESS_LEN, MULTIPART_PREFIX, REFERENCE_LEN, SENTINEL_REFERENCE,
};

pub const PART_OFFSET: usize = 0;
pub const MAX_OFFSET: usize = 2;
pub const ADDRESS_OFFSET: usize = 4;
pub const REFERENCE_OFFSET: usize = ADDRESS_OFFSET + ADDRESS_LEN + 1;
pub const SIGNATURE_OFFSET: usize = REFERENCE_OFFSET + REFERENCE_LEN + 1;

/// Offsets of the fixed commas.
pub const SEPARATOR_OFFSETS: [usize; 4] = [1, 3, REFERENCE_OFFSET - 1, SIGNATURE_OFFSET - 1];

/// Ends the signature and starts the data.
pub const TERMINATOR: &str = "):";

/// Minimum length after the prefix: fixed header, a two-character signature
/// and the terminator.
pub const MIN_MULTIPART_LEN: usize = SIGNATURE_OFFSET + 2 + TERMINATOR.len();

/// The fixed-offset part of a chunk comment.
///
/// Produced by [`parse_header`]; borrows from the comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultipartHeader<'a> {
    pub part: u8,
    pub max: u8,
    pub address: &'a str,
    /// Reference as written in the comment (the sentinel for part 0).
    pub reference: &'a str,
    tail: &'a str,
}

/// Parse the prefix, length, part/max digits, separators and the address and
/// reference windows.
///
/// The signature and data are split off separately by
/// [`MultipartHeader::split_body`], so that the address can be checked
/// against the ledger first.
pub fn parse_header(comment: &str) -> Result<MultipartHeader<'_>, ProtocolError> {
    let rest = comment
        .strip_prefix(MULTIPART_PREFIX)
        .ok_or(ProtocolError::WrongPrefix)?;
    let bytes = rest.as_bytes();

    if bytes.len() < MIN_MULTIPART_LEN {
        return Err(ProtocolError::TruncatedMultipart {
            len: bytes.len(),
            minimum: MIN_MULTIPART_LEN,
        });
    }

    let part = digit_at(bytes, PART_OFFSET)?;
    let max = digit_at(bytes, MAX_OFFSET)?;

    for offset in SEPARATOR_OFFSETS {
        if bytes.get(offset) != Some(&b',') {
            return Err(ProtocolError::MalformedSeparator { offset });
        }
    }

    // Every window below starts right after an ASCII comma, so the checked
    // slices can only fail on a length shortfall.
    let address = window(rest, ADDRESS_OFFSET, ADDRESS_LEN)?;
    let reference = window(rest, REFERENCE_OFFSET, REFERENCE_LEN)?;
    let tail = rest
        .get(SIGNATURE_OFFSET..)
        .ok_or(ProtocolError::MalformedTerminator)?;

    Ok(MultipartHeader {
        part,
        max,
        address,
        reference,
        tail,
    })
}

fn digit_at(bytes: &[u8], offset: usize) -> Result<u8, ProtocolError> {
    match bytes.get(offset) {
        Some(b) if b.is_ascii_digit() => Ok(b - b'0'),
        _ => Err(ProtocolError::BadPartIndex { offset }),
    }
}

fn window(rest: &str, offset: usize, len: usize) -> Result<&str, ProtocolError> {
    rest.get(offset..offset + len)
        .ok_or(ProtocolError::TruncatedMultipart {
            len: rest.len(),
            minimum: MIN_MULTIPART_LEN,
        })
}

impl<'a> MultipartHeader<'a> {
    /// Split the remainder into `(signature, data)` at the first `"):"`.
    ///
    /// An empty signature counts as a misplaced terminator.
    pub fn split_body(&self) -> Result<(&'a str, &'a str), ProtocolError> {
        let end = self
            .tail
            .find(TERMINATOR)
            .ok_or(ProtocolError::MalformedTerminator)?;
        if end == 0 {
            return Err(ProtocolError::MalformedTerminator);
        }

        let signature = &self.tail[..end];
        let data = &self.tail[end + TERMINATOR.len()..];
        Ok((signature, data))
    }

    /// The string this chunk's signature must cover.
    pub fn preimage(&self, data: &str) -> String {
        chunk_preimage(self.part, self.max, self.address, self.reference, data)
    }

    /// The reference this chunk is filed under.
    ///
    /// Part 0 must carry the sentinel and is filed under its own transaction
    /// id. Any other part must name a 64-hex transaction id.
    pub fn resolve_reference(&self, txid: &str) -> Result<TxId, ProtocolError> {
        if self.part == 0 {
            if self.reference != SENTINEL_REFERENCE {
                return Err(ProtocolError::BadSentinelReference {
                    reference: self.reference.to_string(),
                });
            }
            return Ok(txid.to_string());
        }

        if !is_hex_reference(self.reference) || self.reference == SENTINEL_REFERENCE {
            return Err(ProtocolError::InvalidReference {
                reference: self.reference.to_string(),
            });
        }
        Ok(self.reference.to_string())
    }

    /// Build the chunk once the signature has been authenticated.
    pub fn into_chunk(
        self,
        signature: &str,
        data: &str,
        txid: &str,
        block_height: u64,
    ) -> Result<MultipartChunk, ProtocolError> {
        let reference = self.resolve_reference(txid)?;
        Ok(MultipartChunk {
            part: self.part,
            max: self.max,
            reference,
            address: self.address.to_string(),
            signature: signature.to_string(),
            data: data.to_string(),
            source_txid: txid.to_string(),
            source_block_height: block_height,
        })
    }
}
