//! Fuzz target for the multipart comment grammar.
//!
//! Any comment, however short or oddly encoded, must come back as a value or
//! an error without panicking.
//!
//! ## Running
//!
//! ```bash
//! cd crates/alexandria-protocol
//! cargo +nightly fuzz run fuzz_multipart_header
//! ```

#![no_main]

use alexandria_protocol::{parse_header, MULTIPART_PREFIX};
use libfuzzer_sys::fuzz_target;

/// Fuzz input structure for the grammar parser.
#[derive(Debug, arbitrary::Arbitrary)]
struct CommentFuzzInput {
    /// Whether to prepend the multipart prefix.
    with_prefix: bool,
    /// Text after the prefix.
    tail: String,
    /// Transaction id the chunk would be filed under.
    txid: String,
}

fuzz_target!(|input: CommentFuzzInput| {
    let comment = if input.with_prefix {
        format!("{MULTIPART_PREFIX}{}", input.tail)
    } else {
        input.tail
    };

    let Ok(header) = parse_header(&comment) else {
        return;
    };
    assert!(header.part <= 9 && header.max <= 9);

    if let Ok((signature, data)) = header.split_body() {
        assert!(!signature.is_empty());
        let _ = header.preimage(data);
        let _ = header.into_chunk(signature, data, &input.txid, 0);
    }
});
