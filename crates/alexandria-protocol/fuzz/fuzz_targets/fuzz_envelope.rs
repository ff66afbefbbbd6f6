//! Fuzz target for envelope decoding.
//!
//! Decoding and schema checks must never panic, and a decode must be
//! deterministic.

#![no_main]

use alexandria_protocol::domain::schema::{validate_media, validate_publisher};
use alexandria_protocol::{Envelope, RecordKind};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let first = Envelope::decode(data);
    let second = Envelope::decode(data);
    assert_eq!(first, second);

    let Ok(envelope) = first else {
        return;
    };

    match envelope.kind() {
        RecordKind::Media => {
            if let Ok(draft) = envelope.into_media() {
                let _ = validate_media(&draft);
            }
        }
        RecordKind::Publisher => {
            if let Ok(draft) = envelope.into_publisher() {
                let _ = validate_publisher(&draft);
            }
        }
    }
});
