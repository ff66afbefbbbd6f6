//! # Multipart Reassembly Properties
//!
//! A payload split into signed chunks and fed to the service in any order
//! comes back byte-for-byte once the last chunk lands, and not before.

use alexandria_protocol::domain::preimage::chunk_preimage;
use alexandria_protocol::{
    InMemoryRecordStore, ProtocolService, RecordVerificationApi, StaticLedger, MULTIPART_PREFIX,
    SENTINEL_REFERENCE,
};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

const ADDRESS: &str = "FFbtpjAUQdNVnHyKyFLHYTxG5bX5PxcUAp";

fn txid(part: u8) -> String {
    format!("{:064x}", u64::from(part) + 0xa1e0)
}

/// Payload plus a shuffled order of part indices `0..=max`.
fn payload_and_order() -> impl Strategy<Value = (String, Vec<u8>)> {
    ("[ -~]{1,160}", 0u8..=9).prop_flat_map(|(payload, max)| {
        let order: Vec<u8> = (0..=max).collect();
        (Just(payload), Just(order).prop_shuffle())
    })
}

/// Split ASCII `payload` into `parts` contiguous slices; short payloads give
/// empty slices.
fn split(payload: &str, parts: usize) -> Vec<&str> {
    let len = payload.len();
    (0..parts)
        .map(|i| &payload[len * i / parts..len * (i + 1) / parts])
        .collect()
}

fn roundtrip(payload: &str, order: &[u8]) -> Result<(), TestCaseError> {
    let max = (order.len() - 1) as u8;
    let slices = split(payload, order.len());
    let reference = txid(0);

    let ledger = StaticLedger::new().with_address(ADDRESS);
    let comments: Vec<String> = slices
        .iter()
        .enumerate()
        .map(|(part, data)| {
            let part = part as u8;
            let written = if part == 0 { SENTINEL_REFERENCE } else { reference.as_str() };
            let signature = format!("SIG{part}");
            ledger.register_signature(
                ADDRESS,
                &signature,
                &chunk_preimage(part, max, ADDRESS, written, data),
            );
            format!("{MULTIPART_PREFIX}{part},{max},{ADDRESS},{written},{signature}):{data}")
        })
        .collect();
    let service = ProtocolService::new(ledger, InMemoryRecordStore::new());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|e| TestCaseError::fail(e.to_string()))?;

    runtime.block_on(async {
        for (i, &part) in order.iter().enumerate() {
            let comment = &comments[usize::from(part)];
            let chunk = service
                .parse_multipart(comment, &txid(part), 1_100_000 + i as u64)
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(&chunk.reference, &reference);

            service
                .add_chunk(chunk)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;

            let completed = service.try_complete(&reference);
            if i + 1 < order.len() {
                prop_assert!(completed.is_none(), "completed after {} of {} parts", i + 1, order.len());
            } else {
                prop_assert_eq!(completed, Some(payload.as_bytes().to_vec()));
            }
        }

        prop_assert!(service.try_complete(&reference).is_none());
        Ok(())
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn any_arrival_order_reassembles_payload((payload, order) in payload_and_order()) {
        roundtrip(&payload, &order)?;
    }

    #[test]
    fn grammar_parser_never_panics(tail in "\\PC{0,200}") {
        let comment = format!("{MULTIPART_PREFIX}{tail}");
        let _ = alexandria_protocol::parse_header(&comment)
            .and_then(|header| header.split_body().map(|_| ()));
    }
}
