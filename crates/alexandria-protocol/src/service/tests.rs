use super::*;
use crate::adapters::{InMemoryRecordStore, StaticLedger};
use crate::domain::preimage::chunk_preimage;
use crate::domain::value_objects::SENTINEL_REFERENCE;

const ADDRESS: &str = "FFbtpjAUQdNVnHyKyFLHYTxG5bX5PxcUAp";

fn media_doc(timestamp: i64) -> String {
    format!(
        r#"{{"alexandria-media":{{"torrent":"abc123","publisher":"FAddr1","timestamp":{timestamp},"type":"song","info":{{"title":"T","description":"D","year":2020}},"payment":{{"currency":"FLO","type":"flat","amount":1}}}},"signature":"SIGVALUE"}}"#
    )
}

fn publisher_doc() -> String {
    format!(
        r#"{{"alexandria-publisher":{{"name":"Joey","address":"{ADDRESS}","timestamp":1400000000,"emailmd5":"d41d8cd98f00b204e9800998ecf8427e"}},"signature":"PUBSIG"}}"#
    )
}

fn service() -> ProtocolService<StaticLedger, InMemoryRecordStore> {
    let ledger = StaticLedger::new()
        .with_address(ADDRESS)
        .with_signature("FAddr1", "SIGVALUE", "abc123-FAddr1-12345")
        .with_signature(ADDRESS, "PUBSIG", &format!("Joey-{ADDRESS}-1400000000"));
    ProtocolService::new(ledger, InMemoryRecordStore::new())
}

fn tx(txid: &str, block_height: u64, comment: &str) -> LedgerTransaction {
    LedgerTransaction {
        txid: txid.to_string(),
        block_height,
        comment: comment.to_string(),
    }
}

/// Build a chunk comment and register its signature with the ledger.
fn signed_chunk(ledger: &StaticLedger, part: u8, max: u8, reference: &str, data: &str) -> String {
    let signature = format!("CHUNKSIG{part}");
    ledger.register_signature(
        ADDRESS,
        &signature,
        &chunk_preimage(part, max, ADDRESS, reference, data),
    );
    format!("{MULTIPART_PREFIX}{part},{max},{ADDRESS},{reference},{signature}):{data}")
}

// =========================================================================
// Single documents
// =========================================================================

#[tokio::test]
async fn test_media_document_verifies() {
    let service = service();
    let draft = service.verify_media(media_doc(12345).as_bytes()).await.unwrap();

    assert_eq!(draft.torrent_hash, "abc123");
    assert_eq!(draft.publisher_address, "FAddr1");
    assert!(draft.payment.is_some());
    assert_eq!(service.ledger().verify_calls(), 1);
}

#[tokio::test]
async fn test_changed_timestamp_breaks_signature() {
    let service = service();
    let result = service.verify_media(media_doc(12346).as_bytes()).await;
    assert_eq!(
        result,
        Err(ProtocolError::SignatureMismatch {
            address: "FAddr1".into()
        })
    );
}

#[tokio::test]
async fn test_ledger_outage_is_not_verified() {
    let service = service();
    service.ledger().set_failing(true);

    let result = service.verify_media(media_doc(12345).as_bytes()).await;
    assert!(matches!(result, Err(ProtocolError::SignatureMismatch { .. })));
}

#[tokio::test]
async fn test_schema_runs_before_authentication() {
    let service = service();
    let doc = media_doc(12345).replace(r#""year":2020"#, r#""year":0"#);

    let result = service.verify_media(doc.as_bytes()).await;
    assert_eq!(result, Err(ProtocolError::InvalidField("info.year")));
    assert_eq!(service.ledger().verify_calls(), 0);
}

#[tokio::test]
async fn test_publisher_document_verifies() {
    let service = service();
    let draft = service
        .verify_publisher(publisher_doc().as_bytes())
        .await
        .unwrap();
    assert_eq!(draft.name, "Joey");
    assert_eq!(
        draft.email_hash.as_deref(),
        Some("d41d8cd98f00b204e9800998ecf8427e")
    );
}

#[tokio::test]
async fn test_kind_must_match_entry_point() {
    let service = service();
    let result = service.verify_publisher(media_doc(12345).as_bytes()).await;
    assert!(matches!(result, Err(ProtocolError::UnexpectedRootKey { .. })));
}

// =========================================================================
// Multipart parsing
// =========================================================================

#[tokio::test]
async fn test_partial_document_reassembles() {
    let service = service();
    let first_txid = "ab".repeat(32);

    let part0 = signed_chunk(service.ledger(), 0, 1, SENTINEL_REFERENCE, "{\"partial\":");
    let part1 = signed_chunk(service.ledger(), 1, 1, &first_txid, "true}");

    let chunk1 = service
        .parse_multipart(&part1, &"cd".repeat(32), 11)
        .await
        .unwrap();
    let chunk0 = service.parse_multipart(&part0, &first_txid, 10).await.unwrap();
    assert_eq!(chunk0.reference, first_txid);
    assert_eq!(chunk1.reference, first_txid);

    assert_eq!(service.add_chunk(chunk1), Ok(ChunkDisposition::Accepted));
    assert_eq!(service.try_complete(&first_txid), None);
    assert_eq!(service.add_chunk(chunk0), Ok(ChunkDisposition::Accepted));
    assert_eq!(
        service.try_complete(&first_txid),
        Some(b"{\"partial\":true}".to_vec())
    );
    assert_eq!(service.try_complete(&first_txid), None);
}

#[tokio::test]
async fn test_unknown_address_is_rejected_before_signature() {
    let service = ProtocolService::new(StaticLedger::new(), InMemoryRecordStore::new());
    let comment = format!("{MULTIPART_PREFIX}0,0,{ADDRESS},{SENTINEL_REFERENCE},SIG):data");

    let result = service.parse_multipart(&comment, "t", 1).await;
    assert_eq!(
        result,
        Err(ProtocolError::InvalidAddress {
            address: ADDRESS.into()
        })
    );
    assert_eq!(service.ledger().verify_calls(), 0);
}

#[tokio::test]
async fn test_chunk_signature_must_cover_data() {
    let service = service();
    let comment = signed_chunk(service.ledger(), 0, 0, SENTINEL_REFERENCE, "original");
    let tampered = comment.replace("original", "tampered");

    let result = service.parse_multipart(&tampered, "t", 1).await;
    assert!(matches!(result, Err(ProtocolError::SignatureMismatch { .. })));
}

#[tokio::test]
async fn test_sentinel_checked_after_signature() {
    let service = service();
    let reference = "ef".repeat(32);
    let comment = signed_chunk(service.ledger(), 0, 0, &reference, "data");

    let result = service.parse_multipart(&comment, "t", 1).await;
    assert_eq!(
        result,
        Err(ProtocolError::BadSentinelReference { reference })
    );
    assert_eq!(service.ledger().verify_calls(), 1);
}

// =========================================================================
// Transaction dispatch
// =========================================================================

#[tokio::test]
async fn test_plain_comment_is_ignored() {
    let service = service();
    let outcome = service
        .process_transaction(&tx("t", 1, "thanks for the fish"))
        .await
        .unwrap();
    assert_eq!(outcome, TransactionOutcome::Ignored);
    assert_eq!(service.ledger().verify_calls(), 0);
}

#[tokio::test]
async fn test_single_media_transaction_is_stored() {
    let service = service();
    let outcome = service
        .process_transaction(&tx("t1", 1_100_000, &media_doc(12345)))
        .await
        .unwrap();

    let TransactionOutcome::Recorded(record) = outcome else {
        panic!("expected a recorded outcome");
    };
    assert_eq!(record.kind(), RecordKind::Media);
    assert_eq!(record.txid(), "t1");

    let stored = service.store().media();
    assert_eq!(stored.len(), 1);
    assert!(!stored[0].multipart);
    assert_eq!(stored[0].block_height, 1_100_000);
    assert!(stored[0].payment.as_deref().unwrap().contains("FLO"));
    assert!(stored[0].extra_info.is_none());
}

#[tokio::test]
async fn test_single_publisher_transaction_is_stored() {
    let service = service();
    service
        .process_transaction(&tx("t2", 5, &publisher_doc()))
        .await
        .unwrap();

    let stored = service.store().publishers();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].draft.address, ADDRESS);
    assert_eq!(stored[0].txid, "t2");
}

#[tokio::test]
async fn test_store_failure_is_transport_error() {
    let service = service();
    service.store().set_failing(true);

    let result = service
        .process_transaction(&tx("t1", 1, &media_doc(12345)))
        .await;
    assert!(matches!(result, Err(ProtocolError::Transport(_))));
}

#[tokio::test]
async fn test_multipart_media_is_stored_under_reference() {
    let service = service();
    let doc = media_doc(12345);
    let (head, tail) = doc.split_at(doc.len() / 2);
    let first_txid = "ab".repeat(32);

    let part0 = signed_chunk(service.ledger(), 0, 1, SENTINEL_REFERENCE, head);
    let part1 = signed_chunk(service.ledger(), 1, 1, &first_txid, tail);

    let outcome = service
        .process_transaction(&tx(&first_txid, 100, &part0))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        TransactionOutcome::Chunk {
            reference: first_txid.clone(),
            part: 0,
            disposition: ChunkDisposition::Accepted,
        }
    );
    assert!(service.store().media().is_empty());

    let outcome = service
        .process_transaction(&tx(&"cd".repeat(32), 103, &part1))
        .await
        .unwrap();
    assert!(matches!(outcome, TransactionOutcome::Recorded(_)));

    let stored = service.store().media();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].multipart);
    assert_eq!(stored[0].txid, first_txid);
    assert_eq!(stored[0].block_height, 103);
    assert_eq!(service.pending_assemblies(), 0);
}

#[tokio::test]
async fn test_excess_parts_are_reported_once() {
    let service = service();
    let reference = "cd".repeat(32);

    let part0 = signed_chunk(service.ledger(), 0, 1, SENTINEL_REFERENCE, "x");
    service
        .process_transaction(&tx(&reference, 2, &part0))
        .await
        .unwrap();

    // Declares a different max than part 0 did.
    let conflicting = signed_chunk(service.ledger(), 1, 0, &reference, "y");
    let result = service
        .process_transaction(&tx(&"ee".repeat(32), 3, &conflicting))
        .await;
    assert!(matches!(result, Err(ProtocolError::TooManyParts { .. })));
    assert!(service.is_corrupt(&reference));

    let late = signed_chunk(service.ledger(), 1, 1, &reference, "z");
    let outcome = service
        .process_transaction(&tx(&"ff".repeat(32), 4, &late))
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        TransactionOutcome::Chunk {
            disposition: ChunkDisposition::Quarantined,
            ..
        }
    ));
    assert!(service.store().media().is_empty());
}

#[tokio::test]
async fn test_garbage_collection_and_rollback() {
    let ledger = StaticLedger::new().with_address(ADDRESS);
    let service = ProtocolService::with_config(
        ledger,
        InMemoryRecordStore::new(),
        AssemblyConfig::new(10, 100),
    );

    let a = "aa".repeat(32);
    let b = "bb".repeat(32);
    let part_a = signed_chunk(service.ledger(), 0, 1, SENTINEL_REFERENCE, "a");
    let part_b = signed_chunk(service.ledger(), 0, 2, SENTINEL_REFERENCE, "b");
    service.process_transaction(&tx(&a, 100, &part_a)).await.unwrap();
    service.process_transaction(&tx(&b, 105, &part_b)).await.unwrap();
    assert_eq!(service.pending_assemblies(), 2);

    assert_eq!(service.rollback_above(104), vec![b.clone()]);
    assert_eq!(service.pending_assemblies(), 1);

    assert!(service.collect_garbage(110).is_empty());
    assert_eq!(service.collect_garbage(111), vec![a]);
    assert_eq!(service.pending_assemblies(), 0);
}

// =========================================================================
// Concurrent reassembly
// =========================================================================

fn raw_chunk(reference: &str, part: u8, max: u8) -> MultipartChunk {
    MultipartChunk {
        part,
        max,
        reference: reference.to_string(),
        address: ADDRESS.into(),
        signature: format!("CHUNKSIG{part}"),
        data: part.to_string(),
        source_txid: format!("{reference}-{part}"),
        source_block_height: 10 + u64::from(part),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_deliveries_emit_payload_once() {
    for round in 0..100u32 {
        let service = std::sync::Arc::new(service());
        let reference = format!("{round:064x}");

        let mut handles = Vec::new();
        for _delivery in 0..2 {
            for part in 0..10u8 {
                let service = std::sync::Arc::clone(&service);
                let chunk = raw_chunk(&reference, part, 9);
                let reference = reference.clone();
                handles.push(tokio::spawn(async move {
                    let (_, completed) = service.ingest_chunk(chunk).unwrap();
                    let late = service.try_complete(&reference);
                    completed
                        .map(|c| c.data)
                        .into_iter()
                        .chain(late)
                        .collect::<Vec<_>>()
                }));
            }
        }

        let mut emitted = Vec::new();
        for handle in handles {
            emitted.extend(handle.await.unwrap());
        }

        assert_eq!(emitted.len(), 1, "round {round}");
        assert_eq!(emitted[0], b"0123456789".to_vec());
        assert_eq!(service.pending_assemblies(), 0);
    }
}
