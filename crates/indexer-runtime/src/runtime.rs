//! # Indexer Loop
//!
//! Feeds ledger transactions to the protocol service one at a time, in
//! ledger order, and keeps running totals.
//!
//! ## Per-transaction sequence
//!
//! 1. Skip anything below the start block
//! 2. If the height went backwards, treat it as a reorganisation and drop
//!    chunks mined above the new tip
//! 3. `process_transaction`
//! 4. Purge stale and excess assemblies

use std::collections::BTreeMap;

use alexandria_protocol::{
    LedgerTransaction, LedgerVerifier, ProtocolService, RecordStore, RecordVerificationApi,
    RejectReason, TransactionOutcome,
};
use alexandria_telemetry::log_record_event;
use anyhow::{Context, Result};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

/// Running totals for one indexer run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Input lines read, including unparseable ones.
    pub lines: usize,
    /// Lines that were not a ledger transaction.
    pub unparseable: usize,
    /// Transactions below the start block.
    pub skipped: usize,
    /// Transactions without an announcement.
    pub ignored: usize,
    /// Multipart chunks that did not complete an assembly.
    pub chunks: usize,
    /// Records handed to the store.
    pub recorded: usize,
    /// Rejected transactions by reason.
    pub rejected: BTreeMap<String, usize>,
    /// Ledger reorganisations observed.
    pub reorgs: usize,
}

impl RunSummary {
    fn reject(&mut self, reason: RejectReason) {
        let key = serde_json::to_value(reason)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("{reason:?}"));
        *self.rejected.entry(key).or_default() += 1;
    }

    /// Total rejected transactions.
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

/// Drives a [`ProtocolService`] over a stream of transactions.
pub struct IndexerRuntime<L: LedgerVerifier, S: RecordStore> {
    service: ProtocolService<L, S>,
    start_block: u64,
    tip: Option<u64>,
    summary: RunSummary,
}

impl<L: LedgerVerifier, S: RecordStore> IndexerRuntime<L, S> {
    pub fn new(service: ProtocolService<L, S>, start_block: u64) -> Self {
        Self {
            service,
            start_block,
            tip: None,
            summary: RunSummary::default(),
        }
    }

    pub fn service(&self) -> &ProtocolService<L, S> {
        &self.service
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Process one transaction.
    pub async fn handle(&mut self, tx: &LedgerTransaction) {
        if tx.block_height < self.start_block {
            self.summary.skipped += 1;
            return;
        }

        if let Some(tip) = self.tip {
            if tx.block_height < tip {
                self.summary.reorgs += 1;
                let affected = self
                    .service
                    .rollback_above(tx.block_height.saturating_sub(1));
                warn!(
                    "[alx] ledger rewound from {} to {}, {} assemblies affected",
                    tip,
                    tx.block_height,
                    affected.len()
                );
            }
        }
        self.tip = Some(tx.block_height);

        match self.service.process_transaction(tx).await {
            Ok(TransactionOutcome::Ignored) => self.summary.ignored += 1,
            Ok(TransactionOutcome::Chunk { .. }) => self.summary.chunks += 1,
            Ok(TransactionOutcome::Recorded(record)) => {
                log_record_event!(
                    debug,
                    "record indexed",
                    record.txid(),
                    tx.block_height,
                    kind = ?record.kind()
                );
                self.summary.recorded += 1;
            }
            Err(e) => {
                warn!(
                    "[alx] dropped {} at height {}: {}",
                    tx.txid, tx.block_height, e
                );
                self.summary.reject(e.reason());
            }
        }

        self.service.collect_garbage(tx.block_height);
    }

    /// Process one input line.
    pub async fn handle_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        self.summary.lines += 1;

        match serde_json::from_str::<LedgerTransaction>(line) {
            Ok(tx) => self.handle(&tx).await,
            Err(e) => {
                debug!("[alx] unparseable input line: {}", e);
                self.summary.unparseable += 1;
            }
        }
    }

    /// Process newline-delimited JSON transactions until end of input.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, reader: R) -> Result<RunSummary> {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await.context("reading input")? {
            self.handle_line(&line).await;
        }

        info!(
            "[alx] input exhausted: {} recorded, {} rejected, {} pending assemblies",
            self.summary.recorded,
            self.summary.rejected_total(),
            self.service.pending_assemblies()
        );
        Ok(self.summary.clone())
    }
}
