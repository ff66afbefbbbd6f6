//! # Pending Assembly
//!
//! Chunks received so far for one reference.

use crate::domain::entities::{MultipartChunk, TxId};

/// A partial multipart assembly awaiting its remaining parts.
#[derive(Debug, Clone)]
pub struct PendingAssembly {
    /// Reference (key for this assembly).
    pub reference: TxId,
    /// Highest part index, fixed by the first chunk received.
    pub max: u8,
    /// Lowest block height among the chunks, for ageing.
    pub first_seen_height: u64,
    /// Set once the assembly has seen an impossible part set. Never cleared.
    pub corrupt: bool,
    chunks: Vec<MultipartChunk>,
}

impl PendingAssembly {
    /// Create an empty assembly keyed by `reference`.
    pub fn new(reference: TxId, max: u8, first_seen_height: u64) -> Self {
        Self {
            reference,
            max,
            first_seen_height,
            corrupt: false,
            chunks: Vec::new(),
        }
    }

    /// Every distinct `(part, source_txid)` record received, in arrival order.
    pub fn chunks(&self) -> &[MultipartChunk] {
        &self.chunks
    }

    /// Number of distinct records received.
    pub fn observed(&self) -> usize {
        self.chunks.len()
    }

    /// Number of records a complete assembly holds.
    pub fn expected(&self) -> usize {
        usize::from(self.max) + 1
    }

    /// Whether this exact chunk was already received.
    pub fn contains(&self, part: u8, source_txid: &str) -> bool {
        self.chunks
            .iter()
            .any(|c| c.part == part && c.source_txid == source_txid)
    }

    pub(super) fn push(&mut self, chunk: MultipartChunk) {
        self.first_seen_height = self.first_seen_height.min(chunk.source_block_height);
        self.chunks.push(chunk);
    }

    /// Whether parts `0..=max` are each present exactly once.
    pub fn is_complete(&self) -> bool {
        if self.corrupt || self.observed() != self.expected() {
            return false;
        }
        (0..=self.max).all(|part| self.chunks.iter().filter(|c| c.part == part).count() == 1)
    }

    /// Concatenated data in part order, if complete.
    pub fn assemble(&self) -> Option<Vec<u8>> {
        if !self.is_complete() {
            return None;
        }

        let mut ordered: Vec<&MultipartChunk> = self.chunks.iter().collect();
        ordered.sort_by_key(|c| c.part);

        let mut data = Vec::with_capacity(ordered.iter().map(|c| c.data.len()).sum());
        for chunk in ordered {
            data.extend_from_slice(chunk.data.as_bytes());
        }
        Some(data)
    }

    /// Highest block height among the chunks.
    pub fn last_height(&self) -> u64 {
        self.chunks
            .iter()
            .map(|c| c.source_block_height)
            .max()
            .unwrap_or(self.first_seen_height)
    }

    /// Whether this assembly has waited longer than `max_age_blocks`.
    pub fn is_stale(&self, current_height: u64, max_age_blocks: u64) -> bool {
        current_height.saturating_sub(self.first_seen_height) > max_age_blocks
    }

    /// Drop chunks mined above `height`. Returns whether anything was dropped.
    pub(super) fn retain_up_to(&mut self, height: u64) -> bool {
        let before = self.chunks.len();
        self.chunks.retain(|c| c.source_block_height <= height);
        if let Some(lowest) = self.chunks.iter().map(|c| c.source_block_height).min() {
            self.first_seen_height = lowest;
        }
        self.chunks.len() != before
    }
}
