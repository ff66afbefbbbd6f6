//! # Multipart Assembly Buffer
//!
//! Keyed collection of live assemblies plus the references that have already
//! completed or been found corrupt. The buffer itself is not synchronised;
//! the service owns it behind a mutex so that `add_chunk` and `take_complete`
//! for one reference are observed together.

use super::config::AssemblyConfig;
use super::pending::PendingAssembly;
use super::{ChunkDisposition, CompletedAssembly};
use crate::domain::entities::{MultipartChunk, TxId};
use crate::domain::errors::ProtocolError;
use std::collections::{HashMap, HashSet};

/// Buffer for reassembling multipart payloads.
///
/// ## Security
///
/// - Stale assemblies are purged by [`Self::gc_stale`] after `max_age_blocks`
/// - The number of live assemblies is bounded by [`Self::enforce_max_pending`]
/// - A corrupt reference stays excluded even after its chunks are purged;
///   only the reference itself is remembered
///
/// The completed and corrupt reference sets are not bounded.
pub struct MultipartAssemblyBuffer {
    /// Live assemblies keyed by reference.
    pending: HashMap<TxId, PendingAssembly>,
    /// References already emitted.
    completed: HashSet<TxId>,
    /// References permanently excluded from completion.
    corrupt: HashSet<TxId>,
    config: AssemblyConfig,
}

impl MultipartAssemblyBuffer {
    /// Create a new assembly buffer with the given configuration.
    pub fn new(config: AssemblyConfig) -> Self {
        Self {
            pending: HashMap::new(),
            completed: HashSet::new(),
            corrupt: HashSet::new(),
            config,
        }
    }

    /// Create a new assembly buffer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(AssemblyConfig::default())
    }

    /// File a chunk under its reference.
    ///
    /// Fails with `TooManyParts` the first time an assembly sees more records
    /// than `max + 1`, a part beyond `max`, or a `max` that disagrees with the
    /// first chunk's. The chunks already held are kept and the reference is
    /// excluded from completion from then on; later chunks for it come back
    /// as [`ChunkDisposition::Quarantined`].
    pub fn add_chunk(&mut self, chunk: MultipartChunk) -> Result<ChunkDisposition, ProtocolError> {
        if self.completed.contains(&chunk.reference) {
            return Ok(ChunkDisposition::AlreadyCompleted);
        }

        let reference = chunk.reference.clone();
        if self.corrupt.contains(&reference) && !self.pending.contains_key(&reference) {
            return Ok(ChunkDisposition::Quarantined);
        }

        let assembly = self.pending.entry(reference.clone()).or_insert_with(|| {
            PendingAssembly::new(reference.clone(), chunk.max, chunk.source_block_height)
        });

        if assembly.contains(chunk.part, &chunk.source_txid) {
            return Ok(ChunkDisposition::Duplicate);
        }

        let conflicting = chunk.max != assembly.max || chunk.part > assembly.max;
        assembly.push(chunk);

        if assembly.corrupt {
            return Ok(ChunkDisposition::Quarantined);
        }

        if conflicting || assembly.observed() > assembly.expected() {
            assembly.corrupt = true;
            let err = ProtocolError::TooManyParts {
                reference: reference.clone(),
                max: assembly.max,
                observed: assembly.observed(),
            };
            self.corrupt.insert(reference);
            return Err(err);
        }

        Ok(ChunkDisposition::Accepted)
    }

    /// Check if an assembly is complete (parts `0..=max` each present once).
    pub fn is_complete(&self, reference: &str) -> bool {
        self.pending
            .get(reference)
            .map(|a| a.is_complete())
            .unwrap_or(false)
    }

    /// Whether the reference has been excluded from completion.
    pub fn is_corrupt(&self, reference: &str) -> bool {
        self.corrupt.contains(reference)
    }

    /// Whether the reference has already been emitted.
    pub fn is_completed(&self, reference: &str) -> bool {
        self.completed.contains(reference)
    }

    /// Get a reference to a live assembly.
    pub fn get(&self, reference: &str) -> Option<&PendingAssembly> {
        self.pending.get(reference)
    }

    /// Remove and return a complete assembly.
    ///
    /// Returns `None` while parts are missing, for corrupt references, and on
    /// every call after the one that emitted the payload.
    pub fn take_complete(&mut self, reference: &str) -> Option<CompletedAssembly> {
        let assembly = self.pending.get(reference)?;
        let data = assembly.assemble()?;
        let block_height = assembly.last_height();

        self.pending.remove(reference);
        self.completed.insert(reference.to_string());

        Some(CompletedAssembly {
            reference: reference.to_string(),
            data,
            block_height,
        })
    }

    /// The concatenated payload once complete, `None` otherwise.
    pub fn try_complete(&mut self, reference: &str) -> Option<Vec<u8>> {
        self.take_complete(reference).map(|c| c.data)
    }

    /// Drop chunks mined above `height` after a ledger reorganisation.
    ///
    /// Assemblies left without chunks are removed unless corrupt. Returns the
    /// references that lost chunks. Already-emitted payloads are not revoked.
    pub fn rollback_above(&mut self, height: u64) -> Vec<TxId> {
        let mut affected = Vec::new();
        for (reference, assembly) in self.pending.iter_mut() {
            if assembly.retain_up_to(height) {
                affected.push(reference.clone());
            }
        }

        self.pending.retain(|_, a| a.corrupt || a.observed() > 0);
        affected.sort();
        affected
    }

    /// Purge assemblies whose first chunk is more than `max_age_blocks` below
    /// `current_height`.
    ///
    /// Returns the purged references.
    pub fn gc_stale(&mut self, current_height: u64) -> Vec<TxId> {
        let max_age = self.config.max_age_blocks;
        let mut stale: Vec<TxId> = self
            .pending
            .iter()
            .filter(|(_, a)| a.is_stale(current_height, max_age))
            .map(|(r, _)| r.clone())
            .collect();
        stale.sort();

        for reference in &stale {
            self.pending.remove(reference);
        }

        stale
    }

    /// Enforce the maximum live assemblies limit.
    ///
    /// Purges the oldest assemblies (lowest first-seen height) if the limit is
    /// exceeded. Returns the purged references.
    pub fn enforce_max_pending(&mut self) -> Vec<TxId> {
        if self.pending.len() <= self.config.max_pending_assemblies {
            return vec![];
        }

        let mut entries: Vec<_> = self
            .pending
            .iter()
            .map(|(r, a)| (a.first_seen_height, r.clone()))
            .collect();
        entries.sort();

        let to_remove = self.pending.len() - self.config.max_pending_assemblies;
        let purged: Vec<TxId> = entries
            .into_iter()
            .take(to_remove)
            .map(|(_, r)| r)
            .collect();

        for reference in &purged {
            self.pending.remove(reference);
        }

        purged
    }

    /// Get the number of live assemblies.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if the buffer holds no live assemblies.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
