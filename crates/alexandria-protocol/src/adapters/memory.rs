//! # In-Memory Adapters
//!
//! - [`StaticLedger`]: a ledger stub that confirms only registered addresses
//!   and `(address, signature, message)` triples
//! - [`InMemoryRecordStore`]: collects stored records in memory

use crate::ports::outbound::{
    AddressValidation, LedgerError, LedgerVerifier, RecordStore, StoreError, StoredMedia,
    StoredPublisher,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

// =============================================================================
// Ledger
// =============================================================================

/// Ledger stub with a fixed set of valid addresses and signatures.
#[derive(Default)]
pub struct StaticLedger {
    addresses: RwLock<HashSet<String>>,
    signatures: RwLock<HashSet<(String, String, String)>>,
    failing: AtomicBool,
    verify_calls: AtomicUsize,
    validate_calls: AtomicUsize,
}

impl StaticLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Self::register_address`].
    pub fn with_address(self, address: &str) -> Self {
        self.register_address(address);
        self
    }

    /// Builder form of [`Self::register_signature`].
    pub fn with_signature(self, address: &str, signature: &str, message: &str) -> Self {
        self.register_signature(address, signature, message);
        self
    }

    pub fn register_address(&self, address: &str) {
        self.addresses.write().insert(address.to_string());
    }

    /// Accept `signature` by `address` over exactly `message`.
    pub fn register_signature(&self, address: &str, signature: &str, message: &str) {
        self.signatures.write().insert((
            address.to_string(),
            signature.to_string(),
            message.to_string(),
        ));
    }

    /// While set, every call fails with a transport error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `verify_message` calls so far.
    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    /// Number of `validate_address` calls so far.
    pub fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }

    fn check_reachable(&self) -> Result<(), LedgerError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LedgerError::Transport("ledger unreachable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerVerifier for StaticLedger {
    async fn verify_message(
        &self,
        address: &str,
        signature: &str,
        message: &str,
    ) -> Result<bool, LedgerError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;

        let key = (
            address.to_string(),
            signature.to_string(),
            message.to_string(),
        );
        Ok(self.signatures.read().contains(&key))
    }

    async fn validate_address(&self, address: &str) -> Result<AddressValidation, LedgerError> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;

        Ok(AddressValidation {
            is_valid: self.addresses.read().contains(address),
        })
    }
}

// =============================================================================
// Persistence
// =============================================================================

/// Record store that keeps everything in memory.
#[derive(Default)]
pub struct InMemoryRecordStore {
    media: RwLock<Vec<StoredMedia>>,
    publishers: RwLock<Vec<StoredPublisher>>,
    failing: AtomicBool,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored media records, in arrival order.
    pub fn media(&self) -> Vec<StoredMedia> {
        self.media.read().clone()
    }

    /// Stored publisher records, in arrival order.
    pub fn publishers(&self) -> Vec<StoredPublisher> {
        self.publishers.read().clone()
    }

    /// While set, every write fails.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Io("store unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn store_media(&self, record: StoredMedia) -> Result<(), StoreError> {
        self.check_writable()?;
        self.media.write().push(record);
        Ok(())
    }

    async fn store_publisher(&self, record: StoredPublisher) -> Result<(), StoreError> {
        self.check_writable()?;
        self.publishers.write().push(record);
        Ok(())
    }
}
