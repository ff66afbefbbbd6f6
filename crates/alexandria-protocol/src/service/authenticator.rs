//! # Signature Authenticator
//!
//! Thin wrapper over the ledger capability. Ledger failures are logged and
//! reported as "not verified", never propagated.

use crate::domain::errors::ProtocolError;
use crate::ports::outbound::LedgerVerifier;
use tracing::{debug, warn};

/// Address-held signature checks against a ledger node.
pub struct SignatureAuthenticator<L: LedgerVerifier> {
    ledger: L,
}

impl<L: LedgerVerifier> SignatureAuthenticator<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// The wrapped ledger capability.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Whether the ledger confirms `signature` by `address` over `preimage`.
    pub async fn authenticate(&self, address: &str, signature: &str, preimage: &str) -> bool {
        match self.ledger.verify_message(address, signature, preimage).await {
            Ok(true) => true,
            Ok(false) => {
                debug!("[alx] signature by {} not confirmed by ledger", address);
                false
            }
            Err(e) => {
                warn!("[alx] signature check for {} failed: {}", address, e);
                false
            }
        }
    }

    /// Whether the ledger recognises `address`.
    pub async fn address_is_valid(&self, address: &str) -> bool {
        match self.ledger.validate_address(address).await {
            Ok(validation) => validation.is_valid,
            Err(e) => {
                warn!("[alx] address check for {:?} failed: {}", address, e);
                false
            }
        }
    }

    /// [`Self::authenticate`], failing with `SignatureMismatch`.
    pub async fn require(
        &self,
        address: &str,
        signature: &str,
        preimage: &str,
    ) -> Result<(), ProtocolError> {
        if self.authenticate(address, signature, preimage).await {
            Ok(())
        } else {
            Err(ProtocolError::SignatureMismatch {
                address: address.to_string(),
            })
        }
    }
}
