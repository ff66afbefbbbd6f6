//! JSON-RPC client for the ledger node.
//!
//! Speaks JSON-RPC 1.0 over HTTP with basic auth, the dialect of
//! bitcoind-derived nodes. Only `verifymessage` and `validateaddress` are
//! used.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alexandria_protocol::{AddressValidation, LedgerError, LedgerVerifier};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::container::RpcConfig;

/// JSON-RPC 1.0 request body.
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<'a, P> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: P,
}

/// Error object of a JSON-RPC response.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

/// JSON-RPC response body. Nodes send both fields, one of them null.
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse<R> {
    pub result: Option<R>,
    pub error: Option<JsonRpcError>,
}

impl<R> JsonRpcResponse<R> {
    /// The result, or the node's error.
    pub fn into_result(self) -> Result<R, LedgerError> {
        if let Some(error) = self.error {
            return Err(LedgerError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        self.result
            .ok_or_else(|| LedgerError::Transport("missing result in response".to_string()))
    }
}

/// Ledger capability backed by a node's JSON-RPC interface.
pub struct JsonRpcLedger {
    client: Client,
    url: String,
    user: String,
    password: String,
    request_id: AtomicU64,
}

impl JsonRpcLedger {
    /// Create a client. No request is made until the first call.
    pub fn new(config: &RpcConfig) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs.min(5)))
            .build()
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
            request_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Call a JSON-RPC method.
    async fn call<P: Serialize + Send + Sync, R: DeserializeOwned + Send>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, LedgerError> {
        let request = JsonRpcRequest {
            jsonrpc: "1.0",
            id: self.next_id(),
            method,
            params,
        };

        let response = self
            .client
            .post(&self.url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LedgerError::Transport(format!("cannot connect to {}", self.url))
                } else {
                    LedgerError::Transport(e.to_string())
                }
            })?;

        // Nodes answer RPC errors with HTTP 500 and a JSON body, so the
        // status code alone says nothing.
        let status = response.status();
        let body: JsonRpcResponse<R> = response.json().await.map_err(|e| {
            LedgerError::Transport(format!("unparseable response (HTTP {status}): {e}"))
        })?;

        body.into_result()
    }
}

#[async_trait]
impl LedgerVerifier for JsonRpcLedger {
    async fn verify_message(
        &self,
        address: &str,
        signature: &str,
        message: &str,
    ) -> Result<bool, LedgerError> {
        self.call("verifymessage", [address, signature, message])
            .await
    }

    async fn validate_address(&self, address: &str) -> Result<AddressValidation, LedgerError> {
        self.call("validateaddress", [address]).await
    }
}
