//! # Indexer Configuration
//!
//! ## Security Requirements
//!
//! - The RPC password MUST be set; ledger nodes refuse unauthenticated calls
//! - Assembly limits are checked against the protocol crate's bounds

use alexandria_protocol::domain::assembler::security::{validate_config, AssemblerSecurityError};
use alexandria_protocol::AssemblyConfig;
use std::env;
use thiserror::Error;

/// First block that carries Alexandria announcements.
pub const DEFAULT_START_BLOCK: u64 = 1_002_555;

/// Complete indexer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerConfig {
    /// Ledger node connection.
    pub rpc: RpcConfig,
    /// Transactions below this height are skipped.
    pub start_block: u64,
    /// Multipart reassembly limits.
    pub assembly: AssemblyConfig,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            rpc: RpcConfig::default(),
            start_block: DEFAULT_START_BLOCK,
            assembly: AssemblyConfig::default(),
        }
    }
}

/// Ledger node JSON-RPC connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcConfig {
    pub url: String,
    pub user: String,
    pub password: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:7313".to_string(),
            user: "user".to_string(),
            password: String::new(),
            timeout_secs: 10,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The RPC password is empty.
    #[error("SECURITY VIOLATION: RPC password is empty. Set ALX_RPC_PASSWORD.")]
    MissingRpcPassword,

    #[error("RPC URL must be http(s): {0:?}")]
    InvalidRpcUrl(String),

    #[error("{key} is not a valid number: {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("Assembly configuration rejected: {0}")]
    Assembly(#[from] AssemblerSecurityError),

    #[error("Failed to build RPC client: {0}")]
    RpcClient(String),
}

impl IndexerConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ALX_RPC_URL`: Ledger node URL (default: http://127.0.0.1:7313)
    /// - `ALX_RPC_USER`: RPC user name (default: user)
    /// - `ALX_RPC_PASSWORD`: RPC password (required)
    /// - `ALX_RPC_TIMEOUT_SECS`: Per-request timeout (default: 10)
    /// - `ALX_START_BLOCK`: First block to index (default: 1002555)
    /// - `ALX_ASSEMBLY_MAX_AGE_BLOCKS`: Blocks an incomplete assembly may wait (default: 1000)
    /// - `ALX_MAX_PENDING_ASSEMBLIES`: Live assembly cap (default: 1000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let number = |key: &'static str, default: u64| -> Result<u64, ConfigError> {
            match lookup(key) {
                Some(value) => value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber { key, value }),
                None => Ok(default),
            }
        };

        let max_pending = number(
            "ALX_MAX_PENDING_ASSEMBLIES",
            defaults.assembly.max_pending_assemblies as u64,
        )?;

        Ok(Self {
            rpc: RpcConfig {
                url: lookup("ALX_RPC_URL").unwrap_or(defaults.rpc.url),
                user: lookup("ALX_RPC_USER").unwrap_or(defaults.rpc.user),
                password: lookup("ALX_RPC_PASSWORD").unwrap_or(defaults.rpc.password),
                timeout_secs: number("ALX_RPC_TIMEOUT_SECS", defaults.rpc.timeout_secs)?,
            },
            start_block: number("ALX_START_BLOCK", defaults.start_block)?,
            assembly: AssemblyConfig::new(
                number(
                    "ALX_ASSEMBLY_MAX_AGE_BLOCKS",
                    defaults.assembly.max_age_blocks,
                )?,
                usize::try_from(max_pending).map_err(|_| ConfigError::InvalidNumber {
                    key: "ALX_MAX_PENDING_ASSEMBLIES",
                    value: max_pending.to_string(),
                })?,
            ),
        })
    }

    /// Validate configuration before connecting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc.password.is_empty() {
            return Err(ConfigError::MissingRpcPassword);
        }
        if !(self.rpc.url.starts_with("http://") || self.rpc.url.starts_with("https://")) {
            return Err(ConfigError::InvalidRpcUrl(self.rpc.url.clone()));
        }
        validate_config(&self.assembly)?;
        Ok(())
    }
}
