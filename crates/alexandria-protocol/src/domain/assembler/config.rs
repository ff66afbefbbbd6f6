//! # Assembler Configuration
//!
//! - `max_age_blocks`: how many blocks an assembly may wait for its remaining parts
//! - `max_pending_assemblies`: maximum buffer size for memory safety

use super::security::validate_config;

/// Configuration for the assembly buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyConfig {
    /// Blocks after the first chunk before an incomplete assembly is purged
    /// (default: 1000).
    pub max_age_blocks: u64,

    /// Maximum number of live assemblies (default: 1000). Oldest are evicted
    /// first.
    pub max_pending_assemblies: usize,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            max_age_blocks: 1000,
            max_pending_assemblies: 1000,
        }
    }
}

impl AssemblyConfig {
    /// Create a new configuration with custom values.
    pub fn new(max_age_blocks: u64, max_pending_assemblies: usize) -> Self {
        Self {
            max_age_blocks,
            max_pending_assemblies,
        }
    }

    /// Whether every value is within [`super::security::limits`].
    pub fn is_valid(&self) -> bool {
        validate_config(self).is_ok()
    }
}
