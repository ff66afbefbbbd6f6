//! # Assembler Security
//!
//! Bounds on the assembler configuration. Chunks are free to publish, so an
//! unbounded buffer or an unbounded wait is a memory exhaustion vector.

use super::config::AssemblyConfig;
use thiserror::Error;

/// Security-related constants for the assembler.
pub mod limits {
    /// Minimum wait (roughly ten minutes of blocks).
    pub const MIN_AGE_BLOCKS: u64 = 10;

    /// Maximum wait.
    pub const MAX_AGE_BLOCKS: u64 = 100_000;

    /// Minimum buffer size.
    pub const MIN_PENDING_ASSEMBLIES: usize = 10;

    /// Maximum buffer size.
    pub const MAX_PENDING_ASSEMBLIES: usize = 100_000;
}

/// Configuration outside the bounds in [`limits`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerSecurityError {
    #[error("max age {value} blocks below minimum {minimum}")]
    AgeTooShort { value: u64, minimum: u64 },

    #[error("max age {value} blocks exceeds maximum {maximum}")]
    AgeTooLong { value: u64, maximum: u64 },

    #[error("buffer size {value} below minimum {minimum}")]
    BufferTooSmall { value: usize, minimum: usize },

    #[error("buffer size {value} exceeds maximum {maximum}")]
    BufferTooLarge { value: usize, maximum: usize },
}

/// Validate assembly configuration against [`limits`].
pub fn validate_config(config: &AssemblyConfig) -> Result<(), AssemblerSecurityError> {
    if config.max_age_blocks < limits::MIN_AGE_BLOCKS {
        return Err(AssemblerSecurityError::AgeTooShort {
            value: config.max_age_blocks,
            minimum: limits::MIN_AGE_BLOCKS,
        });
    }

    if config.max_age_blocks > limits::MAX_AGE_BLOCKS {
        return Err(AssemblerSecurityError::AgeTooLong {
            value: config.max_age_blocks,
            maximum: limits::MAX_AGE_BLOCKS,
        });
    }

    if config.max_pending_assemblies < limits::MIN_PENDING_ASSEMBLIES {
        return Err(AssemblerSecurityError::BufferTooSmall {
            value: config.max_pending_assemblies,
            minimum: limits::MIN_PENDING_ASSEMBLIES,
        });
    }

    if config.max_pending_assemblies > limits::MAX_PENDING_ASSEMBLIES {
        return Err(AssemblerSecurityError::BufferTooLarge {
            value: config.max_pending_assemblies,
            maximum: limits::MAX_PENDING_ASSEMBLIES,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_config_accepts_defaults() {
        let config = AssemblyConfig::default();
        assert!(validate_config(&config).is_ok());
        assert!(config.is_valid());
    }

    #[test]
    fn test_validate_config_rejects_short_age() {
        let config = AssemblyConfig::new(1, 1000);
        assert!(matches!(
            validate_config(&config),
            Err(AssemblerSecurityError::AgeTooShort { .. })
        ));
    }

    #[test]
    fn test_validate_config_rejects_large_buffer() {
        let config = AssemblyConfig::new(1000, 500_000);
        assert!(matches!(
            validate_config(&config),
            Err(AssemblerSecurityError::BufferTooLarge { .. })
        ));
        assert!(!config.is_valid());
    }
}
