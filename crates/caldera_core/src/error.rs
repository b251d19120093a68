//! # Arena Error Types
//!
//! All errors that can escape the allocator.

use thiserror::Error;

/// Errors that can occur while constructing or allocating from an arena.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    /// Requested an allocation of zero elements.
    #[error("allocation count must be greater than zero")]
    InvalidCount,

    /// Sizing arithmetic overflowed the address-space integer type, either
    /// in `element size * count` or while rounding a capacity up to the
    /// next power of two.
    #[error("arithmetic overflow while sizing an allocation")]
    SizeOverflow,

    /// The backing allocator could not provide a new chunk.
    #[error("backing allocator failed to provide {size} bytes aligned to {align}")]
    AllocationFailed {
        /// Requested chunk size in bytes.
        size: usize,
        /// Requested chunk alignment in bytes.
        align: usize,
    },
}

/// Result type for arena operations.
pub type ArenaResult<T> = Result<T, ArenaError>;

/// Errors that can occur while loading an [`ArenaConfig`](crate::ArenaConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for an arena config.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}
