//! Error types
//!
//! Hot-path operations report failure as values (booleans, sentinel zeros,
//! `Option`); typed errors appear only at construction and configuration
//! boundaries.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("capacity exhausted: {0}")]
    CapacityExhausted(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("arena size must be non-zero")]
    ZeroArenaSize,

    #[error("allocation of {bytes} bytes failed")]
    AllocationFailed { bytes: usize },

    #[error("ring capacity must be a power of two >= 2, got {0}")]
    BadRingCapacity(usize),
}

/// Result type alias.
pub type CoreResult<T> = Result<T, CoreError>;
