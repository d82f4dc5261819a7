//! Error types for order validation and nonce search.

use alloc::string::String;
use thiserror::Error;

/// Errors surfaced by operations that require caller action.
///
/// Malformed compact targets are not errors: they normalize to the zero
/// encoding and report `valid() == false`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkError {
    /// The order has a zero reference digest or an invalid target.
    #[error("invalid mining order: {reason}")]
    InvalidOrder { reason: &'static str },

    /// Every nonce and timestamp in the search space was tried without success.
    #[error("search space exhausted after {hashes} hashes")]
    Exhausted { hashes: u64 },

    /// The shared stop flag was raised before a solution was found.
    #[error("search cancelled after {hashes} hashes")]
    Cancelled { hashes: u64 },

    /// Hex input could not be decoded.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Decoded input had the wrong size.
    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
}

impl WorkError {
    /// Whether a refreshed order (new timestamp or reference) could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WorkError::Exhausted { .. })
    }
}

impl From<hex::FromHexError> for WorkError {
    fn from(err: hex::FromHexError) -> Self {
        WorkError::InvalidHex(alloc::format!("{}", err))
    }
}

pub type Result<T> = core::result::Result<T, WorkError>;
