//! Proof-of-work core for Bitcoin-style headers.
//!
//! This crate provides pure Rust implementations of:
//! - Compact ("nBits") difficulty target encoding and expansion
//! - Mining orders: the reference digest, message body and target of a job
//! - Packed 80-byte header candidates with fixed-offset field access
//! - SHA256 double-hashing and the proof-of-work acceptance check
//! - Nonce search, single or multi-threaded, with cooperative cancellation

#![cfg_attr(not(feature = "std"), no_std)]
#![allow(clippy::manual_div_ceil)]

extern crate alloc;

pub mod candidate;
pub mod difficulty;
pub mod error;
pub mod hash;
pub mod order;
pub mod params;
pub mod search;

mod num;
mod words;

pub use candidate::Candidate;
pub use difficulty::CompactTarget;
pub use error::{Result, WorkError};
pub use hash::{double_sha256, Digest};
pub use num::U256;
pub use order::{Message, MiningOrder};
pub use search::{work, Scan, Search};

#[cfg(test)]
mod tests_property;
