//! Packed 80-byte header candidates.
//!
//! Layout, in little-endian 32-bit words:
//!
//! | words  | bytes  | field                         |
//! |--------|--------|-------------------------------|
//! | 0      | 0..4   | version                       |
//! | 1..=8  | 4..36  | reference (previous hash)     |
//! | 9..=17 | 36..72 | message (merkle root, time)   |
//! | 18     | 72..76 | compact target                |
//! | 19     | 76..80 | nonce                         |
//!
//! This is byte-for-byte the Bitcoin block header, and the buffer itself is
//! the wire format.

use alloc::string::String;
use core::fmt;

use crate::difficulty::CompactTarget;
use crate::error::{Result, WorkError};
use crate::hash::Digest;
use crate::order::{Message, MiningOrder};
use crate::params::{
    DIGEST_SIZE, HEADER_SIZE, MESSAGE_SIZE, MESSAGE_WORD, NONCE_WORD, REFERENCE_WORD, TARGET_WORD,
    VERSION_WORD,
};
use crate::words::{read_word, write_word};

const REFERENCE_RANGE: core::ops::Range<usize> = REFERENCE_WORD * 4..REFERENCE_WORD * 4 + DIGEST_SIZE;
const MESSAGE_RANGE: core::ops::Range<usize> = MESSAGE_WORD * 4..MESSAGE_WORD * 4 + MESSAGE_SIZE;

/// A fully assembled header ready to be hash-checked against its target.
///
/// Candidates are never mutated: a new nonce or order means a new candidate.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Candidate([u8; HEADER_SIZE]);

impl Candidate {
    /// Pack `version`, `order` and `nonce` into a header.
    ///
    /// Packing does not validate the order; check [`Candidate::valid`].
    pub fn pack(version: u32, order: &MiningOrder, nonce: u32) -> Self {
        let mut header = [0u8; HEADER_SIZE];
        write_word(&mut header, VERSION_WORD, version);
        header[REFERENCE_RANGE].copy_from_slice(order.reference.as_bytes());
        header[MESSAGE_RANGE].copy_from_slice(order.message.as_bytes());
        write_word(&mut header, TARGET_WORD, order.target.bits());
        write_word(&mut header, NONCE_WORD, nonce);
        Candidate(header)
    }

    pub const fn from_bytes(bytes: [u8; HEADER_SIZE]) -> Self {
        Candidate(bytes)
    }

    /// Parse an 80-byte header from hex.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)?;
        if bytes.len() != HEADER_SIZE {
            return Err(WorkError::InvalidLength {
                expected: HEADER_SIZE,
                got: bytes.len(),
            });
        }
        let mut header = [0u8; HEADER_SIZE];
        header.copy_from_slice(&bytes);
        Ok(Candidate(header))
    }

    pub fn as_bytes(&self) -> &[u8; HEADER_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn version(&self) -> u32 {
        read_word(&self.0, VERSION_WORD)
    }

    pub fn target(&self) -> CompactTarget {
        CompactTarget::from_bits(read_word(&self.0, TARGET_WORD))
    }

    pub fn nonce(&self) -> u32 {
        read_word(&self.0, NONCE_WORD)
    }

    pub fn reference(&self) -> Digest {
        let mut digest = [0u8; DIGEST_SIZE];
        digest.copy_from_slice(&self.0[REFERENCE_RANGE]);
        Digest(digest)
    }

    pub fn message(&self) -> Message {
        let mut message = [0u8; MESSAGE_SIZE];
        message.copy_from_slice(&self.0[MESSAGE_RANGE]);
        Message::from_bytes(message)
    }

    /// The order this candidate was packed from.
    pub fn order(&self) -> MiningOrder {
        MiningOrder::new(self.reference(), self.message(), self.target())
    }

    /// Same header with a different nonce.
    pub fn with_nonce(&self, nonce: u32) -> Self {
        let mut header = self.0;
        write_word(&mut header, NONCE_WORD, nonce);
        Candidate(header)
    }

    pub fn valid(&self) -> bool {
        self.order().valid()
    }

    /// Double SHA256 of the whole header.
    pub fn hash(&self) -> Digest {
        Digest::hash(&self.0)
    }

    /// Whether the header hash, read as a little-endian number, is strictly
    /// below the expanded target.
    ///
    /// Independent of [`Candidate::valid`]; callers should check both.
    pub fn satisfied(&self) -> bool {
        meets_target(&self.hash(), self.target())
    }
}

/// Check a hash against a compact target (`hash < target.expand()`).
#[inline]
pub fn meets_target(hash: &Digest, target: CompactTarget) -> bool {
    hash.as_number() < target.expand()
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("version", &format_args!("{:#010x}", self.version()))
            .field("reference", &self.reference())
            .field("message", &self.message())
            .field("target", &self.target())
            .field("nonce", &self.nonce())
            .finish()
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
