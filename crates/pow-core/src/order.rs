//! Mining orders: what to extend, what to commit to, and what target to beat.

use core::fmt;

use crate::difficulty::CompactTarget;
use crate::error::{Result, WorkError};
use crate::hash::Digest;
use crate::params::{DIGEST_SIZE, MESSAGE_SIZE, PUBKEY_OFFSET, TIMESTAMP_WORD};
use crate::words::{read_word, write_word};

/// Size of a compressed secp256k1 public key.
pub const COMPRESSED_KEY_SIZE: usize = 33;

/// The fixed 36-byte payload a header commits to besides its reference.
///
/// In header mode this is a digest (the merkle root) followed by a 32-bit
/// timestamp in word 8. In identity mode the first three bytes are zero and
/// a compressed public key fills the rest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Message([u8; MESSAGE_SIZE]);

impl Message {
    pub const fn from_bytes(bytes: [u8; MESSAGE_SIZE]) -> Self {
        Message(bytes)
    }

    /// Build a header-mode message from a digest and a timestamp.
    pub fn header(digest: &Digest, timestamp: u32) -> Self {
        let mut bytes = [0u8; MESSAGE_SIZE];
        bytes[..DIGEST_SIZE].copy_from_slice(digest.as_bytes());
        write_word(&mut bytes, TIMESTAMP_WORD, timestamp);
        Message(bytes)
    }

    /// Build an identity-mode message from a compressed public key.
    pub fn compressed_key(key: &[u8; COMPRESSED_KEY_SIZE]) -> Self {
        let mut bytes = [0u8; MESSAGE_SIZE];
        bytes[PUBKEY_OFFSET..].copy_from_slice(key);
        Message(bytes)
    }

    /// Build an identity-mode message committing to `key`.
    #[cfg(feature = "secp256k1")]
    pub fn public_key(key: &secp256k1::PublicKey) -> Self {
        Self::compressed_key(&key.serialize())
    }

    pub fn as_bytes(&self) -> &[u8; MESSAGE_SIZE] {
        &self.0
    }

    /// Read word `index` (0..9) as little-endian.
    pub fn word(&self, index: usize) -> u32 {
        read_word(&self.0, index)
    }

    /// The leading digest of a header-mode message.
    pub fn digest(&self) -> Digest {
        let mut digest = [0u8; DIGEST_SIZE];
        digest.copy_from_slice(&self.0[..DIGEST_SIZE]);
        Digest(digest)
    }

    /// Whether the bytes follow the identity layout: three zero bytes, then
    /// a compressed key prefix (`0x02` or `0x03`).
    ///
    /// A header message can match by chance (about one merkle root in 2^31);
    /// it is then treated as identity and never rolled.
    pub fn is_identity(&self) -> bool {
        self.0[..PUBKEY_OFFSET].iter().all(|&b| b == 0)
            && matches!(self.0[PUBKEY_OFFSET], 0x02 | 0x03)
    }

    pub fn timestamp(&self) -> u32 {
        read_word(&self.0, TIMESTAMP_WORD)
    }

    /// Copy of this message with the timestamp word replaced.
    pub fn with_timestamp(&self, timestamp: u32) -> Self {
        let mut bytes = self.0;
        write_word(&mut bytes, TIMESTAMP_WORD, timestamp);
        Message(bytes)
    }
}

impl Default for Message {
    fn default() -> Self {
        Message([0u8; MESSAGE_SIZE])
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Message({})", hex::encode(self.0))
    }
}

/// A mining job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MiningOrder {
    /// Digest of the prior state this job extends (the previous block hash).
    pub reference: Digest,
    /// Payload committed to alongside the reference.
    pub message: Message,
    /// Threshold the header hash must be below.
    pub target: CompactTarget,
}

impl MiningOrder {
    pub fn new(reference: Digest, message: Message, target: CompactTarget) -> Self {
        MiningOrder {
            reference,
            message,
            target,
        }
    }

    /// An order for a standard header extending `reference`.
    pub fn header(
        reference: Digest,
        merkle_root: &Digest,
        timestamp: u32,
        target: CompactTarget,
    ) -> Self {
        Self::new(reference, Message::header(merkle_root, timestamp), target)
    }

    /// Valid iff the reference is non-zero and the target is valid.
    pub fn valid(&self) -> bool {
        self.reference.valid() && self.target.valid()
    }

    /// Like [`MiningOrder::valid`], naming the first failed condition.
    pub fn validate(&self) -> Result<()> {
        if !self.reference.valid() {
            return Err(WorkError::InvalidOrder {
                reason: "zero reference digest",
            });
        }
        if !self.target.valid() {
            return Err(WorkError::InvalidOrder {
                reason: "invalid compact target",
            });
        }
        Ok(())
    }

    /// Whether word 8 of the message is a timestamp that may be advanced.
    pub fn rollable(&self) -> bool {
        !self.message.is_identity()
    }

    /// Copy of this order with the message timestamp advanced by `seconds`.
    ///
    /// Only meaningful when [`MiningOrder::rollable`]: in identity mode word 8
    /// holds key bytes.
    pub fn rolled(&self, seconds: u32) -> Self {
        let timestamp = self.message.timestamp().wrapping_add(seconds);
        MiningOrder {
            message: self.message.with_timestamp(timestamp),
            ..*self
        }
    }
}
