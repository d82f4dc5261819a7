//! Header layout and mining constants.

/// Block version with BIP9 versionbits signaling.
pub const DEFAULT_VERSION: u32 = 0x2000_0000;

/// Size of a digest in bytes.
pub const DIGEST_SIZE: usize = 32;

/// Size of a message body: a digest followed by a 32-bit timestamp.
pub const MESSAGE_SIZE: usize = DIGEST_SIZE + 4;

/// Size of a packed header candidate in bytes.
pub const HEADER_SIZE: usize = 80;

/// Number of 32-bit words in a packed header candidate.
pub const HEADER_WORDS: usize = HEADER_SIZE / 4;

/// Word index of the version field.
pub const VERSION_WORD: usize = 0;

/// First word of the reference digest.
pub const REFERENCE_WORD: usize = 1;

/// First word of the message body.
pub const MESSAGE_WORD: usize = REFERENCE_WORD + DIGEST_SIZE / 4;

/// Word index of the compact target.
pub const TARGET_WORD: usize = 18;

/// Word index of the nonce.
pub const NONCE_WORD: usize = 19;

/// Word index of the timestamp inside a message body.
pub const TIMESTAMP_WORD: usize = DIGEST_SIZE / 4;

/// Byte offset of a compressed public key inside an identity message.
pub const PUBKEY_OFFSET: usize = 3;

/// Timestamp increments tried by a default search once the nonce range is spent.
///
/// Kept well under the two hours of future drift Bitcoin nodes accept.
pub const DEFAULT_TIME_ROLLS: u32 = 600;

/// Minimum leading zero bits (in display format) for a hash to count as a share.
pub const SHARE_MIN_LEADING_ZEROS: u32 = 8;

/// Compact target of difficulty 1 (the genesis block target).
pub const DIFFICULTY_ONE_BITS: u32 = 0x1d00_ffff;
