//! SHA256 double-hashing and the 32-byte digest type.

use alloc::string::String;
use core::fmt;
use sha2::{Digest as _, Sha256};

use crate::error::{Result, WorkError};
use crate::params::DIGEST_SIZE;
use crate::U256;

/// Bitcoin's double SHA256: SHA256(SHA256(data)).
///
/// This is used for header hashing and for deriving reference digests.
#[inline]
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(&first);
    let mut result = [0u8; 32];
    result.copy_from_slice(&second);
    result
}

/// A 32-byte digest in internal byte order.
///
/// The all-zero digest is the "unset" value and is not valid as the
/// reference of a mining order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Digest(pub [u8; DIGEST_SIZE]);

impl Digest {
    pub const ZERO: Digest = Digest([0u8; DIGEST_SIZE]);

    /// Hash `data` with double SHA256.
    pub fn hash(data: &[u8]) -> Self {
        Digest(double_sha256(data))
    }

    /// A digest is valid iff it is not all zeros.
    pub fn valid(&self) -> bool {
        self.0.iter().any(|b| *b != 0)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }

    /// The digest read as a little-endian 256-bit number.
    ///
    /// This is how a header hash is compared with an expanded target.
    pub fn as_number(&self) -> U256 {
        U256::from_little_endian(&self.0)
    }

    /// Parse from hex in internal byte order.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)?;
        if bytes.len() != DIGEST_SIZE {
            return Err(WorkError::InvalidLength {
                expected: DIGEST_SIZE,
                got: bytes.len(),
            });
        }
        let mut digest = [0u8; DIGEST_SIZE];
        digest.copy_from_slice(&bytes);
        Ok(Digest(digest))
    }

    /// Parse from hex in display (reversed) byte order, as explorers print hashes.
    pub fn from_display_hex(s: &str) -> Result<Self> {
        let Digest(mut bytes) = Self::from_hex(s)?;
        bytes.reverse();
        Ok(Digest(bytes))
    }

    /// Hex in internal byte order.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Hex in display (reversed) byte order.
    pub fn display_hex(&self) -> String {
        let mut reversed = self.0;
        reversed.reverse();
        hex::encode(reversed)
    }

    /// Count leading zero bits in the DISPLAYED hash format.
    ///
    /// Displayed hashes are byte-reversed, so this counts from the end of
    /// the internal array.
    pub fn leading_zero_bits(&self) -> u32 {
        let mut zeros = 0u32;
        for byte in self.0.iter().rev() {
            if *byte == 0 {
                zeros += 8;
            } else {
                zeros += byte.leading_zeros();
                break;
            }
        }
        zeros
    }
}

impl From<[u8; DIGEST_SIZE]> for Digest {
    fn from(bytes: [u8; DIGEST_SIZE]) -> Self {
        Digest(bytes)
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.display_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_sha256() {
        // Test vector: SHA256d("hello")
        let hash = double_sha256(b"hello");
        let expected =
            hex::decode("9595c9df90075148eb06860365df33584b75bff782a510c6cd4883a419833d50")
                .unwrap();

        assert_eq!(hash.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_zero_digest_is_invalid() {
        assert!(!Digest::ZERO.valid());
        assert!(!Digest::default().valid());

        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        assert!(Digest(bytes).valid());
    }

    #[test]
    fn test_hex_orders() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0x01;
        bytes[31] = 0xff;
        let digest = Digest(bytes);

        assert!(digest.to_hex().starts_with("01"));
        assert!(digest.display_hex().starts_with("ff"));
        assert_eq!(Digest::from_hex(&digest.to_hex()).unwrap(), digest);
        assert_eq!(Digest::from_display_hex(&digest.display_hex()).unwrap(), digest);
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(matches!(
            Digest::from_hex("abcd"),
            Err(WorkError::InvalidLength { expected: 32, got: 2 })
        ));
        assert!(matches!(Digest::from_hex("zz"), Err(WorkError::InvalidHex(_))));
    }

    #[test]
    fn test_as_number_is_little_endian() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0x02;
        assert_eq!(Digest(bytes).as_number(), U256::from(2u32));

        let mut bytes = [0u8; 32];
        bytes[31] = 0x80;
        assert_eq!(Digest(bytes).as_number(), U256::one() << 255u32);
    }

    #[test]
    fn test_leading_zero_bits() {
        assert_eq!(Digest::ZERO.leading_zero_bits(), 256);

        // Leading zeros in DISPLAY format = trailing zeros in internal format
        let mut bytes = [0xFF; 32];
        bytes[31] = 0x00;
        bytes[30] = 0x00;
        bytes[29] = 0x0F;
        assert_eq!(Digest(bytes).leading_zero_bits(), 20);
    }
}
