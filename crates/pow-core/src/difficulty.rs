//! Compact difficulty targets and difficulty conversion.
//!
//! The compact format is `[exponent (1 byte)][mantissa (3 bytes)]` and
//! represents `mantissa * 256^(exponent - 3)`.

use core::cmp::Ordering;
use core::fmt;

use crate::params::DIFFICULTY_ONE_BITS;
use crate::U256;

const MANTISSA_MASK: u32 = 0x00ff_ffff;
const MIN_EXPONENT: u8 = 3;
const MAX_EXPONENT: u8 = 32;

/// A 32-bit compact ("nBits") target.
///
/// Construction never fails. Out-of-range inputs normalize to the zero
/// encoding, which is representable but reports `valid() == false`.
///
/// `==` compares encodings. `<`, `>` and friends compare expansions; two
/// different encodings with the same expansion are unordered, use
/// [`CompactTarget::cmp_expanded`] for a total order. For "at most as hard
/// as" on expansions, write `a.cmp_expanded(&b).is_le()` rather than `a <= b`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CompactTarget(u32);

impl CompactTarget {
    /// Largest expansion: any hash below `0xffffff << 232` passes.
    pub const EASY: CompactTarget = CompactTarget::new(32, 0x00ff_ffff);

    /// Smallest non-zero expansion: only the all-zero hash could pass.
    pub const HARD: CompactTarget = CompactTarget::new(3, 0x0000_0001);

    /// The canonical invalid encoding.
    pub const INVALID: CompactTarget = CompactTarget(0);

    /// Encode an exponent and mantissa.
    ///
    /// Returns [`CompactTarget::INVALID`] if `exponent` is outside `[3, 32]`,
    /// or if `mantissa` is zero or wider than 24 bits.
    pub const fn new(exponent: u8, mantissa: u32) -> Self {
        if exponent < MIN_EXPONENT
            || exponent > MAX_EXPONENT
            || mantissa == 0
            || mantissa > MANTISSA_MASK
        {
            return CompactTarget::INVALID;
        }
        CompactTarget(((exponent as u32) << 24) | mantissa)
    }

    /// Wrap a raw encoded word as found in a header. No normalization.
    pub const fn from_bits(bits: u32) -> Self {
        CompactTarget(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn exponent(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn mantissa(self) -> u32 {
        self.0 & MANTISSA_MASK
    }

    /// Valid iff `3 <= exponent <= 32` and the mantissa is non-zero.
    pub const fn valid(self) -> bool {
        let e = self.exponent();
        e >= MIN_EXPONENT && e <= MAX_EXPONENT && self.mantissa() != 0
    }

    /// The full 256-bit threshold, `mantissa << 8 * (exponent - 3)`.
    ///
    /// Invalid targets expand to zero, which no hash can be below.
    pub fn expand(self) -> U256 {
        if !self.valid() {
            return U256::zero();
        }
        let shift = 8 * (self.exponent() as u32 - MIN_EXPONENT as u32);
        U256::from(self.mantissa()) << shift
    }

    /// Compact a full threshold, rounding down to 24 bits of precision.
    ///
    /// Follows Bitcoin's convention of keeping the mantissa below `0x800000`
    /// while the exponent still has room, so real header targets round-trip.
    /// Values below 2^24 use exponent 3. Zero yields the invalid encoding.
    pub fn from_expanded(target: U256) -> Self {
        if target.is_zero() {
            return CompactTarget::INVALID;
        }
        let size = (target.bits() + 7) / 8;
        let (mut exponent, mut mantissa) = if size <= MIN_EXPONENT as usize {
            (MIN_EXPONENT, target.low_u32())
        } else {
            let shift = 8 * (size - MIN_EXPONENT as usize);
            (size as u8, (target >> shift).low_u32())
        };
        if mantissa & 0x0080_0000 != 0 && exponent < MAX_EXPONENT {
            mantissa >>= 8;
            exponent += 1;
        }
        CompactTarget::new(exponent, mantissa)
    }

    /// Total order on expansions.
    pub fn cmp_expanded(&self, other: &Self) -> Ordering {
        self.expand().cmp(&other.expand())
    }

    /// Difficulty relative to the genesis target (`0x1d00ffff`).
    ///
    /// Invalid targets have infinite difficulty.
    pub fn difficulty(self) -> f64 {
        let current = u256_to_f64(self.expand());
        if current == 0.0 {
            return f64::INFINITY;
        }
        u256_to_f64(CompactTarget(DIFFICULTY_ONE_BITS).expand()) / current
    }
}

impl PartialOrd for CompactTarget {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.cmp_expanded(other) {
            Ordering::Equal if self.0 != other.0 => None,
            ord => Some(ord),
        }
    }
}

impl From<u32> for CompactTarget {
    fn from(bits: u32) -> Self {
        CompactTarget(bits)
    }
}

impl From<CompactTarget> for u32 {
    fn from(target: CompactTarget) -> Self {
        target.0
    }
}

impl fmt::Debug for CompactTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompactTarget({:#010x})", self.0)
    }
}

impl fmt::Display for CompactTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Convert a 256-bit value to the nearest-below f64.
fn u256_to_f64(value: U256) -> f64 {
    let bits = value.bits();
    if bits <= 64 {
        return value.low_u64() as f64;
    }
    let shift = bits - 64;
    ((value >> shift).low_u64() as f64) * pow2_f64(shift as u32)
}

/// Compute 2^exp for f64, no_std compatible.
fn pow2_f64(exp: u32) -> f64 {
    f64::from_bits((1023 + exp as u64) << 52)
}

/// Format difficulty for display (e.g., "1.23T" for trillion).
pub fn format_difficulty(difficulty: f64) -> alloc::string::String {
    if difficulty >= 1e15 {
        alloc::format!("{:.2}P", difficulty / 1e15)
    } else if difficulty >= 1e12 {
        alloc::format!("{:.2}T", difficulty / 1e12)
    } else if difficulty >= 1e9 {
        alloc::format!("{:.2}G", difficulty / 1e9)
    } else if difficulty >= 1e6 {
        alloc::format!("{:.2}M", difficulty / 1e6)
    } else if difficulty >= 1e3 {
        alloc::format!("{:.2}K", difficulty / 1e3)
    } else {
        alloc::format!("{:.2}", difficulty)
    }
}

/// Estimate average hashes needed to find a block at given difficulty.
pub fn expected_hashes(difficulty: f64) -> f64 {
    // On average, need difficulty * 2^32 hashes
    difficulty * 4_294_967_296.0
}
