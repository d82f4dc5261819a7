//! Little-endian 32-bit word access into fixed-size byte buffers.
//!
//! Word `i` occupies bytes `4 * i .. 4 * i + 4`, the same order Bitcoin uses
//! for the numeric fields of a block header.

#[inline]
pub(crate) fn read_word(bytes: &[u8], index: usize) -> u32 {
    let at = index * 4;
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[inline]
pub(crate) fn write_word(bytes: &mut [u8], index: usize, value: u32) {
    let at = index * 4;
    bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
}
