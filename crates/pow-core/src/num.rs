//! Wide integer used for expanded targets and hash values.

use uint::construct_uint;

construct_uint! {
    /// Unsigned 256-bit integer.
    /// Consists of 4x64-bit words, least significant first.
    pub struct U256(4);
}
