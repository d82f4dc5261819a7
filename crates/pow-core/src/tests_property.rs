//! Property-based tests for targets, orders and candidates
//!
//! These tests verify the packing and ordering laws using proptest

use super::*;
use proptest::prelude::*;

fn valid_target() -> impl Strategy<Value = CompactTarget> {
    (3u8..=32u8, 1u32..=0x00ff_ffffu32).prop_map(|(e, m)| CompactTarget::new(e, m))
}

fn any_order() -> impl Strategy<Value = MiningOrder> {
    (
        prop::array::uniform32(any::<u8>()),
        prop::array::uniform32(any::<u8>()),
        any::<u32>(),
        any::<u32>(),
    )
        .prop_map(|(reference, merkle, timestamp, bits)| {
            MiningOrder::header(
                Digest(reference),
                &Digest(merkle),
                timestamp,
                CompactTarget::from_bits(bits),
            )
        })
}

proptest! {
    #[test]
    fn pack_then_read_is_identity(order in any_order(), version in any::<u32>(), nonce in any::<u32>()) {
        let candidate = Candidate::pack(version, &order, nonce);
        prop_assert_eq!(candidate.order(), order);
        prop_assert_eq!(candidate.version(), version);
        prop_assert_eq!(candidate.nonce(), nonce);
        prop_assert_eq!(candidate.valid(), order.valid());
    }

    #[test]
    fn accessors_are_idempotent(order in any_order(), nonce in any::<u32>()) {
        let candidate = Candidate::pack(params::DEFAULT_VERSION, &order, nonce);
        prop_assert_eq!(candidate.order(), candidate.order());
        prop_assert_eq!(candidate.target(), candidate.target());
        prop_assert_eq!(candidate.version(), candidate.version());
        prop_assert_eq!(candidate.hash(), candidate.hash());
    }

    #[test]
    fn valid_construction_keeps_fields(target in valid_target()) {
        prop_assert!(target.valid());
        prop_assert_eq!(CompactTarget::new(target.exponent(), target.mantissa()), target);
    }

    #[test]
    fn expansion_grows_with_exponent(e1 in 3u8..32u8, gap in 1u8..30u8, m in 1u32..=0x00ff_ffffu32) {
        let e2 = e1.saturating_add(gap).min(32);
        prop_assume!(e1 < e2);
        let lower = CompactTarget::new(e1, m);
        let upper = CompactTarget::new(e2, m);
        prop_assert!(lower.expand() < upper.expand());
        prop_assert!(lower < upper);
    }

    #[test]
    fn bad_exponent_normalizes(e in prop_oneof![0u8..3u8, 33u8..=255u8], m in any::<u32>()) {
        let target = CompactTarget::new(e, m);
        prop_assert!(!target.valid());
        prop_assert_eq!(target.bits(), 0);
    }

    #[test]
    fn oversized_mantissa_normalizes(e in 3u8..=32u8, m in 0x0100_0000u32..) {
        let target = CompactTarget::new(e, m);
        prop_assert!(!target.valid());
        prop_assert_eq!(target.bits(), 0);
    }

    #[test]
    fn compaction_never_rounds_up(target in valid_target()) {
        let recompacted = CompactTarget::from_expanded(target.expand());
        prop_assert!(recompacted.valid());
        prop_assert!(recompacted.expand() <= target.expand());
        prop_assert_eq!(CompactTarget::from_expanded(recompacted.expand()), recompacted);
    }

    #[test]
    fn satisfaction_is_monotonic_in_target(order in any_order(), nonce in any::<u32>(), a in valid_target(), b in valid_target()) {
        // Same message, two targets: the larger expansion accepts whatever the smaller does.
        let (low, high) = if a.cmp_expanded(&b).is_le() { (a, b) } else { (b, a) };
        let hash = Candidate::pack(1, &order, nonce).hash();
        if candidate::meets_target(&hash, low) {
            prop_assert!(candidate::meets_target(&hash, high));
        }
        let below = CompactTarget::from_expanded(hash.as_number());
        prop_assert!(!candidate::meets_target(&hash, below));
    }

    #[test]
    fn header_message_slots(digest in prop::array::uniform32(any::<u8>()), timestamp in any::<u32>()) {
        let message = Message::header(&Digest(digest), timestamp);
        prop_assert_eq!(message.word(8), timestamp);
        prop_assert_eq!(&message.as_bytes()[..32], &digest[..]);
    }
}
