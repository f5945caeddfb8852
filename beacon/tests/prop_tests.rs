use proptest::prelude::*;

use proxima_beacon::{Advertisement, NonceScanner, ScanOutcome, ServiceId};
use proxima_types::{AdvertisedIdentifier, Nonce, BEACON_MARKER, BEACON_PREFIX};

fn beacon(nonce: [u8; 8]) -> Advertisement {
    Advertisement::new(
        BEACON_MARKER,
        vec![ServiceId::Uuid128(AdvertisedIdentifier::compose(
            BEACON_PREFIX,
            &Nonce::new(nonce),
        ))],
    )
}

proptest! {
    /// A run of identical observations produces exactly one nonce-observed event.
    #[test]
    fn repeated_nonce_emits_once(nonce in prop::array::uniform8(0u8..), repeats in 1usize..50) {
        let mut scanner = NonceScanner::new();
        let emitted = (0..repeats)
            .filter(|i| matches!(scanner.observe(&beacon(nonce), *i as u64 * 100), ScanOutcome::Observed(_)))
            .count();
        prop_assert_eq!(emitted, 1);
        prop_assert_eq!(scanner.last_beacon_ms(), Some((repeats as u64 - 1) * 100));
    }

    /// Events fire exactly at the positions where the nonce changes.
    #[test]
    fn events_match_nonce_changes(seq in prop::collection::vec(0u8..4, 1..60)) {
        let mut scanner = NonceScanner::new();
        let mut expected = 0usize;
        let mut previous: Option<u8> = None;
        let mut actual = 0usize;
        for (i, b) in seq.iter().enumerate() {
            if previous != Some(*b) {
                expected += 1;
            }
            previous = Some(*b);
            if matches!(scanner.observe(&beacon([*b; 8]), i as u64), ScanOutcome::Observed(_)) {
                actual += 1;
            }
        }
        prop_assert_eq!(actual, expected);
    }

    /// Any identifier whose first half differs from the prefix is never emitted.
    #[test]
    fn foreign_prefix_never_emits(prefix in prop::array::uniform8(0u8..), nonce in prop::array::uniform8(0u8..)) {
        prop_assume!(prefix != BEACON_PREFIX);
        let mut scanner = NonceScanner::new();
        let id = AdvertisedIdentifier::compose(prefix, &Nonce::new(nonce));
        let adv = Advertisement::new(BEACON_MARKER, vec![ServiceId::Uuid128(id)]);
        prop_assert!(matches!(scanner.observe(&adv, 0), ScanOutcome::Rejected(_)));
        prop_assert_eq!(scanner.last_beacon_ms(), None);
    }
}
