//! Property-based tests for snapshot debouncing.
//! Verifies invariants hold for ALL read sequences, not just fixed examples.

// Test files legitimately use arithmetic for verification; allow at file level.
#![allow(clippy::arithmetic_side_effects)]

use embassy_time::Instant;
use platform::{InputOrigin, InputSnapshot, Register};

const ORIGIN: InputOrigin = InputOrigin::Port(Register::Gp0);

proptest::proptest! {
    /// One changed event per adjacent difference, none for repeats.
    #[test]
    fn changed_events_match_value_transitions(
        baseline in 0u8..=255u8,
        reads in proptest::collection::vec(0u8..=255u8, 0..64),
    ) {
        let mut snapshot = InputSnapshot::new(baseline);
        let mut last = baseline;
        let mut expected = 0usize;
        let mut emitted = 0usize;
        for (tick, value) in (0u64..).zip(reads.iter().copied()) {
            if value != last {
                expected += 1;
                last = value;
            }
            if snapshot.observe(ORIGIN, value, Instant::from_ticks(tick)).changed {
                emitted += 1;
            }
        }
        proptest::prop_assert_eq!(emitted, expected);
        proptest::prop_assert_eq!(snapshot.value(), last);
    }

    /// Every event reports the byte the snapshot held before it.
    #[test]
    fn previous_is_last_observed(a in 0u8..=255u8, b in 0u8..=255u8) {
        let mut snapshot = InputSnapshot::new(a);
        let event = snapshot.observe(ORIGIN, b, Instant::from_ticks(1));
        proptest::prop_assert_eq!(event.previous, a);
        proptest::prop_assert_eq!(event.value, b);
        proptest::prop_assert_eq!(event.changed, a != b);
    }

    /// The change timestamp only moves on an actual change.
    #[test]
    fn repeats_keep_change_time(value in 0u8..=255u8, repeats in 1usize..16) {
        let mut snapshot = InputSnapshot::new(value.wrapping_add(1));
        snapshot.observe(ORIGIN, value, Instant::from_ticks(10));
        for tick in 0..repeats {
            snapshot.observe(ORIGIN, value, Instant::from_ticks(20 + tick as u64));
        }
        proptest::prop_assert_eq!(snapshot.changed_at(), Instant::from_ticks(10));
    }
}
