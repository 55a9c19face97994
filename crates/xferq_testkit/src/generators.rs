//! Property-based test generators using proptest.

use proptest::prelude::*;
use std::time::Duration;
use xferq_core::Timeout;

/// Generates transfer payloads between 1 byte and `max_len`.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 1..=max_len)
}

/// Generates timeouts: mostly finite, sometimes never.
pub fn timeout() -> impl Strategy<Value = Timeout> {
    prop_oneof![
        1 => Just(Timeout::Never),
        4 => (1u64..60_000).prop_map(|ms| Timeout::After(Duration::from_millis(ms))),
    ]
}

/// Generates a backend drive plan: chunk sizes a scripted backend commits
/// per step.
pub fn chunk_plan() -> impl Strategy<Value = Vec<usize>> {
    proptest::collection::vec(1usize..128, 1..8)
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn payloads_stay_in_bounds(data in payload(64)) {
            prop_assert!(!data.is_empty());
            prop_assert!(data.len() <= 64);
        }

        #[test]
        fn finite_timeouts_are_positive(t in timeout()) {
            if let Timeout::After(d) = t {
                prop_assert!(!d.is_zero());
            }
        }

        #[test]
        fn chunk_plans_are_usable(plan in chunk_plan()) {
            prop_assert!(!plan.is_empty());
            prop_assert!(plan.iter().all(|&c| c > 0));
        }
    }
}
