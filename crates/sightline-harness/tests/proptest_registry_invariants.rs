//! Property-based invariant tests for the tracker registries.
//!
//! Verifies:
//! 1. After any observe/unobserve/destroy interleaving, the channel registry
//!    key set equals the set of keys referenced by live shared records.
//! 2. Backend channels open at the end equal registered channels plus live
//!    private records (no leaked, no prematurely disconnected channels).
//! 3. A record's visible state always equals the classification of the last
//!    delivered entry for its element.
//! 4. Channel keys are deterministic: same options + root id → same key.

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use sightline_core::{
    ElementId, IntersectionEntry, ObserveOptions, VisibilityTracker, channel_key,
};
use sightline_harness::{CallbackLog, FakeBackend};

#[derive(Debug, Clone)]
enum Op {
    Observe {
        element: u64,
        threshold: f64,
        private_root: bool,
    },
    Unobserve {
        element: u64,
    },
    Deliver {
        element: u64,
        ratio: f64,
    },
    Destroy,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let element = 0u64..6;
    let threshold = prop_oneof![Just(0.0), Just(0.25), Just(0.5), Just(1.0)];
    prop_oneof![
        4 => (element.clone(), threshold, any::<bool>()).prop_map(|(element, threshold, private_root)| {
            Op::Observe { element, threshold, private_root }
        }),
        3 => element.clone().prop_map(|element| Op::Unobserve { element }),
        3 => (element, 0.0f64..=1.0).prop_map(|(element, ratio)| Op::Deliver { element, ratio }),
        1 => Just(Op::Destroy),
    ]
}

fn options_for(threshold: f64, private_root: bool) -> ObserveOptions {
    let options = ObserveOptions::new().with_threshold(threshold);
    if private_root {
        // Root without a root id: forces a private channel.
        options.with_root(ElementId::new(1000))
    } else {
        options
    }
}

proptest! {
    #[test]
    fn registry_keys_match_live_references(ops in proptest::collection::vec(op_strategy(), 1..40)) {
        let backend = FakeBackend::new();
        let mut tracker = VisibilityTracker::new(backend.clone());
        // Model: element → (key or None for private) for live records.
        let mut model: HashMap<u64, Option<String>> = HashMap::new();

        for op in &ops {
            match op {
                Op::Observe { element, threshold, private_root } => {
                    let options = options_for(*threshold, *private_root);
                    let key = channel_key(&options, None);
                    let snapshot = tracker.observe(
                        ElementId::new(*element),
                        |_| {},
                        options,
                        None,
                    );
                    prop_assert_eq!(&snapshot.channel_key, &key);
                    model.insert(*element, key);
                }
                Op::Unobserve { element } => {
                    tracker.unobserve(ElementId::new(*element));
                    model.remove(element);
                }
                Op::Deliver { element, ratio } => {
                    tracker.deliver(&[IntersectionEntry::new(ElementId::new(*element), *ratio)]);
                }
                Op::Destroy => {
                    tracker.destroy();
                    model.clear();
                }
            }

            // Invariant 1: registry size equals distinct keys among live
            // shared records.
            let live_keys: HashSet<&String> =
                model.values().filter_map(|key| key.as_ref()).collect();
            prop_assert_eq!(tracker.channel_len(), live_keys.len());

            // Invariant 2: open backend channels = registered + live private.
            let live_private = model.values().filter(|key| key.is_none()).count();
            prop_assert_eq!(backend.open_channels(), live_keys.len() + live_private);

            prop_assert_eq!(tracker.tracked_len(), model.len());
        }
    }
}

proptest! {
    #[test]
    fn visible_state_tracks_last_classification(
        threshold in prop_oneof![Just(0.0), Just(0.25), Just(0.5), Just(0.75), Just(1.0)],
        ratios in proptest::collection::vec(0.0f64..=1.0, 1..30),
    ) {
        let mut tracker = VisibilityTracker::new(FakeBackend::new());
        let element = ElementId::new(1);
        let log = CallbackLog::new();
        tracker.observe(
            element,
            log.callback(),
            ObserveOptions::new().with_threshold(threshold),
            None,
        );

        let mut expected_visible = false;
        let mut expected_calls = Vec::new();
        for ratio in &ratios {
            let qualifies = if expected_visible {
                *ratio > threshold
            } else {
                *ratio >= threshold
            };
            expected_visible = qualifies;
            expected_calls.push(qualifies);
            tracker.deliver(&[IntersectionEntry::new(element, *ratio)]);
        }

        prop_assert_eq!(log.calls(), expected_calls);
        prop_assert_eq!(tracker.snapshot(element).unwrap().visible, expected_visible);
    }
}

proptest! {
    #[test]
    fn channel_key_is_deterministic(
        threshold in 0.0f64..=1.0,
        margin in proptest::option::of("[0-9]{1,2}px"),
        root_id in proptest::option::of("[a-z]{1,8}"),
        has_root in any::<bool>(),
    ) {
        let mut options = ObserveOptions::new().with_threshold(threshold);
        if let Some(margin) = &margin {
            options = options.with_root_margin(margin.clone());
        }
        if has_root {
            options = options.with_root(ElementId::new(7));
        }

        let first = channel_key(&options, root_id.as_deref());
        let second = channel_key(&options, root_id.as_deref());
        prop_assert_eq!(&first, &second);

        // Private exactly when a root is present without a root id.
        prop_assert_eq!(first.is_none(), has_root && root_id.is_none());
    }
}
