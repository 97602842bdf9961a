#![forbid(unsafe_code)]

//! Channel key derivation.
//!
//! The key is the dedup handle for the channel registry: two observations
//! whose configuration derives the same key share one underlying channel.
//! The key encodes only the representative threshold (the scalar, or the
//! first step of a sequence), the root margin, and the caller-supplied root
//! id — not the full step list.
//!
//! A custom scroll root cannot itself be stringified, so observing against
//! one without a `root_id` yields `None`: the element gets a private,
//! unshared channel instead.

use crate::options::{ObserveOptions, Threshold};

/// Derive the channel key for `options`, or `None` for a private channel.
///
/// Deterministic and side-effect free: identical
/// (threshold-representative, root margin, root id) inputs produce identical
/// keys.
#[must_use]
pub fn channel_key(options: &ObserveOptions, root_id: Option<&str>) -> Option<String> {
    let threshold = options
        .threshold
        .as_ref()
        .map_or(0.0, Threshold::representative);

    let base = match &options.root_margin {
        Some(margin) => format!("{threshold}_{margin}"),
        None => format!("{threshold}"),
    };

    if options.root.is_some() {
        // The root reference has no stable string form; sharing requires a
        // caller-supplied id.
        root_id.map(|id| format!("{id}_{base}"))
    } else {
        Some(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ElementId;

    #[test]
    fn scalar_threshold_key() {
        let options = ObserveOptions::new().with_threshold(0.5);
        assert_eq!(channel_key(&options, None).as_deref(), Some("0.5"));
    }

    #[test]
    fn default_threshold_key_is_zero() {
        let options = ObserveOptions::default();
        assert_eq!(channel_key(&options, None).as_deref(), Some("0"));
    }

    #[test]
    fn missing_threshold_keys_as_zero() {
        let options = ObserveOptions::new().without_threshold();
        assert_eq!(channel_key(&options, None).as_deref(), Some("0"));
    }

    #[test]
    fn steps_key_uses_first_entry_only() {
        let a = ObserveOptions::new().with_threshold(Threshold::steps([0.25, 0.5, 1.0]));
        let b = ObserveOptions::new().with_threshold(Threshold::steps([0.25, 0.75]));
        assert_eq!(channel_key(&a, None).as_deref(), Some("0.25"));
        assert_eq!(channel_key(&a, None), channel_key(&b, None));
    }

    #[test]
    fn root_margin_is_appended() {
        let options = ObserveOptions::new()
            .with_threshold(1.0)
            .with_root_margin("10px 20px");
        assert_eq!(channel_key(&options, None).as_deref(), Some("1_10px 20px"));
    }

    #[test]
    fn root_without_id_is_private() {
        let options = ObserveOptions::new().with_root(ElementId::new(3));
        assert_eq!(channel_key(&options, None), None);
    }

    #[test]
    fn root_with_id_prefixes_key() {
        let options = ObserveOptions::new()
            .with_threshold(0.5)
            .with_root(ElementId::new(3));
        assert_eq!(
            channel_key(&options, Some("sidebar")).as_deref(),
            Some("sidebar_0.5")
        );
    }

    #[test]
    fn root_id_without_root_is_ignored() {
        let options = ObserveOptions::new().with_threshold(0.5);
        assert_eq!(channel_key(&options, Some("sidebar")).as_deref(), Some("0.5"));
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let options = ObserveOptions::new()
            .with_threshold(0.75)
            .with_root(ElementId::new(9))
            .with_root_margin("5px");
        let first = channel_key(&options, Some("panel"));
        let second = channel_key(&options, Some("panel"));
        assert_eq!(first, second);
        assert_eq!(first.as_deref(), Some("panel_0.75_5px"));
    }
}
