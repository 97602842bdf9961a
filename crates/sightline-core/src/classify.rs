#![forbid(unsafe_code)]

//! In-view classification with hysteresis.
//!
//! # Policy
//!
//! A record becomes visible when the ratio reaches a threshold (`>=`) and
//! stays visible only while the ratio exceeds it (`>`). The asymmetry stops
//! the state from toggling on repeated reports exactly at the boundary.
//!
//! Step sequences use "some" semantics: the record is in view if any step
//! qualifies. Combined with the hysteresis comparison this re-fires the
//! callback as the ratio crosses successive steps — intentional, so callers
//! can animate on partial visibility.
//!
//! A present-but-false intersecting flag forces the result to false
//! regardless of ratio, compensating for primitives that report ratio 0
//! ambiguously.

use crate::event::IntersectionEntry;
use crate::options::Threshold;

/// Classify one raw entry against the record's threshold and current state.
///
/// `visible` is the record's last reported state; a `None` threshold never
/// classifies as in view.
#[must_use]
pub fn in_view(threshold: Option<&Threshold>, visible: bool, entry: &IntersectionEntry) -> bool {
    let crosses = |step: f64| {
        if visible {
            entry.ratio > step
        } else {
            entry.ratio >= step
        }
    };

    let mut in_view = match threshold {
        Some(Threshold::Steps(steps)) => steps.iter().copied().any(crosses),
        Some(Threshold::Ratio(ratio)) => crosses(*ratio),
        None => false,
    };

    if let Some(intersecting) = entry.is_intersecting {
        in_view = in_view && intersecting;
    }

    in_view
}
