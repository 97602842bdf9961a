#![forbid(unsafe_code)]

//! Seam to the native visibility-observation primitive.
//!
//! The tracker treats the primitive as a given capability: open a channel for
//! one (threshold, root, root margin) tuple, then `observe`/`unobserve`
//! elements on it and `disconnect` when done. Event batches flow back the
//! other way — the embedder collects them from the primitive and hands them
//! to [`crate::tracker::VisibilityTracker::deliver`]. Classification looks
//! records up by target element, so which channel produced a batch never
//! matters for dispatch.

use crate::options::{ElementId, ObserveOptions, Threshold};

/// The configuration a channel is constructed with.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    pub threshold: Option<Threshold>,
    pub root: Option<ElementId>,
    pub root_margin: Option<String>,
}

impl From<&ObserveOptions> for ChannelConfig {
    fn from(options: &ObserveOptions) -> Self {
        Self {
            threshold: options.threshold.clone(),
            root: options.root,
            root_margin: options.root_margin.clone(),
        }
    }
}

/// One live subscription stream on the native primitive.
pub trait VisibilityChannel {
    /// Begin delivering events for `element`.
    fn observe(&mut self, element: ElementId);

    /// Stop delivering events for `element`.
    fn unobserve(&mut self, element: ElementId);

    /// Stop all delivery and release underlying resources.
    fn disconnect(&mut self);
}

/// Factory for visibility channels.
pub trait VisibilityBackend {
    type Channel: VisibilityChannel;

    /// Construct a channel configured with one particular tuple.
    fn open_channel(&mut self, config: ChannelConfig) -> Self::Channel;
}
