#![forbid(unsafe_code)]

//! The visibility tracker: channel registry, tracking registry, lifecycle.
//!
//! # Design
//!
//! [`VisibilityTracker`] multiplexes many tracked elements over a small
//! number of channels. `observe` derives a channel key from the options,
//! fetches-or-creates the channel, registers the element's tracking record,
//! and subscribes the element. `unobserve` reverses each step and tears the
//! channel down when its last referent leaves. Both registries live inside
//! the tracker rather than in process-wide statics, so independent trackers
//! coexist and tear down deterministically.
//!
//! # Invariants
//!
//! 1. While a record exists, exactly one of {its channel key resolves to a
//!    registered channel, its private channel is set} holds.
//! 2. A shared channel is evicted exactly when the last record referencing
//!    its key is removed — never earlier, never leaked after.
//! 3. A record's `visible` state starts false and always equals the
//!    classification of the last delivered entry for its element.
//! 4. Re-observing a tracked element releases the prior subscription first,
//!    so the scan-based reference check never under-counts.
//!
//! # Failure Modes
//!
//! Invalid inputs degrade to no-ops (untracked `unobserve`, entries for
//! elements no longer tracked). Nothing here reports errors outward; callers
//! wanting diagnostics wrap the calls themselves.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::backend::{ChannelConfig, VisibilityBackend, VisibilityChannel};
use crate::classify;
use crate::event::IntersectionEntry;
use crate::key::channel_key;
use crate::options::{ElementId, ObserveOptions};

/// Callback invoked with the element's new in-view state.
pub type InViewCallback = Box<dyn FnMut(bool)>;

/// One tracked element's state.
struct TrackingRecord<C> {
    callback: InViewCallback,
    visible: bool,
    options: ObserveOptions,
    channel_key: Option<String>,
    /// Set only when `channel_key` is `None`: the record owns its channel.
    private_channel: Option<C>,
}

/// Diagnostic view of a tracking record, returned by [`VisibilityTracker::observe`]
/// and [`VisibilityTracker::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingSnapshot {
    pub element: ElementId,
    pub visible: bool,
    /// Dedup key of the shared channel, or `None` for a private channel.
    pub channel_key: Option<String>,
    /// Whether the element rides a registry-shared channel.
    pub shared: bool,
}

/// Multiplexing registry for element visibility subscriptions.
pub struct VisibilityTracker<B: VisibilityBackend> {
    backend: B,
    /// Channel registry: dedup key → live shared channel.
    channels: HashMap<String, B::Channel>,
    /// Tracking registry: element → record.
    records: HashMap<ElementId, TrackingRecord<B::Channel>>,
}

impl<B: VisibilityBackend> std::fmt::Debug for VisibilityTracker<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilityTracker")
            .field("channels", &self.channels.len())
            .field("records", &self.records.len())
            .finish()
    }
}

impl<B: VisibilityBackend> VisibilityTracker<B> {
    /// Create a tracker over the given backend with empty registries.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            channels: HashMap::new(),
            records: HashMap::new(),
        }
    }

    /// Access the backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Begin tracking `element`, invoking `callback` with each classified
    /// in-view change.
    ///
    /// Elements with identical (threshold-representative, root margin,
    /// root id) configuration share one channel. A custom root without a
    /// `root_id` yields a private channel owned by the record.
    ///
    /// Observing an element that is already tracked unobserves it first, so
    /// the previous channel's subscription is released before the record is
    /// replaced.
    pub fn observe(
        &mut self,
        element: ElementId,
        callback: impl FnMut(bool) + 'static,
        options: ObserveOptions,
        root_id: Option<&str>,
    ) -> TrackingSnapshot {
        if self.records.contains_key(&element) {
            trace!(element = element.raw(), "re-observe, releasing prior subscription");
            self.unobserve(element);
        }

        let key = channel_key(&options, root_id);

        let private_channel = match &key {
            Some(key) => {
                if self.channels.contains_key(key) {
                    trace!(element = element.raw(), key = %key, "reusing shared channel");
                } else {
                    debug!(element = element.raw(), key = %key, "opening shared channel");
                    let channel = self.backend.open_channel(ChannelConfig::from(&options));
                    self.channels.insert(key.clone(), channel);
                }
                None
            }
            None => {
                debug!(element = element.raw(), "opening private channel");
                Some(self.backend.open_channel(ChannelConfig::from(&options)))
            }
        };

        let record = TrackingRecord {
            callback: Box::new(callback),
            visible: false,
            options,
            channel_key: key.clone(),
            private_channel,
        };
        self.records.insert(element, record);

        // Subscribe last, once the record is in place.
        match &key {
            Some(key) => {
                if let Some(channel) = self.channels.get_mut(key) {
                    channel.observe(element);
                }
            }
            None => {
                if let Some(record) = self.records.get_mut(&element)
                    && let Some(channel) = record.private_channel.as_mut()
                {
                    channel.observe(element);
                }
            }
        }

        TrackingSnapshot {
            element,
            visible: false,
            channel_key: key.clone(),
            shared: key.is_some(),
        }
    }

    /// Stop tracking `element`. No-op when the element is untracked.
    ///
    /// After this returns the element receives no further callback
    /// invocations. A shared channel is disconnected and evicted exactly when
    /// its last referent leaves; a private channel is torn down immediately.
    pub fn unobserve(&mut self, element: ElementId) {
        let Some(mut record) = self.records.remove(&element) else {
            return;
        };

        if let Some(key) = record.channel_key.take() {
            if let Some(channel) = self.channels.get_mut(&key) {
                channel.unobserve(element);
            }
            // Linear scan over the remaining records; eviction only when the
            // last referent of this key has left.
            let still_referenced = self
                .records
                .values()
                .any(|other| other.channel_key.as_deref() == Some(key.as_str()));
            if !still_referenced
                && let Some(mut channel) = self.channels.remove(&key)
            {
                debug!(key = %key, "last referent left, disconnecting shared channel");
                channel.disconnect();
            }
        } else if let Some(mut channel) = record.private_channel.take() {
            debug!(element = element.raw(), "disconnecting private channel");
            channel.unobserve(element);
            channel.disconnect();
        }
    }

    /// Full teardown: disconnect every channel and clear both registries.
    ///
    /// Individual elements are not unsubscribed first; disconnecting a
    /// channel is sufficient cleanup for everything riding it. Private
    /// channels, which never enter the registry, are disconnected via their
    /// owning records.
    pub fn destroy(&mut self) {
        debug!(
            channels = self.channels.len(),
            records = self.records.len(),
            "destroying tracker"
        );
        for (_, mut channel) in self.channels.drain() {
            channel.disconnect();
        }
        for (_, mut record) in self.records.drain() {
            if let Some(mut channel) = record.private_channel.take() {
                channel.disconnect();
            }
        }
    }

    /// Classify a batch of raw entries and invoke the affected callbacks.
    ///
    /// Entries for elements no longer tracked are ignored — batches can
    /// arrive asynchronously after `unobserve`.
    pub fn deliver(&mut self, entries: &[IntersectionEntry]) {
        for entry in entries {
            let Some(record) = self.records.get_mut(&entry.target) else {
                trace!(target = entry.target.raw(), "entry for untracked element, ignoring");
                continue;
            };
            let in_view = classify::in_view(record.options.threshold.as_ref(), record.visible, entry);
            record.visible = in_view;
            (record.callback)(in_view);
        }
    }

    /// Number of tracked elements.
    #[must_use]
    pub fn tracked_len(&self) -> usize {
        self.records.len()
    }

    /// Number of shared channels in the registry (private channels excluded).
    #[must_use]
    pub fn channel_len(&self) -> usize {
        self.channels.len()
    }

    /// Whether `element` is currently tracked.
    #[must_use]
    pub fn is_tracked(&self, element: ElementId) -> bool {
        self.records.contains_key(&element)
    }

    /// True when both registries are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.channels.is_empty()
    }

    /// Diagnostic view of an element's record, if tracked.
    #[must_use]
    pub fn snapshot(&self, element: ElementId) -> Option<TrackingSnapshot> {
        self.records.get(&element).map(|record| TrackingSnapshot {
            element,
            visible: record.visible,
            channel_key: record.channel_key.clone(),
            shared: record.channel_key.is_some(),
        })
    }
}
