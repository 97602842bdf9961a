#![forbid(unsafe_code)]

//! Test harness for Sightline: a deterministic fake of the native
//! visibility-observation primitive, plus JSON scenario fixtures.
//!
//! [`FakeBackend`] records every `observe`/`unobserve`/`disconnect` call per
//! channel so tests can assert on channel lifecycle down to call order.
//! Channels share a single log through `Rc<RefCell<_>>` — the tracker model
//! is single-threaded, so no locking.

use std::cell::RefCell;
use std::rc::Rc;

use sightline_core::{ChannelConfig, ElementId, VisibilityBackend, VisibilityChannel};

pub mod script;

/// Index of a channel in open order (0 = first channel ever opened).
pub type ChannelId = usize;

/// One recorded call on a fake channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelCall {
    Observe(ElementId),
    Unobserve(ElementId),
    Disconnect,
}

#[derive(Debug)]
struct ChannelState {
    config: ChannelConfig,
    calls: Vec<ChannelCall>,
    /// Elements currently observed on this channel.
    observed: Vec<ElementId>,
    disconnected: bool,
}

#[derive(Debug, Default)]
struct BackendLog {
    channels: Vec<ChannelState>,
}

/// Fake native primitive with a shared call log.
///
/// Cloning yields another handle to the same log, so a test can keep a handle
/// for assertions while the tracker owns the backend.
#[derive(Debug, Default, Clone)]
pub struct FakeBackend {
    log: Rc<RefCell<BackendLog>>,
}

impl FakeBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total channels ever opened.
    #[must_use]
    pub fn opened(&self) -> usize {
        self.log.borrow().channels.len()
    }

    /// Channels opened and not yet disconnected.
    #[must_use]
    pub fn open_channels(&self) -> usize {
        self.log
            .borrow()
            .channels
            .iter()
            .filter(|ch| !ch.disconnected)
            .count()
    }

    /// Whether channel `id` has been disconnected.
    #[must_use]
    pub fn is_disconnected(&self, id: ChannelId) -> bool {
        self.log
            .borrow()
            .channels
            .get(id)
            .is_some_and(|ch| ch.disconnected)
    }

    /// Elements currently observed on channel `id`.
    #[must_use]
    pub fn observed(&self, id: ChannelId) -> Vec<ElementId> {
        self.log
            .borrow()
            .channels
            .get(id)
            .map(|ch| ch.observed.clone())
            .unwrap_or_default()
    }

    /// The configuration channel `id` was opened with.
    #[must_use]
    pub fn config(&self, id: ChannelId) -> Option<ChannelConfig> {
        self.log.borrow().channels.get(id).map(|ch| ch.config.clone())
    }

    /// Full call history of channel `id`.
    #[must_use]
    pub fn calls(&self, id: ChannelId) -> Vec<ChannelCall> {
        self.log
            .borrow()
            .channels
            .get(id)
            .map(|ch| ch.calls.clone())
            .unwrap_or_default()
    }
}

/// Channel handle produced by [`FakeBackend`].
#[derive(Debug)]
pub struct FakeChannel {
    id: ChannelId,
    log: Rc<RefCell<BackendLog>>,
}

impl FakeChannel {
    /// This channel's index in open order.
    #[must_use]
    pub fn id(&self) -> ChannelId {
        self.id
    }
}

impl VisibilityChannel for FakeChannel {
    fn observe(&mut self, element: ElementId) {
        let mut log = self.log.borrow_mut();
        let channel = &mut log.channels[self.id];
        channel.calls.push(ChannelCall::Observe(element));
        channel.observed.push(element);
    }

    fn unobserve(&mut self, element: ElementId) {
        let mut log = self.log.borrow_mut();
        let channel = &mut log.channels[self.id];
        channel.calls.push(ChannelCall::Unobserve(element));
        channel.observed.retain(|&observed| observed != element);
    }

    fn disconnect(&mut self) {
        let mut log = self.log.borrow_mut();
        let channel = &mut log.channels[self.id];
        channel.calls.push(ChannelCall::Disconnect);
        channel.disconnected = true;
        channel.observed.clear();
    }
}

impl VisibilityBackend for FakeBackend {
    type Channel = FakeChannel;

    fn open_channel(&mut self, config: ChannelConfig) -> FakeChannel {
        let mut log = self.log.borrow_mut();
        let id = log.channels.len();
        log.channels.push(ChannelState {
            config,
            calls: Vec::new(),
            observed: Vec::new(),
            disconnected: false,
        });
        FakeChannel {
            id,
            log: Rc::clone(&self.log),
        }
    }
}

/// Records every boolean the tracker hands to a callback.
///
/// Clones share the same log; hand `callback()` to `observe` and assert on
/// `calls()` afterwards.
#[derive(Debug, Default, Clone)]
pub struct CallbackLog {
    calls: Rc<RefCell<Vec<bool>>>,
}

impl CallbackLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A closure suitable for `VisibilityTracker::observe`.
    #[must_use]
    pub fn callback(&self) -> impl FnMut(bool) + 'static {
        let calls = Rc::clone(&self.calls);
        move |in_view| calls.borrow_mut().push(in_view)
    }

    /// All recorded invocations, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<bool> {
        self.calls.borrow().clone()
    }

    /// The most recent invocation, if any.
    #[must_use]
    pub fn last(&self) -> Option<bool> {
        self.calls.borrow().last().copied()
    }

    /// Number of invocations so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }
}
