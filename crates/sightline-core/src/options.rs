#![forbid(unsafe_code)]

//! Observation configuration: element identity, thresholds, and scroll roots.
//!
//! # Design
//!
//! The tracker never owns the element it monitors — elements belong to the
//! rendering context. [`ElementId`] is a non-owning key: lookups use identity
//! only, and a record's lifetime is governed by explicit `unobserve`/`destroy`
//! calls, never by the registry.
//!
//! A [`Threshold`] is either a single ratio or an ordered sequence of ratios.
//! Sequences deliberately re-fire the change callback as the intersection
//! ratio crosses successive steps; only the first step participates in
//! channel-key derivation (see [`crate::key`]).

use smallvec::SmallVec;

/// Identity of a rendered element.
///
/// Opaque to the tracker; the embedder assigns ids and keeps them stable for
/// the lifetime of the element. Two observations with the same id address the
/// same tracking record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    /// Wrap a raw id.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for ElementId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Storage for multi-threshold step lists. Step lists are tiny in practice
/// (a handful of ratios), so they live inline.
pub type ThresholdSteps = SmallVec<[f64; 4]>;

/// Visibility threshold: how much of the element must intersect the viewport
/// before it counts as "in view".
#[derive(Debug, Clone, PartialEq)]
pub enum Threshold {
    /// Single ratio in `[0, 1]`.
    Ratio(f64),
    /// Ordered sequence of ratios. The callback fires once per step crossing.
    Steps(ThresholdSteps),
}

impl Threshold {
    /// Build a step sequence from any iterator of ratios.
    #[must_use]
    pub fn steps(steps: impl IntoIterator<Item = f64>) -> Self {
        Threshold::Steps(steps.into_iter().collect())
    }

    /// The value encoded into the channel key: the scalar, or the first step.
    /// An empty step list falls back to 0.0.
    #[must_use]
    pub fn representative(&self) -> f64 {
        match self {
            Threshold::Ratio(ratio) => *ratio,
            Threshold::Steps(steps) => steps.first().copied().unwrap_or(0.0),
        }
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::Ratio(0.0)
    }
}

impl From<f64> for Threshold {
    fn from(ratio: f64) -> Self {
        Threshold::Ratio(ratio)
    }
}

/// Configuration for one observation.
///
/// `Default` matches the common case: threshold 0 (any visible pixel counts),
/// viewport root, no margin. A caller that explicitly clears the threshold
/// (`without_threshold`) opts into a record that never classifies as in view —
/// a silent misconfiguration, kept representable because key derivation still
/// treats it as threshold 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserveOptions {
    /// Visibility threshold. `None` never reports in view.
    pub threshold: Option<Threshold>,
    /// Scrollable ancestor to intersect against instead of the viewport.
    pub root: Option<ElementId>,
    /// CSS-margin-syntax string applied to the root's bounding box.
    pub root_margin: Option<String>,
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            threshold: Some(Threshold::Ratio(0.0)),
            root: None,
            root_margin: None,
        }
    }
}

impl ObserveOptions {
    /// Default options: threshold 0, viewport root, no margin.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: impl Into<Threshold>) -> Self {
        self.threshold = Some(threshold.into());
        self
    }

    /// Clear the threshold entirely. Classification never reports true for
    /// such a record.
    #[must_use]
    pub fn without_threshold(mut self) -> Self {
        self.threshold = None;
        self
    }

    #[must_use]
    pub fn with_root(mut self, root: ElementId) -> Self {
        self.root = Some(root);
        self
    }

    #[must_use]
    pub fn with_root_margin(mut self, margin: impl Into<String>) -> Self {
        self.root_margin = Some(margin.into());
        self
    }
}
