#![forbid(unsafe_code)]

//! JSON scenario fixtures.
//!
//! A scenario is a named sequence of tracker operations interleaved with
//! expectations, stored as JSON under `tests/fixtures/`. The runner replays
//! the steps against a fresh `VisibilityTracker<FakeBackend>` and panics with
//! the scenario name on the first failed expectation, so fixture files double
//! as executable documentation of the lifecycle rules.

use std::collections::HashMap;

use serde::Deserialize;

use sightline_core::{
    ElementId, IntersectionEntry, ObserveOptions, Threshold, VisibilityTracker,
};

use crate::{CallbackLog, FakeBackend};

/// A named, replayable tracker scenario.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<Step>,
}

/// One scenario step: an operation on the tracker or an expectation.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Observe {
        element: u64,
        #[serde(default)]
        threshold: Option<ThresholdValue>,
        #[serde(default)]
        root: Option<u64>,
        #[serde(default)]
        root_margin: Option<String>,
        #[serde(default)]
        root_id: Option<String>,
    },
    Unobserve {
        element: u64,
    },
    Deliver {
        entries: Vec<EntryValue>,
    },
    Destroy,
    /// Assert the full callback trace recorded for an element so far.
    ExpectCalls {
        element: u64,
        calls: Vec<bool>,
    },
    /// Assert registry sizes and backend liveness.
    ExpectChannels {
        registered: usize,
        #[serde(default)]
        open: Option<usize>,
    },
    /// Assert whether an element is currently tracked.
    ExpectTracked {
        element: u64,
        tracked: bool,
    },
}

/// JSON-friendly threshold: a scalar or a step list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ThresholdValue {
    Ratio(f64),
    Steps(Vec<f64>),
}

impl From<&ThresholdValue> for Threshold {
    fn from(value: &ThresholdValue) -> Self {
        match value {
            ThresholdValue::Ratio(ratio) => Threshold::Ratio(*ratio),
            ThresholdValue::Steps(steps) => Threshold::steps(steps.iter().copied()),
        }
    }
}

/// JSON-friendly intersection entry.
#[derive(Debug, Deserialize)]
pub struct EntryValue {
    pub element: u64,
    pub ratio: f64,
    #[serde(default)]
    pub is_intersecting: Option<bool>,
}

impl Scenario {
    /// Parse a scenario from JSON text.
    ///
    /// # Panics
    /// Panics on malformed fixture JSON; fixtures are repo-controlled.
    #[must_use]
    pub fn from_json(json: &str) -> Self {
        serde_json::from_str(json).expect("malformed scenario fixture")
    }

    /// Replay the scenario against a fresh tracker and fake backend.
    ///
    /// # Panics
    /// Panics with the scenario name when an expectation fails.
    pub fn run(&self) {
        let backend = FakeBackend::new();
        let mut tracker = VisibilityTracker::new(backend.clone());
        let mut logs: HashMap<u64, CallbackLog> = HashMap::new();

        for (index, step) in self.steps.iter().enumerate() {
            match step {
                Step::Observe {
                    element,
                    threshold,
                    root,
                    root_margin,
                    root_id,
                } => {
                    let mut options = ObserveOptions::default();
                    if let Some(value) = threshold {
                        options.threshold = Some(Threshold::from(value));
                    }
                    if let Some(root) = root {
                        options = options.with_root(ElementId::new(*root));
                    }
                    if let Some(margin) = root_margin {
                        options = options.with_root_margin(margin.clone());
                    }
                    let log = logs.entry(*element).or_default().clone();
                    tracker.observe(
                        ElementId::new(*element),
                        log.callback(),
                        options,
                        root_id.as_deref(),
                    );
                }
                Step::Unobserve { element } => {
                    tracker.unobserve(ElementId::new(*element));
                }
                Step::Deliver { entries } => {
                    let batch: Vec<IntersectionEntry> = entries
                        .iter()
                        .map(|value| IntersectionEntry {
                            target: ElementId::new(value.element),
                            ratio: value.ratio,
                            is_intersecting: value.is_intersecting,
                        })
                        .collect();
                    tracker.deliver(&batch);
                }
                Step::Destroy => tracker.destroy(),
                Step::ExpectCalls { element, calls } => {
                    let got = logs.get(element).map(CallbackLog::calls).unwrap_or_default();
                    assert_eq!(
                        &got, calls,
                        "scenario '{}' step {index}: callback trace mismatch for element {element}",
                        self.name
                    );
                }
                Step::ExpectChannels { registered, open } => {
                    assert_eq!(
                        tracker.channel_len(),
                        *registered,
                        "scenario '{}' step {index}: channel registry size",
                        self.name
                    );
                    if let Some(open) = open {
                        assert_eq!(
                            backend.open_channels(),
                            *open,
                            "scenario '{}' step {index}: open backend channels",
                            self.name
                        );
                    }
                }
                Step::ExpectTracked { element, tracked } => {
                    assert_eq!(
                        tracker.is_tracked(ElementId::new(*element)),
                        *tracked,
                        "scenario '{}' step {index}: tracked state of element {element}",
                        self.name
                    );
                }
            }
        }
    }
}
