#![forbid(unsafe_code)]

//! Core: multiplexed visibility tracking for rendered elements.
//!
//! # Role in Sightline
//! `sightline-core` owns the two registries that multiplex many tracked
//! elements across a small number of native visibility subscriptions, plus
//! the policy that turns raw intersection reports into boolean in-view
//! changes.
//!
//! # Primary responsibilities
//! - **VisibilityTracker**: observe/unobserve/destroy lifecycle and the
//!   channel registry keyed by derived dedup keys.
//! - **Channel keys**: deterministic derivation from threshold, root margin,
//!   and caller-supplied root ids.
//! - **Classification**: hysteresis and multi-threshold "some" semantics,
//!   with the intersecting-flag override.
//! - **Backend seam**: traits abstracting the native observation primitive
//!   (observe/unobserve/disconnect).
//!
//! # How it fits in the system
//! The rendering layer decides *what* to track and wires element lifecycles
//! to `observe`/`unobserve`; the native primitive decides *when* reports
//! arrive. This crate is the bridge: it owns no elements, performs no
//! rendering, and issues nothing to the primitive beyond the three channel
//! calls.

pub mod backend;
pub mod classify;
pub mod event;
pub mod key;
pub mod options;
pub mod tracker;

pub use backend::{ChannelConfig, VisibilityBackend, VisibilityChannel};
pub use event::IntersectionEntry;
pub use key::channel_key;
pub use options::{ElementId, ObserveOptions, Threshold, ThresholdSteps};
pub use tracker::{InViewCallback, TrackingSnapshot, VisibilityTracker};
