#![forbid(unsafe_code)]

//! Raw intersection events delivered by the native primitive.

use crate::options::ElementId;

/// One raw visibility report for a tracked element.
///
/// `is_intersecting` is absent on primitives that cannot report it; when
/// present, a `false` value overrides any qualifying ratio (some primitives
/// report ratio 0 ambiguously at the boundary).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    /// The element the report is about.
    pub target: ElementId,
    /// Fraction of the element intersecting the root, in `[0, 1]`.
    pub ratio: f64,
    /// Whether the primitive considers the element intersecting at all.
    pub is_intersecting: Option<bool>,
}

impl IntersectionEntry {
    /// An entry with no intersecting flag.
    #[must_use]
    pub fn new(target: ElementId, ratio: f64) -> Self {
        Self {
            target,
            ratio,
            is_intersecting: None,
        }
    }

    /// Attach the primitive's intersecting flag.
    #[must_use]
    pub fn with_flag(mut self, is_intersecting: bool) -> Self {
        self.is_intersecting = Some(is_intersecting);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_defaults_to_no_flag() {
        let entry = IntersectionEntry::new(ElementId::new(1), 0.5);
        assert_eq!(entry.ratio, 0.5);
        assert_eq!(entry.is_intersecting, None);
    }

    #[test]
    fn with_flag_sets_flag() {
        let entry = IntersectionEntry::new(ElementId::new(1), 0.5).with_flag(false);
        assert_eq!(entry.is_intersecting, Some(false));
    }
}
