#![forbid(unsafe_code)]

//! The segment currently in force.

use std::fmt;
use std::sync::Arc;

use crate::direction::InputDirection;
use crate::mapping::Mapping;
use crate::spec::{Breakpoint, BreakpointKey, MotionSpec};

/// Identity of a segment: its bounding breakpoints and the direction it
/// belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentKey {
    pub min_breakpoint: BreakpointKey,
    pub max_breakpoint: BreakpointKey,
    pub direction: InputDirection,
}

impl SegmentKey {
    /// Same bounds, regardless of direction.
    #[must_use]
    pub fn same_bounds(&self, other: &Self) -> bool {
        self.min_breakpoint == other.min_breakpoint && self.max_breakpoint == other.max_breakpoint
    }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}]@{:?}",
            self.min_breakpoint, self.max_breakpoint, self.direction
        )
    }
}

/// A resolved segment: bounds, mapping, and the spec it came from.
///
/// Carried forward unchanged between frames for as long as the input stays
/// inside it and the spec is not replaced.
#[derive(Clone)]
pub struct SegmentData {
    spec: Arc<MotionSpec>,
    direction: InputDirection,
    index: usize,
    min_breakpoint: Breakpoint,
    max_breakpoint: Breakpoint,
    mapping: Mapping,
}

impl SegmentData {
    pub(crate) fn new(
        spec: Arc<MotionSpec>,
        direction: InputDirection,
        index: usize,
        min_breakpoint: Breakpoint,
        max_breakpoint: Breakpoint,
        mapping: Mapping,
    ) -> Self {
        Self {
            spec,
            direction,
            index,
            min_breakpoint,
            max_breakpoint,
            mapping,
        }
    }

    #[inline]
    #[must_use]
    pub fn spec(&self) -> &Arc<MotionSpec> {
        &self.spec
    }

    #[inline]
    #[must_use]
    pub fn direction(&self) -> InputDirection {
        self.direction
    }

    /// Segment index within the directional spec.
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    #[must_use]
    pub fn min_breakpoint(&self) -> &Breakpoint {
        &self.min_breakpoint
    }

    #[inline]
    #[must_use]
    pub fn max_breakpoint(&self) -> &Breakpoint {
        &self.max_breakpoint
    }

    #[inline]
    #[must_use]
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// The breakpoint through which travel in this segment's direction
    /// enters it.
    #[inline]
    #[must_use]
    pub fn entry_breakpoint(&self) -> &Breakpoint {
        match self.direction {
            InputDirection::Max => &self.min_breakpoint,
            InputDirection::Min => &self.max_breakpoint,
        }
    }

    #[must_use]
    pub fn key(&self) -> SegmentKey {
        SegmentKey {
            min_breakpoint: self.min_breakpoint.key.clone(),
            max_breakpoint: self.max_breakpoint.key.clone(),
            direction: self.direction,
        }
    }

    /// Whether this segment is still the right one for `input` moving in
    /// `direction`.
    #[must_use]
    pub fn is_valid_for_input(&self, input: f32, direction: InputDirection) -> bool {
        if direction != self.direction {
            return false;
        }
        let min = self.min_breakpoint.position;
        let max = self.max_breakpoint.position;
        match direction {
            InputDirection::Max => min <= input && input < max,
            InputDirection::Min => min < input && input <= max,
        }
    }
}

impl PartialEq for SegmentData {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.spec, &other.spec)
            && self.direction == other.direction
            && self.index == other.index
            && self.min_breakpoint == other.min_breakpoint
            && self.max_breakpoint == other.max_breakpoint
            && self.mapping == other.mapping
    }
}

impl fmt::Debug for SegmentData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentData")
            .field("key", &self.key())
            .field("index", &self.index)
            .field("mapping", &self.mapping)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::DirectionalSpec;

    fn spec() -> Arc<MotionSpec> {
        Arc::new(MotionSpec::symmetric(
            DirectionalSpec::new(
                vec![Breakpoint::new("a", 1.0), Breakpoint::new("b", 2.0)],
                vec![Mapping::Zero, Mapping::Identity, Mapping::One],
            )
            .unwrap(),
        ))
    }

    #[test]
    fn validity_respects_tie_break() {
        let spec = spec();
        let max = spec.segment_at_input(1.5, InputDirection::Max);
        assert!(max.is_valid_for_input(1.0, InputDirection::Max));
        assert!(!max.is_valid_for_input(2.0, InputDirection::Max));
        assert!(!max.is_valid_for_input(1.5, InputDirection::Min));

        let min = spec.segment_at_input(1.5, InputDirection::Min);
        assert!(!min.is_valid_for_input(1.0, InputDirection::Min));
        assert!(min.is_valid_for_input(2.0, InputDirection::Min));
    }

    #[test]
    fn keys_compare_bounds() {
        let spec = spec();
        let max = spec.segment_at_input(1.5, InputDirection::Max).key();
        let min = spec.segment_at_input(1.5, InputDirection::Min).key();
        assert_ne!(max, min);
        assert!(max.same_bounds(&min));
        assert_eq!(max.to_string(), "[a, b]@Max");
    }

    #[test]
    fn equality_includes_spec_identity() {
        let a = spec();
        let b = spec();
        assert_eq!(
            a.segment_at_input(0.0, InputDirection::Max),
            a.segment_at_input(0.5, InputDirection::Max)
        );
        assert_ne!(
            a.segment_at_input(0.0, InputDirection::Max),
            b.segment_at_input(0.0, InputDirection::Max)
        );
    }
}
