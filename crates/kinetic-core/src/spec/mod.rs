#![forbid(unsafe_code)]

//! Immutable, directional, piecewise motion specifications.
//!
//! A [`DirectionalSpec`] is an ordered list of breakpoints `b₀ < b₁ < … < bₙ`
//! interleaved with mappings. Two sentinel breakpoints at `-∞` and `+∞`
//! close the first and last segment, so segment `i` always lies between
//! breakpoint `i` and breakpoint `i + 1` and uses mapping `i`.
//!
//! A [`MotionSpec`] pairs one directional spec per [`InputDirection`] with
//! the spring used to smooth over spec swaps, plus optional segment change
//! handlers.
//!
//! # Invariants
//!
//! 1. Breakpoint positions within a directional spec are finite and strictly
//!    increasing (sentinels excepted).
//! 2. Breakpoint keys are unique within a directional spec and never reuse
//!    the sentinel keys.
//! 3. `mappings.len() == breakpoints.len() - 1`.
//! 4. A breakpoint exactly at the input belongs to the segment it starts
//!    when moving toward [`Max`](InputDirection::Max), and to the segment it
//!    ends when moving toward [`Min`](InputDirection::Min).

mod builder;

pub use builder::DirectionalSpecBuilder;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::direction::InputDirection;
use crate::error::{Result, SpecError};
use crate::guarantee::Guarantee;
use crate::mapping::Mapping;
use crate::segment::{SegmentData, SegmentKey};
use crate::semantics::{self, SemanticKey, SemanticTrack, SemanticValue};
use crate::spring::{SpringParameters, presets};

// ---------------------------------------------------------------------------
// Breakpoints
// ---------------------------------------------------------------------------

/// Identity of a breakpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BreakpointKey {
    /// Sentinel at `-∞`.
    MinLimit,
    /// Sentinel at `+∞`.
    MaxLimit,
    Named(Arc<str>),
}

impl BreakpointKey {
    #[must_use]
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self::Named(name.into())
    }

    #[inline]
    #[must_use]
    pub fn is_limit(&self) -> bool {
        matches!(self, Self::MinLimit | Self::MaxLimit)
    }
}

impl fmt::Display for BreakpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinLimit => f.write_str("<min>"),
            Self::MaxLimit => f.write_str("<max>"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl From<&str> for BreakpointKey {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<String> for BreakpointKey {
    fn from(name: String) -> Self {
        Self::named(name)
    }
}

/// An input position at which the active mapping changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Breakpoint {
    pub key: BreakpointKey,
    pub position: f32,
    /// Spring smoothing the discontinuity when this breakpoint is crossed.
    pub spring: SpringParameters,
    pub guarantee: Guarantee,
}

impl Breakpoint {
    /// A breakpoint with a critically damped spring and no guarantee.
    #[must_use]
    pub fn new(key: impl Into<BreakpointKey>, position: f32) -> Self {
        Self {
            key: key.into(),
            position,
            spring: presets::critical(),
            guarantee: Guarantee::None,
        }
    }

    #[must_use]
    pub fn with_spring(mut self, spring: SpringParameters) -> Self {
        self.spring = spring;
        self
    }

    #[must_use]
    pub fn with_guarantee(mut self, guarantee: Guarantee) -> Self {
        self.guarantee = guarantee;
        self
    }

    /// Sentinel closing the first segment.
    #[must_use]
    pub fn min_limit() -> Self {
        Self::new(BreakpointKey::MinLimit, f32::NEG_INFINITY)
    }

    /// Sentinel closing the last segment.
    #[must_use]
    pub fn max_limit() -> Self {
        Self::new(BreakpointKey::MaxLimit, f32::INFINITY)
    }
}

// ---------------------------------------------------------------------------
// DirectionalSpec
// ---------------------------------------------------------------------------

/// Breakpoints and mappings for one direction of travel.
#[derive(Debug, Clone)]
pub struct DirectionalSpec {
    breakpoints: Vec<Breakpoint>,
    mappings: Vec<Mapping>,
    semantics: Vec<SemanticTrack>,
}

impl DirectionalSpec {
    /// Validate and assemble a directional spec.
    ///
    /// `breakpoints` excludes the sentinels; `mappings` has one more entry
    /// than `breakpoints`.
    pub fn new(breakpoints: Vec<Breakpoint>, mappings: Vec<Mapping>) -> Result<Self> {
        Self::from_parts(breakpoints, mappings, Vec::new())
    }

    /// Start a builder whose first segment uses `initial`.
    #[must_use]
    pub fn builder(initial: Mapping) -> DirectionalSpecBuilder {
        DirectionalSpecBuilder::new(initial)
    }

    /// A single mapping everywhere, no breakpoints.
    #[must_use]
    pub fn uniform(mapping: Mapping) -> Self {
        Self {
            breakpoints: vec![Breakpoint::min_limit(), Breakpoint::max_limit()],
            mappings: vec![mapping],
            semantics: Vec::new(),
        }
    }

    /// Identity mapping everywhere.
    #[must_use]
    pub fn identity() -> Self {
        Self::uniform(Mapping::Identity)
    }

    pub(crate) fn from_parts(
        user_breakpoints: Vec<Breakpoint>,
        mappings: Vec<Mapping>,
        declared_semantics: Vec<(Arc<str>, usize, Arc<dyn SemanticValue>)>,
    ) -> Result<Self> {
        if mappings.len() != user_breakpoints.len() + 1 {
            return Err(SpecError::MappingCount {
                breakpoints: user_breakpoints.len(),
                expected: user_breakpoints.len() + 1,
                actual: mappings.len(),
            });
        }

        let mut seen = HashSet::with_capacity(user_breakpoints.len());
        let mut previous: Option<&Breakpoint> = None;
        for breakpoint in &user_breakpoints {
            if breakpoint.key.is_limit() {
                return Err(SpecError::ReservedKey {
                    key: breakpoint.key.clone(),
                });
            }
            if !breakpoint.position.is_finite() {
                return Err(SpecError::NonFinitePosition {
                    key: breakpoint.key.clone(),
                    position: breakpoint.position,
                });
            }
            if let Some(distance) = breakpoint.guarantee.distance()
                && !(distance.is_finite() && distance > 0.0)
            {
                return Err(SpecError::InvalidGuaranteeDistance {
                    key: breakpoint.key.clone(),
                    distance,
                });
            }
            if let Some(previous) = previous
                && breakpoint.position <= previous.position
            {
                return Err(SpecError::Unsorted {
                    key: breakpoint.key.clone(),
                    position: breakpoint.position,
                    previous_key: previous.key.clone(),
                    previous_position: previous.position,
                });
            }
            if !seen.insert(&breakpoint.key) {
                return Err(SpecError::DuplicateKey {
                    key: breakpoint.key.clone(),
                });
            }
            previous = Some(breakpoint);
        }

        let segment_count = mappings.len();
        let semantics = group_semantics(declared_semantics, segment_count);

        let mut breakpoints = Vec::with_capacity(user_breakpoints.len() + 2);
        breakpoints.push(Breakpoint::min_limit());
        breakpoints.extend(user_breakpoints);
        breakpoints.push(Breakpoint::max_limit());

        Ok(Self {
            breakpoints,
            mappings,
            semantics,
        })
    }

    /// All breakpoints, sentinels included.
    #[inline]
    #[must_use]
    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    /// All mappings; mapping `i` is valid between breakpoints `i` and `i + 1`.
    #[inline]
    #[must_use]
    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    #[inline]
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.mappings.len()
    }

    /// Index of the breakpoint with `key`, sentinels included.
    #[must_use]
    pub fn breakpoint_index(&self, key: &BreakpointKey) -> Option<usize> {
        match key {
            BreakpointKey::MinLimit => Some(0),
            BreakpointKey::MaxLimit => Some(self.breakpoints.len() - 1),
            BreakpointKey::Named(_) => self.breakpoints.iter().position(|b| &b.key == key),
        }
    }

    /// Index of the segment containing `input` when moving in `direction`.
    ///
    /// NaN input resolves to the first segment.
    #[must_use]
    pub fn segment_index_at(&self, input: f32, direction: InputDirection) -> usize {
        let count = match direction {
            InputDirection::Max => self.breakpoints.partition_point(|b| b.position <= input),
            InputDirection::Min => self.breakpoints.partition_point(|b| b.position < input),
        };
        count.clamp(1, self.breakpoints.len() - 1) - 1
    }

    /// Semantic values declared on `segment_index`, after backfilling.
    pub fn semantics_at(
        &self,
        segment_index: usize,
    ) -> impl Iterator<Item = (&str, &dyn SemanticValue)> + '_ {
        self.semantics
            .iter()
            .filter_map(move |track| Some((track.name(), track.value_at(segment_index)?)))
    }

    /// Typed semantic lookup on a segment of this directional spec.
    #[must_use]
    pub fn semantic_value<T: Clone + 'static>(
        &self,
        key: &SemanticKey<T>,
        segment_index: usize,
    ) -> Option<T> {
        let track = self.semantics.iter().find(|t| t.name() == key.name())?;
        semantics::downcast(track.value_at(segment_index)?)
    }
}

impl Default for DirectionalSpec {
    fn default() -> Self {
        Self::identity()
    }
}

fn group_semantics(
    declared: Vec<(Arc<str>, usize, Arc<dyn SemanticValue>)>,
    segment_count: usize,
) -> Vec<SemanticTrack> {
    let mut order: Vec<Arc<str>> = Vec::new();
    let mut by_name: HashMap<Arc<str>, Vec<(usize, Arc<dyn SemanticValue>)>> = HashMap::new();
    for (name, index, value) in declared {
        let entries = by_name.entry(Arc::clone(&name)).or_default();
        if entries.is_empty() {
            order.push(name);
        }
        entries.push((index, value));
    }
    order
        .into_iter()
        .map(|name| {
            let entries = by_name.remove(&name).unwrap_or_default();
            SemanticTrack::backfilled(name, &entries, segment_count)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// MotionSpec
// ---------------------------------------------------------------------------

/// Overrides segment resolution when the input leaves a given segment.
///
/// Called with the spec, the segment being left, the new input and the new
/// direction. Returning `None` falls back to
/// [`MotionSpec::segment_at_input`].
pub type SegmentChangeHandler =
    Arc<dyn Fn(&Arc<MotionSpec>, &SegmentData, f32, InputDirection) -> Option<SegmentData> + Send + Sync>;

/// A complete motion specification: one [`DirectionalSpec`] per direction.
///
/// Shared as `Arc<MotionSpec>`. The evaluator compares specs by pointer, so
/// replacing the `Arc` is what signals a spec change.
#[derive(Clone)]
pub struct MotionSpec {
    max_direction: DirectionalSpec,
    min_direction: DirectionalSpec,
    reset_spring: SpringParameters,
    segment_handlers: HashMap<SegmentKey, SegmentChangeHandler>,
}

impl fmt::Debug for MotionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotionSpec")
            .field("max_direction", &self.max_direction)
            .field("min_direction", &self.min_direction)
            .field("reset_spring", &self.reset_spring)
            .field("segment_handlers", &self.segment_handlers.len())
            .finish()
    }
}

impl MotionSpec {
    #[must_use]
    pub fn new(max_direction: DirectionalSpec, min_direction: DirectionalSpec) -> Self {
        Self {
            max_direction,
            min_direction,
            reset_spring: presets::reset(),
            segment_handlers: HashMap::new(),
        }
    }

    /// Same breakpoints and mappings in both directions.
    #[must_use]
    pub fn symmetric(spec: DirectionalSpec) -> Self {
        Self::new(spec.clone(), spec)
    }

    /// Identity mapping in both directions.
    #[must_use]
    pub fn empty() -> Self {
        Self::symmetric(DirectionalSpec::identity())
    }

    /// Spring used for spec swaps and same-segment direction reversals.
    #[must_use]
    pub fn with_reset_spring(mut self, spring: SpringParameters) -> Self {
        self.reset_spring = spring;
        self
    }

    /// Install a handler consulted when the input leaves segment `key`.
    #[must_use]
    pub fn with_segment_handler(
        mut self,
        key: SegmentKey,
        handler: impl Fn(&Arc<MotionSpec>, &SegmentData, f32, InputDirection) -> Option<SegmentData>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.segment_handlers.insert(key, Arc::new(handler));
        self
    }

    #[inline]
    #[must_use]
    pub fn reset_spring(&self) -> SpringParameters {
        self.reset_spring
    }

    #[inline]
    #[must_use]
    pub fn directional(&self, direction: InputDirection) -> &DirectionalSpec {
        match direction {
            InputDirection::Max => &self.max_direction,
            InputDirection::Min => &self.min_direction,
        }
    }

    #[must_use]
    pub fn has_segment_handlers(&self) -> bool {
        !self.segment_handlers.is_empty()
    }

    /// Segment `index` of the `direction` spec, if it exists.
    #[must_use]
    pub fn segment_at_index(
        self: &Arc<Self>,
        direction: InputDirection,
        index: usize,
    ) -> Option<SegmentData> {
        let spec = self.directional(direction);
        let mapping = spec.mappings.get(index)?.clone();
        Some(SegmentData::new(
            Arc::clone(self),
            direction,
            index,
            spec.breakpoints[index].clone(),
            spec.breakpoints[index + 1].clone(),
            mapping,
        ))
    }

    /// The segment identified by `key`, if this spec has one.
    #[must_use]
    pub fn segment_for_key(self: &Arc<Self>, key: &SegmentKey) -> Option<SegmentData> {
        let spec = self.directional(key.direction);
        let index = spec.breakpoint_index(&key.min_breakpoint)?;
        let next = spec.breakpoints.get(index + 1)?;
        if next.key != key.max_breakpoint {
            return None;
        }
        self.segment_at_index(key.direction, index)
    }

    /// The segment containing `input` when moving in `direction`.
    #[must_use]
    pub fn segment_at_input(self: &Arc<Self>, input: f32, direction: InputDirection) -> SegmentData {
        let index = self.directional(direction).segment_index_at(input, direction);
        let spec = self.directional(direction);
        SegmentData::new(
            Arc::clone(self),
            direction,
            index,
            spec.breakpoints[index].clone(),
            spec.breakpoints[index + 1].clone(),
            spec.mappings[index].clone(),
        )
    }

    /// Re-derive the active segment after `last_segment` became invalid.
    ///
    /// A segment change handler registered for `last_segment` gets the first
    /// say; otherwise this is [`segment_at_input`](Self::segment_at_input).
    #[must_use]
    pub fn on_change_segment(
        self: &Arc<Self>,
        last_segment: &SegmentData,
        input: f32,
        direction: InputDirection,
    ) -> SegmentData {
        self.segment_handlers
            .get(&last_segment.key())
            .and_then(|handler| handler(self, last_segment, input, direction))
            .unwrap_or_else(|| self.segment_at_input(input, direction))
    }

    /// Typed semantic value in force on `segment`.
    #[must_use]
    pub fn semantic_value<T: Clone + 'static>(
        &self,
        key: &SemanticKey<T>,
        segment: &SegmentData,
    ) -> Option<T> {
        self.directional(segment.direction())
            .semantic_value(key, segment.index())
    }
}

impl Default for MotionSpec {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_breakpoints() -> DirectionalSpec {
        DirectionalSpec::new(
            vec![Breakpoint::new("a", 1.0), Breakpoint::new("b", 2.0)],
            vec![Mapping::Zero, Mapping::One, Mapping::Fixed(2.0)],
        )
        .unwrap()
    }

    #[test]
    fn sentinels_close_the_spec() {
        let spec = two_breakpoints();
        let keys: Vec<_> = spec.breakpoints().iter().map(|b| b.key.clone()).collect();
        assert_eq!(
            keys,
            vec![
                BreakpointKey::MinLimit,
                BreakpointKey::named("a"),
                BreakpointKey::named("b"),
                BreakpointKey::MaxLimit
            ]
        );
        assert_eq!(spec.segment_count(), 3);
    }

    #[test]
    fn lookup_inside_segments() {
        let spec = two_breakpoints();
        for direction in [InputDirection::Max, InputDirection::Min] {
            assert_eq!(spec.segment_index_at(-100.0, direction), 0);
            assert_eq!(spec.segment_index_at(1.5, direction), 1);
            assert_eq!(spec.segment_index_at(100.0, direction), 2);
        }
    }

    #[test]
    fn tie_break_follows_direction() {
        let spec = two_breakpoints();
        assert_eq!(spec.segment_index_at(1.0, InputDirection::Max), 1);
        assert_eq!(spec.segment_index_at(1.0, InputDirection::Min), 0);
        assert_eq!(spec.segment_index_at(2.0, InputDirection::Max), 2);
        assert_eq!(spec.segment_index_at(2.0, InputDirection::Min), 1);
    }

    #[test]
    fn infinite_and_nan_inputs_stay_in_range() {
        let spec = two_breakpoints();
        for direction in [InputDirection::Max, InputDirection::Min] {
            assert_eq!(spec.segment_index_at(f32::NEG_INFINITY, direction), 0);
            assert_eq!(spec.segment_index_at(f32::INFINITY, direction), 2);
            assert_eq!(spec.segment_index_at(f32::NAN, direction), 0);
        }
    }

    #[test]
    fn rejects_unsorted_breakpoints() {
        let err = DirectionalSpec::new(
            vec![Breakpoint::new("a", 2.0), Breakpoint::new("b", 1.0)],
            vec![Mapping::Zero, Mapping::Zero, Mapping::Zero],
        )
        .unwrap_err();
        assert!(matches!(err, SpecError::Unsorted { .. }), "{err}");

        let err = DirectionalSpec::new(
            vec![Breakpoint::new("a", 1.0), Breakpoint::new("b", 1.0)],
            vec![Mapping::Zero, Mapping::Zero, Mapping::Zero],
        )
        .unwrap_err();
        assert!(matches!(err, SpecError::Unsorted { .. }), "{err}");
    }

    #[test]
    fn rejects_duplicate_and_reserved_keys() {
        let err = DirectionalSpec::new(
            vec![Breakpoint::new("a", 1.0), Breakpoint::new("a", 2.0)],
            vec![Mapping::Zero, Mapping::Zero, Mapping::Zero],
        )
        .unwrap_err();
        assert_eq!(
            err,
            SpecError::DuplicateKey {
                key: BreakpointKey::named("a")
            }
        );

        let err = DirectionalSpec::new(
            vec![Breakpoint::new(BreakpointKey::MaxLimit, 1.0)],
            vec![Mapping::Zero, Mapping::Zero],
        )
        .unwrap_err();
        assert!(matches!(err, SpecError::ReservedKey { .. }));
    }

    #[test]
    fn rejects_bad_positions_and_guarantees() {
        let err = DirectionalSpec::new(
            vec![Breakpoint::new("a", f32::NAN)],
            vec![Mapping::Zero, Mapping::Zero],
        )
        .unwrap_err();
        assert!(matches!(err, SpecError::NonFinitePosition { .. }));

        let err = DirectionalSpec::new(
            vec![Breakpoint::new("a", 1.0).with_guarantee(Guarantee::InputDelta(0.0))],
            vec![Mapping::Zero, Mapping::Zero],
        )
        .unwrap_err();
        assert!(matches!(err, SpecError::InvalidGuaranteeDistance { .. }));
    }

    #[test]
    fn rejects_wrong_mapping_count() {
        let err = DirectionalSpec::new(vec![Breakpoint::new("a", 1.0)], vec![Mapping::Zero])
            .unwrap_err();
        assert_eq!(
            err,
            SpecError::MappingCount {
                breakpoints: 1,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn segment_at_input_carries_breakpoints_and_mapping() {
        let spec = Arc::new(MotionSpec::symmetric(two_breakpoints()));
        let segment = spec.segment_at_input(1.5, InputDirection::Max);
        assert_eq!(segment.min_breakpoint().key, BreakpointKey::named("a"));
        assert_eq!(segment.max_breakpoint().key, BreakpointKey::named("b"));
        assert_eq!(segment.mapping(), &Mapping::One);
        assert_eq!(segment.entry_breakpoint().key, BreakpointKey::named("a"));

        let segment = spec.segment_at_input(1.5, InputDirection::Min);
        assert_eq!(segment.entry_breakpoint().key, BreakpointKey::named("b"));
    }

    #[test]
    fn segment_for_key_round_trips() {
        let spec = Arc::new(MotionSpec::symmetric(two_breakpoints()));
        let segment = spec.segment_at_input(5.0, InputDirection::Min);
        let found = spec.segment_for_key(&segment.key()).unwrap();
        assert_eq!(found, segment);

        let bogus = SegmentKey {
            min_breakpoint: BreakpointKey::MinLimit,
            max_breakpoint: BreakpointKey::named("b"),
            direction: InputDirection::Max,
        };
        assert!(spec.segment_for_key(&bogus).is_none());
    }

    #[test]
    fn segment_handler_overrides_resolution() {
        let base = Arc::new(MotionSpec::symmetric(two_breakpoints()));
        let sticky_key = base.segment_at_input(1.5, InputDirection::Max).key();
        let spec = Arc::new(
            MotionSpec::symmetric(two_breakpoints()).with_segment_handler(
                sticky_key.clone(),
                |_spec, current, input, _direction| (input < 3.0).then(|| current.clone()),
            ),
        );
        let current = spec.segment_for_key(&sticky_key).unwrap();
        let next = spec.on_change_segment(&current, 2.5, InputDirection::Max);
        assert_eq!(next.key(), sticky_key);
        let next = spec.on_change_segment(&current, 3.5, InputDirection::Max);
        assert_eq!(next.index(), 2);
    }

    #[test]
    fn empty_spec_is_identity() {
        let spec = Arc::new(MotionSpec::empty());
        let segment = spec.segment_at_input(42.0, InputDirection::Max);
        assert_eq!(segment.mapping().map(42.0), 42.0);
        assert!(segment.min_breakpoint().key.is_limit());
        assert!(segment.max_breakpoint().key.is_limit());
    }
}
