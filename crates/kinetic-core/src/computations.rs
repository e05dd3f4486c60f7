#![forbid(unsafe_code)]

//! Frame evaluator: reconciles segment changes into a continuous output.
//!
//! Given the state committed at the end of the last frame and this frame's
//! input, direction, drag offset and timestamp, [`compute_frame`] works out
//! which segment is in force, how the change since last frame should be
//! classified ([`SegmentChangeType`]), how the guarantee tracker advances,
//! and which spring animation smooths over any jump in the mapped output.
//!
//! The output is `mapping(input) + spring displacement`. A discontinuity of
//! size `delta` is absorbed by subtracting `delta` from the spring
//! displacement, so the visible output does not move at the moment of the
//! jump and then settles toward the new mapping.
//!
//! # Invariants
//!
//! 1. The committed spring state is always finite. Non-finite deltas,
//!    velocities, or spring states are logged at error level and dropped.
//! 2. At most one spring animation is in flight. Crossing several
//!    breakpoints in a single frame folds every discontinuity into it.
//! 3. Direct-mapped velocity is injected only once per frame, on the first
//!    discontinuity.
//! 4. [`Computations::evaluate`] recomputes only when
//!    `(spec, input, time, direction, drag offset)` changed.
//!
//! # Known approximation
//!
//! When the spec is replaced *and* the input moved in the same frame, the
//! change is attributed to the spec only if the old spec would still have
//! produced the last segment for the new input. Segment change handlers
//! introduced by the new spec can make that guess wrong.

use std::sync::Arc;

use smallvec::SmallVec;
use tracing::{error, trace};

use crate::direction::InputDirection;
use crate::guarantee::GuaranteeState;
use crate::mapping::Mapping;
use crate::segment::SegmentData;
use crate::spec::{Breakpoint, MotionSpec};
use crate::spring::{SpringParameters, SpringState};

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Default amplitude below which a spring counts as settled.
pub const DEFAULT_STABLE_THRESHOLD: f32 = 0.01;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How the active segment changed since the last frame.
///
/// Exactly one applies; the variants are checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SegmentChangeType {
    /// Same segment, same spec.
    Same,
    /// Same bounds, direction reversed without crossing a breakpoint.
    SameOppositeDirection,
    /// Direction reversed and a different segment is in force.
    Direction,
    /// The spec was replaced.
    Spec,
    /// The input crossed one or more breakpoints.
    Traverse,
}

/// Initial condition of the spring smoothing over discontinuities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscontinuityAnimation {
    pub spring_start_state: SpringState,
    pub spring_parameters: SpringParameters,
    pub spring_start_time_nanos: i64,
}

impl DiscontinuityAnimation {
    /// Nothing to animate.
    pub const NONE: Self = Self {
        spring_start_state: SpringState::AT_REST,
        spring_parameters: SpringParameters::SNAP,
        spring_start_time_nanos: 0,
    };

    #[must_use]
    pub fn new(start: SpringState, parameters: SpringParameters, start_time_nanos: i64) -> Self {
        Self {
            spring_start_state: start,
            spring_parameters: parameters,
            spring_start_time_nanos: start_time_nanos,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_at_rest(&self) -> bool {
        self.spring_start_state.is_at_rest()
    }

    /// Spring state at `time_nanos`.
    #[must_use]
    pub fn spring_state_at(&self, time_nanos: i64) -> SpringState {
        self.spring_start_state.advance(
            time_nanos - self.spring_start_time_nanos,
            self.spring_parameters,
        )
    }
}

impl Default for DiscontinuityAnimation {
    fn default() -> Self {
        Self::NONE
    }
}

/// Everything the evaluator needs to know about one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    pub input: f32,
    pub direction: InputDirection,
    pub gesture_drag_offset: f32,
    pub frame_time_nanos: i64,
}

/// State handed from one frame to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameState {
    pub segment: SegmentData,
    pub guarantee_state: GuaranteeState,
    pub animation: DiscontinuityAnimation,
    pub spring_state: SpringState,
    pub frame_time_nanos: i64,
    pub input: f32,
    pub gesture_drag_offset: f32,
}

impl FrameState {
    /// State before the first frame: the segment at `frame.input`, no
    /// guarantee, nothing animating.
    #[must_use]
    pub fn initial(spec: &Arc<MotionSpec>, frame: FrameInput) -> Self {
        Self {
            segment: spec.segment_at_input(frame.input, frame.direction),
            guarantee_state: GuaranteeState::INACTIVE,
            animation: DiscontinuityAnimation::NONE,
            spring_state: SpringState::AT_REST,
            frame_time_nanos: frame.frame_time_nanos,
            input: frame.input,
            gesture_drag_offset: frame.gesture_drag_offset,
        }
    }

    #[inline]
    #[must_use]
    pub fn direction(&self) -> InputDirection {
        self.segment.direction()
    }
}

/// Result of evaluating one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameResult {
    pub segment: SegmentData,
    pub change_type: SegmentChangeType,
    pub guarantee_state: GuaranteeState,
    pub animation: DiscontinuityAnimation,
    pub spring_state: SpringState,
    /// Mapped input plus spring displacement.
    pub output: f32,
    /// Mapped input, where the output settles.
    pub output_target: f32,
    pub is_stable: bool,
    pub frame_time_nanos: i64,
    pub input: f32,
    pub gesture_drag_offset: f32,
}

impl FrameResult {
    #[inline]
    #[must_use]
    pub fn spring_parameters(&self) -> SpringParameters {
        self.animation.spring_parameters
    }

    /// The state to carry into the next frame. A stable spring is
    /// collapsed to rest.
    #[must_use]
    pub fn to_frame_state(&self) -> FrameState {
        let (animation, spring_state) = if self.is_stable {
            (DiscontinuityAnimation::NONE, SpringState::AT_REST)
        } else {
            (self.animation, self.spring_state)
        };
        FrameState {
            segment: self.segment.clone(),
            guarantee_state: self.guarantee_state,
            animation,
            spring_state,
            frame_time_nanos: self.frame_time_nanos,
            input: self.input,
            gesture_drag_offset: self.gesture_drag_offset,
        }
    }
}

// ---------------------------------------------------------------------------
// Memoized evaluator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct MemoKey {
    spec: Arc<MotionSpec>,
    input: u32,
    direction: InputDirection,
    gesture_drag_offset: u32,
    frame_time_nanos: i64,
    stable_threshold: u32,
}

impl MemoKey {
    fn new(spec: &Arc<MotionSpec>, frame: FrameInput, stable_threshold: f32) -> Self {
        Self {
            spec: Arc::clone(spec),
            input: frame.input.to_bits(),
            direction: frame.direction,
            gesture_drag_offset: frame.gesture_drag_offset.to_bits(),
            frame_time_nanos: frame.frame_time_nanos,
            stable_threshold: stable_threshold.to_bits(),
        }
    }

    fn matches(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.spec, &other.spec)
            && self.input == other.input
            && self.direction == other.direction
            && self.gesture_drag_offset == other.gesture_drag_offset
            && self.frame_time_nanos == other.frame_time_nanos
            && self.stable_threshold == other.stable_threshold
    }
}

/// Caches the last [`FrameResult`] so repeated reads within a frame are
/// free.
#[derive(Debug, Clone, Default)]
pub struct Computations {
    memo: Option<(MemoKey, FrameResult)>,
}

impl Computations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate `frame` against `last`, reusing the cached result when the
    /// inputs are unchanged.
    pub fn evaluate(
        &mut self,
        last: &FrameState,
        spec: &Arc<MotionSpec>,
        frame: FrameInput,
        stable_threshold: f32,
    ) -> &FrameResult {
        let key = MemoKey::new(spec, frame, stable_threshold);
        let hit = self
            .memo
            .as_ref()
            .is_some_and(|(cached, _)| cached.matches(&key));
        if !hit {
            self.memo = None;
        }
        let (_, result) = self
            .memo
            .get_or_insert_with(|| (key, compute_frame(last, spec, frame, stable_threshold)));
        result
    }

    /// Drop the cached result, e.g. after the last frame state was replaced
    /// wholesale.
    pub fn invalidate(&mut self) {
        self.memo = None;
    }

    #[must_use]
    pub fn cached(&self) -> Option<&FrameResult> {
        self.memo.as_ref().map(|(_, result)| result)
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate one frame. Pure: the same arguments always give the same result.
#[must_use]
pub fn compute_frame(
    last: &FrameState,
    spec: &Arc<MotionSpec>,
    frame: FrameInput,
    stable_threshold: f32,
) -> FrameResult {
    let spec_changed = !Arc::ptr_eq(last.segment.spec(), spec);
    let segment = if !spec_changed && last.segment.is_valid_for_input(frame.input, frame.direction) {
        last.segment.clone()
    } else {
        spec.on_change_segment(&last.segment, frame.input, frame.direction)
    };

    let change_type = classify(last, &segment, spec_changed, frame);
    let (guarantee_state, animation) = match change_type {
        SegmentChangeType::Same => same_segment(last, &segment, frame),
        SegmentChangeType::SameOppositeDirection | SegmentChangeType::Spec => {
            reset_discontinuity(last, &segment, spec.reset_spring(), frame, change_type)
        }
        SegmentChangeType::Direction => direction_change(last, &segment, frame),
        SegmentChangeType::Traverse => traverse(last, spec, &segment, frame),
    };

    let mut animation = animation;
    let mut spring_state = animation.spring_state_at(frame.frame_time_nanos);
    if !spring_state.is_finite() {
        error!(
            target: "kinetic::computations",
            ?change_type,
            ?animation,
            "spring state became non-finite, dropping the animation"
        );
        animation = DiscontinuityAnimation::NONE;
        spring_state = SpringState::AT_REST;
    }

    let output_target = segment.mapping().map(frame.input);
    let (output, is_stable) =
        if change_type == SegmentChangeType::Same && spring_state.is_at_rest() {
            (output_target, true)
        } else {
            (
                output_target + spring_state.displacement,
                spring_state.is_stable(animation.spring_parameters, stable_threshold),
            )
        };

    trace!(
        target: "kinetic::computations",
        ?change_type,
        input = frame.input,
        output,
        is_stable,
        "frame evaluated"
    );

    FrameResult {
        segment,
        change_type,
        guarantee_state,
        animation,
        spring_state,
        output,
        output_target,
        is_stable,
        frame_time_nanos: frame.frame_time_nanos,
        input: frame.input,
        gesture_drag_offset: frame.gesture_drag_offset,
    }
}

fn classify(
    last: &FrameState,
    segment: &SegmentData,
    spec_changed: bool,
    frame: FrameInput,
) -> SegmentChangeType {
    let last_key = last.segment.key();
    let key = segment.key();
    if last_key == key {
        return if spec_changed {
            SegmentChangeType::Spec
        } else {
            SegmentChangeType::Same
        };
    }
    if last_key.direction != key.direction {
        return if last_key.same_bounds(&key) {
            SegmentChangeType::SameOppositeDirection
        } else {
            SegmentChangeType::Direction
        };
    }
    if spec_changed {
        // Would the old spec still be in the last segment at this input?
        let old_spec = last.segment.spec();
        let still_there = last.segment.is_valid_for_input(frame.input, frame.direction)
            || old_spec
                .on_change_segment(&last.segment, frame.input, frame.direction)
                .key()
                == last_key;
        if still_there {
            return SegmentChangeType::Spec;
        }
    }
    SegmentChangeType::Traverse
}

/// Spring parameters for an animation whose guarantee belongs to
/// `breakpoint`.
fn tightened(
    parameters: SpringParameters,
    guarantee: GuaranteeState,
    breakpoint: &Breakpoint,
) -> SpringParameters {
    if guarantee.is_inactive() {
        parameters
    } else {
        guarantee.updated_spring_parameters(breakpoint)
    }
}

fn same_segment(
    last: &FrameState,
    segment: &SegmentData,
    frame: FrameInput,
) -> (GuaranteeState, DiscontinuityAnimation) {
    let entry = segment.entry_breakpoint();
    let guarantee = last.guarantee_state.with_current_value(
        entry
            .guarantee
            .tracked_value(frame.input, frame.gesture_drag_offset),
        frame.direction,
    );
    let animation = DiscontinuityAnimation {
        spring_parameters: tightened(last.animation.spring_parameters, guarantee, entry),
        ..last.animation
    };
    (guarantee, animation)
}

/// Jump between the old and new mapping at the current input.
fn jump_at_input(last: &FrameState, segment: &SegmentData, input: f32) -> f32 {
    segment.mapping().map(input) - last.segment.mapping().map(input)
}

fn reset_discontinuity(
    last: &FrameState,
    segment: &SegmentData,
    reset_spring: SpringParameters,
    frame: FrameInput,
    change_type: SegmentChangeType,
) -> (GuaranteeState, DiscontinuityAnimation) {
    let delta = jump_at_input(last, segment, frame.input);
    if !delta.is_finite() {
        error!(
            target: "kinetic::computations",
            ?change_type,
            input = frame.input,
            delta,
            "non-finite discontinuity, not animating it"
        );
        return (GuaranteeState::INACTIVE, last.animation);
    }
    if delta == 0.0 {
        return (GuaranteeState::INACTIVE, last.animation);
    }
    let state = last
        .animation
        .spring_state_at(frame.frame_time_nanos)
        .nudge(-delta, 0.0);
    (
        GuaranteeState::INACTIVE,
        DiscontinuityAnimation::new(state, reset_spring, frame.frame_time_nanos),
    )
}

fn direction_change(
    last: &FrameState,
    segment: &SegmentData,
    frame: FrameInput,
) -> (GuaranteeState, DiscontinuityAnimation) {
    let entry = segment.entry_breakpoint();
    let guarantee = entry
        .guarantee
        .start_state(frame.input, frame.gesture_drag_offset);
    let delta = jump_at_input(last, segment, frame.input);
    if !delta.is_finite() {
        error!(
            target: "kinetic::computations",
            change_type = ?SegmentChangeType::Direction,
            input = frame.input,
            delta,
            "non-finite discontinuity, not animating it"
        );
        return (guarantee, last.animation);
    }
    let state = last
        .animation
        .spring_state_at(frame.frame_time_nanos)
        .nudge(-delta, 0.0);
    (
        guarantee,
        DiscontinuityAnimation::new(
            state,
            tightened(entry.spring, guarantee, entry),
            frame.frame_time_nanos,
        ),
    )
}

/// Where between `from` and `to` the input passed `position`, in `[0, 1]`.
fn crossing_fraction(from: f32, to: f32, position: f32) -> f32 {
    let fraction = (position - from) / (to - from);
    if fraction.is_nan() {
        1.0
    } else {
        fraction.clamp(0.0, 1.0)
    }
}

/// Change in direct-mapped velocity when switching from the last segment's
/// mapping to `segment`'s, measured over this frame. Added to the spring so
/// the output keeps its momentum through the discontinuity.
fn direct_mapped_velocity_change(last: &FrameState, segment: &SegmentData, frame: FrameInput) -> f32 {
    let seconds = (frame.frame_time_nanos - last.frame_time_nanos) as f64 / NANOS_PER_SECOND;
    if seconds <= 0.0 {
        return 0.0;
    }
    let velocity = |mapping: &Mapping| {
        (f64::from(mapping.map(frame.input)) - f64::from(mapping.map(last.input))) / seconds
    };
    let change = (velocity(last.segment.mapping()) - velocity(segment.mapping())) as f32;
    if change.is_finite() {
        change
    } else {
        error!(
            target: "kinetic::computations",
            input = frame.input,
            last_input = last.input,
            "non-finite direct-mapped velocity, not carrying momentum"
        );
        0.0
    }
}

fn traverse(
    last: &FrameState,
    spec: &Arc<MotionSpec>,
    segment: &SegmentData,
    frame: FrameInput,
) -> (GuaranteeState, DiscontinuityAnimation) {
    let directional = spec.directional(segment.direction());
    let breakpoints = directional.breakpoints();
    let mappings = directional.mappings();

    let start = directional
        .breakpoint_index(&last.segment.min_breakpoint().key)
        .filter(|&i| {
            breakpoints
                .get(i + 1)
                .is_some_and(|next| next.key == last.segment.max_breakpoint().key)
        })
        .unwrap_or_else(|| directional.segment_index_at(last.input, segment.direction()));
    let target = segment.index();

    // (breakpoint index, moving toward larger input)
    let crossings: SmallVec<[(usize, bool); 4]> = if target >= start {
        (start + 1..=target).map(|i| (i, true)).collect()
    } else {
        (target + 1..=start).rev().map(|i| (i, false)).collect()
    };

    if crossings.is_empty() {
        // The spec was swapped underneath a segment with the same index.
        return direction_change(last, segment, frame);
    }

    let frame_nanos = frame.frame_time_nanos - last.frame_time_nanos;
    let mut anchor_state = last.animation.spring_start_state;
    let mut anchor_time = last.animation.spring_start_time_nanos;
    let mut parameters = last.animation.spring_parameters;
    let mut guarantee = last.guarantee_state;
    let mut guarantee_breakpoint = last.segment.entry_breakpoint();
    let mut before: &Mapping = last.segment.mapping();
    let mut momentum_applied = false;

    for (index, upward) in crossings {
        let breakpoint = &breakpoints[index];
        let position = breakpoint.position;
        let fraction = crossing_fraction(last.input, frame.input, position);
        let crossing_time = last.frame_time_nanos + (frame_nanos as f64 * f64::from(fraction)).round() as i64;
        let crossing_drag = last.gesture_drag_offset
            + (frame.gesture_drag_offset - last.gesture_drag_offset) * fraction;

        guarantee = guarantee.with_current_value(
            guarantee_breakpoint
                .guarantee
                .tracked_value(position, crossing_drag),
            frame.direction,
        );
        let before_parameters = tightened(parameters, guarantee, guarantee_breakpoint);
        let at_crossing = anchor_state.advance(crossing_time - anchor_time, before_parameters);

        let after: &Mapping = if upward {
            &mappings[index]
        } else {
            &mappings[index - 1]
        };
        let delta = after.map(position) - before.map(position);

        let mut state = at_crossing;
        if !delta.is_finite() {
            error!(
                target: "kinetic::computations",
                breakpoint = %breakpoint.key,
                position,
                delta,
                "non-finite discontinuity, not animating it"
            );
        } else if delta != 0.0 {
            let velocity = if momentum_applied {
                0.0
            } else {
                momentum_applied = true;
                direct_mapped_velocity_change(last, segment, frame)
            };
            state = state.nudge(-delta, velocity);
        }
        if !state.is_finite() {
            error!(
                target: "kinetic::computations",
                breakpoint = %breakpoint.key,
                ?state,
                "spring state became non-finite at breakpoint, keeping the last good state"
            );
            state = if at_crossing.is_finite() {
                at_crossing
            } else {
                SpringState::AT_REST
            };
        }

        anchor_state = state;
        anchor_time = crossing_time;
        parameters = breakpoint.spring;
        guarantee_breakpoint = breakpoint;
        // Only travel in the current direction can honour a guarantee.
        let along = upward == (frame.direction == InputDirection::Max);
        guarantee = if along {
            breakpoint.guarantee.start_state(position, crossing_drag)
        } else {
            GuaranteeState::INACTIVE
        };
        before = after;
    }

    guarantee = guarantee.with_current_value(
        guarantee_breakpoint
            .guarantee
            .tracked_value(frame.input, frame.gesture_drag_offset),
        frame.direction,
    );
    let parameters = tightened(parameters, guarantee, guarantee_breakpoint);
    (
        guarantee,
        DiscontinuityAnimation::new(anchor_state, parameters, anchor_time),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
