#![forbid(unsafe_code)]

//! Guarantees: progressively tightening a spring toward a snap.
//!
//! A breakpoint may promise that its discontinuity has settled once the input
//! (or the gesture drag offset) has travelled a given distance past it. The
//! [`GuaranteeState`] records where the segment was entered and how far the
//! tracked signal has moved since, and
//! [`updated_spring_parameters`](GuaranteeState::updated_spring_parameters)
//! interpolates the breakpoint's spring toward [`SpringParameters::SNAP`] by
//! the fraction of that distance already covered.
//!
//! # Invariants
//!
//! 1. `max_delta` never decreases while a guarantee stays active.
//! 2. `max_delta >= 0`.
//! 3. [`GuaranteeState::INACTIVE`] is absorbing under `with_current_value`.

use crate::direction::InputDirection;
use crate::spec::Breakpoint;
use crate::spring::SpringParameters;

/// How aggressively a breakpoint's spring must be tightened after crossing it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Guarantee {
    /// The spring runs with its own parameters.
    #[default]
    None,
    /// Settled once the input has moved this far past the breakpoint.
    InputDelta(f32),
    /// Settled once the gesture drag offset has moved this far since the
    /// breakpoint was crossed. Input and drag offset diverge during
    /// overscroll, for example.
    GestureDragDelta(f32),
}

impl Guarantee {
    /// The guarantee distance, if any.
    #[must_use]
    pub fn distance(&self) -> Option<f32> {
        match *self {
            Self::None => None,
            Self::InputDelta(distance) | Self::GestureDragDelta(distance) => Some(distance),
        }
    }

    /// The signal this guarantee is measured against.
    #[inline]
    #[must_use]
    pub fn tracked_value(&self, input: f32, drag_offset: f32) -> f32 {
        match self {
            Self::GestureDragDelta(_) => drag_offset,
            Self::None | Self::InputDelta(_) => input,
        }
    }

    /// Fresh tracking state, starting at the current value of the tracked
    /// signal. [`Guarantee::None`] yields [`GuaranteeState::INACTIVE`].
    #[must_use]
    pub fn start_state(&self, input: f32, drag_offset: f32) -> GuaranteeState {
        match self {
            Self::None => GuaranteeState::INACTIVE,
            _ => GuaranteeState::with_start_value(self.tracked_value(input, drag_offset)),
        }
    }
}

/// Origin of the tracked signal and the furthest distance travelled from it.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GuaranteeState {
    origin: f32,
    max_delta: f32,
}

impl GuaranteeState {
    /// No guarantee is being tracked.
    pub const INACTIVE: Self = Self {
        origin: f32::NAN,
        max_delta: f32::NAN,
    };

    #[must_use]
    pub fn with_start_value(origin: f32) -> Self {
        Self {
            origin,
            max_delta: 0.0,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_inactive(&self) -> bool {
        self.origin.is_nan() && self.max_delta.is_nan()
    }

    #[inline]
    #[must_use]
    pub fn origin(&self) -> f32 {
        self.origin
    }

    #[inline]
    #[must_use]
    pub fn max_delta(&self) -> f32 {
        self.max_delta
    }

    /// Record the tracked signal at `value`. Only travel in `direction`
    /// counts, and only the furthest point reached is kept.
    #[must_use]
    pub fn with_current_value(self, value: f32, direction: InputDirection) -> Self {
        if self.is_inactive() {
            return self;
        }
        let delta = ((value - self.origin) * direction.sign()).max(0.0);
        Self {
            origin: self.origin,
            max_delta: self.max_delta.max(delta),
        }
    }

    /// Spring parameters for `breakpoint`, tightened by how far into its
    /// guarantee the tracked signal has travelled.
    #[must_use]
    pub fn updated_spring_parameters(&self, breakpoint: &Breakpoint) -> SpringParameters {
        if self.is_inactive() {
            return breakpoint.spring;
        }
        let Some(distance) = breakpoint.guarantee.distance() else {
            debug_assert!(
                false,
                "active guarantee state for breakpoint {} without a guarantee",
                breakpoint.key
            );
            return breakpoint.spring;
        };
        let fraction = self.max_delta / distance;
        SpringParameters::lerp(breakpoint.spring, SpringParameters::SNAP, fraction)
    }
}

impl PartialEq for GuaranteeState {
    /// Bitwise, so that `INACTIVE == INACTIVE`.
    fn eq(&self, other: &Self) -> bool {
        self.origin.to_bits() == other.origin.to_bits()
            && self.max_delta.to_bits() == other.max_delta.to_bits()
    }
}

impl Default for GuaranteeState {
    fn default() -> Self {
        Self::INACTIVE
    }
}
