#![forbid(unsafe_code)]

//! Gesture contexts: where the direction of travel and the drag offset come
//! from.
//!
//! A [`MotionValue`](crate::MotionValue) reads its [`InputDirection`] and
//! gesture drag offset from a [`GestureContext`] every frame. Two contexts
//! are provided:
//!
//! - [`ProvidedGestureContext`]: the host sets both directly.
//! - [`DistanceGestureContext`]: the host feeds drag offsets and the
//!   direction is derived from them, with hysteresis so that jitter around a
//!   turning point does not flip it back and forth.

use kinetic_core::InputDirection;

use crate::error::{MotionError, Result};

/// Source of direction and drag offset for a motion value.
pub trait GestureContext {
    fn direction(&self) -> InputDirection;

    /// Accumulated drag offset of the gesture driving the input.
    fn drag_offset(&self) -> f32;

    fn set_drag_offset(&mut self, drag_offset: f32);
}

/// Direction and drag offset supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProvidedGestureContext {
    direction: InputDirection,
    drag_offset: f32,
}

impl ProvidedGestureContext {
    #[must_use]
    pub fn new(direction: InputDirection, drag_offset: f32) -> Self {
        Self {
            direction,
            drag_offset,
        }
    }

    pub fn set_direction(&mut self, direction: InputDirection) {
        self.direction = direction;
    }
}

impl Default for ProvidedGestureContext {
    fn default() -> Self {
        Self::new(InputDirection::Max, 0.0)
    }
}

impl GestureContext for ProvidedGestureContext {
    fn direction(&self) -> InputDirection {
        self.direction
    }

    fn drag_offset(&self) -> f32 {
        self.drag_offset
    }

    fn set_drag_offset(&mut self, drag_offset: f32) {
        self.drag_offset = drag_offset;
    }
}

/// Derives direction from drag offsets.
///
/// The direction flips once the offset has moved back from the furthest
/// point reached in the current direction by *more than*
/// `direction_change_slop`. Travel of exactly the slop does not flip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceGestureContext {
    drag_offset: f32,
    direction: InputDirection,
    direction_change_slop: f32,
    /// Furthest offset reached in `direction` since the last flip.
    furthest: f32,
}

impl DistanceGestureContext {
    /// Errors with [`MotionError::InvalidSlop`] for a negative or non-finite
    /// slop.
    pub fn new(
        initial_drag_offset: f32,
        initial_direction: InputDirection,
        direction_change_slop: f32,
    ) -> Result<Self> {
        validate_slop(direction_change_slop)?;
        Ok(Self {
            drag_offset: initial_drag_offset,
            direction: initial_direction,
            direction_change_slop,
            furthest: initial_drag_offset,
        })
    }

    #[inline]
    #[must_use]
    pub fn direction_change_slop(&self) -> f32 {
        self.direction_change_slop
    }

    pub fn set_direction_change_slop(&mut self, slop: f32) -> Result<()> {
        validate_slop(slop)?;
        self.direction_change_slop = slop;
        Ok(())
    }

    /// Restart tracking at `drag_offset`, moving in `direction`.
    pub fn reset(&mut self, drag_offset: f32, direction: InputDirection) {
        self.drag_offset = drag_offset;
        self.direction = direction;
        self.furthest = drag_offset;
    }

    /// How far the offset has come back from the furthest point.
    #[must_use]
    pub fn reverse_travel(&self) -> f32 {
        ((self.furthest - self.drag_offset) * self.direction.sign()).max(0.0)
    }
}

impl GestureContext for DistanceGestureContext {
    fn direction(&self) -> InputDirection {
        self.direction
    }

    fn drag_offset(&self) -> f32 {
        self.drag_offset
    }

    fn set_drag_offset(&mut self, drag_offset: f32) {
        self.drag_offset = drag_offset;
        if !drag_offset.is_finite() {
            return;
        }
        if !self.furthest.is_finite() {
            self.furthest = drag_offset;
            return;
        }
        let sign = self.direction.sign();
        if (drag_offset - self.furthest) * sign > 0.0 {
            self.furthest = drag_offset;
        } else if self.reverse_travel() > self.direction_change_slop {
            self.direction = self.direction.opposite();
            self.furthest = drag_offset;
            tracing::debug!(
                target: "kinetic::gesture",
                direction = ?self.direction,
                drag_offset,
                "gesture direction changed"
            );
        }
    }
}

fn validate_slop(slop: f32) -> Result<()> {
    if slop.is_finite() && slop >= 0.0 {
        Ok(())
    } else {
        Err(MotionError::InvalidSlop { slop })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(slop: f32) -> DistanceGestureContext {
        DistanceGestureContext::new(0.0, InputDirection::Max, slop).unwrap()
    }

    #[test]
    fn provided_context_reports_what_it_was_given() {
        let mut gesture = ProvidedGestureContext::default();
        gesture.set_drag_offset(12.0);
        gesture.set_direction(InputDirection::Min);
        assert_eq!(gesture.drag_offset(), 12.0);
        assert_eq!(gesture.direction(), InputDirection::Min);
    }

    #[test]
    fn forward_travel_keeps_direction() {
        let mut gesture = context(5.0);
        for offset in [1.0, 10.0, 30.0] {
            gesture.set_drag_offset(offset);
        }
        assert_eq!(gesture.direction(), InputDirection::Max);
        assert_eq!(gesture.reverse_travel(), 0.0);
    }

    #[test]
    fn reverse_travel_within_slop_does_not_flip() {
        let mut gesture = context(5.0);
        gesture.set_drag_offset(20.0);
        gesture.set_drag_offset(16.0);
        gesture.set_drag_offset(15.0);
        assert_eq!(gesture.direction(), InputDirection::Max);
        assert_eq!(gesture.reverse_travel(), 5.0);
    }

    #[test]
    fn reverse_travel_past_slop_flips() {
        let mut gesture = context(5.0);
        gesture.set_drag_offset(20.0);
        gesture.set_drag_offset(14.5);
        assert_eq!(gesture.direction(), InputDirection::Min);
        // Flipping back needs the slop again, measured from the new extreme.
        gesture.set_drag_offset(10.0);
        gesture.set_drag_offset(15.0);
        assert_eq!(gesture.direction(), InputDirection::Min);
        gesture.set_drag_offset(15.5);
        assert_eq!(gesture.direction(), InputDirection::Max);
    }

    #[test]
    fn flip_boundary_is_one_float_past_the_slop() {
        let below = |x: f32| f32::from_bits(x.to_bits() - 1);
        let above = |x: f32| f32::from_bits(x.to_bits() + 1);
        for (furthest, slop) in [(20.0f32, 5.0f32), (0.3, 0.1), (1.7, 0.6)] {
            // Smallest offset whose reverse travel is still within the slop.
            let mut exact = furthest - slop;
            while furthest - exact > slop {
                exact = above(exact);
            }
            while furthest - below(exact) <= slop {
                exact = below(exact);
            }

            let mut gesture = context(slop);
            gesture.set_drag_offset(furthest);
            gesture.set_drag_offset(exact);
            assert_eq!(gesture.direction(), InputDirection::Max, "({furthest}, {slop}) at {exact}");

            gesture.set_drag_offset(below(exact));
            assert_eq!(
                gesture.direction(),
                InputDirection::Min,
                "({furthest}, {slop}) at {}",
                below(exact)
            );
        }
    }

    #[test]
    #[tracing_test::traced_test]
    fn flips_are_logged() {
        let mut gesture = context(2.0);
        gesture.set_drag_offset(10.0);
        gesture.set_drag_offset(9.0);
        assert!(!logs_contain("gesture direction changed"));
        gesture.set_drag_offset(7.0);
        assert!(logs_contain("gesture direction changed"));
        assert!(logs_contain("direction=Min"));
    }

    #[test]
    fn zero_slop_flips_on_any_reversal() {
        let mut gesture = context(0.0);
        gesture.set_drag_offset(3.0);
        gesture.set_drag_offset(3.0);
        assert_eq!(gesture.direction(), InputDirection::Max);
        gesture.set_drag_offset(2.999);
        assert_eq!(gesture.direction(), InputDirection::Min);
    }

    #[test]
    fn reset_restarts_tracking() {
        let mut gesture = context(1.0);
        gesture.set_drag_offset(10.0);
        gesture.reset(-4.0, InputDirection::Min);
        assert_eq!(gesture.drag_offset(), -4.0);
        assert_eq!(gesture.direction(), InputDirection::Min);
        gesture.set_drag_offset(-3.5);
        assert_eq!(gesture.direction(), InputDirection::Min);
    }

    #[test]
    fn non_finite_offsets_do_not_flip() {
        let mut gesture = context(1.0);
        gesture.set_drag_offset(10.0);
        gesture.set_drag_offset(f32::NAN);
        assert_eq!(gesture.direction(), InputDirection::Max);
        gesture.set_drag_offset(9.5);
        assert_eq!(gesture.direction(), InputDirection::Max);
    }

    #[test]
    fn invalid_slop_is_rejected() {
        for slop in [-1.0, f32::NAN, f32::INFINITY] {
            let err = DistanceGestureContext::new(0.0, InputDirection::Max, slop).unwrap_err();
            assert!(matches!(err, MotionError::InvalidSlop { .. }));
        }
        let mut gesture = context(1.0);
        assert!(gesture.set_direction_change_slop(-0.5).is_err());
        assert_eq!(gesture.direction_change_slop(), 1.0);
        gesture.set_direction_change_slop(2.0).unwrap();
        assert_eq!(gesture.direction_change_slop(), 2.0);
    }
}
