#![forbid(unsafe_code)]

//! Mapping functions applied between two breakpoints.

use std::fmt;
use std::sync::Arc;

/// A pure function `f32 -> f32`, valid between two breakpoints.
///
/// A mapping must be evaluable for any input, including values outside the
/// segment it is attached to: the evaluator reads the outgoing and incoming
/// mappings at the same breakpoint position to size a discontinuity.
#[derive(Clone)]
pub enum Mapping {
    /// Always `0.0`.
    Zero,
    /// Always `1.0`.
    One,
    /// Returns the input.
    Identity,
    /// Always the given value.
    Fixed(f32),
    /// `input * factor + offset`.
    Linear { factor: f32, offset: f32 },
    /// Arbitrary closed-form function.
    Custom(Arc<dyn Fn(f32) -> f32 + Send + Sync>),
}

impl Mapping {
    #[must_use]
    pub fn linear(factor: f32, offset: f32) -> Self {
        Self::Linear { factor, offset }
    }

    /// Line through `(in1, out1)` and `(in2, out2)`.
    ///
    /// Degenerates to `Fixed(out1)` when both inputs coincide.
    #[must_use]
    pub fn linear_through(in1: f32, out1: f32, in2: f32, out2: f32) -> Self {
        let span = in2 - in1;
        if span == 0.0 {
            return Self::Fixed(out1);
        }
        let factor = (out2 - out1) / span;
        Self::Linear {
            factor,
            offset: out1 - factor * in1,
        }
    }

    #[must_use]
    pub fn custom(f: impl Fn(f32) -> f32 + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    /// Evaluate the mapping.
    #[inline]
    #[must_use]
    pub fn map(&self, input: f32) -> f32 {
        match self {
            Self::Zero => 0.0,
            Self::One => 1.0,
            Self::Identity => input,
            Self::Fixed(value) => *value,
            Self::Linear { factor, offset } => input * factor + offset,
            Self::Custom(f) => f(input),
        }
    }
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero => f.write_str("Zero"),
            Self::One => f.write_str("One"),
            Self::Identity => f.write_str("Identity"),
            Self::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            Self::Linear { factor, offset } => f
                .debug_struct("Linear")
                .field("factor", factor)
                .field("offset", offset)
                .finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl PartialEq for Mapping {
    /// Custom mappings compare by closure identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Zero, Self::Zero) | (Self::One, Self::One) | (Self::Identity, Self::Identity) => {
                true
            }
            (Self::Fixed(a), Self::Fixed(b)) => a.to_bits() == b.to_bits(),
            (
                Self::Linear { factor, offset },
                Self::Linear {
                    factor: other_factor,
                    offset: other_offset,
                },
            ) => factor.to_bits() == other_factor.to_bits() && offset.to_bits() == other_offset.to_bits(),
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_mappings_ignore_input() {
        for input in [-1e6, -1.0, 0.0, 0.5, 1e6] {
            assert_eq!(Mapping::Zero.map(input), 0.0);
            assert_eq!(Mapping::One.map(input), 1.0);
            assert_eq!(Mapping::Fixed(3.5).map(input), 3.5);
        }
    }

    #[test]
    fn identity_and_linear() {
        assert_eq!(Mapping::Identity.map(4.25), 4.25);
        assert_eq!(Mapping::linear(2.0, 1.0).map(3.0), 7.0);
    }

    #[test]
    fn linear_through_two_points() {
        let m = Mapping::linear_through(10.0, 0.0, 20.0, 1.0);
        assert!((m.map(10.0) - 0.0).abs() < 1e-6);
        assert!((m.map(15.0) - 0.5).abs() < 1e-6);
        assert!((m.map(20.0) - 1.0).abs() < 1e-6);
        assert_eq!(Mapping::linear_through(3.0, 2.0, 3.0, 9.0), Mapping::Fixed(2.0));
    }

    #[test]
    fn custom_mapping_evaluates_outside_domain() {
        let m = Mapping::custom(|x| x * x);
        assert_eq!(m.map(-3.0), 9.0);
        let clone = m.clone();
        assert_eq!(m, clone);
        assert_ne!(m, Mapping::custom(|x| x * x));
    }

    #[test]
    fn debug_format() {
        assert_eq!(format!("{:?}", Mapping::Fixed(1.0)), "Fixed(1.0)");
        assert_eq!(format!("{:?}", Mapping::custom(|x| x)), "Custom(..)");
    }
}
