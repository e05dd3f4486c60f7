#![forbid(unsafe_code)]

//! Direction of input travel.

/// Which way the input is moving.
///
/// A [`MotionSpec`](crate::MotionSpec) carries one directional spec per
/// variant, so hysteresis is expressed by giving the two directions different
/// breakpoint positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InputDirection {
    /// Input is decreasing.
    Min,
    /// Input is increasing.
    Max,
}

impl InputDirection {
    /// `+1.0` for [`Max`](Self::Max), `-1.0` for [`Min`](Self::Min).
    #[inline]
    #[must_use]
    pub fn sign(self) -> f32 {
        match self {
            Self::Max => 1.0,
            Self::Min => -1.0,
        }
    }

    #[inline]
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Max => Self::Min,
            Self::Min => Self::Max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_opposite() {
        assert_eq!(InputDirection::Max.sign(), 1.0);
        assert_eq!(InputDirection::Min.sign(), -1.0);
        assert_eq!(InputDirection::Max.opposite(), InputDirection::Min);
        assert_eq!(InputDirection::Min.opposite().opposite(), InputDirection::Min);
    }
}
