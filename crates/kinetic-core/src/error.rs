#![forbid(unsafe_code)]

//! Configuration errors raised while building a motion spec.

use thiserror::Error;

use crate::spec::BreakpointKey;

pub type Result<T> = std::result::Result<T, SpecError>;

/// A malformed spec. Raised at construction time, never during evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpecError {
    #[error("breakpoint {key} has a non-finite position ({position})")]
    NonFinitePosition { key: BreakpointKey, position: f32 },

    #[error("breakpoint {key} at {position} is not after {previous_key} at {previous_position}")]
    Unsorted {
        key: BreakpointKey,
        position: f32,
        previous_key: BreakpointKey,
        previous_position: f32,
    },

    #[error("breakpoint key {key} is used more than once")]
    DuplicateKey { key: BreakpointKey },

    #[error("breakpoint key {key} is reserved for the spec boundaries")]
    ReservedKey { key: BreakpointKey },

    #[error("breakpoint {key} declares a guarantee distance of {distance}, expected a positive finite value")]
    InvalidGuaranteeDistance { key: BreakpointKey, distance: f32 },

    #[error("expected {expected} mappings for {breakpoints} breakpoints, got {actual}")]
    MappingCount {
        breakpoints: usize,
        expected: usize,
        actual: usize,
    },
}
