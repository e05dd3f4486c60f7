#![forbid(unsafe_code)]

//! Errors raised by the frame loop and gesture configuration.

use kinetic_core::SpecError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MotionError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MotionError {
    #[error("frame loop is already running")]
    AlreadyRunning,

    #[error("frame loop is not running")]
    NotRunning,

    #[error("direction change slop must be finite and non-negative, got {slop}")]
    InvalidSlop { slop: f32 },

    #[error("invalid motion spec: {0}")]
    Spec(#[from] SpecError),
}
