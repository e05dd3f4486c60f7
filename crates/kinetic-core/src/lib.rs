#![forbid(unsafe_code)]

//! Core: spring physics, piecewise motion specs, and the frame evaluator.
//!
//! # Role in kinetic
//! `kinetic-core` is the pure half of the engine. Given an input signal
//! (a drag offset, a scroll position, a progress fraction), a
//! [`MotionSpec`] describes how that input maps to an output value, piece
//! by piece. Where adjacent pieces disagree, the output would jump; the
//! evaluator in [`computations`] hides every such jump behind a spring.
//!
//! # Primary responsibilities
//! - **Spring**: closed-form damped harmonic oscillator ([`spring`]).
//! - **MotionSpec**: directional breakpoints and mappings ([`spec`]).
//! - **Guarantee**: tighten a spring as the input travels past a
//!   breakpoint ([`guarantee`]).
//! - **Computations**: classify segment changes and produce the output
//!   for one frame ([`computations`]).
//!
//! # How it fits in the system
//! Nothing in this crate reads a clock or owns mutable state across frames.
//! `kinetic-runtime` holds the frame loop, the gesture context and the
//! committed [`FrameState`], and calls [`compute_frame`] through a
//! [`Computations`] memo once per frame.

pub mod computations;
pub mod direction;
pub mod error;
pub mod guarantee;
pub mod mapping;
pub mod segment;
pub mod semantics;
pub mod spec;
pub mod spring;

pub use computations::{
    Computations, DEFAULT_STABLE_THRESHOLD, DiscontinuityAnimation, FrameInput, FrameResult,
    FrameState, SegmentChangeType, compute_frame,
};
pub use direction::InputDirection;
pub use error::{Result, SpecError};
pub use guarantee::{Guarantee, GuaranteeState};
pub use mapping::Mapping;
pub use segment::{SegmentData, SegmentKey};
pub use semantics::{SemanticKey, SemanticValue};
pub use spec::{
    Breakpoint, BreakpointKey, DirectionalSpec, DirectionalSpecBuilder, MotionSpec,
    SegmentChangeHandler,
};
pub use spring::{SpringParameters, SpringState, presets};
