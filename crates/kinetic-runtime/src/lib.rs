#![forbid(unsafe_code)]

//! Runtime: motion values, gesture contexts, and the frame loop.
//!
//! # Role in kinetic
//! `kinetic-runtime` owns everything with state or time in it. A
//! [`MotionValue`] holds the input, the active spec, and the state committed
//! by the last frame; the host drives it one frame at a time, either by
//! calling [`MotionValue::on_frame`] from its own frame callback or by
//! handing it a tick channel ([`FrameTicker`]).
//!
//! # How it fits in the system
//! All math lives in `kinetic-core`. This crate only decides *when* to
//! evaluate a frame and what to commit afterwards. Independent motion
//! values share nothing; a value derived from another is wired by the host
//! (`b.set_input(a.output())`), which also fixes their update order.

pub mod debug;
pub mod error;
pub mod gesture;
pub mod motion_value;
pub mod ticker;

pub use debug::DebugSnapshot;
pub use error::{MotionError, Result};
pub use gesture::{DistanceGestureContext, GestureContext, ProvidedGestureContext};
pub use motion_value::{FrameStatus, MotionValue, MotionValueConfig};
pub use ticker::{FrameClock, FrameTick, FrameTicker};
