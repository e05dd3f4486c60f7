#![forbid(unsafe_code)]

//! Motion value: an input, a spec, and a frame loop producing an output.
//!
//! A [`MotionValue`] is the single writer of its input, gesture context and
//! spec. Reads ([`output`](MotionValue::output) and friends) evaluate the
//! current frame lazily through a [`Computations`] memo, so any number of
//! reads within a frame cost one evaluation.
//!
//! # Frame loop
//!
//! ```text
//!            start()                     on_frame(t, keep_running)
//!   Idle ───────────────► Running ──────────────────────────────┐
//!    ▲                      │  ▲                                │
//!    │        stop()        │  └──── Animating ◄── keep_running │
//!    └──────────────────────┘          or spring still moving   │
//!    ▲                                                          │
//!    └────────────── Finished ◄── !keep_running and stable ◄────┘
//! ```
//!
//! Each `on_frame` commits exactly one frame: the evaluated result becomes
//! the state the next frame is computed against.
//!
//! # Example
//!
//! ```ignore
//! let spec = Arc::new(MotionSpec::symmetric(
//!     DirectionalSpec::builder(Mapping::Zero)
//!         .breakpoint(Breakpoint::new("open", 100.0), Mapping::One)
//!         .build()?,
//! ));
//! let mut value = MotionValue::new(spec, ProvidedGestureContext::default(), 0.0);
//! value.start()?;
//! value.set_input(120.0);
//! while value.on_frame(clock.now_nanos(), false)? == FrameStatus::Animating {
//!     draw(value.output());
//! }
//! ```

use std::cell::RefCell;
use std::sync::Arc;
use std::sync::mpsc::Receiver;

use kinetic_core::{
    Computations, DEFAULT_STABLE_THRESHOLD, DiscontinuityAnimation, FrameInput, FrameResult,
    FrameState, MotionSpec, SegmentKey, SemanticKey, SpringParameters, SpringState,
};
use tracing::{debug, trace, trace_span};

use crate::debug::DebugSnapshot;
use crate::error::{MotionError, Result};
use crate::gesture::GestureContext;
use crate::ticker::FrameTick;

/// Tuning for a motion value.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionValueConfig {
    /// Spring amplitude below which the value counts as settled
    /// (default: 0.01).
    pub stable_threshold: f32,
    /// Name used in logs and debug snapshots.
    pub label: Option<String>,
}

impl Default for MotionValueConfig {
    fn default() -> Self {
        Self {
            stable_threshold: DEFAULT_STABLE_THRESHOLD,
            label: None,
        }
    }
}

impl MotionValueConfig {
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_stable_threshold(mut self, threshold: f32) -> Self {
        self.stable_threshold = threshold;
        self
    }
}

/// Outcome of one [`MotionValue::on_frame`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// The loop wants another frame.
    Animating,
    /// The value settled and the caller no longer needs frames; the loop is
    /// idle again.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Idle,
    /// Running, but no frame has been committed since `start`.
    Starting,
    Running,
}

/// A scalar driven by an input through a [`MotionSpec`].
pub struct MotionValue<G: GestureContext> {
    input: f32,
    gesture: G,
    spec: Arc<MotionSpec>,
    config: MotionValueConfig,
    last: FrameState,
    frame_time_nanos: i64,
    loop_state: LoopState,
    computations: RefCell<Computations>,
}

impl<G: GestureContext> MotionValue<G> {
    /// A motion value at rest at `initial_input`.
    #[must_use]
    pub fn new(spec: Arc<MotionSpec>, gesture: G, initial_input: f32) -> Self {
        Self::with_config(spec, gesture, initial_input, MotionValueConfig::default())
    }

    #[must_use]
    pub fn with_config(
        spec: Arc<MotionSpec>,
        gesture: G,
        initial_input: f32,
        config: MotionValueConfig,
    ) -> Self {
        let last = FrameState::initial(
            &spec,
            FrameInput {
                input: initial_input,
                direction: gesture.direction(),
                gesture_drag_offset: gesture.drag_offset(),
                frame_time_nanos: 0,
            },
        );
        Self {
            input: initial_input,
            gesture,
            spec,
            config,
            last,
            frame_time_nanos: 0,
            loop_state: LoopState::Idle,
            computations: RefCell::new(Computations::new()),
        }
    }

    // ── Writes ──────────────────────────────────────────────────────────

    pub fn set_input(&mut self, input: f32) {
        self.input = input;
    }

    /// Swap the spec. The jump between the old and new mapping is animated
    /// with the new spec's reset spring.
    pub fn set_spec(&mut self, spec: Arc<MotionSpec>) {
        self.spec = spec;
    }

    pub fn gesture_mut(&mut self) -> &mut G {
        &mut self.gesture
    }

    // ── Reads ───────────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub fn input(&self) -> f32 {
        self.input
    }

    #[must_use]
    pub fn gesture(&self) -> &G {
        &self.gesture
    }

    #[must_use]
    pub fn spec(&self) -> &Arc<MotionSpec> {
        &self.spec
    }

    #[must_use]
    pub fn config(&self) -> &MotionValueConfig {
        &self.config
    }

    #[must_use]
    pub fn output(&self) -> f32 {
        self.with_current(|result| result.output)
    }

    /// Where the output settles once the spring is at rest.
    #[must_use]
    pub fn output_target(&self) -> f32 {
        self.with_current(|result| result.output_target)
    }

    #[must_use]
    pub fn is_stable(&self) -> bool {
        self.with_current(|result| result.is_stable)
    }

    #[must_use]
    pub fn segment_key(&self) -> SegmentKey {
        self.with_current(|result| result.segment.key())
    }

    #[must_use]
    pub fn spring_parameters(&self) -> SpringParameters {
        self.with_current(FrameResult::spring_parameters)
    }

    #[must_use]
    pub fn spring_state(&self) -> SpringState {
        self.with_current(|result| result.spring_state)
    }

    /// Semantic value of the active segment.
    #[must_use]
    pub fn semantic<T: Clone + 'static>(&self, key: &SemanticKey<T>) -> Option<T> {
        self.with_current(|result| self.spec.semantic_value(key, &result.segment))
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.loop_state != LoopState::Idle
    }

    /// Timestamp of the last committed frame.
    #[must_use]
    pub fn frame_time_nanos(&self) -> i64 {
        self.frame_time_nanos
    }

    #[must_use]
    pub fn debug_snapshot(&self) -> DebugSnapshot {
        self.with_current(|result| DebugSnapshot {
            label: self.config.label.clone(),
            input: result.input,
            output: result.output,
            output_target: result.output_target,
            is_stable: result.is_stable,
            is_running: self.is_running(),
            frame_time_nanos: result.frame_time_nanos,
            direction: result.segment.direction(),
            gesture_drag_offset: result.gesture_drag_offset,
            segment: result.segment.key().to_string(),
            change_type: result.change_type,
            spring_parameters: result.spring_parameters(),
            spring_state: result.spring_state,
            guarantee_state: result.guarantee_state,
        })
    }

    // ── Frame loop ──────────────────────────────────────────────────────

    /// Enter the running state. The first frame after `start` measures
    /// elapsed time from itself, not from whenever the last loop ended.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(MotionError::AlreadyRunning);
        }
        self.loop_state = LoopState::Starting;
        debug!(
            target: "kinetic::motion_value",
            label = self.label(),
            input = self.input,
            "frame loop started"
        );
        Ok(())
    }

    /// Evaluate and commit the frame at `frame_time_nanos`.
    ///
    /// Returns [`FrameStatus::Finished`] (and goes idle) once the value is
    /// stable and `keep_running` is false.
    pub fn on_frame(&mut self, frame_time_nanos: i64, keep_running: bool) -> Result<FrameStatus> {
        if self.loop_state == LoopState::Idle {
            return Err(MotionError::NotRunning);
        }
        let _span = trace_span!(
            target: "kinetic::motion_value",
            "motion_value.frame",
            label = self.label(),
            frame_time_nanos
        )
        .entered();

        if self.loop_state == LoopState::Starting {
            let idle_nanos = frame_time_nanos.saturating_sub(self.last.frame_time_nanos);
            if idle_nanos > 0 {
                self.last.frame_time_nanos = frame_time_nanos;
                // An in-flight spring resumes where it stopped.
                if self.last.animation != DiscontinuityAnimation::NONE {
                    self.last.animation.spring_start_time_nanos = self
                        .last
                        .animation
                        .spring_start_time_nanos
                        .saturating_add(idle_nanos);
                }
            }
            self.computations.get_mut().invalidate();
            self.loop_state = LoopState::Running;
        }

        let frame = self.frame_input(frame_time_nanos);
        let result = self.computations.get_mut().evaluate(
            &self.last,
            &self.spec,
            frame,
            self.config.stable_threshold,
        );
        let is_stable = result.is_stable;
        trace!(
            target: "kinetic::motion_value",
            output = result.output,
            change_type = ?result.change_type,
            is_stable,
            "frame committed"
        );
        self.last = result.to_frame_state();
        self.frame_time_nanos = frame_time_nanos;
        if is_stable {
            // The committed spring was collapsed to rest; reads should see that.
            self.computations.get_mut().invalidate();
        }

        if is_stable && !keep_running {
            self.loop_state = LoopState::Idle;
            debug!(
                target: "kinetic::motion_value",
                label = self.label(),
                output = self.last.segment.mapping().map(self.input),
                "frame loop finished"
            );
            Ok(FrameStatus::Finished)
        } else {
            Ok(FrameStatus::Animating)
        }
    }

    /// Leave the running state immediately. The last committed frame stays
    /// in place; an in-flight spring resumes on the next `start`.
    pub fn stop(&mut self) {
        if self.is_running() {
            self.loop_state = LoopState::Idle;
            debug!(target: "kinetic::motion_value", label = self.label(), "frame loop stopped");
        }
    }

    /// Drive frames from `ticks` until the value settles.
    ///
    /// `before_frame` runs ahead of every frame; it may update the input or
    /// gesture and returns whether frames are still wanted regardless of
    /// stability. A closed channel stops the loop and returns the last
    /// status.
    pub fn run_until_stable(
        &mut self,
        ticks: &Receiver<FrameTick>,
        mut before_frame: impl FnMut(&mut Self, FrameTick) -> bool,
    ) -> Result<FrameStatus> {
        if !self.is_running() {
            self.start()?;
        }
        let mut status = FrameStatus::Animating;
        while let Ok(tick) = ticks.recv() {
            let keep_running = before_frame(self, tick);
            status = self.on_frame(tick.frame_time_nanos, keep_running)?;
            if status == FrameStatus::Finished {
                return Ok(status);
            }
        }
        debug!(target: "kinetic::motion_value", label = self.label(), "tick channel closed");
        self.stop();
        Ok(status)
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn label(&self) -> &str {
        self.config.label.as_deref().unwrap_or("")
    }

    fn frame_input(&self, frame_time_nanos: i64) -> FrameInput {
        FrameInput {
            input: self.input,
            direction: self.gesture.direction(),
            gesture_drag_offset: self.gesture.drag_offset(),
            frame_time_nanos,
        }
    }

    fn with_current<R>(&self, read: impl FnOnce(&FrameResult) -> R) -> R {
        let frame = self.frame_input(self.frame_time_nanos);
        let mut computations = self.computations.borrow_mut();
        read(computations.evaluate(
            &self.last,
            &self.spec,
            frame,
            self.config.stable_threshold,
        ))
    }
}

impl<G: GestureContext + std::fmt::Debug> std::fmt::Debug for MotionValue<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionValue")
            .field("label", &self.config.label)
            .field("input", &self.input)
            .field("gesture", &self.gesture)
            .field("loop_state", &self.loop_state)
            .field("frame_time_nanos", &self.frame_time_nanos)
            .finish_non_exhaustive()
    }
}
