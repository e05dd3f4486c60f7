#![forbid(unsafe_code)]

//! Frame timing: a monotonic clock and a background tick source.
//!
//! [`FrameTicker`] runs a thread that sends a [`FrameTick`] over an `mpsc`
//! channel at a fixed interval. At most one tick is queued; ticks produced
//! while the consumer is busy are dropped, so a stalled consumer resumes on
//! a fresh timestamp instead of a backlog. The receiving side is handed to
//! [`MotionValue::run_until_stable`](crate::MotionValue::run_until_stable),
//! or drained by hand. Any other source of ticks (a display link, a test
//! feeding synthetic timestamps) can use the same channel type.

use std::sync::mpsc::{self, TrySendError};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use web_time::Instant;

/// One frame's timestamp, in nanoseconds on a monotonic clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameTick {
    pub frame_time_nanos: i64,
}

impl FrameTick {
    #[must_use]
    pub const fn new(frame_time_nanos: i64) -> Self {
        Self { frame_time_nanos }
    }
}

/// Monotonic nanoseconds since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    origin: Instant,
}

impl FrameClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    #[must_use]
    pub fn now_nanos(&self) -> i64 {
        i64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(i64::MAX)
    }

    #[must_use]
    pub fn tick(&self) -> FrameTick {
        FrameTick::new(self.now_nanos())
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Signal for stopping the ticker thread.
#[derive(Clone)]
struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    fn new() -> (Self, StopTrigger) {
        let inner = Arc::new((Mutex::new(false), Condvar::new()));
        let signal = Self {
            inner: Arc::clone(&inner),
        };
        (signal, StopTrigger { inner })
    }

    /// Wait for either the stop signal or a timeout.
    ///
    /// Returns `true` if stopped, `false` if timed out.
    fn wait_timeout(&self, duration: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let stopped = lock.lock().unwrap_or_else(PoisonError::into_inner);
        if *stopped {
            return true;
        }
        let (stopped, _) = cvar
            .wait_timeout(stopped, duration)
            .unwrap_or_else(PoisonError::into_inner);
        *stopped
    }
}

struct StopTrigger {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopTrigger {
    fn stop(&self) {
        let (lock, cvar) = &*self.inner;
        let mut stopped = lock.lock().unwrap_or_else(PoisonError::into_inner);
        *stopped = true;
        cvar.notify_all();
    }
}

/// Sends a [`FrameTick`] every `interval` until stopped or dropped.
///
/// The channel holds a single tick; a tick is dropped if the previous one has
/// not been received yet.
pub struct FrameTicker {
    receiver: mpsc::Receiver<FrameTick>,
    trigger: StopTrigger,
    thread: Option<thread::JoinHandle<()>>,
}

impl FrameTicker {
    /// Start ticking on a background thread.
    #[must_use]
    pub fn spawn(interval: Duration) -> Self {
        Self::spawn_with_clock(interval, FrameClock::new())
    }

    /// Start ticking with timestamps from `clock`.
    #[must_use]
    pub fn spawn_with_clock(interval: Duration, clock: FrameClock) -> Self {
        let (sender, receiver) = mpsc::sync_channel(1);
        let (signal, trigger) = StopSignal::new();
        let thread = thread::spawn(move || {
            loop {
                if signal.wait_timeout(interval) {
                    break;
                }
                match sender.try_send(clock.tick()) {
                    Ok(()) | Err(TrySendError::Full(_)) => {}
                    Err(TrySendError::Disconnected(_)) => break,
                }
            }
            tracing::trace!(target: "kinetic::ticker", "frame ticker exited");
        });
        tracing::debug!(
            target: "kinetic::ticker",
            interval_us = u64::try_from(interval.as_micros()).unwrap_or(u64::MAX),
            "frame ticker started"
        );
        Self {
            receiver,
            trigger,
            thread: Some(thread),
        }
    }

    #[must_use]
    pub fn receiver(&self) -> &mpsc::Receiver<FrameTick> {
        &self.receiver
    }

    /// Stop the thread and wait for it to exit.
    pub fn stop(mut self) {
        self.trigger.stop();
        if let Some(handle) = self.thread.take()
            && handle.join().is_err()
        {
            tracing::warn!(target: "kinetic::ticker", "frame ticker thread panicked");
        }
    }
}

impl Drop for FrameTicker {
    fn drop(&mut self) {
        self.trigger.stop();
        // Don't join in drop to avoid blocking
    }
}

impl std::fmt::Debug for FrameTicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameTicker")
            .field("running", &self.thread.is_some())
            .finish_non_exhaustive()
    }
}
