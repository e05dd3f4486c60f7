#![forbid(unsafe_code)]

//! Closed-form damped harmonic oscillator.
//!
//! The discontinuity animator does not keep a running simulation. It stores
//! the spring's initial condition and asks "where is the spring `t`
//! nanoseconds later?". That only works with the analytic solution of
//!
//!   x'' = -k·x - 2·ζ·√k·x'
//!
//! (unit mass), which gives the same answer on every platform no matter how
//! the elapsed time was sliced into frames.
//!
//! # Regimes
//!
//! - **Under-damped** (ζ < 1): decaying oscillation.
//! - **Critically damped** (ζ = 1): fastest convergence without overshoot.
//! - **Over-damped** (ζ > 1): sum of two decaying exponentials.
//!
//! # Invariants
//!
//! 1. [`SpringState::AT_REST`] advanced by any duration is still at rest.
//! 2. Advancing with snap parameters ([`SpringParameters::SNAP`]) lands at rest.
//! 3. `advance(a + b) == advance(a).advance(b)` up to float rounding.
//! 4. Stiffness is always positive and the damping ratio never negative
//!    (clamped on construction).
//!
//! # Failure Modes
//!
//! - Non-finite state in, non-finite state out. The evaluator never feeds a
//!   non-finite state to the spring, see `computations`.
//! - Zero damping ratio: oscillates forever, [`SpringState::is_stable`]
//!   only turns true if the amplitude was below the threshold to begin with.

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Stiffness at or above which a spring is treated as a snap.
pub const SNAP_STIFFNESS: f32 = 100_000.0;

/// Minimum stiffness to prevent degenerate springs.
const MIN_STIFFNESS: f32 = 0.1;

/// Damping ratios this close to 1.0 use the critically damped solution.
const CRITICAL_TOLERANCE: f64 = 1e-4;

/// Stiffness and damping ratio of a spring.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpringParameters {
    stiffness: f32,
    damping_ratio: f32,
}

impl SpringParameters {
    /// No animation: discontinuities are applied immediately.
    pub const SNAP: Self = Self {
        stiffness: SNAP_STIFFNESS,
        damping_ratio: 1.0,
    };

    /// Create spring parameters. Stiffness is clamped to a small positive
    /// minimum, the damping ratio to `>= 0`.
    #[must_use]
    pub fn new(stiffness: f32, damping_ratio: f32) -> Self {
        Self {
            stiffness: if stiffness.is_nan() {
                MIN_STIFFNESS
            } else {
                stiffness.max(MIN_STIFFNESS)
            },
            damping_ratio: if damping_ratio.is_nan() {
                0.0
            } else {
                damping_ratio.max(0.0)
            },
        }
    }

    /// Build from a damping coefficient `c` instead of a ratio
    /// (`ζ = c / 2√k`).
    #[must_use]
    pub fn from_damping_coefficient(stiffness: f32, damping: f32) -> Self {
        let stiffness = stiffness.max(MIN_STIFFNESS);
        Self::new(stiffness, damping / (2.0 * stiffness.sqrt()))
    }

    #[inline]
    #[must_use]
    pub fn stiffness(&self) -> f32 {
        self.stiffness
    }

    #[inline]
    #[must_use]
    pub fn damping_ratio(&self) -> f32 {
        self.damping_ratio
    }

    /// Whether these parameters mean "jump, don't animate".
    #[inline]
    #[must_use]
    pub fn is_snap(&self) -> bool {
        self.stiffness >= SNAP_STIFFNESS
    }

    /// Componentwise linear interpolation. `fraction` is clamped to
    /// `[0, 1]`; NaN is treated as 0.
    #[must_use]
    pub fn lerp(start: Self, stop: Self, fraction: f32) -> Self {
        let t = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        Self {
            stiffness: lerp_f32(start.stiffness, stop.stiffness, t),
            damping_ratio: lerp_f32(start.damping_ratio, stop.damping_ratio, t),
        }
    }
}

#[inline]
fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    // Exact at both endpoints.
    a * (1.0 - t) + b * t
}

/// Displacement from the rest position and velocity of a spring.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpringState {
    pub displacement: f32,
    pub velocity: f32,
}

impl SpringState {
    /// Canonical zero state.
    pub const AT_REST: Self = Self {
        displacement: 0.0,
        velocity: 0.0,
    };

    #[must_use]
    pub const fn new(displacement: f32, velocity: f32) -> Self {
        Self {
            displacement,
            velocity,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_at_rest(&self) -> bool {
        *self == Self::AT_REST
    }

    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.displacement.is_finite() && self.velocity.is_finite()
    }

    /// Add to displacement and velocity.
    #[must_use]
    pub fn nudge(self, displacement_delta: f32, velocity_delta: f32) -> Self {
        Self {
            displacement: self.displacement + displacement_delta,
            velocity: self.velocity + velocity_delta,
        }
    }

    /// State of the spring `elapsed_nanos` after `self`.
    ///
    /// Non-positive elapsed time returns `self` unchanged.
    #[must_use]
    pub fn advance(self, elapsed_nanos: i64, params: SpringParameters) -> Self {
        if self.is_at_rest() || params.is_snap() {
            return Self::AT_REST;
        }
        if elapsed_nanos <= 0 {
            return self;
        }

        let t = elapsed_nanos as f64 / NANOS_PER_SECOND;
        let omega = f64::from(params.stiffness).sqrt();
        let zeta = f64::from(params.damping_ratio);
        let x0 = f64::from(self.displacement);
        let v0 = f64::from(self.velocity);

        let (x, v) = if (zeta - 1.0).abs() <= CRITICAL_TOLERANCE {
            let a = x0;
            let b = v0 + omega * x0;
            let decay = (-omega * t).exp();
            let x = (a + b * t) * decay;
            (x, (b - omega * (a + b * t)) * decay)
        } else if zeta > 1.0 {
            let s = omega * (zeta * zeta - 1.0).sqrt();
            let gamma_plus = -zeta * omega + s;
            let gamma_minus = -zeta * omega - s;
            let b = (v0 - gamma_minus * x0) / (gamma_plus - gamma_minus);
            let a = x0 - b;
            let e_minus = (gamma_minus * t).exp();
            let e_plus = (gamma_plus * t).exp();
            (
                a * e_minus + b * e_plus,
                a * gamma_minus * e_minus + b * gamma_plus * e_plus,
            )
        } else {
            let r = -zeta * omega;
            let damped = omega * (1.0 - zeta * zeta).sqrt();
            let sin_coeff = (v0 - r * x0) / damped;
            let decay = (r * t).exp();
            let (sin, cos) = (damped * t).sin_cos();
            let x = decay * (x0 * cos + sin_coeff * sin);
            let v = r * x + decay * damped * (sin_coeff * cos - x0 * sin);
            (x, v)
        };

        Self {
            displacement: x as f32,
            velocity: v as f32,
        }
    }

    /// Whether the remaining oscillation amplitude is at most `threshold`.
    ///
    /// Uses the energy bound `k·x² + v² <= k·threshold²`, which never
    /// grows for a damped spring.
    #[must_use]
    pub fn is_stable(self, params: SpringParameters, threshold: f32) -> bool {
        if self.is_at_rest() {
            return true;
        }
        let k = f64::from(params.stiffness);
        let x = f64::from(self.displacement);
        let v = f64::from(self.velocity);
        let threshold = f64::from(threshold);
        k * x * x + v * v <= k * threshold * threshold
    }
}

impl Default for SpringState {
    fn default() -> Self {
        Self::AT_REST
    }
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

/// Common spring configurations for UI motion.
pub mod presets {
    use super::SpringParameters;

    /// Low stiffness, slightly under-damped. Smooth and slow.
    #[must_use]
    pub fn gentle() -> SpringParameters {
        SpringParameters::from_damping_coefficient(120.0, 20.0)
    }

    /// Visible oscillation.
    #[must_use]
    pub fn bouncy() -> SpringParameters {
        SpringParameters::from_damping_coefficient(300.0, 10.0)
    }

    /// High stiffness, near-critical damping.
    #[must_use]
    pub fn stiff() -> SpringParameters {
        SpringParameters::from_damping_coefficient(400.0, 38.0)
    }

    /// Fastest convergence without overshoot.
    #[must_use]
    pub fn critical() -> SpringParameters {
        SpringParameters::new(170.0, 1.0)
    }

    /// Very low stiffness. Good for background transitions.
    #[must_use]
    pub fn slow() -> SpringParameters {
        SpringParameters::from_damping_coefficient(50.0, 14.0)
    }

    /// Spring used when a spec swap or a direction reversal inside one
    /// segment needs smoothing.
    #[must_use]
    pub fn reset() -> SpringParameters {
        SpringParameters::new(1400.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
