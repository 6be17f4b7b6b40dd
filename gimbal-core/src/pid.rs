//! Per-axis PID controller working on pixel error.
//!
//! Works in `no_std` and does not allocate memory.

/// Proportional, integral and derivative gains.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl PidGains {
    #[must_use]
    pub const fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self { kp, ki, kd }
    }
}

/// Fixed limits of one controller.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidLimits {
    /// Anti-windup clamp, applied symmetrically to the accumulated error.
    pub integral_limit: f32,
    /// Output clamp, applied symmetrically.
    pub output_limit: f32,
    /// Errors with a magnitude strictly below this produce no output and
    /// clear the controller memory.
    pub deadzone: f32,
}

impl PidLimits {
    /// Integral limit 100, output limit 200, deadzone 8 pixels.
    pub const DEFAULT: Self = Self {
        integral_limit: 100.0,
        output_limit: 200.0,
        deadzone: 8.0,
    };
}

impl Default for PidLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Controller configuration: gains plus limits.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidConfig {
    pub gains: PidGains,
    pub limits: PidLimits,
}

impl PidConfig {
    /// Tuning used on the reference gimbal: proportional only, `kp = 150`.
    pub const TRACKING: Self = Self {
        gains: PidGains::new(150.0, 0.0, 0.0),
        limits: PidLimits::DEFAULT,
    };
}

impl Default for PidConfig {
    fn default() -> Self {
        Self::TRACKING
    }
}

/// PID controller with deadzone, anti-windup and output clamping.
///
/// The derivative is a one-sample backward difference on the error, and the
/// integral is a plain running sum of the error, so call [`calculate`] at a
/// fixed rate.
///
/// [`calculate`]: Self::calculate
#[derive(Clone, Debug)]
pub struct PidController {
    gains: PidGains,
    limits: PidLimits,

    /// Accumulated error, always within `±integral_limit`.
    integral: f32,
    /// Error seen by the previous update.
    last_error: f32,
}

impl PidController {
    /// Create a controller with the given gains and default limits.
    #[must_use]
    pub const fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self::from_config(PidConfig {
            gains: PidGains::new(kp, ki, kd),
            limits: PidLimits::DEFAULT,
        })
    }

    #[must_use]
    pub const fn from_config(config: PidConfig) -> Self {
        Self {
            gains: config.gains,
            limits: config.limits,
            integral: 0.0,
            last_error: 0.0,
        }
    }

    /// Set the integral (anti-windup) limit.
    #[must_use]
    pub fn with_integral_limit(mut self, limit: f32) -> Self {
        self.limits.integral_limit = limit;
        self
    }

    /// Set the output limit.
    #[must_use]
    pub fn with_output_limit(mut self, limit: f32) -> Self {
        self.limits.output_limit = limit;
        self
    }

    /// Set the deadzone.
    #[must_use]
    pub fn with_deadzone(mut self, deadzone: f32) -> Self {
        self.limits.deadzone = deadzone;
        self
    }

    #[inline]
    #[must_use]
    pub fn gains(&self) -> PidGains {
        self.gains
    }

    /// Replace the gains. Limits and controller memory are untouched.
    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    #[inline]
    #[must_use]
    pub fn limits(&self) -> PidLimits {
        self.limits
    }

    #[inline]
    #[must_use]
    pub fn deadzone(&self) -> f32 {
        self.limits.deadzone
    }

    pub fn set_deadzone(&mut self, deadzone: f32) {
        self.limits.deadzone = deadzone;
    }

    #[inline]
    #[must_use]
    pub fn integral(&self) -> f32 {
        self.integral
    }

    #[inline]
    #[must_use]
    pub fn last_error(&self) -> f32 {
        self.last_error
    }

    /// Whether `error` falls inside the deadzone.
    #[inline]
    #[must_use]
    pub fn in_deadzone(&self, error: f32) -> bool {
        abs(error) < self.limits.deadzone
    }

    /// Clear the integrator and derivative history. Gains and limits are kept.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_error = 0.0;
    }

    /// Run one update for `error` (setpoint minus measurement, or the reverse,
    /// as long as it is consistent).
    ///
    /// Returns a command in `[-output_limit, output_limit]`.
    pub fn calculate(&mut self, error: f32) -> f32 {
        // Deadzone check comes first so jitter around the setpoint never winds
        // up the integrator.
        if self.in_deadzone(error) {
            self.reset();
            return 0.0;
        }

        let integral_limit = self.limits.integral_limit;
        self.integral = clamp(self.integral + error, integral_limit);

        let derivative = error - self.last_error;

        let output = self.gains.kp * error + self.gains.ki * self.integral + self.gains.kd * derivative;

        self.last_error = error;

        clamp(output, self.limits.output_limit)
    }
}

impl Default for PidController {
    fn default() -> Self {
        Self::from_config(PidConfig::default())
    }
}

#[inline]
fn abs(value: f32) -> f32 {
    if value < 0.0 {
        -value
    } else {
        value
    }
}

/// Symmetric clamp that also maps NaN to zero.
#[inline]
fn clamp(value: f32, limit: f32) -> f32 {
    if value > limit {
        limit
    } else if value < -limit {
        -limit
    } else if value.is_nan() {
        0.0
    } else {
        value
    }
}
