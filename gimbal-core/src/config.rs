//! Startup configuration.

use crate::motor::MotorConfig;
use crate::pid::PidConfig;
use gimbal_proto::FrameSize;

/// Everything the control loop needs to know, fixed at construction.
///
/// `Default` is the reference gimbal: 240x240 sensor, proportional-only PID
/// on both axes, position-mode motors at 16 microsteps.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GimbalConfig {
    /// Sensor resolution; the image centre is the setpoint.
    pub frame: FrameSize,
    pub pid_h: PidConfig,
    pub pid_v: PidConfig,
    /// Consecutive centred ticks before declaring a lock.
    pub lock_threshold: u8,
    /// Degrees of motor rotation per unit of PID output.
    pub degrees_per_output: f32,
    pub control_rate_hz: u32,
    pub motor: MotorConfig,
}

impl GimbalConfig {
    pub const DEFAULT: Self = Self {
        frame: FrameSize::REFERENCE,
        pid_h: PidConfig::TRACKING,
        pid_v: PidConfig::TRACKING,
        lock_threshold: 10,
        degrees_per_output: 0.01,
        control_rate_hz: 50,
        motor: MotorConfig::DEFAULT,
    };

    /// Control period in milliseconds.
    #[must_use]
    pub const fn tick_period_ms(&self) -> u64 {
        if self.control_rate_hz == 0 {
            1000
        } else {
            1000 / self.control_rate_hz as u64
        }
    }

    /// Ticks in one second, used to pace periodic log output.
    #[must_use]
    pub const fn ticks_per_second(&self) -> u32 {
        if self.control_rate_hz == 0 {
            1
        } else {
            self.control_rate_hz
        }
    }
}

impl Default for GimbalConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::DriveMode;

    #[test]
    fn test_reference_defaults() {
        let config = GimbalConfig::default();
        assert_eq!(config.frame.center(), (120, 120));
        assert_eq!(config.lock_threshold, 10);
        assert_eq!(config.pid_h.gains.kp, 150.0);
        assert_eq!(config.pid_v.limits.deadzone, 8.0);
        assert_eq!(config.motor.horizontal_address, 2);
        assert_eq!(config.motor.vertical_address, 1);
        assert!(matches!(config.motor.drive_mode, DriveMode::Position(_)));
    }

    #[test]
    fn test_tick_period() {
        assert_eq!(GimbalConfig::DEFAULT.tick_period_ms(), 20);
        let stalled = GimbalConfig {
            control_rate_hz: 0,
            ..GimbalConfig::DEFAULT
        };
        assert_eq!(stalled.tick_period_ms(), 1000);
        assert_eq!(stalled.ticks_per_second(), 1);
    }
}
