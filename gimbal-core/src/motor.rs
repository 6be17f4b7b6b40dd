//! Axis-bound motor command driver.
//!
//! Converts move-by-angle requests into motor frames and writes each frame to
//! the link permanently bound to its axis. How an angle becomes frames is
//! decided by the configured [`DriveMode`].

use crate::output::{FrameSink, LinkError};
use embedded_hal_async::delay::DelayNs;
use gimbal_proto::{Axis, Direction, MotorCommand, MotorFrame};

/// Requests below this magnitude (degrees) become a stop.
pub const MIN_MOVE_DEG: f32 = 0.1;

/// Settle time before the first frame after power-up.
const POWER_SETTLE_MS: u32 = 100;
/// Gap between enabling consecutive drivers.
const ENABLE_GAP_MS: u32 = 50;

/// What a strategy wants sent for one move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Motion {
    pub command: MotorCommand,
    /// When set, the driver waits this long and then stops the axis.
    pub stop_after_ms: Option<u32>,
}

impl Motion {
    const STOP: Self = Self {
        command: MotorCommand::Stop,
        stop_after_ms: None,
    };
}

/// Turns a signed angle into a motion for the motor driver.
pub trait MotionStrategy {
    /// Plan a relative move of `angle_deg` for a motor with the given
    /// resolution. Called only with `|angle_deg| >= MIN_MOVE_DEG`.
    fn plan(&self, angle_deg: f32, pulses_per_degree: f32) -> Motion;
}

/// Relative position moves: one Position frame per request.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PositionMotion {
    pub speed_rpm: u16,
    pub accel: u8,
}

impl PositionMotion {
    /// 1200 rpm, acceleration level 5.
    pub const DEFAULT: Self = Self {
        speed_rpm: 1200,
        accel: 5,
    };
}

impl MotionStrategy for PositionMotion {
    fn plan(&self, angle_deg: f32, pulses_per_degree: f32) -> Motion {
        // `as` truncates toward zero and saturates.
        let pulses = (angle_deg * pulses_per_degree) as i32;
        if pulses == 0 {
            return Motion::STOP;
        }
        Motion {
            command: MotorCommand::relative_move(pulses, self.speed_rpm, self.accel),
            stop_after_ms: None,
        }
    }
}

/// Timed constant-speed runs: a Speed frame, a wait sized to cover the
/// angle, then a Stop frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpeedMotion {
    pub speed_rpm: u16,
    pub accel: u8,
    /// Angles larger than this run at twice `speed_rpm`.
    pub fast_threshold_deg: f32,
}

impl SpeedMotion {
    /// 600 rpm, acceleration level 10, double speed above 10 degrees.
    pub const DEFAULT: Self = Self {
        speed_rpm: 600,
        accel: 10,
        fast_threshold_deg: 10.0,
    };

    /// Extra run time on top of the nominal travel time.
    const MARGIN_MS: u32 = 100;
}

impl MotionStrategy for SpeedMotion {
    fn plan(&self, angle_deg: f32, _pulses_per_degree: f32) -> Motion {
        let magnitude = abs(angle_deg);
        let direction = if angle_deg > 0.0 {
            Direction::Clockwise
        } else {
            Direction::CounterClockwise
        };
        let speed_rpm = if magnitude > self.fast_threshold_deg {
            self.speed_rpm.saturating_mul(2)
        } else {
            self.speed_rpm
        };

        // rpm * 360 deg/rev over 60000 ms/min gives degrees per millisecond.
        let travel_ms = magnitude * 60_000.0 / (f32::from(speed_rpm) * 360.0);

        Motion {
            command: MotorCommand::Speed {
                direction,
                speed_rpm,
                accel: self.accel,
            },
            stop_after_ms: Some((travel_ms as u32).saturating_add(Self::MARGIN_MS)),
        }
    }
}

/// Motion strategy selected once at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriveMode {
    Position(PositionMotion),
    Speed(SpeedMotion),
}

impl Default for DriveMode {
    fn default() -> Self {
        Self::Position(PositionMotion::DEFAULT)
    }
}

impl MotionStrategy for DriveMode {
    fn plan(&self, angle_deg: f32, pulses_per_degree: f32) -> Motion {
        match self {
            Self::Position(strategy) => strategy.plan(angle_deg, pulses_per_degree),
            Self::Speed(strategy) => strategy.plan(angle_deg, pulses_per_degree),
        }
    }
}

/// Static motor wiring and resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorConfig {
    /// Driver address of the pan motor.
    pub horizontal_address: u8,
    /// Driver address of the tilt motor.
    pub vertical_address: u8,
    /// Full steps times microstepping per output revolution.
    pub steps_per_revolution: u32,
    pub drive_mode: DriveMode,
}

impl MotorConfig {
    /// Reference wiring: tilt at address 1, pan at address 2, 16 microsteps.
    pub const DEFAULT: Self = Self {
        horizontal_address: 2,
        vertical_address: 1,
        steps_per_revolution: 3200,
        drive_mode: DriveMode::Position(PositionMotion::DEFAULT),
    };

    #[inline]
    #[must_use]
    pub fn pulses_per_degree(&self) -> f32 {
        self.steps_per_revolution as f32 / 360.0
    }

    #[inline]
    #[must_use]
    pub fn address(&self, axis: Axis) -> u8 {
        match axis {
            Axis::Horizontal => self.horizontal_address,
            Axis::Vertical => self.vertical_address,
        }
    }
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Drives both gimbal motors, each over its own link.
pub struct MotorDriver<H, V, D> {
    horizontal: H,
    vertical: V,
    delay: D,
    config: MotorConfig,
}

impl<H: FrameSink, V: FrameSink, D: DelayNs> MotorDriver<H, V, D> {
    /// Bind the pan link, the tilt link and a delay source.
    pub fn new(horizontal: H, vertical: V, delay: D, config: MotorConfig) -> Self {
        Self {
            horizontal,
            vertical,
            delay,
            config,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &MotorConfig {
        &self.config
    }

    /// Encode and transmit one command. No retry on failure.
    pub async fn send(&mut self, axis: Axis, command: &MotorCommand) -> Result<(), LinkError> {
        let frame = MotorFrame::encode(self.config.address(axis), command);
        debug!("{:?} <- {:?}", axis, command);
        let result = match axis {
            Axis::Horizontal => self.horizontal.send(&frame).await,
            Axis::Vertical => self.vertical.send(&frame).await,
        };
        if let Err(e) = result {
            warn!("{:?} link error: {:?}", axis, e);
        }
        result
    }

    /// Rotate `axis` by a signed angle in degrees.
    ///
    /// Requests smaller than [`MIN_MOVE_DEG`] (and NaN) become a stop. In
    /// speed mode this waits for the timed run to finish.
    pub async fn move_by(&mut self, axis: Axis, angle_deg: f32) -> Result<(), LinkError> {
        // Written so that NaN also lands on the stop branch.
        if !(abs(angle_deg) >= MIN_MOVE_DEG) {
            return self.stop(axis).await;
        }

        let motion = self
            .config
            .drive_mode
            .plan(angle_deg, self.config.pulses_per_degree());
        self.send(axis, &motion.command).await?;

        if let Some(ms) = motion.stop_after_ms {
            self.delay.delay_ms(ms).await;
            self.stop(axis).await?;
        }
        Ok(())
    }

    pub async fn stop(&mut self, axis: Axis) -> Result<(), LinkError> {
        self.send(axis, &MotorCommand::Stop).await
    }

    /// Stop both axes, horizontal first. Both stops are attempted even if the
    /// first fails; the first error is returned.
    pub async fn stop_all(&mut self) -> Result<(), LinkError> {
        let horizontal = self.stop(Axis::Horizontal).await;
        let vertical = self.stop(Axis::Vertical).await;
        horizontal.and(vertical)
    }

    /// Energize both drivers after power-up, vertical first.
    pub async fn power_on(&mut self) -> Result<(), LinkError> {
        self.delay.delay_ms(POWER_SETTLE_MS).await;
        let vertical = self.send(Axis::Vertical, &MotorCommand::Enable(true)).await;
        self.delay.delay_ms(ENABLE_GAP_MS).await;
        let horizontal = self
            .send(Axis::Horizontal, &MotorCommand::Enable(true))
            .await;
        self.delay.delay_ms(ENABLE_GAP_MS).await;
        vertical.and(horizontal)
    }

    /// De-energize both drivers so the gimbal can be moved by hand.
    pub async fn release(&mut self) -> Result<(), LinkError> {
        let horizontal = self
            .send(Axis::Horizontal, &MotorCommand::Enable(false))
            .await;
        let vertical = self.send(Axis::Vertical, &MotorCommand::Enable(false)).await;
        horizontal.and(vertical)
    }

    /// Wait without sending anything.
    pub async fn pause_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms).await;
    }

    /// Get a reference to the pan link.
    pub fn horizontal(&self) -> &H {
        &self.horizontal
    }

    /// Get a reference to the tilt link.
    pub fn vertical(&self) -> &V {
        &self.vertical
    }

    /// Decompose the driver into its links and delay source.
    pub fn into_parts(self) -> (H, V, D) {
        (self.horizontal, self.vertical, self.delay)
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

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::testing::{block_on, MockDelay, MockLink};
    use gimbal_proto::frame::{DIR_CW, OP_POSITION, OP_SPEED, OP_STOP};
    use gimbal_proto::decode;

    fn driver(mode: DriveMode) -> MotorDriver<MockLink, MockLink, MockDelay> {
        let config = MotorConfig {
            drive_mode: mode,
            ..MotorConfig::DEFAULT
        };
        MotorDriver::new(MockLink::new(), MockLink::new(), MockDelay::new(), config)
    }

    #[test]
    fn test_move_15_degrees_encodes_133_pulses() {
        let mut motors = driver(DriveMode::default());
        block_on(motors.move_by(Axis::Horizontal, 15.0)).unwrap();

        let sent = motors.horizontal().frames();
        assert_eq!(sent.len(), 1);
        let bytes = sent[0].as_bytes();
        assert_eq!(bytes[0], 2);
        assert_eq!(bytes[1], OP_POSITION);
        assert_eq!(bytes[2], DIR_CW);
        assert_eq!(bytes.last(), Some(&0x6B));

        let (address, command) = decode(bytes).unwrap();
        assert_eq!(address, 2);
        assert_eq!(
            command,
            MotorCommand::Position {
                direction: Direction::Clockwise,
                speed_rpm: 1200,
                accel: 5,
                pulses: 133,
            }
        );
        assert!(motors.vertical().frames().is_empty());
    }

    #[test]
    fn test_negative_move_truncates_toward_zero() {
        let mut motors = driver(DriveMode::default());
        block_on(motors.move_by(Axis::Vertical, -1.2)).unwrap();

        let (address, command) = motors.vertical().frames()[0].decode().unwrap();
        assert_eq!(address, 1);
        assert!(matches!(
            command,
            MotorCommand::Position {
                direction: Direction::CounterClockwise,
                pulses: 10,
                ..
            }
        ));
    }

    #[test]
    fn test_tiny_move_becomes_stop() {
        let mut motors = driver(DriveMode::default());
        for angle in [0.0, 0.05, -0.099, f32::NAN] {
            block_on(motors.move_by(Axis::Horizontal, angle)).unwrap();
        }
        let sent = motors.horizontal().frames();
        assert_eq!(sent.len(), 4);
        assert!(sent.iter().all(|f| f.opcode() == OP_STOP));
    }

    #[test]
    fn test_move_rounding_to_zero_pulses_becomes_stop() {
        let mut motors = driver(DriveMode::default());
        block_on(motors.move_by(Axis::Horizontal, 0.1)).unwrap();
        assert_eq!(motors.horizontal().frames()[0].opcode(), OP_STOP);
    }

    #[test]
    fn test_speed_mode_runs_then_stops() {
        let mut motors = driver(DriveMode::Speed(SpeedMotion::DEFAULT));
        block_on(motors.move_by(Axis::Horizontal, 30.0)).unwrap();

        let sent = motors.horizontal().frames();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].opcode(), OP_SPEED);
        assert_eq!(
            sent[0].decode().unwrap().1,
            MotorCommand::Speed {
                direction: Direction::Clockwise,
                speed_rpm: 1200,
                accel: 10,
            }
        );
        assert_eq!(sent[1].opcode(), OP_STOP);

        // 30 deg at 1200 rpm = 7200 deg/s -> 4.16 ms, plus the margin.
        let (_, _, delay) = motors.into_parts();
        assert_eq!(delay.waits(), [104]);
    }

    #[test]
    fn test_speed_mode_slow_below_threshold() {
        let strategy = SpeedMotion::DEFAULT;
        let motion = strategy.plan(-6.0, 8.0);
        assert_eq!(
            motion.command,
            MotorCommand::Speed {
                direction: Direction::CounterClockwise,
                speed_rpm: 600,
                accel: 10,
            }
        );
        assert_eq!(motion.stop_after_ms, Some(101));
    }

    #[test]
    fn test_stop_all_sends_one_stop_per_axis() {
        let mut motors = driver(DriveMode::default());
        block_on(motors.stop_all()).unwrap();
        assert_eq!(motors.horizontal().frames().len(), 1);
        assert_eq!(motors.vertical().frames().len(), 1);
        assert_eq!(motors.horizontal().frames()[0].as_bytes(), &[2, 0xFE, 0x98, 0, 0x6B]);
        assert_eq!(motors.vertical().frames()[0].as_bytes(), &[1, 0xFE, 0x98, 0, 0x6B]);
    }

    #[test]
    fn test_stop_all_attempts_both_axes_on_failure() {
        let mut motors = MotorDriver::new(
            MockLink::failing(LinkError::Timeout),
            MockLink::new(),
            MockDelay::new(),
            MotorConfig::DEFAULT,
        );
        assert_eq!(block_on(motors.stop_all()), Err(LinkError::Timeout));
        assert_eq!(motors.vertical().frames().len(), 1);
    }

    #[test]
    fn test_power_on_sequence() {
        let mut motors = driver(DriveMode::default());
        block_on(motors.power_on()).unwrap();

        assert_eq!(
            motors.vertical().frames()[0].as_bytes(),
            &[1, 0xF3, 0xAB, 1, 0, 0x6B]
        );
        assert_eq!(
            motors.horizontal().frames()[0].as_bytes(),
            &[2, 0xF3, 0xAB, 1, 0, 0x6B]
        );
        let (_, _, delay) = motors.into_parts();
        assert_eq!(delay.waits(), [100, 50, 50]);
    }

    #[test]
    fn test_release_disables_both() {
        let mut motors = driver(DriveMode::default());
        block_on(motors.release()).unwrap();
        assert_eq!(
            motors.horizontal().frames()[0].decode().unwrap().1,
            MotorCommand::Enable(false)
        );
        assert_eq!(
            motors.vertical().frames()[0].decode().unwrap().1,
            MotorCommand::Enable(false)
        );
    }
}
