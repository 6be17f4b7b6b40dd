//! GimbalController: the fixed-rate tracking state machine.

use crate::command::ControlCommand;
use crate::config::GimbalConfig;
use crate::mailbox::TargetMailbox;
use crate::motor::MotorDriver;
use crate::output::{FrameSink, LinkError};
use crate::pid::{PidController, PidGains};
use crate::telemetry::TrackingTelemetry;
use embedded_hal_async::delay::DelayNs;
use gimbal_proto::{Axis, TargetSample};

/// Choreography run by [`GimbalController::self_test`].
const SELF_TEST_MOVES: [(Axis, f32); 4] = [
    (Axis::Horizontal, -30.0),
    (Axis::Horizontal, 30.0),
    (Axis::Vertical, 15.0),
    (Axis::Vertical, -15.0),
];
const SELF_TEST_PAUSE_MS: u32 = 1000;

/// Tracking state as seen from outside the control task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GimbalState {
    /// No target this tick. Motors keep whatever they were last told.
    #[default]
    Idle,
    /// Target seen, motors being steered towards it.
    Tracking,
    /// Target held inside both deadzones long enough; motors stopped.
    Locked,
}

/// Owns both PID loops and the motor driver, and turns target samples into
/// motor commands once per tick.
///
/// The receive side only ever touches the [`TargetMailbox`]; everything else
/// here belongs to the control task.
///
/// Starts `Idle` and disabled. Call [`enable`](Self::enable) to start tracking.
pub struct GimbalController<'a, H, V, D> {
    mailbox: &'a TargetMailbox,
    pid_h: PidController,
    pid_v: PidController,
    motors: MotorDriver<H, V, D>,
    config: GimbalConfig,

    state: GimbalState,
    enabled: bool,
    lock_counter: u8,
    /// Consecutive ticks without a usable sample.
    missed_ticks: u32,
    last_target: TargetSample,
}

impl<'a, H: FrameSink, V: FrameSink, D: DelayNs> GimbalController<'a, H, V, D> {
    /// Create a controller reading from `mailbox` and driving `motors`.
    pub fn new(mailbox: &'a TargetMailbox, motors: MotorDriver<H, V, D>, config: GimbalConfig) -> Self {
        Self {
            mailbox,
            pid_h: PidController::from_config(config.pid_h),
            pid_v: PidController::from_config(config.pid_v),
            motors,
            config,
            state: GimbalState::Idle,
            enabled: false,
            lock_counter: 0,
            missed_ticks: 0,
            last_target: TargetSample::NONE,
        }
    }

    /// Run one control period. Call at `config.control_rate_hz`.
    ///
    /// Takes at most one sample from the mailbox. Returns a telemetry record
    /// when a valid target was consumed, `None` otherwise (including while
    /// disabled, when nothing at all happens).
    pub async fn tick(&mut self) -> Option<TrackingTelemetry> {
        if !self.enabled {
            return None;
        }

        let sample = self.mailbox.take();
        if let Some(sample) = sample {
            self.last_target = sample;
        }

        let Some((dx, dy)) = sample.and_then(|s| s.offset_from_center(self.config.frame)) else {
            self.target_missing();
            return None;
        };
        self.missed_ticks = 0;

        let (error_h, error_v) = (f32::from(dx), f32::from(dy));
        let output_h = self.pid_h.calculate(error_h);
        let output_v = self.pid_v.calculate(error_v);

        if self.pid_h.in_deadzone(error_h) && self.pid_v.in_deadzone(error_v) {
            self.centered().await;
        } else {
            self.steer(output_h, output_v).await;
        }

        Some(TrackingTelemetry {
            target_x: self.last_target.x,
            target_y: self.last_target.y,
            dx,
            dy,
            output_h,
            output_v,
            state: self.state,
        })
    }

    fn target_missing(&mut self) {
        self.missed_ticks = self.missed_ticks.saturating_add(1);
        if self.missed_ticks == 1 {
            info!("target lost");
        } else if self.missed_ticks % self.config.ticks_per_second() == 0 {
            debug!("waiting for target ({} ticks)", self.missed_ticks);
        }
        self.state = GimbalState::Idle;
        self.lock_counter = 0;
    }

    async fn centered(&mut self) {
        self.state = GimbalState::Tracking;
        self.lock_counter = self.lock_counter.saturating_add(1);
        if self.lock_counter < self.config.lock_threshold {
            return;
        }

        self.state = GimbalState::Locked;
        self.lock_counter = 0;
        info!("locked at ({}, {})", self.last_target.x, self.last_target.y);
        // Link errors are logged by the driver. The next lock sends Stop again.
        let _ = self.motors.stop_all().await;
    }

    async fn steer(&mut self, output_h: f32, output_v: f32) {
        self.lock_counter = 0;
        if self.state != GimbalState::Tracking {
            debug!("tracking");
        }
        self.state = GimbalState::Tracking;

        let scale = self.config.degrees_per_output;
        // A failure on one axis must not keep the other from moving.
        let _ = self.motors.move_by(Axis::Horizontal, output_h * scale).await;
        let _ = self.motors.move_by(Axis::Vertical, output_v * scale).await;
    }

    /// Start tracking from a clean slate.
    pub fn enable(&mut self) {
        self.enabled = true;
        self.state = GimbalState::Idle;
        self.pid_h.reset();
        self.pid_v.reset();
        self.lock_counter = 0;
        self.missed_ticks = 0;
        info!("tracking enabled");
    }

    /// Stop tracking and stop both motors. Each call sends one Stop per axis.
    pub async fn disable(&mut self) {
        self.enabled = false;
        self.state = GimbalState::Idle;
        self.lock_counter = 0;
        info!("tracking disabled");
        if let Err(e) = self.motors.stop_all().await {
            error!("failed to stop motors: {:?}", e);
        }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> GimbalState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Most recent sample taken from the mailbox, valid or not.
    #[inline]
    #[must_use]
    pub fn last_target(&self) -> TargetSample {
        self.last_target
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &GimbalConfig {
        &self.config
    }

    fn pid_mut(&mut self, axis: Axis) -> &mut PidController {
        match axis {
            Axis::Horizontal => &mut self.pid_h,
            Axis::Vertical => &mut self.pid_v,
        }
    }

    /// The PID controller of one axis.
    #[must_use]
    pub fn pid_controller(&self, axis: Axis) -> &PidController {
        match axis {
            Axis::Horizontal => &self.pid_h,
            Axis::Vertical => &self.pid_v,
        }
    }

    /// Retune one axis. Takes effect on the next tick.
    pub fn set_pid(&mut self, axis: Axis, gains: PidGains) {
        info!("{:?} gains kp={} ki={} kd={}", axis, gains.kp, gains.ki, gains.kd);
        self.pid_mut(axis).set_gains(gains);
    }

    #[must_use]
    pub fn pid(&self, axis: Axis) -> PidGains {
        self.pid_controller(axis).gains()
    }

    /// Change the deadzone of one axis, in pixels. Also moves the lock window.
    pub fn set_deadzone(&mut self, axis: Axis, deadzone: f32) {
        info!("{:?} deadzone {}", axis, deadzone);
        self.pid_mut(axis).set_deadzone(deadzone);
    }

    /// Manual move, bypassing the PID. Does not change the tracking state.
    pub async fn move_axis(&mut self, axis: Axis, angle_deg: f32) -> Result<(), LinkError> {
        info!("manual move {:?} by {}", axis, angle_deg);
        self.motors.move_by(axis, angle_deg).await
    }

    pub async fn stop_all(&mut self) -> Result<(), LinkError> {
        self.motors.stop_all().await
    }

    /// Sweep both axes through a fixed pattern, pausing after each move.
    ///
    /// Stops at the first link error.
    pub async fn self_test(&mut self) -> Result<(), LinkError> {
        info!("self test");
        for (axis, angle) in SELF_TEST_MOVES {
            self.motors.move_by(axis, angle).await?;
            self.motors.pause_ms(SELF_TEST_PAUSE_MS).await;
        }
        Ok(())
    }

    /// Energize both motors. Call once at startup before enabling.
    pub async fn power_on(&mut self) -> Result<(), LinkError> {
        self.motors.power_on().await
    }

    /// De-energize both motors.
    pub async fn release(&mut self) -> Result<(), LinkError> {
        self.motors.release().await
    }

    /// Execute one operator command.
    pub async fn apply(&mut self, command: ControlCommand) -> Result<(), LinkError> {
        match command {
            ControlCommand::Enable => self.enable(),
            ControlCommand::Disable => self.disable().await,
            ControlCommand::SetPid(axis, gains) => self.set_pid(axis, gains),
            ControlCommand::SetDeadzone(axis, deadzone) => self.set_deadzone(axis, deadzone),
            ControlCommand::MoveAxis(axis, angle) => return self.move_axis(axis, angle).await,
            ControlCommand::StopAll => return self.stop_all().await,
            ControlCommand::SelfTest => return self.self_test().await,
            ControlCommand::Release => return self.release().await,
        }
        Ok(())
    }

    /// Get a reference to the motor driver.
    pub fn motors(&self) -> &MotorDriver<H, V, D> {
        &self.motors
    }

    /// Decompose the controller into its motor driver.
    pub fn into_motors(self) -> MotorDriver<H, V, D> {
        self.motors
    }
}
