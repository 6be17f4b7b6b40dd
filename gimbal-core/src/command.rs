//! Operator commands delivered to the control task by message passing.

use crate::pid::PidGains;
use gimbal_proto::Axis;

/// One request for the control surface of [`GimbalController`].
///
/// Sent over a channel so the control task stays the only owner of the
/// controller state.
///
/// [`GimbalController`]: crate::GimbalController
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlCommand {
    /// Start tracking.
    Enable,
    /// Stop tracking and halt both motors.
    Disable,
    SetPid(Axis, PidGains),
    /// Deadzone in pixels for one axis.
    SetDeadzone(Axis, f32),
    /// Manual move by a signed angle in degrees, bypassing the PID.
    MoveAxis(Axis, f32),
    StopAll,
    SelfTest,
    /// De-energize both motors.
    Release,
}
