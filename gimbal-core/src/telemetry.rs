//! Per-tick tracking record for host-side monitoring.

use crate::controller::GimbalState;

/// Snapshot produced on every tick that consumed a valid target.
///
/// Formatting, sampling and transport are left to whoever receives it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrackingTelemetry {
    /// Target position in sensor pixels.
    pub target_x: i16,
    pub target_y: i16,
    /// Offset from the image centre.
    pub dx: i16,
    pub dy: i16,
    /// Raw PID outputs before scaling to degrees.
    pub output_h: f32,
    pub output_v: f32,
    /// State after the tick was evaluated.
    pub state: GimbalState,
}
