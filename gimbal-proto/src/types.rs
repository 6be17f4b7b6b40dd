//! Core gimbal types: Axis, Direction, FrameSize, TargetSample.

/// One of the two motorized gimbal axes.
///
/// Every per-axis operation takes an `Axis`, so there is no way to address an
/// axis that does not exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// Pan axis, driven by the horizontal target offset (`dx`).
    Horizontal,
    /// Tilt axis, driven by the vertical target offset (`dy`).
    Vertical,
}

impl Axis {
    /// Both axes, horizontal first.
    pub const ALL: [Axis; 2] = [Axis::Horizontal, Axis::Vertical];
}

/// Rotation direction as seen by the motor driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

impl Direction {
    /// Direction for a signed step count: non-negative turns clockwise.
    #[inline]
    #[must_use]
    pub const fn from_signed(value: i32) -> Self {
        if value >= 0 {
            Self::Clockwise
        } else {
            Self::CounterClockwise
        }
    }
}

/// Sensor image dimensions in pixels.
///
/// Valid coordinates lie in `[0, width] x [0, height]` (both ends inclusive).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameSize {
    pub width: i16,
    pub height: i16,
}

impl FrameSize {
    /// Resolution of the reference vision sensor.
    pub const REFERENCE: Self = Self::new(240, 240);

    #[must_use]
    pub const fn new(width: i16, height: i16) -> Self {
        Self { width, height }
    }

    /// Image centre, the tracking setpoint.
    #[inline]
    #[must_use]
    pub const fn center(&self) -> (i16, i16) {
        (self.width / 2, self.height / 2)
    }
}

impl Default for FrameSize {
    fn default() -> Self {
        Self::REFERENCE
    }
}

/// One detection reported by the vision sensor.
///
/// A sample with `valid == false` means "no target"; its coordinates carry no
/// meaning and are always zero.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TargetSample {
    pub x: i16,
    pub y: i16,
    pub valid: bool,
}

impl TargetSample {
    /// The "no target" sample.
    pub const NONE: Self = Self {
        x: 0,
        y: 0,
        valid: false,
    };

    /// A detected target at `(x, y)`.
    #[must_use]
    pub const fn at(x: i16, y: i16) -> Self {
        Self { x, y, valid: true }
    }

    /// Offset of the target from the image centre, `(x - cx, y - cy)`.
    ///
    /// Returns `None` for the "no target" sample.
    #[inline]
    #[must_use]
    pub fn offset_from_center(&self, frame: FrameSize) -> Option<(i16, i16)> {
        if !self.valid {
            return None;
        }
        let (cx, cy) = frame.center();
        Some((self.x.saturating_sub(cx), self.y.saturating_sub(cy)))
    }
}
