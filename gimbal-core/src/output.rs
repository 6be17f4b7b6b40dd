//! Motor link trait and error types.

use core::future::Future;
use gimbal_proto::MotorFrame;

/// Error type for motor link operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// The frame could not be written within the link's time budget.
    Timeout,
    /// UART/communication I/O error.
    Io,
}

/// Async trait for the serial link to one motor driver.
///
/// Each axis owns its own link; a link never carries frames for another
/// axis. The drivers do not acknowledge frames, so `send` completes once the
/// bytes are on the wire (or the link gives up).
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait FrameSink {
    /// Transmit one frame.
    ///
    /// Implementations bound the time spent here and report
    /// [`LinkError::Timeout`] rather than block indefinitely.
    fn send(&mut self, frame: &MotorFrame) -> impl Future<Output = Result<(), LinkError>>;
}

impl<T: FrameSink> FrameSink for &mut T {
    fn send(&mut self, frame: &MotorFrame) -> impl Future<Output = Result<(), LinkError>> {
        T::send(self, frame)
    }
}
