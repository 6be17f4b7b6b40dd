//! Motor driver link over a transmit-only UART.
//!
//! # Pins
//!
//! - Tilt: UART0 TX on GPIO 0
//! - Pan: UART1 TX on GPIO 4

use embassy_rp::uart::{Async, UartTx};
use embassy_time::{with_timeout, Duration};
use gimbal_core::{FrameSink, LinkError, MotorFrame};

/// Upper bound on writing one frame.
pub const TRANSMIT_TIMEOUT: Duration = Duration::from_millis(100);

/// [`FrameSink`] writing frames to one motor driver UART.
pub struct UartMotorLink<'d> {
    tx: UartTx<'d, Async>,
    timeout: Duration,
}

impl<'d> UartMotorLink<'d> {
    /// Create a link with the default [`TRANSMIT_TIMEOUT`].
    #[must_use]
    pub fn new(tx: UartTx<'d, Async>) -> Self {
        Self {
            tx,
            timeout: TRANSMIT_TIMEOUT,
        }
    }

    /// Override the transmit timeout.
    #[must_use]
    pub fn with_transmit_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl FrameSink for UartMotorLink<'_> {
    async fn send(&mut self, frame: &MotorFrame) -> Result<(), LinkError> {
        match with_timeout(self.timeout, self.tx.write(frame.as_bytes())).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(LinkError::Io),
            Err(_) => Err(LinkError::Timeout),
        }
    }
}
