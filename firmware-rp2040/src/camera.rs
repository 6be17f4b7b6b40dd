//! Vision sensor receive loop.
//!
//! Reads the sensor's coordinate lines one byte at a time and hands each
//! byte to a [`TargetReceiver`], which publishes finished samples to the
//! mailbox.
//!
//! # Pins
//!
//! Uses UART0 RX on GPIO 1 at 115200 baud.

use defmt::warn;
use embassy_rp::uart::{Async, Error as UartError, UartRx};
use gimbal_core::TargetReceiver;

/// Vision sensor input on an async UART receiver.
pub struct CameraInput<'d> {
    rx: UartRx<'d, Async>,
    receiver: TargetReceiver<'static>,
}

impl<'d> CameraInput<'d> {
    #[must_use]
    pub fn new(rx: UartRx<'d, Async>, receiver: TargetReceiver<'static>) -> Self {
        Self { rx, receiver }
    }

    /// Receive one byte and feed it to the parser.
    ///
    /// Any UART error drops the partial line so the next terminator starts
    /// clean.
    pub async fn poll(&mut self) -> Result<(), UartError> {
        let mut byte = [0u8; 1];
        match self.rx.read(&mut byte).await {
            Ok(()) => {
                self.receiver.on_byte(byte[0]);
                Ok(())
            }
            Err(e) => {
                self.receiver.resync();
                Err(e)
            }
        }
    }

    /// Receive forever.
    pub async fn run(&mut self) -> ! {
        loop {
            if let Err(e) = self.poll().await {
                warn!("camera UART error: {:?}", e);
            }
        }
    }
}
