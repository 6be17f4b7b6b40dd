//! Vision-tracking gimbal controller for RP2040.
//!
//! This crate provides the embedded side of the gimbal: it feeds the vision
//! sensor's UART into the control core and carries motor frames out over the
//! two driver UARTs.
//!
//! # Overview
//!
//! The firmware runs on a Raspberry Pi Pico (RP2040) and:
//! 1. Receives target coordinates over UART (115200 baud, 8N1)
//! 2. Runs the tracking loop at 50 Hz
//! 3. Sends stepper driver frames to the pan and tilt motors
//!
//! # Hardware Configuration
//!
//! | Function  | GPIO | Description |
//! |-----------|------|-------------|
//! | UART0 TX  | 0    | Tilt motor driver (address 1) |
//! | UART0 RX  | 1    | Vision sensor coordinates |
//! | UART1 TX  | 4    | Pan motor driver (address 2) |
//!
//! # Architecture
//!
//! The firmware uses the Embassy async runtime with two concurrent tasks:
//!
//! - **Camera Task**: Reads sensor bytes and publishes samples to the mailbox
//! - **Control Task**: Ticks the controller at a fixed rate and applies
//!   operator commands received over a channel
//!
//! The two tasks share nothing but the [`TargetMailbox`], whose publish and
//! take are single atomic operations.
//!
//! # Modules
//!
//! - [`camera`]: Vision sensor receive loop ([`CameraInput`])
//! - [`motor_link`]: Motor driver UART link ([`UartMotorLink`])
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)
//! - **`track-on-boot`** (default): Enable tracking once the motors are powered

#![no_std]

#[cfg(all(feature = "dev-panic", feature = "prod-panic"))]
compile_error!("Cannot enable both `dev-panic` and `prod-panic` features");

// Re-export core types for convenience
pub use gimbal_core::{
    Axis, ControlCommand, DriveMode, FrameSink, GimbalConfig, GimbalController, GimbalState,
    LinkError, MotorConfig, MotorDriver, PidGains, TargetMailbox, TargetReceiver,
    TrackingTelemetry,
};

pub mod camera;
pub mod motor_link;

pub use camera::CameraInput;
pub use motor_link::{UartMotorLink, TRANSMIT_TIMEOUT};
