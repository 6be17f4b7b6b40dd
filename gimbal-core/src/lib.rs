//! Platform-agnostic control core for a vision-tracking two-axis gimbal.
//!
//! This crate holds everything between the vision sensor's byte stream and
//! the motor drivers' serial links, without any chip-specific dependencies.
//! It runs in embedded `no_std` environments and on host for testing.
//!
//! # Overview
//!
//! - [`input`]: Receive-side glue ([`TargetReceiver`])
//! - [`mailbox`]: Single-slot sample handoff ([`TargetMailbox`])
//! - [`pid`]: Per-axis PID with deadzone and anti-windup ([`PidController`])
//! - [`output`]: Motor link trait ([`FrameSink`])
//! - [`motor`]: Axis-bound motor driver and drive modes ([`MotorDriver`], [`DriveMode`])
//! - [`controller`]: Fixed-rate tracking state machine ([`GimbalController`])
//! - [`command`]: Operator commands ([`ControlCommand`])
//! - [`telemetry`]: Per-tick tracking record ([`TrackingTelemetry`])
//! - [`config`]: Startup configuration ([`GimbalConfig`])
//!
//! # Data Flow
//!
//! ```text
//! sensor UART -> TargetReceiver -> TargetMailbox -> GimbalController::tick
//!                (receive context)                  (50 Hz task)
//!                                                   -> PidController x2
//!                                                   -> MotorDriver -> FrameSink x2
//! ```
//!
//! # Example
//!
//! ```rust
//! use gimbal_core::{FrameSize, TargetMailbox, TargetReceiver, TargetSample};
//!
//! static MAILBOX: TargetMailbox = TargetMailbox::new();
//!
//! let mut receiver = TargetReceiver::new(FrameSize::REFERENCE, &MAILBOX);
//! receiver.on_bytes(b"113,114\n");
//!
//! let sample = MAILBOX.take().unwrap();
//! assert_eq!(sample, TargetSample::at(113, 114));
//! assert_eq!(sample.offset_from_center(FrameSize::REFERENCE), Some((-7, -6)));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting and logging (for embedded targets)
//! - **`log`**: Route log output through the `log` facade instead
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

mod fmt;

pub mod command;
pub mod config;
pub mod controller;
pub mod input;
pub mod mailbox;
pub mod motor;
pub mod output;
pub mod pid;
pub mod telemetry;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use command::ControlCommand;
pub use config::GimbalConfig;
pub use controller::{GimbalController, GimbalState};
pub use input::TargetReceiver;
pub use mailbox::TargetMailbox;
pub use motor::{
    DriveMode, Motion, MotionStrategy, MotorConfig, MotorDriver, PositionMotion, SpeedMotion,
    MIN_MOVE_DEG,
};
pub use output::{FrameSink, LinkError};
pub use pid::{PidConfig, PidController, PidGains, PidLimits};
pub use telemetry::TrackingTelemetry;

pub use gimbal_proto::{
    Axis, Direction, FrameSize, MotorCommand, MotorFrame, TargetSample, MAX_FRAME_SIZE,
};
