//! Wire protocols for the vision-tracking gimbal.
//!
//! This crate covers both serial links the gimbal core talks over:
//!
//! - **Types**: Shared data model
//!   - [`Axis`] - Horizontal (pan) or vertical (tilt) axis
//!   - [`TargetSample`] - One detection from the vision sensor
//!   - [`FrameSize`] - Sensor resolution and tracking setpoint
//!   - [`Direction`] - Motor rotation direction
//!
//! - **Coordinate input**: Text lines from the vision sensor
//!   - [`CoordinateParser`] - Byte-at-a-time parser, safe for interrupt context
//!   - [`parse_line()`] - Parse one complete line
//!
//! - **Motor output**: Binary frames for the stepper drivers
//!   - [`MotorCommand`] - Position, speed, stop, enable
//!   - [`MotorFrame`] - Encoded frame bytes
//!   - [`decode()`] - Frame back to address and command
//!
//! # Coordinate Protocol
//!
//! ```text
//! <x>,<y>\n
//! ```
//!
//! Decimal pixel coordinates, `\n` or `\r` terminated. `0,0` means no target.
//! Coordinates outside the frame are clamped to its edge.
//!
//! # Motor Protocol
//!
//! Fixed-layout big-endian frames addressed by driver ID and terminated by the
//! constant byte `0x6B`. See [`frame`] for the layouts.
//!
//! # Examples
//!
//! ```
//! use gimbal_proto::{CoordinateParser, MotorCommand, MotorFrame, TargetSample};
//!
//! let mut parser = CoordinateParser::default();
//! let mut last = None;
//! for &b in b"113,114\n" {
//!     if let Some(sample) = parser.push(b) {
//!         last = Some(sample);
//!     }
//! }
//! assert_eq!(last, Some(TargetSample::at(113, 114)));
//!
//! let frame = MotorFrame::encode(1, &MotorCommand::Enable(true));
//! assert_eq!(frame.as_bytes(), &[0x01, 0xF3, 0xAB, 0x01, 0x00, 0x6B]);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod frame;
pub mod parser;
pub mod types;

// Re-export types at crate root for convenience
pub use frame::{decode, DecodeError, MotorCommand, MotorFrame, FRAME_TERMINATOR, MAX_FRAME_SIZE};
pub use parser::{parse_line, CoordinateParser, LineEvent, ParseError, MAX_LINE_LENGTH};
pub use types::{Axis, Direction, FrameSize, TargetSample};
