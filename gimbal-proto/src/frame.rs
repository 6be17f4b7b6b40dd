//! Binary command frames for the closed-loop stepper motor drivers.
//!
//! Every frame starts with the driver address, follows with an opcode and a
//! fixed parameter layout, and ends with the constant byte [`FRAME_TERMINATOR`].
//! Multi-byte fields are big-endian.
//!
//! | Command  | Layout |
//! | -------- | ------ |
//! | Position | `addr FD dir spd_hi spd_lo acc p3 p2 p1 p0 mode sync 6B` |
//! | Speed    | `addr F6 dir spd_hi spd_lo acc sync 6B` |
//! | Stop     | `addr FE 98 sync 6B` |
//! | Enable   | `addr F3 AB flag sync 6B` |
//!
//! The trailing `0x6B` is what the driver expects in place of a checksum. It is
//! never computed from the payload.

use crate::types::Direction;

/// Constant last byte of every frame.
pub const FRAME_TERMINATOR: u8 = 0x6B;

// Opcodes
pub const OP_POSITION: u8 = 0xFD;
pub const OP_SPEED: u8 = 0xF6;
pub const OP_STOP: u8 = 0xFE;
pub const OP_ENABLE: u8 = 0xF3;

/// Fixed parameter byte of the stop command.
pub const STOP_PARAM: u8 = 0x98;
/// Fixed parameter byte of the enable command.
pub const ENABLE_PARAM: u8 = 0xAB;

pub const DIR_CW: u8 = 0x01;
pub const DIR_CCW: u8 = 0x00;

/// Position moves are relative to the current shaft position.
pub const MODE_RELATIVE: u8 = 0x00;
/// Multi-motor synchronous start is never used.
pub const SYNC_DISABLED: u8 = 0x00;

pub const POSITION_FRAME_LEN: usize = 13;
pub const SPEED_FRAME_LEN: usize = 8;
pub const STOP_FRAME_LEN: usize = 5;
pub const ENABLE_FRAME_LEN: usize = 6;

/// Largest frame the codec produces.
pub const MAX_FRAME_SIZE: usize = POSITION_FRAME_LEN;

/// A logical command for one motor driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorCommand {
    /// Relative move by `pulses` steps.
    Position {
        direction: Direction,
        speed_rpm: u16,
        accel: u8,
        pulses: u32,
    },
    /// Run continuously until stopped.
    Speed {
        direction: Direction,
        speed_rpm: u16,
        accel: u8,
    },
    /// Stop immediately.
    Stop,
    /// Energize (`true`) or release (`false`) the motor.
    Enable(bool),
}

impl MotorCommand {
    /// Relative move by a signed step count; the sign selects the direction.
    #[must_use]
    pub const fn relative_move(pulses: i32, speed_rpm: u16, accel: u8) -> Self {
        Self::Position {
            direction: Direction::from_signed(pulses),
            speed_rpm,
            accel,
            pulses: pulses.unsigned_abs(),
        }
    }
}

/// Error type for frame decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Fewer bytes than the opcode requires (or no opcode at all).
    Truncated,
    /// Opcode is not one of the four known commands.
    UnknownOpcode(u8),
    /// Last byte is not [`FRAME_TERMINATOR`].
    BadTerminator(u8),
    /// A fixed or enumerated field holds an unexpected value.
    InvalidField,
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Truncated => write!(f, "truncated frame"),
            Self::UnknownOpcode(op) => write!(f, "unknown opcode {op:#04x}"),
            Self::BadTerminator(b) => write!(f, "bad terminator {b:#04x}"),
            Self::InvalidField => write!(f, "invalid field"),
        }
    }
}

/// One encoded frame, ready to be written to a motor UART.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorFrame {
    bytes: [u8; MAX_FRAME_SIZE],
    len: usize,
}

impl MotorFrame {
    /// Encode `command` for the driver at `address`.
    ///
    /// # Example
    ///
    /// ```
    /// use gimbal_proto::{MotorCommand, MotorFrame};
    ///
    /// let frame = MotorFrame::encode(2, &MotorCommand::Stop);
    /// assert_eq!(frame.as_bytes(), &[0x02, 0xFE, 0x98, 0x00, 0x6B]);
    /// ```
    #[must_use]
    pub fn encode(address: u8, command: &MotorCommand) -> Self {
        let mut bytes = [0u8; MAX_FRAME_SIZE];
        bytes[0] = address;

        let len = match *command {
            MotorCommand::Position {
                direction,
                speed_rpm,
                accel,
                pulses,
            } => {
                let [spd_hi, spd_lo] = speed_rpm.to_be_bytes();
                bytes[1] = OP_POSITION;
                bytes[2] = direction_byte(direction);
                bytes[3] = spd_hi;
                bytes[4] = spd_lo;
                bytes[5] = accel;
                bytes[6..10].copy_from_slice(&pulses.to_be_bytes());
                bytes[10] = MODE_RELATIVE;
                bytes[11] = SYNC_DISABLED;
                POSITION_FRAME_LEN
            }
            MotorCommand::Speed {
                direction,
                speed_rpm,
                accel,
            } => {
                let [spd_hi, spd_lo] = speed_rpm.to_be_bytes();
                bytes[1] = OP_SPEED;
                bytes[2] = direction_byte(direction);
                bytes[3] = spd_hi;
                bytes[4] = spd_lo;
                bytes[5] = accel;
                bytes[6] = SYNC_DISABLED;
                SPEED_FRAME_LEN
            }
            MotorCommand::Stop => {
                bytes[1] = OP_STOP;
                bytes[2] = STOP_PARAM;
                bytes[3] = SYNC_DISABLED;
                STOP_FRAME_LEN
            }
            MotorCommand::Enable(on) => {
                bytes[1] = OP_ENABLE;
                bytes[2] = ENABLE_PARAM;
                bytes[3] = u8::from(on);
                bytes[4] = SYNC_DISABLED;
                ENABLE_FRAME_LEN
            }
        };

        bytes[len - 1] = FRAME_TERMINATOR;
        Self { bytes, len }
    }

    /// Encoded bytes, terminator included.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Driver address the frame is for.
    #[inline]
    #[must_use]
    pub fn address(&self) -> u8 {
        self.bytes[0]
    }

    /// Opcode byte.
    #[inline]
    #[must_use]
    pub fn opcode(&self) -> u8 {
        self.bytes[1]
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Decode this frame back into its address and command.
    pub fn decode(&self) -> Result<(u8, MotorCommand), DecodeError> {
        decode(self.as_bytes())
    }
}

impl core::fmt::Debug for MotorFrame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("MotorFrame").field(&self.as_bytes()).finish()
    }
}

/// Decode one complete frame into its driver address and command.
///
/// The slice must hold exactly one frame.
pub fn decode(bytes: &[u8]) -> Result<(u8, MotorCommand), DecodeError> {
    if bytes.len() < 2 {
        return Err(DecodeError::Truncated);
    }

    let address = bytes[0];
    let opcode = bytes[1];
    let expected_len = match opcode {
        OP_POSITION => POSITION_FRAME_LEN,
        OP_SPEED => SPEED_FRAME_LEN,
        OP_STOP => STOP_FRAME_LEN,
        OP_ENABLE => ENABLE_FRAME_LEN,
        other => return Err(DecodeError::UnknownOpcode(other)),
    };

    if bytes.len() < expected_len {
        return Err(DecodeError::Truncated);
    }
    if bytes.len() > expected_len {
        return Err(DecodeError::InvalidField);
    }

    let terminator = bytes[expected_len - 1];
    if terminator != FRAME_TERMINATOR {
        return Err(DecodeError::BadTerminator(terminator));
    }

    let command = match opcode {
        OP_POSITION => {
            if bytes[10] != MODE_RELATIVE || bytes[11] != SYNC_DISABLED {
                return Err(DecodeError::InvalidField);
            }
            MotorCommand::Position {
                direction: parse_direction(bytes[2])?,
                speed_rpm: u16::from_be_bytes([bytes[3], bytes[4]]),
                accel: bytes[5],
                pulses: u32::from_be_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]),
            }
        }
        OP_SPEED => {
            if bytes[6] != SYNC_DISABLED {
                return Err(DecodeError::InvalidField);
            }
            MotorCommand::Speed {
                direction: parse_direction(bytes[2])?,
                speed_rpm: u16::from_be_bytes([bytes[3], bytes[4]]),
                accel: bytes[5],
            }
        }
        OP_STOP => {
            if bytes[2] != STOP_PARAM || bytes[3] != SYNC_DISABLED {
                return Err(DecodeError::InvalidField);
            }
            MotorCommand::Stop
        }
        _ => {
            if bytes[2] != ENABLE_PARAM || bytes[4] != SYNC_DISABLED {
                return Err(DecodeError::InvalidField);
            }
            let on = match bytes[3] {
                0x00 => false,
                0x01 => true,
                _ => return Err(DecodeError::InvalidField),
            };
            MotorCommand::Enable(on)
        }
    };

    Ok((address, command))
}

#[inline]
const fn direction_byte(direction: Direction) -> u8 {
    match direction {
        Direction::Clockwise => DIR_CW,
        Direction::CounterClockwise => DIR_CCW,
    }
}

#[inline]
fn parse_direction(byte: u8) -> Result<Direction, DecodeError> {
    match byte {
        DIR_CW => Ok(Direction::Clockwise),
        DIR_CCW => Ok(Direction::CounterClockwise),
        _ => Err(DecodeError::InvalidField),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_frame_layout() {
        let frame = MotorFrame::encode(2, &MotorCommand::relative_move(133, 1200, 5));
        assert_eq!(
            frame.as_bytes(),
            &[0x02, 0xFD, 0x01, 0x04, 0xB0, 0x05, 0x00, 0x00, 0x00, 0x85, 0x00, 0x00, 0x6B]
        );
    }

    #[test]
    fn test_position_frame_negative_encodes_magnitude() {
        let frame = MotorFrame::encode(1, &MotorCommand::relative_move(-70_000, 1200, 5));
        let bytes = frame.as_bytes();
        assert_eq!(bytes[2], DIR_CCW);
        assert_eq!(&bytes[6..10], &70_000u32.to_be_bytes());
    }

    #[test]
    fn test_speed_frame_layout() {
        let command = MotorCommand::Speed {
            direction: Direction::CounterClockwise,
            speed_rpm: 600,
            accel: 10,
        };
        let frame = MotorFrame::encode(1, &command);
        assert_eq!(
            frame.as_bytes(),
            &[0x01, 0xF6, 0x00, 0x02, 0x58, 0x0A, 0x00, 0x6B]
        );
    }

    #[test]
    fn test_stop_frame_layout() {
        let frame = MotorFrame::encode(1, &MotorCommand::Stop);
        assert_eq!(frame.as_bytes(), &[0x01, 0xFE, 0x98, 0x00, 0x6B]);
    }

    #[test]
    fn test_enable_frame_layout() {
        let on = MotorFrame::encode(2, &MotorCommand::Enable(true));
        let off = MotorFrame::encode(2, &MotorCommand::Enable(false));
        assert_eq!(on.as_bytes(), &[0x02, 0xF3, 0xAB, 0x01, 0x00, 0x6B]);
        assert_eq!(off.as_bytes(), &[0x02, 0xF3, 0xAB, 0x00, 0x00, 0x6B]);
    }

    #[test]
    fn test_terminator_is_constant() {
        let commands = [
            MotorCommand::relative_move(-5, 1, 2),
            MotorCommand::Speed {
                direction: Direction::Clockwise,
                speed_rpm: 0xFFFF,
                accel: 0xFF,
            },
            MotorCommand::Stop,
            MotorCommand::Enable(true),
        ];
        for command in commands {
            let frame = MotorFrame::encode(0xFF, &command);
            assert_eq!(frame.as_bytes().last(), Some(&FRAME_TERMINATOR));
        }
    }

    #[test]
    fn test_decode_position_frame() {
        let frame = MotorFrame::encode(2, &MotorCommand::relative_move(133, 1200, 5));
        let (address, command) = frame.decode().unwrap();
        assert_eq!(address, 2);
        assert_eq!(
            command,
            MotorCommand::Position {
                direction: Direction::Clockwise,
                speed_rpm: 1200,
                accel: 5,
                pulses: 133,
            }
        );
    }

    #[test]
    fn test_decode_rejects_bad_frames() {
        assert_eq!(decode(&[]), Err(DecodeError::Truncated));
        assert_eq!(decode(&[0x01, 0x42, 0x6B]), Err(DecodeError::UnknownOpcode(0x42)));
        assert_eq!(decode(&[0x01, 0xFE, 0x98, 0x00]), Err(DecodeError::Truncated));
        assert_eq!(
            decode(&[0x01, 0xFE, 0x98, 0x00, 0x00]),
            Err(DecodeError::BadTerminator(0x00))
        );
        assert_eq!(
            decode(&[0x01, 0xFE, 0x99, 0x00, 0x6B]),
            Err(DecodeError::InvalidField)
        );
        assert_eq!(
            decode(&[0x01, 0xF3, 0xAB, 0x02, 0x00, 0x6B]),
            Err(DecodeError::InvalidField)
        );
    }
}
