//! Vision sensor coordinate protocol parser.
//!
//! The sensor reports one detection per line:
//!
//! ```text
//! <x>,<y>\n
//! ```
//!
//! - `x`, `y` - Decimal integers, pixel coordinates of the target centre
//! - `\n` or `\r` - Line terminator
//! - `0,0` - Reserved: no target in view
//!
//! [`CoordinateParser`] consumes the stream one byte at a time with O(1) work
//! per byte and never blocks, so it can run directly in a receive interrupt.

use crate::types::{FrameSize, TargetSample};
use heapless::Vec;

/// Line buffer capacity in bytes (terminator excluded).
pub const MAX_LINE_LENGTH: usize = 32;

/// Reasons a complete line is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Nothing between terminators.
    Empty,
    /// No `,` between the two coordinates.
    MissingSeparator,
    /// A coordinate is empty, contains a non-digit, or overflows `i32`.
    InvalidNumber,
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty line"),
            Self::MissingSeparator => write!(f, "missing separator"),
            Self::InvalidNumber => write!(f, "invalid number"),
        }
    }
}

/// Parse one line (terminator already stripped) into a target sample.
///
/// `0,0` yields [`TargetSample::NONE`]. Any other pair is clamped into the
/// frame independently per coordinate and reported as valid.
///
/// Both halves must be complete numbers: `",5"`, `"5,"` and `"1,2,3"` are
/// rejected rather than read as `(0,5)`, `(5,0)` and `(1,2)` the way a
/// lenient `atoi`-style reader would.
///
/// # Example
///
/// ```
/// use gimbal_proto::{parse_line, FrameSize, TargetSample};
///
/// let sample = parse_line(b"300,50", FrameSize::REFERENCE).unwrap();
/// assert_eq!(sample, TargetSample::at(240, 50));
/// ```
pub fn parse_line(line: &[u8], frame: FrameSize) -> Result<TargetSample, ParseError> {
    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    let comma = line
        .iter()
        .position(|&b| b == b',')
        .ok_or(ParseError::MissingSeparator)?;

    let x = parse_i32(&line[..comma])?;
    let y = parse_i32(&line[comma + 1..])?;

    if x == 0 && y == 0 {
        return Ok(TargetSample::NONE);
    }

    Ok(TargetSample::at(
        clamp_coordinate(x, frame.width),
        clamp_coordinate(y, frame.height),
    ))
}

/// Clamp into `[0, limit]`; the result always fits the limit's type.
#[inline]
fn clamp_coordinate(value: i32, limit: i16) -> i16 {
    value.clamp(0, i32::from(limit)) as i16
}

/// Parse a decimal string as i32 with an optional leading sign.
#[inline]
fn parse_i32(s: &[u8]) -> Result<i32, ParseError> {
    let (negative, digits) = match s.first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    if digits.is_empty() {
        return Err(ParseError::InvalidNumber);
    }

    let mut value: i32 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return Err(ParseError::InvalidNumber);
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(i32::from(b - b'0')))
            .ok_or(ParseError::InvalidNumber)?;
    }

    Ok(if negative { -value } else { value })
}

/// Outcome of a byte that ended the current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineEvent {
    /// A well-formed line, including the "no target" sample.
    Sample(TargetSample),
    /// A terminated line that failed to parse.
    Rejected(ParseError),
    /// The line outgrew [`MAX_LINE_LENGTH`] and was dropped.
    Overflow,
}

/// Incremental byte-stream parser for the coordinate protocol.
///
/// Only ASCII digits and `,` enter the line buffer; every other byte except a
/// terminator is dropped without touching the buffer. A line that outgrows
/// [`MAX_LINE_LENGTH`] is thrown away and parsing restarts with the next byte.
pub struct CoordinateParser {
    buffer: Vec<u8, MAX_LINE_LENGTH>,
    frame: FrameSize,
}

impl CoordinateParser {
    /// Create a parser that clamps coordinates into `frame`.
    #[must_use]
    pub const fn new(frame: FrameSize) -> Self {
        Self {
            buffer: Vec::new(),
            frame,
        }
    }

    /// Frame the parser clamps into.
    #[inline]
    #[must_use]
    pub fn frame(&self) -> FrameSize {
        self.frame
    }

    /// Number of payload bytes buffered for the current line.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Drop any partially received line.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Feed a single byte.
    ///
    /// Returns `Some(sample)` when the byte terminates a well-formed line,
    /// including the "no target" sample for `0,0`. Malformed lines, noise,
    /// overflow and bare terminators all yield `None`.
    pub fn push(&mut self, byte: u8) -> Option<TargetSample> {
        match self.feed(byte)? {
            LineEvent::Sample(sample) => Some(sample),
            LineEvent::Rejected(_) | LineEvent::Overflow => None,
        }
    }

    /// Feed a single byte and report what happened to the current line.
    ///
    /// Returns `None` while a line is still being collected, for noise bytes
    /// and for bare terminators.
    pub fn feed(&mut self, byte: u8) -> Option<LineEvent> {
        match byte {
            b'\n' | b'\r' => {
                if self.buffer.is_empty() {
                    return None;
                }
                let result = parse_line(&self.buffer, self.frame);
                self.buffer.clear();
                Some(match result {
                    Ok(sample) => LineEvent::Sample(sample),
                    Err(e) => LineEvent::Rejected(e),
                })
            }
            b'0'..=b'9' | b',' => {
                if self.buffer.push(byte).is_err() {
                    self.buffer.clear();
                    return Some(LineEvent::Overflow);
                }
                None
            }
            _ => None,
        }
    }
}

impl Default for CoordinateParser {
    fn default() -> Self {
        Self::new(FrameSize::REFERENCE)
    }
}
