//! Receive-side glue: coordinate parser feeding the target mailbox.

use crate::mailbox::TargetMailbox;
use gimbal_proto::{CoordinateParser, FrameSize, LineEvent};

/// Byte sink for the vision sensor UART.
///
/// Owns the line parser and is the only writer of the mailbox. Everything it
/// does per byte is bounded and non-blocking, so it is safe to drive from a
/// receive interrupt or a high-priority task.
pub struct TargetReceiver<'a> {
    parser: CoordinateParser,
    mailbox: &'a TargetMailbox,
}

impl<'a> TargetReceiver<'a> {
    /// Create a receiver publishing into `mailbox`.
    #[must_use]
    pub const fn new(frame: FrameSize, mailbox: &'a TargetMailbox) -> Self {
        Self {
            parser: CoordinateParser::new(frame),
            mailbox,
        }
    }

    /// Feed one received byte. Returns `true` if it completed a line that was
    /// published to the mailbox.
    pub fn on_byte(&mut self, byte: u8) -> bool {
        match self.parser.feed(byte) {
            Some(LineEvent::Sample(sample)) => {
                trace!("target sample {:?}", sample);
                self.mailbox.publish(sample);
                true
            }
            Some(LineEvent::Rejected(e)) => {
                trace!("discarded line: {:?}", e);
                false
            }
            Some(LineEvent::Overflow) => {
                trace!("discarded overlong line");
                false
            }
            None => false,
        }
    }

    /// Feed a chunk of received bytes. Returns how many samples were published.
    pub fn on_bytes(&mut self, bytes: &[u8]) -> usize {
        bytes.iter().filter(|&&b| self.on_byte(b)).count()
    }

    /// Drop any partial line, e.g. after a UART framing error.
    pub fn resync(&mut self) {
        self.parser.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gimbal_proto::TargetSample;

    #[test]
    fn test_complete_line_is_published() {
        let mailbox = TargetMailbox::new();
        let mut receiver = TargetReceiver::new(FrameSize::REFERENCE, &mailbox);

        assert_eq!(receiver.on_bytes(b"113,11"), 0);
        assert!(!mailbox.has_pending());
        assert!(!receiver.on_byte(b'4'));
        assert!(receiver.on_byte(b'\n'));
        assert_eq!(mailbox.take(), Some(TargetSample::at(113, 114)));
    }

    #[test]
    fn test_latest_line_wins() {
        let mailbox = TargetMailbox::new();
        let mut receiver = TargetReceiver::new(FrameSize::REFERENCE, &mailbox);

        assert_eq!(receiver.on_bytes(b"10,10\n20,20\n0,0\n"), 3);
        assert_eq!(mailbox.take(), Some(TargetSample::NONE));
        assert_eq!(mailbox.take(), None);
    }

    #[test]
    fn test_malformed_line_publishes_nothing() {
        let mailbox = TargetMailbox::new();
        let mut receiver = TargetReceiver::new(FrameSize::REFERENCE, &mailbox);

        assert_eq!(receiver.on_bytes(b"10\n,\n\r\n"), 0);
        assert!(!mailbox.has_pending());
    }

    #[test]
    fn test_discarded_line_keeps_previous_sample() {
        let mailbox = TargetMailbox::new();
        let mut receiver = TargetReceiver::new(FrameSize::REFERENCE, &mailbox);

        assert_eq!(receiver.on_bytes(b"40,50\n"), 1);
        assert_eq!(receiver.on_bytes(b"7,\n"), 0);
        let long = [b'9'; gimbal_proto::MAX_LINE_LENGTH + 1];
        assert_eq!(receiver.on_bytes(&long), 0);
        assert_eq!(receiver.on_bytes(b"\n"), 0);
        assert_eq!(mailbox.take(), Some(TargetSample::at(40, 50)));
    }

    #[test]
    fn test_resync_drops_partial_line() {
        let mailbox = TargetMailbox::new();
        let mut receiver = TargetReceiver::new(FrameSize::REFERENCE, &mailbox);

        receiver.on_bytes(b"12,3");
        receiver.resync();
        assert_eq!(receiver.on_bytes(b"4\n"), 0);
        assert!(!mailbox.has_pending());
    }
}
