//! Single-slot handoff of target samples from the receive context to the
//! control loop.
//!
//! The whole sample lives in one 64-bit atomic word, so a reader sees either
//! the previous sample or the new one, never a mix of both.

use gimbal_proto::TargetSample;
use portable_atomic::{AtomicU64, Ordering};

const FRESH: u64 = 1 << 33;
const VALID: u64 = 1 << 32;

/// Overwrite-on-write, take-on-read mailbox holding at most one sample.
///
/// Intended for exactly one producer and one consumer. A sample the consumer
/// does not take before the next publish is silently replaced.
pub struct TargetMailbox {
    slot: AtomicU64,
}

impl TargetMailbox {
    /// Create an empty mailbox (usable in a `static`).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: AtomicU64::new(0),
        }
    }

    /// Publish a sample, replacing any sample not yet taken.
    #[inline]
    pub fn publish(&self, sample: TargetSample) {
        self.slot.store(pack(sample), Ordering::Release);
    }

    /// Take the pending sample, leaving the mailbox empty.
    #[inline]
    pub fn take(&self) -> Option<TargetSample> {
        unpack(self.slot.swap(0, Ordering::AcqRel))
    }

    /// Whether a sample is waiting.
    #[inline]
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.slot.load(Ordering::Acquire) & FRESH != 0
    }
}

impl Default for TargetMailbox {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn pack(sample: TargetSample) -> u64 {
    let mut word = FRESH | u64::from(sample.x as u16) | (u64::from(sample.y as u16) << 16);
    if sample.valid {
        word |= VALID;
    }
    word
}

#[inline]
fn unpack(word: u64) -> Option<TargetSample> {
    if word & FRESH == 0 {
        return None;
    }
    Some(TargetSample {
        x: word as u16 as i16,
        y: (word >> 16) as u16 as i16,
        valid: word & VALID != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_mailbox_yields_nothing() {
        let mailbox = TargetMailbox::new();
        assert!(!mailbox.has_pending());
        assert_eq!(mailbox.take(), None);
    }

    #[test]
    fn test_take_clears() {
        let mailbox = TargetMailbox::new();
        mailbox.publish(TargetSample::at(113, 114));
        assert!(mailbox.has_pending());
        assert_eq!(mailbox.take(), Some(TargetSample::at(113, 114)));
        assert_eq!(mailbox.take(), None);
    }

    #[test]
    fn test_publish_overwrites() {
        let mailbox = TargetMailbox::new();
        mailbox.publish(TargetSample::at(1, 2));
        mailbox.publish(TargetSample::at(3, 4));
        assert_eq!(mailbox.take(), Some(TargetSample::at(3, 4)));
    }

    #[test]
    fn test_no_target_sample_round_trips() {
        let mailbox = TargetMailbox::new();
        mailbox.publish(TargetSample::NONE);
        assert_eq!(mailbox.take(), Some(TargetSample::NONE));
    }

    #[test]
    fn test_extreme_coordinates_round_trip() {
        let mailbox = TargetMailbox::new();
        mailbox.publish(TargetSample::at(i16::MAX, 0));
        assert_eq!(mailbox.take(), Some(TargetSample::at(i16::MAX, 0)));
        mailbox.publish(TargetSample::at(0, 240));
        assert_eq!(mailbox.take(), Some(TargetSample::at(0, 240)));
    }

    #[test]
    fn test_concurrent_publish_is_never_torn() {
        extern crate std;
        use std::sync::Arc;
        use std::thread;

        let mailbox = Arc::new(TargetMailbox::new());
        let producer = {
            let mailbox = Arc::clone(&mailbox);
            thread::spawn(move || {
                for i in 1..5_000i16 {
                    mailbox.publish(TargetSample::at(i % 240 + 1, i % 240 + 1));
                }
            })
        };

        for _ in 0..5_000 {
            if let Some(sample) = mailbox.take() {
                assert!(sample.valid);
                assert_eq!(sample.x, sample.y);
            }
        }
        producer.join().unwrap();
    }
}
