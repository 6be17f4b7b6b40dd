//! Host-side doubles shared by the unit tests.

extern crate std;

use crate::output::{FrameSink, LinkError};
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};
use embedded_hal_async::delay::DelayNs;
use gimbal_proto::{MotorCommand, MotorFrame};
use std::sync::{Arc, Mutex};
use std::vec::Vec;

/// Records every frame written to it.
#[derive(Clone, Default)]
pub(crate) struct MockLink {
    sent: Arc<Mutex<Vec<MotorFrame>>>,
    fail_with: Option<LinkError>,
    failures_left: Arc<Mutex<usize>>,
}

impl MockLink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A link that rejects every frame.
    pub(crate) fn failing(error: LinkError) -> Self {
        Self::failing_times(error, usize::MAX)
    }

    /// A link that rejects the first `count` frames, then records the rest.
    pub(crate) fn failing_times(error: LinkError, count: usize) -> Self {
        Self {
            sent: Arc::default(),
            fail_with: Some(error),
            failures_left: Arc::new(Mutex::new(count)),
        }
    }

    pub(crate) fn frames(&self) -> Vec<MotorFrame> {
        self.sent.lock().unwrap().clone()
    }

    /// Decoded commands, in send order.
    pub(crate) fn commands(&self) -> Vec<MotorCommand> {
        self.frames()
            .iter()
            .map(|f| f.decode().unwrap().1)
            .collect()
    }

    pub(crate) fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl FrameSink for MockLink {
    async fn send(&mut self, frame: &MotorFrame) -> Result<(), LinkError> {
        if let Some(error) = self.fail_with {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(error);
            }
        }
        self.sent.lock().unwrap().push(*frame);
        Ok(())
    }
}

/// Completes immediately and records each requested wait in milliseconds.
#[derive(Clone, Default)]
pub(crate) struct MockDelay {
    waits: Arc<Mutex<Vec<u32>>>,
}

impl MockDelay {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn waits(&self) -> Vec<u32> {
        self.waits.lock().unwrap().clone()
    }
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.waits.lock().unwrap().push(ns / 1_000_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.waits.lock().unwrap().push(ms);
    }
}

/// Run a future to completion (simple blocking executor).
pub(crate) fn block_on<F: Future>(mut f: F) -> F::Output {
    fn noop_raw_waker() -> RawWaker {
        fn noop(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            noop_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
        RawWaker::new(core::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(noop_raw_waker()) };
    let mut cx = Context::from_waker(&waker);

    // SAFETY: We don't move f after pinning
    let mut f = unsafe { Pin::new_unchecked(&mut f) };

    match f.as_mut().poll(&mut cx) {
        Poll::Ready(result) => result,
        Poll::Pending => panic!("Mock future returned Pending unexpectedly"),
    }
}
