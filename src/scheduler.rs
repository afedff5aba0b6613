//! Frame scheduling and clocks consumed by the simulation
//!
//! A running simulation ticks once per frame. Where frames come from is up
//! to the host: a render loop, a timer, or a test stepping frames by hand.
//! The simulation only requests a frame, asks whether it is due, and cancels
//! it on `stop()`.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Identifies one requested frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Per-frame scheduling primitive with matching cancel
pub trait FrameScheduler {
    /// Request the next frame
    fn request_frame(&mut self) -> FrameHandle;

    /// Cancel a requested frame. Unknown or stale handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);

    /// Whether the frame identified by `handle` should run now
    fn is_due(&mut self, handle: FrameHandle) -> bool;
}

/// Every requested frame is due immediately. Lets tests and headless runs
/// step the simulation deterministically.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: Option<FrameHandle>,
    requested: u64,
    cancelled: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame requested and neither run nor cancelled yet
    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Total frames requested
    pub fn requested(&self) -> u64 {
        self.requested
    }

    /// Total frames cancelled
    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        self.requested += 1;
        let handle = FrameHandle(self.next_id);
        self.pending = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
            self.cancelled += 1;
        }
    }

    fn is_due(&mut self, handle: FrameHandle) -> bool {
        if self.pending == Some(handle) {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

/// Frames become due a fixed interval after they were requested
#[derive(Debug)]
pub struct IntervalScheduler {
    interval: Duration,
    next_id: u64,
    pending: Option<(FrameHandle, Instant)>,
}

/// Roughly 60 frames per second
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

impl IntervalScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_id: 0,
            pending: None,
        }
    }
}

impl Default for IntervalScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL)
    }
}

impl FrameScheduler for IntervalScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending = Some((handle, Instant::now()));
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if matches!(self.pending, Some((h, _)) if h == handle) {
            self.pending = None;
        }
    }

    fn is_due(&mut self, handle: FrameHandle) -> bool {
        match self.pending {
            Some((h, requested)) if h == handle && requested.elapsed() >= self.interval => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }
}

/// Monotonic time source for tick metrics
pub trait Clock {
    /// Time elapsed since an arbitrary fixed origin
    fn now(&self) -> Duration;
}

/// Wall-clock monotonic time
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Advances by a fixed step on every reading
#[derive(Debug, Default)]
pub struct SteppingClock {
    step: Duration,
    current: Cell<Duration>,
}

impl SteppingClock {
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            current: Cell::new(Duration::ZERO),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> Duration {
        let now = self.current.get();
        self.current.set(now + self.step);
        now
    }
}
