//! Time sources: a monotonic uptime counter and a wall clock.

use chrono::{Local, NaiveDateTime, TimeDelta};
use tokio::time::Instant;

use crate::traits::ClockSource;

/// Milliseconds since boot.
///
/// Backed by `tokio::time::Instant`, so paused-time tests advance it with
/// `tokio::time::advance` or by sleeping.
#[derive(Debug, Clone, Copy)]
pub struct Uptime {
    boot: Instant,
}

impl Uptime {
    pub fn start() -> Self {
        Self {
            boot: Instant::now(),
        }
    }

    /// Full-width uptime, used for menu timing.
    pub fn now_ms(&self) -> u64 {
        self.boot.elapsed().as_millis() as u64
    }

    /// Uptime truncated to the 32-bit counter the interrupt latches use.
    pub fn now_ms_u32(&self) -> u32 {
        self.now_ms() as u32
    }
}

impl Default for Uptime {
    fn default() -> Self {
        Self::start()
    }
}

/// Host wall clock with a settable offset.
///
/// The host clock itself is never changed: setting the time records the
/// difference and applies it on every read.
#[derive(Debug, Clone)]
pub struct SystemClock {
    reference: NaiveDateTime,
    offset: TimeDelta,
}

impl SystemClock {
    /// `reference` is what [`reset_to_reference`](ClockSource::reset_to_reference) sets.
    pub fn new(reference: NaiveDateTime) -> Self {
        Self {
            reference,
            offset: TimeDelta::zero(),
        }
    }
}

impl ClockSource for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local() + self.offset
    }

    fn reset_to_reference(&mut self) -> NaiveDateTime {
        self.offset = self.reference - Local::now().naive_local();
        self.reference
    }
}
