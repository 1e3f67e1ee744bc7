//! Scriptable wall clock.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{NaiveDateTime, TimeDelta};

use crate::traits::ClockSource;

#[derive(Debug)]
struct ClockState {
    now: NaiveDateTime,
    reference: NaiveDateTime,
    resets: usize,
}

/// Clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one copy while the menu
/// owns another.
///
/// ```
/// use chrono::{NaiveDate, TimeDelta};
/// use fingate_hardware::mock::MockClock;
/// use fingate_hardware::traits::ClockSource;
///
/// let start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(11, 59, 0).unwrap();
/// let clock = MockClock::new(start);
/// assert_eq!(clock.greeting(clock.now()), "Good Morning");
///
/// clock.advance(TimeDelta::minutes(1));
/// assert_eq!(clock.greeting(clock.now()), "Good Afternoon");
/// ```
#[derive(Debug, Clone)]
pub struct MockClock {
    state: Arc<Mutex<ClockState>>,
}

impl MockClock {
    /// Start at `now`; the reference time is the same instant.
    pub fn new(now: NaiveDateTime) -> Self {
        Self::with_reference(now, now)
    }

    pub fn with_reference(now: NaiveDateTime, reference: NaiveDateTime) -> Self {
        Self {
            state: Arc::new(Mutex::new(ClockState {
                now,
                reference,
                resets: 0,
            })),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        self.lock().now = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut state = self.lock();
        state.now += by;
    }

    /// How often the clock was reset to its reference.
    pub fn resets(&self) -> usize {
        self.lock().resets
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ClockSource for MockClock {
    fn now(&self) -> NaiveDateTime {
        self.lock().now
    }

    fn reset_to_reference(&mut self) -> NaiveDateTime {
        let mut state = self.lock();
        state.now = state.reference;
        state.resets += 1;
        state.now
    }
}
