//! Debounced button latches shared between interrupt context and the control loop.
//!
//! Each button owns an [`EdgeLatch`]: a single-slot mailbox written by the
//! falling-edge handler and drained by the menu's poll step. It is not a
//! queue. A second accepted edge that lands before the first one was drained
//! overwrites it, so the consumer sees at most one event per source per poll.
//!
//! Only atomics are used, so [`on_falling_edge`](EdgeLatch::on_falling_edge)
//! is safe to call from an interrupt handler or another thread.
//!
//! ```
//! use fingate_core::ButtonSource;
//! use fingate_hardware::input::ButtonLatches;
//!
//! static LATCHES: ButtonLatches = ButtonLatches::new(200);
//!
//! assert!(LATCHES.on_falling_edge(ButtonSource::Right, 1_000));
//! assert!(!LATCHES.on_falling_edge(ButtonSource::Right, 1_150)); // bounce
//!
//! let event = LATCHES.take(ButtonSource::Right).unwrap();
//! assert_eq!(event.timestamp_ms, 1_000);
//! assert!(LATCHES.take(ButtonSource::Right).is_none());
//! ```

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use fingate_core::{ButtonEvent, ButtonSource};

/// Debounced pending flag for one button.
#[derive(Debug)]
pub struct EdgeLatch {
    source: ButtonSource,
    window_ms: u32,
    pending: AtomicBool,
    armed: AtomicBool,
    last_accepted_ms: AtomicU32,
}

impl EdgeLatch {
    pub const fn new(source: ButtonSource, window_ms: u32) -> Self {
        Self {
            source,
            window_ms,
            pending: AtomicBool::new(false),
            armed: AtomicBool::new(false),
            last_accepted_ms: AtomicU32::new(0),
        }
    }

    pub fn source(&self) -> ButtonSource {
        self.source
    }

    /// Record a falling edge seen at `now_ms`. Returns whether it was accepted.
    ///
    /// The first edge is always accepted. Later edges need strictly more than
    /// the debounce window since the last accepted one.
    pub fn on_falling_edge(&self, now_ms: u32) -> bool {
        if self.armed.load(Ordering::Acquire) {
            let last = self.last_accepted_ms.load(Ordering::Relaxed);
            if now_ms.wrapping_sub(last) <= self.window_ms {
                return false;
            }
        }

        self.last_accepted_ms.store(now_ms, Ordering::Relaxed);
        self.armed.store(true, Ordering::Release);
        self.pending.store(true, Ordering::Release);
        true
    }

    /// Drain the pending flag.
    pub fn take(&self) -> Option<ButtonEvent> {
        if self.pending.swap(false, Ordering::AcqRel) {
            let at = self.last_accepted_ms.load(Ordering::Relaxed);
            Some(ButtonEvent::new(self.source, at))
        } else {
            None
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

/// The three navigation buttons.
#[derive(Debug)]
pub struct ButtonLatches {
    latches: [EdgeLatch; 3],
}

impl ButtonLatches {
    pub const fn new(window_ms: u32) -> Self {
        Self {
            latches: [
                EdgeLatch::new(ButtonSource::Left, window_ms),
                EdgeLatch::new(ButtonSource::Select, window_ms),
                EdgeLatch::new(ButtonSource::Right, window_ms),
            ],
        }
    }

    pub fn latch(&self, source: ButtonSource) -> &EdgeLatch {
        &self.latches[source.index()]
    }

    pub fn on_falling_edge(&self, source: ButtonSource, now_ms: u32) -> bool {
        self.latch(source).on_falling_edge(now_ms)
    }

    pub fn take(&self, source: ButtonSource) -> Option<ButtonEvent> {
        self.latch(source).take()
    }

    /// Drain every source in poll order (left, select, right).
    pub fn drain(&self) -> impl Iterator<Item = ButtonEvent> + '_ {
        ButtonSource::ALL.into_iter().filter_map(|s| self.take(s))
    }
}

impl Default for ButtonLatches {
    fn default() -> Self {
        Self::new(fingate_core::constants::DEBOUNCE_WINDOW_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::Arc;

    #[test]
    fn test_first_edge_accepted_at_boot() {
        let latch = EdgeLatch::new(ButtonSource::Select, 200);
        assert!(latch.on_falling_edge(0));
        assert_eq!(latch.take(), Some(ButtonEvent::new(ButtonSource::Select, 0)));
    }

    #[rstest]
    #[case(1, false)]
    #[case(199, false)]
    #[case(200, false)]
    #[case(201, true)]
    #[case(5_000, true)]
    fn test_window_boundary(#[case] gap: u32, #[case] accepted: bool) {
        let latch = EdgeLatch::new(ButtonSource::Left, 200);
        assert!(latch.on_falling_edge(1_000));
        assert_eq!(latch.on_falling_edge(1_000 + gap), accepted);
    }

    #[test]
    fn test_burst_yields_single_event() {
        let latch = EdgeLatch::new(ButtonSource::Right, 200);
        let accepted = (0..50u32)
            .filter(|i| latch.on_falling_edge(10_000 + i * 3))
            .count();

        assert_eq!(accepted, 1);
        assert!(latch.take().is_some());
        assert!(latch.take().is_none());
    }

    #[test]
    fn test_rejected_edge_does_not_extend_window() {
        let latch = EdgeLatch::new(ButtonSource::Right, 200);
        assert!(latch.on_falling_edge(0));
        assert!(!latch.on_falling_edge(150));
        // measured from the accepted edge, not the bounce
        assert!(latch.on_falling_edge(201));
    }

    #[test]
    fn test_undrained_edge_is_overwritten() {
        let latch = EdgeLatch::new(ButtonSource::Left, 200);
        assert!(latch.on_falling_edge(100));
        assert!(latch.on_falling_edge(400));

        assert_eq!(latch.take().map(|e| e.timestamp_ms), Some(400));
        assert!(latch.take().is_none());
    }

    #[test]
    fn test_counter_wraparound() {
        let latch = EdgeLatch::new(ButtonSource::Select, 200);
        assert!(latch.on_falling_edge(u32::MAX - 50));
        assert!(!latch.on_falling_edge(100));
        assert!(latch.on_falling_edge(200));
    }

    #[test]
    fn test_drain_order() {
        let latches = ButtonLatches::new(200);
        latches.on_falling_edge(ButtonSource::Right, 10);
        latches.on_falling_edge(ButtonSource::Left, 20);
        latches.on_falling_edge(ButtonSource::Select, 30);

        let order: Vec<ButtonSource> = latches.drain().map(|e| e.source).collect();
        assert_eq!(
            order,
            vec![ButtonSource::Left, ButtonSource::Select, ButtonSource::Right]
        );
        assert_eq!(latches.drain().count(), 0);
    }

    #[test]
    fn test_sources_are_independent() {
        let latches = ButtonLatches::new(200);
        assert!(latches.on_falling_edge(ButtonSource::Left, 0));
        assert!(latches.on_falling_edge(ButtonSource::Right, 10));
        assert!(latches.latch(ButtonSource::Left).is_pending());
        assert!(!latches.latch(ButtonSource::Select).is_pending());
    }

    #[test]
    fn test_producer_on_another_thread() {
        let latches = Arc::new(ButtonLatches::new(200));
        let producer = Arc::clone(&latches);

        std::thread::spawn(move || {
            for i in 0..10u32 {
                producer.on_falling_edge(ButtonSource::Select, i * 10);
            }
        })
        .join()
        .unwrap();

        let event = latches.take(ButtonSource::Select).unwrap();
        assert_eq!(event.timestamp_ms, 0);
        assert!(latches.take(ButtonSource::Select).is_none());
    }
}
