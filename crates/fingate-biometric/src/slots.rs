//! Template slot allocation.
//!
//! The sensor is the only record of which slots hold a template. The
//! allocator asks it slot by slot, lowest ID first, so the lowest free ID
//! always wins.

#![allow(async_fn_in_trait)]

use std::time::Duration;

use tracing::{debug, info, warn};

use fingate_core::constants::{SLOT_CAPACITY, SLOT_COUNT_DELAY_MS, SLOT_PROBE_DELAY_MS, SLOT_PROGRESS_STEP};
use fingate_core::{ControllerConfig, SlotId};
use fingate_hardware::FingerprintSensor;

/// Anything that can tell whether a slot holds a template.
pub trait SlotProbe {
    async fn is_occupied(&mut self, slot: SlotId) -> bool;
}

impl<S: FingerprintSensor> SlotProbe for S {
    async fn is_occupied(&mut self, slot: SlotId) -> bool {
        self.load_model(slot).await.is_ok()
    }
}

/// Linear, ID-ordered slot scanner.
#[derive(Debug, Clone)]
pub struct SlotAllocator {
    capacity: u16,
    probe_delay: Duration,
    count_delay: Duration,
}

impl SlotAllocator {
    /// Scan `1..=capacity`. Capacities above the sensor's are clamped.
    pub fn new(capacity: u16) -> Self {
        Self {
            capacity: capacity.clamp(1, SLOT_CAPACITY),
            probe_delay: Duration::from_millis(SLOT_PROBE_DELAY_MS),
            count_delay: Duration::from_millis(SLOT_COUNT_DELAY_MS),
        }
    }

    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(config.slot_capacity)
            .with_probe_delay(config.probe_delay())
            .with_count_delay(config.count_delay())
    }

    /// Set the pause between probes while searching
    pub fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = delay;
        self
    }

    /// Set the pause between probes while counting
    pub fn with_count_delay(mut self, delay: Duration) -> Self {
        self.count_delay = delay;
        self
    }

    pub fn capacity(&self) -> u16 {
        self.capacity
    }

    /// Lowest unoccupied slot, or `None` when every slot is taken.
    pub async fn find_free_slot<P: SlotProbe>(&self, probe: &mut P) -> Option<SlotId> {
        self.find_free_slot_with_progress(probe, |_| {}).await
    }

    /// Like [`find_free_slot`](Self::find_free_slot), calling `on_progress`
    /// before every 50th probe.
    pub async fn find_free_slot_with_progress<P, F>(
        &self,
        probe: &mut P,
        mut on_progress: F,
    ) -> Option<SlotId>
    where
        P: SlotProbe,
        F: FnMut(SlotId),
    {
        debug!(capacity = self.capacity, "scanning for a free slot");

        for slot in SlotId::range(self.capacity) {
            if slot.get() % SLOT_PROGRESS_STEP == 0 {
                debug!(%slot, "slot scan progress");
                on_progress(slot);
            }

            if !probe.is_occupied(slot).await {
                info!(%slot, "found free slot");
                return Some(slot);
            }

            pause(self.probe_delay).await;
        }

        warn!(capacity = self.capacity, "no free slot");
        None
    }

    /// Number of occupied slots.
    pub async fn count_occupied<P: SlotProbe>(&self, probe: &mut P) -> u16 {
        let mut count = 0;
        for slot in SlotId::range(self.capacity) {
            if probe.is_occupied(slot).await {
                count += 1;
            }
            pause(self.count_delay).await;
        }
        debug!(count, "counted occupied slots");
        count
    }
}

impl Default for SlotAllocator {
    fn default() -> Self {
        Self::new(SLOT_CAPACITY)
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::BTreeSet;

    /// In-memory slot table.
    #[derive(Default)]
    struct FakeStore {
        occupied: BTreeSet<u16>,
        probes: Vec<u16>,
    }

    impl FakeStore {
        fn with(ids: impl IntoIterator<Item = u16>) -> Self {
            Self {
                occupied: ids.into_iter().collect(),
                probes: Vec::new(),
            }
        }
    }

    impl SlotProbe for FakeStore {
        async fn is_occupied(&mut self, slot: SlotId) -> bool {
            self.probes.push(slot.get());
            self.occupied.contains(&slot.get())
        }
    }

    fn allocator() -> SlotAllocator {
        SlotAllocator::default()
            .with_probe_delay(Duration::ZERO)
            .with_count_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_first_three_occupied_returns_four() {
        let mut store = FakeStore::with([1, 2, 3]);
        let slot = allocator().find_free_slot(&mut store).await;

        assert_eq!(slot.map(|s| s.get()), Some(4));
        assert_eq!(store.probes, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_all_occupied_returns_none() {
        let mut store = FakeStore::with(1..=300);
        assert_eq!(allocator().find_free_slot(&mut store).await, None);
        assert_eq!(store.probes.len(), 300);
    }

    #[rstest]
    #[case(vec![], Some(1))]
    #[case(vec![2, 3], Some(1))]
    #[case(vec![1, 3], Some(2))]
    #[case((1..=299).collect(), Some(300))]
    #[tokio::test]
    async fn test_lowest_free_id_wins(#[case] occupied: Vec<u16>, #[case] expected: Option<u16>) {
        let mut store = FakeStore::with(occupied);
        let slot = allocator().find_free_slot(&mut store).await;
        assert_eq!(slot.map(|s| s.get()), expected);
    }

    #[tokio::test]
    async fn test_reduced_capacity() {
        let mut store = FakeStore::with(1..=10);
        let allocator = SlotAllocator::new(10).with_probe_delay(Duration::ZERO);
        assert_eq!(allocator.find_free_slot(&mut store).await, None);
    }

    #[tokio::test]
    async fn test_progress_every_fifty() {
        let mut store = FakeStore::with(1..=120);
        let mut seen = Vec::new();

        let slot = allocator()
            .find_free_slot_with_progress(&mut store, |s| seen.push(s.get()))
            .await;

        assert_eq!(slot.map(|s| s.get()), Some(121));
        assert_eq!(seen, vec![50, 100]);
    }

    #[tokio::test]
    async fn test_count_occupied_scans_everything() {
        let mut store = FakeStore::with([1, 7, 150, 300]);
        assert_eq!(allocator().count_occupied(&mut store).await, 4);
        assert_eq!(store.probes.len(), 300);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_delay_between_occupied_slots() {
        let mut store = FakeStore::with([1, 2]);
        let start = tokio::time::Instant::now();

        SlotAllocator::default().find_free_slot(&mut store).await;

        assert_eq!(start.elapsed(), Duration::from_millis(20));
    }

    #[test]
    fn test_capacity_clamped() {
        assert_eq!(SlotAllocator::new(1_000).capacity(), 300);
        assert_eq!(SlotAllocator::new(0).capacity(), 1);
    }
}
