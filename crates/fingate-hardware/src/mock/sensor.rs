//! In-memory fingerprint sensor.
//!
//! Fingers are modelled as plain numbers: two captures of the same number
//! match, different numbers produce an enrollment mismatch. The sensor keeps a
//! template store of [`SLOT_CAPACITY`] slots so allocation and probing behave
//! like the real module.
//!
//! Captures come from two places. Scripted captures queued on the handle are
//! consumed first, one per `capture_image` call. When the queue is empty the
//! live finger state decides (see [`MockSensorHandle::place_finger`]).

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use fingate_core::constants::SLOT_CAPACITY;
use fingate_core::{FeatureBuffer, SensorCode, SlotId};

use crate::traits::{BuildError, CaptureOutcome, FingerprintSensor, SensorResult};

/// One scripted result for the next `capture_image` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedCapture {
    Finger(u32),
    NoFinger,
    Error(SensorCode),
}

/// A call made on the mock, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorCall {
    Capture,
    Convert(FeatureBuffer),
    Build,
    Store(SlotId),
    Load(SlotId),
}

#[derive(Debug, Default)]
struct SensorState {
    finger: Option<u32>,
    image: Option<u32>,
    buffers: [Option<u32>; 2],
    model: Option<u32>,
    slots: BTreeMap<SlotId, u32>,
    convert_failure: [Option<SensorCode>; 2],
    build_failure: Option<SensorCode>,
    store_failure: Option<SensorCode>,
    calls: Vec<SensorCall>,
}

fn lock(state: &Mutex<SensorState>) -> MutexGuard<'_, SensorState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn buffer_index(buffer: FeatureBuffer) -> usize {
    buffer.as_u8() as usize - 1
}

/// Mock sensor for tests and the simulator.
///
/// # Examples
///
/// ```
/// use fingate_hardware::mock::MockSensor;
/// use fingate_hardware::traits::{CaptureOutcome, FingerprintSensor};
///
/// #[tokio::main]
/// async fn main() {
///     let (mut sensor, handle) = MockSensor::new();
///     assert_eq!(sensor.capture_image().await, CaptureOutcome::NoFinger);
///
///     handle.place_finger(7);
///     assert_eq!(sensor.capture_image().await, CaptureOutcome::Captured);
/// }
/// ```
#[derive(Debug)]
pub struct MockSensor {
    script_rx: mpsc::UnboundedReceiver<ScriptedCapture>,
    state: Arc<Mutex<SensorState>>,
}

impl MockSensor {
    /// Create an empty sensor and the handle that controls it.
    pub fn new() -> (Self, MockSensorHandle) {
        let (script_tx, script_rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(SensorState::default()));

        let sensor = Self {
            script_rx,
            state: Arc::clone(&state),
        };
        let handle = MockSensorHandle { script_tx, state };
        (sensor, handle)
    }

    fn next_capture(&mut self) -> Option<ScriptedCapture> {
        self.script_rx.try_recv().ok()
    }
}

impl FingerprintSensor for MockSensor {
    async fn capture_image(&mut self) -> CaptureOutcome {
        let scripted = self.next_capture();
        let mut state = lock(&self.state);
        state.calls.push(SensorCall::Capture);

        let finger = match scripted {
            Some(ScriptedCapture::Finger(id)) => Some(id),
            Some(ScriptedCapture::NoFinger) => None,
            Some(ScriptedCapture::Error(code)) => return CaptureOutcome::Failed(code),
            None => state.finger,
        };

        match finger {
            Some(id) => {
                state.image = Some(id);
                CaptureOutcome::Captured
            }
            None => CaptureOutcome::NoFinger,
        }
    }

    async fn convert_image(&mut self, buffer: FeatureBuffer) -> SensorResult {
        let mut state = lock(&self.state);
        state.calls.push(SensorCall::Convert(buffer));

        let index = buffer_index(buffer);
        if let Some(code) = state.convert_failure[index] {
            return Err(code);
        }
        let image = state.image.ok_or(SensorCode::INVALID_IMAGE)?;
        state.buffers[index] = Some(image);
        Ok(())
    }

    async fn build_model(&mut self) -> std::result::Result<(), BuildError> {
        let mut state = lock(&self.state);
        state.calls.push(SensorCall::Build);

        if let Some(code) = state.build_failure {
            return Err(BuildError::from(code));
        }
        let buffers = state.buffers;
        match buffers {
            [Some(a), Some(b)] if a == b => {
                state.model = Some(a);
                Ok(())
            }
            [Some(_), Some(_)] => Err(BuildError::Mismatch),
            _ => Err(BuildError::Failed(SensorCode::FEATURE_FAIL)),
        }
    }

    async fn store_model(&mut self, slot: SlotId) -> SensorResult {
        let mut state = lock(&self.state);
        state.calls.push(SensorCall::Store(slot));

        if let Some(code) = state.store_failure {
            return Err(code);
        }
        let model = state.model.ok_or(SensorCode::FEATURE_FAIL)?;
        state.slots.insert(slot, model);
        Ok(())
    }

    async fn load_model(&mut self, slot: SlotId) -> SensorResult {
        let mut state = lock(&self.state);
        state.calls.push(SensorCall::Load(slot));

        let template = *state.slots.get(&slot).ok_or(SensorCode::DB_READ_FAIL)?;
        state.buffers[0] = Some(template);
        Ok(())
    }
}

/// Handle for driving a [`MockSensor`] from tests or the simulator.
#[derive(Debug, Clone)]
pub struct MockSensorHandle {
    script_tx: mpsc::UnboundedSender<ScriptedCapture>,
    state: Arc<Mutex<SensorState>>,
}

impl MockSensorHandle {
    /// Put a finger on the sensor. Every unscripted capture sees it until lifted.
    pub fn place_finger(&self, finger: u32) {
        lock(&self.state).finger = Some(finger);
    }

    pub fn lift_finger(&self) {
        lock(&self.state).finger = None;
    }

    pub fn finger(&self) -> Option<u32> {
        lock(&self.state).finger
    }

    /// Queue results for upcoming captures.
    pub fn script_captures(&self, captures: impl IntoIterator<Item = ScriptedCapture>) {
        for capture in captures {
            // The receiver lives as long as the sensor; a dropped sensor ignores the script.
            let _ = self.script_tx.send(capture);
        }
    }

    /// Store a template for `finger` at `slot`.
    pub fn occupy(&self, slot: SlotId, finger: u32) {
        lock(&self.state).slots.insert(slot, finger);
    }

    /// Fill slots `1..=count` with distinct templates.
    pub fn occupy_first(&self, count: u16) {
        let mut state = lock(&self.state);
        for slot in SlotId::range(count.min(SLOT_CAPACITY)) {
            state.slots.insert(slot, 10_000 + slot.get() as u32);
        }
    }

    pub fn is_occupied(&self, slot: SlotId) -> bool {
        lock(&self.state).slots.contains_key(&slot)
    }

    pub fn template(&self, slot: SlotId) -> Option<u32> {
        lock(&self.state).slots.get(&slot).copied()
    }

    pub fn occupied_count(&self) -> usize {
        lock(&self.state).slots.len()
    }

    /// Make every conversion into `buffer` fail with `code`.
    pub fn fail_convert(&self, buffer: FeatureBuffer, code: SensorCode) {
        lock(&self.state).convert_failure[buffer_index(buffer)] = Some(code);
    }

    pub fn fail_build(&self, code: SensorCode) {
        lock(&self.state).build_failure = Some(code);
    }

    pub fn fail_store(&self, code: SensorCode) {
        lock(&self.state).store_failure = Some(code);
    }

    pub fn clear_failures(&self) {
        let mut state = lock(&self.state);
        state.convert_failure = [None; 2];
        state.build_failure = None;
        state.store_failure = None;
    }

    /// Every call made so far, oldest first.
    pub fn calls(&self) -> Vec<SensorCall> {
        lock(&self.state).calls.clone()
    }

    /// Number of recorded calls matching `pred`.
    pub fn count_calls(&self, pred: impl Fn(&SensorCall) -> bool) -> usize {
        lock(&self.state).calls.iter().filter(|c| pred(c)).count()
    }

    pub fn clear_calls(&self) {
        lock(&self.state).calls.clear();
    }
}
