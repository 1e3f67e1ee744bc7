//! Fingerprint enrollment.
//!
//! Enrollment is a strict linear sequence. Any failing stage aborts the whole
//! session: the operator sees the error for a fixed dwell time and must start
//! over from the menu.
//!
//! ```text
//! allocate slot -> capture 1 -> convert 1 -> await removal
//!               -> capture 2 -> convert 2 -> build -> store
//! ```
//!
//! The workflow blocks its caller until it finishes. Waiting for a finger has
//! no timeout, and there is no way to cancel from the buttons.

use std::fmt;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use fingate_core::constants::{
    CONFIRM_DWELL_MS, ERROR_DWELL_MS, FINGER_POLL_INTERVAL_MS, MISMATCH_DWELL_MS, RESULT_DWELL_MS,
    STEP_PAUSE_MS,
};
use fingate_core::{ControllerConfig, FeatureBuffer, SensorCode, SlotId};
use fingate_hardware::{BuildError, CaptureOutcome, FingerprintSensor, TextDisplay};

use crate::slots::SlotAllocator;

/// Settle time after the stale-image flush.
const FLUSH_SETTLE: Duration = Duration::from_millis(100);

/// Stage an enrollment session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnrollmentStage {
    Capture1,
    Convert1,
    AwaitRemove,
    Capture2,
    Convert2,
    Build,
    Store,
}

impl fmt::Display for EnrollmentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Capture1 => "CAPTURE_1",
            Self::Convert1 => "CONVERT_1",
            Self::AwaitRemove => "AWAIT_REMOVE",
            Self::Capture2 => "CAPTURE_2",
            Self::Convert2 => "CONVERT_2",
            Self::Build => "BUILD",
            Self::Store => "STORE",
        };
        f.write_str(name)
    }
}

/// State of one enrollment attempt. Lives only as long as the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentSession {
    slot: SlotId,
    stage: EnrollmentStage,
    last_error: Option<SensorCode>,
}

impl EnrollmentSession {
    pub fn new(slot: SlotId) -> Self {
        Self {
            slot,
            stage: EnrollmentStage::Capture1,
            last_error: None,
        }
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn stage(&self) -> EnrollmentStage {
        self.stage
    }

    pub fn last_error(&self) -> Option<SensorCode> {
        self.last_error
    }

    fn advance(&mut self, stage: EnrollmentStage) {
        debug!(slot = %self.slot, from = %self.stage, to = %stage, "enrollment stage");
        self.stage = stage;
    }

    fn record_error(&mut self, code: SensorCode) {
        self.last_error = Some(code);
    }
}

/// Why an enrollment session was aborted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnrollmentError {
    #[error("no free template slot")]
    NoFreeSlot,

    #[error("converting capture into buffer {buffer} failed: {code}")]
    Convert {
        buffer: FeatureBuffer,
        code: SensorCode,
    },

    #[error("the two captures do not match")]
    Mismatch,

    #[error("building the template failed: {0}")]
    Build(SensorCode),

    #[error("storing the template at slot {slot} failed: {code}")]
    Store { slot: SlotId, code: SensorCode },
}

impl EnrollmentError {
    /// Sensor code behind the failure, if any.
    pub fn code(&self) -> Option<SensorCode> {
        match self {
            Self::NoFreeSlot => None,
            Self::Convert { code, .. } | Self::Store { code, .. } | Self::Build(code) => Some(*code),
            Self::Mismatch => Some(SensorCode::ENROLL_MISMATCH),
        }
    }
}

/// Runs enrollment sessions against a sensor and a display.
#[derive(Debug, Clone)]
pub struct EnrollmentWorkflow {
    allocator: SlotAllocator,
    show_enrolled_total: bool,
    poll_interval: Duration,
}

impl EnrollmentWorkflow {
    pub fn new(allocator: SlotAllocator) -> Self {
        Self {
            allocator,
            show_enrolled_total: true,
            poll_interval: Duration::from_millis(FINGER_POLL_INTERVAL_MS),
        }
    }

    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(SlotAllocator::from_config(config)).show_enrolled_total(config.show_enrolled_total)
    }

    /// Set whether the occupied-slot count is shown after allocation
    pub fn show_enrolled_total(mut self, show: bool) -> Self {
        self.show_enrolled_total = show;
        self
    }

    /// Set the interval between sensor polls while waiting for a finger
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn allocator(&self) -> &SlotAllocator {
        &self.allocator
    }

    /// Enroll one finger and return the slot it was stored in.
    ///
    /// Every failure has already been shown and logged when this returns.
    pub async fn run<S, D>(&self, sensor: &mut S, display: &mut D) -> Result<SlotId, EnrollmentError>
    where
        S: FingerprintSensor,
        D: TextDisplay,
    {
        info!("starting enrollment");
        display.show("Enrolling", "Starting...");
        sleep(ms(STEP_PAUSE_MS)).await;

        let slot = self.allocate(sensor, display).await?;
        let mut session = EnrollmentSession::new(slot);

        // Drop whatever image is still in the sensor from earlier use.
        let _ = sensor.capture_image().await;
        sleep(FLUSH_SETTLE).await;

        display.show_step(1, "Place finger");
        display.show_line(1, "Medium pressure");
        self.wait_for_capture(sensor).await;
        display.show("Captured!", "Converting...");

        session.advance(EnrollmentStage::Convert1);
        if let Err(code) = sensor.convert_image(FeatureBuffer::One).await {
            return Err(self
                .abort_convert(&mut session, display, FeatureBuffer::One, code)
                .await);
        }
        info!("first image converted");
        display.show("Convert OK!", "Lift finger...");
        sleep(ms(STEP_PAUSE_MS)).await;

        session.advance(EnrollmentStage::AwaitRemove);
        display.show_step(2, "Lift finger");
        self.wait_for_removal(sensor).await;
        display.show("Finger lifted", "Ready for step 3");
        sleep(ms(STEP_PAUSE_MS)).await;

        session.advance(EnrollmentStage::Capture2);
        display.show_step(3, "Same finger again");
        display.show_line(1, "Same position");
        self.wait_for_capture(sensor).await;
        display.show("Captured!", "Converting...");

        session.advance(EnrollmentStage::Convert2);
        if let Err(code) = sensor.convert_image(FeatureBuffer::Two).await {
            return Err(self
                .abort_convert(&mut session, display, FeatureBuffer::Two, code)
                .await);
        }
        info!("second image converted");
        display.show("Convert OK!", "Creating model...");
        sleep(ms(STEP_PAUSE_MS)).await;

        session.advance(EnrollmentStage::Build);
        display.show_step(4, "Creating model...");
        match sensor.build_model().await {
            Ok(()) => {}
            Err(BuildError::Mismatch) => {
                session.record_error(SensorCode::ENROLL_MISMATCH);
                warn!(%slot, "enrollment captures do not match");
                display.show("Mismatch!", "Try again");
                sleep(ms(MISMATCH_DWELL_MS)).await;
                return Err(EnrollmentError::Mismatch);
            }
            Err(BuildError::Failed(code)) => {
                session.record_error(code);
                error!(%slot, %code, "template build failed");
                display.show_error("Model:", code);
                sleep(ms(ERROR_DWELL_MS)).await;
                return Err(EnrollmentError::Build(code));
            }
        }
        display.show("Model OK!", "Storing...");
        sleep(ms(STEP_PAUSE_MS)).await;

        session.advance(EnrollmentStage::Store);
        display.show_step(5, "Storing template");
        if let Err(code) = sensor.store_model(slot).await {
            session.record_error(code);
            error!(%slot, %code, "template store failed");
            display.show_error("Store:", code);
            sleep(ms(ERROR_DWELL_MS)).await;
            return Err(EnrollmentError::Store { slot, code });
        }

        info!(%slot, "enrolled");
        display.show("SUCCESS!", &format!("ID #{}", slot));
        sleep(ms(RESULT_DWELL_MS)).await;
        Ok(slot)
    }

    async fn allocate<S, D>(&self, sensor: &mut S, display: &mut D) -> Result<SlotId, EnrollmentError>
    where
        S: FingerprintSensor,
        D: TextDisplay,
    {
        display.show("Scanning IDs...", "Please wait...");
        let capacity = self.allocator.capacity();

        let found = self
            .allocator
            .find_free_slot_with_progress(sensor, |slot| {
                display.show("Scanning IDs...", &format!("ID: {}/{}", slot, capacity));
            })
            .await;

        let Some(slot) = found else {
            error!(capacity, "no free template slot");
            display.show("ERROR!", "No free slots");
            sleep(ms(ERROR_DWELL_MS)).await;
            return Err(EnrollmentError::NoFreeSlot);
        };

        if self.show_enrolled_total {
            let total = self.allocator.count_occupied(sensor).await;
            display.show(
                &format!("ID: {}", slot),
                &format!("Total: {}/{}", total, capacity),
            );
        } else {
            display.show(&format!("ID: {}", slot), "");
        }
        info!(%slot, "using slot for enrollment");
        sleep(ms(CONFIRM_DWELL_MS)).await;

        Ok(slot)
    }

    async fn abort_convert<D: TextDisplay>(
        &self,
        session: &mut EnrollmentSession,
        display: &mut D,
        buffer: FeatureBuffer,
        code: SensorCode,
    ) -> EnrollmentError {
        session.record_error(code);
        error!(slot = %session.slot(), %buffer, %code, "image conversion failed");
        display.show_error(&format!("Convert {}:", buffer), code);
        sleep(ms(ERROR_DWELL_MS)).await;
        EnrollmentError::Convert { buffer, code }
    }

    /// Poll until an image is captured. Errors other than "no finger" keep waiting.
    async fn wait_for_capture<S: FingerprintSensor>(&self, sensor: &mut S) {
        loop {
            match sensor.capture_image().await {
                CaptureOutcome::Captured => return,
                CaptureOutcome::NoFinger => {}
                CaptureOutcome::Failed(code) => debug!(%code, "capture attempt failed"),
            }
            sleep(self.poll_interval).await;
        }
    }

    /// Poll until the sensor reports no finger.
    async fn wait_for_removal<S: FingerprintSensor>(&self, sensor: &mut S) {
        while sensor.capture_image().await != CaptureOutcome::NoFinger {
            sleep(self.poll_interval).await;
        }
    }
}

impl Default for EnrollmentWorkflow {
    fn default() -> Self {
        Self::new(SlotAllocator::default())
    }
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}
