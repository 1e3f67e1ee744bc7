//! Finger detection sanity test.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info};

use fingate_core::ControllerConfig;
use fingate_core::constants::{IDENTIFICATION_POLLS, RESULT_DWELL_MS};
use fingate_hardware::{CaptureOutcome, FingerprintSensor, TextDisplay};

const CAPTURE_ACK: Duration = Duration::from_millis(500);
const POLL_PAUSE: Duration = Duration::from_millis(100);

/// Tally of one test run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentificationReport {
    pub polls: usize,
    pub captures: usize,
    pub no_finger: usize,
    pub errors: usize,
}

/// Polls the sensor a fixed number of times and counts captured images.
#[derive(Debug, Clone)]
pub struct IdentificationTest {
    polls: usize,
}

impl IdentificationTest {
    pub fn new(polls: usize) -> Self {
        Self { polls }
    }

    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(config.identification_polls)
    }

    pub fn polls(&self) -> usize {
        self.polls
    }

    /// Run every poll, regardless of outcome, then show the count.
    pub async fn run<S, D>(&self, sensor: &mut S, display: &mut D) -> IdentificationReport
    where
        S: FingerprintSensor,
        D: TextDisplay,
    {
        info!(polls = self.polls, "finger detection test started");
        display.show("Sanity test", "...");

        let mut report = IdentificationReport::default();
        for _ in 0..self.polls {
            report.polls += 1;
            match sensor.capture_image().await {
                CaptureOutcome::Captured => {
                    report.captures += 1;
                    debug!(count = report.captures, "finger detected");
                    display.show("OK!", &format!("Count: {}", report.captures));
                    sleep(CAPTURE_ACK).await;
                }
                CaptureOutcome::NoFinger => {
                    report.no_finger += 1;
                    let column = display.last_column();
                    display.put_char(column, 1, '.');
                    sleep(POLL_PAUSE).await;
                }
                CaptureOutcome::Failed(code) => {
                    report.errors += 1;
                    debug!(%code, "capture error");
                    display.show_error("err:", code);
                    sleep(POLL_PAUSE).await;
                }
            }
        }

        info!(
            captures = report.captures,
            no_finger = report.no_finger,
            errors = report.errors,
            "finger detection test complete"
        );
        display.show("complete!", &format!("count: {}", report.captures));
        sleep(Duration::from_millis(RESULT_DWELL_MS)).await;
        report
    }
}

impl Default for IdentificationTest {
    fn default() -> Self {
        Self::new(IDENTIFICATION_POLLS)
    }
}
