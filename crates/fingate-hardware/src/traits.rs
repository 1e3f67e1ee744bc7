//! Collaborator trait definitions.
//!
//! These traits are the seam between the control core (menu, enrollment,
//! identification) and the peripherals it drives. Each has a mock in
//! [`mock`](crate::mock) and the sensor additionally has a wire driver in
//! [`serial`](crate::serial).
//!
//! The sensor trait uses native `async fn` methods (Edition 2024 RPITIT), so
//! it is not object-safe. Use generics, or the enum wrapper in
//! [`devices`](crate::devices) when the concrete sensor is chosen at runtime.

#![allow(async_fn_in_trait)]

use chrono::{NaiveDateTime, Timelike};

use fingate_core::constants::LCD_COLUMNS;
use fingate_core::{FeatureBuffer, SensorCode, SlotId};

use crate::error::Result;

/// Result of a sensor operation that only reports success or a code.
pub type SensorResult<T = ()> = std::result::Result<T, SensorCode>;

/// Outcome of a single image capture attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// A finger image is now in the image buffer.
    Captured,
    /// Nothing on the sensor. Not an error: callers keep polling.
    NoFinger,
    /// Any other confirmation code.
    Failed(SensorCode),
}

impl From<SensorCode> for CaptureOutcome {
    fn from(code: SensorCode) -> Self {
        match code {
            SensorCode::OK => Self::Captured,
            SensorCode::NO_FINGER => Self::NoFinger,
            other => Self::Failed(other),
        }
    }
}

/// Why building a template from the two feature buffers failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    /// The two captures were judged to come from different fingers.
    Mismatch,
    Failed(SensorCode),
}

impl BuildError {
    /// The confirmation code the sensor reported.
    pub fn code(&self) -> SensorCode {
        match self {
            Self::Mismatch => SensorCode::ENROLL_MISMATCH,
            Self::Failed(code) => *code,
        }
    }
}

impl From<SensorCode> for BuildError {
    fn from(code: SensorCode) -> Self {
        if code == SensorCode::ENROLL_MISMATCH {
            Self::Mismatch
        } else {
            Self::Failed(code)
        }
    }
}

/// Capacitive fingerprint sensor with an on-board template store.
///
/// # Examples
///
/// ```no_run
/// use fingate_core::FeatureBuffer;
/// use fingate_hardware::traits::{CaptureOutcome, FingerprintSensor};
///
/// async fn wait_and_convert<S: FingerprintSensor>(sensor: &mut S) -> bool {
///     while sensor.capture_image().await != CaptureOutcome::Captured {
///         tokio::time::sleep(std::time::Duration::from_millis(50)).await;
///     }
///     sensor.convert_image(FeatureBuffer::One).await.is_ok()
/// }
/// ```
pub trait FingerprintSensor: Send {
    /// Try to capture a finger image. Never blocks waiting for a finger.
    async fn capture_image(&mut self) -> CaptureOutcome;

    /// Extract features from the captured image into `buffer`.
    async fn convert_image(&mut self, buffer: FeatureBuffer) -> SensorResult;

    /// Combine both feature buffers into a template.
    async fn build_model(&mut self) -> std::result::Result<(), BuildError>;

    /// Persist the built template at `slot`.
    async fn store_model(&mut self, slot: SlotId) -> SensorResult;

    /// Load the template at `slot` into a feature buffer.
    ///
    /// Fails when the slot is empty, which makes this usable as an
    /// existence probe.
    async fn load_model(&mut self, slot: SlotId) -> SensorResult;
}

/// Two-line character display.
pub trait TextDisplay {
    /// Clear and write both lines.
    fn show(&mut self, line1: &str, line2: &str);

    /// Overwrite a single line, leaving the other untouched.
    fn show_line(&mut self, line: usize, text: &str);

    /// Place one character at a cell.
    fn put_char(&mut self, column: usize, line: usize, ch: char);

    /// `Error:` on the first line, the message and raw code on the second.
    fn show_error(&mut self, message: &str, code: SensorCode) {
        self.show("Error:", &format!("{} {:02X}", message, code.0));
    }

    /// Enrollment guidance screen.
    fn show_step(&mut self, step: u8, message: &str) {
        self.show(&format!("Step {}/5", step), message);
    }

    /// Last column index, handy for progress ticks.
    fn last_column(&self) -> usize {
        LCD_COLUMNS - 1
    }
}

/// Real-time clock.
pub trait ClockSource {
    fn now(&self) -> NaiveDateTime;

    /// Set the clock to its reference time and return it.
    fn reset_to_reference(&mut self) -> NaiveDateTime;

    /// Coarse day-part label for the status screen.
    fn greeting(&self, now: NaiveDateTime) -> &'static str {
        match now.hour() {
            5..=11 => "Good Morning",
            12..=16 => "Good Afternoon",
            17..=20 => "Good Evening",
            _ => "Good Night",
        }
    }

    /// `HH:MM:SS DD/MM`
    fn format_time(&self, now: NaiveDateTime) -> String {
        now.format("%H:%M:%S %d/%m").to_string()
    }
}

/// WiFi station control.
pub trait WifiControl {
    fn is_connected(&self) -> bool;

    fn current_ip(&self) -> String;

    /// Forget stored credentials. On the device this also restarts it.
    async fn reset(&mut self) -> Result<()>;

    async fn disconnect(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    struct FixedClock(NaiveDateTime);

    impl ClockSource for FixedClock {
        fn now(&self) -> NaiveDateTime {
            self.0
        }

        fn reset_to_reference(&mut self) -> NaiveDateTime {
            self.0
        }
    }

    fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 7)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    #[rstest]
    #[case(0, "Good Night")]
    #[case(4, "Good Night")]
    #[case(5, "Good Morning")]
    #[case(11, "Good Morning")]
    #[case(12, "Good Afternoon")]
    #[case(16, "Good Afternoon")]
    #[case(17, "Good Evening")]
    #[case(20, "Good Evening")]
    #[case(21, "Good Night")]
    fn test_greeting_boundaries(#[case] hour: u32, #[case] expected: &str) {
        let clock = FixedClock(at(hour, 0, 0));
        assert_eq!(clock.greeting(clock.now()), expected);
    }

    #[test]
    fn test_format_time() {
        let clock = FixedClock(at(9, 5, 3));
        assert_eq!(clock.format_time(clock.now()), "09:05:03 07/03");
    }

    #[rstest]
    #[case(SensorCode::OK, CaptureOutcome::Captured)]
    #[case(SensorCode::NO_FINGER, CaptureOutcome::NoFinger)]
    #[case(SensorCode::IMAGE_FAIL, CaptureOutcome::Failed(SensorCode::IMAGE_FAIL))]
    #[case(SensorCode::TIMEOUT, CaptureOutcome::Failed(SensorCode::TIMEOUT))]
    fn test_capture_outcome_from_code(#[case] code: SensorCode, #[case] expected: CaptureOutcome) {
        assert_eq!(CaptureOutcome::from(code), expected);
    }

    #[test]
    fn test_build_error_mismatch_is_distinct() {
        assert_eq!(BuildError::from(SensorCode::ENROLL_MISMATCH), BuildError::Mismatch);
        assert_eq!(
            BuildError::from(SensorCode::PACKET_RECEIVE_ERROR),
            BuildError::Failed(SensorCode::PACKET_RECEIVE_ERROR)
        );
        assert_eq!(BuildError::Mismatch.code(), SensorCode::ENROLL_MISMATCH);
    }

    #[derive(Default)]
    struct Recorder(Vec<(String, String)>);

    impl TextDisplay for Recorder {
        fn show(&mut self, line1: &str, line2: &str) {
            self.0.push((line1.to_string(), line2.to_string()));
        }

        fn show_line(&mut self, _line: usize, _text: &str) {}

        fn put_char(&mut self, _column: usize, _line: usize, _ch: char) {}
    }

    #[test]
    fn test_display_helpers() {
        let mut display = Recorder::default();
        display.show_error("err:", SensorCode::IMAGE_FAIL);
        display.show_step(3, "Same finger");

        assert_eq!(display.0[0], ("Error:".into(), "err: 03".into()));
        assert_eq!(display.0[1], ("Step 3/5".into(), "Same finger".into()));
        assert_eq!(display.last_column(), 15);
    }
}
