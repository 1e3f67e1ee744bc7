//! Enum wrapper for sensor dispatch.
//!
//! `FingerprintSensor` uses native `async fn`, so `Box<dyn FingerprintSensor>`
//! is not available. [`AnySensor`] gives runtime selection between the mock
//! and the wire driver with static dispatch inside each arm.
//!
//! ```
//! use fingate_hardware::devices::AnySensor;
//! use fingate_hardware::mock::MockSensor;
//!
//! let (sensor, _handle) = MockSensor::new();
//! let sensor = AnySensor::Mock(sensor);
//! assert_eq!(sensor.kind(), "mock");
//! ```

use fingate_core::{FeatureBuffer, SlotId};

use crate::mock::MockSensor;
#[cfg(feature = "serial")]
use crate::serial::{BoxedLink, SerialSensor};
use crate::traits::{BuildError, CaptureOutcome, FingerprintSensor, SensorResult};

#[derive(Debug)]
#[non_exhaustive]
pub enum AnySensor {
    /// In-memory sensor for development and testing.
    Mock(MockSensor),
    /// R30x module on a byte stream.
    #[cfg(feature = "serial")]
    Serial(SerialSensor<BoxedLink>),
}

impl AnySensor {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Mock(_) => "mock",
            #[cfg(feature = "serial")]
            Self::Serial(_) => "serial",
        }
    }
}

impl FingerprintSensor for AnySensor {
    async fn capture_image(&mut self) -> CaptureOutcome {
        match self {
            Self::Mock(sensor) => sensor.capture_image().await,
            #[cfg(feature = "serial")]
            Self::Serial(sensor) => sensor.capture_image().await,
        }
    }

    async fn convert_image(&mut self, buffer: FeatureBuffer) -> SensorResult {
        match self {
            Self::Mock(sensor) => sensor.convert_image(buffer).await,
            #[cfg(feature = "serial")]
            Self::Serial(sensor) => sensor.convert_image(buffer).await,
        }
    }

    async fn build_model(&mut self) -> std::result::Result<(), BuildError> {
        match self {
            Self::Mock(sensor) => sensor.build_model().await,
            #[cfg(feature = "serial")]
            Self::Serial(sensor) => sensor.build_model().await,
        }
    }

    async fn store_model(&mut self, slot: SlotId) -> SensorResult {
        match self {
            Self::Mock(sensor) => sensor.store_model(slot).await,
            #[cfg(feature = "serial")]
            Self::Serial(sensor) => sensor.store_model(slot).await,
        }
    }

    async fn load_model(&mut self, slot: SlotId) -> SensorResult {
        match self {
            Self::Mock(sensor) => sensor.load_model(slot).await,
            #[cfg(feature = "serial")]
            Self::Serial(sensor) => sensor.load_model(slot).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_dispatch() {
        let (mock, handle) = MockSensor::new();
        let mut sensor = AnySensor::Mock(mock);

        handle.place_finger(1);
        assert_eq!(sensor.capture_image().await, CaptureOutcome::Captured);
        assert_eq!(handle.calls().len(), 1);
    }

    #[cfg(feature = "serial")]
    #[tokio::test(start_paused = true)]
    async fn test_serial_dispatch_over_boxed_link() {
        let (host, _module) = tokio::io::duplex(64);
        let link: BoxedLink = Box::new(host);
        let mut sensor = AnySensor::Serial(SerialSensor::new(link));

        assert_eq!(sensor.kind(), "serial");
        assert_eq!(
            sensor.capture_image().await,
            CaptureOutcome::Failed(fingate_core::SensorCode::TIMEOUT)
        );
    }
}
