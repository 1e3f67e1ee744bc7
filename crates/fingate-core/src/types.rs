use crate::{
    Result,
    constants::{FIRST_SLOT_ID, SLOT_CAPACITY},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Template slot identifier on the sensor (1-300).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotId(u16);

impl SlotId {
    /// Create a new slot ID with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidSlot` if the ID is outside `1..=300`.
    pub fn new(id: u16) -> Result<Self> {
        if !(FIRST_SLOT_ID..=SLOT_CAPACITY).contains(&id) {
            return Err(Error::InvalidSlot {
                slot: id,
                min: FIRST_SLOT_ID,
                max: SLOT_CAPACITY,
            });
        }
        Ok(SlotId(id))
    }

    /// Lowest slot ID.
    pub const FIRST: SlotId = SlotId(FIRST_SLOT_ID);

    /// Highest slot ID.
    pub const LAST: SlotId = SlotId(SLOT_CAPACITY);

    /// Get the raw slot ID.
    #[must_use]
    pub fn get(&self) -> u16 {
        self.0
    }

    /// Iterate over the first `capacity` slot IDs in ascending order.
    ///
    /// `capacity` is clamped to the sensor's slot count.
    pub fn range(capacity: u16) -> impl Iterator<Item = SlotId> {
        (FIRST_SLOT_ID..=capacity.min(SLOT_CAPACITY)).map(SlotId)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for SlotId {
    type Error = Error;

    fn try_from(id: u16) -> Result<Self> {
        SlotId::new(id)
    }
}

/// Physical button that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonSource {
    Left,
    Select,
    Right,
}

impl ButtonSource {
    /// All sources, in the order the control loop drains them.
    pub const ALL: [ButtonSource; 3] = [ButtonSource::Left, ButtonSource::Select, ButtonSource::Right];

    /// Position of this source in [`ButtonSource::ALL`].
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            ButtonSource::Left => 0,
            ButtonSource::Select => 1,
            ButtonSource::Right => 2,
        }
    }
}

impl fmt::Display for ButtonSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ButtonSource::Left => "LEFT",
            ButtonSource::Select => "SELECT",
            ButtonSource::Right => "RIGHT",
        };
        write!(f, "{name}")
    }
}

/// A debounced button press.
///
/// Produced once per accepted falling edge and consumed at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonEvent {
    pub source: ButtonSource,
    /// Uptime in milliseconds at which the edge was accepted.
    pub timestamp_ms: u32,
}

impl ButtonEvent {
    pub fn new(source: ButtonSource, timestamp_ms: u32) -> Self {
        Self {
            source,
            timestamp_ms,
        }
    }
}

/// One of the sensor's two feature workspace buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureBuffer {
    One,
    Two,
}

impl FeatureBuffer {
    /// Buffer number as used on the wire (1 or 2).
    #[must_use]
    pub fn as_u8(&self) -> u8 {
        match self {
            FeatureBuffer::One => 1,
            FeatureBuffer::Two => 2,
        }
    }
}

impl TryFrom<u8> for FeatureBuffer {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(FeatureBuffer::One),
            2 => Ok(FeatureBuffer::Two),
            other => Err(Error::InvalidBuffer(other)),
        }
    }
}

impl fmt::Display for FeatureBuffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Confirmation code reported by the sensor.
///
/// The sensor answers every instruction with a one-byte code. `0x00` means
/// success; everything else is a failure reason. Two values outside the
/// sensor's own range ([`SensorCode::TIMEOUT`], [`SensorCode::BAD_PACKET`])
/// are produced locally when the acknowledgement never arrives or cannot be
/// decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SensorCode(pub u8);

impl SensorCode {
    pub const OK: SensorCode = SensorCode(0x00);
    pub const PACKET_RECEIVE_ERROR: SensorCode = SensorCode(0x01);
    pub const NO_FINGER: SensorCode = SensorCode(0x02);
    pub const IMAGE_FAIL: SensorCode = SensorCode(0x03);
    pub const IMAGE_MESSY: SensorCode = SensorCode(0x06);
    pub const FEATURE_FAIL: SensorCode = SensorCode(0x07);
    pub const NO_MATCH: SensorCode = SensorCode(0x08);
    pub const NOT_FOUND: SensorCode = SensorCode(0x09);
    pub const ENROLL_MISMATCH: SensorCode = SensorCode(0x0A);
    pub const BAD_LOCATION: SensorCode = SensorCode(0x0B);
    pub const DB_READ_FAIL: SensorCode = SensorCode(0x0C);
    pub const UPLOAD_FEATURE_FAIL: SensorCode = SensorCode(0x0D);
    pub const PACKET_RESPONSE_FAIL: SensorCode = SensorCode(0x0E);
    pub const DELETE_FAIL: SensorCode = SensorCode(0x10);
    pub const DB_CLEAR_FAIL: SensorCode = SensorCode(0x11);
    pub const WRONG_PASSWORD: SensorCode = SensorCode(0x13);
    pub const INVALID_IMAGE: SensorCode = SensorCode(0x15);
    pub const FLASH_ERROR: SensorCode = SensorCode(0x18);
    pub const INVALID_REGISTER: SensorCode = SensorCode(0x1A);
    pub const BAD_PACKET: SensorCode = SensorCode(0xFE);
    pub const TIMEOUT: SensorCode = SensorCode(0xFF);

    #[must_use]
    pub fn is_ok(&self) -> bool {
        *self == SensorCode::OK
    }

    /// Short human-readable description.
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match *self {
            SensorCode::OK => "ok",
            SensorCode::PACKET_RECEIVE_ERROR => "packet receive error",
            SensorCode::NO_FINGER => "no finger",
            SensorCode::IMAGE_FAIL => "imaging failed",
            SensorCode::IMAGE_MESSY => "image too messy",
            SensorCode::FEATURE_FAIL => "too few features",
            SensorCode::NO_MATCH => "no match",
            SensorCode::NOT_FOUND => "not found",
            SensorCode::ENROLL_MISMATCH => "captures do not match",
            SensorCode::BAD_LOCATION => "bad slot location",
            SensorCode::DB_READ_FAIL => "template read failed",
            SensorCode::UPLOAD_FEATURE_FAIL => "feature upload failed",
            SensorCode::PACKET_RESPONSE_FAIL => "packet response failed",
            SensorCode::DELETE_FAIL => "delete failed",
            SensorCode::DB_CLEAR_FAIL => "clear failed",
            SensorCode::WRONG_PASSWORD => "wrong password",
            SensorCode::INVALID_IMAGE => "no valid image",
            SensorCode::FLASH_ERROR => "flash write error",
            SensorCode::INVALID_REGISTER => "invalid register",
            SensorCode::BAD_PACKET => "bad packet",
            SensorCode::TIMEOUT => "timeout",
            _ => "unknown error",
        }
    }
}

impl fmt::Display for SensorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#04x} ({})", self.0, self.describe())
    }
}

impl From<u8> for SensorCode {
    fn from(code: u8) -> Self {
        SensorCode(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1)]
    #[case(150)]
    #[case(300)]
    fn test_slot_id_valid(#[case] id: u16) {
        assert_eq!(SlotId::new(id).unwrap().get(), id);
    }

    #[rstest]
    #[case(0)]
    #[case(301)]
    #[case(u16::MAX)]
    fn test_slot_id_invalid(#[case] id: u16) {
        let err = SlotId::new(id).unwrap_err();
        assert!(matches!(err, Error::InvalidSlot { slot, .. } if slot == id));
    }

    #[test]
    fn test_slot_range_ascending() {
        let ids: Vec<u16> = SlotId::range(5).map(|s| s.get()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_slot_range_clamped_to_capacity() {
        assert_eq!(SlotId::range(1000).count(), 300);
        assert_eq!(SlotId::range(1000).last(), Some(SlotId::LAST));
    }

    #[test]
    fn test_button_source_drain_order() {
        for (i, source) in ButtonSource::ALL.iter().enumerate() {
            assert_eq!(source.index(), i);
        }
        assert_eq!(ButtonSource::ALL[0], ButtonSource::Left);
        assert_eq!(ButtonSource::ALL[2], ButtonSource::Right);
    }

    #[rstest]
    #[case(1, FeatureBuffer::One)]
    #[case(2, FeatureBuffer::Two)]
    fn test_feature_buffer_from_u8(#[case] raw: u8, #[case] expected: FeatureBuffer) {
        assert_eq!(FeatureBuffer::try_from(raw).unwrap(), expected);
        assert_eq!(expected.as_u8(), raw);
    }

    #[test]
    fn test_feature_buffer_invalid() {
        assert!(FeatureBuffer::try_from(0).is_err());
        assert!(FeatureBuffer::try_from(3).is_err());
    }

    #[test]
    fn test_sensor_code_display() {
        assert_eq!(
            SensorCode::ENROLL_MISMATCH.to_string(),
            "0x0a (captures do not match)"
        );
        assert_eq!(SensorCode(0x42).describe(), "unknown error");
        assert!(SensorCode::OK.is_ok());
        assert!(!SensorCode::NO_FINGER.is_ok());
    }
}
