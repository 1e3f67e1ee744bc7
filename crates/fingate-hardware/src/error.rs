//! Error types for hardware operations.
//!
//! Sensor *operation* failures (no finger, bad image, mismatch, ...) are data
//! and travel as [`SensorCode`](fingate_core::SensorCode) values. The errors
//! here cover the transport and handshake underneath them.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur while talking to a device.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Operation timed out after specified duration.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Device communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// The module rejected the handshake password.
    #[error("Handshake rejected: {code}")]
    HandshakeRejected { code: fingate_core::SensorCode },

    /// Packet framing error.
    #[error("Protocol error: {0}")]
    Protocol(#[from] fingate_core::Error),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }
}
