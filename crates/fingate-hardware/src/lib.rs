//! Peripheral layer for the fingate control core.
//!
//! # Collaborators
//!
//! The control core talks to four peripherals through the traits in
//! [`traits`]:
//!
//! - [`FingerprintSensor`]: capture, convert, build, store and load templates
//! - [`TextDisplay`]: the two-line character display
//! - [`ClockSource`]: wall clock and status-screen text
//! - [`WifiControl`]: station status, disconnect and credential reset
//!
//! ```no_run
//! use fingate_core::SlotId;
//! use fingate_hardware::FingerprintSensor;
//!
//! async fn is_enrolled<S: FingerprintSensor>(sensor: &mut S, slot: SlotId) -> bool {
//!     sensor.load_model(slot).await.is_ok()
//! }
//! ```
//!
//! # Buttons
//!
//! [`input::ButtonLatches`] holds one debounced single-slot mailbox per button.
//! Interrupt handlers (or the simulator's key reader) write, the menu's poll
//! step drains.
//!
//! # Implementations
//!
//! - [`serial::SerialSensor`]: R30x wire driver over any async byte stream
//! - [`mock`]: in-memory sensor, clock and WiFi for tests and the simulator
//! - [`devices::AnySensor`]: runtime choice between the two sensors
//!
//! # Error Handling
//!
//! Sensor operations report [`SensorCode`](fingate_core::SensorCode)s.
//! Transport and handshake failures use [`HardwareError`].
//!
//! [`FingerprintSensor`]: traits::FingerprintSensor
//! [`TextDisplay`]: traits::TextDisplay
//! [`ClockSource`]: traits::ClockSource
//! [`WifiControl`]: traits::WifiControl

pub mod clock;
pub mod devices;
pub mod error;
pub mod input;
pub mod mock;
#[cfg(feature = "serial")]
pub mod serial;
pub mod traits;

pub use clock::{SystemClock, Uptime};
pub use error::{HardwareError, Result};
pub use input::{ButtonLatches, EdgeLatch};
pub use traits::{
    BuildError, CaptureOutcome, ClockSource, FingerprintSensor, SensorResult, TextDisplay,
    WifiControl,
};
