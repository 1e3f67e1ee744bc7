//! Mock collaborators for tests and the simulator.
//!
//! Each mock can be driven programmatically without physical hardware.

pub mod clock;
pub mod sensor;
pub mod wifi;

pub use clock::MockClock;
pub use sensor::{MockSensor, MockSensorHandle, ScriptedCapture, SensorCall};
pub use wifi::MockWifi;
