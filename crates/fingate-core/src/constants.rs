//! Core constants for the fingate access-control appliance.
//!
//! This module defines the timing, capacity and sensor-protocol constants used
//! throughout the workspace. Runtime-tunable values have a matching field in
//! [`ControllerConfig`](crate::config::ControllerConfig); the constants here are
//! their defaults.
//!
//! # Usage
//!
//! ```
//! use fingate_core::constants::*;
//!
//! assert_eq!(SLOT_CAPACITY, 300);
//! assert!(u64::from(DEBOUNCE_WINDOW_MS) < MENU_TIMEOUT_MS);
//! ```

// ============================================================================
// Input
// ============================================================================

/// Minimum time between two accepted edges on the same button, in milliseconds.
///
/// An edge arriving while the window is still open is ignored. This masks
/// contact bounce as well as rapid repeated presses.
pub const DEBOUNCE_WINDOW_MS: u32 = 200;

// ============================================================================
// Menu
// ============================================================================

/// Inactivity period after which an open menu closes, in milliseconds.
pub const MENU_TIMEOUT_MS: u64 = 30_000;

/// Interval after which an open menu is re-rendered without input, in milliseconds.
pub const MENU_REFRESH_INTERVAL_MS: u64 = 10;

/// Number of entries in the menu catalog.
pub const MENU_ITEM_COUNT: usize = 6;

/// Width of one line of the character display.
pub const LCD_COLUMNS: usize = 16;

/// Number of lines of the character display.
pub const LCD_LINES: usize = 2;

// ============================================================================
// Template store
// ============================================================================

/// Number of template slots on the sensor.
///
/// Slot IDs are 1-based: valid IDs are `1..=SLOT_CAPACITY`.
///
/// # Examples
///
/// ```
/// use fingate_core::constants::{FIRST_SLOT_ID, SLOT_CAPACITY};
///
/// let all: Vec<u16> = (FIRST_SLOT_ID..=SLOT_CAPACITY).collect();
/// assert_eq!(all.len(), 300);
/// ```
pub const SLOT_CAPACITY: u16 = 300;

/// Lowest valid slot ID.
pub const FIRST_SLOT_ID: u16 = 1;

/// Delay between two probes while searching for a free slot, in milliseconds.
pub const SLOT_PROBE_DELAY_MS: u64 = 10;

/// Delay between two probes while counting occupied slots, in milliseconds.
pub const SLOT_COUNT_DELAY_MS: u64 = 5;

/// The allocator reports progress every this many probed IDs.
pub const SLOT_PROGRESS_STEP: u16 = 50;

// ============================================================================
// Workflows
// ============================================================================

/// Number of sensor polls performed by the identification sanity test.
pub const IDENTIFICATION_POLLS: usize = 100;

/// Interval between sensor polls while waiting for a finger, in milliseconds.
pub const FINGER_POLL_INTERVAL_MS: u64 = 50;

/// Pause after the "Executing..." banner of a menu action, in milliseconds.
pub const ACTION_BANNER_MS: u64 = 1_000;

/// Dwell time of an error message before control returns, in milliseconds.
pub const ERROR_DWELL_MS: u64 = 3_000;

/// Dwell time of the enrollment mismatch message, in milliseconds.
pub const MISMATCH_DWELL_MS: u64 = 4_000;

/// Dwell time of a completion or status message, in milliseconds.
pub const RESULT_DWELL_MS: u64 = 3_000;

/// Dwell time of a short confirmation message, in milliseconds.
pub const CONFIRM_DWELL_MS: u64 = 2_000;

/// Pause between two guidance screens of the enrollment workflow, in milliseconds.
pub const STEP_PAUSE_MS: u64 = 1_000;

// ============================================================================
// Sensor protocol
// ============================================================================

/// Packet header of the R30x sensor family.
pub const PACKET_HEADER: u16 = 0xEF01;

/// Factory default module address.
pub const DEFAULT_SENSOR_ADDRESS: u32 = 0xFFFF_FFFF;

/// Factory default module password.
pub const DEFAULT_SENSOR_PASSWORD: u32 = 0;

/// Default time to wait for an acknowledgement packet, in milliseconds.
pub const DEFAULT_ACK_TIMEOUT_MS: u64 = 1_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_range_is_one_based() {
        assert_eq!(FIRST_SLOT_ID, 1);
        assert_eq!(SLOT_CAPACITY - FIRST_SLOT_ID + 1, 300);
    }

    #[test]
    fn test_progress_step_divides_capacity() {
        assert_eq!(SLOT_CAPACITY % SLOT_PROGRESS_STEP, 0);
    }
}
