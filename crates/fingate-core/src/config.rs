//! Runtime configuration for the control core.
//!
//! Every field has a default taken from [`constants`](crate::constants), so a
//! configuration file only needs to list the values it changes.
//!
//! ```
//! use fingate_core::config::ControllerConfig;
//!
//! let config: ControllerConfig = serde_json::from_str(r#"{ "menu_timeout_ms": 5000 }"#).unwrap();
//! assert_eq!(config.menu_timeout_ms, 5000);
//! assert_eq!(config.slot_capacity, 300);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::{Error, Result};

/// Tunables for input handling, the menu and the biometric workflows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Debounce window applied to every button, in milliseconds.
    pub debounce_ms: u32,

    /// Inactivity period after which the menu closes, in milliseconds.
    pub menu_timeout_ms: u64,

    /// Idle re-render interval while the menu is open, in milliseconds.
    pub refresh_interval_ms: u64,

    /// Number of template slots scanned by the allocator.
    pub slot_capacity: u16,

    /// Delay between slot probes while searching, in milliseconds.
    pub probe_delay_ms: u64,

    /// Delay between slot probes while counting, in milliseconds.
    pub count_delay_ms: u64,

    /// Number of polls performed by the identification test.
    pub identification_polls: usize,

    /// Show the number of enrolled templates after allocating a slot.
    pub show_enrolled_total: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEBOUNCE_WINDOW_MS,
            menu_timeout_ms: MENU_TIMEOUT_MS,
            refresh_interval_ms: MENU_REFRESH_INTERVAL_MS,
            slot_capacity: SLOT_CAPACITY,
            probe_delay_ms: SLOT_PROBE_DELAY_MS,
            count_delay_ms: SLOT_COUNT_DELAY_MS,
            identification_polls: IDENTIFICATION_POLLS,
            show_enrolled_total: true,
        }
    }
}

impl ControllerConfig {
    /// Load a configuration from a JSON file and validate it.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read and `Error::Config` if
    /// it is not valid JSON or fails [`validate`](Self::validate).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: ControllerConfig = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the values describe a usable device.
    ///
    /// # Errors
    /// Returns `Error::Config` naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        if self.debounce_ms == 0 {
            return Err(Error::Config("debounce_ms must be greater than 0".into()));
        }
        if self.menu_timeout_ms == 0 {
            return Err(Error::Config("menu_timeout_ms must be greater than 0".into()));
        }
        if self.slot_capacity == 0 || self.slot_capacity > SLOT_CAPACITY {
            return Err(Error::Config(format!(
                "slot_capacity must be 1-{}, got {}",
                SLOT_CAPACITY, self.slot_capacity
            )));
        }
        if self.identification_polls == 0 {
            return Err(Error::Config(
                "identification_polls must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Set the debounce window
    pub fn debounce_ms(mut self, ms: u32) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Set the menu inactivity timeout
    pub fn menu_timeout_ms(mut self, ms: u64) -> Self {
        self.menu_timeout_ms = ms;
        self
    }

    /// Set the idle re-render interval
    pub fn refresh_interval_ms(mut self, ms: u64) -> Self {
        self.refresh_interval_ms = ms;
        self
    }

    /// Set the number of slots scanned by the allocator
    pub fn slot_capacity(mut self, capacity: u16) -> Self {
        self.slot_capacity = capacity;
        self
    }

    /// Set the number of identification polls
    pub fn identification_polls(mut self, polls: usize) -> Self {
        self.identification_polls = polls;
        self
    }

    /// Set whether the enrolled total is shown after allocation
    pub fn show_enrolled_total(mut self, show: bool) -> Self {
        self.show_enrolled_total = show;
        self
    }

    pub fn menu_timeout(&self) -> Duration {
        Duration::from_millis(self.menu_timeout_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn probe_delay(&self) -> Duration {
        Duration::from_millis(self.probe_delay_ms)
    }

    pub fn count_delay(&self) -> Duration {
        Duration::from_millis(self.count_delay_ms)
    }
}
