//! The menu catalog.

use std::fmt;

use serde::{Deserialize, Serialize};

use fingate_core::constants::MENU_ITEM_COUNT;

/// One entry of the menu, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuItem {
    /// Finger detection sanity test.
    TestFinger,
    EnrollFinger,
    WifiStatus,
    /// Forget stored WiFi credentials.
    ResetWifi,
    DisconnectWifi,
    /// Set the real-time clock to its reference time.
    SetClock,
}

impl MenuItem {
    /// Every item, in the order the menu cycles through them.
    pub const ALL: [MenuItem; MENU_ITEM_COUNT] = [
        MenuItem::TestFinger,
        MenuItem::EnrollFinger,
        MenuItem::WifiStatus,
        MenuItem::ResetWifi,
        MenuItem::DisconnectWifi,
        MenuItem::SetClock,
    ];

    /// Item at a 0-based menu position.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// 0-based position in [`MenuItem::ALL`].
    pub fn index(&self) -> usize {
        match self {
            MenuItem::TestFinger => 0,
            MenuItem::EnrollFinger => 1,
            MenuItem::WifiStatus => 2,
            MenuItem::ResetWifi => 3,
            MenuItem::DisconnectWifi => 4,
            MenuItem::SetClock => 5,
        }
    }

    /// Text shown on the display.
    pub fn label(&self) -> &'static str {
        match self {
            MenuItem::TestFinger => "Test Finger",
            MenuItem::EnrollFinger => "Enroll Finger",
            MenuItem::WifiStatus => "WiFi Status",
            MenuItem::ResetWifi => "Reset WiFi",
            MenuItem::DisconnectWifi => "Disconnect WiFi",
            MenuItem::SetClock => "Set RTC Time",
        }
    }
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trips_through_all() {
        for (position, item) in MenuItem::ALL.iter().enumerate() {
            assert_eq!(item.index(), position);
            assert_eq!(MenuItem::from_index(position), Some(*item));
        }
        assert_eq!(MenuItem::from_index(MENU_ITEM_COUNT), None);
    }

    #[test]
    fn test_labels_fit_menu_line() {
        // one column is taken by the selection marker
        for item in MenuItem::ALL {
            assert!(item.label().len() <= 15, "{} too long", item);
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&MenuItem::DisconnectWifi).unwrap();
        assert_eq!(json, "\"disconnect_wifi\"");
    }
}
