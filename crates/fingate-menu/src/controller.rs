//! Top-level menu state machine.
//!
//! # States
//!
//! - `Idle`: the status screen (greeting and time) is shown
//! - `Active`: the menu is shown with one item selected
//!
//! # Transitions
//!
//! - any button while `Idle` opens the menu at the first item
//! - LEFT / RIGHT while `Active` move the selection, wrapping around
//! - SELECT while `Active` runs the selected item, then either returns to
//!   `Idle` or reopens the menu
//! - no button for the menu timeout while `Active` returns to `Idle`
//!
//! Actions run inline: [`MenuController::poll`] does not return until the
//! selected action has finished, and buttons pressed meanwhile stay in their
//! latches (at most one per button).
//!
//! # Examples
//!
//! ```no_run
//! use fingate_core::ControllerConfig;
//! use fingate_hardware::mock::{MockClock, MockSensor, MockWifi};
//! use fingate_hardware::{ButtonLatches, Uptime};
//! use fingate_menu::{LcdFrame, MenuController, Peripherals};
//!
//! # async fn run(clock: MockClock) {
//! let (sensor, _handle) = MockSensor::new();
//! let peripherals = Peripherals {
//!     sensor,
//!     display: LcdFrame::default(),
//!     clock,
//!     wifi: MockWifi::disconnected(),
//! };
//! let latches = ButtonLatches::default();
//! let mut menu = MenuController::new(peripherals, &ControllerConfig::default(), Uptime::start());
//! menu.show_status();
//! loop {
//!     menu.poll(&latches).await;
//!     tokio::time::sleep(std::time::Duration::from_millis(10)).await;
//! }
//! # }
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use fingate_biometric::{EnrollmentWorkflow, IdentificationTest};
use fingate_core::constants::{ACTION_BANNER_MS, CONFIRM_DWELL_MS, LCD_COLUMNS, MENU_ITEM_COUNT, RESULT_DWELL_MS};
use fingate_core::{ButtonEvent, ButtonSource, ControllerConfig};
use fingate_hardware::{ButtonLatches, ClockSource, FingerprintSensor, TextDisplay, Uptime, WifiControl};

use crate::items::MenuItem;

/// Whether the menu is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuMode {
    Idle,
    Active,
}

impl fmt::Display for MenuMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuMode::Idle => write!(f, "IDLE"),
            MenuMode::Active => write!(f, "ACTIVE"),
        }
    }
}

/// Where control goes after an action finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Close the menu and show the status screen.
    ReturnToStatus,
    /// Open the menu again at the first item.
    ReenterMenu,
}

/// Menu state. Owned by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuState {
    mode: MenuMode,
    selected: usize,
    /// Uptime of the last button event or menu entry.
    last_input_ms: u64,
    /// Uptime of the last menu render.
    last_render_ms: u64,
}

impl MenuState {
    fn new() -> Self {
        Self {
            mode: MenuMode::Idle,
            selected: 0,
            last_input_ms: 0,
            last_render_ms: 0,
        }
    }

    pub fn mode(&self) -> MenuMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.mode == MenuMode::Active
    }

    /// 0-based selection, always below the item count.
    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_item(&self) -> MenuItem {
        MenuItem::ALL[self.selected]
    }

    pub fn last_input_ms(&self) -> u64 {
        self.last_input_ms
    }

    pub fn last_render_ms(&self) -> u64 {
        self.last_render_ms
    }

    fn select_next(&mut self) {
        self.selected = (self.selected + 1) % MENU_ITEM_COUNT;
    }

    fn select_previous(&mut self) {
        self.selected = (self.selected + MENU_ITEM_COUNT - 1) % MENU_ITEM_COUNT;
    }
}

impl Default for MenuState {
    fn default() -> Self {
        Self::new()
    }
}

/// The devices the controller drives.
#[derive(Debug)]
pub struct Peripherals<S, D, C, W> {
    pub sensor: S,
    pub display: D,
    pub clock: C,
    pub wifi: W,
}

/// Drives the menu from button events and runs the selected actions.
pub struct MenuController<S, D, C, W> {
    io: Peripherals<S, D, C, W>,
    state: MenuState,
    uptime: Uptime,
    menu_timeout_ms: u64,
    refresh_interval_ms: u64,
    enrollment: EnrollmentWorkflow,
    identification: IdentificationTest,
}

impl<S, D, C, W> MenuController<S, D, C, W>
where
    S: FingerprintSensor,
    D: TextDisplay,
    C: ClockSource,
    W: WifiControl,
{
    /// Create a controller in `Idle`. Nothing is rendered until
    /// [`show_status`](Self::show_status) or the first event.
    pub fn new(peripherals: Peripherals<S, D, C, W>, config: &ControllerConfig, uptime: Uptime) -> Self {
        Self {
            io: peripherals,
            state: MenuState::new(),
            uptime,
            menu_timeout_ms: config.menu_timeout_ms,
            refresh_interval_ms: config.refresh_interval_ms,
            enrollment: EnrollmentWorkflow::from_config(config),
            identification: IdentificationTest::from_config(config),
        }
    }

    pub fn state(&self) -> &MenuState {
        &self.state
    }

    pub fn peripherals(&self) -> &Peripherals<S, D, C, W> {
        &self.io
    }

    pub fn peripherals_mut(&mut self) -> &mut Peripherals<S, D, C, W> {
        &mut self.io
    }

    pub fn into_peripherals(self) -> Peripherals<S, D, C, W> {
        self.io
    }

    /// One control-loop step.
    ///
    /// Drains pending buttons (LEFT, SELECT, RIGHT), then applies the menu
    /// timeout, then the idle re-render.
    pub async fn poll(&mut self, latches: &ButtonLatches) {
        for event in latches.drain() {
            self.handle_event(event).await;
        }

        if !self.state.is_active() {
            return;
        }

        let now = self.uptime.now_ms();
        if now.saturating_sub(self.state.last_input_ms) >= self.menu_timeout_ms {
            info!(idle_ms = now - self.state.last_input_ms, "menu timeout");
            self.state.mode = MenuMode::Idle;
            self.show_status();
        } else if now.saturating_sub(self.state.last_render_ms) >= self.refresh_interval_ms {
            self.render_menu();
        }
    }

    /// Apply one button event.
    pub async fn handle_event(&mut self, event: ButtonEvent) {
        debug!(source = %event.source, at_ms = event.timestamp_ms, mode = %self.state.mode, "button");
        self.state.last_input_ms = self.uptime.now_ms();

        if !self.state.is_active() {
            info!(source = %event.source, "entering menu");
            self.enter_menu();
            return;
        }

        match event.source {
            ButtonSource::Left => {
                self.state.select_previous();
                debug!(item = %self.state.selected_item(), "selection moved left");
                self.render_menu();
            }
            ButtonSource::Right => {
                self.state.select_next();
                debug!(item = %self.state.selected_item(), "selection moved right");
                self.render_menu();
            }
            ButtonSource::Select => {
                let item = self.state.selected_item();
                self.state.mode = MenuMode::Idle;
                match self.execute(item).await {
                    ActionOutcome::ReturnToStatus => self.show_status(),
                    ActionOutcome::ReenterMenu => self.enter_menu(),
                }
            }
        }
    }

    /// Run one menu action to completion.
    pub async fn execute(&mut self, item: MenuItem) -> ActionOutcome {
        info!(%item, "executing menu item");
        self.io.display.show("Executing...", item.label());
        sleep(ms(ACTION_BANNER_MS)).await;

        match item {
            MenuItem::TestFinger => {
                let report = self
                    .identification
                    .run(&mut self.io.sensor, &mut self.io.display)
                    .await;
                info!(captures = report.captures, polls = report.polls, "finger test finished");
                ActionOutcome::ReturnToStatus
            }
            MenuItem::EnrollFinger => {
                match self
                    .enrollment
                    .run(&mut self.io.sensor, &mut self.io.display)
                    .await
                {
                    Ok(slot) => info!(%slot, "enrollment finished"),
                    Err(e) => warn!(error = %e, "enrollment aborted"),
                }
                ActionOutcome::ReturnToStatus
            }
            MenuItem::WifiStatus => {
                if self.io.wifi.is_connected() {
                    let ip = self.io.wifi.current_ip();
                    info!(%ip, "wifi connected");
                    self.io.display.show("WiFi Connected", &ip);
                } else {
                    info!("wifi disconnected or in config mode");
                    self.io.display.show("WiFi Disconnected", "Config mode active");
                }
                sleep(ms(RESULT_DWELL_MS)).await;
                ActionOutcome::ReenterMenu
            }
            MenuItem::ResetWifi => {
                self.io.display.show("Resetting WiFi", "Please wait...");
                info!("resetting wifi configuration");
                if let Err(e) = self.io.wifi.reset().await {
                    error!(error = %e, "wifi reset failed");
                }
                ActionOutcome::ReturnToStatus
            }
            MenuItem::DisconnectWifi => {
                self.io.display.show("Disconnecting", "WiFi...");
                if let Err(e) = self.io.wifi.disconnect().await {
                    error!(error = %e, "wifi disconnect failed");
                }
                sleep(ms(CONFIRM_DWELL_MS)).await;
                ActionOutcome::ReenterMenu
            }
            MenuItem::SetClock => {
                let time = self.io.clock.reset_to_reference();
                info!(%time, "clock set to reference time");
                self.io.display.show("RTC Time Set", "To build time");
                sleep(ms(CONFIRM_DWELL_MS)).await;
                ActionOutcome::ReenterMenu
            }
        }
    }

    /// Render the status screen.
    pub fn show_status(&mut self) {
        let now = self.io.clock.now();
        let greeting = self.io.clock.greeting(now);
        let time = self.io.clock.format_time(now);
        debug!(%greeting, %time, "status screen");
        self.io.display.show(greeting, &time);
    }

    fn enter_menu(&mut self) {
        let now = self.uptime.now_ms();
        self.state.mode = MenuMode::Active;
        self.state.selected = 0;
        self.state.last_input_ms = now;
        self.render_menu();
    }

    fn render_menu(&mut self) {
        let (line1, line2) = menu_lines(self.state.selected);
        self.io.display.show(&line1, &line2);
        self.state.last_render_ms = self.uptime.now_ms();
    }
}

impl<S, D, C, W> fmt::Debug for MenuController<S, D, C, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuController")
            .field("state", &self.state)
            .field("menu_timeout_ms", &self.menu_timeout_ms)
            .field("refresh_interval_ms", &self.refresh_interval_ms)
            .finish_non_exhaustive()
    }
}

/// Both menu lines for a 0-based selection.
pub fn menu_lines(selected: usize) -> (String, String) {
    let label = MenuItem::from_index(selected).map_or("", |item| item.label());
    let line2 = format!("({}/{}) L<->R SEL", selected + 1, MENU_ITEM_COUNT);
    (selection_line(label), line2)
}

/// Selection marker and label. A line wider than the display keeps its
/// first 15 characters and ends in `>`.
pub fn selection_line(label: &str) -> String {
    let line = format!(">{}", label);
    if line.chars().count() <= LCD_COLUMNS {
        return line;
    }
    let mut cut: String = line.chars().take(LCD_COLUMNS - 1).collect();
    cut.push('>');
    cut
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, ">Test Finger", "(1/6) L<->R SEL")]
    #[case(4, ">Disconnect WiFi", "(5/6) L<->R SEL")]
    #[case(5, ">Set RTC Time", "(6/6) L<->R SEL")]
    fn test_menu_lines(#[case] selected: usize, #[case] line1: &str, #[case] line2: &str) {
        assert_eq!(menu_lines(selected), (line1.to_string(), line2.to_string()));
    }

    #[rstest]
    #[case("Exactly 15 char", ">Exactly 15 char")]
    #[case("Sixteen chars ok", ">Sixteen chars >")]
    #[case("A much longer menu label", ">A much longer >")]
    fn test_selection_line_truncation(#[case] label: &str, #[case] expected: &str) {
        let line = selection_line(label);
        assert_eq!(line, expected);
        assert!(line.chars().count() <= 16);
    }

    #[test]
    fn test_selection_wraps() {
        let mut state = MenuState::new();
        state.select_previous();
        assert_eq!(state.selected(), 5);
        assert_eq!(state.selected_item(), MenuItem::SetClock);
        state.select_next();
        assert_eq!(state.selected(), 0);
    }

    #[test]
    fn test_initial_state_is_idle() {
        let state = MenuState::default();
        assert_eq!(state.mode(), MenuMode::Idle);
        assert!(!state.is_active());
        assert_eq!(state.selected(), 0);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(MenuMode::Active.to_string(), "ACTIVE");
        assert_eq!(MenuMode::Idle.to_string(), "IDLE");
    }
}
