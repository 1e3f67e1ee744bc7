//! Keyboard stand-in for the buttons and the finger.
//!
//! The reader runs as its own task, so key presses reach the button latches
//! while the control loop is blocked inside an action, the same way button
//! interrupts do on the device.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, info};

use fingate_core::ButtonSource;
use fingate_hardware::mock::MockSensorHandle;
use fingate_hardware::{ButtonLatches, Uptime};

/// Finger used by the `f` key.
const DEFAULT_FINGER: u32 = 1;

/// What a single key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Button(ButtonSource),
    PlaceFinger(u32),
    LiftFinger,
    Quit,
}

impl Key {
    pub fn parse(ch: char) -> Option<Self> {
        match ch.to_ascii_lowercase() {
            'a' => Some(Key::Button(ButtonSource::Left)),
            's' => Some(Key::Button(ButtonSource::Select)),
            'd' => Some(Key::Button(ButtonSource::Right)),
            'f' => Some(Key::PlaceFinger(DEFAULT_FINGER)),
            'g' => Some(Key::LiftFinger),
            'q' => Some(Key::Quit),
            c => c.to_digit(10).filter(|&d| d > 0).map(Key::PlaceFinger),
        }
    }
}

pub const HELP: &str = "keys: a=LEFT s=SELECT d=RIGHT f=finger 1..9=finger N g=lift q=quit (then Enter)";

/// Read stdin lines until `q` or end of input, then signal `quit`.
pub async fn read_keys(
    latches: Arc<ButtonLatches>,
    uptime: Uptime,
    finger: Option<MockSensorHandle>,
    quit: watch::Sender<bool>,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    'input: while let Ok(Some(line)) = lines.next_line().await {
        for key in line.chars().filter_map(Key::parse) {
            match key {
                Key::Button(source) => {
                    let accepted = latches.on_falling_edge(source, uptime.now_ms_u32());
                    debug!(%source, accepted, "key press");
                }
                Key::PlaceFinger(id) => match &finger {
                    Some(handle) => {
                        info!(finger = id, "finger placed");
                        handle.place_finger(id);
                    }
                    None => info!("finger keys only drive the mock sensor"),
                },
                Key::LiftFinger => {
                    if let Some(handle) = &finger {
                        info!("finger lifted");
                        handle.lift_finger();
                    }
                }
                Key::Quit => break 'input,
            }
        }
    }

    let _ = quit.send(true);
}
