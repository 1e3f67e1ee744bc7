//! Menu layer of the fingate control core.
//!
//! This crate contains the [`MenuController`] state machine that turns
//! button events into menu navigation and actions, the fixed
//! [`MenuItem`] catalog, and [`LcdFrame`], an in-memory 2x16 character
//! display used by the simulator and the tests.

pub mod controller;
pub mod display;
pub mod items;

pub use controller::{ActionOutcome, MenuController, MenuMode, MenuState, Peripherals, menu_lines};
pub use display::LcdFrame;
pub use items::MenuItem;
