//! Screens and navigation
//!
//! - [`screen`] - the [`Screen`] trait and the structure every screen embeds
//! - [`screen_controller`] - active screen, back-stack, deferred navigation
//!   and the idle screensaver
//! - [`main_screen`], [`sats`], [`setup`], [`screensaver`] - the screens
//!   shipped with the runtime

pub mod main_screen;
pub mod sats;
pub mod screen;
pub mod screen_controller;
pub mod screensaver;
pub mod setup;

pub use main_screen::MainScreen;
pub use sats::SatsScreen;
pub use screen::{Screen, ScreenCore};
pub use screen_controller::{ScreenController, ScreenFactory};
pub use screensaver::ScreenSaverScreen;
pub use setup::SetupScreen;

/// Registry names of the shipped screens.
pub const MAIN: &str = "Main";
pub const SATS: &str = "Sats";
pub const SETUP: &str = "Setup";
pub const SCREEN_SAVER: &str = "ScreenSaver";
