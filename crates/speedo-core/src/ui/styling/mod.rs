//! Styling for UI elements
//!
//! - [`colors`] - RGB565 constants and the [`ColorScheme`] every component carries

pub mod colors;

pub use colors::{
    BLACK, BLUE, CYAN, ColorScheme, DARK_GRAY, DARK_GREEN, DIALOG_HEADER_BACKGROUND,
    DIALOG_HEADER_TEXT, DIALOG_VEIL, GRAY, GREEN, LIGHT_GRAY, MAROON, NAVY, ORANGE,
    SCREEN_BACKGROUND, SCREEN_TEXT, SPEED_ACCENT, VALUE_UNCHANGED, WHITE, darken, rgb,
};
