//! Color definitions and colour schemes
//!
//! All colours are RGB565, the native format of the TFT panel.
//! To convert from 8-bit RGB: R>>3, G>>2, B>>3 (see [`rgb`]).

use embedded_graphics::pixelcolor::Rgb565;

/// Build an RGB565 colour from 8-bit channels.
pub const fn rgb(r: u8, g: u8, b: u8) -> Rgb565 {
    Rgb565::new(r >> 3, g >> 2, b >> 3)
}

// ============================================================================
// Base Colors
// ============================================================================

pub const BLACK: Rgb565 = rgb(0, 0, 0);

/// Pure white - maximum brightness in RGB565
pub const WHITE: Rgb565 = Rgb565::new(31, 63, 31);

/// Light gray - for secondary text
pub const LIGHT_GRAY: Rgb565 = rgb(208, 208, 208);

/// Medium gray
pub const GRAY: Rgb565 = rgb(128, 128, 128);

/// Dark gray - dialog bodies and idle LEDs
pub const DARK_GRAY: Rgb565 = rgb(64, 64, 64);

pub const GREEN: Rgb565 = rgb(0, 252, 0);
pub const DARK_GREEN: Rgb565 = rgb(0, 128, 0);
pub const MAROON: Rgb565 = rgb(128, 0, 0);
pub const BLUE: Rgb565 = rgb(0, 0, 248);
pub const NAVY: Rgb565 = rgb(0, 0, 128);
pub const CYAN: Rgb565 = rgb(0, 252, 248);
pub const ORANGE: Rgb565 = rgb(248, 164, 0);

// ============================================================================
// Screen and dialog colours
// ============================================================================

pub const SCREEN_BACKGROUND: Rgb565 = BLACK;
pub const SCREEN_TEXT: Rgb565 = WHITE;

pub const DIALOG_HEADER_BACKGROUND: Rgb565 = NAVY;
pub const DIALOG_HEADER_TEXT: Rgb565 = WHITE;

/// Dots of the dimming veil behind a modal dialog
pub const DIALOG_VEIL: Rgb565 = rgb(190, 190, 190);

/// Value text while it still equals the value the editor opened with
pub const VALUE_UNCHANGED: Rgb565 = CYAN;

/// Speed readout accent
pub const SPEED_ACCENT: Rgb565 = ORANGE;

// ============================================================================
// Colour scheme
// ============================================================================

/// Full set of colours a component draws with in each of its visual states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScheme {
    pub background: Rgb565,
    pub foreground: Rgb565,
    pub border: Rgb565,

    pub pressed_background: Rgb565,
    pub pressed_foreground: Rgb565,
    pub pressed_border: Rgb565,

    pub disabled_background: Rgb565,
    pub disabled_foreground: Rgb565,
    pub disabled_border: Rgb565,

    /// Toggle ON and "current page" highlight
    pub active_background: Rgb565,
    pub active_foreground: Rgb565,
    pub active_border: Rgb565,

    pub led_on: Rgb565,
    pub led_off: Rgb565,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::button()
    }
}

impl ColorScheme {
    /// Blue-grey push button
    pub const fn button() -> Self {
        Self {
            background: rgb(65, 65, 114),
            foreground: WHITE,
            border: WHITE,
            pressed_background: BLUE,
            pressed_foreground: WHITE,
            pressed_border: WHITE,
            disabled_background: rgb(64, 64, 64),
            disabled_foreground: rgb(128, 128, 128),
            disabled_border: rgb(96, 96, 96),
            active_background: DARK_GREEN,
            active_foreground: WHITE,
            active_border: GREEN,
            led_on: GREEN,
            led_off: DARK_GRAY,
        }
    }

    /// Confirming action (OK, Yes)
    pub const fn ok_button() -> Self {
        let mut scheme = Self::button();
        scheme.background = DARK_GREEN;
        scheme.border = DARK_GREEN;
        scheme
    }

    /// Dismissing action (Cancel, No)
    pub const fn cancel_button() -> Self {
        let mut scheme = Self::button();
        scheme.background = MAROON;
        scheme.border = MAROON;
        scheme
    }

    /// Close affordance in a dialog header
    pub const fn close_button() -> Self {
        let mut scheme = Self::button();
        scheme.background = NAVY;
        scheme.border = NAVY;
        scheme.pressed_background = DARK_GRAY;
        scheme.pressed_border = NAVY;
        scheme
    }

    /// Dialog body
    pub const fn dialog() -> Self {
        let mut scheme = Self::button();
        scheme.background = DARK_GRAY;
        scheme.border = LIGHT_GRAY;
        scheme
    }

    /// Plain screen text on black
    pub const fn screen() -> Self {
        let mut scheme = Self::button();
        scheme.background = SCREEN_BACKGROUND;
        scheme.foreground = SCREEN_TEXT;
        scheme.border = SCREEN_TEXT;
        scheme
    }
}

/// Darken a colour by `steps` units per channel (green counts double).
pub fn darken(color: Rgb565, steps: u8) -> Rgb565 {
    use embedded_graphics::pixelcolor::RgbColor;
    Rgb565::new(
        color.r().saturating_sub(steps),
        color.g().saturating_sub(steps.saturating_mul(2)),
        color.b().saturating_sub(steps),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::RgbColor;

    #[test]
    fn test_rgb_conversion() {
        assert_eq!(rgb(255, 255, 255), WHITE);
        assert_eq!(rgb(0, 0, 0), Rgb565::BLACK);
    }

    #[test]
    fn test_darken_saturates_at_black() {
        let c = darken(rgb(16, 16, 16), 10);
        assert_eq!((c.r(), c.g(), c.b()), (0, 0, 0));
        let c = darken(WHITE, 1);
        assert_eq!((c.r(), c.g(), c.b()), (30, 61, 30));
    }
}
