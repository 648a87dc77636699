//! Push and toggle buttons
//!
//! Buttons add three things on top of the default component gesture handling:
//! an event callback, a long-press detector that runs in the periodic update
//! (so it fires while the finger is still down) and the pressed/LED visuals.

use alloc::boxed::Box;

use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle, RoundedRectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use log::debug;

use crate::framebuffer::FrameBuffer;
use crate::ui::component::{Component, ComponentBase};
use crate::ui::core::{TouchSample, UiContext};
use crate::ui::styling::{BLACK, BLUE, ColorScheme, darken};
use crate::ui::text::{self, BUTTON_FONT, MINI_FONT};

const CORNER_RADIUS: u32 = 5;
const PRESSED_STEPS: u32 = 6;
const LED_HEIGHT: u32 = 5;
const LED_SIDE_MARGIN: u32 = 10;
const LED_BOTTOM_MARGIN: u32 = 3;
const LED_TEXT_GAP: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    /// Emits `Clicked` on every accepted click
    Pushable,
    /// Flips between On and Off and emits the new state
    Toggleable,
}

/// Logical state of a button as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Off,
    On,
    Disabled,
    /// Highlights the button that represents the current mode or page
    CurrentActive,
}

/// What happened to a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEventKind {
    Clicked,
    On,
    Off,
    LongPressed,
}

/// Delivered to a button's callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent<'a> {
    pub id: u8,
    pub label: &'a str,
    pub state: ButtonEventKind,
}

pub type ButtonCallback = Box<dyn FnMut(&ButtonEvent<'_>, &mut UiContext)>;

/// Colours resolved for the state being drawn.
struct StateColors {
    background: Rgb565,
    border: Rgb565,
    text: Rgb565,
    led: Option<Rgb565>,
}

/// Rounded, labelled button.
///
/// A zero width or height in the constructor bounds falls back to
/// [`Button::DEFAULT_WIDTH`] / [`Button::DEFAULT_HEIGHT`].
///
/// ```ignore
/// let beeper = Button::new(3, Rectangle::new(Point::new(10, 10), Size::zero()), "Beeper")
///     .with_kind(ButtonKind::Toggleable)
///     .with_state(ButtonState::On)
///     .with_callback(|event, _ctx| info!("beeper {:?}", event.state));
/// ```
pub struct Button {
    base: ComponentBase,
    id: u8,
    label: heapless::String<32>,
    kind: ButtonKind,
    state: ButtonState,
    mini_font: bool,
    long_press_fired: bool,
    callback: Option<ButtonCallback>,
}

impl Button {
    pub const DEFAULT_WIDTH: u32 = 72;
    pub const DEFAULT_HEIGHT: u32 = 35;
    /// Horizontal padding of an auto-sized button, both sides together.
    pub const TEXT_PADDING: u32 = 16;
    /// Extra hit area around the bounds.
    pub const TOUCH_MARGIN: i32 = 6;

    pub fn new(id: u8, bounds: Rectangle, label: &str) -> Self {
        let size = Size::new(
            if bounds.size.width == 0 {
                Self::DEFAULT_WIDTH
            } else {
                bounds.size.width
            },
            if bounds.size.height == 0 {
                Self::DEFAULT_HEIGHT
            } else {
                bounds.size.height
            },
        );

        Self {
            base: ComponentBase::new(Rectangle::new(bounds.top_left, size)),
            id,
            label: text::bounded(label),
            kind: ButtonKind::Pushable,
            state: ButtonState::Off,
            mini_font: false,
            long_press_fired: false,
            callback: None,
        }
    }

    /// Width a button needs to fit `label`, never narrower than its height
    /// or half the default width.
    pub fn width_for_text(label: &str, mini_font: bool, height: u32) -> u32 {
        let height = if height == 0 { Self::DEFAULT_HEIGHT } else { height };
        (text::text_width(label, Self::font_for(mini_font)) + Self::TEXT_PADDING)
            .max(height)
            .max(Self::DEFAULT_WIDTH / 2)
    }

    pub fn with_kind(mut self, kind: ButtonKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_state(mut self, state: ButtonState) -> Self {
        self.set_state(state);
        self
    }

    pub fn with_colors(mut self, colors: ColorScheme) -> Self {
        self.base.set_colors(colors);
        self
    }

    pub fn with_mini_font(mut self, mini: bool) -> Self {
        self.mini_font = mini;
        self
    }

    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&ButtonEvent<'_>, &mut UiContext) + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Resize the width to fit the label.
    pub fn auto_sized(mut self) -> Self {
        self.fit_width();
        self
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn kind(&self) -> ButtonKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: &str) {
        let label = text::bounded(label);
        if self.label != label {
            self.label = label;
            self.base.mark_for_redraw();
        }
    }

    pub fn set_callback(&mut self, callback: Option<ButtonCallback>) {
        self.callback = callback;
    }

    pub fn state(&self) -> ButtonState {
        if self.base.is_disabled() {
            ButtonState::Disabled
        } else {
            self.state
        }
    }

    /// `On` is coerced to `Off` for pushable buttons. `Disabled` keeps the
    /// logical state underneath so re-enabling restores it.
    pub fn set_state(&mut self, state: ButtonState) {
        match state {
            ButtonState::Disabled => self.set_disabled(true),
            ButtonState::On if self.kind == ButtonKind::Pushable => {
                self.set_logical_state(ButtonState::Off)
            }
            other => self.set_logical_state(other),
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.set_disabled(!enabled);
    }

    pub fn is_enabled(&self) -> bool {
        !self.base.is_disabled()
    }

    fn set_logical_state(&mut self, state: ButtonState) {
        self.set_disabled(false);
        if self.state != state {
            self.state = state;
            self.base.mark_for_redraw();
        }
    }

    fn fit_width(&mut self) {
        let bounds = self.base.bounds();
        let width = Self::width_for_text(&self.label, self.mini_font, bounds.size.height);
        self.base.set_bounds(Rectangle::new(
            bounds.top_left,
            Size::new(width, bounds.size.height),
        ));
    }

    fn font_for(mini: bool) -> &'static MonoFont<'static> {
        if mini { MINI_FONT } else { BUTTON_FONT }
    }

    fn emit(&mut self, state: ButtonEventKind, ctx: &mut UiContext) {
        let Self {
            id,
            label,
            callback,
            ..
        } = self;
        if let Some(callback) = callback.as_mut() {
            let event = ButtonEvent {
                id: *id,
                label: label.as_str(),
                state,
            };
            callback(&event, ctx);
        }
    }

    fn state_colors(&self) -> StateColors {
        let scheme = self.base.colors();
        let toggle_led = |on: bool| {
            (self.kind == ButtonKind::Toggleable).then_some(if on {
                scheme.led_on
            } else {
                scheme.led_off
            })
        };

        if self.base.is_disabled() {
            return StateColors {
                background: scheme.disabled_background,
                border: scheme.disabled_border,
                text: scheme.disabled_foreground,
                led: toggle_led(false),
            };
        }

        if self.base.is_pressed() {
            return StateColors {
                background: scheme.pressed_background,
                border: scheme.pressed_border,
                text: scheme.pressed_foreground,
                led: toggle_led(self.state == ButtonState::On),
            };
        }

        match self.state {
            ButtonState::On => StateColors {
                background: scheme.active_background,
                border: scheme.led_on,
                text: scheme.active_foreground,
                led: toggle_led(true),
            },
            ButtonState::CurrentActive => StateColors {
                background: scheme.active_background,
                border: BLUE,
                text: scheme.active_foreground,
                led: None,
            },
            ButtonState::Off | ButtonState::Disabled => StateColors {
                background: scheme.background,
                border: scheme.border,
                text: scheme.foreground,
                led: toggle_led(false),
            },
        }
    }

    /// Concentric rounded rectangles, each darker than the last.
    fn draw_pressed_effect(&self, fb: &mut FrameBuffer, base_color: Rgb565) {
        let bounds = self.base.bounds();
        let step_w = bounds.size.width / PRESSED_STEPS;
        let step_h = bounds.size.height / PRESSED_STEPS;
        let radius = Size::new(CORNER_RADIUS, CORNER_RADIUS);

        for i in 0..PRESSED_STEPS {
            let rect = Rectangle::new(
                bounds.top_left + Point::new((i * step_w / 2) as i32, (i * step_h / 2) as i32),
                Size::new(
                    bounds.size.width - i * step_w,
                    bounds.size.height - i * step_h,
                ),
            );
            let _ = RoundedRectangle::with_equal_corners(rect, radius)
                .into_styled(PrimitiveStyle::with_fill(darken(base_color, (i * 3) as u8)))
                .draw(fb);
        }
    }
}

impl Component for Button {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn draw(&mut self, fb: &mut FrameBuffer) {
        let colors = self.state_colors();
        let bounds = self.base.bounds();
        let radius = Size::new(CORNER_RADIUS, CORNER_RADIUS);

        if self.base.is_pressed() {
            self.draw_pressed_effect(fb, colors.background);
        } else {
            let _ = RoundedRectangle::with_equal_corners(bounds, radius)
                .into_styled(PrimitiveStyle::with_fill(colors.background))
                .draw(fb);
        }
        let _ = RoundedRectangle::with_equal_corners(bounds, radius)
            .into_styled(PrimitiveStyle::with_stroke(colors.border, 1))
            .draw(fb);

        // The mini font leaves no room for the LED strip
        let led = colors.led.filter(|_| !self.mini_font);
        let led_top = bounds.top_left.y + bounds.size.height as i32
            - (LED_HEIGHT + LED_BOTTOM_MARGIN) as i32;

        if !self.label.is_empty() {
            let font = Self::font_for(self.mini_font);
            let mut text_y = bounds.center().y;
            if led.is_some() {
                let half_text = text::line_height(font) as i32 / 2;
                text_y = text_y.min(led_top - LED_TEXT_GAP - half_text);
            }
            let style = TextStyleBuilder::new()
                .alignment(Alignment::Center)
                .baseline(Baseline::Middle)
                .build();
            let _ = Text::with_text_style(
                &self.label,
                Point::new(bounds.center().x, text_y),
                MonoTextStyle::new(font, colors.text),
                style,
            )
            .draw(fb);
        }

        if let Some(led_color) = led.filter(|c| *c != BLACK) {
            let strip = Rectangle::new(
                Point::new(bounds.top_left.x + LED_SIDE_MARGIN as i32, led_top),
                Size::new(
                    bounds.size.width.saturating_sub(2 * LED_SIDE_MARGIN),
                    LED_HEIGHT,
                ),
            );
            let _ = strip.into_styled(PrimitiveStyle::with_fill(led_color)).draw(fb);
        }

        self.base.mark_drawn();
    }

    fn update(&mut self, ctx: &mut UiContext) {
        if self.long_press_fired || !self.base.is_pressed() {
            return;
        }
        let Some(pressed_at) = self.base.pressed_at() else {
            return;
        };
        if ctx.now().saturating_duration_since(pressed_at) >= ctx.timing().long_press() {
            self.long_press_fired = true;
            debug!(" Button {} ({}) long press", self.id, self.label);
            self.base.mark_for_redraw();
            self.emit(ButtonEventKind::LongPressed, ctx);
        }
    }

    fn touch_margin(&self) -> i32 {
        Self::TOUCH_MARGIN
    }

    fn shows_pressed_feedback(&self) -> bool {
        true
    }

    fn on_touch_down(&mut self, _sample: TouchSample, _ctx: &mut UiContext) {
        self.long_press_fired = false;
    }

    fn on_touch_cancel(&mut self, _sample: TouchSample, _ctx: &mut UiContext) {
        self.long_press_fired = false;
    }

    fn on_click(&mut self, _sample: TouchSample, ctx: &mut UiContext) -> bool {
        if self.long_press_fired {
            self.long_press_fired = false;
            return false;
        }

        let event = match self.kind {
            ButtonKind::Toggleable => {
                self.state = match self.state {
                    ButtonState::On => ButtonState::Off,
                    _ => ButtonState::On,
                };
                if self.state == ButtonState::On {
                    ButtonEventKind::On
                } else {
                    ButtonEventKind::Off
                }
            }
            ButtonKind::Pushable => ButtonEventKind::Clicked,
        };
        debug!(" Button {} ({}) {:?}", self.id, self.label, event);
        self.base.mark_for_redraw();
        self.emit(event, ctx);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::component::tests::ctx_at;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    type Log = Rc<RefCell<Vec<ButtonEventKind>>>;

    fn recording(kind: ButtonKind) -> (Button, Log) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let button = Button::new(7, Rectangle::new(Point::new(100, 100), Size::zero()), "Go")
            .with_kind(kind)
            .with_callback(move |event, _ctx| sink.borrow_mut().push(event.state));
        (button, log)
    }

    fn tap(button: &mut Button, down_ms: u64, up_ms: u64) {
        button.handle_touch(TouchSample::down(120, 110), &mut ctx_at(down_ms));
        button.handle_touch(TouchSample::up(120, 110), &mut ctx_at(up_ms));
    }

    #[test]
    fn test_zero_size_uses_defaults() {
        let (button, _) = recording(ButtonKind::Pushable);
        assert_eq!(
            button.base().bounds().size,
            Size::new(Button::DEFAULT_WIDTH, Button::DEFAULT_HEIGHT)
        );
    }

    #[test]
    fn test_auto_width_has_minimums() {
        // "OK" is 18px wide, plus padding is below the 35px height
        assert_eq!(Button::width_for_text("OK", false, 35), 36);
        assert_eq!(Button::width_for_text("OK", false, 40), 40);
        // 9 chars of 9px + 16 padding
        assert_eq!(Button::width_for_text("Brightnes", false, 35), 97);
    }

    #[test]
    fn test_pushable_click_emits_clicked() {
        let (mut button, log) = recording(ButtonKind::Pushable);
        tap(&mut button, 0, 100);
        assert_eq!(*log.borrow(), [ButtonEventKind::Clicked]);
        assert_eq!(button.state(), ButtonState::Off);
    }

    #[test]
    fn test_toggle_flips_state() {
        let (mut button, log) = recording(ButtonKind::Toggleable);
        tap(&mut button, 0, 100);
        assert_eq!(button.state(), ButtonState::On);
        tap(&mut button, 500, 600);
        assert_eq!(button.state(), ButtonState::Off);
        assert_eq!(*log.borrow(), [ButtonEventKind::On, ButtonEventKind::Off]);
    }

    #[test]
    fn test_debounce_collapses_double_click() {
        let (mut button, log) = recording(ButtonKind::Pushable);
        tap(&mut button, 0, 100);
        tap(&mut button, 150, 250);
        assert_eq!(log.borrow().len(), 1, "second tap inside 200ms window");
        tap(&mut button, 600, 700);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_long_press_suppresses_click() {
        let (mut button, log) = recording(ButtonKind::Pushable);
        button.handle_touch(TouchSample::down(120, 110), &mut ctx_at(0));
        button.update(&mut ctx_at(500));
        assert!(log.borrow().is_empty(), "below threshold");
        button.update(&mut ctx_at(1000));
        button.update(&mut ctx_at(1200));
        button.handle_touch(TouchSample::up(120, 110), &mut ctx_at(1500));
        assert_eq!(*log.borrow(), [ButtonEventKind::LongPressed]);
    }

    #[test]
    fn test_long_press_fires_without_release() {
        let (mut button, log) = recording(ButtonKind::Toggleable);
        button.handle_touch(TouchSample::down(120, 110), &mut ctx_at(0));
        button.update(&mut ctx_at(1100));
        assert_eq!(*log.borrow(), [ButtonEventKind::LongPressed]);
        assert_eq!(button.state(), ButtonState::Off, "long press does not toggle");
    }

    #[test]
    fn test_long_press_resets_for_next_press() {
        let (mut button, log) = recording(ButtonKind::Pushable);
        button.handle_touch(TouchSample::down(120, 110), &mut ctx_at(0));
        button.update(&mut ctx_at(1100));
        button.handle_touch(TouchSample::up(120, 110), &mut ctx_at(1200));
        tap(&mut button, 2000, 2100);
        assert_eq!(
            *log.borrow(),
            [ButtonEventKind::LongPressed, ButtonEventKind::Clicked]
        );
    }

    #[test]
    fn test_margin_extends_hit_area() {
        let (mut button, log) = recording(ButtonKind::Pushable);
        // 4px left of the bounds, inside the 6px margin
        button.handle_touch(TouchSample::down(96, 110), &mut ctx_at(0));
        button.handle_touch(TouchSample::up(96, 110), &mut ctx_at(100));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_disabled_state_round_trip() {
        let (mut button, log) = recording(ButtonKind::Toggleable);
        button.set_state(ButtonState::On);
        button.set_state(ButtonState::Disabled);
        assert_eq!(button.state(), ButtonState::Disabled);
        tap(&mut button, 0, 100);
        assert!(log.borrow().is_empty());

        button.set_enabled(true);
        assert_eq!(button.state(), ButtonState::On, "logical state survives disable");
    }

    #[test]
    fn test_pushable_cannot_be_on() {
        let (mut button, _) = recording(ButtonKind::Pushable);
        button.set_state(ButtonState::On);
        assert_eq!(button.state(), ButtonState::Off);
    }

    #[test]
    fn test_draw_paints_and_clears_flag() {
        let mut fb = FrameBuffer::new();
        let (mut button, _) = recording(ButtonKind::Toggleable);
        button.draw(&mut fb);
        assert!(!button.is_redraw_needed());
        assert_eq!(
            fb.pixel(Point::new(110, 110)),
            Some(ColorScheme::button().background)
        );

        button.handle_touch(TouchSample::down(120, 110), &mut ctx_at(0));
        assert!(button.is_redraw_needed(), "press shows feedback");
    }
}
