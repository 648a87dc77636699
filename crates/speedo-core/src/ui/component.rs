//! The component trait and the shared press/release/click state machine.
//!
//! State machine of every touchable node:
//!
//! ```text
//! Idle --press inside--> Pressed --release--> Clicked | Cancelled --> Idle
//!                           |
//!                           +--held past threshold (update)--> LongPressed (buttons)
//! ```
//!
//! A release is accepted as a click only when it lands within the release
//! tolerance of the bounds, the hold time lies inside the click window and the
//! component's debounce window has elapsed since its last accepted click.
//! Anything else is a silent cancel.

use core::any::Any;

use embassy_time::{Duration, Instant};
use embedded_graphics::primitives::Rectangle;
use log::debug;

use crate::framebuffer::FrameBuffer;
use crate::ui::core::{RectExt, TouchSample, UiContext};
use crate::ui::styling::ColorScheme;

// ---------------------------------------------------------------------------
// ComponentBase
// ---------------------------------------------------------------------------

/// State every component carries.
#[derive(Debug, Clone)]
pub struct ComponentBase {
    bounds: Rectangle,
    colors: ColorScheme,
    disabled: bool,
    pressed: bool,
    needs_redraw: bool,
    pressed_at: Option<Instant>,
    last_click: Option<Instant>,
}

impl ComponentBase {
    pub fn new(bounds: Rectangle) -> Self {
        Self {
            bounds,
            colors: ColorScheme::default(),
            disabled: false,
            pressed: false,
            needs_redraw: true,
            pressed_at: None,
            last_click: None,
        }
    }

    pub fn with_colors(mut self, colors: ColorScheme) -> Self {
        self.colors = colors;
        self
    }

    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Rectangle) {
        if self.bounds != bounds {
            self.bounds = bounds;
            self.needs_redraw = true;
        }
    }

    pub fn colors(&self) -> &ColorScheme {
        &self.colors
    }

    pub fn set_colors(&mut self, colors: ColorScheme) {
        if self.colors != colors {
            self.colors = colors;
            self.needs_redraw = true;
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// When the current press started.
    pub fn pressed_at(&self) -> Option<Instant> {
        self.pressed_at
    }

    pub fn last_click(&self) -> Option<Instant> {
        self.last_click
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    pub fn mark_for_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// Called by the component's own draw once it has painted.
    pub fn mark_drawn(&mut self) {
        self.needs_redraw = false;
    }

    fn set_disabled_flag(&mut self, disabled: bool) {
        if self.disabled != disabled {
            self.disabled = disabled;
            self.needs_redraw = true;
        }
    }

    fn begin_press(&mut self, now: Instant) {
        self.pressed = true;
        self.pressed_at = Some(now);
    }

    /// Leave the pressed state, returning how long the press lasted.
    fn end_press(&mut self, now: Instant) -> Duration {
        self.pressed = false;
        self.pressed_at
            .take()
            .map_or(Duration::from_ticks(0), |start| {
                now.saturating_duration_since(start)
            })
    }

    /// Drop an in-flight press, requesting a repaint if there was one.
    pub(crate) fn cancel_press(&mut self) -> bool {
        if !self.pressed {
            return false;
        }
        self.pressed = false;
        self.pressed_at = None;
        self.needs_redraw = true;
        true
    }

    fn debounce_elapsed(&self, now: Instant, window: Duration) -> bool {
        self.last_click
            .is_none_or(|last| now.saturating_duration_since(last) > window)
    }
}

// ---------------------------------------------------------------------------
// Component trait
// ---------------------------------------------------------------------------

/// A node of the UI tree: drawable, touchable and periodically updatable.
///
/// Only [`Component::base`], [`Component::base_mut`] and [`Component::draw`]
/// are required. The `on_*` hooks customise the default gesture handling in
/// [`process_touch`]; containers override the routing methods themselves.
pub trait Component: Any {
    fn base(&self) -> &ComponentBase;

    fn base_mut(&mut self) -> &mut ComponentBase;

    /// Paint into the framebuffer and clear the own redraw flag.
    fn draw(&mut self, fb: &mut FrameBuffer);

    /// Returns `true` when the sample was claimed.
    fn handle_touch(&mut self, sample: TouchSample, ctx: &mut UiContext) -> bool {
        process_touch(self, sample, ctx)
    }

    /// Periodic hook, called every controller tick regardless of dirty state.
    fn update(&mut self, _ctx: &mut UiContext) {}

    fn is_redraw_needed(&self) -> bool {
        self.base().needs_redraw()
    }

    /// Request a repaint; composites also flag their children when asked.
    fn mark_for_redraw(&mut self, _include_children: bool) {
        self.base_mut().mark_for_redraw();
    }

    /// True while this node (or, for composites, anything below it) is pressed.
    fn is_pressed(&self) -> bool {
        self.base().is_pressed()
    }

    /// Abort an in-flight press without a click.
    fn cancel_press(&mut self) {
        self.base_mut().cancel_press();
    }

    fn is_disabled(&self) -> bool {
        self.base().is_disabled()
    }

    /// Disabling a pressed component cancels the press.
    fn set_disabled(&mut self, disabled: bool) {
        if disabled {
            self.cancel_press();
        }
        self.base_mut().set_disabled_flag(disabled);
    }

    /// Extra pixels around the bounds that still count as a hit.
    fn touch_margin(&self) -> i32 {
        0
    }

    /// Per-component debounce window; `None` uses the configured default.
    fn debounce(&self) -> Option<Duration> {
        None
    }

    /// Whether a press should trigger a repaint (pressed look).
    fn shows_pressed_feedback(&self) -> bool {
        false
    }

    fn on_touch_down(&mut self, _sample: TouchSample, _ctx: &mut UiContext) {}

    fn on_touch_up(&mut self, _sample: TouchSample, _ctx: &mut UiContext) {}

    fn on_touch_cancel(&mut self, _sample: TouchSample, _ctx: &mut UiContext) {}

    /// An accepted click. Returns whether it did anything.
    fn on_click(&mut self, _sample: TouchSample, _ctx: &mut UiContext) -> bool {
        false
    }
}

impl dyn Component {
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        (self as &mut dyn Any).downcast_mut::<T>()
    }
}

// ---------------------------------------------------------------------------
// Gesture state machine
// ---------------------------------------------------------------------------

/// Default touch handling shared by every component.
///
/// Press edges are hit-tested against the bounds plus the component's margin.
/// Release edges are always processed by the pressed component, even when the
/// finger has wandered off, so a press can never get stuck.
pub fn process_touch<C>(component: &mut C, sample: TouchSample, ctx: &mut UiContext) -> bool
where
    C: Component + ?Sized,
{
    if component.is_disabled() {
        return false;
    }

    let point = sample.point();
    let now = ctx.now();

    match (sample.pressed, component.base().is_pressed()) {
        // Press edge
        (true, false) => {
            let margin = component.touch_margin();
            if !component.base().bounds().contains_with_margin(point, margin) {
                return false;
            }
            component.base_mut().begin_press(now);
            if component.shows_pressed_feedback() {
                component.base_mut().mark_for_redraw();
            }
            component.on_touch_down(sample, ctx);
            true
        }
        // Finger still down on the pressed component
        (true, true) => true,
        // Release edge
        (false, true) => {
            let timing = *ctx.timing();
            let held = component.base_mut().end_press(now);
            if component.shows_pressed_feedback() {
                component.base_mut().mark_for_redraw();
            }
            component.on_touch_up(sample, ctx);

            let tolerance = component.touch_margin() + timing.release_tolerance_px as i32;
            let inside = component
                .base()
                .bounds()
                .contains_with_margin(point, tolerance);
            let in_window = held >= timing.min_click() && held <= timing.max_click();
            let window = component.debounce().unwrap_or_else(|| timing.debounce());
            let debounced = component.base().debounce_elapsed(now, window);

            if inside && in_window && debounced {
                component.base_mut().last_click = Some(now);
                component.on_click(sample, ctx);
                true
            } else {
                debug!(
                    " Touch cancelled (inside: {}, held: {} ms, debounced: {})",
                    inside,
                    held.as_millis(),
                    debounced
                );
                component.base_mut().mark_for_redraw();
                component.on_touch_cancel(sample, ctx);
                false
            }
        }
        (false, false) => false,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::GestureTiming;
    use embedded_graphics::prelude::*;

    /// Minimal leaf that counts clicks and cancels.
    pub(crate) struct Probe {
        pub base: ComponentBase,
        pub clicks: u32,
        pub cancels: u32,
    }

    impl Probe {
        pub fn at(x: i32, y: i32) -> Self {
            Self {
                base: ComponentBase::new(Rectangle::new(Point::new(x, y), Size::new(40, 20))),
                clicks: 0,
                cancels: 0,
            }
        }
    }

    impl Component for Probe {
        fn base(&self) -> &ComponentBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ComponentBase {
            &mut self.base
        }

        fn draw(&mut self, _fb: &mut FrameBuffer) {
            self.base.mark_drawn();
        }

        fn on_click(&mut self, _sample: TouchSample, _ctx: &mut UiContext) -> bool {
            self.clicks += 1;
            true
        }

        fn on_touch_cancel(&mut self, _sample: TouchSample, _ctx: &mut UiContext) {
            self.cancels += 1;
        }
    }

    pub(crate) fn ctx_at(ms: u64) -> UiContext {
        UiContext::new(Instant::from_millis(ms), GestureTiming::default())
    }

    fn tap<C: Component>(c: &mut C, x: i32, y: i32, down_ms: u64, up_ms: u64) -> bool {
        c.handle_touch(TouchSample::down(x, y), &mut ctx_at(down_ms));
        c.handle_touch(TouchSample::up(x, y), &mut ctx_at(up_ms))
    }

    #[test]
    fn test_press_and_release_inside_clicks_once() {
        let mut probe = Probe::at(10, 10);
        assert!(tap(&mut probe, 20, 15, 0, 100));
        assert_eq!(probe.clicks, 1);
        assert!(!probe.base.is_pressed(), "back to idle after release");
    }

    #[test]
    fn test_press_outside_is_not_claimed() {
        let mut probe = Probe::at(10, 10);
        assert!(!probe.handle_touch(TouchSample::down(100, 100), &mut ctx_at(0)));
        assert!(!probe.base.is_pressed());
    }

    #[test]
    fn test_drag_off_release_cancels() {
        let mut probe = Probe::at(10, 10);
        probe.handle_touch(TouchSample::down(20, 15), &mut ctx_at(0));
        assert!(!probe.handle_touch(TouchSample::up(200, 200), &mut ctx_at(100)));
        assert_eq!((probe.clicks, probe.cancels), (0, 1));
        assert!(!probe.base.is_pressed(), "cancel returns to idle");
    }

    #[test]
    fn test_release_within_tolerance_still_clicks() {
        let mut probe = Probe::at(10, 10);
        probe.handle_touch(TouchSample::down(20, 15), &mut ctx_at(0));
        // 5px right of the 40px wide bounds, inside the 8px tolerance
        probe.handle_touch(TouchSample::up(55, 15), &mut ctx_at(100));
        assert_eq!(probe.clicks, 1);
    }

    #[test]
    fn test_ghost_and_stuck_presses_are_rejected() {
        let mut probe = Probe::at(10, 10);
        tap(&mut probe, 20, 15, 0, 10);
        tap(&mut probe, 20, 15, 1000, 4000);
        assert_eq!((probe.clicks, probe.cancels), (0, 2));
    }

    #[test]
    fn test_debounce_collapses_fast_double_click() {
        let mut probe = Probe::at(10, 10);
        tap(&mut probe, 20, 15, 0, 100);
        tap(&mut probe, 20, 15, 150, 250);
        assert_eq!(probe.clicks, 1, "second click inside the debounce window");

        tap(&mut probe, 20, 15, 400, 500);
        assert_eq!(probe.clicks, 2, "outside the window both dispatch");
    }

    #[test]
    fn test_disabled_component_ignores_touch() {
        let mut probe = Probe::at(10, 10);
        probe.set_disabled(true);
        assert!(!tap(&mut probe, 20, 15, 0, 100));
        assert_eq!(probe.clicks, 0);
    }

    #[test]
    fn test_disable_mid_press_cancels() {
        let mut probe = Probe::at(10, 10);
        probe.handle_touch(TouchSample::down(20, 15), &mut ctx_at(0));
        probe.base.mark_drawn();
        probe.set_disabled(true);
        assert!(!probe.base.is_pressed());
        assert!(probe.is_redraw_needed(), "cancel requests a repaint");

        probe.set_disabled(false);
        probe.handle_touch(TouchSample::up(20, 15), &mut ctx_at(100));
        assert_eq!(probe.clicks, 0, "release after re-enable is not a click");
    }

    #[test]
    fn test_downcast_through_trait_object() {
        let mut boxed: alloc::boxed::Box<dyn Component> = alloc::boxed::Box::new(Probe::at(0, 0));
        assert!(boxed.downcast_ref::<Probe>().is_some());
        if let Some(probe) = boxed.downcast_mut::<Probe>() {
            probe.clicks = 7;
        }
        assert_eq!(boxed.downcast_ref::<Probe>().map(|p| p.clicks), Some(7));
    }
}
