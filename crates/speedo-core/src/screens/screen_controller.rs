//! Screen controller with navigation and idle handling.
//!
//! Owns the one active screen and builds a fresh instance from the registry
//! on every switch. Navigation requested from inside a dispatch (through
//! [`UiContext::switch_to_screen`] / [`UiContext::go_back`]) is queued and
//! carried out at the start of the next [`ScreenController::tick`], once no
//! callback of the old screen is running any more.

use alloc::boxed::Box;
use alloc::collections::{BTreeMap, VecDeque};
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::mem;

use embassy_time::Instant;
use log::{debug, info, warn};

use crate::config::UiConfig;
use crate::error::NavigationError;
use crate::framebuffer::FrameBuffer;
use crate::live_data::LiveData;
use crate::screens::{
    MAIN, MainScreen, SATS, SCREEN_SAVER, SatsScreen, Screen, ScreenSaverScreen, SETUP,
    SetupScreen,
};
use crate::settings::SettingsStore;
use crate::ui::core::NavRequest;
use crate::ui::{TouchSample, UiContext};

/// Builds a fresh screen instance.
pub type ScreenFactory = Box<dyn Fn() -> Box<dyn Screen>>;

/// Manages the active screen, navigation and the screensaver.
pub struct ScreenController {
    config: UiConfig,
    factories: BTreeMap<String, ScreenFactory>,
    current: Option<Box<dyn Screen>>,
    navigation_stack: Vec<String>,
    /// Last screen left by an ordinary switch, for back-navigation with an
    /// empty stack
    previous_screen: Option<String>,
    /// Screen to return to when the screensaver ends
    screensaver_return: Option<String>,
    deferred: VecDeque<NavRequest>,
    now: Instant,
    last_activity: Instant,
    speed_kmh: f32,
}

impl ScreenController {
    pub fn new(config: UiConfig) -> Self {
        Self {
            config,
            factories: BTreeMap::new(),
            current: None,
            navigation_stack: Vec::new(),
            previous_screen: None,
            screensaver_return: None,
            deferred: VecDeque::new(),
            now: Instant::from_ticks(0),
            last_activity: Instant::from_ticks(0),
            speed_kmh: 0.0,
        }
    }

    /// Controller with `Main`, `Sats`, `Setup` and `ScreenSaver` registered.
    /// No screen is active until the first switch.
    pub fn with_default_screens(
        config: UiConfig,
        live: Rc<dyn LiveData>,
        settings: SettingsStore,
    ) -> Self {
        let mut controller = Self::new(config);

        let data = live.clone();
        controller.register(MAIN, move || Box::new(MainScreen::new(data.clone())));
        let data = live.clone();
        controller.register(SATS, move || Box::new(SatsScreen::new(data.clone())));
        controller.register(SETUP, move || Box::new(SetupScreen::new(settings.clone())));
        controller.register(SCREEN_SAVER, move || {
            Box::new(ScreenSaverScreen::new(live.clone()))
        });
        controller
    }

    /// Register (or replace) the factory for `name`.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Screen> + 'static,
    {
        self.factories.insert(String::from(name), Box::new(factory));
    }

    pub fn config(&self) -> &UiConfig {
        &self.config
    }

    /// Change the idle timeout; zero switches the screensaver off.
    pub fn set_idle_timeout_secs(&mut self, secs: u32) {
        if self.config.idle_timeout_secs != secs {
            info!(" Idle timeout set to {} s", secs);
            self.config.idle_timeout_secs = secs;
        }
    }

    pub fn current_screen(&self) -> Option<&dyn Screen> {
        self.current.as_deref()
    }

    pub fn current_screen_mut(&mut self) -> Option<&mut (dyn Screen + 'static)> {
        self.current.as_deref_mut()
    }

    pub fn current_screen_name(&self) -> Option<&'static str> {
        self.current.as_ref().map(|s| s.name())
    }

    pub fn navigation_depth(&self) -> usize {
        self.navigation_stack.len()
    }

    pub fn is_screensaver_active(&self) -> bool {
        self.current_screen_name() == Some(SCREEN_SAVER)
    }

    pub fn is_dialog_active(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|s| s.core().is_dialog_active())
    }

    pub fn has_pending_navigation(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Latest speed from the GPS; drives the screensaver.
    pub fn report_speed(&mut self, kmh: f32) {
        self.speed_kmh = kmh;
    }

    /// Switch now. Logs and returns `false` if `name` is not registered.
    pub fn switch_to_screen(&mut self, name: &str) -> bool {
        match self.try_switch_to_screen(name) {
            Ok(()) => true,
            Err(err) => {
                warn!(" Switch to '{}' failed: {}", name, err);
                false
            }
        }
    }

    pub fn try_switch_to_screen(&mut self, name: &str) -> Result<(), NavigationError> {
        self.immediate_switch(name, false)
    }

    /// Navigate back now. Logs and returns `false` if there is nowhere to go.
    pub fn go_back(&mut self) -> bool {
        match self.try_go_back() {
            Ok(()) => true,
            Err(err) => {
                warn!(" Go back failed: {}", err);
                false
            }
        }
    }

    /// Back-navigation order: out of the screensaver to the screen it
    /// replaced, then the navigation stack, then the previous screen.
    pub fn try_go_back(&mut self) -> Result<(), NavigationError> {
        if self.is_screensaver_active() {
            if let Some(name) = self.screensaver_return.take() {
                return self.immediate_switch(&name, true);
            }
        }
        if let Some(name) = self.navigation_stack.pop() {
            debug!(
                " Going back to '{}' ({} left on stack)",
                name,
                self.navigation_stack.len()
            );
            return self.immediate_switch(&name, true);
        }
        if let Some(name) = self.previous_screen.clone() {
            debug!(" Going back to previous screen '{}'", name);
            return self.immediate_switch(&name, true);
        }
        Err(NavigationError::NothingToGoBackTo)
    }

    /// Route one touch sample to the active screen.
    pub fn handle_touch(&mut self, sample: TouchSample, now: Instant) -> bool {
        self.now = now;
        if sample.pressed {
            self.last_activity = now;
        }
        let mut ctx = self.context();
        let Some(screen) = self.current.as_mut() else {
            return false;
        };
        let claimed = screen.handle_touch(sample, &mut ctx);
        let requests = screen.core_mut().take_navigation();
        self.deferred.extend(requests);
        claimed
    }

    /// One controller cycle: queued navigation, idle check, periodic update.
    pub fn tick(&mut self, now: Instant) {
        self.now = now;
        self.process_deferred();
        self.check_idle();

        let mut ctx = self.context();
        if let Some(screen) = self.current.as_mut() {
            screen.update(&mut ctx);
            let requests = screen.core_mut().take_navigation();
            self.deferred.extend(requests);
        }
    }

    /// Repaint the active screen if anything on it changed. Returns whether
    /// something was drawn.
    pub fn draw(&mut self, fb: &mut FrameBuffer) -> bool {
        match self.current.as_mut() {
            Some(screen) if screen.is_redraw_needed() => {
                screen.draw(fb);
                true
            }
            _ => false,
        }
    }

    fn context(&self) -> UiContext {
        UiContext::new(self.now, self.config.gesture)
    }

    /// Execute the requests queued so far, oldest first. Requests queued while
    /// draining wait for the next tick.
    fn process_deferred(&mut self) {
        let batch = mem::take(&mut self.deferred);
        for request in batch {
            debug!(" Processing deferred {:?}", request);
            match request {
                NavRequest::SwitchTo(name) => {
                    self.switch_to_screen(&name);
                }
                NavRequest::GoBack => {
                    self.go_back();
                }
            }
        }
    }

    fn check_idle(&mut self) {
        if self.speed_kmh > self.config.motion_threshold_kmh {
            self.last_activity = self.now;
            if self.is_screensaver_active() {
                // Without a recorded origin the screensaver was entered
                // directly; Main is the way out
                let target = self
                    .screensaver_return
                    .clone()
                    .unwrap_or_else(|| String::from(MAIN));
                info!(" Motion detected, leaving screensaver for '{}'", target);
                if let Err(err) = self.immediate_switch(&target, true) {
                    debug!(" Leaving screensaver failed: {}", err);
                    self.screensaver_return = None;
                }
            }
            return;
        }

        let Some(timeout) = self.config.idle_timeout() else {
            return;
        };
        if self.current.is_none()
            || self.is_screensaver_active()
            || self.is_dialog_active()
            || !self.factories.contains_key(SCREEN_SAVER)
        {
            return;
        }
        if self.now.saturating_duration_since(self.last_activity) >= timeout {
            info!(" Idle for {} s, starting screensaver", timeout.as_secs());
            self.switch_to_screen(SCREEN_SAVER);
        }
    }

    /// Replace the active screen with a fresh `name`.
    ///
    /// Transitions into or out of the screensaver never touch the navigation
    /// stack; the screen it replaced is remembered separately.
    fn immediate_switch(&mut self, name: &str, back: bool) -> Result<(), NavigationError> {
        if self.current_screen_name() == Some(name) {
            return Ok(());
        }
        let mut next = match self.factories.get(name) {
            Some(factory) => factory(),
            None => return Err(NavigationError::UnknownScreen(String::from(name))),
        };

        let entering_saver = name == SCREEN_SAVER;
        if let Some(mut old) = self.current.take() {
            let old_name = old.name();
            let leaving_saver = old_name == SCREEN_SAVER;
            if entering_saver {
                self.screensaver_return = Some(String::from(old_name));
            } else if leaving_saver {
                self.screensaver_return = None;
            } else {
                if !back {
                    self.navigation_stack.push(String::from(old_name));
                }
                self.previous_screen = Some(String::from(old_name));
            }
            old.deactivate();
            debug!(" Dropped screen '{}'", old_name);
        }

        if !entering_saver {
            self.last_activity = self.now;
        }

        let mut ctx = self.context();
        next.activate(&mut ctx);
        let commands = ctx.take_commands();
        next.core_mut().apply(commands, &ctx);
        self.deferred.extend(next.core_mut().take_navigation());
        next.core_mut().request_full_repaint();
        self.current = Some(next);

        info!(
            " Switched to '{}' (stack depth {})",
            name,
            self.navigation_stack.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GestureTiming;
    use crate::live_data::SharedLiveData;
    use crate::screens::ScreenCore;
    use crate::ui::components::{Button, ButtonEventKind};
    use crate::ui::dialogs::{Dialog, DialogGeometry, DialogResult, MessageDialog};
    use crate::ui::Component;
    use core::cell::{Cell, RefCell};
    use embedded_graphics::prelude::*;
    use embedded_graphics::primitives::Rectangle;

    const BUTTON_AT: Point = Point::new(100, 100);

    /// Screen with one button whose click handler is supplied by the test.
    struct Stub {
        core: ScreenCore,
    }

    impl Stub {
        fn new<F>(name: &'static str, on_click: F) -> Self
        where
            F: FnMut(&mut UiContext) + 'static,
        {
            let mut on_click = on_click;
            let mut core = ScreenCore::new(name);
            let _ = core.root_mut().add(
                Button::new(1, Rectangle::new(BUTTON_AT, Size::new(80, 40)), name).with_callback(
                    move |event, ctx| {
                        if event.state == ButtonEventKind::Clicked {
                            on_click(ctx);
                        }
                    },
                ),
            );
            Self { core }
        }
    }

    impl Screen for Stub {
        fn core(&self) -> &ScreenCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut ScreenCore {
            &mut self.core
        }
    }

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn tap(controller: &mut ScreenController, down_ms: u64) {
        let p = BUTTON_AT + Point::new(10, 10);
        controller.handle_touch(TouchSample::down(p.x, p.y), at(down_ms));
        controller.handle_touch(TouchSample::up(p.x, p.y), at(down_ms + 100));
    }

    fn plain_controller(names: &[&'static str]) -> ScreenController {
        let mut controller = ScreenController::new(UiConfig::default());
        for &name in names {
            controller.register(name, move || Box::new(Stub::new(name, |_| {})));
        }
        controller
    }

    #[test]
    fn test_click_on_main_fires_once() {
        let clicks = Rc::new(Cell::new(0));
        let mut controller = ScreenController::new(UiConfig::default());
        let counter = clicks.clone();
        controller.register(MAIN, move || {
            let counter = counter.clone();
            Box::new(Stub::new(MAIN, move |_| counter.set(counter.get() + 1)))
        });
        assert!(controller.switch_to_screen(MAIN));

        tap(&mut controller, 0);
        controller.tick(at(200));
        assert_eq!(clicks.get(), 1);
        let root = controller.current_screen().expect("active screen").core().root();
        let pressed = root
            .child_ids()
            .filter_map(|id| root.child::<Button>(id))
            .any(|b| b.is_pressed());
        assert!(!pressed, "press finished");
    }

    #[test]
    fn test_unknown_screen_leaves_state_untouched() {
        let mut controller = plain_controller(&[MAIN]);
        controller.switch_to_screen(MAIN);
        assert_eq!(
            controller.try_switch_to_screen("Nope"),
            Err(NavigationError::UnknownScreen(String::from("Nope")))
        );
        assert!(!controller.switch_to_screen("Nope"));
        assert_eq!(controller.current_screen_name(), Some(MAIN));
        assert_eq!(controller.navigation_depth(), 0);
    }

    #[test]
    fn test_go_back_with_nothing_to_return_to() {
        let mut controller = plain_controller(&[MAIN]);
        assert!(!controller.go_back(), "no screen at all");
        controller.switch_to_screen(MAIN);
        assert_eq!(controller.try_go_back(), Err(NavigationError::NothingToGoBackTo));
        assert_eq!(controller.current_screen_name(), Some(MAIN));
    }

    #[test]
    fn test_back_stack_and_previous_fallback() {
        let mut controller = plain_controller(&[MAIN, SETUP, SATS]);
        controller.switch_to_screen(MAIN);
        controller.switch_to_screen(SETUP);
        controller.switch_to_screen(SATS);
        assert_eq!(controller.navigation_depth(), 2);

        assert!(controller.go_back());
        assert_eq!(controller.current_screen_name(), Some(SETUP));
        assert!(controller.go_back());
        assert_eq!(controller.current_screen_name(), Some(MAIN));
        assert_eq!(controller.navigation_depth(), 0);

        // Stack exhausted: fall back to the screen left last
        assert!(controller.go_back());
        assert_eq!(controller.current_screen_name(), Some(SETUP));
    }

    #[test]
    fn test_switch_to_current_is_noop() {
        let mut controller = plain_controller(&[MAIN]);
        controller.switch_to_screen(MAIN);
        assert!(controller.switch_to_screen(MAIN));
        assert_eq!(controller.navigation_depth(), 0);
    }

    #[test]
    fn test_navigation_from_callback_waits_for_next_tick() {
        let mut controller = ScreenController::new(UiConfig::default());
        controller.register(MAIN, || Box::new(Stub::new(MAIN, |ctx| ctx.switch_to_screen(SETUP))));
        controller.register(SETUP, || Box::new(Stub::new(SETUP, |_| {})));
        controller.switch_to_screen(MAIN);

        tap(&mut controller, 0);
        assert_eq!(controller.current_screen_name(), Some(MAIN), "still inside the old screen");
        assert!(controller.has_pending_navigation());

        controller.tick(at(150));
        assert_eq!(controller.current_screen_name(), Some(SETUP));
        assert_eq!(controller.navigation_depth(), 1);
    }

    #[test]
    fn test_deferred_requests_run_in_order() {
        let visited = Rc::new(RefCell::new(Vec::new()));
        let mut controller = ScreenController::new(UiConfig::default());
        for name in [MAIN, "A", "B", "C"] {
            let log = visited.clone();
            controller.register(name, move || {
                log.borrow_mut().push(name);
                Box::new(Stub::new(name, |ctx| {
                    ctx.switch_to_screen("A");
                    ctx.switch_to_screen("B");
                    ctx.switch_to_screen("C");
                }))
            });
        }
        controller.switch_to_screen(MAIN);
        tap(&mut controller, 0);
        controller.tick(at(150));

        assert_eq!(*visited.borrow(), [MAIN, "A", "B", "C"]);
        assert_eq!(controller.navigation_depth(), 3, "Main, A and B stacked");
        assert!(!controller.has_pending_navigation());
    }

    #[test]
    fn test_chained_dialogs_return_to_first() {
        let second = Rc::new(Cell::new(None));
        let mut controller = ScreenController::new(UiConfig::default());
        let sink = second.clone();
        controller.register(MAIN, move || {
            let sink = sink.clone();
            Box::new(Stub::new(MAIN, move |ctx| {
                let sink = sink.clone();
                let first = MessageDialog::new("First")
                    .with_title("D1")
                    .ok_closes_dialog(false)
                    .on_button(move |_, ctx| {
                        let d2 = Dialog::new(Some("D2"), DialogGeometry::sized(200, 100));
                        sink.set(Some(ctx.show_dialog(d2)));
                    })
                    .build();
                ctx.show_dialog(first);
            }))
        });
        controller.switch_to_screen(MAIN);
        tap(&mut controller, 0);

        let screen = controller.current_screen().expect("screen");
        let d1 = screen.core().dialogs().top_id().expect("D1 open");

        // OK of D1 sits at the bottom centre of the dialog
        let ok = screen
            .core()
            .dialogs()
            .top()
            .and_then(|d| {
                d.container()
                    .child_ids()
                    .filter_map(|id| d.container().child::<Button>(id))
                    .find(|b| b.label() == "OK")
                    .map(|b| b.base().bounds().center())
            })
            .expect("OK button");
        controller.handle_touch(TouchSample::down(ok.x, ok.y), at(1000));
        controller.handle_touch(TouchSample::up(ok.x, ok.y), at(1100));

        let d2 = second.get().expect("D2 opened from D1's callback");
        let screen = controller.current_screen_mut().expect("screen");
        assert_eq!(screen.core().dialogs().top_id(), Some(d2));

        let ctx = UiContext::new(at(1200), GestureTiming::default());
        screen
            .core_mut()
            .close_dialog(d2, DialogResult::Accepted, None, &ctx);
        assert_eq!(screen.core().dialogs().top_id(), Some(d1), "D1 active again");
        let top = screen.core().dialogs().top().expect("D1");
        assert!(top.is_top());
        assert!(top.is_redraw_needed(), "D1 repainted after D2 is gone");
    }

    #[test]
    fn test_screensaver_after_idle_timeout_and_exit_on_motion() {
        let live: Rc<dyn LiveData> = Rc::new(SharedLiveData::new());
        let mut controller = ScreenController::with_default_screens(
            UiConfig::default(),
            live,
            SettingsStore::default(),
        );
        controller.switch_to_screen(MAIN);
        controller.switch_to_screen(SETUP);
        controller.report_speed(0.0);

        controller.tick(at(59_000));
        assert_eq!(controller.current_screen_name(), Some(SETUP));
        controller.tick(at(61_000));
        assert!(controller.is_screensaver_active());
        assert_eq!(controller.navigation_depth(), 1, "screensaver not stacked");

        controller.report_speed(30.0);
        controller.tick(at(62_000));
        assert_eq!(controller.current_screen_name(), Some(SETUP));
        assert_eq!(controller.navigation_depth(), 1);
    }

    #[test]
    fn test_held_touch_on_screensaver_keeps_back_stack() {
        let live: Rc<dyn LiveData> = Rc::new(SharedLiveData::new());
        let mut controller = ScreenController::with_default_screens(
            UiConfig::default(),
            live,
            SettingsStore::default(),
        );
        controller.switch_to_screen(MAIN);
        controller.switch_to_screen(SETUP);
        controller.tick(at(61_000));
        assert!(controller.is_screensaver_active());

        // Two pressed samples before the next tick, as from a held finger
        controller.handle_touch(TouchSample::down(300, 200), at(62_000));
        controller.handle_touch(TouchSample::down(301, 200), at(62_020));
        controller.tick(at(62_030));
        assert_eq!(controller.current_screen_name(), Some(SETUP));
        assert_eq!(controller.navigation_depth(), 1);
        assert!(!controller.has_pending_navigation());
    }

    #[test]
    fn test_motion_leaves_screensaver_entered_directly() {
        let mut controller = plain_controller(&[MAIN, SETUP, SCREEN_SAVER]);
        controller.switch_to_screen(SCREEN_SAVER);
        controller.report_speed(30.0);
        controller.tick(at(1_000));
        assert_eq!(controller.current_screen_name(), Some(MAIN));
        assert_eq!(controller.navigation_depth(), 0);

        controller.tick(at(1_030));
        assert_eq!(controller.current_screen_name(), Some(MAIN), "left once, stays put");
    }

    #[test]
    fn test_touch_and_motion_reset_idle_timer() {
        let mut controller = plain_controller(&[MAIN, SCREEN_SAVER]);
        controller.switch_to_screen(MAIN);

        controller.handle_touch(TouchSample::down(1, 1), at(50_000));
        controller.handle_touch(TouchSample::up(1, 1), at(50_050));
        controller.tick(at(61_000));
        assert_eq!(controller.current_screen_name(), Some(MAIN), "touch reset the timer");

        controller.report_speed(50.0);
        controller.tick(at(200_000));
        assert_eq!(controller.current_screen_name(), Some(MAIN), "no screensaver while moving");

        controller.report_speed(0.0);
        controller.tick(at(259_000));
        assert_eq!(controller.current_screen_name(), Some(MAIN));
        controller.tick(at(260_000));
        assert!(controller.is_screensaver_active());
    }

    #[test]
    fn test_zero_timeout_disables_screensaver() {
        let mut controller = plain_controller(&[MAIN, SCREEN_SAVER]);
        controller.set_idle_timeout_secs(0);
        controller.switch_to_screen(MAIN);
        controller.tick(at(10_000_000));
        assert_eq!(controller.current_screen_name(), Some(MAIN));
    }

    #[test]
    fn test_draw_only_when_needed() {
        let live: Rc<dyn LiveData> = Rc::new(SharedLiveData::new());
        let mut controller =
            ScreenController::with_default_screens(UiConfig::default(), live, SettingsStore::default());
        let mut fb = FrameBuffer::new();
        assert!(!controller.draw(&mut fb), "no screen yet");

        controller.switch_to_screen(SATS);
        controller.tick(at(0));
        assert!(controller.draw(&mut fb));
        controller.tick(at(10));
        assert!(!controller.draw(&mut fb), "nothing changed");
    }
}
