//! Device settings: toggles, value editors and factory reset

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;
use core::fmt::Write;

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::{debug, warn};

use crate::screens::{SETUP, Screen, ScreenCore};
use crate::settings::{MAX_SCREENSAVER_TIMEOUT_MIN, Settings, SettingsStore, Subscription};
use crate::ui::dialogs::{DialogButtons, DialogResult, MessageDialog, Value, ValueChangeDialog};
use crate::ui::layouts::{ButtonSpec, GroupLayout, layout_horizontal};
use crate::ui::styling::{ColorScheme, GRAY};
use crate::ui::text::TITLE_FONT;
use crate::ui::{
    Button, ButtonEventKind, ButtonState, ChildId, Label, RectExt, UiContext, screen_bounds,
};

const BEEPER_BUTTON_ID: u8 = 1;
const AUTO_BRIGHTNESS_BUTTON_ID: u8 = 2;
const CAMERA_ALARM_BUTTON_ID: u8 = 3;
const BRIGHTNESS_BUTTON_ID: u8 = 4;
const SCREENSAVER_BUTTON_ID: u8 = 5;
const RESET_BUTTON_ID: u8 = 6;
const BACK_BUTTON_ID: u8 = 7;

const BUTTON_WIDTH: u32 = 140;
const BUTTON_HEIGHT: u32 = 45;
const BRIGHTNESS_STEP: u8 = 16;

/// A boolean setting bound to a toggle button.
struct Toggle {
    id: u8,
    label: &'static str,
    get: fn(&Settings) -> bool,
    set: fn(&mut Settings, bool),
}

static TOGGLES: [Toggle; 3] = [
    Toggle {
        id: BEEPER_BUTTON_ID,
        label: "Beeper",
        get: |s| s.beeper_enabled,
        set: |s, on| s.beeper_enabled = on,
    },
    Toggle {
        id: AUTO_BRIGHTNESS_BUTTON_ID,
        label: "Auto Bright",
        get: |s| s.auto_brightness,
        set: |s, on| s.auto_brightness = on,
    },
    Toggle {
        id: CAMERA_ALARM_BUTTON_ID,
        label: "Cam Alarm",
        get: |s| s.speed_camera_alarm,
        set: |s, on| s.speed_camera_alarm = on,
    },
];

fn toggle_state(on: bool) -> ButtonState {
    if on { ButtonState::On } else { ButtonState::Off }
}

fn row(top: i32) -> Rectangle {
    let area = screen_bounds().inset(10);
    Rectangle::new(
        Point::new(area.top_left.x, top),
        Size::new(area.size.width, BUTTON_HEIGHT),
    )
}

pub struct SetupScreen {
    core: ScreenCore,
    settings: SettingsStore,
    /// Set by the store whenever the record changes
    stale: Rc<Cell<bool>>,
    _subscription: Subscription,
    toggles: Vec<(ChildId, fn(&Settings) -> bool)>,
    brightness: ChildId,
    summary: ChildId,
}

impl SetupScreen {
    pub fn new(settings: SettingsStore) -> Self {
        let current = settings.get();
        let mut core = ScreenCore::new(SETUP);
        let root = core.root_mut();

        root.add(
            Label::new(Rectangle::new(Point::new(10, 6), Size::new(200, 24)), "Setup")
                .with_font(TITLE_FONT),
        );

        let toggle_specs = TOGGLES.iter().map(|toggle| {
            let store = settings.clone();
            let set = toggle.set;
            ButtonSpec::new(toggle.id, toggle.label)
                .with_width(BUTTON_WIDTH)
                .with_height(BUTTON_HEIGHT)
                .toggleable(toggle_state((toggle.get)(&current)))
                .on_event(move |event, _ctx| {
                    let on = match event.state {
                        ButtonEventKind::On => true,
                        ButtonEventKind::Off => false,
                        _ => return,
                    };
                    debug!(" Setup: {} -> {}", event.label, on);
                    store.update(|s| set(s, on));
                })
        });
        let layout = GroupLayout::within(row(50)).with_gaps(10, 5).centered();
        let toggle_ids = layout_horizontal(toggle_specs, &layout, root);
        let toggles = toggle_ids
            .into_iter()
            .zip(TOGGLES.iter().map(|t| t.get))
            .collect();

        let editors = [
            ButtonSpec::new(BRIGHTNESS_BUTTON_ID, "Brightness").on_event({
                let store = settings.clone();
                move |event, ctx| {
                    if event.state == ButtonEventKind::Clicked {
                        open_brightness_editor(&store, ctx);
                    }
                }
            }),
            ButtonSpec::new(SCREENSAVER_BUTTON_ID, "Screensaver").on_event({
                let store = settings.clone();
                move |event, ctx| {
                    if event.state == ButtonEventKind::Clicked {
                        open_screensaver_editor(&store, ctx);
                    }
                }
            }),
            ButtonSpec::new(RESET_BUTTON_ID, "Reset")
                .with_colors(ColorScheme::cancel_button())
                .on_event({
                    let store = settings.clone();
                    move |event, ctx| {
                        if event.state == ButtonEventKind::Clicked {
                            confirm_reset(&store, ctx);
                        }
                    }
                }),
        ]
        .map(|spec| spec.with_width(BUTTON_WIDTH).with_height(BUTTON_HEIGHT));
        let layout = GroupLayout::within(row(110)).with_gaps(10, 5).centered();
        let editor_ids = layout_horizontal(editors, &layout, root);
        let brightness = editor_ids[0];

        let summary = root.add(
            Label::new(Rectangle::new(Point::new(10, 180), Size::new(460, 20)), "")
                .with_color(GRAY),
        );

        let back = ButtonSpec::new(BACK_BUTTON_ID, "Back")
            .with_width(100)
            .on_event(|event, ctx| {
                if event.state == ButtonEventKind::Clicked {
                    ctx.go_back();
                }
            });
        let area = screen_bounds().inset(10);
        let bar = Rectangle::new(
            Point::new(area.top_left.x + area.size.width as i32 - 100, area.top_left.y),
            Size::new(100, area.size.height),
        );
        layout_horizontal([back], &GroupLayout::within(bar), root);

        let stale = Rc::new(Cell::new(false));
        let flag = stale.clone();
        let subscription = settings.subscribe(move |_| flag.set(true));

        let mut screen = Self {
            core,
            settings,
            stale,
            _subscription: subscription,
            toggles,
            brightness,
            summary,
        };
        screen.sync();
        screen
    }

    /// Bring every control in line with the store.
    fn sync(&mut self) {
        let settings = self.settings.get();
        let root = self.core.root_mut();

        for (id, get) in &self.toggles {
            if let Some(button) = root.child_mut::<Button>(*id) {
                button.set_state(toggle_state(get(&settings)));
            }
        }
        if let Some(button) = root.child_mut::<Button>(self.brightness) {
            button.set_enabled(!settings.auto_brightness);
        }

        let mut summary: heapless::String<64> = heapless::String::new();
        let _ = write!(summary, "Backlight ");
        let _ = if settings.auto_brightness {
            write!(summary, "auto")
        } else {
            write!(summary, "{}", settings.manual_brightness)
        };
        let _ = match settings.screensaver_timeout_min {
            0 => write!(summary, ", screensaver off"),
            min => write!(summary, ", screensaver after {} min", min),
        };
        if let Some(label) = root.child_mut::<Label>(self.summary) {
            label.set_text(&summary);
        }
    }
}

fn open_brightness_editor(store: &SettingsStore, ctx: &mut UiContext) {
    let level = store.get().manual_brightness;
    let preview = store.clone();
    match ValueChangeDialog::u8("Brightness", level, 0, u8::MAX, BRIGHTNESS_STEP) {
        Ok(editor) => {
            let dialog = editor
                .with_message("Manual backlight level")
                .on_change(move |value, _ctx| {
                    if let Value::U8(level) = value {
                        preview.update(|s| s.manual_brightness = level);
                    }
                })
                .build();
            ctx.show_dialog(dialog);
        }
        Err(err) => warn!(" Brightness editor unavailable: {}", err),
    }
}

fn open_screensaver_editor(store: &SettingsStore, ctx: &mut UiContext) {
    let minutes = i32::from(store.get().screensaver_timeout_min);
    let target = store.clone();
    let max = i32::from(MAX_SCREENSAVER_TIMEOUT_MIN);
    match ValueChangeDialog::int("Screensaver", minutes, 0, max, 1) {
        Ok(editor) => {
            let dialog = editor
                .with_message("Idle minutes, 0 = off")
                .on_change(move |value, _ctx| {
                    if let Value::Int(minutes) = value {
                        let minutes = u8::try_from(minutes).unwrap_or(MAX_SCREENSAVER_TIMEOUT_MIN);
                        target.update(|s| s.screensaver_timeout_min = minutes);
                    }
                })
                .build();
            ctx.show_dialog(dialog);
        }
        Err(err) => warn!(" Screensaver editor unavailable: {}", err),
    }
}

fn confirm_reset(store: &SettingsStore, ctx: &mut UiContext) {
    let store = store.clone();
    let dialog = MessageDialog::new("Restore factory settings?")
        .with_title("Reset")
        .with_buttons(DialogButtons::YesNo)
        .on_result(move |outcome, ctx| {
            if outcome.result != DialogResult::Accepted {
                return;
            }
            store.update(|s| *s = Settings::default());
            ctx.show_dialog(
                MessageDialog::new("Settings restored to defaults")
                    .with_title("Reset")
                    .build(),
            );
        })
        .build();
    ctx.show_dialog(dialog);
}

impl Screen for SetupScreen {
    fn core(&self) -> &ScreenCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ScreenCore {
        &mut self.core
    }

    fn update_content(&mut self, _ctx: &mut UiContext) {
        if self.stale.replace(false) {
            self.sync();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GestureTiming;
    use crate::ui::dialogs::message::{CANCEL_BUTTON_ID, YES_BUTTON_ID};
    use crate::ui::{Component, Container, TouchSample};
    use embassy_time::Instant;

    fn ctx(ms: u64) -> UiContext {
        UiContext::new(Instant::from_millis(ms), GestureTiming::default())
    }

    fn center_of(container: &Container, id: u8) -> Point {
        container
            .child_ids()
            .filter_map(|child| container.child::<Button>(child))
            .find(|b| b.id() == id)
            .map(|b| b.base().bounds().center())
            .expect("button exists")
    }

    fn tap(screen: &mut SetupScreen, at: Point, ms: u64) {
        screen.handle_touch(TouchSample::down(at.x, at.y), &mut ctx(ms));
        screen.handle_touch(TouchSample::up(at.x, at.y), &mut ctx(ms + 100));
    }

    fn tap_root(screen: &mut SetupScreen, id: u8, ms: u64) {
        let at = center_of(screen.core().root(), id);
        tap(screen, at, ms);
    }

    fn tap_dialog(screen: &mut SetupScreen, id: u8, ms: u64) {
        let dialog = screen.core().dialogs().top().expect("dialog open");
        let at = center_of(dialog.container(), id);
        tap(screen, at, ms);
    }

    fn button(screen: &SetupScreen, id: u8) -> &Button {
        let root = screen.core().root();
        root.child_ids()
            .filter_map(|child| root.child::<Button>(child))
            .find(|b| b.id() == id)
            .expect("button exists")
    }

    #[test]
    fn test_toggle_writes_store() {
        let store = SettingsStore::default();
        let mut screen = SetupScreen::new(store.clone());
        assert_eq!(button(&screen, BEEPER_BUTTON_ID).state(), ButtonState::On);

        tap_root(&mut screen, BEEPER_BUTTON_ID, 0);
        assert!(!store.get().beeper_enabled);
        assert_eq!(button(&screen, BEEPER_BUTTON_ID).state(), ButtonState::Off);
    }

    #[test]
    fn test_external_change_resyncs_controls() {
        let store = SettingsStore::default();
        let mut screen = SetupScreen::new(store.clone());
        assert!(!button(&screen, BRIGHTNESS_BUTTON_ID).is_enabled(), "auto brightness on");

        store.update(|s| {
            s.auto_brightness = false;
            s.speed_camera_alarm = false;
        });
        screen.update(&mut ctx(0));
        assert!(button(&screen, BRIGHTNESS_BUTTON_ID).is_enabled());
        assert_eq!(button(&screen, CAMERA_ALARM_BUTTON_ID).state(), ButtonState::Off);
    }

    #[test]
    fn test_brightness_cancel_restores_level() {
        let store = SettingsStore::new(Settings {
            auto_brightness: false,
            manual_brightness: 100,
            ..Settings::default()
        });
        let mut screen = SetupScreen::new(store.clone());
        tap_root(&mut screen, BRIGHTNESS_BUTTON_ID, 0);
        assert!(screen.core().is_dialog_active());

        tap_dialog(&mut screen, crate::ui::dialogs::value_change::INCREMENT_BUTTON_ID, 1000);
        assert_eq!(store.get().manual_brightness, 116, "live preview");

        tap_dialog(&mut screen, CANCEL_BUTTON_ID, 2000);
        assert!(!screen.core().is_dialog_active());
        assert_eq!(store.get().manual_brightness, 100);
    }

    #[test]
    fn test_reset_confirms_then_informs() {
        let store = SettingsStore::new(Settings {
            beeper_enabled: false,
            screensaver_timeout_min: 30,
            ..Settings::default()
        });
        let mut screen = SetupScreen::new(store.clone());
        tap_root(&mut screen, RESET_BUTTON_ID, 0);
        tap_dialog(&mut screen, YES_BUTTON_ID, 1000);

        assert_eq!(store.get(), Settings::default());
        let info = screen.core().dialogs().top().expect("info dialog");
        assert_eq!(screen.core().dialogs().len(), 1, "confirmation gone");
        assert_eq!(info.title(), Some("Reset"));

        screen.update(&mut ctx(2000));
        assert_eq!(button(&screen, BEEPER_BUTTON_ID).state(), ButtonState::Off, "paused under modal");
    }

    #[test]
    fn test_dropping_screen_unsubscribes() {
        let store = SettingsStore::default();
        let screen = SetupScreen::new(store.clone());
        assert_eq!(store.subscriber_count(), 1);
        drop(screen);
        assert_eq!(store.subscriber_count(), 0);
    }
}
