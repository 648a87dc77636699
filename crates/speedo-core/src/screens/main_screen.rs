//! Speed readout with fix status and clock

use alloc::rc::Rc;
use core::fmt::Write;

use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, PrimitiveStyleBuilder, Rectangle};
use embedded_graphics::text::Alignment;

use crate::framebuffer::FrameBuffer;
use crate::live_data::{GpsSnapshot, LiveData};
use crate::screens::{MAIN, SATS, SETUP, Screen, ScreenCore};
use crate::ui::layouts::{ButtonSpec, GroupLayout, layout_horizontal};
use crate::ui::styling::{DARK_GRAY, GRAY, GREEN, MAROON, SPEED_ACCENT};
use crate::ui::text::{BODY_FONT, LARGE_FONT};
use crate::ui::{ButtonEventKind, ChildId, Label, RectExt, UiContext, screen_bounds};

const SATS_BUTTON_ID: u8 = 1;
const SETUP_BUTTON_ID: u8 = 2;

/// Speed at which the gauge is full.
const GAUGE_FULL_SCALE_KMH: f32 = 200.0;
const GAUGE: Rectangle = Rectangle::new(Point::new(40, 180), Size::new(400, 24));

pub struct MainScreen {
    core: ScreenCore,
    live: Rc<dyn LiveData>,
    speed: ChildId,
    fix: ChildId,
    satellites: ChildId,
    time: ChildId,
    /// Filled width of the gauge as last drawn
    gauge_drawn: Option<u32>,
    gauge_fill: u32,
}

impl MainScreen {
    pub fn new(live: Rc<dyn LiveData>) -> Self {
        let mut core = ScreenCore::new(MAIN);
        let root = core.root_mut();

        let fix = root.add(Label::new(
            Rectangle::new(Point::new(10, 8), Size::new(150, 20)),
            "NO FIX",
        ));
        let satellites = root.add(
            Label::new(Rectangle::new(Point::new(165, 8), Size::new(150, 20)), "")
                .with_alignment(Alignment::Center),
        );
        let time = root.add(
            Label::new(Rectangle::new(Point::new(320, 8), Size::new(150, 20)), "")
                .with_alignment(Alignment::Right),
        );
        let speed = root.add(
            Label::new(Rectangle::new(Point::new(0, 100), Size::new(480, 40)), "0")
                .with_font(LARGE_FONT)
                .with_color(SPEED_ACCENT)
                .with_alignment(Alignment::Center),
        );
        root.add(
            Label::new(Rectangle::new(Point::new(0, 140), Size::new(480, 20)), "km/h")
                .with_font(BODY_FONT)
                .with_color(GRAY)
                .with_alignment(Alignment::Center),
        );

        let specs = [(SATS_BUTTON_ID, "Sats", SATS), (SETUP_BUTTON_ID, "Setup", SETUP)]
            .map(|(id, label, target)| {
                ButtonSpec::new(id, label)
                    .with_width(120)
                    .on_event(move |event, ctx| {
                        if event.state == ButtonEventKind::Clicked {
                            ctx.switch_to_screen(target);
                        }
                    })
            });
        let layout = GroupLayout::within(screen_bounds().inset(10))
            .with_gaps(20, 5)
            .centered();
        layout_horizontal(specs, &layout, root);

        let mut screen = Self {
            core,
            live,
            speed,
            fix,
            satellites,
            time,
            gauge_drawn: None,
            gauge_fill: 0,
        };
        let snapshot = screen.live.snapshot();
        screen.show(&snapshot);
        screen
    }

    /// Push a snapshot into the readouts; only changed labels repaint.
    fn show(&mut self, snapshot: &GpsSnapshot) {
        let mut speed: heapless::String<16> = heapless::String::new();
        let _ = write!(speed, "{:.0}", snapshot.speed_kmh.max(0.0));

        let mut sats: heapless::String<24> = heapless::String::new();
        let _ = write!(
            sats,
            "Sats {}/{}",
            snapshot.tracked_count(),
            snapshot.satellites.len()
        );

        let mut time: heapless::String<16> = heapless::String::new();
        match snapshot.time {
            Some(t) => {
                let _ = write!(time, "{:02}:{:02}:{:02} UTC", t.hour, t.minute, t.second);
            }
            None => {
                let _ = time.push_str("--:--:--");
            }
        }

        let (fix_text, fix_color) = if snapshot.valid {
            ("FIX", GREEN)
        } else {
            ("NO FIX", MAROON)
        };

        let root = self.core.root_mut();
        if let Some(label) = root.child_mut::<Label>(self.speed) {
            label.set_text(&speed);
        }
        if let Some(label) = root.child_mut::<Label>(self.satellites) {
            label.set_text(&sats);
        }
        if let Some(label) = root.child_mut::<Label>(self.time) {
            label.set_text(&time);
        }
        if let Some(label) = root.child_mut::<Label>(self.fix) {
            label.set_text(fix_text);
            label.set_color(fix_color);
        }

        let ratio = (snapshot.speed_kmh / GAUGE_FULL_SCALE_KMH).clamp(0.0, 1.0);
        self.gauge_fill = (ratio * GAUGE.size.width as f32) as u32;
    }
}

impl Screen for MainScreen {
    fn core(&self) -> &ScreenCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ScreenCore {
        &mut self.core
    }

    fn update_content(&mut self, _ctx: &mut UiContext) {
        let snapshot = self.live.snapshot();
        self.show(&snapshot);
    }

    fn content_needs_redraw(&self) -> bool {
        self.gauge_drawn != Some(self.gauge_fill)
    }

    fn draw_content(&mut self, fb: &mut FrameBuffer, _force: bool) {
        let frame = PrimitiveStyleBuilder::new()
            .stroke_color(GRAY)
            .stroke_width(1)
            .fill_color(DARK_GRAY)
            .build();
        let _ = GAUGE.into_styled(frame).draw(fb);

        let inner = GAUGE.inset(2);
        let fill = self.gauge_fill.min(inner.size.width);
        if fill > 0 {
            let _ = Rectangle::new(inner.top_left, Size::new(fill, inner.size.height))
                .into_styled(PrimitiveStyle::with_fill(SPEED_ACCENT))
                .draw(fb);
        }
        self.gauge_drawn = Some(self.gauge_fill);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GestureTiming;
    use crate::live_data::{SharedLiveData, TimeOfDay};
    use crate::ui::{Component, TouchSample};
    use crate::ui::components::Button;
    use embassy_time::Instant;

    fn ctx(ms: u64) -> UiContext {
        UiContext::new(Instant::from_millis(ms), GestureTiming::default())
    }

    fn label_text(screen: &MainScreen, id: ChildId) -> &str {
        screen
            .core()
            .root()
            .child::<Label>(id)
            .map(|l| l.text())
            .unwrap_or("")
    }

    #[test]
    fn test_readouts_follow_live_data() {
        let live = Rc::new(SharedLiveData::new());
        let mut screen = MainScreen::new(live.clone());
        assert_eq!(label_text(&screen, screen.fix), "NO FIX");
        assert_eq!(label_text(&screen, screen.time), "--:--:--");

        live.modify(|s| {
            s.speed_kmh = 87.6;
            s.valid = true;
            s.time = Some(TimeOfDay {
                hour: 7,
                minute: 5,
                second: 9,
            });
        });
        screen.update(&mut ctx(0));
        assert_eq!(label_text(&screen, screen.speed), "88");
        assert_eq!(label_text(&screen, screen.fix), "FIX");
        assert_eq!(label_text(&screen, screen.time), "07:05:09 UTC");
        assert_eq!(label_text(&screen, screen.satellites), "Sats 0/0");
    }

    #[test]
    fn test_gauge_repaints_only_on_change() {
        let live = Rc::new(SharedLiveData::new());
        let mut screen = MainScreen::new(live.clone());
        let mut fb = FrameBuffer::new();
        screen.draw(&mut fb);
        assert!(!screen.is_redraw_needed());

        screen.update(&mut ctx(0));
        assert!(!screen.is_redraw_needed(), "same snapshot, nothing to paint");

        live.modify(|s| s.speed_kmh = 100.0);
        screen.update(&mut ctx(10));
        assert!(screen.content_needs_redraw());
        screen.draw(&mut fb);
        assert_eq!(fb.pixel(GAUGE.inset(2).top_left), Some(SPEED_ACCENT));
    }

    #[test]
    fn test_buttons_request_navigation() {
        let live = Rc::new(SharedLiveData::new());
        let mut screen = MainScreen::new(live);
        let setup = screen
            .core()
            .root()
            .child_ids()
            .filter_map(|id| screen.core().root().child::<Button>(id))
            .find(|b| b.id() == SETUP_BUTTON_ID)
            .map(|b| b.base().bounds().center())
            .expect("setup button");

        screen.handle_touch(TouchSample::down(setup.x, setup.y), &mut ctx(0));
        screen.handle_touch(TouchSample::up(setup.x, setup.y), &mut ctx(100));
        assert_eq!(
            screen.core_mut().take_navigation(),
            [crate::ui::NavRequest::SwitchTo(alloc::string::String::from(SETUP))]
        );
    }
}
