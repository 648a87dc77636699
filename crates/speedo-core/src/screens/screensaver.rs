//! Idle screen: a small clock and speed readout that wanders around the
//! panel to spread wear. Any touch returns to the previous screen.

use alloc::rc::Rc;
use core::fmt::Write;

use embassy_time::{Duration, Instant};
use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use log::debug;

use crate::framebuffer::FrameBuffer;
use crate::live_data::LiveData;
use crate::screens::{SCREEN_SAVER, Screen, ScreenCore};
use crate::ui::styling::{GRAY, SCREEN_BACKGROUND, SPEED_ACCENT};
use crate::ui::text::{BODY_FONT, LARGE_FONT, line_height, text_width};
use crate::ui::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX, TouchSample, UiContext};

/// How long the readout stays in one place.
pub const MOVE_INTERVAL: Duration = Duration::from_secs(15);

type Line = heapless::String<24>;

pub struct ScreenSaverScreen {
    core: ScreenCore,
    live: Rc<dyn LiveData>,
    rng: u32,
    position: Point,
    moved_at: Option<Instant>,
    speed: Line,
    clock: Line,
    /// Area painted last time, cleared before the next paint
    painted: Option<Rectangle>,
    dirty: bool,
    /// Back-navigation already requested; further presses are swallowed
    leaving: bool,
}

impl ScreenSaverScreen {
    pub fn new(live: Rc<dyn LiveData>) -> Self {
        Self {
            core: ScreenCore::new(SCREEN_SAVER),
            live,
            rng: 0x2545_f491,
            position: Point::new(40, 40),
            moved_at: None,
            speed: Line::new(),
            clock: Line::new(),
            painted: None,
            dirty: true,
            leaving: false,
        }
    }

    /// Size of the two-line readout.
    fn block_size(&self) -> Size {
        let width = text_width(&self.speed, LARGE_FONT).max(text_width(&self.clock, BODY_FONT));
        Size::new(width, line_height(LARGE_FONT) + line_height(BODY_FONT) + 4)
    }

    fn next_random(&mut self) -> u32 {
        // xorshift32
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng = x;
        x
    }

    fn relocate(&mut self) {
        let block = self.block_size();
        let free_x = DISPLAY_WIDTH_PX.saturating_sub(block.width).max(1);
        let free_y = DISPLAY_HEIGHT_PX.saturating_sub(block.height).max(1);
        let x = self.next_random() % free_x;
        let y = self.next_random() % free_y;
        self.position = Point::new(x as i32, y as i32);
        self.dirty = true;
        debug!(" Screensaver moved to {:?}", self.position);
    }

    fn refresh_text(&mut self) {
        let snapshot = self.live.snapshot();

        let mut speed = Line::new();
        let _ = write!(speed, "{:.0} km/h", snapshot.speed_kmh.max(0.0));
        let mut clock = Line::new();
        let _ = match snapshot.time {
            Some(t) => write!(clock, "{:02}:{:02} UTC", t.hour, t.minute),
            None => write!(clock, "--:--"),
        };

        if speed != self.speed || clock != self.clock {
            self.speed = speed;
            self.clock = clock;
            self.dirty = true;
        }
    }
}

impl Screen for ScreenSaverScreen {
    fn core(&self) -> &ScreenCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ScreenCore {
        &mut self.core
    }

    fn activate(&mut self, ctx: &mut UiContext) {
        // A zero state would stay zero forever
        self.rng ^= (ctx.now().as_ticks() as u32) | 1;
        self.refresh_text();
        self.relocate();
        self.moved_at = Some(ctx.now());
    }

    fn update_content(&mut self, ctx: &mut UiContext) {
        self.refresh_text();
        let due = self
            .moved_at
            .is_none_or(|at| ctx.now().saturating_duration_since(at) >= MOVE_INTERVAL);
        if due {
            self.relocate();
            self.moved_at = Some(ctx.now());
        }
    }

    fn content_needs_redraw(&self) -> bool {
        self.dirty
    }

    fn draw_content(&mut self, fb: &mut FrameBuffer, force: bool) {
        if let Some(old) = self.painted.take().filter(|_| !force) {
            let _ = old
                .into_styled(PrimitiveStyle::with_fill(SCREEN_BACKGROUND))
                .draw(fb);
        }

        let _ = Text::with_baseline(
            &self.speed,
            self.position,
            MonoTextStyle::new(LARGE_FONT, SPEED_ACCENT),
            Baseline::Top,
        )
        .draw(fb);
        let clock_at = self.position + Point::new(0, line_height(LARGE_FONT) as i32 + 4);
        let _ = Text::with_baseline(
            &self.clock,
            clock_at,
            MonoTextStyle::new(BODY_FONT, GRAY),
            Baseline::Top,
        )
        .draw(fb);

        self.painted = Some(Rectangle::new(self.position, self.block_size()));
        self.dirty = false;
    }

    fn handle_own_touch(&mut self, sample: TouchSample, ctx: &mut UiContext) -> bool {
        if sample.pressed && !self.leaving {
            self.leaving = true;
            debug!(" Screensaver touched, going back");
            ctx.go_back();
        }
        true
    }
}
