//! Static or live text

use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use embedded_layout::prelude::*;

use crate::framebuffer::FrameBuffer;
use crate::ui::component::{Component, ComponentBase};
use crate::ui::core::{TouchSample, UiContext};
use crate::ui::styling::{SCREEN_BACKGROUND, SCREEN_TEXT};
use crate::ui::text::{self, BODY_FONT};

/// Text component for readouts and dialog messages.
///
/// Single-line labels are centred vertically in their bounds; wrapped labels
/// flow from the top. Labels never claim touches.
pub struct Label {
    base: ComponentBase,
    text: heapless::String<128>,
    font: &'static MonoFont<'static>,
    color: Rgb565,
    background: Option<Rgb565>,
    alignment: Alignment,
    wrap: bool,
}

impl Label {
    pub fn new(bounds: Rectangle, text: &str) -> Self {
        Self {
            base: ComponentBase::new(bounds),
            text: text::bounded(text),
            font: BODY_FONT,
            color: SCREEN_TEXT,
            background: Some(SCREEN_BACKGROUND),
            alignment: Alignment::Left,
            wrap: false,
        }
    }

    pub fn with_font(mut self, font: &'static MonoFont<'static>) -> Self {
        self.font = font;
        self
    }

    pub fn with_color(mut self, color: Rgb565) -> Self {
        self.color = color;
        self
    }

    /// Fill behind the text; `None` draws the glyphs only.
    pub fn with_background(mut self, background: Option<Rgb565>) -> Self {
        self.background = background;
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Word-wrap to the bounds width.
    pub fn with_wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text. Returns whether it changed.
    pub fn set_text(&mut self, text: &str) -> bool {
        let text = text::bounded(text);
        if self.text == text {
            return false;
        }
        self.text = text;
        self.base.mark_for_redraw();
        true
    }

    pub fn set_color(&mut self, color: Rgb565) {
        if self.color != color {
            self.color = color;
            self.base.mark_for_redraw();
        }
    }

    fn draw_single_line(&self, fb: &mut FrameBuffer) {
        let bounds = self.base.bounds();
        let style = TextStyleBuilder::new()
            .alignment(Alignment::Left)
            .baseline(Baseline::Top)
            .build();
        let text = Text::with_text_style(
            &self.text,
            Point::zero(),
            MonoTextStyle::new(self.font, self.color),
            style,
        );

        let _ = match self.alignment {
            Alignment::Left => text.align_to(&bounds, horizontal::Left, vertical::Center).draw(fb),
            Alignment::Center => text
                .align_to(&bounds, horizontal::Center, vertical::Center)
                .draw(fb),
            Alignment::Right => text.align_to(&bounds, horizontal::Right, vertical::Center).draw(fb),
        };
    }

    fn draw_wrapped(&self, fb: &mut FrameBuffer) {
        let bounds = self.base.bounds();
        let line_height = text::line_height(self.font) as i32;
        let anchor_x = match self.alignment {
            Alignment::Left => bounds.top_left.x,
            Alignment::Center => bounds.center().x,
            Alignment::Right => bounds.top_left.x + bounds.size.width as i32 - 1,
        };
        let style = TextStyleBuilder::new()
            .alignment(self.alignment)
            .baseline(Baseline::Top)
            .build();
        let bottom = bounds.top_left.y + bounds.size.height as i32;

        let mut y = bounds.top_left.y;
        for line in text::wrap_lines(&self.text, bounds.size.width, self.font) {
            if y + line_height > bottom {
                break;
            }
            let _ = Text::with_text_style(
                line,
                Point::new(anchor_x, y),
                MonoTextStyle::new(self.font, self.color),
                style,
            )
            .draw(fb);
            y += line_height;
        }
    }
}

impl Component for Label {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn draw(&mut self, fb: &mut FrameBuffer) {
        if let Some(background) = self.background {
            let _ = self
                .base
                .bounds()
                .into_styled(PrimitiveStyle::with_fill(background))
                .draw(fb);
        }
        if self.wrap {
            self.draw_wrapped(fb);
        } else {
            self.draw_single_line(fb);
        }
        self.base.mark_drawn();
    }

    fn handle_touch(&mut self, _sample: TouchSample, _ctx: &mut UiContext) -> bool {
        false
    }
}
