//! Modal dialog overlay

use alloc::boxed::Box;

use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    Line, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, StrokeAlignment,
};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use log::debug;

use crate::framebuffer::FrameBuffer;
use crate::ui::component::{Component, ComponentBase};
use crate::ui::components::{Button, ButtonEventKind};
use crate::ui::container::{ChildId, Container};
use crate::ui::core::{TouchSample, UiContext};
use crate::ui::dialogs::{DialogId, DialogOutcome, DialogResult};
use crate::ui::layouts::ChildSink;
use crate::ui::styling::{
    ColorScheme, DARK_GRAY, DIALOG_HEADER_BACKGROUND, DIALOG_HEADER_TEXT, DIALOG_VEIL, WHITE,
};
use crate::ui::text::{self, TITLE_FONT};
use crate::ui::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};

/// Title bar height.
pub const HEADER_HEIGHT: u32 = 28;
/// Inner padding between the frame and the content.
pub const PADDING: u32 = 5;
/// Id of the header's close button.
pub const CLOSE_BUTTON_ID: u8 = 254;

const BORDER: u32 = 2;
const SHADOW_OFFSET: i32 = 4;
const CLOSE_BUTTON_SIZE: u32 = 20;
const CLOSE_BUTTON_MARGIN: u32 = 4;
const VEIL_STEP: usize = 3;

/// Runs once when the dialog closes. It may show follow-up dialogs.
pub type DialogCallback = Box<dyn FnOnce(&DialogOutcome, &mut UiContext)>;

/// Runs every tick while the dialog is on top, with access to its children.
pub type DialogUpdateHook = Box<dyn FnMut(&mut Container, &mut UiContext)>;

/// Requested placement; `None` fields are resolved automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogGeometry {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl DialogGeometry {
    /// 80% x 60% of the screen, centred.
    pub const AUTO: Self = Self {
        x: None,
        y: None,
        width: None,
        height: None,
    };

    /// Fixed size, centred.
    pub const fn sized(width: u32, height: u32) -> Self {
        Self {
            x: None,
            y: None,
            width: Some(width),
            height: Some(height),
        }
    }

    pub fn resolve(&self) -> Rectangle {
        let width = self.width.unwrap_or(DISPLAY_WIDTH_PX * 8 / 10);
        let height = self.height.unwrap_or(DISPLAY_HEIGHT_PX * 6 / 10);
        let x = self
            .x
            .unwrap_or((DISPLAY_WIDTH_PX as i32 - width as i32) / 2);
        let y = self
            .y
            .unwrap_or((DISPLAY_HEIGHT_PX as i32 - height as i32) / 2);
        Rectangle::new(Point::new(x, y), Size::new(width, height))
    }
}

impl Default for DialogGeometry {
    fn default() -> Self {
        Self::AUTO
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingClose {
    pub result: DialogResult,
    pub chain: Option<DialogId>,
}

/// A modal overlay owning its own children.
///
/// Only the top dialog of a screen receives input. Children get the first
/// chance at a touch; anything else inside the dialog is swallowed so it
/// never reaches the screen behind.
pub struct Dialog {
    id: DialogId,
    container: Container,
    title: Option<heapless::String<48>>,
    veil_drawn: bool,
    top: bool,
    closing: bool,
    on_result: Option<DialogCallback>,
    on_update: Option<DialogUpdateHook>,
    pending_close: Option<PendingClose>,
}

impl Dialog {
    pub fn new(title: Option<&str>, geometry: DialogGeometry) -> Self {
        let bounds = geometry.resolve();
        let container = Container::new(bounds);
        let mut dialog = Self {
            id: DialogId::next(),
            container,
            title: title.map(text::bounded),
            veil_drawn: false,
            top: false,
            closing: false,
            on_result: None,
            on_update: None,
            pending_close: None,
        };
        dialog.container.base_mut().set_colors(ColorScheme::dialog());
        if dialog.title.is_some() {
            dialog.add_close_button();
        }
        dialog
    }

    pub fn with_on_result<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&DialogOutcome, &mut UiContext) + 'static,
    {
        self.on_result = Some(Box::new(callback));
        self
    }

    pub fn with_on_update<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut Container, &mut UiContext) + 'static,
    {
        self.on_update = Some(Box::new(hook));
        self
    }

    pub fn set_callback(&mut self, callback: Option<DialogCallback>) {
        self.on_result = callback;
    }

    pub fn id(&self) -> DialogId {
        self.id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn bounds(&self) -> Rectangle {
        self.container.base().bounds()
    }

    /// Area below the header available to content.
    pub fn content_area(&self) -> Rectangle {
        let bounds = self.bounds();
        let header = if self.title.is_some() {
            HEADER_HEIGHT + 1
        } else {
            0
        };
        let inset = BORDER + PADDING;
        Rectangle::new(
            bounds.top_left + Point::new(inset as i32, (inset + header) as i32),
            Size::new(
                bounds.size.width.saturating_sub(2 * inset),
                bounds.size.height.saturating_sub(2 * inset + header),
            ),
        )
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    pub fn add<C: Component>(&mut self, child: C) -> ChildId {
        self.container.add(child)
    }

    pub fn is_top(&self) -> bool {
        self.top
    }

    /// True from the moment a close starts until the dialog is unlinked.
    pub fn is_closing(&self) -> bool {
        self.closing
    }

    pub(crate) fn set_top(&mut self, top: bool) {
        self.top = top;
    }

    pub(crate) fn set_closing(&mut self) {
        self.closing = true;
        self.container.cancel_press();
    }

    /// Arm the veil so the next draw paints it again.
    pub(crate) fn reset_veil(&mut self) {
        self.veil_drawn = false;
    }

    pub(crate) fn take_callback(&mut self) -> Option<DialogCallback> {
        self.on_result.take()
    }

    pub(crate) fn request_close(&mut self, pending: PendingClose) {
        debug!(" Dialog {:?} deferred close {:?}", self.id, pending.result);
        self.pending_close = Some(pending);
    }

    pub(crate) fn take_pending_close(&mut self) -> Option<PendingClose> {
        self.pending_close.take()
    }

    fn add_close_button(&mut self) {
        let bounds = self.bounds();
        let x = bounds.top_left.x + bounds.size.width as i32
            - (CLOSE_BUTTON_SIZE + CLOSE_BUTTON_MARGIN) as i32;
        let y = bounds.top_left.y + CLOSE_BUTTON_MARGIN as i32;
        let close = Button::new(
            CLOSE_BUTTON_ID,
            Rectangle::new(Point::new(x, y), Size::new(CLOSE_BUTTON_SIZE, CLOSE_BUTTON_SIZE)),
            "X",
        )
        .with_colors(ColorScheme::close_button())
        .with_mini_font(true)
        .with_callback(|event, ctx| {
            if event.state == ButtonEventKind::Clicked {
                ctx.close_current_dialog(DialogResult::Dismissed);
            }
        });
        self.container.attach(Box::new(close));
    }

    /// Dotted dimming pattern over everything but the dialog itself.
    fn draw_veil(&self, fb: &mut FrameBuffer) {
        let bounds = self.bounds();
        let dots = (0..DISPLAY_HEIGHT_PX as usize)
            .step_by(VEIL_STEP)
            .flat_map(|y| {
                (y % VEIL_STEP..DISPLAY_WIDTH_PX as usize)
                    .step_by(VEIL_STEP)
                    .map(move |x| Point::new(x as i32, y as i32))
            })
            .filter(|p| !bounds.contains(*p))
            .map(|p| Pixel(p, DIALOG_VEIL));
        let _ = fb.draw_iter(dots);
    }

    fn draw_frame(fb: &mut FrameBuffer, base: &ComponentBase, title: Option<&str>) {
        let bounds = base.bounds();

        let _ = Rectangle::new(bounds.top_left + Point::new(SHADOW_OFFSET, SHADOW_OFFSET), bounds.size)
            .into_styled(PrimitiveStyle::with_fill(DARK_GRAY))
            .draw(fb);
        let frame = PrimitiveStyleBuilder::new()
            .fill_color(base.colors().background)
            .stroke_color(WHITE)
            .stroke_width(BORDER)
            .stroke_alignment(StrokeAlignment::Inside)
            .build();
        let _ = bounds.into_styled(frame).draw(fb);

        let Some(title) = title else {
            return;
        };
        let header = Rectangle::new(
            bounds.top_left + Point::new(BORDER as i32, BORDER as i32),
            Size::new(bounds.size.width.saturating_sub(2 * BORDER), HEADER_HEIGHT),
        );
        let _ = header
            .into_styled(PrimitiveStyle::with_fill(DIALOG_HEADER_BACKGROUND))
            .draw(fb);

        let line_y = header.top_left.y + HEADER_HEIGHT as i32;
        let _ = Line::new(
            Point::new(header.top_left.x, line_y),
            Point::new(header.top_left.x + header.size.width as i32 - 1, line_y),
        )
        .into_styled(PrimitiveStyle::with_stroke(WHITE, 1))
        .draw(fb);

        let style = TextStyleBuilder::new()
            .alignment(Alignment::Left)
            .baseline(Baseline::Middle)
            .build();
        let _ = Text::with_text_style(
            title,
            Point::new(
                header.top_left.x + (PADDING + 6) as i32,
                header.top_left.y + HEADER_HEIGHT as i32 / 2,
            ),
            MonoTextStyle::new(TITLE_FONT, DIALOG_HEADER_TEXT),
            style,
        )
        .draw(fb);
    }
}

impl Component for Dialog {
    fn base(&self) -> &ComponentBase {
        self.container.base()
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        self.container.base_mut()
    }

    fn draw(&mut self, fb: &mut FrameBuffer) {
        if !self.veil_drawn {
            self.draw_veil(fb);
            self.veil_drawn = true;
            self.container.mark_for_redraw(true);
        }
        let title = self.title.as_deref();
        self.container
            .draw_with(fb, |fb, base| Self::draw_frame(fb, base, title));
    }

    fn handle_touch(&mut self, sample: TouchSample, ctx: &mut UiContext) -> bool {
        if !self.top || self.closing || self.container.is_disabled() {
            return false;
        }
        let id = self.id;
        let container = &mut self.container;
        if ctx.within_dialog(id, |ctx| container.dispatch_to_children(sample, ctx)) {
            return true;
        }
        self.bounds().contains(sample.point())
    }

    fn update(&mut self, ctx: &mut UiContext) {
        if self.closing {
            return;
        }
        let id = self.id;
        let Self {
            container,
            on_update,
            ..
        } = self;
        ctx.within_dialog(id, |ctx| {
            if let Some(hook) = on_update.as_mut() {
                hook(container, ctx);
            }
            container.update_children(ctx);
        });
    }

    fn is_redraw_needed(&self) -> bool {
        !self.veil_drawn || self.container.is_redraw_needed()
    }

    fn mark_for_redraw(&mut self, include_children: bool) {
        self.container.mark_for_redraw(include_children);
    }

    fn is_pressed(&self) -> bool {
        self.container.is_pressed()
    }

    fn cancel_press(&mut self) {
        self.container.cancel_press();
    }
}
