//! Value editor dialog
//!
//! Edits one integer, byte, float or boolean between fixed limits. Every step
//! is reported to the change callback straight away so the rest of the system
//! can preview it; Cancel or the header's X put the original value back.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use core::cell::RefCell;
use core::fmt::Write;

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::Alignment;
use log::debug;

use crate::error::SettingsError;
use crate::ui::component::Component;
use crate::ui::components::{Button, ButtonEventKind, Label};
use crate::ui::container::{ChildId, Container};
use crate::ui::core::UiContext;
use crate::ui::dialogs::dialog::PADDING;
use crate::ui::dialogs::message::{CANCEL_BUTTON_ID, OK_BUTTON_ID};
use crate::ui::dialogs::{Dialog, DialogCallback, DialogGeometry, DialogOutcome, DialogResult};
use crate::ui::layouts::{ButtonSpec, GroupLayout, layout_horizontal};
use crate::ui::styling::{ColorScheme, VALUE_UNCHANGED, WHITE};
use crate::ui::text::{BODY_FONT, LARGE_FONT, line_height};

pub const DECREMENT_BUTTON_ID: u8 = 20;
pub const INCREMENT_BUTTON_ID: u8 = 21;

const STEP_BUTTON_SIZE: u32 = 40;
const STEP_BUTTON_SPACING: u32 = 8;
const DEFAULT_SIZE: Size = Size::new(320, 200);

/// A value being edited.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i32),
    U8(u8),
    Float(f32),
    Bool(bool),
}

/// Called with the new value after every change, including the restore on
/// cancel.
pub type ValueCallback = Box<dyn FnMut(Value, &mut UiContext)>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Limits {
    Int { min: i32, max: i32, step: i32 },
    U8 { min: u8, max: u8, step: u8 },
    Float { min: f32, max: f32, step: f32 },
    Bool,
}

struct ValueModel {
    limits: Limits,
    current: Value,
    original: Value,
    on_change: Option<ValueCallback>,
}

impl ValueModel {
    fn new(limits: Limits, value: Value) -> Self {
        Self {
            limits,
            current: value,
            original: value,
            on_change: None,
        }
    }

    /// Value one step up or down, held at the limits.
    fn stepped(&self, up: bool) -> Value {
        match (self.limits, self.current) {
            (Limits::Int { min, max, step }, Value::Int(v)) => Value::Int(if up {
                v.saturating_add(step).min(max)
            } else {
                v.saturating_sub(step).max(min)
            }),
            (Limits::U8 { min, max, step }, Value::U8(v)) => Value::U8(if up {
                v.saturating_add(step).min(max)
            } else {
                v.saturating_sub(step).max(min)
            }),
            (Limits::Float { min, max, step }, Value::Float(v)) => Value::Float(if up {
                (v + step).min(max)
            } else {
                (v - step).max(min)
            }),
            (_, Value::Bool(_)) => Value::Bool(up),
            (_, other) => other,
        }
    }

    fn can_step(&self, up: bool) -> bool {
        self.stepped(up) != self.current
    }

    fn step(&mut self, up: bool, ctx: &mut UiContext) {
        let next = self.stepped(up);
        if next != self.current {
            self.set(next, ctx);
        }
    }

    fn restore(&mut self, ctx: &mut UiContext) {
        if self.current != self.original {
            debug!(" Value restored to {:?}", self.original);
            self.set(self.original, ctx);
        }
    }

    fn set(&mut self, value: Value, ctx: &mut UiContext) {
        self.current = value;
        if let Some(callback) = self.on_change.as_mut() {
            callback(value, ctx);
        }
    }

    fn display(&self) -> heapless::String<24> {
        let mut out = heapless::String::new();
        let _ = match (self.limits, self.current) {
            (Limits::Float { step, .. }, Value::Float(v)) => {
                write!(out, "{:.*}", float_decimals(step), v)
            }
            (_, Value::Int(v)) => write!(out, "{}", v),
            (_, Value::U8(v)) => write!(out, "{}", v),
            (_, Value::Float(v)) => write!(out, "{:.1}", v),
            (_, Value::Bool(b)) => write!(out, "{}", if b { "TRUE" } else { "FALSE" }),
        };
        out
    }

    /// Push the current value into the dialog's children.
    fn refresh(&self, container: &mut Container, ids: &ChildIds) {
        if let Some(label) = container.child_mut::<Label>(ids.value) {
            label.set_text(&self.display());
            label.set_color(if self.current == self.original {
                VALUE_UNCHANGED
            } else {
                WHITE
            });
        }
        if let Some(button) = container.child_mut::<Button>(ids.down) {
            button.set_enabled(self.can_step(false));
        }
        if let Some(button) = container.child_mut::<Button>(ids.up) {
            button.set_enabled(self.can_step(true));
        }
    }
}

fn float_decimals(step: f32) -> usize {
    if step >= 1.0 {
        0
    } else if step >= 0.1 {
        1
    } else {
        2
    }
}

#[derive(Debug, Clone, Copy)]
struct ChildIds {
    value: ChildId,
    down: ChildId,
    up: ChildId,
}

/// Builder for value editor dialogs.
///
/// ```ignore
/// let dialog = ValueChangeDialog::int("Brightness", 128, 0, 255, 16)?
///     .with_message("Manual backlight level")
///     .on_change(move |value, _ctx| store.update(|s| { /* ... */ }))
///     .build();
/// ctx.show_dialog(dialog);
/// ```
pub struct ValueChangeDialog {
    title: String,
    message: Option<String>,
    model: ValueModel,
    geometry: DialogGeometry,
    on_result: Option<DialogCallback>,
}

impl ValueChangeDialog {
    fn with_model(title: &str, model: ValueModel) -> Self {
        Self {
            title: String::from(title),
            message: None,
            model,
            geometry: DialogGeometry::sized(DEFAULT_SIZE.width, DEFAULT_SIZE.height),
            on_result: None,
        }
    }

    pub fn int(title: &str, value: i32, min: i32, max: i32, step: i32) -> Result<Self, SettingsError> {
        if min > max || step <= 0 {
            return Err(SettingsError::InvalidRange);
        }
        let limits = Limits::Int { min, max, step };
        Ok(Self::with_model(title, ValueModel::new(limits, Value::Int(value.clamp(min, max)))))
    }

    pub fn u8(title: &str, value: u8, min: u8, max: u8, step: u8) -> Result<Self, SettingsError> {
        if min > max || step == 0 {
            return Err(SettingsError::InvalidRange);
        }
        let limits = Limits::U8 { min, max, step };
        Ok(Self::with_model(title, ValueModel::new(limits, Value::U8(value.clamp(min, max)))))
    }

    pub fn float(title: &str, value: f32, min: f32, max: f32, step: f32) -> Result<Self, SettingsError> {
        // Written negated so NaN bounds are refused too
        if !(min <= max) || !(step > 0.0) || value.is_nan() {
            return Err(SettingsError::InvalidRange);
        }
        let limits = Limits::Float { min, max, step };
        Ok(Self::with_model(title, ValueModel::new(limits, Value::Float(value.clamp(min, max)))))
    }

    pub fn boolean(title: &str, value: bool) -> Self {
        Self::with_model(title, ValueModel::new(Limits::Bool, Value::Bool(value)))
    }

    /// Short explanation shown above the value.
    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(String::from(message));
        self
    }

    pub fn with_geometry(mut self, geometry: DialogGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: FnMut(Value, &mut UiContext) + 'static,
    {
        self.model.on_change = Some(Box::new(callback));
        self
    }

    pub fn on_result<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&DialogOutcome, &mut UiContext) + 'static,
    {
        self.on_result = Some(Box::new(callback));
        self
    }

    pub fn build(self) -> Dialog {
        let Self {
            title,
            message,
            model,
            geometry,
            on_result,
        } = self;
        let is_bool = model.limits == Limits::Bool;
        let model = Rc::new(RefCell::new(model));

        let mut dialog = Dialog::new(Some(title.as_str()), geometry);
        let content = dialog.content_area();
        let background = dialog.base().colors().background;
        let mut top = content.top_left.y;

        if let Some(message) = message.as_deref() {
            let height = line_height(BODY_FONT) + 4;
            dialog.add(
                Label::new(
                    Rectangle::new(content.top_left, Size::new(content.size.width, height)),
                    message,
                )
                .with_alignment(Alignment::Center)
                .with_background(Some(background)),
            );
            top += (height + PADDING) as i32;
        }

        let (down_label, up_label, step_width) = if is_bool {
            let width = Button::width_for_text("FALSE", false, STEP_BUTTON_SIZE);
            ("FALSE", "TRUE", width)
        } else {
            ("-", "+", STEP_BUTTON_SIZE)
        };
        let left = content.top_left.x;
        let right = left + content.size.width as i32;
        let step_size = Size::new(step_width, STEP_BUTTON_SIZE);

        let down = dialog.add(step_button(
            DECREMENT_BUTTON_ID,
            Rectangle::new(Point::new(left, top), step_size),
            down_label,
            &model,
            false,
        ));
        let up = dialog.add(step_button(
            INCREMENT_BUTTON_ID,
            Rectangle::new(Point::new(right - step_width as i32, top), step_size),
            up_label,
            &model,
            true,
        ));

        let value_left = left + (step_width + STEP_BUTTON_SPACING) as i32;
        let value_width = content
            .size
            .width
            .saturating_sub(2 * (step_width + STEP_BUTTON_SPACING));
        let value = dialog.add(
            Label::new(
                Rectangle::new(Point::new(value_left, top), Size::new(value_width, STEP_BUTTON_SIZE)),
                "",
            )
            .with_font(LARGE_FONT)
            .with_alignment(Alignment::Center)
            .with_background(Some(background)),
        );

        let ids = ChildIds { value, down, up };
        model.borrow().refresh(dialog.container_mut(), &ids);

        let specs = [
            ButtonSpec::new(OK_BUTTON_ID, "OK")
                .with_colors(ColorScheme::ok_button())
                .on_event(|event, ctx| {
                    if event.state == ButtonEventKind::Clicked {
                        ctx.close_current_dialog(DialogResult::Accepted);
                    }
                }),
            ButtonSpec::new(CANCEL_BUTTON_ID, "Cancel")
                .with_colors(ColorScheme::cancel_button())
                .on_event(|event, ctx| {
                    if event.state == ButtonEventKind::Clicked {
                        ctx.close_current_dialog(DialogResult::Rejected);
                    }
                }),
        ];
        let layout = GroupLayout::within(content).with_gaps(STEP_BUTTON_SPACING, PADDING).centered();
        layout_horizontal(specs, &layout, dialog.container_mut());

        let on_close = model.clone();
        dialog.set_callback(Some(Box::new(move |outcome: &DialogOutcome, ctx: &mut UiContext| {
            if outcome.result != DialogResult::Accepted {
                on_close.borrow_mut().restore(ctx);
            }
            if let Some(callback) = on_result {
                callback(outcome, ctx);
            }
        })));

        let mut shown = None;
        dialog.with_on_update(move |container, _ctx| {
            let model = model.borrow();
            if shown != Some(model.current) {
                shown = Some(model.current);
                model.refresh(container, &ids);
            }
        })
    }
}

fn step_button(
    id: u8,
    bounds: Rectangle,
    label: &str,
    model: &Rc<RefCell<ValueModel>>,
    up: bool,
) -> Button {
    let model = model.clone();
    Button::new(id, bounds, label).with_callback(move |event, ctx| {
        if event.state == ButtonEventKind::Clicked {
            model.borrow_mut().step(up, ctx);
        }
    })
}
