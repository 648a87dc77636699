//! Message boxes
//!
//! A titled dialog with a word-wrapped message and a row of buttons centred
//! at the bottom.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::Alignment;

use crate::ui::component::Component;
use crate::ui::components::{Button, ButtonEvent, ButtonEventKind, Label};
use crate::ui::core::UiContext;
use crate::ui::dialogs::dialog::{HEADER_HEIGHT, PADDING};
use crate::ui::dialogs::{Dialog, DialogCallback, DialogGeometry, DialogOutcome, DialogResult};
use crate::ui::layouts::{ButtonSpec, GroupLayout, layout_horizontal};
use crate::ui::styling::ColorScheme;
use crate::ui::text::{BODY_FONT, line_height};
use crate::ui::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};

pub const OK_BUTTON_ID: u8 = 1;
pub const CANCEL_BUTTON_ID: u8 = 2;
pub const YES_BUTTON_ID: u8 = 3;
pub const NO_BUTTON_ID: u8 = 4;
/// User-defined option `i` gets id `FIRST_OPTION_ID + i`.
pub const FIRST_OPTION_ID: u8 = 10;

const BUTTONS_GAP: u32 = 8;

/// Button set of a message box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogButtons {
    Ok,
    OkCancel,
    YesNo,
    YesNoCancel,
    /// One button per label; picking one accepts with its index as choice
    UserDefined(Vec<String>),
}

/// Runs on every button click before the button's own close action.
pub type ButtonHook = Box<dyn FnMut(&ButtonEvent<'_>, &mut UiContext)>;

/// What a button does to its dialog once clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    /// OK / Yes: accept, unless the dialog is told to stay open
    Confirm,
    Close(DialogResult),
    Choose(usize),
}

/// Builder for message dialogs.
///
/// ```ignore
/// let dialog = MessageDialog::new("Reset all settings?")
///     .with_title("Confirm")
///     .with_buttons(DialogButtons::YesNo)
///     .on_result(|outcome, ctx| { /* ... */ })
///     .build();
/// ctx.show_dialog(dialog);
/// ```
pub struct MessageDialog {
    title: Option<String>,
    message: String,
    buttons: DialogButtons,
    geometry: DialogGeometry,
    ok_closes_dialog: bool,
    on_result: Option<DialogCallback>,
    on_button: Option<ButtonHook>,
}

impl MessageDialog {
    pub fn new(message: &str) -> Self {
        Self {
            title: None,
            message: String::from(message),
            buttons: DialogButtons::Ok,
            geometry: DialogGeometry {
                x: None,
                y: None,
                width: Some(DISPLAY_WIDTH_PX * 8 / 10),
                height: None,
            },
            ok_closes_dialog: true,
            on_result: None,
            on_button: None,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(String::from(title));
        self
    }

    pub fn with_buttons(mut self, buttons: DialogButtons) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn with_geometry(mut self, geometry: DialogGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// When false, OK/Yes only run the button hook and leave the dialog open.
    pub fn ok_closes_dialog(mut self, closes: bool) -> Self {
        self.ok_closes_dialog = closes;
        self
    }

    pub fn on_result<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&DialogOutcome, &mut UiContext) + 'static,
    {
        self.on_result = Some(Box::new(callback));
        self
    }

    pub fn on_button<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&ButtonEvent<'_>, &mut UiContext) + 'static,
    {
        self.on_button = Some(Box::new(hook));
        self
    }

    fn button_plan(&self) -> Vec<(u8, String, Action, Option<ColorScheme>)> {
        let ok = |label: &str, id| {
            (
                id,
                String::from(label),
                Action::Confirm,
                Some(ColorScheme::ok_button()),
            )
        };
        let reject = |label: &str, id, result| {
            (
                id,
                String::from(label),
                Action::Close(result),
                Some(ColorScheme::cancel_button()),
            )
        };

        match &self.buttons {
            DialogButtons::Ok => alloc::vec![ok("OK", OK_BUTTON_ID)],
            DialogButtons::OkCancel => alloc::vec![
                ok("OK", OK_BUTTON_ID),
                reject("Cancel", CANCEL_BUTTON_ID, DialogResult::Rejected),
            ],
            DialogButtons::YesNo => alloc::vec![
                ok("Yes", YES_BUTTON_ID),
                reject("No", NO_BUTTON_ID, DialogResult::Rejected),
            ],
            DialogButtons::YesNoCancel => alloc::vec![
                ok("Yes", YES_BUTTON_ID),
                reject("No", NO_BUTTON_ID, DialogResult::Rejected),
                reject("Cancel", CANCEL_BUTTON_ID, DialogResult::Dismissed),
            ],
            DialogButtons::UserDefined(labels) => labels
                .iter()
                .enumerate()
                .map(|(i, label)| {
                    (
                        FIRST_OPTION_ID.saturating_add(i as u8),
                        label.clone(),
                        Action::Choose(i),
                        None,
                    )
                })
                .collect(),
        }
    }

    /// Dialog height that fits the header, two message lines and a button row.
    fn auto_height(&self) -> u32 {
        let header = if self.title.is_some() {
            HEADER_HEIGHT + 1
        } else {
            0
        };
        let text = 2 * line_height(BODY_FONT);
        let required = header + 4 + 4 * PADDING + text + Button::DEFAULT_HEIGHT;
        required.max(DISPLAY_HEIGHT_PX * 4 / 10)
    }

    pub fn build(mut self) -> Dialog {
        let mut geometry = self.geometry;
        if geometry.height.is_none() {
            geometry.height = Some(self.auto_height());
        }
        let plan = self.button_plan();

        let mut dialog = Dialog::new(self.title.as_deref(), geometry);
        dialog.set_callback(self.on_result.take());

        let content = dialog.content_area();
        let message_area = Rectangle::new(
            content.top_left,
            Size::new(
                content.size.width,
                content
                    .size
                    .height
                    .saturating_sub(Button::DEFAULT_HEIGHT + PADDING),
            ),
        );
        let background = dialog.base().colors().background;
        dialog.add(
            Label::new(message_area, &self.message)
                .with_wrap(true)
                .with_alignment(Alignment::Center)
                .with_background(Some(background)),
        );

        let hook = self.on_button.take().map(|hook| Rc::new(RefCell::new(hook)));
        let ok_closes = self.ok_closes_dialog;
        let specs = plan.into_iter().map(|(id, label, action, colors)| {
            let hook = hook.clone();
            let mut spec = ButtonSpec::new(id, &label).on_event(move |event, ctx| {
                if event.state != ButtonEventKind::Clicked {
                    return;
                }
                if let Some(hook) = &hook {
                    (&mut **hook.borrow_mut())(event, ctx);
                }
                match action {
                    Action::Confirm if ok_closes => {
                        ctx.close_current_dialog(DialogResult::Accepted)
                    }
                    Action::Confirm => {}
                    Action::Close(result) => ctx.close_current_dialog(result),
                    Action::Choose(index) => {
                        ctx.close_current_dialog_with_choice(DialogResult::Accepted, index)
                    }
                }
            });
            if let Some(colors) = colors {
                spec = spec.with_colors(colors);
            }
            spec
        });

        let layout = GroupLayout::within(content)
            .with_gaps(BUTTONS_GAP, PADDING)
            .centered();
        layout_horizontal(specs, &layout, dialog.container_mut());
        dialog
    }
}
