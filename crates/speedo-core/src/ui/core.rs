//! Core UI types: touch samples, rectangle helpers and the dispatch context
//!
//! Every touch, update and dialog callback receives a [`UiContext`]. It
//! carries the current time and collects the structural changes a callback
//! asks for (show or close a dialog, switch screens). Nothing a callback does
//! mutates the tree it is running inside; the owner applies the collected
//! commands once the dispatch has unwound.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::mem;

use embassy_time::Instant;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::config::GestureTiming;
use crate::ui::dialogs::{Dialog, DialogId, DialogResult};

// ---------------------------------------------------------------------------
// Touch input
// ---------------------------------------------------------------------------

/// A polled snapshot of the single touch pointer.
///
/// Samples are not guaranteed to arrive as press/release pairs; a release can
/// be missed entirely if polling stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchSample {
    pub x: i32,
    pub y: i32,
    pub pressed: bool,
}

impl TouchSample {
    pub const fn new(x: i32, y: i32, pressed: bool) -> Self {
        Self { x, y, pressed }
    }

    /// Finger down at the given position.
    pub const fn down(x: i32, y: i32) -> Self {
        Self::new(x, y, true)
    }

    /// Finger lifted at the given position.
    pub const fn up(x: i32, y: i32) -> Self {
        Self::new(x, y, false)
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Hit-testing helpers on top of `embedded_graphics` rectangles.
pub trait RectExt {
    /// Containment test with `margin` extra pixels on every side.
    fn contains_with_margin(&self, point: Point, margin: i32) -> bool;

    /// Rectangle shrunk by `by` pixels on every side.
    fn inset(&self, by: u32) -> Rectangle;
}

impl RectExt for Rectangle {
    fn contains_with_margin(&self, point: Point, margin: i32) -> bool {
        let left = self.top_left.x - margin;
        let top = self.top_left.y - margin;
        let right = self.top_left.x + self.size.width as i32 + margin;
        let bottom = self.top_left.y + self.size.height as i32 + margin;
        point.x >= left && point.x < right && point.y >= top && point.y < bottom
    }

    fn inset(&self, by: u32) -> Rectangle {
        Rectangle::new(
            self.top_left + Point::new(by as i32, by as i32),
            Size::new(
                self.size.width.saturating_sub(2 * by),
                self.size.height.saturating_sub(2 * by),
            ),
        )
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Screen-level navigation request, executed by the screen controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavRequest {
    SwitchTo(String),
    GoBack,
}

/// Structural change requested from inside a dispatch.
pub(crate) enum UiCommand {
    ShowDialog(Box<Dialog>),
    CloseDialog {
        id: DialogId,
        result: DialogResult,
        choice: Option<usize>,
    },
    DeferClose {
        id: DialogId,
        result: DialogResult,
        chain: Option<DialogId>,
    },
    Navigate(NavRequest),
}

impl fmt::Debug for UiCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiCommand::ShowDialog(dialog) => write!(f, "ShowDialog({:?})", dialog.id()),
            UiCommand::CloseDialog { id, result, choice } => f
                .debug_struct("CloseDialog")
                .field("id", id)
                .field("result", result)
                .field("choice", choice)
                .finish(),
            UiCommand::DeferClose { id, result, chain } => f
                .debug_struct("DeferClose")
                .field("id", id)
                .field("result", result)
                .field("chain", chain)
                .finish(),
            UiCommand::Navigate(request) => write!(f, "Navigate({:?})", request),
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch context
// ---------------------------------------------------------------------------

/// Per-dispatch context handed to every touch, update and dialog callback.
#[derive(Debug)]
pub struct UiContext {
    now: Instant,
    timing: GestureTiming,
    dialog: Option<DialogId>,
    commands: Vec<UiCommand>,
}

impl UiContext {
    pub fn new(now: Instant, timing: GestureTiming) -> Self {
        Self {
            now,
            timing,
            dialog: None,
            commands: Vec::new(),
        }
    }

    /// Time of the sample or tick being dispatched.
    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn timing(&self) -> &GestureTiming {
        &self.timing
    }

    /// The dialog whose children are currently receiving the dispatch.
    pub fn current_dialog(&self) -> Option<DialogId> {
        self.dialog
    }

    /// Open a dialog on the active screen once the dispatch unwinds.
    pub fn show_dialog(&mut self, dialog: Dialog) -> DialogId {
        let id = dialog.id();
        self.commands.push(UiCommand::ShowDialog(Box::new(dialog)));
        id
    }

    /// Close a dialog once the dispatch unwinds. Closing twice is a no-op.
    pub fn close_dialog(&mut self, id: DialogId, result: DialogResult) {
        self.commands.push(UiCommand::CloseDialog {
            id,
            result,
            choice: None,
        });
    }

    /// Close the dialog that owns the component being dispatched to.
    pub fn close_current_dialog(&mut self, result: DialogResult) {
        if let Some(id) = self.dialog {
            self.close_dialog(id, result);
        }
    }

    /// Close the current dialog, recording which user option was picked.
    pub fn close_current_dialog_with_choice(&mut self, result: DialogResult, choice: usize) {
        if let Some(id) = self.dialog {
            self.commands.push(UiCommand::CloseDialog {
                id,
                result,
                choice: Some(choice),
            });
        }
    }

    /// Record a close to be performed by the next periodic drain.
    pub fn defer_close(&mut self, id: DialogId, result: DialogResult) {
        self.commands.push(UiCommand::DeferClose {
            id,
            result,
            chain: None,
        });
    }

    /// Like [`UiContext::defer_close`], also closing `chain` afterwards.
    pub fn defer_chain_close(&mut self, id: DialogId, result: DialogResult, chain: DialogId) {
        self.commands.push(UiCommand::DeferClose {
            id,
            result,
            chain: Some(chain),
        });
    }

    /// Ask the controller for another screen; runs at the start of its next tick.
    pub fn switch_to_screen(&mut self, name: &str) {
        self.commands
            .push(UiCommand::Navigate(NavRequest::SwitchTo(String::from(name))));
    }

    /// Ask the controller to navigate back; runs at the start of its next tick.
    pub fn go_back(&mut self) {
        self.commands.push(UiCommand::Navigate(NavRequest::GoBack));
    }

    /// Fresh context for a nested callback with the same clock and timing.
    pub(crate) fn fork(&self) -> Self {
        Self::new(self.now, self.timing)
    }

    /// Run `f` with `id` as the current dialog, restoring the previous one.
    pub(crate) fn within_dialog<R>(&mut self, id: DialogId, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.dialog.replace(id);
        let result = f(self);
        self.dialog = previous;
        result
    }

    pub(crate) fn take_commands(&mut self) -> Vec<UiCommand> {
        mem::take(&mut self.commands)
    }

    pub fn has_pending_commands(&self) -> bool {
        !self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_margin_extends_hit_area() {
        let rect = Rectangle::new(Point::new(10, 10), Size::new(20, 10));
        assert!(rect.contains_with_margin(Point::new(10, 10), 0));
        assert!(!rect.contains_with_margin(Point::new(30, 10), 0), "right edge is exclusive");
        assert!(rect.contains_with_margin(Point::new(35, 22), 6));
        assert!(!rect.contains_with_margin(Point::new(3, 10), 6));
    }

    #[test]
    fn test_inset_saturates() {
        let rect = Rectangle::new(Point::new(0, 0), Size::new(6, 40));
        let inner = rect.inset(5);
        assert_eq!(inner.top_left, Point::new(5, 5));
        assert_eq!(inner.size, Size::new(0, 30));
    }

    #[test]
    fn test_close_current_dialog_needs_a_dialog() {
        let mut ctx = UiContext::new(Instant::from_millis(0), GestureTiming::default());
        ctx.close_current_dialog(DialogResult::Accepted);
        assert!(!ctx.has_pending_commands(), "nothing to close outside a dialog");

        let id = DialogId::next();
        ctx.within_dialog(id, |ctx| ctx.close_current_dialog(DialogResult::Accepted));
        assert_eq!(ctx.current_dialog(), None, "dialog scope restored");
        let commands = ctx.take_commands();
        assert!(matches!(
            commands.as_slice(),
            [UiCommand::CloseDialog { id: closed, result: DialogResult::Accepted, choice: None }] if *closed == id
        ));
    }

    #[test]
    fn test_navigation_requests_keep_order() {
        let mut ctx = UiContext::new(Instant::from_millis(0), GestureTiming::default());
        ctx.switch_to_screen("Setup");
        ctx.go_back();
        let commands = ctx.take_commands();
        assert!(matches!(
            commands.as_slice(),
            [
                UiCommand::Navigate(NavRequest::SwitchTo(name)),
                UiCommand::Navigate(NavRequest::GoBack)
            ] if name == "Setup"
        ));
    }
}
