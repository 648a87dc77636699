//! Screen abstraction
//!
//! A screen is a full-display root container plus its own dialog stack. While
//! a dialog is open, input and periodic updates go to the top dialog only and
//! the content underneath is left alone.
//!
//! Concrete screens implement the few content hooks of [`Screen`] and embed a
//! [`ScreenCore`]; the provided methods do the routing. Structural changes
//! requested from callbacks arrive as commands in the [`UiContext`] and are
//! applied here once the dispatch has unwound.

use alloc::vec::Vec;
use core::mem;

use embedded_graphics::prelude::*;
use log::debug;

use crate::framebuffer::FrameBuffer;
use crate::ui::core::{NavRequest, UiCommand};
use crate::ui::dialogs::dialog::PendingClose;
use crate::ui::dialogs::{Dialog, DialogId, DialogOutcome, DialogResult, DialogStack};
use crate::ui::styling::SCREEN_BACKGROUND;
use crate::ui::{Component, Container, TouchSample, UiContext, screen_bounds};

/// Structure shared by every screen.
pub struct ScreenCore {
    name: &'static str,
    root: Container,
    dialogs: DialogStack,
    full_repaint: bool,
    navigation: Vec<NavRequest>,
}

impl ScreenCore {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            root: Container::new(screen_bounds()),
            dialogs: DialogStack::new(),
            full_repaint: true,
            navigation: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn root(&self) -> &Container {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Container {
        &mut self.root
    }

    pub fn dialogs(&self) -> &DialogStack {
        &self.dialogs
    }

    pub fn is_dialog_active(&self) -> bool {
        !self.dialogs.is_empty()
    }

    /// Clear the display and repaint every layer on the next draw.
    pub fn request_full_repaint(&mut self) {
        self.full_repaint = true;
    }

    /// Open `dialog` on top of the stack.
    ///
    /// Any press in progress underneath is cancelled; the new dialog takes
    /// all input from here on.
    pub fn show_dialog(&mut self, dialog: Dialog) -> DialogId {
        let id = dialog.id();
        self.push_dialog(alloc::boxed::Box::new(dialog));
        id
    }

    /// Close `id` now. Returns `false` if it is not open (already closed or
    /// never shown).
    ///
    /// The dialog's result callback runs first and may open follow-up
    /// dialogs; those are stacked before this one is unlinked.
    pub fn close_dialog(
        &mut self,
        id: DialogId,
        result: DialogResult,
        choice: Option<usize>,
        ctx: &UiContext,
    ) -> bool {
        if !self.dialogs.mark_closing(id) {
            debug!(" Dialog {:?} is not open, close ignored", id);
            return false;
        }

        let callback = self.dialogs.get_mut(id).and_then(|d| d.take_callback());
        if let Some(callback) = callback {
            let mut nested = ctx.fork();
            callback(&DialogOutcome { id, result, choice }, &mut nested);
            let commands = nested.take_commands();
            self.apply(commands, &nested);
        }

        self.dialogs.remove(id);
        debug!(
            " Dialog {:?} closed with {:?}, {} left",
            id,
            result,
            self.dialogs.len()
        );
        self.relayer();
        true
    }

    /// Perform the closes recorded with [`UiContext::defer_close`].
    pub fn process_deferred_closes(&mut self, ctx: &UiContext) {
        let pending: Vec<(DialogId, PendingClose)> = self
            .dialogs
            .iter_mut()
            .filter_map(|d| d.take_pending_close().map(|p| (d.id(), p)))
            .collect();

        for (id, pending) in pending {
            self.close_dialog(id, pending.result, None, ctx);
            if let Some(chain) = pending.chain {
                self.close_dialog(chain, pending.result, None, ctx);
            }
        }
    }

    /// Apply the commands collected during a dispatch.
    pub(crate) fn apply(&mut self, commands: Vec<UiCommand>, ctx: &UiContext) {
        for command in commands {
            match command {
                UiCommand::ShowDialog(dialog) => self.push_dialog(dialog),
                UiCommand::CloseDialog { id, result, choice } => {
                    self.close_dialog(id, result, choice, ctx);
                }
                UiCommand::DeferClose { id, result, chain } => {
                    if !self.dialogs.is_open(id) {
                        continue;
                    }
                    if let Some(dialog) = self.dialogs.get_mut(id) {
                        dialog.request_close(PendingClose { result, chain });
                    }
                }
                UiCommand::Navigate(request) => self.navigation.push(request),
            }
        }
    }

    /// Navigation requested by callbacks since the last call.
    pub(crate) fn take_navigation(&mut self) -> Vec<NavRequest> {
        mem::take(&mut self.navigation)
    }

    fn push_dialog(&mut self, dialog: alloc::boxed::Box<Dialog>) {
        self.root.cancel_press();
        if let Some(top) = self.dialogs.top_mut() {
            top.cancel_press();
        }
        self.dialogs.push(dialog);
    }

    /// After a dialog is unlinked everything left is repainted bottom-up:
    /// content first, then each dialog with its veil.
    fn relayer(&mut self) {
        self.full_repaint = true;
        self.root.mark_for_redraw(true);
        for dialog in self.dialogs.iter_mut() {
            dialog.reset_veil();
            dialog.mark_for_redraw(true);
        }
    }
}

/// A full-display view.
///
/// Implementors provide [`Screen::core`] / [`Screen::core_mut`] and any of the
/// content hooks; the remaining methods are driven by the screen controller.
pub trait Screen {
    fn core(&self) -> &ScreenCore;

    fn core_mut(&mut self) -> &mut ScreenCore;

    fn name(&self) -> &'static str {
        self.core().name()
    }

    /// The screen just became active.
    fn activate(&mut self, _ctx: &mut UiContext) {}

    /// The screen is about to be dropped.
    fn deactivate(&mut self) {}

    /// Paint screen-specific content below the root children.
    ///
    /// `force` is set on a full repaint, after the display was cleared.
    fn draw_content(&mut self, _fb: &mut FrameBuffer, _force: bool) {}

    fn content_needs_redraw(&self) -> bool {
        false
    }

    /// Periodic hook, paused while a dialog is open.
    fn update_content(&mut self, _ctx: &mut UiContext) {}

    /// Touches no root child claimed.
    fn handle_own_touch(&mut self, _sample: TouchSample, _ctx: &mut UiContext) -> bool {
        false
    }

    /// Route a touch sample and apply what the callbacks asked for.
    fn handle_touch(&mut self, sample: TouchSample, ctx: &mut UiContext) -> bool {
        let claimed = if self.core().is_dialog_active() {
            self.core_mut()
                .dialogs
                .top_mut()
                .is_some_and(|top| top.handle_touch(sample, ctx))
        } else {
            self.core_mut().root.dispatch_to_children(sample, ctx)
                || self.handle_own_touch(sample, ctx)
        };
        let commands = ctx.take_commands();
        self.core_mut().apply(commands, ctx);
        claimed
    }

    /// Periodic tick: the top dialog if there is one, the content otherwise.
    fn update(&mut self, ctx: &mut UiContext) {
        if self.core().is_dialog_active() {
            if let Some(top) = self.core_mut().dialogs.top_mut() {
                top.update(ctx);
            }
        } else {
            self.update_content(ctx);
            self.core_mut().root.update(ctx);
        }
        let commands = ctx.take_commands();
        let core = self.core_mut();
        core.apply(commands, ctx);
        core.process_deferred_closes(ctx);
    }

    /// Mirrors [`Screen::draw`]: content and root dirtiness under a modal
    /// waits for the full repaint that follows the last close.
    fn is_redraw_needed(&self) -> bool {
        let core = self.core();
        if core.full_repaint || core.dialogs.iter().any(|d| d.is_redraw_needed()) {
            return true;
        }
        !core.is_dialog_active() && (self.content_needs_redraw() || core.root.is_redraw_needed())
    }

    /// Paint content, root children and then every dialog bottom to top.
    ///
    /// Under a modal the content is only repainted as part of a full repaint.
    fn draw(&mut self, fb: &mut FrameBuffer) {
        let full = mem::replace(&mut self.core_mut().full_repaint, false);
        if full {
            let _ = fb.clear(SCREEN_BACKGROUND);
            self.core_mut().root.mark_for_redraw(true);
        }

        if full || !self.core().is_dialog_active() {
            self.draw_content(fb, full);
            self.core_mut().root.draw(fb);
        }

        for dialog in self.core_mut().dialogs.iter_mut() {
            if dialog.is_redraw_needed() {
                dialog.draw(fb);
            }
        }
    }
}
