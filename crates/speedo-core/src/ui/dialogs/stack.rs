//! Per-screen dialog stack
//!
//! Dialogs live in an arena of slots kept in stacking order, next to a plain
//! list of ids in the same order. A slot's `live` flag answers "is this dialog
//! still open" without touching the dialog itself; it goes false the moment a
//! close starts, which is what makes closing idempotent. The slot itself stays
//! until the close has finished and [`DialogStack::remove`] unlinks it.

use alloc::boxed::Box;
use alloc::vec::Vec;

use log::debug;

use crate::ui::dialogs::{Dialog, DialogId};

struct DialogSlot {
    dialog: Box<Dialog>,
    live: bool,
}

#[derive(Default)]
pub struct DialogStack {
    slots: Vec<DialogSlot>,
    order: Vec<DialogId>,
}

impl DialogStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Push `dialog` on top. The previous top stays painted but stops
    /// receiving input.
    pub fn push(&mut self, mut dialog: Box<Dialog>) {
        let id = dialog.id();
        if let Some(previous) = self.slots.last_mut() {
            previous.dialog.set_top(false);
        }
        dialog.set_top(true);
        dialog.reset_veil();
        self.slots.push(DialogSlot { dialog, live: true });
        self.order.push(id);
        debug!(" Dialog {:?} shown, depth {}", id, self.order.len());
    }

    /// Id of the input-receiving dialog.
    pub fn top_id(&self) -> Option<DialogId> {
        self.order.last().copied()
    }

    pub fn top(&self) -> Option<&Dialog> {
        self.slots.last().map(|slot| slot.dialog.as_ref())
    }

    pub fn top_mut(&mut self) -> Option<&mut Dialog> {
        self.slots.last_mut().map(|slot| slot.dialog.as_mut())
    }

    pub fn get(&self, id: DialogId) -> Option<&Dialog> {
        let index = self.position(id)?;
        Some(self.slots[index].dialog.as_ref())
    }

    pub fn get_mut(&mut self, id: DialogId) -> Option<&mut Dialog> {
        let index = self.position(id)?;
        Some(self.slots[index].dialog.as_mut())
    }

    /// True while `id` is stacked and no close has started for it.
    pub fn is_open(&self, id: DialogId) -> bool {
        self.position(id).is_some_and(|index| self.slots[index].live)
    }

    /// Start closing `id`. Returns `false` if it is unknown or already closing.
    pub fn mark_closing(&mut self, id: DialogId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let slot = &mut self.slots[index];
        if !slot.live {
            return false;
        }
        slot.live = false;
        slot.dialog.set_closing();
        true
    }

    /// Unlink `id` from both sequences and promote the new top.
    pub fn remove(&mut self, id: DialogId) -> Option<Box<Dialog>> {
        let index = self.position(id)?;
        let slot = self.slots.remove(index);
        self.order.remove(index);

        if let Some(top) = self.slots.last_mut() {
            top.dialog.set_top(true);
        }
        Some(slot.dialog)
    }

    /// Dialogs bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &Dialog> {
        self.slots.iter().map(|slot| slot.dialog.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Dialog> {
        self.slots.iter_mut().map(|slot| slot.dialog.as_mut())
    }

    pub fn ids(&self) -> impl Iterator<Item = DialogId> + '_ {
        self.order.iter().copied()
    }

    /// The arena and the id list describe the same dialogs in the same order,
    /// and exactly the last dialog is marked top.
    pub fn is_consistent(&self) -> bool {
        let last = self.slots.len().saturating_sub(1);
        self.slots.len() == self.order.len()
            && self
                .slots
                .iter()
                .zip(&self.order)
                .enumerate()
                .all(|(i, (slot, id))| slot.dialog.id() == *id && slot.dialog.is_top() == (i == last))
    }

    fn position(&self, id: DialogId) -> Option<usize> {
        self.order.iter().position(|candidate| *candidate == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::dialogs::DialogGeometry;

    fn dialog() -> Box<Dialog> {
        Box::new(Dialog::new(None, DialogGeometry::AUTO))
    }

    #[test]
    fn test_push_demotes_previous_top() {
        let mut stack = DialogStack::new();
        let first = dialog();
        let first_id = first.id();
        stack.push(first);
        let second = dialog();
        let second_id = second.id();
        stack.push(second);

        assert_eq!(stack.top_id(), Some(second_id));
        assert_eq!(stack.get(first_id).map(|d| d.is_top()), Some(false));
        assert!(stack.is_consistent());
    }

    #[test]
    fn test_mark_closing_is_idempotent() {
        let mut stack = DialogStack::new();
        let d = dialog();
        let id = d.id();
        stack.push(d);

        assert!(stack.mark_closing(id));
        assert!(!stack.mark_closing(id), "second close is a no-op");
        assert!(!stack.is_open(id));
        assert!(stack.get(id).is_some(), "slot stays until removed");
        assert!(stack.remove(id).is_some());
        assert!(!stack.mark_closing(id), "unknown id");
        assert!(stack.remove(id).is_none());
    }

    #[test]
    fn test_remove_middle_keeps_order() {
        let mut stack = DialogStack::new();
        let ids: Vec<DialogId> = (0..3)
            .map(|_| {
                let d = dialog();
                let id = d.id();
                stack.push(d);
                id
            })
            .collect();

        stack.remove(ids[1]);
        assert_eq!(stack.ids().collect::<Vec<_>>(), [ids[0], ids[2]]);
        assert!(stack.is_consistent());

        stack.remove(ids[2]);
        assert_eq!(stack.top_id(), Some(ids[0]));
        assert_eq!(stack.top().map(|d| d.is_top()), Some(true), "new top promoted");
        assert!(stack.is_consistent());
    }

    #[test]
    fn test_random_show_close_sequence_stays_consistent() {
        let mut stack = DialogStack::new();
        let mut open: Vec<DialogId> = Vec::new();
        // Deterministic pseudo-random walk
        let mut seed = 0x2545_f491u32;
        for _ in 0..200 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            if open.is_empty() || seed % 3 != 0 {
                let d = dialog();
                open.push(d.id());
                stack.push(d);
            } else {
                let id = open.remove(seed as usize % open.len());
                assert!(stack.mark_closing(id));
                stack.remove(id);
            }
            assert!(stack.is_consistent());
            assert_eq!(stack.ids().collect::<Vec<_>>(), open);
        }
    }
}
