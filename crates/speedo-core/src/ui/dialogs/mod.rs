//! Modal dialogs
//!
//! - [`dialog`] - the [`Dialog`] overlay: veil, frame, title and close button
//! - [`stack`] - the per-screen stack that owns open dialogs
//! - [`message`] - message boxes with standard or custom button sets
//! - [`value_change`] - numeric and boolean value editors

use core::cell::Cell;

use critical_section::Mutex;

pub mod dialog;
pub mod message;
pub mod stack;
pub mod value_change;

pub use dialog::{Dialog, DialogCallback, DialogGeometry, DialogUpdateHook};
pub use message::{DialogButtons, MessageDialog};
pub use stack::DialogStack;
pub use value_change::{Value, ValueChangeDialog};

static NEXT_DIALOG_ID: Mutex<Cell<u32>> = Mutex::new(Cell::new(1));

/// Identity of a dialog, unique for the lifetime of the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DialogId(u32);

impl DialogId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        critical_section::with(|cs| {
            let counter = NEXT_DIALOG_ID.borrow(cs);
            let id = counter.get();
            counter.set(id.wrapping_add(1));
            DialogId(id)
        })
    }

    pub fn raw(&self) -> u32 {
        self.0
    }
}

/// How a dialog was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogResult {
    None,
    /// OK, Yes or a user option
    Accepted,
    /// Cancel or No
    Rejected,
    /// Closed from the header's X
    Dismissed,
}

/// Handed to a dialog's result callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogOutcome {
    pub id: DialogId,
    pub result: DialogResult,
    /// Index of the picked user-defined option, if any
    pub choice: Option<usize>,
}
