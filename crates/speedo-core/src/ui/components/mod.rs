//! Leaf widgets

pub mod button;
pub mod label;

pub use button::{Button, ButtonCallback, ButtonEvent, ButtonEventKind, ButtonKind, ButtonState};
pub use label::Label;
