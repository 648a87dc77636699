//! Speedo UI system - a retained component tree for a 480x320 touch panel
//!
//! This module provides:
//! - Core touch and context types shared by every node
//! - The [`Component`] trait with its press/release/click state machine
//! - [`Container`] composites and the button group layout helper
//! - Buttons, labels and the colour schemes they draw with
//! - Modal dialogs and the per-screen dialog stack

pub mod component;
pub mod components;
pub mod container;
pub mod core;
pub mod dialogs;
pub mod layouts;
pub mod styling;
pub mod text;

/// Panel width in pixels (landscape).
pub const DISPLAY_WIDTH_PX: u32 = 480;

/// Panel height in pixels (landscape).
pub const DISPLAY_HEIGHT_PX: u32 = 320;

/// Full-screen rectangle.
pub fn screen_bounds() -> embedded_graphics::primitives::Rectangle {
    use embedded_graphics::prelude::{Point, Size};
    embedded_graphics::primitives::Rectangle::new(
        Point::zero(),
        Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX),
    )
}

// Re-export commonly used items
pub use component::{Component, ComponentBase, process_touch};
pub use components::{Button, ButtonEvent, ButtonEventKind, ButtonKind, ButtonState, Label};
pub use container::{ChildId, Container};
pub use self::core::{NavRequest, RectExt, TouchSample, UiContext};
pub use dialogs::{
    Dialog, DialogButtons, DialogGeometry, DialogId, DialogOutcome, DialogResult, DialogStack,
    MessageDialog, Value, ValueChangeDialog,
};
pub use layouts::{ButtonSpec, ChildSink, GroupLayout, layout_horizontal, layout_vertical};
pub use styling::ColorScheme;
