//! Button group placement
//!
//! Packs a list of button descriptions into columns (right edge of the area,
//! top-down) or rows (bottom of the area, left-to-right), creates the buttons
//! and attaches them to a container. Nothing is kept between calls.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::ops::Range;

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::ui::component::Component;
use crate::ui::components::{Button, ButtonCallback, ButtonEvent, ButtonKind, ButtonState};
use crate::ui::container::{ChildId, Container};
use crate::ui::core::{RectExt, UiContext};
use crate::ui::screen_bounds;
use crate::ui::styling::ColorScheme;
use crate::ui::text;

/// Description of one button to be created by the layout.
pub struct ButtonSpec {
    pub id: u8,
    pub label: heapless::String<32>,
    pub kind: ButtonKind,
    pub state: ButtonState,
    /// `None` sizes the button to its label
    pub width: Option<u32>,
    /// `None` uses [`Button::DEFAULT_HEIGHT`]
    pub height: Option<u32>,
    pub colors: Option<ColorScheme>,
    pub callback: Option<ButtonCallback>,
}

impl ButtonSpec {
    pub fn new(id: u8, label: &str) -> Self {
        Self {
            id,
            label: text::bounded(label),
            kind: ButtonKind::Pushable,
            state: ButtonState::Off,
            width: None,
            height: None,
            colors: None,
            callback: None,
        }
    }

    pub fn toggleable(mut self, state: ButtonState) -> Self {
        self.kind = ButtonKind::Toggleable;
        self.state = state;
        self
    }

    pub fn with_state(mut self, state: ButtonState) -> Self {
        self.state = state;
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_colors(mut self, colors: ColorScheme) -> Self {
        self.colors = Some(colors);
        self
    }

    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&ButtonEvent<'_>, &mut UiContext) + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    fn resolved_size(&self) -> Size {
        let height = self.height.unwrap_or(Button::DEFAULT_HEIGHT);
        let width = self
            .width
            .unwrap_or_else(|| Button::width_for_text(&self.label, false, height));
        Size::new(width, height)
    }

    fn into_button(self, bounds: Rectangle) -> Button {
        let mut button = Button::new(self.id, bounds, &self.label)
            .with_kind(self.kind)
            .with_state(self.state);
        if let Some(colors) = self.colors {
            button = button.with_colors(colors);
        }
        button.set_callback(self.callback);
        button
    }
}

/// Anything that can take ownership of a new child.
pub trait ChildSink {
    fn attach(&mut self, child: Box<dyn Component>) -> ChildId;
}

impl ChildSink for Container {
    fn attach(&mut self, child: Box<dyn Component>) -> ChildId {
        self.add_child(child)
    }
}

/// Where and how densely a group is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupLayout {
    pub area: Rectangle,
    /// Gap between buttons within a column or row
    pub item_gap: u32,
    /// Gap between columns or rows
    pub line_gap: u32,
    /// Centre each row horizontally (rows only)
    pub center: bool,
}

impl Default for GroupLayout {
    /// Whole screen less a 5 px margin, 3 px gaps.
    fn default() -> Self {
        Self::within(screen_bounds().inset(5))
    }
}

impl GroupLayout {
    pub fn within(area: Rectangle) -> Self {
        Self {
            area,
            item_gap: 3,
            line_gap: 3,
            center: false,
        }
    }

    pub fn centered(mut self) -> Self {
        self.center = true;
        self
    }

    pub fn with_gaps(mut self, item_gap: u32, line_gap: u32) -> Self {
        self.item_gap = item_gap;
        self.line_gap = line_gap;
        self
    }
}

/// Split items of the given lengths into lines no longer than `budget`.
///
/// An item longer than the budget on its own always gets a line to itself.
pub fn pack_lines(lengths: &[u32], budget: u32, gap: u32) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut used = 0u32;

    for (index, &length) in lengths.iter().enumerate() {
        if index == start {
            used = length;
            continue;
        }
        let needed = used + gap + length;
        if needed > budget {
            lines.push(start..index);
            start = index;
            used = length;
        } else {
            used = needed;
        }
    }
    if start < lengths.len() {
        lines.push(start..lengths.len());
    }
    lines
}

fn sum_with_gaps(values: impl Iterator<Item = u32>, gap: u32) -> u32 {
    let (total, count) = values.fold((0u32, 0u32), |(total, count), v| (total + v, count + 1));
    total + gap * count.saturating_sub(1)
}

/// Place buttons in columns anchored to the right edge of the area.
///
/// Returns the created children in the order of `specs`.
pub fn layout_vertical(
    specs: impl IntoIterator<Item = ButtonSpec>,
    layout: &GroupLayout,
    sink: &mut dyn ChildSink,
) -> Vec<ChildId> {
    let area = layout.area;
    let sized: Vec<(ButtonSpec, Size)> = specs
        .into_iter()
        .map(|spec| {
            let size = spec.resolved_size();
            (spec, Size::new(size.width, size.height.min(area.size.height)))
        })
        .collect();
    if sized.is_empty() {
        return Vec::new();
    }

    let heights: Vec<u32> = sized.iter().map(|(_, s)| s.height).collect();
    let columns = pack_lines(&heights, area.size.height, layout.item_gap);
    let column_widths: Vec<u32> = columns
        .iter()
        .map(|range| sized[range.clone()].iter().map(|(_, s)| s.width).max().unwrap_or(0))
        .collect();
    let total_width = sum_with_gaps(column_widths.iter().copied(), layout.line_gap);

    let right = area.top_left.x + area.size.width as i32;
    let mut x = right - total_width as i32;
    let mut created = Vec::with_capacity(sized.len());
    let mut items = sized.into_iter();

    for (range, column_width) in columns.iter().zip(column_widths) {
        let mut y = area.top_left.y;
        for (spec, size) in items.by_ref().take(range.len()) {
            let bounds = Rectangle::new(Point::new(x, y), size);
            created.push(sink.attach(Box::new(spec.into_button(bounds))));
            y += (size.height + layout.item_gap) as i32;
        }
        x += (column_width + layout.line_gap) as i32;
    }
    created
}

/// Place buttons in rows anchored to the bottom of the area.
///
/// Returns the created children in the order of `specs`.
pub fn layout_horizontal(
    specs: impl IntoIterator<Item = ButtonSpec>,
    layout: &GroupLayout,
    sink: &mut dyn ChildSink,
) -> Vec<ChildId> {
    let area = layout.area;
    let sized: Vec<(ButtonSpec, Size)> = specs
        .into_iter()
        .map(|spec| {
            let size = spec.resolved_size();
            (spec, Size::new(size.width.min(area.size.width), size.height))
        })
        .collect();
    if sized.is_empty() {
        return Vec::new();
    }

    let widths: Vec<u32> = sized.iter().map(|(_, s)| s.width).collect();
    let rows = pack_lines(&widths, area.size.width, layout.item_gap);
    let row_heights: Vec<u32> = rows
        .iter()
        .map(|range| sized[range.clone()].iter().map(|(_, s)| s.height).max().unwrap_or(0))
        .collect();
    let total_height = sum_with_gaps(row_heights.iter().copied(), layout.line_gap);

    let bottom = area.top_left.y + area.size.height as i32;
    let mut y = bottom - total_height as i32;
    let mut created = Vec::with_capacity(sized.len());
    let mut items = sized.into_iter();

    for (range, row_height) in rows.iter().zip(row_heights) {
        let row_width = sum_with_gaps(widths[range.clone()].iter().copied(), layout.item_gap);
        let mut x = if layout.center {
            area.top_left.x + (area.size.width.saturating_sub(row_width) / 2) as i32
        } else {
            area.top_left.x
        };
        for (spec, size) in items.by_ref().take(range.len()) {
            let bounds = Rectangle::new(Point::new(x, y), size);
            created.push(sink.attach(Box::new(spec.into_button(bounds))));
            x += (size.width + layout.item_gap) as i32;
        }
        y += (row_height + layout.line_gap) as i32;
    }
    created
}
