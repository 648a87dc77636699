//! Composite component owning an ordered list of children.
//!
//! Touch is routed top-most first (most recently added child wins). While a
//! child is pressed it captures the pointer: every sample goes to it until the
//! press ends, so only one leaf is ever pressed at a time.

use alloc::boxed::Box;
use alloc::vec::Vec;

use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

use crate::framebuffer::FrameBuffer;
use crate::ui::component::{Component, ComponentBase, process_touch};
use crate::ui::core::{TouchSample, UiContext};

/// Stable handle to a child, valid until the child is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChildId(u16);

struct Child {
    id: ChildId,
    component: Box<dyn Component>,
}

/// A component that owns other components.
pub struct Container {
    base: ComponentBase,
    children: Vec<Child>,
    next_id: u16,
    background: Option<Rgb565>,
}

impl Container {
    pub fn new(bounds: Rectangle) -> Self {
        Self {
            base: ComponentBase::new(bounds),
            children: Vec::new(),
            next_id: 0,
            background: None,
        }
    }

    /// Fill the container's bounds with `color` whenever it repaints itself.
    pub fn with_background(mut self, color: Rgb565) -> Self {
        self.background = Some(color);
        self
    }

    /// Take ownership of `child` and return a handle to it.
    pub fn add_child(&mut self, mut child: Box<dyn Component>) -> ChildId {
        let id = ChildId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        child.mark_for_redraw(true);
        self.children.push(Child {
            id,
            component: child,
        });
        id
    }

    /// Convenience for [`Container::add_child`] with an unboxed component.
    pub fn add<C: Component>(&mut self, child: C) -> ChildId {
        self.add_child(Box::new(child))
    }

    /// Detach a child. The uncovered area is repainted on the next draw.
    pub fn remove_child(&mut self, id: ChildId) -> Option<Box<dyn Component>> {
        let index = self.children.iter().position(|c| c.id == id)?;
        self.base.mark_for_redraw();
        Some(self.children.remove(index).component)
    }

    pub fn clear_children(&mut self) {
        self.children.clear();
        self.base.mark_for_redraw();
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Handles of all children in paint order.
    pub fn child_ids(&self) -> impl Iterator<Item = ChildId> + '_ {
        self.children.iter().map(|c| c.id)
    }

    pub fn child_dyn(&self, id: ChildId) -> Option<&dyn Component> {
        self.children
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.component.as_ref())
    }

    pub fn child_dyn_mut(&mut self, id: ChildId) -> Option<&mut dyn Component> {
        self.children
            .iter_mut()
            .find(|c| c.id == id)
            .map(|c| c.component.as_mut())
    }

    /// Typed access to a child created earlier.
    pub fn child<T: Component>(&self, id: ChildId) -> Option<&T> {
        self.child_dyn(id)?.downcast_ref::<T>()
    }

    pub fn child_mut<T: Component>(&mut self, id: ChildId) -> Option<&mut T> {
        self.child_dyn_mut(id)?.downcast_mut::<T>()
    }

    /// Route a sample to the children only, without the container's own
    /// fallback. Returns `true` when a child claimed it.
    pub fn dispatch_to_children(&mut self, sample: TouchSample, ctx: &mut UiContext) -> bool {
        if let Some(captured) = self.children.iter_mut().find(|c| c.component.is_pressed()) {
            return captured.component.handle_touch(sample, ctx);
        }

        self.children
            .iter_mut()
            .rev()
            .filter(|c| !c.component.is_disabled())
            .any(|c| c.component.handle_touch(sample, ctx))
    }

    /// Run every enabled child's periodic hook.
    pub fn update_children(&mut self, ctx: &mut UiContext) {
        for child in self.children.iter_mut() {
            if !child.component.is_disabled() {
                child.component.update(ctx);
            }
        }
    }

    /// Paint the container using `draw_self` for its own layer, then any
    /// dirty children.
    ///
    /// Repainting the own layer covers the children, so they are all flagged
    /// and repainted with it.
    pub fn draw_with<F>(&mut self, fb: &mut FrameBuffer, draw_self: F)
    where
        F: FnOnce(&mut FrameBuffer, &ComponentBase),
    {
        if self.base.needs_redraw() {
            draw_self(fb, &self.base);
            self.base.mark_drawn();
            for child in self.children.iter_mut() {
                child.component.mark_for_redraw(true);
            }
        }

        for child in self.children.iter_mut() {
            if child.component.is_redraw_needed() {
                child.component.draw(fb);
            }
        }
    }
}

impl Component for Container {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn draw(&mut self, fb: &mut FrameBuffer) {
        let background = self.background;
        self.draw_with(fb, |fb, base| {
            if let Some(color) = background {
                let _ = base
                    .bounds()
                    .into_styled(PrimitiveStyle::with_fill(color))
                    .draw(fb);
            }
        });
    }

    fn handle_touch(&mut self, sample: TouchSample, ctx: &mut UiContext) -> bool {
        if self.base.is_disabled() {
            return false;
        }
        if self.dispatch_to_children(sample, ctx) {
            return true;
        }
        process_touch(self, sample, ctx)
    }

    fn update(&mut self, ctx: &mut UiContext) {
        self.update_children(ctx);
    }

    fn is_redraw_needed(&self) -> bool {
        self.base.needs_redraw() || self.children.iter().any(|c| c.component.is_redraw_needed())
    }

    fn mark_for_redraw(&mut self, include_children: bool) {
        self.base.mark_for_redraw();
        if include_children {
            for child in self.children.iter_mut() {
                child.component.mark_for_redraw(true);
            }
        }
    }

    fn is_pressed(&self) -> bool {
        self.base.is_pressed() || self.children.iter().any(|c| c.component.is_pressed())
    }

    fn cancel_press(&mut self) {
        for child in self.children.iter_mut() {
            child.component.cancel_press();
        }
        self.base.cancel_press();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::component::tests::{Probe, ctx_at};
    use crate::ui::screen_bounds;

    fn pressed_leaves(container: &Container) -> usize {
        container
            .child_ids()
            .filter_map(|id| container.child::<Probe>(id))
            .filter(|p| p.base.is_pressed())
            .count()
    }

    #[test]
    fn test_topmost_child_wins_overlap() {
        let mut root = Container::new(screen_bounds());
        let below = root.add(Probe::at(10, 10));
        let above = root.add(Probe::at(20, 10));

        root.handle_touch(TouchSample::down(25, 15), &mut ctx_at(0));
        root.handle_touch(TouchSample::up(25, 15), &mut ctx_at(100));

        assert_eq!(root.child::<Probe>(above).map(|p| p.clicks), Some(1));
        assert_eq!(root.child::<Probe>(below).map(|p| p.clicks), Some(0));
    }

    #[test]
    fn test_disabled_child_is_skipped() {
        let mut root = Container::new(screen_bounds());
        let below = root.add(Probe::at(10, 10));
        let above = root.add(Probe::at(10, 10));
        if let Some(probe) = root.child_mut::<Probe>(above) {
            probe.set_disabled(true);
        }

        root.handle_touch(TouchSample::down(15, 15), &mut ctx_at(0));
        root.handle_touch(TouchSample::up(15, 15), &mut ctx_at(100));

        assert_eq!(root.child::<Probe>(below).map(|p| p.clicks), Some(1));
    }

    #[test]
    fn test_at_most_one_leaf_pressed_while_sliding() {
        let mut root = Container::new(screen_bounds());
        root.add(Probe::at(0, 0));
        root.add(Probe::at(100, 0));
        root.add(Probe::at(200, 0));

        // Finger slides across all three without lifting
        let path = [(5, 5), (50, 5), (105, 5), (150, 5), (205, 5), (210, 5)];
        for (i, (x, y)) in path.iter().enumerate() {
            root.handle_touch(TouchSample::down(*x, *y), &mut ctx_at(i as u64 * 20));
            assert!(pressed_leaves(&root) <= 1, "single pointer model violated");
        }
        root.handle_touch(TouchSample::up(210, 5), &mut ctx_at(200));
        assert_eq!(pressed_leaves(&root), 0);

        let clicks: u32 = root
            .child_ids()
            .filter_map(|id| root.child::<Probe>(id))
            .map(|p| p.clicks)
            .sum();
        assert_eq!(clicks, 0, "drag-off from the first probe is a cancel");
    }

    #[test]
    fn test_unclaimed_touch_falls_back_to_container() {
        let mut root = Container::new(screen_bounds());
        root.add(Probe::at(10, 10));

        assert!(root.handle_touch(TouchSample::down(300, 200), &mut ctx_at(0)));
        assert!(root.base().is_pressed(), "background press lands on the container");
        root.handle_touch(TouchSample::up(300, 200), &mut ctx_at(100));
        assert!(!root.is_pressed());
    }

    #[test]
    fn test_draw_paints_only_dirty_children() {
        let mut fb = FrameBuffer::new();
        let mut root = Container::new(screen_bounds());
        let a = root.add(Probe::at(0, 0));
        let b = root.add(Probe::at(100, 0));
        root.draw(&mut fb);
        assert!(!root.is_redraw_needed());

        if let Some(probe) = root.child_mut::<Probe>(b) {
            probe.base.mark_for_redraw();
        }
        assert!(root.is_redraw_needed(), "dirty child bubbles up");
        assert!(!root.base().needs_redraw(), "parent flag stays independent");

        root.draw(&mut fb);
        assert_eq!(root.child::<Probe>(a).map(|p| p.is_redraw_needed()), Some(false));
        assert_eq!(root.child::<Probe>(b).map(|p| p.is_redraw_needed()), Some(false));
    }

    #[test]
    fn test_remove_child_releases_handle() {
        let mut root = Container::new(screen_bounds());
        let a = root.add(Probe::at(0, 0));
        let b = root.add(Probe::at(50, 0));
        assert!(root.remove_child(a).is_some());
        assert!(root.remove_child(a).is_none());
        assert!(root.child::<Probe>(b).is_some(), "other handles stay valid");
        assert_eq!(root.len(), 1);
    }
}
