//! In-RAM framebuffer the whole UI draws into.
//!
//! Components, dialogs and screens paint into this buffer instead of the
//! TFT. Because it is a concrete `DrawTarget` the UI traits can take
//! `&mut FrameBuffer` and stay object safe. After a frame is drawn only the
//! bounding box of changed pixels is pushed to the panel with [`FrameBuffer::flush`].

use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;

use crate::ui::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};

const WIDTH: usize = DISPLAY_WIDTH_PX as usize;
const HEIGHT: usize = DISPLAY_HEIGHT_PX as usize;

/// Bounding box of pixels that have changed since the last flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChangedArea {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
}

impl ChangedArea {
    fn at(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn include(&mut self, x: usize, y: usize) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    fn to_rectangle(self) -> Rectangle {
        Rectangle::new(
            Point::new(self.min_x as i32, self.min_y as i32),
            Size::new(
                (self.max_x - self.min_x + 1) as u32,
                (self.max_y - self.min_y + 1) as u32,
            ),
        )
    }
}

/// Full-screen RGB565 framebuffer with change tracking.
///
/// 480x320x2 bytes lands in PSRAM on the device through the global allocator.
pub struct FrameBuffer {
    pixels: Vec<Rgb565>,
    changed: Option<ChangedArea>,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    /// Allocate a black framebuffer.
    pub fn new() -> Self {
        Self {
            pixels: vec![Rgb565::BLACK; WIDTH * HEIGHT],
            changed: None,
        }
    }

    /// Color at a coordinate, `None` outside the screen.
    pub fn pixel(&self, point: Point) -> Option<Rgb565> {
        if point.x < 0 || point.y < 0 {
            return None;
        }
        let (x, y) = (point.x as usize, point.y as usize);
        (x < WIDTH && y < HEIGHT).then(|| self.pixels[y * WIDTH + x])
    }

    /// Region that a flush would currently send, if anything changed.
    pub fn pending_area(&self) -> Option<Rectangle> {
        self.changed.map(ChangedArea::to_rectangle)
    }

    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: Rgb565) {
        let idx = y * WIDTH + x;
        if self.pixels[idx] != color {
            self.pixels[idx] = color;
            match &mut self.changed {
                Some(area) => area.include(x, y),
                None => self.changed = Some(ChangedArea::at(x, y)),
            }
        }
    }

    /// Push the changed region to a display and reset change tracking.
    ///
    /// A no-op when nothing was painted since the previous flush.
    pub fn flush<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let Some(area) = self.changed.take() else {
            return Ok(());
        };

        let rect = area.to_rectangle();
        debug!(
            " Flushing {}x{} region at ({}, {})",
            rect.size.width, rect.size.height, area.min_x, area.min_y
        );

        let width = rect.size.width as usize;
        let pixels = &self.pixels;
        let rows = (area.min_y..=area.max_y).flat_map(move |y| {
            let start = y * WIDTH + area.min_x;
            pixels[start..start + width].iter().copied()
        });

        display.fill_contiguous(&rect, rows)
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            if coord.x >= 0
                && coord.y >= 0
                && (coord.x as usize) < WIDTH
                && (coord.y as usize) < HEIGHT
            {
                self.set_pixel(coord.x as usize, coord.y as usize, color);
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let clipped = area.intersection(&self.bounding_box());
        let Some(bottom_right) = clipped.bottom_right() else {
            return Ok(());
        };

        for y in clipped.top_left.y..=bottom_right.y {
            for x in clipped.top_left.x..=bottom_right.x {
                self.set_pixel(x as usize, y as usize, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }
}
