//! Engine seam
//!
//! The content engine is opaque: it owns a document, lays it out and paints
//! it into a [`Frame`]. The host only ever drives it through this trait and
//! it only ever talks back through its [`SurfaceHost`] handle.

use std::time::Duration;

use crate::geometry::{Point, Rect, Size};
use crate::window::input::InputEvent;
use crate::window::SurfaceHost;

/// One engine view bound to one surface.
///
/// The host never calls into an engine reentrantly. The engine may call any
/// [`SurfaceHost`] method from inside any of these callbacks.
pub trait Engine {
    /// Bound to a live surface. Keep `host` to request commits, close, etc.
    fn attach(&mut self, host: SurfaceHost);

    /// The surface is going away. Called exactly once.
    fn detach(&mut self);

    fn resize(&mut self, size: Size);

    fn begin_frame(&mut self, timestamp: Duration);

    fn layout(&mut self);

    fn paint(&mut self, target: &mut PaintTarget<'_>);

    /// Returns whether the engine handled the event.
    fn dispatch_input(&mut self, event: &InputEvent) -> bool;

    fn set_focus(&mut self, focused: bool);

    /// Whether `point` lies on a region that should move the window.
    fn hit_test_draggable(&mut self, _point: Point) -> bool {
        false
    }

    /// A drag gesture started in this surface has ended.
    fn notify_drag_ended(&mut self, _point: Point, _global: Point) {}
}

/// Owned ARGB (`0xAARRGGBB`) pixel buffer.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    size: Size,
    pixels: Vec<u32>,
}

impl Frame {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            pixels: vec![0; size.area()],
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Resize, keeping nothing. Newly exposed pixels are transparent black.
    pub fn resize(&mut self, size: Size) {
        if self.size != size {
            self.size = size;
            self.pixels.clear();
            self.pixels.resize(size.area(), 0);
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        self.pixels.get((y * self.size.width + x) as usize).copied()
    }

    pub fn fill(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    /// Fill `rect`, clipped to the frame.
    pub fn fill_rect(&mut self, rect: Rect, color: u32) {
        let Some(clipped) = rect.intersection(&Rect::from_size(self.size)) else {
            return;
        };
        let stride = self.size.width as usize;
        let x0 = clipped.origin.x as usize;
        let x1 = x0 + clipped.size.width as usize;
        for y in clipped.origin.y as usize..clipped.bottom() as usize {
            self.pixels[y * stride + x0..y * stride + x1].fill(color);
        }
    }
}

/// Where the engine paints during one commit.
pub struct PaintTarget<'a> {
    frame: &'a mut Frame,
    damage: Rect,
}

impl<'a> PaintTarget<'a> {
    pub fn new(frame: &'a mut Frame, damage: Rect) -> Self {
        Self { frame, damage }
    }

    pub fn size(&self) -> Size {
        self.frame.size()
    }

    /// Region that must be repainted this commit.
    pub fn damage(&self) -> Rect {
        self.damage
    }

    pub fn frame(&mut self) -> &mut Frame {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_rect_clips() {
        let mut frame = Frame::new(Size::new(4, 3));
        frame.fill_rect(Rect::new(2, 1, 10, 10), 0xFF00_00FF);

        assert_eq!(frame.pixel(1, 1), Some(0));
        assert_eq!(frame.pixel(2, 1), Some(0xFF00_00FF));
        assert_eq!(frame.pixel(3, 2), Some(0xFF00_00FF));
        assert_eq!(frame.pixel(4, 2), None);
    }

    #[test]
    fn test_resize_clears() {
        let mut frame = Frame::new(Size::new(2, 2));
        frame.fill(7);
        frame.resize(Size::new(3, 1));
        assert_eq!(frame.pixels(), &[0, 0, 0]);
    }
}
