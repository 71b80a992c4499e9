//! Screen-space 2D drawing context for the overlay pass
//!
//! Produced by the pipeline for the duration of the overlay pass only. The
//! scene and GUI layers draw into it; the pipeline closes it before the
//! frame is presented.

use crate::collision::Rect;
use crate::render::device::{GraphicsDevice, TextureHandle};

/// 2D drawing context, valid only during the overlay pass
///
/// Borrows the device for the pass duration, so it cannot escape the frame
/// that created it.
pub struct Context2d<'a> {
    device: &'a mut dyn GraphicsDevice,
    width: u32,
    height: u32,
}

impl<'a> Context2d<'a> {
    pub(crate) fn new(device: &'a mut dyn GraphicsDevice, width: u32, height: u32) -> Self {
        Self {
            device,
            width,
            height,
        }
    }

    /// Viewport width in pixels
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Viewport height in pixels
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Draw a flat-colored quad
    pub fn fill_rect(&mut self, rect: &Rect, color: [f32; 4]) {
        self.device.draw_quad_2d(rect, None, color);
    }

    /// Draw a textured quad, tinted by `color`
    pub fn draw_texture(&mut self, rect: &Rect, texture: TextureHandle, color: [f32; 4]) {
        self.device.draw_quad_2d(rect, Some(texture), color);
    }
}
