//! Graphics device abstraction
//!
//! Defines the capability the render pipeline programs against. The pipeline
//! never talks to a concrete graphics API; it records state-setting and draw
//! calls through this trait and relies on the implementation to translate
//! them. This keeps the orchestration testable against an instrumented
//! stand-in device.

use bitflags::bitflags;

use crate::collision::Rect;
use crate::render::materials::{EffectKey, PipelineState};
use crate::render::RenderResult;

/// Handle to a GPU buffer owned by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferHandle(pub u64);

/// Handle to a texture or render target owned by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextureHandle(pub u64);

/// Handle to a vertex buffer owned by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexBufferHandle(pub u64);

/// Handle to an index buffer owned by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexBufferHandle(pub u64);

bitflags! {
    /// Which attachments to clear at the start of a frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u32 {
        /// Clear the color attachment
        const COLOR = 0b001;
        /// Clear the depth attachment
        const DEPTH = 0b010;
        /// Clear the stencil attachment
        const STENCIL = 0b100;
    }
}

/// Abstract graphics device capability
///
/// Contract notes:
/// - all operations run synchronously on the rendering thread;
/// - `begin_recording` / `end_recording` bracket every state-setting and
///   draw call of a frame, and the pipeline guarantees `end_recording` runs
///   before any mid-frame error propagates;
/// - resource creation failures are reported through [`RenderResult`] and
///   are fatal for the operation that needed the resource.
pub trait GraphicsDevice {
    // --- resource management -------------------------------------------------

    /// Create a GPU-resident uniform buffer of `len` bytes
    fn create_uniform_buffer(&mut self, len: usize) -> RenderResult<BufferHandle>;

    /// Create an offscreen render target (used for the shadow map)
    fn create_render_target(&mut self, width: u32, height: u32) -> RenderResult<TextureHandle>;

    /// Release a buffer created by this device
    fn destroy_buffer(&mut self, buffer: BufferHandle);

    /// Release a texture created by this device
    fn destroy_texture(&mut self, texture: TextureHandle);

    /// Device-provided opaque-white fallback texture
    ///
    /// Bound in place of optional environment textures (cloud shadows) when
    /// no scene or terrain supplies one.
    fn white_texture(&self) -> TextureHandle;

    // --- frame bracket -------------------------------------------------------

    /// Begin recording the command sequence for one frame
    fn begin_recording(&mut self) -> RenderResult<()>;

    /// End recording
    ///
    /// Infallible by contract: a device must always be able to close an open
    /// recording so a failed frame is never left half-open.
    fn end_recording(&mut self);

    /// Submit the recorded commands and present the output
    fn present(&mut self) -> RenderResult<()>;

    // --- frame setup ---------------------------------------------------------

    /// Bind the swapchain output target for rendering
    fn bind_output_target(&mut self) -> RenderResult<()>;

    /// Clear the selected attachments
    fn clear(&mut self, flags: ClearFlags, color: [f32; 4], depth: f32) -> RenderResult<()>;

    /// Set the viewport to the current output size
    fn set_viewport(&mut self, width: u32, height: u32);

    // --- uniforms ------------------------------------------------------------

    /// Upload bytes into a uniform buffer
    fn write_buffer(&mut self, buffer: BufferHandle, data: &[u8]) -> RenderResult<()>;

    /// Bind a uniform buffer to a shader-visible slot
    fn bind_uniform_buffer(&mut self, slot: u32, buffer: BufferHandle);

    // --- draw stream ---------------------------------------------------------

    /// Begin the pipeline program of an effect
    fn begin_effect(&mut self, effect: EffectKey) -> RenderResult<()>;

    /// Apply fixed-function pipeline state (blend/depth/raster)
    fn apply_pipeline_state(&mut self, state: &PipelineState);

    /// Bind a texture to a shader-visible slot
    fn bind_texture(&mut self, slot: u32, texture: TextureHandle);

    /// Bind a vertex buffer to an input slot
    fn bind_vertex_buffer(&mut self, slot: u32, buffer: VertexBufferHandle);

    /// Bind the index buffer
    fn bind_index_buffer(&mut self, buffer: IndexBufferHandle);

    /// Issue a non-indexed draw call
    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> RenderResult<()>;

    /// Issue an indexed draw call
    fn draw_indexed(
        &mut self,
        index_count: u32,
        first_index: u32,
        vertex_offset: i32,
    ) -> RenderResult<()>;

    // --- 2D overlay ----------------------------------------------------------

    /// Begin a screen-space drawing context sized to the viewport
    fn begin_2d(&mut self, width: u32, height: u32) -> RenderResult<()>;

    /// Draw a textured or flat-colored quad in screen space
    fn draw_quad_2d(&mut self, rect: &Rect, texture: Option<TextureHandle>, color: [f32; 4]);

    /// End the screen-space drawing context
    fn end_2d(&mut self);
}
