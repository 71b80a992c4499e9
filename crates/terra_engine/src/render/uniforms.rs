//! Uniform block layouts mirrored into GPU-resident buffers
//!
//! Small fixed-layout value records, each paired 1:1 with a buffer owned by
//! the render pipeline. Layouts are `#[repr(C)]` with explicit padding so
//! the CPU-side bytes can be uploaded verbatim.

use bytemuck::{Pod, Zeroable};

/// Uniform bind slot for [`SharedFrameUniforms`]
pub const SHARED_FRAME_SLOT: u32 = 0;

/// Uniform bind slot for [`FrameMatrixUniforms`]
pub const FRAME_MATRIX_SLOT: u32 = 1;

/// Uniform bind slot for [`ObjectUniforms`]
pub const OBJECT_SLOT: u32 = 2;

/// Uniform bind slot for the active lighting block
pub const LIGHTING_SLOT: u32 = 3;

/// Texture slot for the environment-driven cloud-shadow map
pub const CLOUD_SHADOW_TEXTURE_SLOT: u32 = 7;

/// Per-frame values shared by every shader stage
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SharedFrameUniforms {
    /// Camera position in world space (w unused)
    pub camera_position: [f32; 4],
    /// Elapsed time since engine start, in seconds
    pub elapsed_seconds: f32,
    /// Pad to 16-byte alignment
    pub _padding: [f32; 3],
}

/// Per-frame matrices and viewport for the vertex/pixel stages
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameMatrixUniforms {
    /// Combined view-projection matrix, column-major
    pub view_projection: [[f32; 4]; 4],
    /// Viewport size in pixels
    pub viewport: [f32; 2],
    /// Pad to 16-byte alignment
    pub _padding: [f32; 2],
}

/// Per-object values rewritten for every unique world transform
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectUniforms {
    /// World transform matrix, column-major
    pub world: [[f32; 4]; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_blocks_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<SharedFrameUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<FrameMatrixUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<ObjectUniforms>() % 16, 0);
    }

    #[test]
    fn test_uniform_blocks_upload_as_bytes() {
        let block = ObjectUniforms {
            world: [[1.0; 4]; 4],
        };
        let bytes = bytemuck::bytes_of(&block);
        assert_eq!(bytes.len(), 64);
    }
}
