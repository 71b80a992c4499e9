//! Render items: one draw call's worth of state
//!
//! A [`RenderItem`] is produced by a collaborator during the gather phase
//! and held in the render list for the duration of that frame only. Items
//! are plain `Copy` values referencing device resources by handle and
//! effects/materials by registry key.

use crate::collision::Aabb;
use crate::foundation::math::Mat4;
use crate::render::device::{IndexBufferHandle, VertexBufferHandle};
use crate::render::materials::{EffectKey, MaterialKey};

/// How a render item's geometry is drawn
///
/// A closed set: the submission loop matches exhaustively, so a malformed
/// draw kind is unrepresentable rather than a runtime error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKind {
    /// Non-indexed draw over a vertex range
    Linear,
    /// Indexed draw over an index range
    Indexed,
}

/// Everything needed to issue one draw call
///
/// Immutable for the frame in which it is produced. `bounds` is the item's
/// world-space bounding box, computed by the producing collaborator and
/// consumed by the culler.
#[derive(Debug, Clone, Copy)]
pub struct RenderItem {
    /// Effect (shader program) key
    pub effect: EffectKey,
    /// Material key
    pub material: MaterialKey,
    /// Vertex buffers: primary in slot 0, optional secondary in slot 1
    pub vertex_buffers: [Option<VertexBufferHandle>; 2],
    /// Index buffer for [`DrawKind::Indexed`] items
    pub index_buffer: Option<IndexBufferHandle>,
    /// Vertices to draw (`Linear` only)
    pub vertex_count: u32,
    /// First vertex of the draw range (`Linear`) or base vertex (`Indexed`)
    pub first_vertex: u32,
    /// Indices to draw (`Indexed` only)
    pub index_count: u32,
    /// First index of the draw range (`Indexed` only)
    pub first_index: u32,
    /// World transform matrix
    pub world: Mat4,
    /// World-space bounding box for frustum culling
    pub bounds: Aabb,
    /// Draw kind tag
    pub kind: DrawKind,
}

impl RenderItem {
    /// Create a non-indexed item drawing `vertex_count` vertices
    pub fn linear(
        effect: EffectKey,
        material: MaterialKey,
        vertex_buffer: VertexBufferHandle,
        vertex_count: u32,
        world: Mat4,
        bounds: Aabb,
    ) -> Self {
        Self {
            effect,
            material,
            vertex_buffers: [Some(vertex_buffer), None],
            index_buffer: None,
            vertex_count,
            first_vertex: 0,
            index_count: 0,
            first_index: 0,
            world,
            bounds,
            kind: DrawKind::Linear,
        }
    }

    /// Create an indexed item drawing `index_count` indices
    pub fn indexed(
        effect: EffectKey,
        material: MaterialKey,
        vertex_buffer: VertexBufferHandle,
        index_buffer: IndexBufferHandle,
        index_count: u32,
        world: Mat4,
        bounds: Aabb,
    ) -> Self {
        Self {
            effect,
            material,
            vertex_buffers: [Some(vertex_buffer), None],
            index_buffer: Some(index_buffer),
            vertex_count: 0,
            first_vertex: 0,
            index_count,
            first_index: 0,
            world,
            bounds,
            kind: DrawKind::Indexed,
        }
    }

    /// Builder pattern: attach a secondary vertex buffer (slot 1)
    #[must_use]
    pub const fn with_secondary_vertex_buffer(mut self, buffer: VertexBufferHandle) -> Self {
        self.vertex_buffers[1] = Some(buffer);
        self
    }

    /// Sort key grouping items by effect, then material, then primary
    /// vertex buffer
    ///
    /// Makes consecutive duplicates adjacent so expensive state transitions
    /// can be skipped during submission.
    pub(crate) fn state_key(
        &self,
    ) -> (EffectKey, MaterialKey, Option<VertexBufferHandle>) {
        (self.effect, self.material, self.vertex_buffers[0])
    }
}
