//! # Rendering System
//!
//! The per-frame rendering core: drawable item containers, frustum culling,
//! uniform management and the pipeline that orchestrates one frame from
//! gather to present.
//!
//! ## Architecture
//!
//! - **RenderPipeline**: owns all GPU-side buffer resources and the render
//!   list; runs the per-frame state machine
//! - **RenderList / RenderBucket**: per-frame containers of pending items,
//!   partitioned by blend requirement
//! - **Culler**: conservative visibility filter against the camera frustum
//! - **GraphicsDevice**: abstract capability the pipeline records against —
//!   no concrete graphics API leaks into the orchestration
//!
//! Data flows one direction per frame: game state → render list → culler →
//! sorted draw stream → graphics device → presented frame.

pub mod camera;
pub mod context2d;
pub mod culler;
pub mod device;
pub mod item;
pub mod lighting;
pub mod list;
pub mod materials;
pub mod pipeline;
pub mod uniforms;

pub use camera::Camera;
pub use context2d::Context2d;
pub use device::{
    BufferHandle, ClearFlags, GraphicsDevice, IndexBufferHandle, TextureHandle,
    VertexBufferHandle,
};
pub use item::{DrawKind, RenderItem};
pub use lighting::{LightingClass, LightingConstants, SceneLighting};
pub use list::{Bucket, RenderBucket, RenderList};
pub use materials::{
    BlendMode, CullMode, Effect, EffectKey, EffectRegistry, Material, MaterialKey,
    MaterialRegistry, PipelineState,
};
pub use pipeline::{FrameContext, RenderPipeline, RenderPipelineConfig};

use thiserror::Error;

/// Errors reported by the rendering system
///
/// No error here is retried: a broken frame is unrecoverable for that frame
/// and the next frame's fresh state-machine run makes progress instead.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Pipeline construction failed during setup
    ///
    /// The pipeline must not partially construct; resources created before
    /// the failure are released before this propagates.
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// A rendering operation failed during frame execution
    ///
    /// Fatal for the frame: a half-submitted frame cannot be meaningfully
    /// salvaged.
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// GPU resource creation or upload failed
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// Device-specific error wrapped in a generic form
    #[error("Device error: {0}")]
    DeviceError(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
