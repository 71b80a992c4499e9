//! # Terra Engine
//!
//! The per-frame rendering core of a terrain-based strategy engine, paired
//! with the collision-primitive hierarchy that shares its geometric
//! intersection machinery.
//!
//! ## Features
//!
//! - **Render Pipeline**: single-threaded per-frame orchestration — gather,
//!   cull, sort, state-diffed submission, 2D overlay pass, present
//! - **Frustum Culling**: conservative visibility filtering against the
//!   camera frustum (never drops a visible item)
//! - **Collider Hierarchy**: box/sphere/cylinder primitives for ray picking,
//!   frustum tests and screen-bound projection
//! - **Device Abstraction**: the pipeline targets an abstract graphics
//!   device capability, not a specific graphics API
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use terra_engine::prelude::*;
//!
//! fn render(pipeline: &mut RenderPipeline, camera: &Camera) -> RenderResult<()> {
//!     pipeline.execute(FrameContext {
//!         scene: None,
//!         overlay: None,
//!         systems: &mut [],
//!         camera,
//!         elapsed_seconds: 0.0,
//!     })
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod collision;
pub mod foundation;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        collision::{Collider, GeometryDesc, GeometryKind, Ray},
        foundation::math::{Mat4, SharedTransform, Transform, Vec3},
        render::{
            Bucket, Camera, FrameContext, RenderItem, RenderList, RenderPipeline,
            RenderPipelineConfig, RenderResult,
        },
        scene::{GameSystem, OverlayScene, Scene, TerrainSurface},
    };
}
