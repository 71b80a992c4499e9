//! Collaborator interfaces consumed by the render pipeline
//!
//! The pipeline does not own game state. Each frame it asks the active
//! scene and every registered game subsystem to append their drawable items,
//! reads the scene's lighting configuration, and hands the overlay layers a
//! 2D drawing context. These traits are that contract.

use crate::render::device::TextureHandle;
use crate::render::lighting::SceneLighting;
use crate::render::{Camera, Context2d, RenderList};

/// The active 3D scene
pub trait Scene {
    /// Append this frame's drawable items to the render list
    fn build_render_list(&mut self, list: &mut RenderList, camera: &Camera);

    /// Current lighting configuration
    fn lighting(&self) -> SceneLighting;

    /// The terrain surface, when the scene has one loaded
    fn terrain(&self) -> Option<&dyn TerrainSurface>;

    /// Draw the scene's own 2D overlays (selection boxes, markers)
    ///
    /// Called during the overlay pass, after all 3D submission. The default
    /// draws nothing.
    fn render_overlay(&mut self, _context: &mut Context2d<'_>) {}
}

/// Terrain surface exposed by the active scene
pub trait TerrainSurface {
    /// The scrolling cloud-shadow texture, when cloud shadows are active
    fn cloud_shadow_texture(&self) -> Option<TextureHandle>;
}

/// A registered game subsystem that contributes drawable items
pub trait GameSystem {
    /// Append this frame's drawable items to the render list
    fn build_render_list(&mut self, list: &mut RenderList);
}

/// The 2D scene (GUI layer) drawn during the overlay pass
pub trait OverlayScene {
    /// Draw the 2D scene into the overlay context
    fn render(&mut self, context: &mut Context2d<'_>);
}
