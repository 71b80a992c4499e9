//! Lighting classes and their uniform constants
//!
//! The engine lights geometry through two independent lighting classes:
//! *Terrain* for the ground surface and *Object* for everything placed on
//! it. Each class has its own uniform buffer, uploaded once per frame from
//! the active scene's lighting configuration.

use bytemuck::{Pod, Zeroable};

/// Which lighting uniform block a material binds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightingClass {
    /// Unlit material; no lighting buffer is bound
    #[default]
    None,
    /// Terrain-surface lighting constants
    Terrain,
    /// Object lighting constants
    Object,
}

/// Lighting constants for one lighting class
///
/// Uploaded verbatim as a uniform block; kept `#[repr(C)]` and `Pod` so the
/// pipeline can write it without an intermediate staging struct.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightingConstants {
    /// Ambient light color (rgb, a unused)
    pub ambient: [f32; 4],
    /// Diffuse light color (rgb, a unused)
    pub diffuse: [f32; 4],
    /// Specular light color (rgb, a unused)
    pub specular: [f32; 4],
    /// Normalized light direction in world space (w unused)
    pub direction: [f32; 4],
}

impl Default for LightingConstants {
    /// Neutral overhead daylight; used when no scene is active
    fn default() -> Self {
        Self {
            ambient: [0.35, 0.35, 0.38, 1.0],
            diffuse: [1.0, 0.97, 0.9, 1.0],
            specular: [0.6, 0.6, 0.6, 1.0],
            direction: [-0.4, -0.8, 0.45, 0.0],
        }
    }
}

/// The scene's lighting configuration as read by the pipeline each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneLighting {
    /// Time of day in hours, `[0, 24)`; drives day/night shading
    pub time_of_day: f32,
    /// Whether terrain cloud shadows are enabled for the current map
    pub cloud_shadows_enabled: bool,
    /// Constants for the Terrain lighting class
    pub terrain: LightingConstants,
    /// Constants for the Object lighting class
    pub object: LightingConstants,
}

impl Default for SceneLighting {
    fn default() -> Self {
        Self {
            time_of_day: 12.0,
            cloud_shadows_enabled: false,
            terrain: LightingConstants::default(),
            object: LightingConstants::default(),
        }
    }
}
