//! Effects, materials and their registries
//!
//! An *effect* is a shader program descriptor plus its declared parameter
//! slots; a *material* binds concrete parameter values and fixed pipeline
//! state to an effect. Render items reference both by slotmap key, so the
//! per-frame containers stay small and `Copy`.

use slotmap::{new_key_type, SlotMap};

use crate::render::device::TextureHandle;
use crate::render::lighting::LightingClass;

new_key_type! {
    /// Key identifying an effect in the [`EffectRegistry`]
    pub struct EffectKey;

    /// Key identifying a material in the [`MaterialRegistry`]
    pub struct MaterialKey;
}

/// Shader program descriptor
#[derive(Debug, Clone)]
pub struct Effect {
    /// Human-readable name for logging and debugging
    pub name: String,
    /// Whether the program declares the per-object uniform block
    ///
    /// Effects without it (skyboxes, full-screen passes) skip the
    /// per-object buffer bind entirely.
    pub has_object_uniforms: bool,
}

/// Alpha blending mode for a material's fixed pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// No blending; fragment replaces the target
    Opaque,
    /// Standard source-alpha blending
    Alpha,
    /// Additive blending
    Additive,
}

/// Triangle facing culled by the rasterizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    /// No face culling
    None,
    /// Cull back faces (default for solid geometry)
    Back,
    /// Cull front faces
    Front,
}

/// Fixed-function pipeline state bound with a material
///
/// Compared field-by-field during submission so redundant state transitions
/// can be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineState {
    /// Blending mode
    pub blend: BlendMode,
    /// Depth test enabled
    pub depth_test: bool,
    /// Depth writes enabled
    pub depth_write: bool,
    /// Rasterizer face culling
    pub cull_mode: CullMode,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            blend: BlendMode::Opaque,
            depth_test: true,
            depth_write: true,
            cull_mode: CullMode::Back,
        }
    }
}

/// Bound parameter values plus pipeline state for one effect
#[derive(Debug, Clone)]
pub struct Material {
    /// The effect this material is bound to
    pub effect: EffectKey,
    /// Fixed pipeline state applied when the material becomes current
    pub state: PipelineState,
    /// Which lighting uniform block the material binds
    pub lighting: LightingClass,
    /// Remaining bound texture parameters as (slot, texture) pairs
    pub textures: Vec<(u32, TextureHandle)>,
}

/// Registry of effect descriptors keyed by [`EffectKey`]
#[derive(Debug, Default)]
pub struct EffectRegistry {
    effects: SlotMap<EffectKey, Effect>,
}

impl EffectRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an effect and return its key
    pub fn register(&mut self, effect: Effect) -> EffectKey {
        self.effects.insert(effect)
    }

    /// Look up an effect by key
    pub fn get(&self, key: EffectKey) -> Option<&Effect> {
        self.effects.get(key)
    }

    /// Number of registered effects
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// True when no effects are registered
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

/// Registry of materials keyed by [`MaterialKey`]
#[derive(Debug, Default)]
pub struct MaterialRegistry {
    materials: SlotMap<MaterialKey, Material>,
}

impl MaterialRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a material and return its key
    pub fn register(&mut self, material: Material) -> MaterialKey {
        self.materials.insert(material)
    }

    /// Look up a material by key
    pub fn get(&self, key: MaterialKey) -> Option<&Material> {
        self.materials.get(key)
    }

    /// Number of registered materials
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// True when no materials are registered
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
