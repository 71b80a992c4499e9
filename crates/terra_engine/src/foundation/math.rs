//! Math utilities and types
//!
//! Provides fundamental math types for 3D graphics and game development.

use std::cell::RefCell;
use std::rc::Rc;

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Shared read handle to a game object's transform
///
/// Colliders hold one of these rather than owning the transform: the game
/// object remains the single writer, and the collider only reads the cached
/// matrices at query time. Single-threaded by design (rendering thread).
pub type SharedTransform = Rc<RefCell<Transform>>;

/// Position, rotation and uniform scale with cached matrices
///
/// The forward and inverse matrices are recomputed whenever a component is
/// set, so `matrix()` and `inverse_matrix()` are plain cache reads on the
/// hot path (culling and picking query them every frame).
///
/// Scale is deliberately uniform: collider ray queries recover world-space
/// hit distance by multiplying the local-space distance with this single
/// factor, which is only valid when all axes scale equally.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    position: Vec3,
    rotation: Quat,
    scale: f32,
    matrix: Mat4,
    inverse: Mat4,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Create an identity transform
    pub fn identity() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: 1.0,
            matrix: Mat4::identity(),
            inverse: Mat4::identity(),
        }
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        let mut transform = Self::identity();
        transform.set_position(position);
        transform
    }

    /// Builder pattern: set position
    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.set_position(position);
        self
    }

    /// Builder pattern: set rotation
    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.set_rotation(rotation);
        self
    }

    /// Builder pattern: set uniform scale
    #[must_use]
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.set_scale(scale);
        self
    }

    /// Wrap this transform in a shared read handle
    pub fn into_shared(self) -> SharedTransform {
        Rc::new(RefCell::new(self))
    }

    /// Set the world-space position and refresh the cached matrices
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.recompute();
    }

    /// Set the world-space rotation and refresh the cached matrices
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.recompute();
    }

    /// Set the uniform scale factor and refresh the cached matrices
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
        self.recompute();
    }

    /// World-space position
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// World-space rotation
    pub const fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Uniform scale factor
    pub const fn scale(&self) -> f32 {
        self.scale
    }

    /// Cached local-to-world matrix (TRS order)
    pub const fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    /// Cached world-to-local matrix
    pub const fn inverse_matrix(&self) -> &Mat4 {
        &self.inverse
    }

    fn recompute(&mut self) {
        self.matrix = Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_scaling(self.scale);

        // Inverse composed directly from the TRS components instead of a
        // general 4x4 inversion: S^-1 * R^-1 * T^-1.
        self.inverse = Mat4::new_scaling(1.0 / self.scale)
            * self.rotation.inverse().to_homogeneous()
            * Mat4::new_translation(&-self.position);
    }
}
