//! Collider hierarchy for ray picking and visibility tests
//!
//! A closed set of shape primitives (box, sphere, cylinder) built from a
//! game object's geometry descriptor. Each collider reads the owning
//! object's [`Transform`](crate::foundation::math::Transform) through a
//! shared handle at query time; it never owns or mutates it.

use log::trace;

use crate::collision::primitives::{Aabb, Frustum, Ray, Rect};
use crate::foundation::math::{SharedTransform, Vec3};
use crate::render::Camera;

/// Geometry kind tag decoded from object definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    /// Object has no selectable geometry
    None,
    /// Axis-aligned box
    Box,
    /// Sphere centered at the local origin
    Sphere,
    /// Upright cylinder (collision-tested as its bounding box)
    Cylinder,
}

impl GeometryKind {
    /// Decode a raw geometry tag from object definition data
    ///
    /// # Panics
    /// Panics on a tag outside the recognized set. An unknown tag means the
    /// upstream definition decoder produced garbage; guessing a shape here
    /// would hide the defect.
    pub fn from_raw(tag: u8) -> Self {
        match tag {
            0 => Self::None,
            1 => Self::Box,
            2 => Self::Sphere,
            3 => Self::Cylinder,
            other => panic!("unrecognized geometry kind tag: {other}"),
        }
    }
}

/// Shape description for a game object's selectable geometry
///
/// Radii and height are in local units; how they map to a shape depends on
/// the geometry kind (see [`Collider::from_geometry`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryDesc {
    /// Geometry kind tag
    pub kind: GeometryKind,
    /// Major radius (box x half-extent, sphere/cylinder radius)
    pub major_radius: f32,
    /// Minor radius (box y half-extent; unused by sphere and cylinder)
    pub minor_radius: f32,
    /// Height along local +z (unused by sphere)
    pub height: f32,
}

/// Collision primitive bound to a game object's transform
///
/// The shape set is fixed and exhaustively enumerable, so this is a closed
/// tagged variant rather than an open trait hierarchy. All world-space
/// queries assume the owning transform has **uniform scale only**; ray hit
/// distances are recovered by multiplying the local-space distance with the
/// single scale factor. This is a known, documented limitation.
#[derive(Debug, Clone)]
pub enum Collider {
    /// Axis-aligned box spanning x in [-rMaj, rMaj], y in [-rMin, rMin], z in [0, h]
    Box {
        /// Local-space bounds
        bounds: Aabb,
        /// Owning object's transform
        transform: SharedTransform,
    },
    /// Sphere of radius rMaj centered at the local origin
    Sphere {
        /// Sphere radius
        radius: f32,
        /// Owning object's transform
        transform: SharedTransform,
    },
    /// Cylinder approximated as the box x,y in [-rMaj, rMaj], z in [0, h]
    ///
    /// Not a true cylindrical test. The approximation is intentional and
    /// matches shipped content expectations; do not replace it with an
    /// exact test.
    Cylinder {
        /// Local-space bounds of the approximating box
        bounds: Aabb,
        /// Owning object's transform
        transform: SharedTransform,
    },
}

impl Collider {
    /// Construct the collider variant matching a geometry descriptor
    ///
    /// Returns `None` for [`GeometryKind::None`]: absence of selectable
    /// geometry, not a null object.
    pub fn from_geometry(desc: &GeometryDesc, transform: SharedTransform) -> Option<Self> {
        let collider = match desc.kind {
            GeometryKind::None => return None,
            GeometryKind::Box => Self::Box {
                bounds: Aabb::new(
                    Vec3::new(-desc.major_radius, -desc.minor_radius, 0.0),
                    Vec3::new(desc.major_radius, desc.minor_radius, desc.height),
                ),
                transform,
            },
            GeometryKind::Sphere => Self::Sphere {
                radius: desc.major_radius,
                transform,
            },
            GeometryKind::Cylinder => Self::Cylinder {
                bounds: Aabb::new(
                    Vec3::new(-desc.major_radius, -desc.major_radius, 0.0),
                    Vec3::new(desc.major_radius, desc.major_radius, desc.height),
                ),
                transform,
            },
        };
        trace!("created {:?} collider", desc.kind);
        Some(collider)
    }

    fn transform(&self) -> &SharedTransform {
        match self {
            Self::Box { transform, .. }
            | Self::Sphere { transform, .. }
            | Self::Cylinder { transform, .. } => transform,
        }
    }

    /// Local-space bounds of the shape
    fn local_bounds(&self) -> Aabb {
        match self {
            Self::Box { bounds, .. } | Self::Cylinder { bounds, .. } => *bounds,
            Self::Sphere { radius, .. } => {
                Aabb::from_center_extents(Vec3::zeros(), Vec3::new(*radius, *radius, *radius))
            }
        }
    }

    /// Test a world-space ray against this collider
    ///
    /// Transforms the ray into local space with the transform's cached
    /// inverse matrix, runs the shape-local test, and multiplies the local
    /// distance by the uniform scale factor to recover world distance.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let transform = self.transform().borrow();
        let inverse = transform.inverse_matrix();

        let local_origin = inverse
            .transform_point(&crate::foundation::math::Point3::from(ray.origin))
            .coords;
        let local_direction = inverse.transform_vector(&ray.direction);
        let local_ray = Ray::new(local_origin, local_direction);

        let local_distance = match self {
            Self::Box { bounds, .. } | Self::Cylinder { bounds, .. } => {
                bounds.intersect_ray(&local_ray)
            }
            Self::Sphere { radius, .. } => intersect_ray_sphere(&local_ray, *radius),
        };

        local_distance.map(|d| d * transform.scale())
    }

    /// Test this collider against a view frustum
    ///
    /// Conservative: transforms the local bounds into a world-space AABB and
    /// runs the positive-vertex test, so it never reports a visible collider
    /// as outside.
    pub fn intersects_frustum(&self, frustum: &Frustum) -> bool {
        let transform = self.transform().borrow();
        let world_bounds = self.local_bounds().transformed(transform.matrix());
        frustum.intersects_aabb(&world_bounds)
    }

    /// Screen-space bounding rectangle of this collider in viewport pixels
    ///
    /// Projects the world-space corners of the shape's bounds through the
    /// camera. Sphere colliders return [`Rect::EMPTY`] unconditionally:
    /// nothing shipped uses spherical selectable geometry, so the projection
    /// is intentionally unimplemented rather than speculatively wrong.
    pub fn bounding_rectangle(&self, camera: &Camera) -> Rect {
        if matches!(self, Self::Sphere { .. }) {
            return Rect::EMPTY;
        }

        let transform = self.transform().borrow();
        let world_bounds = self.local_bounds().transformed(transform.matrix());
        camera.project_bounds(&world_bounds)
    }
}

/// Ray/sphere intersection in local space, sphere centered at the origin
///
/// Standard quadratic solution; returns the closest non-negative root.
fn intersect_ray_sphere(ray: &Ray, radius: f32) -> Option<f32> {
    let oc = ray.origin;
    let a = ray.direction.dot(&ray.direction);
    let b = 2.0 * oc.dot(&ray.direction);
    let c = oc.dot(&oc) - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_discriminant = discriminant.sqrt();
    let t1 = (-b - sqrt_discriminant) / (2.0 * a);
    let t2 = (-b + sqrt_discriminant) / (2.0 * a);

    if t1 >= 0.0 {
        Some(t1)
    } else if t2 >= 0.0 {
        Some(t2)
    } else {
        None
    }
}
