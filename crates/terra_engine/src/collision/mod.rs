//! Collision primitives and the collider hierarchy
//!
//! Shared geometric-intersection machinery for ray picking and frustum
//! visibility tests. Colliders are created once per game object from its
//! geometry definition and destroyed with the object.

mod collider;
pub mod primitives;

pub use collider::{Collider, GeometryDesc, GeometryKind};
pub use primitives::{Aabb, Frustum, Plane, Ray, Rect};
