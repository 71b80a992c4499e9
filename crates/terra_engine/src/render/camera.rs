//! 3D camera: view/projection matrices, viewport and frustum
//!
//! Right-handed Y-up view space with zero-to-one clip depth. Matrices are
//! computed on demand; the camera is cheap to copy and holds no GPU state.

use crate::collision::{Aabb, Frustum, Rect};
use crate::foundation::math::{Mat4, Point3, Vec3, Vec4};

/// Perspective camera consumed by the render pipeline
///
/// Exposes exactly what the pipeline needs: the view matrix, the projection
/// matrix and the viewport dimensions. World position is recovered from the
/// inverse view matrix rather than stored redundantly.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,
    /// Point the camera is looking at in world space
    pub target: Vec3,
    /// Up vector for camera orientation (typically [0, 1, 0])
    pub up: Vec3,
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Viewport size in pixels (width, height)
    pub viewport: (u32, u32),
    /// Distance to the near clipping plane
    pub near: f32,
    /// Distance to the far clipping plane
    pub far: f32,
}

impl Camera {
    /// Create a perspective camera
    ///
    /// # Arguments
    /// * `position` - camera position in world space
    /// * `target` - look-at point in world space
    /// * `up` - up vector (typically `Vec3::y()`)
    /// * `fov_degrees` - vertical field of view in degrees
    /// * `viewport` - output size in pixels
    /// * `near` / `far` - clipping plane distances, `0 < near < far`
    pub fn perspective(
        position: Vec3,
        target: Vec3,
        up: Vec3,
        fov_degrees: f32,
        viewport: (u32, u32),
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            target,
            up,
            fov_y: fov_degrees.to_radians(),
            viewport,
            near,
            far,
        }
    }

    /// Aspect ratio (width / height) of the viewport
    pub fn aspect(&self) -> f32 {
        let (width, height) = self.viewport;
        width as f32 / height as f32
    }

    /// View matrix (world to view space, right-handed)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(
            &Point3::from(self.position),
            &Point3::from(self.target),
            &self.up,
        )
    }

    /// Projection matrix with zero-to-one clip depth
    ///
    /// Right-handed: view space looks down -z, clip z lands in `[0, w]`.
    pub fn projection_matrix(&self) -> Mat4 {
        let f = 1.0 / (self.fov_y * 0.5).tan();
        let depth_scale = self.far / (self.near - self.far);

        Mat4::new(
            f / self.aspect(), 0.0, 0.0, 0.0,
            0.0, f, 0.0, 0.0,
            0.0, 0.0, depth_scale, self.near * depth_scale,
            0.0, 0.0, -1.0, 0.0,
        )
    }

    /// Combined view-projection matrix
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Camera world position recovered from the inverse view matrix
    ///
    /// This is the value uploaded into the shared per-frame uniforms; using
    /// the inverse-view translation keeps it consistent with whatever view
    /// matrix is actually in effect.
    pub fn eye_position(&self) -> Vec3 {
        let inverse = self
            .view_matrix()
            .try_inverse()
            .unwrap_or_else(Mat4::identity);
        Vec3::new(inverse[(0, 3)], inverse[(1, 3)], inverse[(2, 3)])
    }

    /// The camera's view frustum for visibility culling
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection())
    }

    /// Project a world-space AABB to a viewport-pixel rectangle
    ///
    /// Corners behind the camera are skipped; when every corner is behind,
    /// the degenerate empty rectangle is returned.
    pub fn project_bounds(&self, bounds: &Aabb) -> Rect {
        let vp = self.view_projection();
        let (width, height) = self.viewport;
        let (width, height) = (width as f32, height as f32);

        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        let mut any_in_front = false;

        for corner in bounds.corners() {
            let clip = vp * Vec4::new(corner.x, corner.y, corner.z, 1.0);
            if clip.w <= 0.0 {
                continue;
            }
            any_in_front = true;

            let ndc_x = clip.x / clip.w;
            let ndc_y = clip.y / clip.w;
            let screen_x = (ndc_x * 0.5 + 0.5) * width;
            let screen_y = (0.5 - ndc_y * 0.5) * height;

            min_x = min_x.min(screen_x);
            min_y = min_y.min(screen_y);
            max_x = max_x.max(screen_x);
            max_y = max_y.max(screen_y);
        }

        if !any_in_front {
            return Rect::EMPTY;
        }

        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}
