//! Perspective camera
//!
//! The projection matrix is cached. Changing `fov`, `aspect` or the clip
//! planes has no effect on rendering until [`PerspectiveCamera::update_projection_matrix`]
//! is called, which is what the resize path does after setting the new aspect.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// Perspective camera looking from `position` at `target`
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    /// Camera position in world space
    pub position: Vec3,

    /// Point the camera looks at
    pub target: Vec3,

    /// Up direction used to orient the view
    pub up: Vec3,

    /// Vertical field of view in degrees
    pub fov_degrees: f32,

    /// Viewport width / height
    pub aspect: f32,

    /// Near clip plane distance
    pub near: f32,

    /// Far clip plane distance
    pub far: f32,

    projection: Mat4,
}

impl PerspectiveCamera {
    /// Create a perspective camera at `position` looking at the origin
    ///
    /// # Arguments
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Viewport width divided by height
    /// * `near`, `far` - Clip plane distances, `0 < near < far`
    pub fn new(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::y(),
            fov_degrees,
            aspect,
            near,
            far,
            projection: Mat4::identity(),
        };
        camera.update_projection_matrix();
        camera
    }

    /// Recompute the cached projection from the current parameters
    pub fn update_projection_matrix(&mut self) {
        self.projection = Mat4::perspective(
            utils::deg_to_rad(self.fov_degrees),
            self.aspect,
            self.near,
            self.far,
        );
    }

    /// Set the aspect ratio; call [`Self::update_projection_matrix`] afterwards
    pub fn set_aspect(&mut self, aspect: f32) {
        if (self.aspect - aspect).abs() > 0.01 {
            log::debug!("Camera aspect ratio changed: {:.3} -> {:.3}", self.aspect, aspect);
        }
        self.aspect = aspect;
    }

    /// Point the camera at `target`
    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
        log::trace!("Camera target updated to: {:?}", target);
    }

    /// World-to-camera transform
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.target, self.up)
    }

    /// Cached projection matrix
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection
    }

    /// Projection × view
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }
}
