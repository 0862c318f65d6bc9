use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::camera::Camera;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Camera projection and control parameters.
pub struct CameraOptions {
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Far clipping plane distance.
    pub zfar: f32,
    /// Initial orbit distance from the focus point, along +Z.
    pub distance: f32,
    /// Rotation sensitivity multiplier.
    pub rotate_speed: f32,
    /// Pan sensitivity multiplier.
    pub pan_speed: f32,
    /// Zoom sensitivity multiplier.
    pub zoom_speed: f32,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            fovy: 45.0,
            znear: 0.1,
            zfar: 100.0,
            distance: 5.0,
            rotate_speed: 0.5,
            pan_speed: 0.5,
            zoom_speed: 0.1,
        }
    }
}

impl CameraOptions {
    /// A camera at `eye` looking at `target` with these projection
    /// settings. `fovy` overrides the configured field of view.
    #[must_use]
    pub fn look_at(
        &self,
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        aspect: f32,
        fovy: Option<f32>,
    ) -> Camera {
        Camera {
            eye,
            target,
            up,
            aspect,
            fovy: fovy.unwrap_or(self.fovy),
            znear: self.znear,
            zfar: self.zfar.max(self.znear + f32::EPSILON),
        }
    }
}
