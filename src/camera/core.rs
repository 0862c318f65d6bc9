use glam::{Mat4, Vec3};

/// Perspective camera defined by eye position, target, and projection
/// parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Eye (camera) position in world space.
    pub eye: Vec3,
    /// Look-at target position.
    pub target: Vec3,
    /// Up direction vector.
    pub up: Vec3,
    /// Viewport aspect ratio (width / height).
    pub aspect: f32,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Far clipping plane distance.
    pub zfar: f32,
}

impl Camera {
    /// World → view matrix.
    #[must_use]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// View → clip matrix.
    #[must_use]
    pub fn projection(&self) -> Mat4 {
        // perspective_rh already uses [0,1] depth range (wgpu/Vulkan
        // convention)
        Mat4::perspective_rh(
            self.fovy.to_radians(),
            self.aspect,
            self.znear,
            self.zfar,
        )
    }

    /// Matrices for this camera with an identity model transform.
    #[must_use]
    pub fn matrices(&self) -> CameraMatrices {
        CameraMatrices {
            model: Mat4::IDENTITY,
            view: self.view(),
            projection: self.projection(),
        }
    }
}

/// The per-frame `(model, view, projection)` triple a camera provider
/// yields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    /// Scene → world.
    pub model: Mat4,
    /// World → view.
    pub view: Mat4,
    /// View → clip, `[0, 1]` depth.
    pub projection: Mat4,
}

impl Default for CameraMatrices {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        }
    }
}

impl CameraMatrices {
    /// `projection · view · model`.
    #[must_use]
    pub fn mvp(&self) -> Mat4 {
        self.projection * self.view * self.model
    }

    /// `view · model`.
    #[must_use]
    pub fn model_view(&self) -> Mat4 {
        self.view * self.model
    }
}
