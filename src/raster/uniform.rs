use glam::{Mat4, Vec3};

use super::TileGrid;
use crate::camera::CameraMatrices;

/// Per-frame transform block shared by every compute stage.
///
/// Field offsets are fixed; the WGSL `TransformUniform` in
/// `modules/uniforms.wgsl` mirrors this struct.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniform {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Number of instance records.
    pub instance_count: u32,
    /// Slots per tile candidate list.
    pub tile_capacity: u32,
    /// `projection · view · model`.
    pub mvp: [[f32; 4]; 4],
    /// `view · model`.
    pub model_view: [[f32; 4]; 4],
    /// Inverse of `mvp`, used to build pixel rays.
    pub inverse_mvp: [[f32; 4]; 4],
    /// Background RGB; the fourth lane is unused.
    pub background: [f32; 4],
    /// Tile grid width.
    pub tiles_x: u32,
    /// Tile grid height.
    pub tiles_y: u32,
    pub(crate) _pad: [u32; 2],
}

const _: () = assert!(size_of::<TransformUniform>() == 240);
const _: () = assert!(std::mem::offset_of!(TransformUniform, tile_capacity) == 12);
const _: () = assert!(std::mem::offset_of!(TransformUniform, mvp) == 16);
const _: () = assert!(std::mem::offset_of!(TransformUniform, model_view) == 80);
const _: () = assert!(std::mem::offset_of!(TransformUniform, inverse_mvp) == 144);
const _: () = assert!(std::mem::offset_of!(TransformUniform, background) == 208);
const _: () = assert!(std::mem::offset_of!(TransformUniform, tiles_x) == 224);

impl TransformUniform {
    /// Fill the block for one frame.
    #[must_use]
    pub fn new(
        grid: TileGrid,
        instance_count: u32,
        tile_capacity: u32,
        camera: &CameraMatrices,
        background: Vec3,
    ) -> Self {
        let mvp = camera.mvp();
        Self {
            width: grid.width,
            height: grid.height,
            instance_count,
            tile_capacity,
            mvp: mvp.to_cols_array_2d(),
            model_view: camera.model_view().to_cols_array_2d(),
            inverse_mvp: mvp.inverse().to_cols_array_2d(),
            background: background.extend(1.0).to_array(),
            tiles_x: grid.tiles_x,
            tiles_y: grid.tiles_y,
            _pad: [0; 2],
        }
    }

    /// The tile grid this block describes.
    #[must_use]
    pub fn grid(&self) -> TileGrid {
        TileGrid::new(self.width, self.height)
    }

    /// `mvp` as a matrix.
    #[must_use]
    pub fn mvp(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.mvp)
    }

    /// `inverse_mvp` as a matrix.
    #[must_use]
    pub fn inverse_mvp(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.inverse_mvp)
    }

    /// Background color.
    #[must_use]
    pub fn background(&self) -> Vec3 {
        Vec3::new(self.background[0], self.background[1], self.background[2])
    }
}
