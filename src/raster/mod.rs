//! Tile-based rasterization: shared layouts and the CPU reference kernels.
//!
//! The three compute stages (clear, bin, rasterize) exist twice: as WGSL
//! under `assets/shaders/compute/` and as the CPU port in [`cpu`]. Both read
//! the same [`TransformUniform`] and [`InstanceRecord`](crate::encoding::InstanceRecord)
//! layouts, so the CPU port pins the device semantics in tests.

pub mod bounds;
pub mod composite;
pub mod cpu;
pub mod shapes;
mod uniform;

pub use uniform::TransformUniform;

/// Tile edge in pixels; one 16×16 workgroup per tile.
pub const TILE_SIZE: u32 = 16;

/// Fragments kept per pixel, nearest first.
pub const MAX_FRAGMENTS: usize = 32;

/// Transforms with `|det|` below this contribute nothing.
pub const DEGENERATE_DET: f32 = 1e-12;

/// Screen size and the tile grid covering it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `ceil(width / TILE_SIZE)`.
    pub tiles_x: u32,
    /// `ceil(height / TILE_SIZE)`.
    pub tiles_y: u32,
}

impl TileGrid {
    /// Grid for a `width × height` target.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles_x: width.div_ceil(TILE_SIZE),
            tiles_y: height.div_ceil(TILE_SIZE),
        }
    }

    /// Total number of tiles.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.tiles_x as usize * self.tiles_y as usize
    }

    /// Total number of pixels.
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Index of the tile containing pixel `(x, y)`.
    #[must_use]
    pub fn tile_of(&self, x: u32, y: u32) -> usize {
        (y / TILE_SIZE) as usize * self.tiles_x as usize + (x / TILE_SIZE) as usize
    }
}

/// Slots per tile list: the instance count, lowered so that the lists fit
/// in `max_bytes`.
///
/// Returns the capacity and whether it had to be reduced.
#[must_use]
pub fn tile_capacity(grid: TileGrid, instance_count: u32, max_bytes: u64) -> (u32, bool) {
    let tiles = grid.tile_count().max(1) as u64;
    let budget = (max_bytes / (tiles * 4)).min(u64::from(u32::MAX)) as u32;
    if instance_count > budget {
        (budget.max(1), true)
    } else {
        (instance_count.max(1), false)
    }
}

/// Per-instance data the binner hands to the rasterizer.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PreparedInstance {
    /// World → object, column-major.
    pub inverse: [f32; 16],
    /// Non-zero when the transform is invertible and the tag is known.
    pub valid: u32,
    pub(crate) _pad: [u32; 3],
}

const _: () = assert!(size_of::<PreparedInstance>() == 80);

impl PreparedInstance {
    /// Placeholder for a record that contributes nothing.
    pub const INVALID: Self = Self {
        inverse: [0.0; 16],
        valid: 0,
        _pad: [0; 3],
    };

    /// Whether the instance takes part in rasterization.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid != 0
    }

    /// The world → object matrix.
    #[must_use]
    pub fn inverse(&self) -> glam::Mat4 {
        glam::Mat4::from_cols_array(&self.inverse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_rounds_up_partial_tiles() {
        let grid = TileGrid::new(33, 16);
        assert_eq!((grid.tiles_x, grid.tiles_y), (3, 1));
        assert_eq!(grid.tile_count(), 3);
        assert_eq!(grid.tile_of(32, 15), 2);
    }

    #[test]
    fn capacity_is_instance_count_until_the_budget_bites() {
        let grid = TileGrid::new(64, 64);
        assert_eq!(tile_capacity(grid, 100, 1 << 20), (100, false));
        // 16 tiles × 4 bytes = 64 bytes per slot row.
        assert_eq!(tile_capacity(grid, 100, 64 * 10), (10, true));
        assert_eq!(tile_capacity(grid, 0, 1 << 20), (1, false));
    }
}
