//! CPU ports of the clear, bin and rasterize kernels.
//!
//! These follow the compute shaders step for step: the binner runs one
//! rayon task per instance and appends to the tile lists through atomic
//! counters, the rasterizer runs one task per tile. Tests and benchmarks
//! use them to check the device semantics without a GPU.

use std::sync::atomic::{AtomicU32, Ordering};

use glam::Vec3;
use rayon::prelude::*;

use super::bounds::{object_bounds, screen_bound, tile_range};
use super::composite::{Fragment, FragmentList};
use super::shapes::{hit_depth, Ray};
use super::{PreparedInstance, TileGrid, TransformUniform, DEGENERATE_DET, TILE_SIZE};
use crate::encoding::InstanceRecord;

/// Per-tile candidate lists: a counter and `capacity` slots per tile.
#[derive(Debug)]
pub struct TileLists {
    counts: Vec<AtomicU32>,
    slots: Vec<AtomicU32>,
    capacity: u32,
}

impl TileLists {
    /// Zeroed lists for `tile_count` tiles.
    #[must_use]
    pub fn new(tile_count: usize, capacity: u32) -> Self {
        Self {
            counts: (0..tile_count).map(|_| AtomicU32::new(0)).collect(),
            slots: (0..tile_count * capacity as usize)
                .map(|_| AtomicU32::new(0))
                .collect(),
            capacity,
        }
    }

    /// Reset every counter.
    pub fn clear(&self) {
        self.counts
            .par_iter()
            .for_each(|c| c.store(0, Ordering::Relaxed));
    }

    /// Append `instance` to `tile`. Slots past capacity are dropped; the
    /// counter still records the attempt.
    pub fn push(&self, tile: usize, instance: u32) {
        let slot = self.counts[tile].fetch_add(1, Ordering::Relaxed);
        if slot < self.capacity {
            self.slots[tile * self.capacity as usize + slot as usize]
                .store(instance, Ordering::Relaxed);
        }
    }

    /// Raw counter value for `tile`, including dropped appends.
    #[must_use]
    pub fn count(&self, tile: usize) -> u32 {
        self.counts[tile].load(Ordering::Relaxed)
    }

    /// The stored candidates of `tile`, in append order.
    #[must_use]
    pub fn candidates(&self, tile: usize) -> Vec<u32> {
        let len = self.count(tile).min(self.capacity) as usize;
        let base = tile * self.capacity as usize;
        self.slots[base..base + len]
            .iter()
            .map(|s| s.load(Ordering::Relaxed))
            .collect()
    }

    /// Slots per tile.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }
}

/// Clear stage: every pixel to the background with zero coverage, every
/// tile counter to zero.
#[must_use]
pub fn clear(uniform: &TransformUniform, lists: &TileLists) -> Vec<[f32; 4]> {
    lists.clear();
    let background = uniform.background().extend(0.0).to_array();
    vec![background; uniform.grid().pixel_count()]
}

/// Invert a record's transform once for the frame.
#[must_use]
pub fn prepare(record: &InstanceRecord) -> PreparedInstance {
    let transform = record.transform();
    let det = transform.determinant();
    if !det.is_finite() || det.abs() < DEGENERATE_DET || object_bounds(record).is_none() {
        return PreparedInstance::INVALID;
    }
    PreparedInstance {
        inverse: transform.inverse().to_cols_array(),
        valid: 1,
        _pad: [0; 3],
    }
}

/// Bin stage: prepare every instance and append it to each tile its
/// conservative screen bound touches.
#[must_use]
pub fn bin(
    records: &[InstanceRecord],
    uniform: &TransformUniform,
    lists: &TileLists,
) -> Vec<PreparedInstance> {
    let grid = uniform.grid();
    let mvp = uniform.mvp();
    records
        .par_iter()
        .enumerate()
        .map(|(index, record)| {
            let prepared = prepare(record);
            if !prepared.is_valid() {
                return prepared;
            }
            let Some(bounds) = object_bounds(record) else {
                return PreparedInstance::INVALID;
            };
            let bound = screen_bound(mvp * record.transform(), &bounds, grid.width, grid.height);
            if let Some(range) = tile_range(bound, grid) {
                for tile in range.tiles(grid) {
                    lists.push(tile, index as u32);
                }
            }
            prepared
        })
        .collect()
}

/// Shade one pixel from a tile's candidates.
fn shade_pixel(
    records: &[InstanceRecord],
    prepared: &[PreparedInstance],
    candidates: &[u32],
    uniform: &TransformUniform,
    x: u32,
    y: u32,
) -> [f32; 4] {
    let ray = Ray::through_pixel(uniform.inverse_mvp(), x, y, uniform.width, uniform.height);
    let mut fragments = FragmentList::new();
    for &index in candidates {
        let (Some(record), Some(prep)) =
            (records.get(index as usize), prepared.get(index as usize))
        else {
            continue;
        };
        if let Some(depth) = hit_depth(record, prep, &ray) {
            fragments.insert(Fragment {
                depth,
                index,
                color: Vec3::from_array(record.color),
                alpha: record.density.clamp(0.0, 1.0),
            });
        }
    }
    fragments.resolve(uniform.background())
}

/// Rasterize stage: one task per tile, composited into `output`.
pub fn rasterize(
    records: &[InstanceRecord],
    prepared: &[PreparedInstance],
    lists: &TileLists,
    uniform: &TransformUniform,
    output: &mut [[f32; 4]],
) {
    let grid = uniform.grid();
    let tiles: Vec<(usize, Vec<[f32; 4]>)> = (0..grid.tile_count())
        .into_par_iter()
        .map(|tile| {
            let candidates = lists.candidates(tile);
            let (x0, y0) = tile_origin(grid, tile);
            let mut pixels = Vec::with_capacity((TILE_SIZE * TILE_SIZE) as usize);
            for y in y0..(y0 + TILE_SIZE).min(grid.height) {
                for x in x0..(x0 + TILE_SIZE).min(grid.width) {
                    pixels.push(shade_pixel(records, prepared, &candidates, uniform, x, y));
                }
            }
            (tile, pixels)
        })
        .collect();

    for (tile, pixels) in tiles {
        let (x0, y0) = tile_origin(grid, tile);
        let tile_width = (x0 + TILE_SIZE).min(grid.width) - x0;
        for (i, pixel) in pixels.into_iter().enumerate() {
            let x = x0 + i as u32 % tile_width;
            let y = y0 + i as u32 / tile_width;
            output[(y * grid.width + x) as usize] = pixel;
        }
    }
}

fn tile_origin(grid: TileGrid, tile: usize) -> (u32, u32) {
    let tx = tile as u32 % grid.tiles_x;
    let ty = tile as u32 / grid.tiles_x;
    (tx * TILE_SIZE, ty * TILE_SIZE)
}

/// Everything one CPU frame produced.
#[derive(Debug)]
pub struct CpuFrame {
    /// Composited pixels, row-major.
    pub pixels: Vec<[f32; 4]>,
    /// Tile lists as the binner left them.
    pub lists: TileLists,
    /// Per-instance inverse transforms.
    pub prepared: Vec<PreparedInstance>,
}

/// Run clear, bin and rasterize for one frame.
#[must_use]
pub fn render(records: &[InstanceRecord], uniform: &TransformUniform) -> CpuFrame {
    let lists = TileLists::new(uniform.grid().tile_count(), uniform.tile_capacity);
    let mut pixels = clear(uniform, &lists);
    let prepared = bin(records, uniform, &lists);
    rasterize(records, &prepared, &lists, uniform, &mut pixels);
    CpuFrame {
        pixels,
        lists,
        prepared,
    }
}

#[cfg(test)]
mod tests {
    use glam::Mat4;

    use super::*;
    use crate::camera::Camera;
    use crate::encoding::ShapeType;
    use crate::raster::tile_capacity;

    fn uniform(width: u32, height: u32, count: u32) -> TransformUniform {
        let camera = Camera {
            eye: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect: width as f32 / height as f32,
            fovy: 45.0,
            znear: 0.1,
            zfar: 100.0,
        };
        let grid = TileGrid::new(width, height);
        let (capacity, _) = tile_capacity(grid, count, u64::MAX);
        TransformUniform::new(grid, count, capacity, &camera.matrices(), Vec3::ONE)
    }

    fn sphere(center: Vec3, radius: f32, color: [f32; 3], density: f32) -> InstanceRecord {
        let transform = Mat4::from_translation(center) * Mat4::from_scale(Vec3::splat(radius));
        InstanceRecord::new(transform, color, density, ShapeType::Ellipsoid.id(), 0)
    }

    #[test]
    fn degenerate_and_unknown_records_are_invalid() {
        let flat = InstanceRecord::new(
            Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0)),
            [1.0; 3],
            1.0,
            ShapeType::Box.id(),
            0,
        );
        assert!(!prepare(&flat).is_valid());
        let mut unknown = sphere(Vec3::ZERO, 1.0, [1.0; 3], 1.0);
        unknown.shape_type = 99.0;
        assert!(!prepare(&unknown).is_valid());
        assert!(prepare(&sphere(Vec3::ZERO, 1.0, [1.0; 3], 1.0)).is_valid());
    }

    #[test]
    fn overflow_drops_appends_but_counts_them() {
        let lists = TileLists::new(1, 2);
        for i in 0..5 {
            lists.push(0, i);
        }
        assert_eq!(lists.count(0), 5);
        assert_eq!(lists.candidates(0), vec![0, 1]);
        lists.clear();
        assert_eq!(lists.count(0), 0);
    }

    #[test]
    fn clear_fills_background_with_zero_coverage() {
        let u = uniform(20, 10, 0);
        let lists = TileLists::new(u.grid().tile_count(), 1);
        lists.push(0, 0);
        let pixels = clear(&u, &lists);
        assert_eq!(pixels.len(), 200);
        assert!(pixels.iter().all(|p| *p == [1.0, 1.0, 1.0, 0.0]));
        assert_eq!(lists.count(0), 0);
    }

    #[test]
    fn sphere_is_binned_only_near_the_center() {
        let u = uniform(128, 128, 1);
        let frame = render(&[sphere(Vec3::ZERO, 0.3, [1.0, 0.0, 0.0], 1.0)], &u);
        let grid = u.grid();
        assert_eq!(frame.lists.count(grid.tile_of(64, 64)), 1);
        assert_eq!(frame.lists.count(0), 0);
        assert_eq!(frame.pixels[64 * 128 + 64], [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(frame.pixels[0], [1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn sphere_behind_the_camera_is_culled() {
        let u = uniform(64, 64, 1);
        let frame = render(&[sphere(Vec3::new(0.0, 0.0, 10.0), 0.5, [1.0; 3], 1.0)], &u);
        assert!((0..u.grid().tile_count()).all(|t| frame.lists.count(t) == 0));
    }
}
