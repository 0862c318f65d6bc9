//! Conservative bounds: object-space boxes, their screen projection and the
//! tile range they cover.

use glam::{Mat4, Vec2, Vec3};

use super::TileGrid;
use crate::encoding::mixture::line_radii;
use crate::encoding::{InstanceRecord, ShapeType};

/// Clip-space `w` at or below this counts as behind the eye.
const W_EPSILON: f32 = 1e-6;

/// An axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// The cube `[-1, 1]³`.
    pub const UNIT: Self = Self {
        min: Vec3::NEG_ONE,
        max: Vec3::ONE,
    };

    /// Box with the given half extents, centered on the origin.
    #[must_use]
    pub fn symmetric(half: Vec3) -> Self {
        Self {
            min: -half,
            max: half,
        }
    }

    /// The eight corners.
    #[must_use]
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }

    /// Whether `p` lies inside, within `tolerance`.
    #[must_use]
    pub fn contains(&self, p: Vec3, tolerance: f32) -> bool {
        p.cmpge(self.min - tolerance).all() && p.cmple(self.max + tolerance).all()
    }
}

/// The case a mixture record's one-hot selects, `0` ellipsoid, `1` box,
/// `2` line. Reads the largest lane so a non-exact one-hot still picks one.
#[must_use]
pub fn mixture_case(extra: [f32; 3]) -> usize {
    (1..3).fold(0, |best, lane| if extra[lane] > extra[best] { lane } else { best })
}

/// Object-space box enclosing a record's canonical shape; `None` for an
/// unknown tag.
#[must_use]
pub fn object_bounds(record: &InstanceRecord) -> Option<Aabb> {
    let [e0, e1, e2] = record.extra;
    let bounds = match ShapeType::from_id(record.shape_type_id())? {
        ShapeType::Ellipsoid
        | ShapeType::Box
        | ShapeType::Tetrahedron
        | ShapeType::Octahedron
        | ShapeType::RoundCube => Aabb::UNIT,
        ShapeType::Capsule => {
            let r = e0.max(e1).max(0.0);
            Aabb::symmetric(Vec3::new(r, e2.max(0.0) + r, r))
        }
        ShapeType::Cylinder => Aabb::symmetric(Vec3::new(e0, e1, e0).max(Vec3::ZERO)),
        ShapeType::Mixture => match mixture_case(record.extra) {
            0 | 1 => Aabb::UNIT,
            _ => {
                let [h, dr] = record.aux;
                let (r0, r1) = line_radii(dr);
                let r = r0.max(r1);
                Aabb::symmetric(Vec3::new(h.max(0.0) + r, r, r))
            }
        },
    };
    Some(bounds)
}

/// Where a bound lands on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScreenBound {
    /// Entirely behind the eye.
    Culled,
    /// Straddles the eye plane; treat as covering everything.
    FullScreen,
    /// Pixel-space rectangle (may extend off screen).
    Pixels {
        /// Top-left corner.
        min: Vec2,
        /// Bottom-right corner.
        max: Vec2,
    },
}

/// Project `bounds` through `object_to_clip` into pixel space.
#[must_use]
pub fn screen_bound(object_to_clip: Mat4, bounds: &Aabb, width: u32, height: u32) -> ScreenBound {
    let size = Vec2::new(width as f32, height as f32);
    let mut behind = 0;
    let mut min = Vec2::splat(f32::INFINITY);
    let mut max = Vec2::splat(f32::NEG_INFINITY);

    for corner in bounds.corners() {
        let clip = object_to_clip * corner.extend(1.0);
        if clip.w <= W_EPSILON {
            behind += 1;
            continue;
        }
        let ndc = Vec2::new(clip.x, clip.y) / clip.w;
        let px = Vec2::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5) * size;
        min = min.min(px);
        max = max.max(px);
    }

    match behind {
        8 => ScreenBound::Culled,
        0 => ScreenBound::Pixels { min, max },
        _ => ScreenBound::FullScreen,
    }
}

/// Inclusive tile rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    /// First tile column.
    pub x0: u32,
    /// First tile row.
    pub y0: u32,
    /// Last tile column.
    pub x1: u32,
    /// Last tile row.
    pub y1: u32,
}

impl TileRange {
    /// Iterate tile indices row by row.
    pub fn tiles(self, grid: TileGrid) -> impl Iterator<Item = usize> {
        (self.y0..=self.y1).flat_map(move |y| {
            (self.x0..=self.x1).map(move |x| y as usize * grid.tiles_x as usize + x as usize)
        })
    }

    /// Number of tiles covered.
    #[must_use]
    pub fn len(&self) -> usize {
        (self.x1 - self.x0 + 1) as usize * (self.y1 - self.y0 + 1) as usize
    }

    /// Always false; a range covers at least one tile.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Clamp a screen bound to the grid; `None` when nothing is covered.
#[must_use]
pub fn tile_range(bound: ScreenBound, grid: TileGrid) -> Option<TileRange> {
    if grid.tiles_x == 0 || grid.tiles_y == 0 {
        return None;
    }
    let full = TileRange {
        x0: 0,
        y0: 0,
        x1: grid.tiles_x - 1,
        y1: grid.tiles_y - 1,
    };
    match bound {
        ScreenBound::Culled => None,
        ScreenBound::FullScreen => Some(full),
        ScreenBound::Pixels { min, max } => {
            if max.x < 0.0
                || max.y < 0.0
                || min.x > grid.width as f32
                || min.y > grid.height as f32
                || !(min.is_finite() && max.is_finite())
            {
                return None;
            }
            let tile = super::TILE_SIZE as f32;
            let clamp_x = |v: f32| ((v / tile).floor().max(0.0) as u32).min(full.x1);
            let clamp_y = |v: f32| ((v / tile).floor().max(0.0) as u32).min(full.y1);
            Some(TileRange {
                x0: clamp_x(min.x),
                y0: clamp_y(min.y),
                x1: clamp_x(max.x),
                y1: clamp_y(max.y),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::ShapeType;

    fn record(tag: ShapeType, extra: [f32; 3], aux: [f32; 2]) -> InstanceRecord {
        InstanceRecord::new(Mat4::IDENTITY, [1.0; 3], 1.0, tag.id(), 0)
            .with_extra(extra)
            .with_aux(aux)
    }

    #[test]
    fn axial_bounds_include_end_caps() {
        let capsule = object_bounds(&record(ShapeType::Capsule, [0.2, 0.5, 2.0], [0.0; 2]));
        assert_eq!(capsule, Some(Aabb::symmetric(Vec3::new(0.5, 2.5, 0.5))));
        let cylinder = object_bounds(&record(ShapeType::Cylinder, [0.3, 1.0, 0.0], [0.0; 2]));
        assert_eq!(cylinder, Some(Aabb::symmetric(Vec3::new(0.3, 1.0, 0.3))));
    }

    #[test]
    fn mixture_bound_follows_selected_case() {
        let line = record(ShapeType::Mixture, [0.0, 0.0, 1.0], [2.0, 0.5]);
        assert_eq!(
            object_bounds(&line),
            Some(Aabb::symmetric(Vec3::new(3.5, 1.5, 1.5)))
        );
        let sphere = record(ShapeType::Mixture, [1.0, 0.0, 0.0], [2.0, 0.5]);
        assert_eq!(object_bounds(&sphere), Some(Aabb::UNIT));
    }

    #[test]
    fn unknown_tag_has_no_bound() {
        let mut r = record(ShapeType::Box, [0.0; 3], [0.0; 2]);
        r.shape_type = 42.0;
        assert_eq!(object_bounds(&r), None);
    }

    #[test]
    fn identity_projection_maps_ndc_to_pixels() {
        let bound = screen_bound(Mat4::from_scale(Vec3::splat(0.5)), &Aabb::UNIT, 100, 50);
        let ScreenBound::Pixels { min, max } = bound else {
            panic!("expected a pixel bound, got {bound:?}");
        };
        assert_eq!(min, Vec2::new(25.0, 12.5));
        assert_eq!(max, Vec2::new(75.0, 37.5));
    }

    #[test]
    fn straddling_and_behind_bounds() {
        // w = -z: the unit cube at z = 0 straddles the eye plane.
        let flip_w = Mat4::from_cols_array(&[
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, -1.0, //
            0.0, 0.0, 0.0, 0.0,
        ]);
        assert_eq!(screen_bound(flip_w, &Aabb::UNIT, 10, 10), ScreenBound::FullScreen);
        let behind = flip_w * Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(screen_bound(behind, &Aabb::UNIT, 10, 10), ScreenBound::Culled);
    }

    #[test]
    fn tile_range_clamps_to_grid() {
        let grid = TileGrid::new(64, 32);
        let range = tile_range(
            ScreenBound::Pixels {
                min: Vec2::new(-10.0, 5.0),
                max: Vec2::new(20.0, 100.0),
            },
            grid,
        )
        .unwrap();
        assert_eq!(range, TileRange { x0: 0, y0: 0, x1: 1, y1: 1 });
        assert_eq!(range.tiles(grid).collect::<Vec<_>>(), vec![0, 1, 4, 5]);

        let off = ScreenBound::Pixels {
            min: Vec2::new(70.0, 0.0),
            max: Vec2::new(80.0, 10.0),
        };
        assert_eq!(tile_range(off, grid), None);
        assert_eq!(tile_range(ScreenBound::FullScreen, grid).map(|r| r.len()), Some(8));
    }
}
