//! Lowering of cubic bezier strokes into tapered capsule segments.

use glam::Vec3;

use super::rotation::{quat_to_euler, rotation_between, EulerAngles};

/// Number of uniform parameter intervals a bezier stroke is split into.
pub const PARTITION_COUNT: usize = 10;

/// A cubic bezier curve with a radius that varies linearly along `t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BezierStroke {
    /// Control points `p0..p3`.
    pub points: [Vec3; 4],
    /// Radius at `t = 0`.
    pub start_radius: f32,
    /// Radius at `t = 1`.
    pub end_radius: f32,
}

/// One straight piece of a lowered bezier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapsuleSegment {
    /// Midpoint of the segment.
    pub center: Vec3,
    /// Half the endpoint distance.
    pub half_length: f32,
    /// Radius at the segment's start.
    pub start_radius: f32,
    /// Radius at the segment's end.
    pub end_radius: f32,
    /// Rotation taking +X onto the segment direction.
    pub rotation: EulerAngles,
}

impl BezierStroke {
    /// Read the 14-float layout `p0, p1, p2, p3, r_start, r_end`.
    #[must_use]
    pub fn from_params(params: &[f32; 14]) -> Self {
        let point = |i: usize| Vec3::new(params[i * 3], params[i * 3 + 1], params[i * 3 + 2]);
        Self {
            points: [point(0), point(1), point(2), point(3)],
            start_radius: params[12],
            end_radius: params[13],
        }
    }

    /// Evaluate the curve at `t`.
    #[must_use]
    pub fn point_at(&self, t: f32) -> Vec3 {
        let [p0, p1, p2, p3] = self.points;
        let u = 1.0 - t;
        p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
    }

    /// Radius at `t`.
    #[must_use]
    pub fn radius_at(&self, t: f32) -> f32 {
        self.start_radius + (self.end_radius - self.start_radius) * t
    }

    /// Split into [`PARTITION_COUNT`] capsule segments.
    #[must_use]
    pub fn segments(&self) -> [CapsuleSegment; PARTITION_COUNT] {
        std::array::from_fn(|i| {
            let t0 = i as f32 / PARTITION_COUNT as f32;
            let t1 = (i + 1) as f32 / PARTITION_COUNT as f32;
            let a = self.point_at(t0);
            let b = self.point_at(t1);
            CapsuleSegment {
                center: (a + b) * 0.5,
                half_length: a.distance(b) * 0.5,
                start_radius: self.radius_at(t0),
                end_radius: self.radius_at(t1),
                rotation: quat_to_euler(rotation_between(Vec3::X, b - a)),
            }
        })
    }
}
