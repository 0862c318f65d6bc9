//! Ray/shape evaluation in object space.
//!
//! Pixel rays are parametrized from the near plane (`t = 0`) to the far
//! plane (`t = 1`). Every canonical shape answers with an entry/exit
//! interval along that parametrization; the shapes without a cheap closed
//! form are sphere traced inside their bounding box.

use glam::{Mat4, Vec2, Vec3, Vec4};

use super::bounds::{mixture_case, object_bounds, Aabb};
use super::PreparedInstance;
use crate::encoding::mixture::line_radii;
use crate::encoding::{InstanceRecord, ShapeType};

/// Sphere-tracing iteration cap.
pub const MAX_TRACE_STEPS: u32 = 64;

/// Sphere-tracing hit distance, object units.
pub const TRACE_EPSILON: f32 = 1e-3;

const PARALLEL_EPSILON: f32 = 1e-12;

/// A ray `origin + t · dir`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Point at `t = 0`.
    pub origin: Vec3,
    /// Offset to the point at `t = 1` (not normalized).
    pub dir: Vec3,
}

impl Ray {
    /// Ray through the center of pixel `(x, y)`, in the space `inverse_mvp`
    /// maps clip space back to.
    #[must_use]
    pub fn through_pixel(inverse_mvp: Mat4, x: u32, y: u32, width: u32, height: u32) -> Self {
        let ndc = Vec2::new(
            (x as f32 + 0.5) / width as f32 * 2.0 - 1.0,
            1.0 - (y as f32 + 0.5) / height as f32 * 2.0,
        );
        let near = inverse_mvp * Vec4::new(ndc.x, ndc.y, 0.0, 1.0);
        let far = inverse_mvp * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
        let near = near.truncate() / near.w;
        let far = far.truncate() / far.w;
        Self {
            origin: near,
            dir: far - near,
        }
    }

    /// Point at parameter `t`.
    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }

    /// The same ray under an affine transform. The parametrization is
    /// preserved.
    #[must_use]
    pub fn transformed(&self, m: Mat4) -> Self {
        let origin = m.transform_point3(self.origin);
        Self {
            origin,
            dir: m.transform_point3(self.origin + self.dir) - origin,
        }
    }
}

/// Entry and exit parameters along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    /// First parameter inside the shape.
    pub enter: f32,
    /// Last parameter inside the shape (the bounding-box exit for traced
    /// shapes).
    pub exit: f32,
}

impl Interval {
    /// Depth of the visible hit: the interval must overlap `[0, 1]`.
    #[must_use]
    pub fn hit_depth(&self) -> Option<f32> {
        (self.exit >= 0.0 && self.enter <= 1.0 && self.enter <= self.exit)
            .then(|| self.enter.max(0.0))
    }
}

type Evaluator = fn(&InstanceRecord, &Ray) -> Option<Interval>;

/// Evaluators indexed by `tag - 1`.
const EVALUATORS: [Evaluator; 8] = [
    eval_ellipsoid,
    eval_box,
    eval_tetrahedron,
    eval_octahedron,
    eval_capsule,
    eval_cylinder,
    eval_round_cube,
    eval_mixture,
];

/// Intersect an object-space ray with a record's canonical shape.
#[must_use]
pub fn intersect(shape: ShapeType, record: &InstanceRecord, ray: &Ray) -> Option<Interval> {
    EVALUATORS[shape.id() as usize - 1](record, ray)
}

/// Depth at which a world-space ray hits a record, if it does.
///
/// Invalid prepared instances and unknown tags never hit.
#[must_use]
pub fn hit_depth(record: &InstanceRecord, prepared: &PreparedInstance, world_ray: &Ray) -> Option<f32> {
    if !prepared.is_valid() {
        return None;
    }
    let shape = ShapeType::from_id(record.shape_type_id())?;
    let ray = world_ray.transformed(prepared.inverse());
    intersect(shape, record, &ray)?.hit_depth()
}

fn solve_quadratic(a: f32, b: f32, c: f32) -> Option<(f32, f32)> {
    if a.abs() < PARALLEL_EPSILON {
        return None;
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let t0 = (-b - sq) / (2.0 * a);
    let t1 = (-b + sq) / (2.0 * a);
    Some((t0.min(t1), t0.max(t1)))
}

fn unit_sphere(ray: &Ray) -> Option<Interval> {
    let (enter, exit) = solve_quadratic(
        ray.dir.dot(ray.dir),
        2.0 * ray.origin.dot(ray.dir),
        ray.origin.dot(ray.origin) - 1.0,
    )?;
    Some(Interval { enter, exit })
}

/// Slab test against an axis-aligned box.
#[must_use]
pub fn ray_box(ray: &Ray, bounds: &Aabb) -> Option<Interval> {
    let mut enter = f32::NEG_INFINITY;
    let mut exit = f32::INFINITY;
    for axis in 0..3 {
        let (o, d) = (ray.origin[axis], ray.dir[axis]);
        let (lo, hi) = (bounds.min[axis], bounds.max[axis]);
        if d.abs() < PARALLEL_EPSILON {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let t0 = (lo - o) / d;
        let t1 = (hi - o) / d;
        enter = enter.max(t0.min(t1));
        exit = exit.min(t0.max(t1));
    }
    (enter <= exit).then_some(Interval { enter, exit })
}

/// Clip a ray against half-spaces `n · p <= 1`.
fn convex(ray: &Ray, normals: &[Vec3]) -> Option<Interval> {
    let mut enter = f32::NEG_INFINITY;
    let mut exit = f32::INFINITY;
    for n in normals {
        let denom = n.dot(ray.dir);
        let num = 1.0 - n.dot(ray.origin);
        if denom.abs() < PARALLEL_EPSILON {
            if num < 0.0 {
                return None;
            }
            continue;
        }
        let t = num / denom;
        if denom < 0.0 {
            enter = enter.max(t);
        } else {
            exit = exit.min(t);
        }
    }
    (enter <= exit).then_some(Interval { enter, exit })
}

const TETRAHEDRON_PLANES: [Vec3; 4] = [
    Vec3::new(-1.0, -1.0, -1.0),
    Vec3::new(-1.0, 1.0, 1.0),
    Vec3::new(1.0, -1.0, 1.0),
    Vec3::new(1.0, 1.0, -1.0),
];

const OCTAHEDRON_PLANES: [Vec3; 8] = [
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(1.0, 1.0, -1.0),
    Vec3::new(1.0, -1.0, 1.0),
    Vec3::new(1.0, -1.0, -1.0),
    Vec3::new(-1.0, 1.0, 1.0),
    Vec3::new(-1.0, 1.0, -1.0),
    Vec3::new(-1.0, -1.0, 1.0),
    Vec3::new(-1.0, -1.0, -1.0),
];

/// Round cone between `a` (radius `r1`) and `b` (radius `r2`).
#[must_use]
pub fn sd_round_cone(p: Vec3, a: Vec3, b: Vec3, r1: f32, r2: f32) -> f32 {
    let ba = b - a;
    let l2 = ba.dot(ba);
    let rr = r1 - r2;
    let a2 = l2 - rr * rr;
    // One end sphere swallows the other (or the axis is a point).
    if l2 < PARALLEL_EPSILON || a2 <= 0.0 {
        return ((p - a).length() - r1).min((p - b).length() - r2);
    }
    let il2 = 1.0 / l2;

    let pa = p - a;
    let y = pa.dot(ba);
    let z = y - l2;
    let x2 = (pa * l2 - ba * y).length_squared();
    let y2 = y * y * l2;
    let z2 = z * z * l2;

    let k = rr.signum() * rr * rr * x2;
    if z.signum() * a2 * z2 > k {
        return (x2 + z2).sqrt() * il2 - r2;
    }
    if y.signum() * a2 * y2 < k {
        return (x2 + y2).sqrt() * il2 - r1;
    }
    ((x2 * a2 * il2).sqrt() + y * rr) * il2 - r1
}

/// Box `[-1, 1]³` rounded by `corner`.
#[must_use]
pub fn sd_round_box(p: Vec3, corner: f32) -> f32 {
    let q = p.abs() - Vec3::splat(1.0 - corner);
    q.max(Vec3::ZERO).length() + q.max_element().min(0.0) - corner
}

/// March `sdf` along the part of the ray inside `bounds ∩ [0, 1]`.
fn sphere_trace(ray: &Ray, bounds: &Aabb, sdf: impl Fn(Vec3) -> f32) -> Option<Interval> {
    let outer = ray_box(ray, bounds)?;
    let end = outer.exit.min(1.0);
    let speed = ray.dir.length();
    if speed < PARALLEL_EPSILON {
        return None;
    }
    let mut t = outer.enter.max(0.0);
    for _ in 0..MAX_TRACE_STEPS {
        if t > end {
            return None;
        }
        let d = sdf(ray.at(t));
        if d < TRACE_EPSILON {
            return Some(Interval {
                enter: t,
                exit: outer.exit,
            });
        }
        t += d / speed;
    }
    None
}

fn eval_ellipsoid(_: &InstanceRecord, ray: &Ray) -> Option<Interval> {
    unit_sphere(ray)
}

fn eval_box(_: &InstanceRecord, ray: &Ray) -> Option<Interval> {
    ray_box(ray, &Aabb::UNIT)
}

fn eval_tetrahedron(_: &InstanceRecord, ray: &Ray) -> Option<Interval> {
    convex(ray, &TETRAHEDRON_PLANES)
}

fn eval_octahedron(_: &InstanceRecord, ray: &Ray) -> Option<Interval> {
    convex(ray, &OCTAHEDRON_PLANES)
}

fn eval_capsule(record: &InstanceRecord, ray: &Ray) -> Option<Interval> {
    let [r_start, r_end, half_length] = record.extra;
    let bounds = object_bounds(record)?;
    let a = Vec3::new(0.0, -half_length, 0.0);
    let b = Vec3::new(0.0, half_length, 0.0);
    sphere_trace(ray, &bounds, |p| sd_round_cone(p, a, b, r_start, r_end))
}

fn eval_cylinder(record: &InstanceRecord, ray: &Ray) -> Option<Interval> {
    let [radius, half_height, _] = record.extra;
    if radius <= 0.0 || half_height < 0.0 {
        return None;
    }
    let (o, d) = (ray.origin, ray.dir);
    let a = d.x * d.x + d.z * d.z;
    let (side_enter, side_exit) = if a < PARALLEL_EPSILON {
        if o.x * o.x + o.z * o.z > radius * radius {
            return None;
        }
        (f32::NEG_INFINITY, f32::INFINITY)
    } else {
        solve_quadratic(
            a,
            2.0 * (o.x * d.x + o.z * d.z),
            o.x * o.x + o.z * o.z - radius * radius,
        )?
    };
    let caps = ray_box(
        ray,
        &Aabb::symmetric(Vec3::new(f32::INFINITY, half_height, f32::INFINITY)),
    )?;
    let enter = side_enter.max(caps.enter);
    let exit = side_exit.min(caps.exit);
    (enter <= exit).then_some(Interval { enter, exit })
}

fn eval_round_cube(record: &InstanceRecord, ray: &Ray) -> Option<Interval> {
    let corner = record.extra[0].clamp(0.0, 1.0);
    sphere_trace(ray, &Aabb::UNIT, |p| sd_round_box(p, corner))
}

fn eval_mixture(record: &InstanceRecord, ray: &Ray) -> Option<Interval> {
    match mixture_case(record.extra) {
        0 => unit_sphere(ray),
        1 => ray_box(ray, &Aabb::UNIT),
        _ => {
            let [half_length, dr] = record.aux;
            let (r_start, r_end) = line_radii(dr);
            let bounds = object_bounds(record)?;
            let a = Vec3::new(-half_length, 0.0, 0.0);
            let b = Vec3::new(half_length, 0.0, 0.0);
            sphere_trace(ray, &bounds, |p| sd_round_cone(p, a, b, r_start, r_end))
        }
    }
}
