//! Euler-angle conventions shared by every shape family.
//!
//! Angles are radians about the X, Y and Z axes, composed as
//! `Ry(y) · Rz(z) · Rx(x)`: yaw about Y first, then pitch about Z, then roll
//! about X. [`quat_to_euler`] is the closed-form inverse of
//! [`EulerAngles::to_quat`].

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Quat, Vec3};

/// Fraction of the quaternion's squared magnitude above which the pitch is
/// treated as locked at ±90°.
const GIMBAL_THRESHOLD: f32 = 0.499;

/// Rotation angles about the X, Y and Z axes, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    /// Roll, about X.
    pub x: f32,
    /// Yaw, about Y.
    pub y: f32,
    /// Pitch, about Z.
    pub z: f32,
}

impl EulerAngles {
    /// Angles from a `[x, y, z]` parameter triple.
    #[must_use]
    pub fn from_slice(angles: &[f32]) -> Self {
        Self {
            x: angles.first().copied().unwrap_or(0.0),
            y: angles.get(1).copied().unwrap_or(0.0),
            z: angles.get(2).copied().unwrap_or(0.0),
        }
    }

    /// Compose the rotation as a quaternion.
    #[must_use]
    pub fn to_quat(self) -> Quat {
        Quat::from_rotation_y(self.y) * Quat::from_rotation_z(self.z) * Quat::from_rotation_x(self.x)
    }

    /// Compose the rotation as a matrix.
    #[must_use]
    pub fn to_mat4(self) -> Mat4 {
        Mat4::from_quat(self.to_quat())
    }
}

/// Extract yaw/pitch/roll from a (not necessarily unit) quaternion.
///
/// Near the poles (`|x·y + z·w|` above 0.499 of the squared magnitude) the
/// pitch snaps to ±90°, yaw absorbs the remaining rotation via `atan2` and
/// roll is zero.
#[must_use]
pub fn quat_to_euler(q: Quat) -> EulerAngles {
    let (x, y, z, w) = (q.x, q.y, q.z, q.w);
    let sqx = x * x;
    let sqy = y * y;
    let sqz = z * z;
    let sqw = w * w;
    let unit = sqx + sqy + sqz + sqw;
    let test = x * y + z * w;

    if test > GIMBAL_THRESHOLD * unit {
        return EulerAngles {
            x: 0.0,
            y: 2.0 * x.atan2(w),
            z: FRAC_PI_2,
        };
    }
    if test < -GIMBAL_THRESHOLD * unit {
        return EulerAngles {
            x: 0.0,
            y: -2.0 * x.atan2(w),
            z: -FRAC_PI_2,
        };
    }

    EulerAngles {
        x: (2.0 * x * w - 2.0 * y * z).atan2(-sqx + sqy - sqz + sqw),
        y: (2.0 * y * w - 2.0 * x * z).atan2(sqx - sqy - sqz + sqw),
        z: (2.0 * test / unit).clamp(-1.0, 1.0).asin(),
    }
}

/// Shortest rotation taking the unit vector `from` onto `to`.
///
/// Built from `axis = from × to` and `angle = acos(from · to)`. Antiparallel
/// inputs rotate half a turn about +Y; a zero-length `to` yields identity.
#[must_use]
pub fn rotation_between(from: Vec3, to: Vec3) -> Quat {
    let Some(dir) = to.try_normalize() else {
        return Quat::IDENTITY;
    };
    let cos = from.dot(dir).clamp(-1.0, 1.0);
    let axis = from.cross(dir);
    match axis.try_normalize() {
        Some(axis) => Quat::from_axis_angle(axis, cos.acos()),
        None if cos > 0.0 => Quat::IDENTITY,
        None => Quat::from_rotation_y(std::f32::consts::PI),
    }
}
