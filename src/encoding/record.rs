//! The fixed-stride instance record shared by the encoder, the binner and the
//! rasterizer.

use glam::{Mat4, Vec3};

use super::rotation::{quat_to_euler, EulerAngles};

/// Number of `f32` lanes in one [`InstanceRecord`].
pub const INSTANCE_STRIDE: usize = 27;

/// Lane offsets inside a record. Must match `modules/instance.wgsl`.
pub mod lane {
    /// First lane of the column-major object→world matrix.
    pub const TRANSFORM: usize = 0;
    /// First lane of the linear RGB color.
    pub const COLOR: usize = 16;
    /// Opacity weight.
    pub const DENSITY: usize = 19;
    /// Integer shape tag stored as `f32`.
    pub const SHAPE_TYPE: usize = 20;
    /// Integer stroke identity stored as `f32`.
    pub const STROKE_ID: usize = 21;
    /// First of the three shape-specific lanes.
    pub const EXTRA: usize = 22;
    /// First of the two overflow lanes (mixture scalars, zero otherwise).
    pub const AUX: usize = 25;
}

/// One renderable primitive in device layout.
///
/// Must match the WGSL instance accessors in `modules/instance.wgsl`; the
/// device reads the buffer as a flat `array<f32>` indexed by
/// `instance_index * 27 + lane`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRecord {
    /// Object→world matrix, column-major.
    pub transform: [f32; 16],
    /// Linear RGB in `[0, 1]`.
    pub color: [f32; 3],
    /// Opacity weight, `>= 0`.
    pub density: f32,
    /// Shape tag (see [`ShapeType`](super::ShapeType)).
    pub shape_type: f32,
    /// Identity of the originating logical stroke.
    pub stroke_id: f32,
    /// Shape-specific parameters.
    pub extra: [f32; 3],
    /// Mixture scalars (half-length, radius delta); zero for other shapes.
    pub aux: [f32; 2],
}

const _: () = assert!(size_of::<InstanceRecord>() == INSTANCE_STRIDE * 4);
const _: () = assert!(std::mem::offset_of!(InstanceRecord, color) == lane::COLOR * 4);
const _: () = assert!(std::mem::offset_of!(InstanceRecord, density) == lane::DENSITY * 4);
const _: () =
    assert!(std::mem::offset_of!(InstanceRecord, shape_type) == lane::SHAPE_TYPE * 4);
const _: () = assert!(std::mem::offset_of!(InstanceRecord, stroke_id) == lane::STROKE_ID * 4);
const _: () = assert!(std::mem::offset_of!(InstanceRecord, extra) == lane::EXTRA * 4);
const _: () = assert!(std::mem::offset_of!(InstanceRecord, aux) == lane::AUX * 4);

/// A record's transform split back into its authoring parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedTransform {
    /// Per-axis scale.
    pub scale: Vec3,
    /// Rotation angles about X, Y, Z in radians.
    pub rotation: EulerAngles,
    /// World-space translation.
    pub translation: Vec3,
}

impl InstanceRecord {
    /// Assemble a record from its parts.
    #[must_use]
    pub fn new(
        transform: Mat4,
        color: [f32; 3],
        density: f32,
        shape_type: u32,
        stroke_id: u32,
    ) -> Self {
        Self {
            transform: transform.to_cols_array(),
            color,
            density,
            shape_type: shape_type as f32,
            stroke_id: stroke_id as f32,
            extra: [0.0; 3],
            aux: [0.0; 2],
        }
    }

    /// Set the shape-specific lanes.
    #[must_use]
    pub fn with_extra(mut self, extra: [f32; 3]) -> Self {
        self.extra = extra;
        self
    }

    /// Set the overflow lanes.
    #[must_use]
    pub fn with_aux(mut self, aux: [f32; 2]) -> Self {
        self.aux = aux;
        self
    }

    /// The object→world matrix.
    #[must_use]
    pub fn transform(&self) -> Mat4 {
        Mat4::from_cols_array(&self.transform)
    }

    /// The shape tag as an integer.
    #[must_use]
    pub fn shape_type_id(&self) -> u32 {
        self.shape_type as u32
    }

    /// The stroke identity as an integer.
    #[must_use]
    pub fn stroke_id(&self) -> u32 {
        self.stroke_id as u32
    }

    /// View the record as its 27 raw lanes.
    #[must_use]
    pub fn lanes(&self) -> &[f32; INSTANCE_STRIDE] {
        bytemuck::cast_ref(self)
    }

    /// Split the transform into scale, rotation and translation, undoing the
    /// given family pre-rotation first.
    ///
    /// Returns `None` for a degenerate transform.
    #[must_use]
    pub fn decode(&self, pre_rotation: Mat4) -> Option<DecodedTransform> {
        let m = self.transform() * pre_rotation.inverse();
        if m.determinant().abs() < 1e-12 {
            return None;
        }
        let (scale, rotation, translation) = m.to_scale_rotation_translation();
        Some(DecodedTransform {
            scale,
            rotation: quat_to_euler(rotation),
            translation,
        })
    }
}

/// Flatten records into the raw lane array uploaded to the device.
#[must_use]
pub fn as_lanes(records: &[InstanceRecord]) -> &[f32] {
    bytemuck::cast_slice(records)
}
