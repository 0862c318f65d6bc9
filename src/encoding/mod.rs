//! Stroke encoder: heterogeneous shape families → fixed-stride instance
//! records.
//!
//! Every family is normalized into one 27-lane [`InstanceRecord`] holding an
//! object→world matrix, flat color, density and a shape tag. The rasterizer
//! only ever sees the canonical object-space shapes named by [`ShapeType`].

pub mod bezier;
mod encoder;
pub mod mixture;
pub mod record;
pub mod rotation;
pub mod shape;

pub use encoder::{
    encode_scene, encode_stroke, is_known_shape, EncodeError, EncodedScene, SkippedStroke,
};
pub use record::{as_lanes, DecodedTransform, InstanceRecord, INSTANCE_STRIDE};
pub use rotation::EulerAngles;
pub use shape::{ShapeFamily, ShapeType};
