//! Scene → instance records.

use std::fmt;

use glam::{Mat4, Vec3};

use super::bezier::BezierStroke;
use super::mixture::{self, MixtureChoice};
use super::record::InstanceRecord;
use super::rotation::EulerAngles;
use super::shape::{axial_pre_rotation, ShapeFamily, ShapeType};
use crate::scene::{parse_stroke_id, SceneFile, StrokeNameError, StrokeParams};

/// Why a single stroke produced no records.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodeError {
    /// The stroke name is not `<prefix>.<integer>`.
    InvalidName(StrokeNameError),
    /// The family tag is not one the encoder knows.
    UnknownFamily(String),
    /// `shape_params` has the wrong length for the family.
    ParamCount {
        /// Family being encoded.
        family: ShapeFamily,
        /// Expected number of parameters.
        expected: usize,
        /// Number actually supplied.
        found: usize,
    },
    /// `color_params` is not an RGB triple.
    ColorCount(usize),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName(e) => write!(f, "invalid stroke name: {e}"),
            Self::UnknownFamily(tag) => write!(f, "unknown shape family '{tag}'"),
            Self::ParamCount {
                family,
                expected,
                found,
            } => write!(f, "{family} expects {expected} shape params, got {found}"),
            Self::ColorCount(n) => write!(f, "expected 3 color params, got {n}"),
        }
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidName(e) => Some(e),
            _ => None,
        }
    }
}

/// A stroke the encoder left out, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedStroke {
    /// Stroke name as it appeared in the scene.
    pub name: String,
    /// Why it was skipped.
    pub reason: EncodeError,
}

/// Encoder output: records in ascending stroke order plus what was skipped.
#[derive(Debug, Clone, Default)]
pub struct EncodedScene {
    /// Instance records ready for upload.
    pub records: Vec<InstanceRecord>,
    /// Strokes that produced no records.
    pub skipped: Vec<SkippedStroke>,
}

/// Encode every stroke of a scene.
///
/// Malformed strokes never abort the batch: badly named ones are dropped
/// quietly, the rest are logged and listed in [`EncodedScene::skipped`].
#[must_use]
pub fn encode_scene(scene: &SceneFile) -> EncodedScene {
    let mut strokes: Vec<(u32, &String, &StrokeParams)> = Vec::new();
    let mut skipped = Vec::new();

    for (name, params) in &scene.stroke_params {
        match parse_stroke_id(name) {
            Ok(id) => strokes.push((id, name, params)),
            Err(e) => {
                log::debug!("skipping stroke '{name}': {e}");
                skipped.push(SkippedStroke {
                    name: name.clone(),
                    reason: EncodeError::InvalidName(e),
                });
            }
        }
    }
    strokes.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    let mut records = Vec::with_capacity(strokes.len());
    for (id, name, params) in strokes {
        let tag = scene.family_tag(params);
        let result = ShapeFamily::parse(tag)
            .ok_or_else(|| EncodeError::UnknownFamily(tag.to_owned()))
            .and_then(|family| encode_stroke(id, params, family));
        match result {
            Ok(mut stroke_records) => records.append(&mut stroke_records),
            Err(reason) => {
                log::warn!("skipping stroke '{name}': {reason}");
                skipped.push(SkippedStroke {
                    name: name.clone(),
                    reason,
                });
            }
        }
    }

    log::debug!(
        "encoded {} records from {} strokes ({} skipped)",
        records.len(),
        scene.stroke_params.len(),
        skipped.len()
    );
    EncodedScene { records, skipped }
}

/// Object→world matrix `T · R · P · S`.
fn compose(scale: Vec3, rotation: EulerAngles, translation: Vec3, pre_rotation: Mat4) -> Mat4 {
    Mat4::from_translation(translation) * rotation.to_mat4() * pre_rotation * Mat4::from_scale(scale)
}

fn vec3(p: &[f32]) -> Vec3 {
    Vec3::new(p[0], p[1], p[2])
}

/// Encode one stroke of a known family.
///
/// Scalable families take their arity from the params: see
/// [`ShapeFamily::for_param_count`].
///
/// # Errors
///
/// Returns [`EncodeError::ParamCount`] or [`EncodeError::ColorCount`] when
/// the parameter arrays have the wrong length.
pub fn encode_stroke(
    stroke_id: u32,
    params: &StrokeParams,
    family: ShapeFamily,
) -> Result<Vec<InstanceRecord>, EncodeError> {
    let p = params.shape_params.as_slice();
    let family = family.for_param_count(p.len());
    if p.len() != family.param_count() {
        return Err(EncodeError::ParamCount {
            family,
            expected: family.param_count(),
            found: p.len(),
        });
    }
    let color: [f32; 3] = match params.color_params.as_slice() {
        [r, g, b] => [r.clamp(0.0, 1.0), g.clamp(0.0, 1.0), b.clamp(0.0, 1.0)],
        other => return Err(EncodeError::ColorCount(other.len())),
    };
    let density = params.density_params.max(0.0);
    let tag = family.shape_type().id();
    let record = |transform: Mat4| InstanceRecord::new(transform, color, density, tag, stroke_id);

    let records = match family {
        ShapeFamily::Ellipsoid { anisotropic }
        | ShapeFamily::Cube { anisotropic }
        | ShapeFamily::Tetrahedron { anisotropic }
        | ShapeFamily::Octahedron { anisotropic } => {
            let (scale, rest) = split_scale(p, anisotropic);
            vec![record(compose(
                scale,
                EulerAngles::from_slice(&rest[0..3]),
                vec3(&rest[3..6]),
                Mat4::IDENTITY,
            ))]
        }
        ShapeFamily::RoundCube { anisotropic } => {
            let (scale, rest) = split_scale(p, anisotropic);
            let corner = rest[0].clamp(0.0, 1.0);
            vec![record(compose(
                scale,
                EulerAngles::from_slice(&rest[1..4]),
                vec3(&rest[4..7]),
                Mat4::IDENTITY,
            ))
            .with_extra([corner, 0.0, 0.0])]
        }
        ShapeFamily::Capsule | ShapeFamily::Cylinder => {
            let (radius, half_length) = (p[0].max(0.0), p[1].max(0.0));
            let transform = compose(
                Vec3::ONE,
                EulerAngles::from_slice(&p[2..5]),
                vec3(&p[5..8]),
                axial_pre_rotation(),
            );
            let extra = if family == ShapeFamily::Capsule {
                [radius, radius, half_length]
            } else {
                [radius, half_length, 0.0]
            };
            vec![record(transform).with_extra(extra)]
        }
        ShapeFamily::Line { scaled: true } => {
            let (half_length, dr) = (p[0].max(0.0), p[1]);
            let (r_start, r_end) = mixture::line_radii(dr);
            // S sits under the axial pre-rotation, so the user x and y scales
            // land on the canonical y and x axes.
            let transform = compose(
                Vec3::new(p[3], p[2], p[4]),
                EulerAngles::from_slice(&p[5..8]),
                vec3(&p[8..11]),
                axial_pre_rotation(),
            );
            vec![record(transform).with_extra([r_start, r_end, half_length])]
        }
        ShapeFamily::Line { scaled: false } => {
            let (half_length, delta, radius) = (p[0].max(0.0), p[1], p[2]);
            let transform = compose(
                Vec3::ONE,
                EulerAngles::from_slice(&p[3..6]),
                vec3(&p[6..9]),
                axial_pre_rotation(),
            );
            vec![record(transform).with_extra([
                (radius - delta).max(0.0),
                (radius + delta).max(0.0),
                half_length,
            ])]
        }
        ShapeFamily::Bezier => {
            let mut bezier_params = [0.0; 14];
            bezier_params.copy_from_slice(p);
            BezierStroke::from_params(&bezier_params)
                .segments()
                .iter()
                .map(|segment| {
                    let transform = compose(
                        Vec3::ONE,
                        segment.rotation,
                        segment.center,
                        axial_pre_rotation(),
                    );
                    record(transform).with_extra([
                        segment.start_radius.max(0.0),
                        segment.end_radius.max(0.0),
                        segment.half_length,
                    ])
                })
                .collect()
        }
        ShapeFamily::Mix => {
            let choice: MixtureChoice = mixture::select([p[0], p[1], p[2]]);
            let (half_length, delta) = (p[3].max(0.0), p[4]);
            let transform = compose(
                vec3(&p[5..8]),
                EulerAngles::from_slice(&p[8..11]),
                vec3(&p[11..14]),
                Mat4::IDENTITY,
            );
            vec![record(transform)
                .with_extra(choice.one_hot())
                .with_aux([half_length, delta])]
        }
    };
    Ok(records)
}

/// Split off the leading scale (one value replicated, or three).
fn split_scale(p: &[f32], anisotropic: bool) -> (Vec3, &[f32]) {
    if anisotropic {
        (vec3(&p[0..3]), &p[3..])
    } else {
        (Vec3::splat(p[0]), &p[1..])
    }
}

/// Whether a record's tag is one the rasterizer evaluates.
#[must_use]
pub fn is_known_shape(record: &InstanceRecord) -> bool {
    ShapeType::from_id(record.shape_type_id()).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::bezier::PARTITION_COUNT;

    fn stroke(shape_params: Vec<f32>) -> StrokeParams {
        StrokeParams {
            shape_params,
            color_params: vec![0.2, 0.4, 0.6],
            density_params: 0.7,
            stroke_type: None,
        }
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn assert_vec_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn isotropic_families_round_trip() {
        for tag in ["ellipsoid", "cube", "tetrahedron", "octahedron"] {
            let family = ShapeFamily::parse(tag).unwrap();
            let params = vec![1.5, 0.3, -0.6, 0.9, 1.0, -2.0, 3.0];
            let records = encode_stroke(4, &stroke(params), family).unwrap();
            assert_eq!(records.len(), 1);
            let decoded = records[0].decode(family.pre_rotation()).unwrap();
            assert_vec_close(decoded.scale, Vec3::splat(1.5));
            assert!(close(decoded.rotation.x, 0.3));
            assert!(close(decoded.rotation.y, -0.6));
            assert!(close(decoded.rotation.z, 0.9));
            assert_vec_close(decoded.translation, Vec3::new(1.0, -2.0, 3.0));
            assert_eq!(records[0].shape_type_id(), family.shape_type().id());
            assert_eq!(records[0].stroke_id(), 4);
            assert_eq!(records[0].color, [0.2, 0.4, 0.6]);
            assert_eq!(records[0].density, 0.7);
        }
    }

    #[test]
    fn anisotropic_families_round_trip() {
        let params = vec![0.5, 2.0, 1.25, -0.2, 0.4, 0.1, 0.0, 5.0, -1.0];
        let family = ShapeFamily::parse("ellipsoid_multiscale").unwrap();
        let records = encode_stroke(0, &stroke(params), family).unwrap();
        let decoded = records[0].decode(Mat4::IDENTITY).unwrap();
        assert_vec_close(decoded.scale, Vec3::new(0.5, 2.0, 1.25));
        assert!(close(decoded.rotation.x, -0.2));
        assert!(close(decoded.rotation.y, 0.4));
        assert!(close(decoded.rotation.z, 0.1));
        assert_vec_close(decoded.translation, Vec3::new(0.0, 5.0, -1.0));
    }

    #[test]
    fn capsule_line_cylinder_round_trip_radii() {
        let capsule = encode_stroke(
            1,
            &stroke(vec![0.3, 2.0, 0.1, 0.2, 0.3, 1.0, 1.0, 1.0]),
            ShapeFamily::Capsule,
        )
        .unwrap();
        assert_eq!(capsule[0].extra, [0.3, 0.3, 2.0]);
        let decoded = capsule[0].decode(axial_pre_rotation()).unwrap();
        assert_vec_close(decoded.scale, Vec3::ONE);
        assert!(close(decoded.rotation.x, 0.1));
        assert!(close(decoded.rotation.y, 0.2));
        assert!(close(decoded.rotation.z, 0.3));
        assert_vec_close(decoded.translation, Vec3::ONE);

        let line = encode_stroke(
            2,
            &stroke(vec![1.5, 0.1, 0.4, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            ShapeFamily::Line { scaled: false },
        )
        .unwrap();
        assert!(close(line[0].extra[0], 0.3));
        assert!(close(line[0].extra[1], 0.5));
        assert_eq!(line[0].extra[2], 1.5);

        let cylinder = encode_stroke(
            3,
            &stroke(vec![0.5, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            ShapeFamily::Cylinder,
        )
        .unwrap();
        assert_eq!(cylinder[0].extra, [0.5, 1.0, 0.0]);
    }

    #[test]
    fn capsule_axis_points_along_user_x() {
        let records = encode_stroke(
            0,
            &stroke(vec![0.1, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            ShapeFamily::Capsule,
        )
        .unwrap();
        let axis = records[0].transform().transform_vector3(Vec3::Y);
        assert_vec_close(axis, Vec3::X);
    }

    #[test]
    fn round_cube_clamps_corner_radius() {
        let family = ShapeFamily::parse("round_cube").unwrap();
        let records = encode_stroke(
            0,
            &stroke(vec![1.0, 1.7, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            family,
        )
        .unwrap();
        assert_eq!(records[0].extra, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn bezier_lowers_to_partition_count_capsules() {
        let params = vec![
            0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 2.0, -1.0, 0.0, 3.0, 0.0, 1.0, 0.4, 0.1,
        ];
        let first = encode_stroke(9, &stroke(params.clone()), ShapeFamily::Bezier).unwrap();
        let second = encode_stroke(9, &stroke(params), ShapeFamily::Bezier).unwrap();
        assert_eq!(first.len(), PARTITION_COUNT);
        assert_eq!(first, second);
        assert!(first.iter().all(|r| r.stroke_id() == 9));
        assert!(first
            .iter()
            .all(|r| r.shape_type_id() == ShapeType::Capsule.id()));

        assert!(close(first[0].extra[0], 0.4));
        assert!(close(first[PARTITION_COUNT - 1].extra[1], 0.1));
        for (i, record) in first.iter().enumerate() {
            let t0 = i as f32 / PARTITION_COUNT as f32;
            let t1 = (i + 1) as f32 / PARTITION_COUNT as f32;
            assert!(close(record.extra[0], 0.4 + (0.1 - 0.4) * t0));
            assert!(close(record.extra[1], 0.4 + (0.1 - 0.4) * t1));
        }
        // Adjacent segments share their boundary radius.
        for pair in first.windows(2) {
            assert!(close(pair[0].extra[1], pair[1].extra[0]));
        }
    }

    #[test]
    fn mixture_forwards_one_hot_and_scalars() {
        let params = vec![
            0.1, 3.0, -1.0, 0.8, 0.2, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        ];
        let records = encode_stroke(0, &stroke(params), ShapeFamily::Mix).unwrap();
        assert_eq!(records[0].extra, [0.0, 1.0, 0.0]);
        assert_eq!(records[0].aux, [0.8, 0.2]);
        assert_eq!(records[0].shape_type_id(), ShapeType::Mixture.id());
    }

    fn assert_rotation(decoded: &crate::encoding::DecodedTransform, x: f32, y: f32, z: f32) {
        let r = decoded.rotation;
        assert!(close(r.x, x) && close(r.y, y) && close(r.z, z), "{r:?}");
    }

    #[test]
    fn round_cube_round_trips_both_arities() {
        let iso = encode_stroke(
            0,
            &stroke(vec![0.7, 0.25, 0.1, -0.3, 0.5, 2.0, 0.0, -1.0]),
            ShapeFamily::parse("round_cube").unwrap(),
        )
        .unwrap();
        let decoded = iso[0].decode(Mat4::IDENTITY).unwrap();
        assert_vec_close(decoded.scale, Vec3::splat(0.7));
        assert_rotation(&decoded, 0.1, -0.3, 0.5);
        assert_vec_close(decoded.translation, Vec3::new(2.0, 0.0, -1.0));
        assert_eq!(iso[0].extra, [0.25, 0.0, 0.0]);

        let multi = encode_stroke(
            0,
            &stroke(vec![0.4, 1.2, 0.9, 0.5, -0.2, 0.0, 0.3, 1.0, 1.0, 1.0]),
            ShapeFamily::parse("round_cube_multiscale").unwrap(),
        )
        .unwrap();
        let decoded = multi[0].decode(Mat4::IDENTITY).unwrap();
        assert_vec_close(decoded.scale, Vec3::new(0.4, 1.2, 0.9));
        assert_rotation(&decoded, -0.2, 0.0, 0.3);
        assert_vec_close(decoded.translation, Vec3::ONE);
        assert_eq!(multi[0].extra, [0.5, 0.0, 0.0]);
    }

    #[test]
    fn line_and_cylinder_keep_rotation_and_translation() {
        let line = encode_stroke(
            0,
            &stroke(vec![1.0, 0.1, 0.3, 0.4, -0.5, 0.6, -2.0, 0.5, 3.0]),
            ShapeFamily::Line { scaled: false },
        )
        .unwrap();
        let decoded = line[0].decode(axial_pre_rotation()).unwrap();
        assert_vec_close(decoded.scale, Vec3::ONE);
        assert_rotation(&decoded, 0.4, -0.5, 0.6);
        assert_vec_close(decoded.translation, Vec3::new(-2.0, 0.5, 3.0));

        let cylinder = encode_stroke(
            0,
            &stroke(vec![0.2, 0.8, -0.7, 0.2, 0.1, 0.0, -4.0, 1.5]),
            ShapeFamily::Cylinder,
        )
        .unwrap();
        let decoded = cylinder[0].decode(axial_pre_rotation()).unwrap();
        assert_vec_close(decoded.scale, Vec3::ONE);
        assert_rotation(&decoded, -0.7, 0.2, 0.1);
        assert_vec_close(decoded.translation, Vec3::new(0.0, -4.0, 1.5));
    }

    #[test]
    fn scaled_line_keeps_user_axis_scales() {
        let line = encode_stroke(
            5,
            &stroke(vec![
                1.0, 0.5, 2.0, 0.1, 0.3, 0.2, -0.1, 0.4, 1.0, 2.0, 3.0,
            ]),
            ShapeFamily::parse("line_a").unwrap(),
        )
        .unwrap();
        assert_eq!(line.len(), 1);
        assert_eq!(line[0].shape_type_id(), ShapeType::Capsule.id());
        assert_eq!(line[0].extra, [0.5, 1.5, 1.0]);
        let decoded = line[0].decode(axial_pre_rotation()).unwrap();
        assert_vec_close(decoded.scale, Vec3::new(2.0, 0.1, 0.3));
        assert_rotation(&decoded, 0.2, -0.1, 0.4);
        assert_vec_close(decoded.translation, Vec3::new(1.0, 2.0, 3.0));

        // The canonical axis, stretched by the user x scale, lies along the
        // rotated user x axis.
        let axis = line[0].transform().transform_vector3(Vec3::Y);
        let expected = EulerAngles::from_slice(&[0.2, -0.1, 0.4])
            .to_mat4()
            .transform_vector3(Vec3::X * 2.0);
        assert_vec_close(axis, expected);
    }

    #[test]
    fn mixture_decodes_without_pre_rotation() {
        let params = vec![
            1.0, 0.0, 0.0, 0.5, 0.0, 0.3, 0.6, 0.9, 0.1, 0.2, -0.3, 4.0, 5.0, 6.0,
        ];
        let records = encode_stroke(0, &stroke(params), ShapeFamily::Mix).unwrap();
        let decoded = records[0].decode(Mat4::IDENTITY).unwrap();
        assert_vec_close(decoded.scale, Vec3::new(0.3, 0.6, 0.9));
        assert_rotation(&decoded, 0.1, 0.2, -0.3);
        assert_vec_close(decoded.translation, Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn scene_with_per_stroke_arities_encodes_fully() {
        let scene = SceneFile::from_json(
            r#"{
                "shape_type": "ellipsoid",
                "stroke_params": {
                    "stroke.0": {"shape_params": [0.5,1.0,1.5, 0,0,0, 0,0,0], "color_params": [1,0,0], "density_params": 1},
                    "stroke.1": {"shape_params": [0.2,0.3,0.4, 0,0,0, 1,0,0], "color_params": [0,1,0], "density_params": 1, "stroke_type": "cube_a"},
                    "stroke.2": {"shape_params": [0.5,0.2, 1,0.1,0.1, 0,0,0, 0,1,0], "color_params": [0,0,1], "density_params": 1, "stroke_type": "line_a"}
                }
            }"#,
        )
        .unwrap();
        let encoded = encode_scene(&scene);
        assert!(encoded.skipped.is_empty(), "{:?}", encoded.skipped);
        assert_eq!(encoded.records.len(), 3);
        let ellipsoid = encoded.records[0].decode(Mat4::IDENTITY).unwrap();
        assert_vec_close(ellipsoid.scale, Vec3::new(0.5, 1.0, 1.5));
        let cube = encoded.records[1].decode(Mat4::IDENTITY).unwrap();
        assert_vec_close(cube.scale, Vec3::new(0.2, 0.3, 0.4));
        assert_eq!(encoded.records[2].shape_type_id(), ShapeType::Capsule.id());
        let line = encoded.records[2].decode(axial_pre_rotation()).unwrap();
        assert_vec_close(line.scale, Vec3::new(1.0, 0.1, 0.1));
        assert_vec_close(line.translation, Vec3::Y);
    }

    #[test]
    fn wrong_param_count_is_reported() {
        let err = encode_stroke(0, &stroke(vec![1.0; 3]), ShapeFamily::Capsule).unwrap_err();
        assert_eq!(
            err,
            EncodeError::ParamCount {
                family: ShapeFamily::Capsule,
                expected: 8,
                found: 3
            }
        );
    }

    #[test]
    fn scene_skips_bad_strokes_without_aborting() {
        let scene = SceneFile::from_json(
            r#"{
                "shape_type": "ellipsoid",
                "stroke_params": {
                    "stroke.2": {"shape_params": [1,0,0,0,0,0,0], "color_params": [1,0,0], "density_params": 1},
                    "garbage": {"shape_params": [1,0,0,0,0,0,0], "color_params": [1,0,0], "density_params": 1},
                    "stroke.1": {"shape_params": [1,0,0,0,0,0,0], "color_params": [0,1,0], "density_params": 1, "stroke_type": "torus"},
                    "stroke.0": {"shape_params": [1,0,0,0,0,0,0], "color_params": [0,0,1], "density_params": -3}
                }
            }"#,
        )
        .unwrap();
        let encoded = encode_scene(&scene);
        assert_eq!(encoded.records.len(), 2);
        assert_eq!(encoded.records[0].stroke_id(), 0);
        assert_eq!(encoded.records[0].density, 0.0);
        assert_eq!(encoded.records[1].stroke_id(), 2);
        assert_eq!(encoded.skipped.len(), 2);
        assert!(encoded
            .skipped
            .iter()
            .any(|s| s.name == "garbage" && matches!(s.reason, EncodeError::InvalidName(_))));
        assert!(encoded
            .skipped
            .iter()
            .any(|s| s.name == "stroke.1" && matches!(s.reason, EncodeError::UnknownFamily(_))));
    }
}
