//! Shape tags (what the rasterizer evaluates) and shape families (how a
//! stroke's parameters are authored).

use std::fmt;

use glam::Mat4;

/// Device-side shape tag stored in lane 20 of every record.
///
/// The numeric values are part of the instance buffer contract.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeType {
    /// Unit sphere (ellipsoid after scaling).
    Ellipsoid = 1,
    /// Cube `[-1, 1]³`.
    Box = 2,
    /// Regular tetrahedron inscribed in `[-1, 1]³`.
    Tetrahedron = 3,
    /// Octahedron `|x| + |y| + |z| <= 1`.
    Octahedron = 4,
    /// Tapered capsule along +Y (capsules, lines, bezier segments).
    Capsule = 5,
    /// Capped cylinder along +Y.
    Cylinder = 6,
    /// Cube `[-1, 1]³` with rounded corners.
    RoundCube = 7,
    /// One-hot selection among ellipsoid, box and line.
    Mixture = 8,
}

impl ShapeType {
    /// Every tag, in numeric order.
    pub const ALL: [Self; 8] = [
        Self::Ellipsoid,
        Self::Box,
        Self::Tetrahedron,
        Self::Octahedron,
        Self::Capsule,
        Self::Cylinder,
        Self::RoundCube,
        Self::Mixture,
    ];

    /// Map a raw tag back to a shape; `None` for anything outside the table.
    #[must_use]
    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.get((id as usize).checked_sub(1)?).copied()
    }

    /// Raw tag value.
    #[must_use]
    pub fn id(self) -> u32 {
        self as u32
    }
}

/// Fixed rotation composed before the authoring rotation for axial families,
/// turning the rasterizer's +Y axis onto the user-facing +X rest axis.
#[must_use]
pub fn axial_pre_rotation() -> Mat4 {
    Mat4::from_rotation_z(-std::f32::consts::FRAC_PI_2)
}

/// Authoring family named by a scene's shape tag string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeFamily {
    /// Ellipsoid with one (`anisotropic == false`) or three scales.
    Ellipsoid {
        /// Three independent scales instead of one.
        anisotropic: bool,
    },
    /// Oriented box.
    Cube {
        /// Three independent scales instead of one.
        anisotropic: bool,
    },
    /// Tetrahedron.
    Tetrahedron {
        /// Three independent scales instead of one.
        anisotropic: bool,
    },
    /// Octahedron.
    Octahedron {
        /// Three independent scales instead of one.
        anisotropic: bool,
    },
    /// Rounded cube.
    RoundCube {
        /// Three independent scales instead of one.
        anisotropic: bool,
    },
    /// Constant-radius capsule.
    Capsule,
    /// Linearly tapered capsule.
    Line {
        /// `h, dr` plus three scales instead of `h, delta, radius`.
        scaled: bool,
    },
    /// Capped cylinder.
    Cylinder,
    /// Cubic bezier swept capsule, lowered to capsule segments.
    Bezier,
    /// Data-driven choice among ellipsoid, box and line.
    Mix,
}

impl ShapeFamily {
    /// Parse a scene tag string. Unknown names yield `None`.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        let (base, anisotropic) = match tag
            .strip_suffix("_multiscale")
            .or_else(|| tag.strip_suffix("_a"))
        {
            Some(base) => (base, true),
            None => (tag, false),
        };
        let family = match base {
            "sphere" | "ellipsoid" => Self::Ellipsoid { anisotropic },
            "cube" | "box" => Self::Cube { anisotropic },
            "tetrahedron" => Self::Tetrahedron { anisotropic },
            "octahedron" => Self::Octahedron { anisotropic },
            "round_cube" => Self::RoundCube { anisotropic },
            "capsule" if !anisotropic => Self::Capsule,
            "line" => Self::Line {
                scaled: anisotropic,
            },
            "cylinder" if !anisotropic => Self::Cylinder,
            "bezier" if !anisotropic => Self::Bezier,
            "mix" if !anisotropic => Self::Mix,
            _ => return None,
        };
        Some(family)
    }

    /// Number of `shape_params` entries the family expects.
    #[must_use]
    pub fn param_count(self) -> usize {
        match self {
            Self::Ellipsoid { anisotropic }
            | Self::Cube { anisotropic }
            | Self::Tetrahedron { anisotropic }
            | Self::Octahedron { anisotropic } => {
                if anisotropic {
                    9
                } else {
                    7
                }
            }
            Self::RoundCube { anisotropic } => {
                if anisotropic {
                    10
                } else {
                    8
                }
            }
            Self::Capsule | Self::Cylinder => 8,
            Self::Line { scaled } => {
                if scaled {
                    11
                } else {
                    9
                }
            }
            Self::Bezier | Self::Mix => 14,
        }
    }

    /// The family a stroke with `found` params resolves to.
    ///
    /// Scalable families accept either arity regardless of the tag suffix:
    /// a plain `ellipsoid` with nine params is read as three scales.
    #[must_use]
    pub fn for_param_count(self, found: usize) -> Self {
        let promoted = match self {
            Self::Ellipsoid { .. } => Self::Ellipsoid { anisotropic: true },
            Self::Cube { .. } => Self::Cube { anisotropic: true },
            Self::Tetrahedron { .. } => Self::Tetrahedron { anisotropic: true },
            Self::Octahedron { .. } => Self::Octahedron { anisotropic: true },
            Self::RoundCube { .. } => Self::RoundCube { anisotropic: true },
            _ => return self,
        };
        if found == promoted.param_count() {
            promoted
        } else {
            self
        }
    }

    /// Device tag the family's records carry.
    #[must_use]
    pub fn shape_type(self) -> ShapeType {
        match self {
            Self::Ellipsoid { .. } => ShapeType::Ellipsoid,
            Self::Cube { .. } => ShapeType::Box,
            Self::Tetrahedron { .. } => ShapeType::Tetrahedron,
            Self::Octahedron { .. } => ShapeType::Octahedron,
            Self::RoundCube { .. } => ShapeType::RoundCube,
            Self::Capsule | Self::Line { .. } | Self::Bezier => ShapeType::Capsule,
            Self::Cylinder => ShapeType::Cylinder,
            Self::Mix => ShapeType::Mixture,
        }
    }

    /// Pre-rotation composed into the family's transforms.
    #[must_use]
    pub fn pre_rotation(self) -> Mat4 {
        match self {
            Self::Capsule | Self::Line { .. } | Self::Cylinder | Self::Bezier => {
                axial_pre_rotation()
            }
            _ => Mat4::IDENTITY,
        }
    }
}

impl fmt::Display for ShapeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, anisotropic) = match *self {
            Self::Ellipsoid { anisotropic } => ("ellipsoid", anisotropic),
            Self::Cube { anisotropic } => ("cube", anisotropic),
            Self::Tetrahedron { anisotropic } => ("tetrahedron", anisotropic),
            Self::Octahedron { anisotropic } => ("octahedron", anisotropic),
            Self::RoundCube { anisotropic } => ("round_cube", anisotropic),
            Self::Capsule => ("capsule", false),
            Self::Line { scaled } => ("line", scaled),
            Self::Cylinder => ("cylinder", false),
            Self::Bezier => ("bezier", false),
            Self::Mix => ("mix", false),
        };
        if anisotropic {
            write!(f, "{name}_multiscale")
        } else {
            f.write_str(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_through_ids() {
        for shape in ShapeType::ALL {
            assert_eq!(ShapeType::from_id(shape.id()), Some(shape));
        }
        assert_eq!(ShapeType::from_id(0), None);
        assert_eq!(ShapeType::from_id(9), None);
    }

    #[test]
    fn parse_accepts_aliases_and_suffixes() {
        assert_eq!(
            ShapeFamily::parse("ellipsoid"),
            Some(ShapeFamily::Ellipsoid { anisotropic: false })
        );
        assert_eq!(
            ShapeFamily::parse("ellipsoid_multiscale"),
            Some(ShapeFamily::Ellipsoid { anisotropic: true })
        );
        assert_eq!(
            ShapeFamily::parse("cube_a"),
            Some(ShapeFamily::Cube { anisotropic: true })
        );
        assert_eq!(
            ShapeFamily::parse("line_a"),
            Some(ShapeFamily::Line { scaled: true })
        );
        assert_eq!(
            ShapeFamily::parse("line"),
            Some(ShapeFamily::Line { scaled: false })
        );
        assert_eq!(ShapeFamily::parse("mix"), Some(ShapeFamily::Mix));
        assert_eq!(ShapeFamily::parse("bezier_multiscale"), None);
        assert_eq!(ShapeFamily::parse("torus"), None);
    }

    #[test]
    fn display_parses_back() {
        for tag in [
            "sphere",
            "cube_multiscale",
            "line",
            "line_a",
            "round_cube",
            "bezier",
            "mix",
        ] {
            let family = ShapeFamily::parse(tag).unwrap();
            assert_eq!(ShapeFamily::parse(&family.to_string()), Some(family));
        }
    }

    #[test]
    fn scalable_families_accept_either_arity() {
        let plain = ShapeFamily::parse("ellipsoid").unwrap();
        assert_eq!(
            plain.for_param_count(9),
            ShapeFamily::Ellipsoid { anisotropic: true }
        );
        assert_eq!(plain.for_param_count(7), plain);
        let multi = ShapeFamily::parse("cube_a").unwrap();
        assert_eq!(multi.for_param_count(9), multi);
        assert_eq!(
            ShapeFamily::parse("round_cube").unwrap().for_param_count(10),
            ShapeFamily::RoundCube { anisotropic: true }
        );
        // A wrong count stays wrong, so the error names the written tag.
        assert_eq!(plain.for_param_count(5), plain);
        assert_eq!(ShapeFamily::Capsule.for_param_count(9), ShapeFamily::Capsule);
        assert_eq!(
            ShapeFamily::parse("line").unwrap().for_param_count(11),
            ShapeFamily::Line { scaled: false }
        );
    }
}
