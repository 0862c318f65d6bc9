//! Scene input: the stroke JSON consumed by the encoder.
//!
//! A scene file maps stroke names (`"<prefix>.<integer>"`) to their shape,
//! color and density parameters, plus a top-level shape-family tag that a
//! stroke may override with its own `stroke_type`.

pub mod prepass;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StrokeError;

/// One authored stroke.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrokeParams {
    /// Family-specific shape parameters.
    pub shape_params: Vec<f32>,
    /// Linear RGB color.
    pub color_params: Vec<f32>,
    /// Opacity weight.
    pub density_params: f32,
    /// Per-stroke family override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_type: Option<String>,
}

/// A full scene file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SceneFile {
    /// Default shape-family tag for every stroke.
    #[serde(default)]
    pub shape_type: String,
    /// Strokes keyed by name.
    #[serde(default)]
    pub stroke_params: BTreeMap<String, StrokeParams>,
}

impl SceneFile {
    /// Parse a scene from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeError::SceneLoad`] if the text is not a valid scene.
    pub fn from_json(text: &str) -> Result<Self, StrokeError> {
        serde_json::from_str(text).map_err(|e| StrokeError::SceneLoad(e.to_string()))
    }

    /// Load a scene from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeError::Io`] if the file cannot be read, or
    /// [`StrokeError::SceneLoad`] if it does not parse.
    pub fn load(path: &Path) -> Result<Self, StrokeError> {
        let text = std::fs::read_to_string(path)?;
        let scene = Self::from_json(&text)?;
        log::info!(
            "loaded scene {} ({} strokes, default shape '{}')",
            path.display(),
            scene.stroke_params.len(),
            scene.shape_type
        );
        Ok(scene)
    }

    /// Write the scene as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeError::Io`] on write failure.
    pub fn save(&self, path: &Path) -> Result<(), StrokeError> {
        let text =
            serde_json::to_string(self).map_err(|e| StrokeError::SceneLoad(e.to_string()))?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// The family tag that applies to `stroke`.
    #[must_use]
    pub fn family_tag<'a>(&'a self, stroke: &'a StrokeParams) -> &'a str {
        stroke.stroke_type.as_deref().unwrap_or(&self.shape_type)
    }
}

/// Why a stroke name was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrokeNameError {
    /// No `.` separator, or nothing before it.
    MissingPrefix,
    /// The part after the last `.` is not a non-negative integer.
    BadIndex(String),
}

impl fmt::Display for StrokeNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPrefix => f.write_str("expected '<prefix>.<integer>'"),
            Self::BadIndex(s) => write!(f, "'{s}' is not a stroke index"),
        }
    }
}

impl std::error::Error for StrokeNameError {}

/// Extract the stroke identity from a `"<prefix>.<integer>"` name.
///
/// # Errors
///
/// Returns [`StrokeNameError`] when the name does not match the pattern.
pub fn parse_stroke_id(name: &str) -> Result<u32, StrokeNameError> {
    let (prefix, index) = name.rsplit_once('.').ok_or(StrokeNameError::MissingPrefix)?;
    if prefix.is_empty() {
        return Err(StrokeNameError::MissingPrefix);
    }
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return Err(StrokeNameError::BadIndex(index.to_owned()));
    }
    index
        .parse()
        .map_err(|_| StrokeNameError::BadIndex(index.to_owned()))
}
