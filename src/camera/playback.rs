//! Deterministic camera playback for headless export.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::core::{Camera, CameraMatrices};
use super::CameraProvider;
use crate::error::StrokeError;
use crate::options::CameraOptions;

/// One recorded camera pose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    /// Eye position.
    pub eye: [f32; 3],
    /// Look-at target.
    pub target: [f32; 3],
    /// Up vector, +Y when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up: Option<[f32; 3]>,
    /// Vertical field of view in degrees; the options' value when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fovy: Option<f32>,
}

/// Replays a fixed list of poses, one per frame.
///
/// Once every pose has been yielded the camera holds the last one and
/// [`is_finished`](Self::is_finished) turns true.
#[derive(Debug, Clone)]
pub struct PlaybackCamera {
    poses: Vec<CameraPose>,
    next: usize,
    options: CameraOptions,
}

impl PlaybackCamera {
    /// Build a playback camera from poses.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeError::SceneLoad`] if `poses` is empty.
    pub fn new(poses: Vec<CameraPose>, options: &CameraOptions) -> Result<Self, StrokeError> {
        if poses.is_empty() {
            return Err(StrokeError::SceneLoad("pose list is empty".to_owned()));
        }
        Ok(Self {
            poses,
            next: 0,
            options: options.clone(),
        })
    }

    /// Parse a JSON array of poses.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeError::SceneLoad`] on malformed JSON or an empty list.
    pub fn from_json(text: &str, options: &CameraOptions) -> Result<Self, StrokeError> {
        let poses: Vec<CameraPose> =
            serde_json::from_str(text).map_err(|e| StrokeError::SceneLoad(e.to_string()))?;
        Self::new(poses, options)
    }

    /// Load poses from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeError::Io`] if the file cannot be read, otherwise as
    /// [`from_json`](Self::from_json).
    pub fn load(path: &Path, options: &CameraOptions) -> Result<Self, StrokeError> {
        let text = std::fs::read_to_string(path)?;
        let camera = Self::from_json(&text, options)?;
        log::info!("loaded {} camera poses from {}", camera.len(), path.display());
        Ok(camera)
    }

    /// Number of recorded poses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.poses.len()
    }

    /// Always false; construction rejects empty pose lists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// Index of the pose the next frame will use.
    #[must_use]
    pub fn position(&self) -> usize {
        self.next
    }

    /// Whether every pose has been yielded.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.next >= self.poses.len()
    }

    fn camera_for(&self, pose: &CameraPose, aspect: f32) -> Camera {
        self.options.look_at(
            Vec3::from_array(pose.eye),
            Vec3::from_array(pose.target),
            pose.up.map_or(Vec3::Y, Vec3::from_array),
            aspect,
            pose.fovy,
        )
    }
}

impl CameraProvider for PlaybackCamera {
    fn next_frame(&mut self, _dt: f32, aspect: f32) -> CameraMatrices {
        let index = self.next.min(self.poses.len().saturating_sub(1));
        self.next = (self.next + 1).min(self.poses.len());
        self.poses
            .get(index)
            .map_or_else(CameraMatrices::default, |pose| {
                self.camera_for(pose, aspect).matrices()
            })
    }

    fn is_finished(&self) -> bool {
        Self::is_finished(self)
    }
}
