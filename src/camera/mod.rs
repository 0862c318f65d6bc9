//! Camera state providers.
//!
//! The frame orchestrator asks a [`CameraProvider`] for the
//! `(model, view, projection)` triple once per frame. Two providers exist:
//! an interactive [`OrbitCamera`] fed by the input channel and a
//! deterministic [`PlaybackCamera`] that replays recorded poses for export.

/// Core camera struct and per-frame matrices.
pub mod core;
/// Interactive orbit camera.
pub mod orbit;
/// Recorded pose playback.
pub mod playback;

pub use self::core::{Camera, CameraMatrices};
pub use orbit::OrbitCamera;
pub use playback::{CameraPose, PlaybackCamera};

/// Source of per-frame camera matrices.
pub trait CameraProvider {
    /// Advance by `dt` seconds and return the matrices for the next frame
    /// at the given viewport aspect ratio.
    fn next_frame(&mut self, dt: f32, aspect: f32) -> CameraMatrices;

    /// A new scene was swapped in; `positions` are its instance centers.
    fn frame_scene(&mut self, _positions: &[glam::Vec3]) {}

    /// Whether the provider has nothing more to show.
    fn is_finished(&self) -> bool {
        false
    }
}
