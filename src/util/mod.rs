//! Shared utilities.

/// Frame pacing and FPS measurement.
pub mod frame_timing;
