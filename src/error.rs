//! Crate-level error types.

use std::fmt;

use crate::gpu::render_context::RenderContextError;

/// Errors produced by the strokeraster crate.
#[derive(Debug)]
pub enum StrokeError {
    /// GPU context initialization failure.
    Gpu(RenderContextError),
    /// Failed to load or parse a stroke scene file.
    SceneLoad(String),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// Failed to spawn a background thread.
    ThreadSpawn(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// Viewer event-loop failure.
    Viewer(String),
    /// Writing an exported frame failed.
    Export(String),
    /// Mapping the output buffer back to the host failed.
    Readback(String),
    /// The GPU device was lost. Not recoverable.
    DeviceLost(String),
    /// WGSL composition failed.
    Shader(String),
}

impl fmt::Display for StrokeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::SceneLoad(msg) => write!(f, "scene load error: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::ThreadSpawn(e) => {
                write!(f, "failed to spawn thread: {e}")
            }
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Viewer(msg) => write!(f, "viewer error: {msg}"),
            Self::Export(msg) => write!(f, "frame export error: {msg}"),
            Self::Readback(msg) => write!(f, "readback error: {msg}"),
            Self::DeviceLost(msg) => write!(f, "device lost: {msg}"),
            Self::Shader(msg) => write!(f, "shader error: {msg}"),
        }
    }
}

impl std::error::Error for StrokeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::Io(e) | Self::ThreadSpawn(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderContextError> for StrokeError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<std::io::Error> for StrokeError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
