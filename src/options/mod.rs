//! Rasterizer, camera and export options with TOML preset support.
//!
//! Options serialize to/from TOML. Every section uses `#[serde(default)]`
//! so a partial file (e.g. only overriding `[raster]`) works.

mod camera;
mod export;
mod raster;

use std::path::Path;

pub use camera::CameraOptions;
pub use export::ExportOptions;
pub use raster::{RasterOptions, DEFAULT_MAX_TILE_LIST_BYTES};
use serde::{Deserialize, Serialize};

use crate::error::StrokeError;

/// Top-level options container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Options {
    /// Rasterizer parameters.
    pub raster: RasterOptions,
    /// Camera projection and control parameters.
    pub camera: CameraOptions,
    /// Headless export parameters.
    pub export: ExportOptions,
}

impl Options {
    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeError::Io`] if the file cannot be read or
    /// [`StrokeError::OptionsParse`] if it is not valid TOML.
    pub fn load(path: &Path) -> Result<Self, StrokeError> {
        let content = std::fs::read_to_string(path).map_err(StrokeError::Io)?;
        toml::from_str(&content)
            .map_err(|e| StrokeError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns [`StrokeError::OptionsParse`] on serialization failure or
    /// [`StrokeError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), StrokeError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StrokeError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(StrokeError::Io)?;
        }
        std::fs::write(path, content).map_err(StrokeError::Io)
    }

    /// List available preset names (TOML file stems) in a directory.
    #[must_use]
    pub fn list_presets(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) =
                        path.file_stem().and_then(|s| s.to_str())
                    {
                        names.push(stem.to_owned());
                    }
                }
            }
        }
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let opts = Options::default();
        let toml_str = toml::to_string_pretty(&opts).unwrap();
        let parsed: Options = toml::from_str(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r"
[raster]
background = [0.0, 0.0, 0.0]
";
        let opts: Options = toml::from_str(toml_str).unwrap();
        assert_eq!(opts.raster.background, [0.0, 0.0, 0.0]);
        // Everything else should be default
        assert_eq!(
            opts.raster.max_tile_list_bytes,
            DEFAULT_MAX_TILE_LIST_BYTES
        );
        assert_eq!(opts.camera, CameraOptions::default());
        assert_eq!(opts.export.file_prefix, "frame");
    }

    #[test]
    fn background_defaults_to_white() {
        assert_eq!(RasterOptions::default().background, [1.0; 3]);
    }

    #[test]
    fn save_load_and_list_presets() {
        let dir = std::env::temp_dir()
            .join(format!("strokeraster-presets-{}", std::process::id()));
        let mut opts = Options::default();
        opts.export.width = 64;
        opts.save(&dir.join("small.toml")).unwrap();
        Options::default().save(&dir.join("default.toml")).unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        assert_eq!(Options::load(&dir.join("small.toml")).unwrap(), opts);
        assert_eq!(Options::list_presets(&dir), vec!["default", "small"]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_toml_is_an_options_error() {
        assert!(matches!(
            toml::from_str::<Options>("raster = 3")
                .map_err(|e| StrokeError::OptionsParse(e.to_string())),
            Err(StrokeError::OptionsParse(_))
        ));
    }
}
