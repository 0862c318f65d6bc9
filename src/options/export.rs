use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Headless frame export parameters.
pub struct ExportOptions {
    /// Directory exported frames are written to.
    pub output_dir: PathBuf,
    /// File name prefix; frames are `<prefix>_<index>.png`.
    pub file_prefix: String,
    /// Render width in pixels.
    pub width: u32,
    /// Render height in pixels.
    pub height: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("test/outputs"),
            file_prefix: "frame".to_owned(),
            width: 512,
            height: 512,
        }
    }
}
