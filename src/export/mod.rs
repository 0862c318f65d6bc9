//! Headless frame export.
//!
//! A [`Frame`] is a host copy of the rasterizer's output buffer. Frames are
//! handed to a [`FrameSink`]; [`DirectorySink`] writes each one as a PNG.

use std::path::{Path, PathBuf};

use crate::error::StrokeError;

/// One rendered frame read back from the GPU, row-major RGBA.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height` pixels; rgb is the composited color, the fourth lane
    /// the accumulated coverage.
    pub pixels: Vec<[f32; 4]>,
}

impl Frame {
    /// Wrap a pixel buffer.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeError::Readback`] if `pixels` does not hold exactly
    /// `width * height` entries.
    pub fn new(width: u32, height: u32, pixels: Vec<[f32; 4]>) -> Result<Self, StrokeError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(StrokeError::Readback(format!(
                "expected {expected} pixels for {width}x{height}, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Pixel at `(x, y)`, or `None` outside the frame.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Opaque 8-bit RGBA. Color lanes are clamped to `[0, 1]`.
    #[must_use]
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|&[r, g, b, _]| [quantize(r), quantize(g), quantize(b), u8::MAX])
            .collect()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quantize(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Consumer of exported frames.
pub trait FrameSink {
    /// Take one frame under `name` (no extension).
    ///
    /// # Errors
    ///
    /// Returns [`StrokeError::Export`] if the frame cannot be stored.
    fn accept(&mut self, frame: &Frame, name: &str) -> Result<(), StrokeError>;
}

/// Writes frames as `<dir>/<name>.png`.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    written: usize,
}

impl DirectorySink {
    /// Sink writing into `dir`, created on first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: 0,
        }
    }

    /// Target directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Frames written so far.
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }
}

impl FrameSink for DirectorySink {
    fn accept(&mut self, frame: &Frame, name: &str) -> Result<(), StrokeError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{name}.png"));
        image::save_buffer(
            &path,
            &frame.to_rgba8(),
            frame.width,
            frame.height,
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| StrokeError::Export(format!("{}: {e}", path.display())))?;
        self.written += 1;
        log::debug!("wrote {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rejects_wrong_pixel_count() {
        assert!(Frame::new(2, 2, vec![[0.0; 4]; 3]).is_err());
        assert!(Frame::new(2, 2, vec![[0.0; 4]; 4]).is_ok());
    }

    #[test]
    fn pixel_lookup_is_bounds_checked() {
        let pixels = (0..6).map(|i| [i as f32, 0.0, 0.0, 1.0]).collect();
        let frame = Frame::new(3, 2, pixels).unwrap();
        assert_eq!(frame.pixel(0, 0), Some([0.0, 0.0, 0.0, 1.0]));
        assert_eq!(frame.pixel(2, 1), Some([5.0, 0.0, 0.0, 1.0]));
        // (3, 0) would alias (0, 1) under plain row-major indexing.
        assert_eq!(frame.pixel(3, 0), None);
        assert_eq!(frame.pixel(0, 2), None);
        assert_eq!(frame.pixel(u32::MAX, u32::MAX), None);
    }

    #[test]
    fn quantization_clamps_and_rounds() {
        let frame = Frame::new(2, 1, vec![[1.5, 0.5, -1.0, 0.2], [0.0, 1.0, 0.25, 1.0]]).unwrap();
        assert_eq!(frame.to_rgba8(), vec![255, 128, 0, 255, 0, 255, 64, 255]);
    }

    #[test]
    fn directory_sink_writes_decodable_png() {
        let dir = std::env::temp_dir().join(format!("strokeraster-sink-{}", std::process::id()));
        let mut sink = DirectorySink::new(&dir);
        let frame = Frame::new(3, 2, vec![[1.0, 0.0, 0.0, 1.0]; 6]).unwrap();
        sink.accept(&frame, "frame_0000").unwrap();
        assert_eq!(sink.written(), 1);

        let decoded = image::open(dir.join("frame_0000.png")).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1).0, [255, 0, 0, 255]);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
