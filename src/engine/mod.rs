//! The render loop's owner: GPU context, rasterizer, camera and scene
//! loading behind one handle.

mod construction;
mod export;
pub mod scene_loader;

use std::path::PathBuf;

use glam::Vec3;

pub use self::export::export_playback;
use self::scene_loader::{SceneLoader, SceneRequest, SceneUpdate};
use crate::camera::CameraProvider;
use crate::encoding::InstanceRecord;
use crate::error::StrokeError;
use crate::export::Frame;
use crate::gpu::render_context::RenderContext;
use crate::options::Options;
use crate::renderer::StrokeRenderer;
use crate::scene::SceneFile;
use crate::util::frame_timing::FrameTiming;

/// Target FPS limit for the interactive loop.
const TARGET_FPS: u32 = 300;

/// Drives the stroke rasterizer: owns the GPU context, the renderer, the
/// camera provider and the background scene loader, and turns each call to
/// [`render`](Self::render) into one presented frame.
pub struct StrokeRenderEngine {
    context: RenderContext,
    renderer: StrokeRenderer,
    camera: Box<dyn CameraProvider>,
    loader: SceneLoader,
    options: Options,
    /// Frame pacing and FPS readout.
    pub frame_timing: FrameTiming,
    instance_count: usize,
    dropped_frames: u64,
}

impl StrokeRenderEngine {
    /// Queue a scene file for loading on the background thread. The current
    /// scene keeps rendering until the new one is encoded.
    pub fn load_scene(&self, path: impl Into<PathBuf>) {
        self.loader.submit(SceneRequest::Load(path.into()));
    }

    /// Queue an in-memory scene for encoding.
    pub fn set_scene(&self, scene: SceneFile) {
        self.loader.submit(SceneRequest::Encode(scene));
    }

    /// Swap in already encoded instances immediately.
    pub fn set_instances(&mut self, records: &[InstanceRecord]) {
        self.renderer.upload_instances(&self.context, records);
        self.instance_count = records.len();
        let centers: Vec<Vec3> = records
            .iter()
            .map(|r| r.transform().w_axis.truncate())
            .collect();
        self.camera.frame_scene(&centers);
    }

    /// Apply a finished background load, if any. Returns `true` when a new
    /// scene was swapped in.
    pub fn poll_scene(&mut self) -> bool {
        match self.loader.try_recv() {
            Some(SceneUpdate::Loaded(scene)) => {
                log::info!(
                    "swapping in {} ({} instances, {} skipped)",
                    scene.source,
                    scene.records.len(),
                    scene.skipped
                );
                self.set_instances(&scene.records);
                true
            }
            Some(SceneUpdate::Failed(reason)) => {
                log::warn!("scene load failed, keeping current scene: {reason}");
                false
            }
            None => false,
        }
    }

    /// Resize the surface and the rasterizer's buffers.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.context.resize(width, height);
        let (width, height) = self.context.size();
        self.renderer.resize(&self.context, width, height);
    }

    /// Render and present one frame to the surface.
    ///
    /// Surface hiccups (outdated, lost, timeout) drop the frame and
    /// reconfigure; they are not errors.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeError::DeviceLost`] once the device is gone.
    pub fn render(&mut self) -> Result<(), StrokeError> {
        self.check_device()?;
        if !self.frame_timing.should_render() {
            return Ok(());
        }
        let _ = self.poll_scene();

        let surface_texture = match self.context.get_next_frame() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(StrokeError::DeviceLost("surface out of memory".to_owned()));
            }
            Err(e) => {
                self.drop_frame(&e.to_string());
                let (width, height) = self.context.size();
                self.context.resize(width, height);
                return Ok(());
            }
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.encode_frame();
        self.renderer.present(&mut encoder, &view);
        self.context.submit(encoder);
        surface_texture.present();

        self.frame_timing.end_frame();
        Ok(())
    }

    /// Render one frame offscreen and read it back.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeError::DeviceLost`] or [`StrokeError::Readback`] if
    /// the frame cannot be produced.
    pub fn render_frame(&mut self) -> Result<Frame, StrokeError> {
        self.check_device()?;
        let encoder = self.encode_frame();
        self.context.submit(encoder);
        let frame = self.renderer.read_output(&self.context)?;
        self.frame_timing.end_frame();
        Ok(frame)
    }

    fn encode_frame(&mut self) -> wgpu::CommandEncoder {
        let grid = self.renderer.grid();
        let aspect = grid.width as f32 / grid.height.max(1) as f32;
        let matrices = self.camera.next_frame(self.frame_timing.delta(), aspect);
        let mut encoder = self.context.create_encoder();
        self.renderer
            .encode_frame(&self.context, &mut encoder, &matrices);
        encoder
    }

    fn check_device(&self) -> Result<(), StrokeError> {
        self.context
            .device_lost()
            .map_or(Ok(()), |reason| Err(StrokeError::DeviceLost(reason)))
    }

    fn drop_frame(&mut self, reason: &str) {
        self.dropped_frames += 1;
        log::debug!("dropped frame {} ({reason})", self.dropped_frames);
    }

    /// Replace the options. Raster settings apply from the next frame.
    pub fn set_options(&mut self, options: Options) {
        self.renderer.set_options(&self.context, &options.raster);
        self.options = options;
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Whether the camera provider has run out of frames.
    #[must_use]
    pub fn camera_finished(&self) -> bool {
        self.camera.is_finished()
    }

    /// Number of instances currently uploaded.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.instance_count
    }

    /// Frames dropped because the surface was unavailable.
    #[must_use]
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    /// The GPU context.
    #[must_use]
    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// The rasterizer.
    #[must_use]
    pub fn renderer(&self) -> &StrokeRenderer {
        &self.renderer
    }
}
