//! Engine construction for windowed and headless use.

use super::scene_loader::SceneLoader;
use super::{StrokeRenderEngine, TARGET_FPS};
use crate::camera::CameraProvider;
use crate::error::StrokeError;
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::ShaderComposer;
use crate::options::Options;
use crate::renderer::StrokeRenderer;
use crate::util::frame_timing::FrameTiming;

impl StrokeRenderEngine {
    /// Create an engine presenting to `window`.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeError::Gpu`] if the GPU context cannot be created,
    /// [`StrokeError::Shader`] if a shader fails to compose, or
    /// [`StrokeError::ThreadSpawn`] if the loader thread cannot start.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        size: (u32, u32),
        camera: Box<dyn CameraProvider>,
        options: Options,
    ) -> Result<Self, StrokeError> {
        let context = RenderContext::new(window, size).await?;
        Self::from_context(context, camera, options)
    }

    /// Create an offscreen engine sized by the export options.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub async fn headless(
        camera: Box<dyn CameraProvider>,
        options: Options,
    ) -> Result<Self, StrokeError> {
        let context = RenderContext::headless(options.export.width, options.export.height).await?;
        Self::from_context(context, camera, options)
    }

    /// Wrap an existing GPU context.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeError::Shader`] if a shader fails to compose, or
    /// [`StrokeError::ThreadSpawn`] if the loader thread cannot start.
    pub fn from_context(
        context: RenderContext,
        camera: Box<dyn CameraProvider>,
        options: Options,
    ) -> Result<Self, StrokeError> {
        let mut composer = ShaderComposer::new()?;
        let renderer = StrokeRenderer::new(&context, &mut composer, &options.raster)?;
        let loader = SceneLoader::new().map_err(StrokeError::ThreadSpawn)?;

        let (width, height) = context.size();
        log::info!(
            "engine ready: {width}x{height}, {} tiles, surface: {}",
            renderer.grid().tile_count(),
            context.has_surface()
        );

        Ok(Self {
            context,
            renderer,
            camera,
            loader,
            options,
            frame_timing: FrameTiming::new(TARGET_FPS),
            instance_count: 0,
            dropped_frames: 0,
        })
    }
}
