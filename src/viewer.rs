//! Standalone window backed by winit.
//!
//! ```no_run
//! # use strokeraster::Viewer;
//! Viewer::builder()
//!     .with_scene("assets/scenes/sample.json")
//!     .build()
//!     .run()
//!     .unwrap();
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::camera::OrbitCamera;
use crate::engine::StrokeRenderEngine;
use crate::error::StrokeError;
use crate::input::{self, InputEvent, InputSender};
use crate::options::Options;

// ── Builder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`Viewer`].
pub struct ViewerBuilder {
    scene: Option<PathBuf>,
    options: Options,
    title: String,
}

impl ViewerBuilder {
    fn new() -> Self {
        Self {
            scene: None,
            options: Options::default(),
            title: "strokeraster".into(),
        }
    }

    /// Scene file to load once the window is up.
    #[must_use]
    pub fn with_scene(mut self, path: impl Into<PathBuf>) -> Self {
        self.scene = Some(path.into());
        self
    }

    /// Override the default options.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Set the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Consume the builder and produce a [`Viewer`].
    #[must_use]
    pub fn build(self) -> Viewer {
        Viewer {
            scene: self.scene,
            options: self.options,
            title: self.title,
        }
    }
}

// ── Viewer ───────────────────────────────────────────────────────────────

/// A window that rasterizes a stroke scene under an orbit camera.
///
/// Construct via [`Viewer::builder`], then call [`run`](Self::run) to
/// enter the event loop.
pub struct Viewer {
    scene: Option<PathBuf>,
    options: Options,
    title: String,
}

impl Viewer {
    /// Start a new builder.
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Open the window and run the event loop. Blocks until the window is
    /// closed.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeError::Viewer`] if the event loop fails, or the
    /// fatal render error that ended it.
    pub fn run(self) -> Result<(), StrokeError> {
        let event_loop = EventLoop::new().map_err(|e| StrokeError::Viewer(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = ViewerApp {
            window: None,
            engine: None,
            input: None,
            scene: self.scene,
            options: Some(self.options),
            title: self.title,
            fatal: None,
        };
        event_loop
            .run_app(&mut app)
            .map_err(|e| StrokeError::Viewer(e.to_string()))?;
        app.fatal.map_or(Ok(()), Err)
    }
}

// ── Winit app ────────────────────────────────────────────────────────────

struct ViewerApp {
    window: Option<Arc<Window>>,
    engine: Option<StrokeRenderEngine>,
    input: Option<InputSender>,
    scene: Option<PathBuf>,
    options: Option<Options>,
    title: String,
    fatal: Option<StrokeError>,
}

fn viewport_size(inner: winit::dpi::PhysicalSize<u32>) -> (u32, u32) {
    (inner.width.max(1), inner.height.max(1))
}

impl ViewerApp {
    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(engine), Some(window)) = (&mut self.engine, &self.window) else {
            return;
        };
        if let Err(e) = engine.render() {
            log::error!("render failed: {e}");
            self.fatal = Some(e);
            event_loop.exit();
            return;
        }
        if engine.frame_timing.frames() % 60 == 0 {
            window.set_title(&format!(
                "{} - {} strokes - {:.0} fps",
                self.title,
                engine.instance_count(),
                engine.frame_timing.fps()
            ));
        }
        window.request_redraw();
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(&self.title)
            .with_inner_size(winit::dpi::LogicalSize::new(1024, 768));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let options = self.options.take().unwrap_or_default();
        let (sender, receiver) = input::channel();
        let camera = Box::new(OrbitCamera::new(&options.camera, receiver));
        let size = viewport_size(window.inner_size());

        let engine = match pollster::block_on(StrokeRenderEngine::new(
            window.clone(),
            size,
            camera,
            options,
        )) {
            Ok(e) => e,
            Err(e) => {
                log::error!("Failed to initialize engine: {e}");
                self.fatal = Some(e);
                event_loop.exit();
                return;
            }
        };
        if let Some(path) = self.scene.take() {
            engine.load_scene(path);
        }

        window.request_redraw();
        self.window = Some(window);
        self.engine = Some(engine);
        self.input = Some(sender);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if matches!(event, WindowEvent::CloseRequested) {
            event_loop.exit();
            return;
        }

        if let (Some(input), Some(translated)) = (&self.input, InputEvent::from_window_event(&event)) {
            let _ = input.send(translated);
        }

        match event {
            WindowEvent::Resized(size) => {
                let (width, height) = viewport_size(size);
                if let Some(engine) = &mut self.engine {
                    engine.resize(width, height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}
