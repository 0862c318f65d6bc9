//! Background scene loading and encoding.
//!
//! Parsing a scene file and encoding thousands of strokes happens off the
//! render thread. Requests go in over an mpsc channel; the newest encoded
//! scene comes back through a lock-free triple buffer that the render loop
//! polls once per frame.

use std::path::PathBuf;
use std::sync::mpsc;

use crate::encoding::{encode_scene, InstanceRecord};
use crate::scene::SceneFile;

/// Work for the loader thread.
#[derive(Debug)]
pub enum SceneRequest {
    /// Read, parse and encode a scene file.
    Load(PathBuf),
    /// Encode an already parsed scene.
    Encode(SceneFile),
    /// Stop the thread.
    Shutdown,
}

/// An encoded scene ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedScene {
    /// Where the scene came from, for logging.
    pub source: String,
    /// Instance records in draw order.
    pub records: Vec<InstanceRecord>,
    /// Strokes that were dropped during encoding.
    pub skipped: usize,
}

/// Outcome of one request.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneUpdate {
    /// The scene encoded; swap it in.
    Loaded(LoadedScene),
    /// Loading failed; keep the current scene.
    Failed(String),
}

/// Handle to the loader thread.
pub struct SceneLoader {
    request_tx: mpsc::Sender<SceneRequest>,
    result: triple_buffer::Output<Option<SceneUpdate>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl SceneLoader {
    /// Spawn the loader thread.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::Error`] if the thread fails to spawn.
    pub fn new() -> Result<Self, std::io::Error> {
        let (request_tx, request_rx) = mpsc::channel();
        let (input, result) = triple_buffer::triple_buffer(&None);
        let thread = std::thread::Builder::new()
            .name("scene-loader".into())
            .spawn(move || thread_loop(&request_rx, input))?;
        Ok(Self {
            request_tx,
            result,
            thread: Some(thread),
        })
    }

    /// Queue a request. Never blocks.
    pub fn submit(&self, request: SceneRequest) {
        let _ = self.request_tx.send(request);
    }

    /// The newest finished update, if one arrived since the last call.
    pub fn try_recv(&mut self) -> Option<SceneUpdate> {
        let _ = self.result.update();
        self.result.output_buffer_mut().take()
    }

    /// Stop the thread and wait for it.
    pub fn shutdown(&mut self) {
        let _ = self.request_tx.send(SceneRequest::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SceneLoader {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn thread_loop(
    request_rx: &mpsc::Receiver<SceneRequest>,
    mut output: triple_buffer::Input<Option<SceneUpdate>>,
) {
    while let Ok(request) = request_rx.recv() {
        let update = match drain_latest(request, request_rx) {
            SceneRequest::Shutdown => break,
            SceneRequest::Load(path) => match SceneFile::load(&path) {
                Ok(scene) => encode(path.display().to_string(), &scene),
                Err(e) => {
                    log::error!("failed to load {}: {e}", path.display());
                    SceneUpdate::Failed(e.to_string())
                }
            },
            SceneRequest::Encode(scene) => encode("<memory>".to_owned(), &scene),
        };
        output.write(Some(update));
    }
}

fn encode(source: String, scene: &SceneFile) -> SceneUpdate {
    let encoded = encode_scene(scene);
    log::info!(
        "encoded {source}: {} instances, {} strokes skipped",
        encoded.records.len(),
        encoded.skipped.len()
    );
    SceneUpdate::Loaded(LoadedScene {
        source,
        records: encoded.records,
        skipped: encoded.skipped.len(),
    })
}

/// Collapse queued requests to the newest one. A queued shutdown wins.
fn drain_latest(initial: SceneRequest, rx: &mpsc::Receiver<SceneRequest>) -> SceneRequest {
    let mut latest = initial;
    while let Ok(newer) = rx.try_recv() {
        if matches!(latest, SceneRequest::Shutdown) {
            continue;
        }
        latest = newer;
    }
    latest
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::scene::StrokeParams;

    fn scene(strokes: usize) -> SceneFile {
        let mut scene = SceneFile {
            shape_type: "ellipsoid".to_owned(),
            ..SceneFile::default()
        };
        for i in 0..strokes {
            let _ = scene.stroke_params.insert(
                format!("stroke.{i}"),
                StrokeParams {
                    shape_params: vec![0.5, 0.0, 0.0, 0.0, i as f32, 0.0, 0.0],
                    color_params: vec![1.0, 0.0, 0.0],
                    density_params: 1.0,
                    stroke_type: None,
                },
            );
        }
        scene
    }

    fn wait(loader: &mut SceneLoader) -> SceneUpdate {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            if let Some(update) = loader.try_recv() {
                return update;
            }
            assert!(Instant::now() < deadline, "loader timed out");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn encodes_submitted_scene_off_thread() {
        let mut loader = SceneLoader::new().unwrap();
        loader.submit(SceneRequest::Encode(scene(3)));
        match wait(&mut loader) {
            SceneUpdate::Loaded(loaded) => {
                assert_eq!(loaded.records.len(), 3);
                assert_eq!(loaded.skipped, 0);
            }
            SceneUpdate::Failed(e) => panic!("unexpected failure: {e}"),
        }
        assert!(loader.try_recv().is_none());
    }

    #[test]
    fn missing_file_reports_failure() {
        let mut loader = SceneLoader::new().unwrap();
        loader.submit(SceneRequest::Load(PathBuf::from("/nonexistent/scene.json")));
        assert!(matches!(wait(&mut loader), SceneUpdate::Failed(_)));
    }

    #[test]
    fn drain_keeps_newest_request_and_honors_shutdown() {
        let (tx, rx) = mpsc::channel();
        tx.send(SceneRequest::Encode(scene(1))).unwrap();
        tx.send(SceneRequest::Encode(scene(2))).unwrap();
        match drain_latest(SceneRequest::Encode(scene(0)), &rx) {
            SceneRequest::Encode(s) => assert_eq!(s.stroke_params.len(), 2),
            other => panic!("unexpected {other:?}"),
        }

        tx.send(SceneRequest::Encode(scene(1))).unwrap();
        assert!(matches!(
            drain_latest(SceneRequest::Shutdown, &rx),
            SceneRequest::Shutdown
        ));
    }
}
