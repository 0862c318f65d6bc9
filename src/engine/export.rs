use super::StrokeRenderEngine;
use crate::error::StrokeError;
use crate::export::FrameSink;

/// Render frames until the engine's camera runs out of poses, handing each
/// to `sink` as `<prefix>_<index>`. Returns the number of frames exported.
///
/// # Errors
///
/// Stops at the first frame that fails to render or store.
pub fn export_playback(
    engine: &mut StrokeRenderEngine,
    sink: &mut dyn FrameSink,
    prefix: &str,
) -> Result<usize, StrokeError> {
    let mut exported = 0;
    while !engine.camera_finished() {
        let frame = engine.render_frame()?;
        sink.accept(&frame, &format!("{prefix}_{exported:04}"))?;
        exported += 1;
    }
    log::info!("exported {exported} frames");
    Ok(exported)
}
