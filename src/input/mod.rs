//! Input events and the channel that carries them to the camera.

/// Platform-agnostic input events.
pub mod event;

use std::sync::mpsc;

pub use event::{InputEvent, MouseButton};

/// Sending half of the input channel, held by the window loop.
pub type InputSender = mpsc::Sender<InputEvent>;

/// Create the input channel. The receiver goes to
/// [`OrbitCamera::new`](crate::camera::OrbitCamera::new).
#[must_use]
pub fn channel() -> (InputSender, mpsc::Receiver<InputEvent>) {
    mpsc::channel()
}
