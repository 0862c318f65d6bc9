use std::sync::mpsc::Receiver;

use glam::{Quat, Vec2, Vec3};

use super::core::{Camera, CameraMatrices};
use super::CameraProvider;
use crate::input::{InputEvent, MouseButton};
use crate::options::CameraOptions;

/// Drag speeds in the options are UI-scale multipliers; these map them to
/// radians and world units per pixel.
const ROTATE_SCALE: f32 = 0.01;
const PAN_SCALE: f32 = 0.002;

/// Orbit camera: left-drag rotates about the focus point, shift-drag pans,
/// the wheel zooms.
///
/// Input arrives through an [`InputEvent`] channel that is drained once per
/// [`next_frame`](CameraProvider::next_frame).
pub struct OrbitCamera {
    orientation: Quat,
    distance: f32,
    focus_point: Vec3,
    camera: Camera,

    events: Receiver<InputEvent>,
    mouse_pressed: bool,
    shift_pressed: bool,
    last_cursor: Option<Vec2>,

    rotate_speed: f32,
    pan_speed: f32,
    zoom_speed: f32,
}

impl OrbitCamera {
    /// Create an orbit camera looking at the origin from `options.distance`
    /// along +Z.
    #[must_use]
    pub fn new(options: &CameraOptions, events: Receiver<InputEvent>) -> Self {
        let mut orbit = Self {
            orientation: Quat::IDENTITY,
            distance: options.distance,
            focus_point: Vec3::ZERO,
            camera: options.look_at(
                Vec3::new(0.0, 0.0, options.distance),
                Vec3::ZERO,
                Vec3::Y,
                1.0,
                None,
            ),
            events,
            mouse_pressed: false,
            shift_pressed: false,
            last_cursor: None,
            rotate_speed: options.rotate_speed * ROTATE_SCALE,
            pan_speed: options.pan_speed * PAN_SCALE,
            zoom_speed: options.zoom_speed,
        };
        orbit.update_camera_pos();
        orbit
    }

    /// Current camera state.
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    fn update_camera_pos(&mut self) {
        let dir = self.orientation * Vec3::Z;

        self.camera.eye = self.focus_point + (dir * self.distance);
        self.camera.target = self.focus_point;
        self.camera.up = self.orientation * Vec3::Y;
    }

    /// Apply one input event.
    pub fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::MouseButton {
                button: MouseButton::Left,
                pressed,
            } => self.mouse_pressed = pressed,
            InputEvent::MouseButton { .. } => {}
            InputEvent::ModifiersChanged { shift } => self.shift_pressed = shift,
            InputEvent::CursorMoved { x, y } => {
                let current = Vec2::new(x, y);
                let delta = self.last_cursor.map_or(Vec2::ZERO, |last| current - last);
                self.last_cursor = Some(current);
                if self.mouse_pressed {
                    if self.shift_pressed {
                        self.pan(delta);
                    } else {
                        self.rotate(delta);
                    }
                }
            }
            InputEvent::Scroll { delta } => self.zoom(delta),
        }
    }

    /// Orbit by a cursor delta in pixels.
    pub fn rotate(&mut self, delta: Vec2) {
        // Horizontal rotation around camera's up vector
        let up = self.orientation * Vec3::Y;
        self.orientation =
            Quat::from_axis_angle(up, -delta.x * self.rotate_speed) * self.orientation;

        // Vertical rotation around the right vector after the horizontal step
        let right = self.orientation * Vec3::X;
        self.orientation =
            Quat::from_axis_angle(right, -delta.y * self.rotate_speed) * self.orientation;
        self.orientation = self.orientation.normalize();

        self.update_camera_pos();
    }

    /// Move the focus point by a cursor delta in pixels.
    pub fn pan(&mut self, delta: Vec2) {
        let right = self.orientation * Vec3::X;
        let up = self.orientation * Vec3::Y;
        let scale = self.pan_speed * self.distance;

        self.focus_point += right * (-delta.x * scale) + up * (delta.y * scale);
        self.update_camera_pos();
    }

    /// Zoom by wheel steps (positive = closer).
    pub fn zoom(&mut self, delta: f32) {
        self.distance *= 1.0 - delta * self.zoom_speed;
        self.distance = self
            .distance
            .clamp(self.camera.znear * 2.0, self.camera.zfar * 0.5);
        self.update_camera_pos();
    }

    /// Center on the centroid of `positions` and back off until their
    /// bounding sphere fits the vertical field of view.
    pub fn fit_to_positions(&mut self, positions: &[Vec3]) {
        if positions.is_empty() {
            return;
        }

        let centroid: Vec3 = positions.iter().copied().sum::<Vec3>() / positions.len() as f32;
        let radius = positions
            .iter()
            .map(|p| (*p - centroid).length())
            .fold(0.0f32, f32::max);

        self.focus_point = centroid;

        let fovy_rad = self.camera.fovy.to_radians();
        let fit_distance = radius / (fovy_rad / 2.0).tan();
        // 1.5x padding for comfortable view
        self.distance = (fit_distance * 1.5).max(self.camera.znear * 2.0);

        self.update_camera_pos();
    }
}

impl CameraProvider for OrbitCamera {
    fn next_frame(&mut self, _dt: f32, aspect: f32) -> CameraMatrices {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
        }
        self.camera.aspect = aspect;
        self.camera.matrices()
    }

    fn frame_scene(&mut self, positions: &[Vec3]) {
        self.fit_to_positions(positions);
    }
}
