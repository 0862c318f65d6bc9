use web_time::{Duration, Instant};

/// Smoothing weight of the newest sample in the FPS average.
const FPS_SMOOTHING: f32 = 0.05;

/// Frame pacing for the viewer: an optional FPS cap, the time step handed
/// to the camera, and a smoothed FPS for the window title.
pub struct FrameTiming {
    /// Minimum time between frames; zero when uncapped.
    min_frame: Duration,
    last_frame: Instant,
    last_delta: f32,
    smoothed_fps: f32,
    frames: u64,
}

impl FrameTiming {
    /// Timer capped at `target_fps` (0 = unlimited).
    pub fn new(target_fps: u32) -> Self {
        let min_frame = if target_fps > 0 {
            Duration::from_secs_f64(1.0 / f64::from(target_fps))
        } else {
            Duration::ZERO
        };
        Self {
            min_frame,
            last_frame: Instant::now(),
            last_delta: 0.0,
            smoothed_fps: 60.0,
            frames: 0,
        }
    }

    /// Whether enough time has passed since the last frame to render.
    pub fn should_render(&self) -> bool {
        self.last_frame.elapsed() >= self.min_frame
    }

    /// Seconds elapsed since the last completed frame.
    pub fn delta(&self) -> f32 {
        self.last_frame.elapsed().as_secs_f32()
    }

    /// Mark a frame as presented and fold its duration into the FPS
    /// average.
    pub fn end_frame(&mut self) {
        let now = Instant::now();
        self.last_delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frames += 1;
        if self.last_delta > 0.0 {
            let fps = 1.0 / self.last_delta;
            self.smoothed_fps = self.smoothed_fps * (1.0 - FPS_SMOOTHING) + fps * FPS_SMOOTHING;
        }
    }

    /// Duration of the last completed frame in seconds.
    pub fn last_delta(&self) -> f32 {
        self.last_delta
    }

    /// Smoothed frames per second.
    pub fn fps(&self) -> f32 {
        self.smoothed_fps
    }

    /// Frames completed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
