use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(1);

/// Frames-per-second over roughly one-second windows.
///
/// The rate is refreshed only once a full window has elapsed, so it reads
/// `0.0` until the first second of frames has been seen.
#[derive(Debug, Clone)]
pub struct FpsMeter {
    window_start: Instant,
    frames_in_window: u32,
    total_frames: u64,
    fps: f32,
}

impl FpsMeter {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            window_start: start,
            frames_in_window: 0,
            total_frames: 0,
            fps: 0.0,
        }
    }

    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    /// Count one frame observed at `now` and return the current rate.
    pub fn tick_at(&mut self, now: Instant) -> f32 {
        self.frames_in_window += 1;
        self.total_frames += 1;

        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed >= WINDOW {
            self.fps = self.frames_in_window as f32 / elapsed.as_secs_f32();
            self.frames_in_window = 0;
            self.window_start = now;
        }
        self.fps
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new()
    }
}
