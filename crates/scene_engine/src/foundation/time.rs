//! Time management utilities

use std::time::{Duration, Instant};

/// High-precision timer for frame timing
pub struct Timer {
    last_frame: Instant,
    delta: Duration,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta: Duration::ZERO,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta = now.duration_since(self.last_frame);
        self.total_time += self.delta.as_secs_f32();
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Get the time since the last frame
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Simple stopwatch for measuring elapsed time
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed += start.elapsed();
            self.start_time = None;
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let current_elapsed = self.start_time.map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + current_elapsed
    }

    /// Get the elapsed time in milliseconds
    pub fn elapsed_millis(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }
}

/// Frames-per-second counter over fixed reporting windows
///
/// Accumulates frame time and frame count; once the accumulated time reaches
/// the reporting interval, within a thousandth of it, the rate is computed as `frames / seconds` and both
/// counters start over. The reported value is the rate of the last complete
/// window, not a smoothed average.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    interval: Duration,
    elapsed: Duration,
    frame_count: u32,
    fps: f32,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl FpsCounter {
    /// Create a counter reporting once per `interval`
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            elapsed: Duration::ZERO,
            frame_count: 0,
            fps: 0.0,
        }
    }

    /// Account for one frame that took `delta`
    ///
    /// Returns the new rate when this frame closed a reporting window.
    pub fn tick(&mut self, delta: Duration) -> Option<f32> {
        self.frame_count += 1;
        self.elapsed += delta;

        // Uniform frames rarely sum to the interval exactly
        if self.elapsed + self.interval / 1000 < self.interval {
            return None;
        }

        self.fps = self.frame_count as f32 / self.elapsed.as_secs_f32();
        self.frame_count = 0;
        self.elapsed = Duration::ZERO;
        Some(self.fps)
    }

    /// Rate computed at the end of the last complete window
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Frames counted in the current, still open window
    pub fn pending_frames(&self) -> u32 {
        self.frame_count
    }

    /// Time accumulated in the current, still open window
    pub fn pending_time(&self) -> Duration {
        self.elapsed
    }
}
