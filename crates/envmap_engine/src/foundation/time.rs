//! Frame timing

use std::time::{Duration, Instant};

/// Frame timer: delta since the previous frame and elapsed time since start
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    last_frame: Instant,
    delta_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a timer starting now
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            delta_time: 0.0,
            frame_count: 0,
        }
    }

    /// Advance the timer by one frame
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Seconds between the two most recent ticks
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Seconds since the timer was created
    pub fn elapsed_time(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    /// Number of ticks so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Time spent since the most recent tick
    pub fn since_last_tick(&self) -> Duration {
        self.last_frame.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_counts_frames() {
        let mut timer = Timer::new();
        timer.tick();
        timer.tick();
        assert_eq!(timer.frame_count(), 2);
        assert!(timer.delta_time() >= 0.0);
        assert!(timer.elapsed_time() >= timer.delta_time());
    }
}
