//! Cooperative per-frame loop
//!
//! The loop calls a tick closure once per frame until the closure asks to
//! stop or the loop's [`CancellationToken`] is cancelled. The token is shared
//! with whoever owns the scene being drawn, so tearing the scene down is the
//! cancellation point.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::time::Timer;

/// Shared cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every clone of this token
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether any clone has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// What the tick closure wants the loop to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameControl {
    /// Schedule another frame
    Continue,
    /// Leave the loop after this frame
    Stop,
}

/// Per-frame timing handed to the tick closure
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    /// Zero-based frame index
    pub frame: u64,
    /// Seconds since the previous frame
    pub delta_time: f32,
    /// Seconds since the loop started
    pub elapsed: f32,
}

/// Cooperatively scheduled frame loop
pub struct FrameLoop {
    timer: Timer,
    target_frame_time: Option<Duration>,
    token: CancellationToken,
}

impl FrameLoop {
    /// Create a loop with its own cancellation token
    pub fn new(target_fps: Option<u32>) -> Self {
        Self::with_token(target_fps, CancellationToken::new())
    }

    /// Create a loop bound to an existing cancellation token
    pub fn with_token(target_fps: Option<u32>, token: CancellationToken) -> Self {
        let target_frame_time = target_fps
            .filter(|fps| *fps > 0)
            .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps)));

        Self {
            timer: Timer::new(),
            target_frame_time,
            token,
        }
    }

    /// Token that stops this loop when cancelled
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Run frames until the tick closure returns [`FrameControl::Stop`], the
    /// token is cancelled, or the tick fails.
    ///
    /// Returns the number of frames that ran.
    pub fn run<F, E>(&mut self, mut tick: F) -> Result<u64, E>
    where
        F: FnMut(&FrameContext) -> Result<FrameControl, E>,
    {
        let mut frames = 0;

        while !self.token.is_cancelled() {
            self.timer.tick();
            let context = FrameContext {
                frame: frames,
                delta_time: self.timer.delta_time(),
                elapsed: self.timer.elapsed_time(),
            };

            let control = tick(&context)?;
            frames += 1;

            if control == FrameControl::Stop {
                break;
            }

            if let Some(target) = self.target_frame_time {
                let spent = self.timer.since_last_tick();
                if spent < target {
                    std::thread::sleep(target - spent);
                }
            }
        }

        log::debug!("Frame loop finished after {} frames", frames);
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_stops_when_tick_requests_it() {
        let mut frame_loop = FrameLoop::new(None);
        let frames = frame_loop
            .run::<_, ()>(|context| {
                Ok(if context.frame == 4 { FrameControl::Stop } else { FrameControl::Continue })
            })
            .unwrap();
        assert_eq!(frames, 5);
    }

    #[test]
    fn test_cancelled_token_prevents_any_frame() {
        let token = CancellationToken::new();
        token.cancel();
        let mut frame_loop = FrameLoop::with_token(None, token);
        let frames = frame_loop.run::<_, ()>(|_| Ok(FrameControl::Continue)).unwrap();
        assert_eq!(frames, 0);
    }

    #[test]
    fn test_cancel_from_inside_tick_ends_loop() {
        let mut frame_loop = FrameLoop::new(None);
        let token = frame_loop.token();
        let frames = frame_loop
            .run::<_, ()>(|context| {
                if context.frame == 2 {
                    token.cancel();
                }
                Ok(FrameControl::Continue)
            })
            .unwrap();
        assert_eq!(frames, 3);
    }

    #[test]
    fn test_tick_error_is_propagated() {
        let mut frame_loop = FrameLoop::new(Some(1000));
        let result = frame_loop.run(|_| Err::<FrameControl, _>("boom"));
        assert_eq!(result, Err("boom"));
    }
}
