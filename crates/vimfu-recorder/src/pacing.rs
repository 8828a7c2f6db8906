//! Catch-up frame pacing.
//!
//! The video must last exactly as long as the recording did. Each wake the
//! capture thread asks how many frames wall-clock time calls for; when a
//! grab was slow, the missing frames are filled with copies of the newest
//! image instead of stretching time.

use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Frame accounting for one recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePacer {
    fps: u32,
    written: u64,
}

impl FramePacer {
    /// Pacer for `fps` frames per second (at least 1).
    pub fn new(fps: u32) -> Self {
        Self {
            fps: fps.max(1),
            written: 0,
        }
    }

    /// Frames per second.
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Frames written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// `floor(elapsed * fps)`: frames a video of this length holds.
    pub fn expected(&self, elapsed: Duration) -> u64 {
        (elapsed.as_nanos() * self.fps as u128 / NANOS_PER_SEC) as u64
    }

    /// Frames to write now to catch up with the clock.
    pub fn due(&self, elapsed: Duration) -> u64 {
        self.expected(elapsed).saturating_sub(self.written)
    }

    /// Count `frames` as written.
    pub fn record(&mut self, frames: u64) {
        self.written += frames;
    }

    /// Time left until the next frame boundary. Never zero.
    pub fn until_next(&self, elapsed: Duration) -> Duration {
        let next = self.expected(elapsed) as u128 + 1;
        // Rounded up so that waking at the boundary always advances `expected`
        let boundary = (next * NANOS_PER_SEC).div_ceil(self.fps as u128);
        Duration::from_nanos(boundary as u64).saturating_sub(elapsed)
    }

    /// Length of one frame.
    pub fn interval(&self) -> Duration {
        Duration::from_nanos((NANOS_PER_SEC / self.fps as u128) as u64)
    }
}
