use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Host frame counter. Frame 0 is "before the first frame".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tick {
    pub frame: u64,
}

pub const TICK_MS: u64 = 16;
pub const FIXED_STEP_MS: u64 = 20;

/// Largest frame delta handed to modules. Longer stalls (debugger, suspend) are clipped.
pub const MAX_FRAME_SECS: f32 = 0.25;

impl Tick {
    pub fn new() -> Self {
        Tick { frame: 0 }
    }

    pub fn next(&self) -> Self {
        Tick { frame: self.frame + 1 }
    }
}

/// Measures wall-clock deltas between frames on the tokio clock.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    last: Instant,
    max_dt: f32,
}

impl FrameClock {
    pub fn start(max_dt: f32) -> Self {
        Self { last: Instant::now(), max_dt }
    }

    /// Seconds since the previous call (or `start`), clipped to `max_dt`.
    pub fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        dt.min(self.max_dt)
    }
}
