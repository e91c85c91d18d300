/// Supplies frame timestamps, standing in for the display-refresh scheduler.
pub trait FrameSource {
    /// Seconds since the loop began, or `None` when the source is exhausted.
    fn next_frame(&mut self) -> Option<f64>;
}

/// A fixed number of evenly spaced frames, starting at time zero.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedFrames {
    time: f64,
    step: f64,
    remaining: u64,
}

impl FixedFrames {
    pub fn new(count: u64, fps: f64) -> Self {
        let step = if fps > 0.0 { 1.0 / fps } else { 0.0 };
        Self {
            time: 0.0,
            step,
            remaining: count,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl FrameSource for FixedFrames {
    fn next_frame(&mut self) -> Option<f64> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let now = self.time;
        self.time += self.step;
        Some(now)
    }
}
