use crate::playback::interpolate::pose_at;
use crate::prelude::{Frame, Point};
use serde::{Deserialize, Serialize};

pub const TRAIL_STEP_MS: f64 = 100.0;
pub const TRAIL_WINDOW_MS: f64 = 1500.0;

/// Samples recent positions of every agent for drawing fading trails.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailSampler {
    pub step_ms: f64,
    pub window_ms: f64,
}

impl Default for TrailSampler {
    fn default() -> Self {
        Self {
            step_ms: TRAIL_STEP_MS,
            window_ms: TRAIL_WINDOW_MS,
        }
    }
}

impl TrailSampler {
    /// Sample times, oldest first, covering the window that ends at `now_ms`.
    /// Times before zero are skipped and `now_ms` is always the last sample.
    pub fn sample_times(&self, now_ms: f64) -> Vec<f64> {
        let step = self.step_ms.max(1.0);
        let steps = (self.window_ms.max(0.0) / step).floor() as usize;
        (0..=steps)
            .rev()
            .map(|k| now_ms - k as f64 * step)
            .filter(|time| *time >= 0.0)
            .collect()
    }

    /// One polyline per agent, in frame agent order.
    pub fn sample(&self, frames: &[Frame], now_ms: f64) -> Vec<Vec<Point>> {
        let agent_count = frames.first().map(|frame| frame.agents.len()).unwrap_or(0);
        let mut trails = vec![Vec::new(); agent_count];
        for time in self.sample_times(now_ms) {
            for (trail, pose) in trails.iter_mut().zip(pose_at(frames, time)) {
                trail.push(pose.position());
            }
        }
        trails
    }
}
