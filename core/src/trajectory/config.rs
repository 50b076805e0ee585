use serde::{Deserialize, Serialize};

/// Length of the idle run inserted at task boundaries and at the end of a log.
pub const DWELL_FRAMES: usize = 15;
/// Spacing between synchronized frames.
pub const FRAME_INTERVAL_MS: u64 = 100;
/// Largest accepted frame spacing; one hour.
pub const MAX_FRAME_INTERVAL_MS: u64 = 3_600_000;
pub const DEFAULT_MAP_ID: &str = "current";

/// How repeated `PLANNER_START` events for one robot are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPolicy {
    /// Every planner start after the first is a task boundary and gets a
    /// dwell run.
    #[default]
    EveryTask,
    /// Only the first planner start counts; later ones are ignored.
    FirstTaskOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    pub dwell_frames: usize,
    pub frame_interval_ms: u64,
    pub map_id: String,
    pub task_policy: TaskPolicy,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            dwell_frames: DWELL_FRAMES,
            frame_interval_ms: FRAME_INTERVAL_MS,
            map_id: DEFAULT_MAP_ID.to_string(),
            task_policy: TaskPolicy::EveryTask,
        }
    }
}

impl BuilderConfig {
    /// Frame times must strictly increase, so a zero interval is bumped to 1.
    /// Oversized intervals are capped at [`MAX_FRAME_INTERVAL_MS`].
    pub fn normalized_interval(&self) -> u64 {
        self.frame_interval_ms.clamp(1, MAX_FRAME_INTERVAL_MS)
    }
}
