//! Per-agent trajectory construction and multi-agent frame synchronization.

pub mod builder;
pub mod config;
pub mod sync;

pub use builder::{Trajectory, TrajectoryBuilder};
pub use config::{BuilderConfig, TaskPolicy, DWELL_FRAMES, FRAME_INTERVAL_MS};
pub use sync::synchronize;

use crate::ingest::Event;
use crate::prelude::SimulationData;

/// Builds frames with the default dwell length, interval and map id.
pub fn build(events: &[Event]) -> Option<SimulationData> {
    TrajectoryBuilder::default().build(events)
}
