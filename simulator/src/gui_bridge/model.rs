use fleetreplay::scene::SceneOverlay;
use fleetreplay::telemetry::IngestCounts;
use fleetreplay::SimulationData;
use serde::{Deserialize, Serialize};

/// Snapshot served to the visualizer. `simulation` is `None` when the last
/// log had nothing to replay.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VisualizationModel {
    pub simulation: Option<SimulationData>,
    pub overlay: SceneOverlay,
    pub status: String,
    pub event_count: usize,
    pub counts: IngestCounts,
}
