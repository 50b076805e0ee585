//! Replay core for fleet simulation logs.
//!
//! Raw planner/execution logs flow through three layers: [`ingest`] turns
//! structured or legacy text logs into uniform [`ingest::Event`]s,
//! [`trajectory`] folds those events into synchronized multi-agent frames, and
//! [`playback`] maps continuous time onto interpolated poses for rendering.

pub mod ingest;
pub mod math;
pub mod playback;
pub mod prelude;
pub mod scene;
pub mod telemetry;
pub mod trajectory;

pub use prelude::{
    AgentInfo, AgentKind, AgentPose, Frame, MapSize, Point, ReplayError, ReplayResult,
    SimulationData,
};
