use serde::{Deserialize, Serialize};

/// Position in map coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Rectangular map extent shared by every agent of one log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapSize {
    pub width: f32,
    pub height: f32,
}

impl MapSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Rover,
    Drone,
}

impl AgentKind {
    /// Logs carry no explicit vehicle type, so the display name decides.
    pub fn from_display_name(name: &str) -> Self {
        if name.to_ascii_lowercase().contains("drone") {
            AgentKind::Drone
        } else {
            AgentKind::Rover
        }
    }
}

/// Identity and starting point of one agent discovered in a log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub id: String,
    pub display_name: String,
    pub kind: AgentKind,
    pub start: Point,
}

impl AgentInfo {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, start: Point) -> Self {
        let display_name = display_name.into();
        Self {
            id: id.into(),
            kind: AgentKind::from_display_name(&display_name),
            display_name,
            start,
        }
    }
}

/// One agent's drawable state at a given instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPose {
    pub id: String,
    pub display_name: String,
    pub kind: AgentKind,
    pub x: f32,
    pub y: f32,
}

impl AgentPose {
    pub fn at(info: &AgentInfo, point: Point) -> Self {
        Self {
            id: info.id.clone(),
            display_name: info.display_name.clone(),
            kind: info.kind,
            x: point.x,
            y: point.y,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Synchronized snapshot of every agent at a discrete time index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub time_ms: u64,
    pub agents: Vec<AgentPose>,
}

/// Terminal artifact of a log build, consumed by the playback engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationData {
    pub map_id: String,
    pub map_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_size: Option<MapSize>,
    pub frames: Vec<Frame>,
}

impl SimulationData {
    pub fn duration_ms(&self) -> u64 {
        self.frames.last().map(|frame| frame.time_ms).unwrap_or(0)
    }

    pub fn agent_count(&self) -> usize {
        self.frames.first().map(|frame| frame.agents.len()).unwrap_or(0)
    }

    /// Checks the frame invariants the playback engine relies on: at least
    /// one frame, strictly increasing times, and the same agent ids in the
    /// same order in every frame.
    pub fn validate(&self) -> ReplayResult<()> {
        let first = self
            .frames
            .first()
            .ok_or_else(|| ReplayError::InvalidFrames("no frames".into()))?;

        for (index, pair) in self.frames.windows(2).enumerate() {
            if pair[1].time_ms <= pair[0].time_ms {
                return Err(ReplayError::InvalidFrames(format!(
                    "frame {} time {} does not follow {}",
                    index + 1,
                    pair[1].time_ms,
                    pair[0].time_ms
                )));
            }
        }

        for (index, frame) in self.frames.iter().enumerate().skip(1) {
            let same_agents = frame.agents.len() == first.agents.len()
                && frame
                    .agents
                    .iter()
                    .zip(&first.agents)
                    .all(|(lhs, rhs)| lhs.id == rhs.id);
            if !same_agents {
                return Err(ReplayError::InvalidFrames(format!(
                    "frame {} agent set differs from frame 0",
                    index
                )));
            }
        }

        Ok(())
    }
}

/// Common error type for the replay core.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ReplayError {
    #[error("invalid frames: {0}")]
    InvalidFrames(String),
    #[error("invalid playback speed: {0}")]
    InvalidSpeed(f64),
    #[error("invalid seek target: {0}")]
    InvalidSeek(f64),
    #[error("occupancy grid row {row} has {found} cells, expected {expected}")]
    RaggedGrid {
        row: usize,
        expected: usize,
        found: usize,
    },
}

pub type ReplayResult<T> = Result<T, ReplayError>;
