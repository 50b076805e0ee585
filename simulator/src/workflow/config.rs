use anyhow::Context;
use fleetreplay::scene::SceneOverlay;
use fleetreplay::trajectory::{BuilderConfig, TaskPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    #[serde(flatten)]
    pub builder: BuilderConfig,
    pub overlay: SceneOverlay,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(
        frame_interval_ms: u64,
        dwell_frames: usize,
        map_id: String,
        first_task_only: bool,
    ) -> Self {
        Self {
            builder: BuilderConfig {
                dwell_frames,
                frame_interval_ms,
                map_id,
                task_policy: if first_task_only {
                    TaskPolicy::FirstTaskOnly
                } else {
                    TaskPolicy::EveryTask
                },
            },
            overlay: SceneOverlay::default(),
        }
    }

    pub fn to_builder_config(&self) -> BuilderConfig {
        self.builder.clone()
    }
}
