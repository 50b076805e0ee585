use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use fleetreplay::ingest::EventNormalizer;
use fleetreplay::telemetry::IngestCounts;
use fleetreplay::trajectory::TrajectoryBuilder;
use fleetreplay::SimulationData;
use std::fs;
use std::path::Path;

pub struct WorkflowResult {
    pub simulation: Option<SimulationData>,
    pub event_count: usize,
    pub counts: IngestCounts,
}

impl WorkflowResult {
    pub fn summary(&self) -> String {
        match &self.simulation {
            Some(data) => format!(
                "{} events ({} dropped) -> {} agents, {} frames, {} ms on {}",
                self.event_count,
                self.counts.dropped,
                data.agent_count(),
                data.frames.len(),
                data.duration_ms(),
                data.map_name
            ),
            None => format!(
                "{} events ({} dropped) -> no simulation data",
                self.event_count, self.counts.dropped
            ),
        }
    }
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Normalizes and builds one raw log. A log with nothing to replay is a
    /// result, not an error.
    pub fn execute(&self, raw: &str) -> WorkflowResult {
        let normalizer = EventNormalizer::new();
        let events = normalizer.normalize(raw);
        let builder = TrajectoryBuilder::new(self.config.to_builder_config());
        let simulation = builder.build(&events);

        WorkflowResult {
            simulation,
            event_count: events.len(),
            counts: normalizer.metrics(),
        }
    }

    pub fn execute_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<WorkflowResult> {
        let path_ref = path.as_ref();
        let raw = fs::read_to_string(path_ref)
            .with_context(|| format!("reading event log {}", path_ref.display()))?;
        Ok(self.execute(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::build_log;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn runner_executes_workflow() {
        let cfg = WorkflowConfig::from_args(100, 15, "current".into(), false);
        let runner = Runner::new(cfg);
        let result = runner.execute(&build_log(2, 3).unwrap());
        let data = result.simulation.as_ref().unwrap();
        assert_eq!(data.agent_count(), 2);
        assert_eq!(result.counts.dropped, 0);
        assert!(result.summary().contains("2 agents"));
    }

    #[test]
    fn runner_reports_missing_data() {
        let runner = Runner::new(WorkflowConfig::default());
        let result = runner.execute("nothing to see");
        assert!(result.simulation.is_none());
        assert_eq!(result.counts.dropped, 1);
        assert!(result.summary().ends_with("no simulation data"));
    }

    #[test]
    fn runner_reads_log_files() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"PLANNER_START robotId=\"r1\" start=(1,1)\n")
            .unwrap();
        let path = temp.into_temp_path();
        let runner = Runner::new(WorkflowConfig::default());
        let result = runner.execute_file(&path).unwrap();
        assert_eq!(result.simulation.unwrap().frames.len(), 16);
        assert!(runner.execute_file("/definitely/not/here.log").is_err());
    }
}
