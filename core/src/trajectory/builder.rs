use crate::ingest::{Event, EventPayload};
use crate::prelude::{AgentInfo, MapSize, Point, SimulationData};
use crate::telemetry::log::LogManager;
use crate::trajectory::config::{BuilderConfig, TaskPolicy};
use crate::trajectory::sync::synchronize;
use std::collections::HashMap;

/// Ordered waypoint history of one agent, before synchronization.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub info: AgentInfo,
    pub points: Vec<Point>,
}

impl Trajectory {
    fn new(info: AgentInfo) -> Self {
        let points = vec![info.start];
        Self { info, points }
    }

    fn dwell(&mut self, frames: usize) {
        if let Some(&last) = self.points.last() {
            self.points.extend(std::iter::repeat(last).take(frames));
        }
    }
}

/// Agents discovered in a log, in first-appearance order.
struct AgentRoster {
    trajectories: Vec<Trajectory>,
    index: HashMap<String, usize>,
    map_size: Option<MapSize>,
}

impl AgentRoster {
    fn discover(events: &[Event]) -> Self {
        let mut roster = Self {
            trajectories: Vec::new(),
            index: HashMap::new(),
            map_size: None,
        };

        for event in events {
            let Some(EventPayload::PlannerStart(start)) = event.payload() else {
                continue;
            };
            if start.map.is_some() {
                roster.map_size = start.map;
            }
            if roster.index.contains_key(&start.robot_id) {
                continue;
            }
            let name = start
                .robot_name
                .clone()
                .unwrap_or_else(|| start.robot_id.clone());
            roster
                .index
                .insert(start.robot_id.clone(), roster.trajectories.len());
            roster
                .trajectories
                .push(Trajectory::new(AgentInfo::new(start.robot_id, name, start.start)));
        }

        roster
    }
}

/// Folds a normalized event sequence into synchronized frames.
pub struct TrajectoryBuilder {
    config: BuilderConfig,
    logger: LogManager,
}

impl TrajectoryBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self {
            config,
            logger: LogManager::new("builder"),
        }
    }

    /// Per-agent trajectories including every dwell run, plus the shared map
    /// size. Empty when the log names no agents.
    pub fn trajectories(&self, events: &[Event]) -> (Vec<Trajectory>, Option<MapSize>) {
        let AgentRoster {
            mut trajectories,
            index,
            map_size,
        } = AgentRoster::discover(events);
        let mut task_counts = vec![0usize; trajectories.len()];

        for event in events {
            match event.payload() {
                Some(EventPayload::PlannerStart(start)) => {
                    let Some(&slot) = index.get(&start.robot_id) else {
                        continue;
                    };
                    task_counts[slot] += 1;
                    let boundary = task_counts[slot] > 1
                        && self.config.task_policy == TaskPolicy::EveryTask;
                    if boundary {
                        trajectories[slot].dwell(self.config.dwell_frames);
                    }
                }
                Some(EventPayload::MoveExecuted(step)) => match index.get(&step.robot_id) {
                    Some(&slot) => trajectories[slot].points.push(step.position),
                    None => self
                        .logger
                        .trace_drop(&format!("move for unknown robot {}", step.robot_id)),
                },
                _ => {}
            }
        }

        for trajectory in &mut trajectories {
            trajectory.dwell(self.config.dwell_frames);
        }

        (trajectories, map_size)
    }

    /// Returns `None` when the log yields no agents or no frames.
    pub fn build(&self, events: &[Event]) -> Option<SimulationData> {
        let (trajectories, map_size) = self.trajectories(events);
        if trajectories.is_empty() {
            self.logger.record("no agents discovered; nothing to replay");
            return None;
        }

        let frames = synchronize(&trajectories, self.config.normalized_interval());
        if frames.is_empty() {
            return None;
        }

        let map_name = match map_size {
            Some(size) => format!("Map {}x{}", size.width, size.height),
            None => "Unknown map".to_string(),
        };
        self.logger.record(&format!(
            "built {} frames for {} agents on {}",
            frames.len(),
            trajectories.len(),
            map_name
        ));

        Some(SimulationData {
            map_id: self.config.map_id.clone(),
            map_name,
            map_size,
            frames,
        })
    }
}

impl Default for TrajectoryBuilder {
    fn default() -> Self {
        Self::new(BuilderConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::normalize;
    use crate::trajectory::config::DWELL_FRAMES;
    use proptest::prelude::*;

    fn lengths(raw: &str, config: BuilderConfig) -> Vec<usize> {
        let (trajectories, _) = TrajectoryBuilder::new(config).trajectories(&normalize(raw));
        trajectories.iter().map(|t| t.points.len()).collect()
    }

    #[test]
    fn lone_planner_start_rests_at_start() {
        let raw = r#"PLANNER_START robotId="r1" robotName="Rover" start=(0,0) map=(10x10)"#;
        let data = TrajectoryBuilder::default().build(&normalize(raw)).unwrap();
        assert_eq!(data.frames.len(), 1 + DWELL_FRAMES);
        assert_eq!(data.map_id, "current");
        assert_eq!(data.map_name, "Map 10x10");
        assert_eq!(data.map_size, Some(MapSize::new(10.0, 10.0)));
        for frame in &data.frames {
            assert_eq!(frame.agents.len(), 1);
            assert_eq!(frame.agents[0].id, "r1");
            assert_eq!(frame.agents[0].position(), Point::new(0.0, 0.0));
        }
    }

    #[test]
    fn moves_then_trailing_dwell() {
        let raw = "PLANNER_START r1 start=(0,0) map=(10x10)\n\
                   MOVE_EXECUTED r1 x=1 y=1\n\
                   MOVE_EXECUTED r1 x=2 y=2\n\
                   MOVE_EXECUTED r1 x=3 y=3";
        let data = TrajectoryBuilder::default().build(&normalize(raw)).unwrap();
        assert_eq!(data.frames.len(), 4 + DWELL_FRAMES);
        assert_eq!(data.frames[1].agents[0].position(), Point::new(1.0, 1.0));
        assert_eq!(data.frames[1].time_ms, 100);
        let last = data.frames.last().unwrap();
        assert_eq!(last.agents[0].position(), Point::new(3.0, 3.0));
        assert_eq!(last.time_ms, (4 + DWELL_FRAMES as u64 - 1) * 100);
    }

    #[test]
    fn second_task_inserts_mid_dwell() {
        let raw = r#"PLANNER_START robotId="r1" start=(0,0)
MOVE_EXECUTED robotId="r1" x=1 y=0
MOVE_EXECUTED robotId="r1" x=2 y=0
PLANNER_START robotId="r1" start=(2,0)
MOVE_EXECUTED robotId="r1" x=2 y=1"#;
        assert_eq!(
            lengths(raw, BuilderConfig::default()),
            vec![1 + 2 + DWELL_FRAMES + 1 + DWELL_FRAMES]
        );

        let (trajectories, _) = TrajectoryBuilder::default().trajectories(&normalize(raw));
        let points = &trajectories[0].points;
        assert!(points[3..3 + DWELL_FRAMES]
            .iter()
            .all(|p| *p == Point::new(2.0, 0.0)));
        assert_eq!(points[3 + DWELL_FRAMES], Point::new(2.0, 1.0));
    }

    #[test]
    fn first_task_only_policy_skips_mid_dwell() {
        let raw = r#"PLANNER_START robotId="r1" start=(0,0)
MOVE_EXECUTED robotId="r1" x=1 y=0
PLANNER_START robotId="r1" start=(1,0)
MOVE_EXECUTED robotId="r1" x=1 y=1"#;
        let config = BuilderConfig {
            task_policy: TaskPolicy::FirstTaskOnly,
            ..Default::default()
        };
        assert_eq!(lengths(raw, config), vec![1 + 2 + DWELL_FRAMES]);
    }

    #[test]
    fn first_seen_identity_is_authoritative() {
        let raw = r#"PLANNER_START robotId="r1" robotName="Rover A" start=(1,1) map=(5x5)
PLANNER_START robotId="r1" robotName="Renamed Drone" start=(9,9) map=(20x30)"#;
        let data = TrajectoryBuilder::default().build(&normalize(raw)).unwrap();
        let agent = &data.frames[0].agents[0];
        assert_eq!(agent.display_name, "Rover A");
        assert_eq!(agent.position(), Point::new(1.0, 1.0));
        assert_eq!(data.map_name, "Map 20x30");
    }

    #[test]
    fn unequal_trajectories_freeze_the_shorter_agent() {
        let mut raw = String::from(
            "PLANNER_START robotId=\"a\" robotName=\"Rover A\" start=(0,0) map=(10x10)\n\
             PLANNER_START robotId=\"b\" robotName=\"Drone B\" start=(5,5)\n",
        );
        for step in 1..=5 {
            raw.push_str(&format!("MOVE_EXECUTED robotId=\"a\" x={} y=0\n", step));
        }
        for step in 1..=2 {
            raw.push_str(&format!("MOVE_EXECUTED robotId=\"b\" x=5 y={}\n", 5 + step));
        }

        let data = TrajectoryBuilder::default().build(&normalize(&raw)).unwrap();
        assert_eq!(data.frames.len(), 6 + DWELL_FRAMES);
        let b_final = Point::new(5.0, 7.0);
        for (index, frame) in data.frames.iter().enumerate().skip(2) {
            assert_eq!(frame.agents[1].position(), b_final);
            assert_eq!(frame.agents[0].x, index.min(5) as f32);
        }
        assert_eq!(data.frames[0].agents[1].kind, crate::prelude::AgentKind::Drone);
    }

    #[test]
    fn moves_for_unknown_agents_are_ignored() {
        let raw = r#"PLANNER_START robotId="r1" start=(0,0)
MOVE_EXECUTED robotId="ghost" x=4 y=4"#;
        assert_eq!(lengths(raw, BuilderConfig::default()), vec![1 + DWELL_FRAMES]);
    }

    #[test]
    fn empty_logs_build_nothing() {
        assert_eq!(TrajectoryBuilder::default().build(&normalize("")), None);
        assert_eq!(TrajectoryBuilder::default().build(&normalize("[]")), None);
        let only_moves = r#"MOVE_EXECUTED robotId="r1" x=1 y=1"#;
        assert_eq!(TrajectoryBuilder::default().build(&normalize(only_moves)), None);
    }

    #[test]
    fn custom_interval_and_map_id_are_applied() {
        let config = BuilderConfig {
            dwell_frames: 2,
            frame_interval_ms: 250,
            map_id: "warehouse-7".into(),
            ..Default::default()
        };
        let raw = r#"PLANNER_START robotId="r1" start=(0,0)"#;
        let data = TrajectoryBuilder::new(config).build(&normalize(raw)).unwrap();
        assert_eq!(data.map_id, "warehouse-7");
        assert_eq!(data.map_name, "Unknown map");
        let times: Vec<u64> = data.frames.iter().map(|f| f.time_ms).collect();
        assert_eq!(times, vec![0, 250, 500]);
    }

    #[test]
    fn huge_interval_builds_playable_frames() {
        let config = BuilderConfig {
            frame_interval_ms: u64::MAX / 2,
            ..Default::default()
        };
        let raw = r#"PLANNER_START robotId="r1" start=(0,0)"#;
        let data = TrajectoryBuilder::new(config).build(&normalize(raw)).unwrap();
        assert_eq!(data.frames.len(), 1 + DWELL_FRAMES);
        assert!(data.validate().is_ok());
    }

    proptest! {
        #[test]
        fn frames_are_monotonic_and_agent_sets_stable(
            moves in proptest::collection::vec((0usize..3, 0u8..20, 0u8..20), 0..40),
        ) {
            let mut raw = String::new();
            for id in 0..3 {
                raw.push_str(&format!("PLANNER_START robotId=\"r{}\" start=(0,0)\n", id));
            }
            for (id, x, y) in &moves {
                raw.push_str(&format!("MOVE_EXECUTED robotId=\"r{}\" x={} y={}\n", id, x, y));
            }
            let data = TrajectoryBuilder::default().build(&normalize(&raw)).unwrap();
            prop_assert!(data.validate().is_ok());
            for pair in data.frames.windows(2) {
                prop_assert!(pair[0].time_ms < pair[1].time_ms);
            }
            let ids: Vec<&str> = data.frames[0].agents.iter().map(|a| a.id.as_str()).collect();
            prop_assert_eq!(ids, vec!["r0", "r1", "r2"]);
        }
    }
}
