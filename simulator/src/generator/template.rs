use fleetreplay::ingest::RawRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Key/value payload of a `PLANNER_START` entry.
pub fn planner_start_data(
    robot_id: &str,
    robot_name: &str,
    start: (i32, i32),
    goal: (i32, i32),
    map: (u32, u32),
) -> String {
    format!(
        "robotId=\"{}\" robotName=\"{}\" start=({},{}) goal=({},{}) map=({}x{})",
        robot_id, robot_name, start.0, start.1, goal.0, goal.1, map.0, map.1
    )
}

/// Key/value payload of a `MOVE_EXECUTED` entry.
pub fn move_data(robot_id: &str, position: (i32, i32)) -> String {
    format!("robotId=\"{}\" x={} y={}", robot_id, position.0, position.1)
}

/// Renders `(kind, data)` entries in the requested encoding.
pub fn render(entries: &[(&'static str, String)], format: LogFormat) -> anyhow::Result<String> {
    match format {
        LogFormat::Text => Ok(entries
            .iter()
            .enumerate()
            .map(|(seq, (kind, data))| format!("[{:06}] {} {}\n", seq, kind, data))
            .collect()),
        LogFormat::Json => {
            let events: Vec<RawRecord> = entries
                .iter()
                .enumerate()
                .map(|(seq, (kind, data))| RawRecord {
                    timestamp: Some(serde_json::Value::from(seq)),
                    ..RawRecord::new(*kind, data.clone())
                })
                .collect();
            Ok(serde_json::to_string_pretty(
                &serde_json::json!({ "events": events }),
            )?)
        }
    }
}
