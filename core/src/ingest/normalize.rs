use crate::ingest::event::{Event, EventKind};
use crate::ingest::fields::{tokenize, Fields};
use crate::telemetry::{IngestCounts, LogManager, MetricsRecorder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured log record as delivered by the execution backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
}

impl RawRecord {
    pub fn new(kind: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: Value::String(data.into()),
            timestamp: None,
        }
    }
}

/// Turns either log encoding into a uniform event sequence.
///
/// Fragments that cannot be understood are dropped one at a time and counted;
/// the normalizer itself never fails.
pub struct EventNormalizer {
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl EventNormalizer {
    pub fn new() -> Self {
        Self {
            metrics: MetricsRecorder::new(),
            logger: LogManager::new("normalizer"),
        }
    }

    /// Accepts a JSON document (bare array or an object wrapping one array,
    /// conventionally `events`) or newline-delimited text.
    pub fn normalize(&self, raw: &str) -> Vec<Event> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        let events = match structured_items(trimmed) {
            Some(items) => self.normalize_values(items),
            None => self.normalize_text(raw),
        };

        let counts = self.metrics.snapshot();
        self.logger.record(&format!(
            "normalized {} events ({} accepted, {} dropped so far)",
            events.len(),
            counts.accepted,
            counts.dropped
        ));
        events
    }

    pub fn normalize_records(&self, records: &[RawRecord]) -> Vec<Event> {
        records
            .iter()
            .filter_map(|record| self.accept(record_to_event(record)))
            .collect()
    }

    pub fn normalize_text(&self, raw: &str) -> Vec<Event> {
        raw.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| match line_to_event(line) {
                Some(event) => self.accept(event),
                None => {
                    self.reject(line);
                    None
                }
            })
            .collect()
    }

    pub fn metrics(&self) -> IngestCounts {
        self.metrics.snapshot()
    }

    fn normalize_values(&self, items: Vec<Value>) -> Vec<Event> {
        items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<RawRecord>(item) {
                Ok(record) => self.accept(record_to_event(&record)),
                Err(err) => {
                    self.reject(&err.to_string());
                    None
                }
            })
            .collect()
    }

    fn accept(&self, event: Event) -> Option<Event> {
        if event.payload().is_some() {
            self.metrics.record_accepted();
            Some(event)
        } else {
            self.reject(&format!("{} missing required fields", event.kind.as_str()));
            None
        }
    }

    fn reject(&self, detail: &str) {
        self.metrics.record_dropped();
        self.logger.trace_drop(detail);
    }
}

impl Default for EventNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalizes a raw log with a throwaway normalizer.
pub fn normalize(raw: &str) -> Vec<Event> {
    EventNormalizer::new().normalize(raw)
}

/// Normalizes an already-decoded structured record list.
pub fn normalize_records(records: &[RawRecord]) -> Vec<Event> {
    EventNormalizer::new().normalize_records(records)
}

fn structured_items(raw: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(raw).ok()? {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => {
            if let Some(Value::Array(items)) = map.remove("events") {
                return Some(items);
            }
            let mut arrays = map.into_iter().filter_map(|(_, value)| match value {
                Value::Array(items) => Some(items),
                _ => None,
            });
            match (arrays.next(), arrays.next()) {
                (Some(items), None) => Some(items),
                _ => None,
            }
        }
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn record_to_event(record: &RawRecord) -> Event {
    let fields = match &record.data {
        Value::String(data) => tokenize(data),
        Value::Object(map) => map
            .iter()
            .filter_map(|(key, value)| scalar_text(value).map(|text| (key.clone(), text)))
            .collect::<Fields>(),
        _ => Fields::new(),
    };
    Event::new(EventKind::from_tag(&record.kind), fields)
        .with_timestamp(record.timestamp.as_ref().and_then(scalar_text))
}

fn find_marker(line: &str) -> Option<(usize, usize, EventKind)> {
    EventKind::MARKERS
        .into_iter()
        .filter_map(|(marker, kind)| {
            line.match_indices(marker)
                .find(|(idx, _)| {
                    let before = line[..*idx].chars().next_back();
                    let after = line[idx + marker.len()..].chars().next();
                    let is_word = |c: Option<char>| {
                        c.map_or(true, |c| !(c.is_ascii_alphanumeric() || c == '_'))
                    };
                    is_word(before) && is_word(after)
                })
                .map(|(idx, _)| (idx, marker.len(), kind))
        })
        .min_by_key(|(idx, _, _)| *idx)
}

/// Everything before the kind tag up to the first `key=value` pair, with
/// enclosing brackets removed: `[2024-05-01 10:00:00] PLANNER_START ...`.
fn leading_timestamp(prefix: &str) -> Option<String> {
    let end = match prefix.find('=') {
        Some(eq) => prefix[..eq].rfind(char::is_whitespace).unwrap_or(0),
        None => prefix.len(),
    };
    let stamp = prefix[..end]
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim();
    (!stamp.is_empty()).then(|| stamp.to_string())
}

/// Legacy lines sometimes carry the robot id positionally, right after the
/// kind tag: `MOVE_EXECUTED r1 x=1 y=1`.
fn positional_robot_id(body: &str) -> Option<String> {
    body.split_whitespace()
        .next()
        .filter(|token| !token.contains('=') && !token.starts_with('('))
        .map(|token| {
            token
                .trim_matches(|c| c == '"' || c == ',' || c == ':')
                .to_string()
        })
        .filter(|token| !token.is_empty())
}

fn line_to_event(line: &str) -> Option<Event> {
    let (idx, len, kind) = find_marker(line)?;
    let (prefix, body) = (&line[..idx], &line[idx + len..]);
    let mut fields = tokenize(prefix);
    fields.extend(tokenize(body));
    if !fields.contains_key("robotId") {
        if let Some(robot_id) = positional_robot_id(body) {
            fields.insert("robotId".into(), robot_id);
        }
    }
    Some(Event::new(kind, fields).with_timestamp(leading_timestamp(prefix)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::event::EventPayload;
    use crate::prelude::Point;
    use proptest::prelude::*;

    const TEXT_LOG: &str = r#"
[2024-05-01T10:00:00Z] PLANNER_START robotId="r1" robotName="Rover One" start=(0,0) goal=(3,3) map=(10x10)
[2024-05-01T10:00:01Z] MOVE_EXECUTED robotId="r1" x=1 y=1
heartbeat ok
[2024-05-01T10:00:02Z] MOVE_EXECUTED x=2 y=2
[2024-05-01T10:00:03Z] MOVE_EXECUTED robotId="r1" x=2 y=2
"#;

    #[test]
    fn text_log_keeps_marked_lines_and_drops_broken_ones() {
        let normalizer = EventNormalizer::new();
        let events = normalizer.normalize(TEXT_LOG);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].kind, EventKind::PlannerStart);
        assert_eq!(events[0].timestamp.as_deref(), Some("2024-05-01T10:00:00Z"));
        assert_eq!(events[2].fields["x"], "2");
        assert_eq!(
            normalizer.metrics(),
            IngestCounts {
                accepted: 3,
                dropped: 2
            }
        );
    }

    #[test]
    fn structured_log_with_events_wrapper() {
        let raw = r#"{"events": [
            {"type": "PLANNER_START", "data": "robotId=\"d1\" robotName=\"Drone A\" start=(2,3) map=(8,8)"},
            {"type": "TASK_ASSIGNED", "data": "taskId=\"t9\""},
            {"type": "MOVE_EXECUTED", "data": "robotId=\"d1\" x=3 y=3", "timestamp": 1714557600}
        ]}"#;
        let events = normalize(raw);
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].kind, EventKind::Other("TASK_ASSIGNED".into()));
        assert_eq!(events[2].timestamp.as_deref(), Some("1714557600"));
    }

    #[test]
    fn structured_log_as_bare_array_with_object_data() {
        let raw = r#"[{"type": "MOVE_EXECUTED", "data": {"robotId": "r2", "x": 4, "y": 5.5}}]"#;
        let events = normalize(raw);
        assert_eq!(events.len(), 1);
        let Some(EventPayload::MoveExecuted(step)) = events[0].payload() else {
            panic!("expected move payload");
        };
        assert_eq!(step.robot_id, "r2");
        assert_eq!(step.position, Point::new(4.0, 5.5));
    }

    #[test]
    fn structured_object_with_single_array_field() {
        let raw = r#"{"log": [{"type": "MOVE_EXECUTED", "data": "robotId=\"r1\" x=1 y=1"}], "run": 7}"#;
        assert_eq!(normalize(raw).len(), 1);
    }

    #[test]
    fn structured_records_missing_type_are_dropped() {
        let normalizer = EventNormalizer::new();
        let raw = r#"[{"data": "robotId=\"r1\" x=1 y=1"}, {"type": "MOVE_EXECUTED", "data": "robotId=\"r1\" x=1 y=1"}]"#;
        assert_eq!(normalizer.normalize(raw).len(), 1);
        assert_eq!(normalizer.metrics().dropped, 1);
    }

    #[test]
    fn record_list_entry_point() {
        let records = vec![
            RawRecord::new("PLANNER_START", r#"robotId="r1" start=(0,0)"#),
            RawRecord::new("MOVE_EXECUTED", r#"robotId="r1" y=2"#),
        ];
        let events = normalize_records(&records);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::PlannerStart);
    }

    #[test]
    fn positional_robot_id_is_recognized() {
        let events = normalize("PLANNER_START r1 start=(0,0) map=(10x10)\nMOVE_EXECUTED r1 x=1 y=1");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].fields["robotId"], "r1");
        assert_eq!(events[0].timestamp, None);
        assert_eq!(events[1].fields["robotId"], "r1");
    }

    #[test]
    fn pairs_before_the_tag_are_kept() {
        let events = normalize(r#"robotId="r1" MOVE_EXECUTED x=1 y=1"#);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].fields["robotId"], "r1");
        assert_eq!(events[0].timestamp, None);
    }

    #[test]
    fn pairs_after_the_tag_win_over_earlier_ones() {
        let events = normalize(r#"[t0] robotId="r9" MOVE_EXECUTED robotId="r1" x=1 y=1"#);
        assert_eq!(events[0].fields["robotId"], "r1");
        assert_eq!(events[0].timestamp.as_deref(), Some("t0"));
    }

    #[test]
    fn timestamp_keeps_the_whole_prefix() {
        let events = normalize(
            "[2024-05-01 10:00:00] PLANNER_START robotId=\"r1\" start=(0,0)\n\
             2024-05-01 10:00:01 MOVE_EXECUTED robotId=\"r1\" x=1 y=0",
        );
        assert_eq!(events[0].timestamp.as_deref(), Some("2024-05-01 10:00:00"));
        assert_eq!(events[1].timestamp.as_deref(), Some("2024-05-01 10:00:01"));
    }

    #[test]
    fn marker_must_be_a_whole_word() {
        assert!(normalize(r#"PLANNER_START_FAILED robotId="r1" start=(0,0)"#).is_empty());
    }

    #[test]
    fn empty_inputs_yield_no_events() {
        assert!(normalize("").is_empty());
        assert!(normalize("   \n\n").is_empty());
        assert!(normalize("[]").is_empty());
        assert!(normalize(r#"{"events": []}"#).is_empty());
        assert!(normalize("garbage without markers").is_empty());
    }

    proptest! {
        #[test]
        fn normalizing_twice_is_identical(
            moves in proptest::collection::vec((0u8..50, 0u8..50), 0..20),
            noise in "[a-z =()\"]{0,40}",
        ) {
            let mut raw = String::from("PLANNER_START robotId=\"r1\" start=(0,0) map=(50x50)\n");
            for (x, y) in &moves {
                raw.push_str(&format!("MOVE_EXECUTED robotId=\"r1\" x={} y={}\n", x, y));
                raw.push_str(&noise);
                raw.push('\n');
            }
            prop_assert_eq!(normalize(&raw), normalize(&raw));
        }
    }
}
