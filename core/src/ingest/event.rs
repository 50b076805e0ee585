use crate::ingest::fields::{parse_number, parse_pair, Fields};
use crate::prelude::{MapSize, Point};
use serde::{Deserialize, Serialize};

/// Kind tag of a log event. Unknown tags are kept verbatim so newer log
/// producers never break ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    PlannerStart,
    MoveExecuted,
    Other(String),
}

impl EventKind {
    /// Kinds the text decoder looks for inside free-form lines.
    pub const MARKERS: [(&'static str, EventKind); 2] = [
        ("PLANNER_START", EventKind::PlannerStart),
        ("MOVE_EXECUTED", EventKind::MoveExecuted),
    ];

    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "PLANNER_START" => EventKind::PlannerStart,
            "MOVE_EXECUTED" => EventKind::MoveExecuted,
            other => EventKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::PlannerStart => "PLANNER_START",
            EventKind::MoveExecuted => "MOVE_EXECUTED",
            EventKind::Other(tag) => tag,
        }
    }
}

impl From<String> for EventKind {
    fn from(value: String) -> Self {
        EventKind::from_tag(&value)
    }
}

impl From<EventKind> for String {
    fn from(value: EventKind) -> Self {
        value.as_str().to_string()
    }
}

/// One normalized log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub kind: EventKind,
    pub fields: Fields,
}

/// A planner picked up a new task for one robot.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerStart {
    pub robot_id: String,
    pub robot_name: Option<String>,
    pub start: Point,
    pub goal: Option<Point>,
    pub map: Option<MapSize>,
}

/// A robot finished one step of its path.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveExecuted {
    pub robot_id: String,
    pub position: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    PlannerStart(PlannerStart),
    MoveExecuted(MoveExecuted),
    Other,
}

impl Event {
    pub fn new(kind: EventKind, fields: Fields) -> Self {
        Self {
            timestamp: None,
            kind,
            fields,
        }
    }

    pub fn with_timestamp(mut self, timestamp: Option<String>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    fn point(&self, key: &str) -> Option<Point> {
        self.field(key)
            .and_then(parse_pair)
            .map(|(x, y)| Point::new(x, y))
    }

    /// Typed view of the event. `None` means a known kind is missing one of
    /// its required fields; optional fields that fail to parse are left out.
    pub fn payload(&self) -> Option<EventPayload> {
        match self.kind {
            EventKind::PlannerStart => {
                let robot_id = self.field("robotId")?.trim().to_string();
                let start = self.point("start")?;
                Some(EventPayload::PlannerStart(PlannerStart {
                    robot_id,
                    robot_name: self.field("robotName").map(|name| name.trim().to_string()),
                    start,
                    goal: self.point("goal"),
                    map: self
                        .field("map")
                        .and_then(parse_pair)
                        .map(|(w, h)| MapSize::new(w, h)),
                }))
            }
            EventKind::MoveExecuted => {
                let robot_id = self.field("robotId")?.trim().to_string();
                let x = self.field("x").and_then(parse_number)?;
                let y = self.field("y").and_then(parse_number)?;
                Some(EventPayload::MoveExecuted(MoveExecuted {
                    robot_id,
                    position: Point::new(x, y),
                }))
            }
            EventKind::Other(_) => Some(EventPayload::Other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fields::tokenize;

    #[test]
    fn planner_start_payload_reads_optional_fields() {
        let event = Event::new(
            EventKind::PlannerStart,
            tokenize(r#"robotId="r1" robotName="Rover" start=(0,1) goal=(4,4) map=(10x12)"#),
        );
        let Some(EventPayload::PlannerStart(start)) = event.payload() else {
            panic!("expected planner start payload");
        };
        assert_eq!(start.robot_id, "r1");
        assert_eq!(start.robot_name.as_deref(), Some("Rover"));
        assert_eq!(start.start, Point::new(0.0, 1.0));
        assert_eq!(start.goal, Some(Point::new(4.0, 4.0)));
        assert_eq!(start.map, Some(MapSize::new(10.0, 12.0)));
    }

    #[test]
    fn malformed_optional_goal_is_tolerated() {
        let event = Event::new(
            EventKind::PlannerStart,
            tokenize(r#"robotId="r1" start=(0,0) goal=(north)"#),
        );
        let Some(EventPayload::PlannerStart(start)) = event.payload() else {
            panic!("expected planner start payload");
        };
        assert_eq!(start.goal, None);
        assert_eq!(start.robot_name, None);
    }

    #[test]
    fn move_without_robot_id_has_no_payload() {
        let event = Event::new(EventKind::MoveExecuted, tokenize("x=1 y=2"));
        assert_eq!(event.payload(), None);
    }

    #[test]
    fn move_with_non_numeric_coordinate_has_no_payload() {
        let event = Event::new(EventKind::MoveExecuted, tokenize(r#"robotId="r1" x=a y=2"#));
        assert_eq!(event.payload(), None);
    }

    #[test]
    fn unknown_kinds_round_trip_their_tag() {
        let kind = EventKind::from_tag("TASK_ASSIGNED");
        assert_eq!(kind, EventKind::Other("TASK_ASSIGNED".into()));
        assert_eq!(kind.as_str(), "TASK_ASSIGNED");
        let event = Event::new(kind, Fields::new());
        assert_eq!(event.payload(), Some(EventPayload::Other));
    }

    #[test]
    fn event_kind_serializes_as_tag() {
        let json = serde_json::to_string(&EventKind::MoveExecuted).unwrap();
        assert_eq!(json, "\"MOVE_EXECUTED\"");
    }
}
