//! Event normalization for planner/execution logs.

pub mod event;
pub mod fields;
pub mod normalize;

pub use event::{Event, EventKind, EventPayload, MoveExecuted, PlannerStart};
pub use normalize::{normalize, normalize_records, EventNormalizer, RawRecord};
