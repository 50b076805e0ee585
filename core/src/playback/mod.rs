//! Continuous-time playback of synchronized frames.

pub mod clock;
pub mod engine;
pub mod interpolate;
pub mod scheduler;
pub mod trail;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{PlaybackEngine, PlaybackState};
pub use interpolate::pose_at;
pub use scheduler::{RenderLoop, TickToken};
pub use trail::TrailSampler;
