use crate::math::interp::InterpHelper;
use crate::prelude::{AgentPose, Frame};

/// Interpolated pose of every agent at `time_ms`.
///
/// Times before the first frame (or non-finite) return the first frame's
/// agents, times after the last frame return the last frame's agents, and
/// anything in between is a linear blend of the two bracketing frames. Only
/// `x` and `y` are blended; the remaining fields come from the earlier frame.
pub fn pose_at(frames: &[Frame], time_ms: f64) -> Vec<AgentPose> {
    let (Some(first), Some(last)) = (frames.first(), frames.last()) else {
        return Vec::new();
    };
    if !time_ms.is_finite() || time_ms <= first.time_ms as f64 {
        return first.agents.clone();
    }
    if time_ms >= last.time_ms as f64 {
        return last.agents.clone();
    }

    let upper = frames.partition_point(|frame| frame.time_ms as f64 <= time_ms);
    let (from, to) = (&frames[upper - 1], &frames[upper]);
    debug_assert_eq!(from.agents.len(), to.agents.len());

    let tau = InterpHelper::fraction(time_ms, from.time_ms as f64, to.time_ms as f64);
    from.agents
        .iter()
        .zip(&to.agents)
        .map(|(start, end)| {
            let position = InterpHelper::lerp_point(start.position(), end.position(), tau);
            AgentPose {
                x: position.x,
                y: position.y,
                ..start.clone()
            }
        })
        .collect()
}
