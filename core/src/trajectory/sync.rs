use crate::prelude::{AgentPose, Frame};
use crate::trajectory::builder::Trajectory;

/// Aligns per-agent trajectories into one frame per index. Agents whose
/// trajectory is exhausted hold their last waypoint. Frames whose time would
/// overflow `u64` are not emitted.
pub fn synchronize(trajectories: &[Trajectory], frame_interval_ms: u64) -> Vec<Frame> {
    let frame_count = trajectories
        .iter()
        .map(|trajectory| trajectory.points.len())
        .max()
        .unwrap_or(0);

    (0..frame_count)
        .map_while(|index| {
            let time_ms = (index as u64).checked_mul(frame_interval_ms)?;
            Some((index, time_ms))
        })
        .map(|(index, time_ms)| Frame {
            time_ms,
            agents: trajectories
                .iter()
                .filter_map(|trajectory| {
                    let last = trajectory.points.len().checked_sub(1)?;
                    Some(AgentPose::at(
                        &trajectory.info,
                        trajectory.points[index.min(last)],
                    ))
                })
                .collect(),
        })
        .collect()
}
