use crate::prelude::Point;

pub struct InterpHelper;

impl InterpHelper {
    pub fn lerp(from: f32, to: f32, tau: f32) -> f32 {
        from + (to - from) * tau
    }

    pub fn lerp_point(from: Point, to: Point, tau: f32) -> Point {
        Point::new(
            Self::lerp(from.x, to.x, tau),
            Self::lerp(from.y, to.y, tau),
        )
    }

    /// Position of `time` inside `[start, end]` as a fraction; 0 when the
    /// interval is empty.
    pub fn fraction(time: f64, start: f64, end: f64) -> f32 {
        let span = end - start;
        if span <= 0.0 {
            return 0.0;
        }
        ((time - start) / span) as f32
    }

    pub fn clamp_time(time: f64, duration: f64) -> f64 {
        time.clamp(0.0, duration.max(0.0))
    }
}
