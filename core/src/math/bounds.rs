use crate::prelude::{MapSize, Point};

/// Axis-aligned extent of a point cloud, anchored at the origin.
pub struct BoundsHelper;

impl BoundsHelper {
    /// Smallest map extent that contains every point, with one cell of
    /// headroom so agents on the far edge stay inside the surface.
    pub fn enclosing<I>(points: I) -> MapSize
    where
        I: IntoIterator<Item = Point>,
    {
        let (max_x, max_y) = points
            .into_iter()
            .fold((0.0f32, 0.0f32), |(mx, my), p| (mx.max(p.x), my.max(p.y)));
        MapSize::new(max_x.floor() + 1.0, max_y.floor() + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enclosing_adds_a_cell_of_headroom() {
        let size = BoundsHelper::enclosing(vec![Point::new(3.0, 1.5), Point::new(0.5, 7.0)]);
        assert_eq!(size, MapSize::new(4.0, 8.0));
    }

    #[test]
    fn enclosing_empty_is_unit() {
        assert_eq!(BoundsHelper::enclosing(Vec::new()), MapSize::new(1.0, 1.0));
    }
}
