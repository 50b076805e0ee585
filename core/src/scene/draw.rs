use crate::math::bounds::BoundsHelper;
use crate::playback::{Clock, PlaybackEngine};
use crate::prelude::{AgentKind, AgentPose, MapSize, Point, SimulationData};
use crate::scene::overlay::SceneOverlay;
use crate::scene::palette::{self, agent_color, Rgba};
use std::path::PathBuf;

/// Grid lines are skipped past this many cells per axis.
const MAX_GRID_LINES: usize = 200;
const MARKER_SIZE: f32 = 14.0;
const LABEL_OFFSET: f32 = 12.0;

/// Size of the drawing surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    Square,
    Triangle,
}

impl From<AgentKind> for MarkerShape {
    fn from(kind: AgentKind) -> Self {
        match kind {
            AgentKind::Rover => MarkerShape::Square,
            AgentKind::Drone => MarkerShape::Triangle,
        }
    }
}

/// Renderer-agnostic paint operation, emitted in back-to-front order.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Base layer. When `image` is set the caller paints it; otherwise the
    /// background is filled and `columns` x `rows` grid lines are drawn.
    Background {
        image: Option<PathBuf>,
        color: Rgba,
        columns: usize,
        rows: usize,
        cell: Point,
        line: Rgba,
    },
    Obstacle {
        rect: Rect,
        color: Rgba,
    },
    TaskArea {
        rect: Rect,
        fill: Rgba,
        border: Rgba,
        label: String,
    },
    TrailSegment {
        from: Point,
        to: Point,
        color: Rgba,
    },
    Marker {
        center: Point,
        size: f32,
        shape: MarkerShape,
        color: Rgba,
    },
    Label {
        position: Point,
        text: String,
        size: f32,
        color: Rgba,
    },
}

/// Maps map coordinates onto the surface. Waypoints sit in the middle of
/// their cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub cell_width: f32,
    pub cell_height: f32,
}

impl ViewTransform {
    pub fn new(map: MapSize, surface: Surface) -> Self {
        Self {
            cell_width: surface.width / map.width.max(1.0),
            cell_height: surface.height / map.height.max(1.0),
        }
    }

    pub fn to_surface(&self, point: Point) -> Point {
        Point::new(
            (point.x + 0.5) * self.cell_width,
            (point.y + 0.5) * self.cell_height,
        )
    }

    pub fn cell(&self, row: usize, col: usize) -> Rect {
        Rect {
            x: col as f32 * self.cell_width,
            y: row as f32 * self.cell_height,
            width: self.cell_width,
            height: self.cell_height,
        }
    }

    pub fn area(&self, x: f32, y: f32, width: f32, height: f32) -> Rect {
        Rect {
            x: x * self.cell_width,
            y: y * self.cell_height,
            width: width * self.cell_width,
            height: height * self.cell_height,
        }
    }
}

/// Everything needed to paint one tick.
pub struct SceneInput<'a> {
    pub data: &'a SimulationData,
    pub pose: &'a [AgentPose],
    pub trails: &'a [Vec<Point>],
    pub time_ms: f64,
    pub overlay: &'a SceneOverlay,
    pub surface: Surface,
}

/// Picks the map extent from the overlay, then the log, then the obstacle
/// grid, and finally the bounding box of every frame.
pub fn resolve_map_size(data: &SimulationData, overlay: &SceneOverlay) -> MapSize {
    overlay
        .map_size
        .or(data.map_size)
        .or_else(|| overlay.obstacles.as_ref().map(|grid| grid.size()))
        .unwrap_or_else(|| {
            BoundsHelper::enclosing(
                data.frames
                    .iter()
                    .flat_map(|frame| frame.agents.iter().map(AgentPose::position)),
            )
        })
}

/// Opacity of trail segment `index` out of `count`; newest is opaque.
pub fn fade_alpha(index: usize, count: usize) -> f32 {
    if count == 0 {
        return 1.0;
    }
    0.15 + 0.85 * (index + 1) as f32 / count as f32
}

pub fn format_readout(time_ms: f64, duration_ms: f64) -> String {
    format!("t = {:.2} s / {:.2} s", time_ms / 1000.0, duration_ms / 1000.0)
}

pub fn compose(input: &SceneInput<'_>) -> Vec<DrawCommand> {
    let map = resolve_map_size(input.data, input.overlay);
    let view = ViewTransform::new(map, input.surface);
    let mut commands = Vec::new();

    let columns = map.width.ceil().max(0.0) as usize;
    let rows = map.height.ceil().max(0.0) as usize;
    commands.push(DrawCommand::Background {
        image: input.overlay.map_image.clone(),
        color: palette::BACKGROUND,
        columns: if columns <= MAX_GRID_LINES { columns } else { 0 },
        rows: if rows <= MAX_GRID_LINES { rows } else { 0 },
        cell: Point::new(view.cell_width, view.cell_height),
        line: palette::GRID_LINE,
    });

    if let Some(grid) = &input.overlay.obstacles {
        commands.extend(grid.blocked_cells().map(|(row, col)| DrawCommand::Obstacle {
            rect: view.cell(row, col),
            color: palette::OBSTACLE,
        }));
    }

    commands.extend(
        input
            .overlay
            .task_areas
            .iter()
            .enumerate()
            .map(|(ordinal, area)| DrawCommand::TaskArea {
                rect: view.area(area.x, area.y, area.width, area.height),
                fill: palette::TASK_AREA.with_alpha(0.18),
                border: palette::TASK_AREA,
                label: format!("#{}", ordinal + 1),
            }),
    );

    for (index, agent) in input.pose.iter().enumerate() {
        let color = agent_color(index);
        if let Some(trail) = input.trails.get(index) {
            let segments = trail.len().saturating_sub(1);
            commands.extend(trail.windows(2).enumerate().map(|(step, pair)| {
                DrawCommand::TrailSegment {
                    from: view.to_surface(pair[0]),
                    to: view.to_surface(pair[1]),
                    color: color.with_alpha(fade_alpha(step, segments)),
                }
            }));
        }

        let center = view.to_surface(agent.position());
        commands.push(DrawCommand::Marker {
            center,
            size: MARKER_SIZE,
            shape: agent.kind.into(),
            color,
        });
        commands.push(DrawCommand::Label {
            position: Point::new(center.x, center.y - LABEL_OFFSET),
            text: agent.id.clone(),
            size: 12.0,
            color: palette::TEXT,
        });
        commands.push(DrawCommand::Label {
            position: Point::new(center.x, center.y + LABEL_OFFSET),
            text: agent.display_name.clone(),
            size: 11.0,
            color,
        });
    }

    commands.push(DrawCommand::Label {
        position: Point::new(8.0, 8.0),
        text: format_readout(input.time_ms, input.data.duration_ms() as f64),
        size: 14.0,
        color: palette::TEXT,
    });
    commands.push(DrawCommand::Label {
        position: Point::new(8.0, 26.0),
        text: input.data.map_name.clone(),
        size: 14.0,
        color: palette::TEXT,
    });

    commands
}

/// Composes the scene for the engine's current time.
pub fn compose_engine<C: Clock>(
    engine: &PlaybackEngine<C>,
    overlay: &SceneOverlay,
    surface: Surface,
) -> Vec<DrawCommand> {
    let pose = engine.pose();
    let trails = engine.trails();
    compose(&SceneInput {
        data: engine.data(),
        pose: &pose,
        trails: &trails,
        time_ms: engine.current_ms(),
        overlay,
        surface,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::normalize;
    use crate::playback::ManualClock;
    use crate::scene::overlay::{OccupancyGrid, TaskArea};
    use crate::trajectory::build;

    const LOG: &str = r#"PLANNER_START robotId="r1" robotName="Rover One" start=(0,0) map=(10x10)
PLANNER_START robotId="r2" robotName="Rover Two" start=(9,9)
PLANNER_START robotId="d1" robotName="Drone" start=(5,5)
MOVE_EXECUTED robotId="r1" x=1 y=0
MOVE_EXECUTED robotId="r1" x=2 y=0"#;

    fn surface() -> Surface {
        Surface {
            width: 500.0,
            height: 500.0,
        }
    }

    fn overlay() -> SceneOverlay {
        SceneOverlay {
            obstacles: Some(OccupancyGrid::from_rows(vec![vec![0, 1], vec![1, 1]]).unwrap()),
            task_areas: vec![TaskArea {
                x: 2.0,
                y: 2.0,
                width: 3.0,
                height: 1.0,
                module_ids: vec!["dock".into()],
                priority: Some(1),
                description: None,
            }],
            ..Default::default()
        }
    }

    fn rank(command: &DrawCommand) -> usize {
        match command {
            DrawCommand::Background { .. } => 0,
            DrawCommand::Obstacle { .. } => 1,
            DrawCommand::TaskArea { .. } => 2,
            _ => 3,
        }
    }

    #[test]
    fn layers_are_emitted_back_to_front() {
        let data = build(&normalize(LOG)).unwrap();
        let clock = ManualClock::new();
        let mut engine = PlaybackEngine::new(data, clock.clone()).unwrap();
        engine.play();
        clock.advance(150.0);
        engine.tick();

        let commands = compose_engine(&engine, &overlay(), surface());
        let ranks: Vec<usize> = commands.iter().map(rank).collect();
        assert!(ranks.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(ranks.iter().filter(|r| **r == 1).count(), 3);

        let Some(DrawCommand::TaskArea { rect, label, .. }) =
            commands.iter().find(|c| matches!(c, DrawCommand::TaskArea { .. }))
        else {
            panic!("task area missing");
        };
        assert_eq!(label, "#1");
        assert_eq!(rect.x, 100.0);
        assert_eq!(rect.width, 150.0);

        let Some(DrawCommand::Label { text, .. }) = commands.last() else {
            panic!("map name missing");
        };
        assert_eq!(text, "Map 10x10");
        let readout = &commands[commands.len() - 2];
        assert!(matches!(readout, DrawCommand::Label { text, .. } if text == "t = 0.15 s / 1.70 s"));
    }

    #[test]
    fn markers_follow_kind_and_palette_index() {
        let data = build(&normalize(LOG)).unwrap();
        let engine = PlaybackEngine::new(data, ManualClock::new()).unwrap();
        let commands = compose_engine(&engine, &SceneOverlay::default(), surface());
        let markers: Vec<(MarkerShape, Rgba)> = commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Marker { shape, color, .. } => Some((*shape, *color)),
                _ => None,
            })
            .collect();
        assert_eq!(
            markers,
            vec![
                (MarkerShape::Square, agent_color(0)),
                (MarkerShape::Square, agent_color(1)),
                (MarkerShape::Triangle, agent_color(2)),
            ]
        );
    }

    #[test]
    fn waypoints_land_in_cell_centers() {
        let view = ViewTransform::new(MapSize::new(10.0, 10.0), surface());
        assert_eq!(view.to_surface(Point::new(0.0, 0.0)), Point::new(25.0, 25.0));
        assert_eq!(view.cell(1, 2).x, 100.0);
    }

    #[test]
    fn map_size_falls_back_to_frame_bounds() {
        let raw = r#"PLANNER_START robotId="r1" start=(3,4)"#;
        let data = build(&normalize(raw)).unwrap();
        assert_eq!(
            resolve_map_size(&data, &SceneOverlay::default()),
            MapSize::new(4.0, 5.0)
        );
        let overlay = SceneOverlay {
            map_size: Some(MapSize::new(40.0, 20.0)),
            ..Default::default()
        };
        assert_eq!(resolve_map_size(&data, &overlay), MapSize::new(40.0, 20.0));
    }

    #[test]
    fn trail_fades_toward_the_past() {
        assert!(fade_alpha(0, 4) < fade_alpha(3, 4));
        assert!((fade_alpha(3, 4) - 1.0).abs() < 1e-6);
    }
}
