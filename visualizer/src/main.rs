use fleetreplay::playback::{PlaybackEngine, TickToken};
use fleetreplay::scene::{compose_engine, DrawCommand, MarkerShape, Rgba, SceneOverlay, Surface};
use fleetreplay::telemetry::IngestCounts;
use fleetreplay::SimulationData;
use iced::{
    mouse,
    widget::{
        button,
        canvas::{self, Canvas, Frame, Geometry, Path, Stroke},
        column, image, row, scrollable, slider, stack, text, Column, Container,
    },
    Alignment, Color, ContentFit, Element, Length, Pixels, Point, Rectangle, Renderer, Size,
    Task, Theme,
};
use log::{info, warn};
use serde::Deserialize;
use std::time::Duration;

const SIMULATION_URL: &str = "http://127.0.0.1:9000/simulation";
const FRAME_DELAY: Duration = Duration::from_millis(16);
const SPEEDS: [f64; 4] = [0.5, 1.0, 2.0, 4.0];

fn main() -> iced::Result {
    env_logger::init();
    iced::application(Visualizer::boot, Visualizer::update, Visualizer::view)
        .title(application_title)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Visualizer) -> String {
    "Fleet Replay".into()
}

fn application_theme(_: &Visualizer) -> Theme {
    Theme::Dark
}

struct Visualizer {
    engine: Option<PlaybackEngine>,
    overlay: SceneOverlay,
    status: String,
    history: Vec<String>,
}

#[derive(Debug, Clone)]
enum Message {
    Reload,
    PayloadFetched(Result<VisualizationPayload, String>),
    Play,
    Pause,
    Reset,
    SpeedSelected(f64),
    Seek(f32),
    Frame(TickToken),
}

impl Visualizer {
    fn boot() -> (Self, Task<Message>) {
        (
            Visualizer {
                engine: None,
                overlay: SceneOverlay::default(),
                status: "Waiting for simulation data...".into(),
                history: Vec::new(),
            },
            Task::perform(fetch_payload(), Message::PayloadFetched),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Reload => Task::perform(fetch_payload(), Message::PayloadFetched),
            Message::PayloadFetched(Ok(payload)) => {
                state.load(payload);
                Task::none()
            }
            Message::PayloadFetched(Err(err)) => {
                state.status = format!("Fetch error: {err}");
                Task::none()
            }
            Message::Play => {
                if let Some(engine) = state.engine.as_mut() {
                    engine.play();
                }
                state.schedule_frame()
            }
            Message::Pause => {
                if let Some(engine) = state.engine.as_mut() {
                    engine.pause();
                }
                Task::none()
            }
            Message::Reset => {
                if let Some(engine) = state.engine.as_mut() {
                    engine.reset();
                }
                Task::none()
            }
            Message::SpeedSelected(speed) => {
                if let Some(engine) = state.engine.as_mut() {
                    if let Err(err) = engine.set_speed(speed) {
                        state.status = err.to_string();
                    }
                }
                Task::none()
            }
            Message::Seek(time_ms) => {
                if let Some(engine) = state.engine.as_mut() {
                    if let Err(err) = engine.seek(f64::from(time_ms)) {
                        state.status = err.to_string();
                    }
                }
                Task::none()
            }
            Message::Frame(token) => {
                let completed = state
                    .engine
                    .as_mut()
                    .map(|engine| engine.complete_tick(token))
                    .unwrap_or(false);
                if completed {
                    state.schedule_frame()
                } else {
                    Task::none()
                }
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let speed = state.engine.as_ref().map(|e| e.speed()).unwrap_or(1.0);
        let speed_row = SPEEDS.iter().fold(row![].spacing(6), |row, &choice| {
            let label = format!("{choice}x");
            let mut speed_button = button(text(label).size(14)).padding(6);
            if (choice - speed).abs() > f64::EPSILON {
                speed_button = speed_button.on_press(Message::SpeedSelected(choice));
            }
            row.push(speed_button)
        });

        let (current, duration, running) = state
            .engine
            .as_ref()
            .map(|e| (e.current_ms() as f32, e.duration_ms() as f32, e.is_running()))
            .unwrap_or((0.0, 0.0, false));

        let transport = if running {
            button("Pause").on_press(Message::Pause).padding(10)
        } else {
            button("Play").on_press(Message::Play).padding(10)
        };

        let history_list = if state.history.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            state
                .history
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry.clone()).size(12))
                })
        };

        let controls = column![
            text("Playback").size(26),
            row![
                transport,
                button("Reset").on_press(Message::Reset).padding(10),
                button("Reload").on_press(Message::Reload).padding(10),
            ]
            .spacing(8),
            text("Speed").size(16),
            speed_row,
            text(format!("{:.1} s / {:.1} s", current / 1000.0, duration / 1000.0)).size(14),
            slider(0.0..=duration.max(1.0), current, Message::Seek).step(10.0),
            text(&state.status).size(14),
            text("Activity log").size(16),
            Container::new(scrollable(history_list).height(Length::Fixed(160.0))).padding(6),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(320.0));

        let stage: Element<'_, Message> = match &state.engine {
            Some(engine) => {
                let replay = Canvas::new(ReplayCanvas {
                    engine,
                    overlay: &state.overlay,
                })
                .width(Length::Fill)
                .height(Length::Fill);

                match &state.overlay.map_image {
                    Some(path) => stack![
                        image(image::Handle::from_path(path))
                            .width(Length::Fill)
                            .height(Length::Fill)
                            .content_fit(ContentFit::Fill),
                        replay,
                    ]
                    .into(),
                    None => replay.into(),
                }
            }
            None => Container::new(text("No simulation data").size(22))
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into(),
        };

        let layout = row![controls, stage]
            .spacing(20)
            .align_y(Alignment::Start)
            .padding(20);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Replaces the current replay. Dropping the old engine cancels its
    /// pending tick.
    fn load(&mut self, payload: VisualizationPayload) {
        self.overlay = payload.overlay;
        self.engine = None;
        match payload.simulation {
            Some(data) => {
                let frames = data.frames.len();
                match PlaybackEngine::with_system_clock(data) {
                    Ok(engine) => {
                        self.status = payload.status;
                        self.engine = Some(engine);
                        info!("loaded replay with {} frames", frames);
                        self.push_history(format!(
                            "Loaded {} frames from {} events ({} dropped)",
                            frames, payload.event_count, payload.counts.dropped
                        ));
                    }
                    Err(err) => {
                        warn!("rejected replay: {}", err);
                        self.status = format!("Rejected replay: {err}");
                    }
                }
            }
            None => {
                self.status = "No simulation data".into();
                self.push_history(format!(
                    "Empty replay from {} events",
                    payload.event_count
                ));
            }
        }
    }

    /// Keeps exactly one frame tick in flight while playing.
    fn schedule_frame(&mut self) -> Task<Message> {
        match self.engine.as_mut().and_then(|engine| engine.request_tick()) {
            Some(token) => Task::perform(tokio::time::sleep(FRAME_DELAY), move |_| {
                Message::Frame(token)
            }),
            None => Task::none(),
        }
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > 20 {
            self.history.remove(0);
        }
    }
}

async fn fetch_payload() -> Result<VisualizationPayload, String> {
    let response = reqwest::get(SIMULATION_URL)
        .await
        .map_err(|e| e.to_string())?;
    response
        .json::<VisualizationPayload>()
        .await
        .map_err(|e| e.to_string())
}

#[derive(Debug, Clone, Deserialize)]
struct VisualizationPayload {
    #[serde(default)]
    simulation: Option<SimulationData>,
    #[serde(default)]
    overlay: SceneOverlay,
    #[serde(default)]
    status: String,
    #[serde(default)]
    event_count: usize,
    #[serde(default)]
    counts: IngestCounts,
}

fn color(rgba: Rgba) -> Color {
    Color::from_rgba(rgba.r, rgba.g, rgba.b, rgba.a)
}

fn point(p: fleetreplay::Point) -> Point {
    Point::new(p.x, p.y)
}

struct ReplayCanvas<'a> {
    engine: &'a PlaybackEngine,
    overlay: &'a SceneOverlay,
}

impl canvas::Program<Message> for ReplayCanvas<'_> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let surface = Surface {
            width: bounds.width,
            height: bounds.height,
        };

        for command in compose_engine(self.engine, self.overlay, surface) {
            paint(&mut frame, bounds.size(), command);
        }

        vec![frame.into_geometry()]
    }
}

fn paint(frame: &mut Frame, size: Size, command: DrawCommand) {
    match command {
        DrawCommand::Background {
            image,
            color: fill,
            columns,
            rows,
            cell,
            line,
        } => {
            if image.is_some() {
                return;
            }
            frame.fill_rectangle(Point::ORIGIN, size, color(fill));
            let grid = Path::new(|builder| {
                for col in 0..=columns {
                    let x = col as f32 * cell.x;
                    builder.move_to(Point::new(x, 0.0));
                    builder.line_to(Point::new(x, size.height));
                }
                for r in 0..=rows {
                    let y = r as f32 * cell.y;
                    builder.move_to(Point::new(0.0, y));
                    builder.line_to(Point::new(size.width, y));
                }
            });
            frame.stroke(
                &grid,
                Stroke::default().with_width(1.0).with_color(color(line)),
            );
        }
        DrawCommand::Obstacle { rect, color: fill } => {
            frame.fill_rectangle(
                Point::new(rect.x, rect.y),
                Size::new(rect.width, rect.height),
                color(fill),
            );
        }
        DrawCommand::TaskArea {
            rect,
            fill,
            border,
            label,
        } => {
            let origin = Point::new(rect.x, rect.y);
            let extent = Size::new(rect.width, rect.height);
            frame.fill_rectangle(origin, extent, color(fill));
            frame.stroke(
                &Path::rectangle(origin, extent),
                Stroke::default().with_width(1.5).with_color(color(border)),
            );
            frame.fill_text(canvas::Text {
                content: label,
                position: Point::new(rect.x + 4.0, rect.y + 2.0),
                color: color(border),
                size: Pixels(12.0),
                ..canvas::Text::default()
            });
        }
        DrawCommand::TrailSegment {
            from,
            to,
            color: stroke,
        } => {
            frame.stroke(
                &Path::line(point(from), point(to)),
                Stroke::default().with_width(2.5).with_color(color(stroke)),
            );
        }
        DrawCommand::Marker {
            center,
            size: side,
            shape,
            color: fill,
        } => {
            let half = side / 2.0;
            let marker = match shape {
                MarkerShape::Square => Path::rectangle(
                    Point::new(center.x - half, center.y - half),
                    Size::new(side, side),
                ),
                MarkerShape::Triangle => Path::new(|builder| {
                    builder.move_to(Point::new(center.x, center.y - half));
                    builder.line_to(Point::new(center.x + half, center.y + half));
                    builder.line_to(Point::new(center.x - half, center.y + half));
                    builder.close();
                }),
            };
            frame.fill(&marker, color(fill));
        }
        DrawCommand::Label {
            position,
            text: content,
            size: font_size,
            color: fill,
        } => {
            frame.fill_text(canvas::Text {
                content,
                position: point(position),
                color: color(fill),
                size: Pixels(font_size),
                ..canvas::Text::default()
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_without_simulation_decodes() {
        let payload: VisualizationPayload =
            serde_json::from_str(r#"{"simulation": null, "status": "idle"}"#).unwrap();
        assert!(payload.simulation.is_none());
        assert_eq!(payload.status, "idle");
        assert!(payload.overlay.task_areas.is_empty());
    }

    #[test]
    fn loading_empty_payload_shows_placeholder() {
        let (mut state, _) = Visualizer::boot();
        state.load(VisualizationPayload {
            simulation: None,
            overlay: SceneOverlay::default(),
            status: String::new(),
            event_count: 0,
            counts: IngestCounts::default(),
        });
        assert!(state.engine.is_none());
        assert_eq!(state.status, "No simulation data");
    }

    #[test]
    fn palette_colors_convert_channel_for_channel() {
        let converted = color(Rgba::rgb(0.25, 0.5, 0.75).with_alpha(0.5));
        assert_eq!(converted, Color::from_rgba(0.25, 0.5, 0.75, 0.5));
    }
}
