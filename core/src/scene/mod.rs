//! Renderer-agnostic scene composition for the replay canvas.

pub mod draw;
pub mod overlay;
pub mod palette;

pub use draw::{
    compose, compose_engine, DrawCommand, MarkerShape, Rect, SceneInput, Surface, ViewTransform,
};
pub use overlay::{OccupancyGrid, SceneOverlay, TaskArea};
pub use palette::{agent_color, Rgba};
