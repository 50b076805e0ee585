use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }
}

pub const AGENT_PALETTE: [Rgba; 8] = [
    Rgba::rgb(0.18, 0.72, 0.89),
    Rgba::rgb(0.95, 0.55, 0.20),
    Rgba::rgb(0.40, 0.80, 0.35),
    Rgba::rgb(0.85, 0.30, 0.45),
    Rgba::rgb(0.65, 0.50, 0.95),
    Rgba::rgb(0.95, 0.85, 0.30),
    Rgba::rgb(0.30, 0.90, 0.75),
    Rgba::rgb(0.90, 0.45, 0.80),
];

pub const BACKGROUND: Rgba = Rgba::rgb(0.05, 0.05, 0.07);
pub const GRID_LINE: Rgba = Rgba::rgb(0.18, 0.18, 0.22);
pub const OBSTACLE: Rgba = Rgba::rgb(0.32, 0.32, 0.36);
pub const TASK_AREA: Rgba = Rgba::rgb(0.95, 0.75, 0.25);
pub const TEXT: Rgba = Rgba::rgb(0.92, 0.92, 0.95);

/// Colors follow the agent's position in the frame, not its id or kind, so
/// two rovers never share a color until the palette wraps.
pub fn agent_color(index: usize) -> Rgba {
    AGENT_PALETTE[index % AGENT_PALETTE.len()]
}
