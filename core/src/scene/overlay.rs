use crate::prelude::{MapSize, ReplayError, ReplayResult};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Row-major occupancy grid; non-zero cells are impassable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct OccupancyGrid {
    cells: Array2<u8>,
}

impl OccupancyGrid {
    pub fn from_rows(rows: Vec<Vec<u8>>) -> ReplayResult<Self> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let mut flat = Vec::with_capacity(width * height);
        for (row, cells) in rows.into_iter().enumerate() {
            if cells.len() != width {
                return Err(ReplayError::RaggedGrid {
                    row,
                    expected: width,
                    found: cells.len(),
                });
            }
            flat.extend(cells);
        }
        let cells = Array2::from_shape_vec((height, width), flat).map_err(|err| {
            ReplayError::InvalidFrames(format!("occupancy grid shape: {}", err))
        })?;
        Ok(Self { cells })
    }

    /// Columns by rows.
    pub fn size(&self) -> MapSize {
        let (rows, cols) = self.cells.dim();
        MapSize::new(cols as f32, rows as f32)
    }

    pub fn is_blocked(&self, row: usize, col: usize) -> bool {
        self.cells.get((row, col)).is_some_and(|cell| *cell != 0)
    }

    /// `(row, col)` of every impassable cell, row-major.
    pub fn blocked_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .indexed_iter()
            .filter(|(_, cell)| **cell != 0)
            .map(|(index, _)| index)
    }
}

impl TryFrom<Vec<Vec<u8>>> for OccupancyGrid {
    type Error = ReplayError;

    fn try_from(rows: Vec<Vec<u8>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl From<OccupancyGrid> for Vec<Vec<u8>> {
    fn from(grid: OccupancyGrid) -> Self {
        grid.cells.outer_iter().map(|row| row.to_vec()).collect()
    }
}

/// Annotated work zone drawn over the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskArea {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default, alias = "moduleIds")]
    pub module_ids: Vec<String>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Optional drawing context supplied alongside a replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneOverlay {
    pub map_size: Option<MapSize>,
    pub map_image: Option<PathBuf>,
    pub obstacles: Option<OccupancyGrid>,
    pub task_areas: Vec<TaskArea>,
}
