use crate::{
    stage::LayerFrame,
    swarm::{Color, SwarmError},
};
use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

// Points closer than this to the camera are clipped.
const NEAR_PLANE: f32 = 0.1;

// Symbols by on-screen particle size, in rows.
const SYMBOLS: [(f32, char); 4] = [(0.05, '.'), (0.15, '·'), (0.4, '•'), (0.9, '●')];
const LARGEST_SYMBOL: char = '█';

/// A perspective camera looking down -z at the scene origin.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Camera {
    /// Distance from the camera to the z = 0 plane.
    pub(crate) distance: f32,

    /// Vertical field of view.
    pub(crate) fov_degrees: f32,

    /// How many times taller than wide a terminal cell is.
    pub(crate) cell_aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self { distance: 12.0, fov_degrees: 55.0, cell_aspect: 2.0 }
    }
}

/// Where a point lands on the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Projection {
    pub(crate) column: u16,
    pub(crate) row: u16,
    pub(crate) depth: f32,

    /// How many rows one scene unit covers at this depth.
    pub(crate) rows_per_unit: f32,
}

impl Camera {
    pub(crate) fn validate(&self) -> Result<(), SwarmError> {
        if !self.distance.is_finite() || self.distance <= NEAR_PLANE {
            return Err(SwarmError::InvalidParameter("camera distance", self.distance as f64));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(SwarmError::InvalidParameter("field of view", self.fov_degrees as f64));
        }
        if !self.cell_aspect.is_finite() || self.cell_aspect <= 0.0 {
            return Err(SwarmError::InvalidParameter("cell aspect", self.cell_aspect as f64));
        }
        Ok(())
    }

    fn half_tan(&self) -> f32 {
        (self.fov_degrees.to_radians() / 2.0).tan()
    }

    /// Width of the scene visible at z = 0 on a grid of `columns` by `rows` cells.
    pub(crate) fn scene_width(&self, columns: u16, rows: u16) -> f32 {
        if rows == 0 {
            return 0.0;
        }
        let height = 2.0 * self.distance * self.half_tan();
        height * columns as f32 / (rows as f32 * self.cell_aspect)
    }

    pub(crate) fn project(&self, point: Vec3, columns: u16, rows: u16) -> Option<Projection> {
        let depth = self.distance - point.z;
        if depth < NEAR_PLANE {
            return None;
        }
        let half_rows = rows as f32 / 2.0;
        let rows_per_unit = half_rows / (depth * self.half_tan());
        let column = columns as f32 / 2.0 + point.x * rows_per_unit * self.cell_aspect;
        let row = half_rows - point.y * rows_per_unit;
        if !(0.0..columns as f32).contains(&column) || !(0.0..rows as f32).contains(&row) {
            return None;
        }
        Some(Projection { column: column as u16, row: row as u16, depth, rows_per_unit })
    }
}

fn symbol_for(rows: f32) -> char {
    SYMBOLS.iter().find(|(limit, _)| rows < *limit).map(|(_, symbol)| *symbol).unwrap_or(LARGEST_SYMBOL)
}

/// A drawn cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Cell {
    pub(crate) symbol: char,
    pub(crate) color: Color,
    depth: f32,
}

/// A grid of terminal cells particles are rasterized into, nearest particle winning.
#[derive(Debug)]
pub(crate) struct Canvas {
    columns: u16,
    rows: u16,
    cells: Vec<Option<Cell>>,
}

impl Canvas {
    pub(crate) fn new(columns: u16, rows: u16) -> Self {
        Self { columns, rows, cells: vec![None; columns as usize * rows as usize] }
    }

    pub(crate) fn columns(&self) -> u16 {
        self.columns
    }

    pub(crate) fn rows(&self) -> u16 {
        self.rows
    }

    pub(crate) fn resize(&mut self, columns: u16, rows: u16) {
        *self = Self::new(columns, rows);
    }

    pub(crate) fn clear(&mut self) {
        self.cells.fill(None);
    }

    /// The cells of row `row`, left to right.
    pub(crate) fn row(&self, row: u16) -> &[Option<Cell>] {
        let width = self.columns as usize;
        let start = row as usize * width;
        self.cells.get(start..start + width).unwrap_or(&[])
    }

    fn plot(&mut self, projection: Projection, symbol: char, color: Color) -> bool {
        let index = projection.row as usize * self.columns as usize + projection.column as usize;
        let Some(slot) = self.cells.get_mut(index) else {
            return false;
        };
        if slot.as_ref().is_some_and(|existing| existing.depth <= projection.depth) {
            return false;
        }
        *slot = Some(Cell { symbol, color, depth: projection.depth });
        true
    }

    /// Rasterize a layer, returning how many cells it won. Hidden layers are skipped.
    pub(crate) fn draw(&mut self, layer: &LayerFrame, camera: &Camera) -> usize {
        if layer.is_hidden() {
            return 0;
        }
        let frame = &layer.frame;
        let rotation =
            Quat::from_euler(EulerRot::XYZ, frame.group_rotation.x, frame.group_rotation.y, frame.group_rotation.z);
        let mut plotted = 0;
        for transform in &frame.particles {
            let world = rotation * (transform.position * frame.scale);
            let Some(projection) = camera.project(world, self.columns, self.rows) else {
                continue;
            };
            let size = frame.block_size * transform.scale * frame.scale * projection.rows_per_unit;
            if self.plot(projection, symbol_for(size), transform.color.dimmed(layer.opacity)) {
                plotted += 1;
            }
        }
        plotted
    }
}
