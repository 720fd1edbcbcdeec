//! Region-wide 16×16 sample grids shared by the weather modules.

use serde::{Deserialize, Serialize};

/// Region edge length in metres.
pub const REGION_SIZE: f32 = 256.0;
/// Cells per grid edge.
pub const GRID_SIZE: usize = 16;
/// Total cells in a grid.
pub const GRID_CELLS: usize = GRID_SIZE * GRID_SIZE;
/// Cell edge length in metres.
pub const CELL_SIZE: f32 = REGION_SIZE / GRID_SIZE as f32;

/// Maps region coordinates in metres to a grid index, clamping to the edge.
pub fn cell_index(x: f32, y: f32) -> usize {
    let column = axis_cell(x);
    let row = axis_cell(y);
    row * GRID_SIZE + column
}

fn axis_cell(value: f32) -> usize {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    ((value / CELL_SIZE) as usize).min(GRID_SIZE - 1)
}

/// Horizontal wind vector in metres per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_index_clamps() {
        assert_eq!(cell_index(0.0, 0.0), 0);
        assert_eq!(cell_index(15.9, 0.0), 0);
        assert_eq!(cell_index(16.0, 0.0), 1);
        assert_eq!(cell_index(0.0, 16.0), GRID_SIZE);
        assert_eq!(cell_index(255.9, 255.9), GRID_CELLS - 1);
        assert_eq!(cell_index(1000.0, -20.0), GRID_SIZE - 1);
        assert_eq!(cell_index(f32::NAN, 300.0), (GRID_SIZE - 1) * GRID_SIZE);
    }

    #[test]
    fn test_vec2_length() {
        assert_eq!(Vec2::new(3.0, 4.0).length(), 5.0);
        assert_eq!(Vec2::ZERO.length(), 0.0);
    }
}
